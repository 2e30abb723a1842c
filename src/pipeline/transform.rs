//! Per-channel wrapper around the pitch-shift capability.

use super::error::Result;
use repitch_dsp::PitchShift;
use std::borrow::Cow;
use std::sync::Arc;

/// Shortest buffer handed to the capability. Shorter channels are padded
/// with trailing silence up to this length.
pub const MIN_ANALYSIS_WINDOW: usize = 2048;

/// Applies the padding policy, then delegates to the capability.
#[derive(Clone)]
pub struct ChannelTransform {
    shifter: Arc<dyn PitchShift>,
}

impl ChannelTransform {
    pub fn new(shifter: Arc<dyn PitchShift>) -> Self {
        Self { shifter }
    }

    /// Length a buffer is padded to before shifting.
    ///
    /// Never below [`MIN_ANALYSIS_WINDOW`]; larger if the capability asks
    /// for more.
    pub fn min_len(&self) -> usize {
        MIN_ANALYSIS_WINDOW.max(self.shifter.min_input_len())
    }

    /// Shift one mono channel.
    ///
    /// The returned length is whatever the capability produced and may
    /// differ from the input length.
    pub fn shift(&self, buffer: &[f32], sample_rate: u32, semitones: f64) -> Result<Vec<f32>> {
        let padded = pad_to(buffer, self.min_len());
        if padded.len() != buffer.len() {
            tracing::debug!(
                "Padding {} samples with {} samples of silence",
                buffer.len(),
                padded.len() - buffer.len()
            );
        }

        Ok(self.shifter.shift(&padded, sample_rate, semitones)?)
    }
}

impl std::fmt::Debug for ChannelTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelTransform")
            .field("min_len", &self.min_len())
            .finish()
    }
}

/// Zero-pad `buffer` at the end up to `min_len`, borrowing when long enough.
pub fn pad_to(buffer: &[f32], min_len: usize) -> Cow<'_, [f32]> {
    if buffer.len() >= min_len {
        Cow::Borrowed(buffer)
    } else {
        let mut padded = Vec::with_capacity(min_len);
        padded.extend_from_slice(buffer);
        padded.resize(min_len, 0.0);
        Cow::Owned(padded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::error::{Error, ErrorKind};
    use repitch_dsp::ShiftError;
    use std::sync::Mutex;

    /// Records what it was given and returns it scaled.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Vec<f32>>>,
        min: usize,
    }

    impl PitchShift for Recorder {
        fn shift(&self, signal: &[f32], _sr: u32, semitones: f64) -> repitch_dsp::Result<Vec<f32>> {
            self.seen.lock().unwrap().push(signal.to_vec());
            Ok(signal.iter().map(|s| s * semitones as f32).collect())
        }

        fn min_input_len(&self) -> usize {
            self.min
        }
    }

    struct Rejecting;

    impl PitchShift for Rejecting {
        fn shift(&self, _signal: &[f32], sr: u32, _st: f64) -> repitch_dsp::Result<Vec<f32>> {
            Err(ShiftError::InvalidSampleRate(sr))
        }
    }

    #[test]
    fn test_short_buffer_is_zero_padded() {
        let recorder = Arc::new(Recorder::default());
        let transform = ChannelTransform::new(recorder.clone());

        let out = transform.shift(&[1.0, 2.0, 3.0], 44100, 2.0).unwrap();
        assert_eq!(out.len(), MIN_ANALYSIS_WINDOW);
        assert_eq!(&out[..3], &[2.0, 4.0, 6.0]);

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0].len(), MIN_ANALYSIS_WINDOW);
        assert!(seen[0][3..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_long_buffer_is_passed_through() {
        let recorder = Arc::new(Recorder::default());
        let transform = ChannelTransform::new(recorder.clone());

        let input = vec![0.5; 5000];
        let out = transform.shift(&input, 44100, 1.0).unwrap();
        assert_eq!(out, input);
        assert_eq!(recorder.seen.lock().unwrap()[0].len(), 5000);
    }

    #[test]
    fn test_capability_minimum_wins_when_larger() {
        let recorder = Arc::new(Recorder {
            min: 4096,
            ..Default::default()
        });
        let transform = ChannelTransform::new(recorder.clone());
        assert_eq!(transform.min_len(), 4096);

        transform.shift(&vec![0.1; 3000], 44100, 1.0).unwrap();
        assert_eq!(recorder.seen.lock().unwrap()[0].len(), 4096);
    }

    #[test]
    fn test_empty_buffer_is_padded() {
        let transform = ChannelTransform::new(Arc::new(Recorder::default()));
        let out = transform.shift(&[], 44100, 1.0).unwrap();
        assert_eq!(out, vec![0.0; MIN_ANALYSIS_WINDOW]);
    }

    #[test]
    fn test_capability_errors_become_transform_errors() {
        let transform = ChannelTransform::new(Arc::new(Rejecting));
        let err = transform.shift(&[0.0; 10], 0, 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransformError);
        assert!(matches!(
            err,
            Error::Transform(ShiftError::InvalidSampleRate(0))
        ));
    }

    #[test]
    fn test_pad_to_borrows_when_long_enough() {
        assert!(matches!(pad_to(&[1.0; 4], 4), Cow::Borrowed(_)));
        assert!(matches!(pad_to(&[1.0; 3], 4), Cow::Owned(_)));
    }
}
