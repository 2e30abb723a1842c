//! The pitch-shift capability.

use crate::Result;

/// Opaque pitch-shift capability: `shift(signal, sample_rate, semitones)`.
///
/// Implementations treat `signal` as one mono channel. The returned buffer
/// may differ in length from the input; callers must use whatever length
/// comes back.
pub trait PitchShift: Send + Sync {
    /// Shift `signal` by `semitones` (positive is up).
    fn shift(&self, signal: &[f32], sample_rate: u32, semitones: f64) -> Result<Vec<f32>>;

    /// Shortest signal the implementation accepts. Shorter inputs should be
    /// padded by the caller.
    fn min_input_len(&self) -> usize {
        0
    }
}

impl<T: PitchShift + ?Sized> PitchShift for Box<T> {
    fn shift(&self, signal: &[f32], sample_rate: u32, semitones: f64) -> Result<Vec<f32>> {
        (**self).shift(signal, sample_rate, semitones)
    }

    fn min_input_len(&self) -> usize {
        (**self).min_input_len()
    }
}

impl<T: PitchShift + ?Sized> PitchShift for std::sync::Arc<T> {
    fn shift(&self, signal: &[f32], sample_rate: u32, semitones: f64) -> Result<Vec<f32>> {
        (**self).shift(signal, sample_rate, semitones)
    }

    fn min_input_len(&self) -> usize {
        (**self).min_input_len()
    }
}

/// Time-stretch rate for a shift: `2^(-semitones / 12)`.
///
/// A rate below 1 lengthens the signal, so shifting up stretches first and
/// then resamples back down to the original duration.
pub fn semitones_to_rate(semitones: f64) -> f64 {
    2f64.powf(-semitones / 12.0)
}
