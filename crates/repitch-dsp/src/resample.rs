//! Sample rate conversion using rubato.

use crate::{Result, ShiftError};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Input frames handed to the resampler per call.
const CHUNK_SIZE: usize = 1024;

fn sinc_parameters() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    }
}

/// Resample equal-length channels from `from_rate` to `to_rate`.
///
/// Identical rates return the input unchanged. Output length is
/// `round(len * to_rate / from_rate)` for every channel.
///
/// # Errors
///
/// Returns [`ShiftError::InvalidSampleRate`] when either rate is zero.
pub fn resample_channels(
    channels: &[Vec<f32>],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<Vec<f32>>> {
    if from_rate == 0 {
        return Err(ShiftError::InvalidSampleRate(from_rate));
    }
    if to_rate == 0 {
        return Err(ShiftError::InvalidSampleRate(to_rate));
    }
    if from_rate == to_rate {
        return Ok(channels.to_vec());
    }

    tracing::debug!(
        "Resampling {} channel(s) {} Hz -> {} Hz",
        channels.len(),
        from_rate,
        to_rate
    );

    resample(channels, to_rate as f64 / from_rate as f64)
}

/// Resample equal-length channels by `ratio` (output rate / input rate).
pub fn resample(channels: &[Vec<f32>], ratio: f64) -> Result<Vec<Vec<f32>>> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(ShiftError::InvalidParameters(format!(
            "resample ratio must be positive, got {ratio}"
        )));
    }

    let Some(first) = channels.first() else {
        return Ok(Vec::new());
    };
    let input_frames = first.len();
    if channels.iter().any(|c| c.len() != input_frames) {
        return Err(ShiftError::InvalidParameters(
            "channels have different lengths".into(),
        ));
    }
    if input_frames == 0 {
        return Ok(vec![Vec::new(); channels.len()]);
    }

    let mut resampler = SincFixedIn::<f32>::new(
        ratio,
        1.0,
        sinc_parameters(),
        CHUNK_SIZE,
        channels.len(),
    )
    .map_err(|e| ShiftError::Resample(e.to_string()))?;

    let delay = resampler.output_delay();
    let expected_output_frames = (input_frames as f64 * ratio).round() as usize;
    let wanted = expected_output_frames + delay;

    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(wanted + CHUNK_SIZE); channels.len()];
    let append = |output: &mut Vec<Vec<f32>>, produced: Vec<Vec<f32>>| {
        for (out, chunk) in output.iter_mut().zip(produced) {
            out.extend_from_slice(&chunk);
        }
    };

    let mut pos = 0;
    while input_frames - pos >= resampler.input_frames_next() {
        let needed = resampler.input_frames_next();
        let chunk: Vec<&[f32]> = channels.iter().map(|c| &c[pos..pos + needed]).collect();
        let produced = resampler
            .process(&chunk, None)
            .map_err(|e| ShiftError::Resample(e.to_string()))?;
        append(&mut output, produced);
        pos += needed;
    }

    if pos < input_frames {
        let chunk: Vec<&[f32]> = channels.iter().map(|c| &c[pos..]).collect();
        let produced = resampler
            .process_partial(Some(chunk.as_slice()), None)
            .map_err(|e| ShiftError::Resample(e.to_string()))?;
        append(&mut output, produced);
    }

    // Flush the filter tail until the delayed output covers the input.
    while output[0].len() < wanted {
        let produced = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| ShiftError::Resample(e.to_string()))?;
        if produced.first().map_or(true, |c| c.is_empty()) {
            break;
        }
        append(&mut output, produced);
    }

    for channel in output.iter_mut() {
        let start = delay.min(channel.len());
        channel.drain(..start);
        channel.resize(expected_output_frames, 0.0);
    }

    Ok(output)
}
