//! Phase-vocoder pitch shifting.
//!
//! A shift by `s` semitones is done in two steps:
//! 1. time-stretch by `rate = 2^(-s/12)` with a phase vocoder, which changes
//!    duration but keeps pitch
//! 2. resample the stretched signal by `rate`, which restores the duration
//!    and moves the pitch
//!
//! The result is trimmed or zero-padded to the input length.

use crate::resample::resample;
use crate::shift::{semitones_to_rate, PitchShift};
use crate::{Result, ShiftError};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Short-time spectrum: one row of `fft_size / 2 + 1` bins per frame.
type Spectrogram = Vec<Vec<Complex<f32>>>;

/// Phase-vocoder implementation of [`PitchShift`].
#[derive(Debug, Clone)]
pub struct PhaseVocoder {
    fft_size: usize,
    hop_length: usize,
    window: Vec<f32>,
}

impl PhaseVocoder {
    /// Default analysis window length.
    pub const DEFAULT_FFT_SIZE: usize = 2048;
    /// Default hop between analysis frames.
    pub const DEFAULT_HOP_LENGTH: usize = 512;
    /// Largest stretch factor in either direction (four octaves).
    pub const MAX_STRETCH: f64 = 16.0;

    /// Create a vocoder with the given window and hop length.
    ///
    /// # Errors
    ///
    /// `fft_size` must be a power of two of at least 16 and `hop_length` must
    /// be in `1..=fft_size`.
    pub fn new(fft_size: usize, hop_length: usize) -> Result<Self> {
        if fft_size < 16 || !fft_size.is_power_of_two() {
            return Err(ShiftError::InvalidParameters(format!(
                "fft_size must be a power of two >= 16, got {fft_size}"
            )));
        }
        if hop_length == 0 || hop_length > fft_size {
            return Err(ShiftError::InvalidParameters(format!(
                "hop_length must be in 1..={fft_size}, got {hop_length}"
            )));
        }

        Ok(Self {
            fft_size,
            hop_length,
            window: hann_window(fft_size),
        })
    }

    /// Analysis window length in samples.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Hop between frames in samples.
    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Change duration by `1 / rate` without changing pitch.
    ///
    /// `rate > 1` speeds up, `rate < 1` slows down. The output has
    /// `round(len / rate)` samples. Rates beyond [`Self::MAX_STRETCH`] either
    /// way are rejected, which bounds shifts to ±48 semitones.
    pub fn time_stretch(&self, signal: &[f32], rate: f64) -> Result<Vec<f32>> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ShiftError::InvalidParameters(format!(
                "stretch rate must be positive, got {rate}"
            )));
        }
        if !(1.0 / Self::MAX_STRETCH..=Self::MAX_STRETCH).contains(&rate) {
            return Err(ShiftError::InvalidParameters(format!(
                "stretch rate {rate} is outside 1/{max}..={max}",
                max = Self::MAX_STRETCH
            )));
        }
        if signal.len() < self.fft_size {
            return Err(ShiftError::TooShort {
                len: signal.len(),
                min: self.fft_size,
            });
        }

        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(self.fft_size);
        let inverse = planner.plan_fft_inverse(self.fft_size);

        let spectrum = self.stft(&forward, signal);
        let stretched = self.phase_vocoder(&spectrum, rate);
        let length = (signal.len() as f64 / rate).round() as usize;

        Ok(self.istft(&inverse, &stretched, length))
    }

    /// Centred STFT with a Hann window.
    fn stft(&self, fft: &Arc<dyn Fft<f32>>, signal: &[f32]) -> Spectrogram {
        let n = self.fft_size;
        let pad = n / 2;

        let mut padded = vec![0.0f32; signal.len() + 2 * pad];
        padded[pad..pad + signal.len()].copy_from_slice(signal);

        let n_frames = 1 + (padded.len() - n) / self.hop_length;
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n];

        (0..n_frames)
            .map(|frame| {
                let start = frame * self.hop_length;
                for (i, slot) in buffer.iter_mut().enumerate() {
                    *slot = Complex::new(padded[start + i] * self.window[i], 0.0);
                }
                fft.process(&mut buffer);
                buffer[..=n / 2].to_vec()
            })
            .collect()
    }

    /// Resample the frame sequence at steps of `rate`, interpolating
    /// magnitudes and accumulating phase so partials stay coherent.
    fn phase_vocoder(&self, spectrum: &Spectrogram, rate: f64) -> Spectrogram {
        let n_bins = self.fft_size / 2 + 1;
        let n_frames = spectrum.len();
        let silent = vec![Complex::new(0.0f32, 0.0); n_bins];
        let frame_at = |i: usize| spectrum.get(i).unwrap_or(&silent);

        // Expected phase advance per hop for each bin centre.
        let phi_advance: Vec<f64> = (0..n_bins)
            .map(|k| 2.0 * PI * self.hop_length as f64 * k as f64 / self.fft_size as f64)
            .collect();

        let mut phase_acc: Vec<f64> = frame_at(0).iter().map(|c| c.arg() as f64).collect();

        let n_steps = (n_frames as f64 / rate).ceil() as usize;
        let mut output = Vec::with_capacity(n_steps);

        for step in 0..n_steps {
            let t = step as f64 * rate;
            if t >= n_frames as f64 {
                break;
            }
            let index = t.floor() as usize;
            let alpha = (t - index as f64) as f32;
            let current = frame_at(index);
            let next = frame_at(index + 1);

            let mut frame = Vec::with_capacity(n_bins);
            for k in 0..n_bins {
                let magnitude = (1.0 - alpha) * current[k].norm() + alpha * next[k].norm();
                frame.push(Complex::from_polar(magnitude, phase_acc[k] as f32));

                let mut dphase = next[k].arg() as f64 - current[k].arg() as f64 - phi_advance[k];
                dphase -= 2.0 * PI * (dphase / (2.0 * PI)).round();
                phase_acc[k] += phi_advance[k] + dphase;
            }
            output.push(frame);
        }

        output
    }

    /// Overlap-add inverse of [`stft`](Self::stft), normalised by the summed
    /// squared window and trimmed to `length` samples.
    fn istft(&self, ifft: &Arc<dyn Fft<f32>>, spectrum: &Spectrogram, length: usize) -> Vec<f32> {
        let n = self.fft_size;
        let pad = n / 2;
        let total = n + self.hop_length * spectrum.len().saturating_sub(1);

        let mut output = vec![0.0f32; total];
        let mut window_sum = vec![0.0f32; total];
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n];
        let scale = 1.0 / n as f32;

        for (frame_index, frame) in spectrum.iter().enumerate() {
            buffer[..=n / 2].copy_from_slice(frame);
            buffer[0].im = 0.0;
            buffer[n / 2].im = 0.0;
            for k in 1..n / 2 {
                buffer[n - k] = frame[k].conj();
            }
            ifft.process(&mut buffer);

            let start = frame_index * self.hop_length;
            for i in 0..n {
                output[start + i] += buffer[i].re * scale * self.window[i];
                window_sum[start + i] += self.window[i] * self.window[i];
            }
        }

        for (sample, &weight) in output.iter_mut().zip(&window_sum) {
            if weight > f32::MIN_POSITIVE {
                *sample /= weight;
            }
        }

        let mut trimmed: Vec<f32> = output.into_iter().skip(pad).take(length).collect();
        trimmed.resize(length, 0.0);
        trimmed
    }
}

impl Default for PhaseVocoder {
    fn default() -> Self {
        Self {
            fft_size: Self::DEFAULT_FFT_SIZE,
            hop_length: Self::DEFAULT_HOP_LENGTH,
            window: hann_window(Self::DEFAULT_FFT_SIZE),
        }
    }
}

impl PitchShift for PhaseVocoder {
    fn shift(&self, signal: &[f32], sample_rate: u32, semitones: f64) -> Result<Vec<f32>> {
        if sample_rate == 0 {
            return Err(ShiftError::InvalidSampleRate(sample_rate));
        }
        if !semitones.is_finite() {
            return Err(ShiftError::NonFinite(semitones));
        }
        if signal.len() < self.fft_size {
            return Err(ShiftError::TooShort {
                len: signal.len(),
                min: self.fft_size,
            });
        }
        if semitones == 0.0 {
            return Ok(signal.to_vec());
        }

        let rate = semitones_to_rate(semitones);
        tracing::trace!(
            "Shifting {} samples at {} Hz by {} semitones (rate {:.4})",
            signal.len(),
            sample_rate,
            semitones,
            rate
        );

        let stretched = self.time_stretch(signal, rate)?;
        let mut shifted = resample(&[stretched], rate)?
            .into_iter()
            .next()
            .unwrap_or_default();
        shifted.resize(signal.len(), 0.0);
        Ok(shifted)
    }

    fn min_input_len(&self) -> usize {
        self.fft_size
    }
}

/// Periodic Hann window.
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let angle = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
            0.5 * (1.0 - angle.cos())
        })
        .collect()
}
