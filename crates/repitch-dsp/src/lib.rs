//! # repitch-dsp
//!
//! The pitch-shift capability consumed by the repitch pipelines.
//!
//! Pipelines only depend on the [`PitchShift`] trait. [`PhaseVocoder`] is the
//! default implementation: a phase-vocoder time stretch followed by a
//! resample back to the original duration. [`resample`] also exposes the
//! sample rate conversion used when a job requests a different output rate.
//!
//! ## Example
//!
//! ```
//! use repitch_dsp::{PhaseVocoder, PitchShift};
//!
//! let sr = 22_050;
//! let tone: Vec<f32> = (0..sr)
//!     .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / sr as f32).sin())
//!     .collect();
//!
//! let up_a_fifth = PhaseVocoder::default().shift(&tone, sr as u32, 7.0)?;
//! assert_eq!(up_a_fifth.len(), tone.len());
//! # Ok::<(), repitch_dsp::ShiftError>(())
//! ```

mod error;
pub mod resample;
pub mod shift;
pub mod vocoder;

pub use error::{Result, ShiftError};
pub use resample::{resample, resample_channels};
pub use shift::{semitones_to_rate, PitchShift};
pub use vocoder::PhaseVocoder;
