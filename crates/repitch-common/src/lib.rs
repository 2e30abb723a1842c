//! Repitch-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across repitch:
//!
//! - **Path Utilities**: Functions to detect audio and video files by extension
//! - **Core Types**: Media kind classification and pitch units
//!
//! # Examples
//!
//! ```
//! use repitch_common::{MediaKind, PitchUnit};
//! use repitch_common::paths::is_video_file;
//! use std::path::Path;
//!
//! assert!(is_video_file(Path::new("clip.MOV")));
//! assert_eq!(MediaKind::classify(Path::new("song.flac")), Some(MediaKind::Audio));
//! assert_eq!(PitchUnit::Tones.to_semitones(1.5), 3.0);
//! ```

pub mod paths;
pub mod types;

pub use types::*;

/// Largest shift offered to users, in semitones.
///
/// The core accepts any value; callers use this bound for their controls.
pub const MAX_SHIFT_SEMITONES: f64 = 24.0;
