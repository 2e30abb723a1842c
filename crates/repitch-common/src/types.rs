//! Core type definitions for media classification and pitch amounts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::paths::{is_audio_file, is_video_file};

/// Which pipeline family an input file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A plain audio file, decoded directly.
    Audio,
    /// A video container whose audio track is extracted and remuxed.
    Video,
}

impl MediaKind {
    /// Classify a path by its extension. Returns `None` for unsupported files.
    pub fn classify(path: &Path) -> Option<Self> {
        if is_video_file(path) {
            Some(Self::Video)
        } else if is_audio_file(path) {
            Some(Self::Audio)
        } else {
            None
        }
    }

    /// Extension used when the requested output has no usable one.
    pub fn default_output_extension(&self) -> &'static str {
        match self {
            Self::Audio => "wav",
            Self::Video => "mp4",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// Unit a caller expresses a shift amount in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PitchUnit {
    /// Semitones, the unit the pipeline works in.
    #[default]
    Semitones,
    /// Whole tones (two semitones each).
    Tones,
}

impl PitchUnit {
    /// Convert an amount in this unit to semitones.
    pub fn to_semitones(&self, amount: f64) -> f64 {
        match self {
            Self::Semitones => amount,
            Self::Tones => amount * 2.0,
        }
    }

    /// Short label used in suggested file names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Semitones => "semi",
            Self::Tones => "tone",
        }
    }
}

impl fmt::Display for PitchUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semitones => write!(f, "semitones"),
            Self::Tones => write!(f, "tones"),
        }
    }
}

impl std::str::FromStr for PitchUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "semitones" | "semitone" | "semi" | "st" => Ok(Self::Semitones),
            "tones" | "tone" => Ok(Self::Tones),
            _ => Err(format!("Unknown pitch unit: {}", s)),
        }
    }
}
