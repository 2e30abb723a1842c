use clap::{Parser, Subcommand};
use repitch_common::PitchUnit;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "repitch")]
#[command(author, version, about = "Pitch-shift audio files and the audio of video files")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Shift the pitch of an audio or video file
    Shift {
        /// Input file (.wav .mp3 .flac .ogg .m4a .aac .mp4 .mov .mkv)
        #[arg(required = true)]
        input: PathBuf,

        /// Output file (defaults to a name next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Shift amount, negative to lower the pitch (0 keeps the pitch)
        #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
        shift: f64,

        /// Unit of the shift amount (semitones or tones)
        #[arg(short, long)]
        unit: Option<PitchUnit>,

        /// Output sample rate in Hz, or "keep"
        #[arg(long)]
        sample_rate: Option<SampleRateArg>,

        /// Print job events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

/// `--sample-rate` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRateArg {
    Keep,
    Hz(u32),
}

impl SampleRateArg {
    pub fn as_option(&self) -> Option<u32> {
        match self {
            Self::Keep => None,
            Self::Hz(rate) => Some(*rate),
        }
    }
}

impl FromStr for SampleRateArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("keep") {
            return Ok(Self::Keep);
        }
        match s.parse::<u32>() {
            Ok(0) => Err("sample rate must be greater than zero".to_string()),
            Ok(rate) => Ok(Self::Hz(rate)),
            Err(_) => Err(format!("invalid sample rate: {s} (expected Hz or \"keep\")")),
        }
    }
}
