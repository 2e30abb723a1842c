//! The external transcoder capability.
//!
//! Pipelines only see the [`Transcoder`] trait so they can run against a fake
//! in tests. [`FfmpegTranscoder`] is the production implementation and takes
//! an already resolved executable path; discovery happens in the caller.

use crate::actions::{self, MuxOptions};
use crate::Result;
use std::path::{Path, PathBuf};

/// Narrow interface over the external transcoder.
pub trait Transcoder: Send + Sync {
    /// Demux the audio track of `input` into a PCM WAV file, dropping video.
    fn extract_audio(&self, input: &Path, wav_out: &Path) -> Result<()>;

    /// Combine the video stream of `video_source` (copied) with `audio`
    /// (re-encoded), truncated to the shorter stream.
    fn mux(&self, video_source: &Path, audio: &Path, output: &Path) -> Result<()>;

    /// Encode a WAV file to MP3.
    fn encode_mp3(&self, wav: &Path, mp3_out: &Path) -> Result<()>;
}

/// [`Transcoder`] backed by the ffmpeg command line tool.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    mux_options: MuxOptions,
    mp3_bitrate: String,
}

impl FfmpegTranscoder {
    /// Default MP3 bitrate.
    pub const DEFAULT_MP3_BITRATE: &'static str = "192k";

    /// Create a transcoder for the ffmpeg executable at `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            mux_options: MuxOptions::default(),
            mp3_bitrate: Self::DEFAULT_MP3_BITRATE.to_string(),
        }
    }

    /// Set how audio is encoded when muxing.
    pub fn with_mux_options(mut self, options: MuxOptions) -> Self {
        self.mux_options = options;
        self
    }

    /// Set the MP3 bitrate.
    pub fn with_mp3_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.mp3_bitrate = bitrate.into();
        self
    }

    /// Path of the executable this transcoder spawns.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Mux settings in use.
    pub fn mux_options(&self) -> &MuxOptions {
        &self.mux_options
    }

    /// MP3 bitrate in use.
    pub fn mp3_bitrate(&self) -> &str {
        &self.mp3_bitrate
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Transcoder for FfmpegTranscoder {
    fn extract_audio(&self, input: &Path, wav_out: &Path) -> Result<()> {
        actions::extract_audio(&self.program, input, wav_out)
    }

    fn mux(&self, video_source: &Path, audio: &Path, output: &Path) -> Result<()> {
        actions::mux(&self.program, video_source, audio, output, &self.mux_options)
    }

    fn encode_mp3(&self, wav: &Path, mp3_out: &Path) -> Result<()> {
        actions::encode_mp3(&self.program, wav, mp3_out, &self.mp3_bitrate)
    }
}
