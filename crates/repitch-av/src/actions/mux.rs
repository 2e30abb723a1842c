//! Muxing a replacement audio track against an existing video stream.

use super::{require_input, run_tool};
use crate::Result;
use std::ffi::OsString;
use std::path::Path;

/// Audio codecs the shifted track can be re-encoded to when muxing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioCodec {
    /// AAC (Advanced Audio Coding), accepted by every supported container.
    #[default]
    Aac,
    /// AC-3 (Dolby Digital).
    Ac3,
    /// Opus.
    Opus,
    /// FLAC (lossless, MKV/MOV only in practice).
    Flac,
}

impl AudioCodec {
    /// Get the ffmpeg codec name.
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            AudioCodec::Aac => "aac",
            AudioCodec::Ac3 => "ac3",
            AudioCodec::Opus => "libopus",
            AudioCodec::Flac => "flac",
        }
    }

    /// Recommended bitrate, `None` for lossless codecs.
    pub fn default_bitrate(&self) -> Option<&'static str> {
        match self {
            AudioCodec::Aac => Some("192k"),
            AudioCodec::Ac3 => Some("640k"),
            AudioCodec::Opus => Some("128k"),
            AudioCodec::Flac => None,
        }
    }
}

impl std::str::FromStr for AudioCodec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aac" => Ok(AudioCodec::Aac),
            "ac3" => Ok(AudioCodec::Ac3),
            "opus" | "libopus" => Ok(AudioCodec::Opus),
            "flac" => Ok(AudioCodec::Flac),
            _ => Err(format!("Unknown audio codec: {}", s)),
        }
    }
}

/// How the shifted audio is encoded into the output container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MuxOptions {
    /// Codec for the audio track.
    pub codec: AudioCodec,
    /// Bitrate override; the codec default is used when `None`.
    pub bitrate: Option<String>,
}

/// Arguments that copy video stream 0 of `video_source`, take audio stream 0
/// of `audio`, re-encode the audio and stop at the shorter stream.
pub fn mux_args(
    video_source: &Path,
    audio: &Path,
    output: &Path,
    options: &MuxOptions,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-y".into(),
        "-i".into(),
        video_source.into(),
        "-i".into(),
        audio.into(),
        "-c:v".into(),
        "copy".into(),
        "-map".into(),
        "0:v:0".into(),
        "-map".into(),
        "1:a:0".into(),
        "-shortest".into(),
        "-c:a".into(),
        options.codec.ffmpeg_name().into(),
    ];

    let bitrate = options
        .bitrate
        .as_deref()
        .or_else(|| options.codec.default_bitrate());
    if let Some(bitrate) = bitrate {
        args.push("-b:a".into());
        args.push(bitrate.into());
    }

    args.push(output.into());
    args
}

/// Mux `audio` against the video stream of `video_source` into `output`.
pub fn mux(
    ffmpeg: &Path,
    video_source: &Path,
    audio: &Path,
    output: &Path,
    options: &MuxOptions,
) -> Result<()> {
    require_input(video_source)?;
    require_input(audio)?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        "Muxing {:?} with video from {:?} -> {:?}",
        audio,
        video_source,
        output
    );

    run_tool(
        ffmpeg,
        &mux_args(video_source, audio, output, options),
        "mux audio",
    )?;
    Ok(())
}
