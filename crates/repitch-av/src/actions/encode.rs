//! MP3 encoding of a finished WAV file.

use super::{require_input, run_tool};
use crate::Result;
use std::ffi::OsString;
use std::path::Path;

/// Arguments that encode `wav` to MP3 with libmp3lame at `bitrate`.
pub fn mp3_args(wav: &Path, mp3_out: &Path, bitrate: &str) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        wav.into(),
        "-codec:a".into(),
        "libmp3lame".into(),
        "-b:a".into(),
        bitrate.into(),
        mp3_out.into(),
    ]
}

/// Encode a WAV file to MP3.
pub fn encode_mp3(ffmpeg: &Path, wav: &Path, mp3_out: &Path, bitrate: &str) -> Result<()> {
    require_input(wav)?;

    #[cfg(feature = "tracing")]
    tracing::info!("Encoding MP3 {:?} -> {:?} at {}", wav, mp3_out, bitrate);

    run_tool(ffmpeg, &mp3_args(wav, mp3_out, bitrate), "encode mp3")?;
    Ok(())
}
