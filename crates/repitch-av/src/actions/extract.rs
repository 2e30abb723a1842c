//! Audio track extraction.

use super::{require_input, run_tool};
use crate::Result;
use std::ffi::OsString;
use std::path::Path;

/// Arguments that demux the first audio track of `input` into 16-bit PCM WAV.
///
/// The video stream is dropped (`-vn`).
pub fn extract_args(input: &Path, wav_out: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        input.into(),
        "-vn".into(),
        "-acodec".into(),
        "pcm_s16le".into(),
        wav_out.into(),
    ]
}

/// Extract the audio track of a container to a WAV file.
pub fn extract_audio(ffmpeg: &Path, input: &Path, wav_out: &Path) -> Result<()> {
    require_input(input)?;

    #[cfg(feature = "tracing")]
    tracing::info!("Extracting audio {:?} -> {:?}", input, wav_out);

    run_tool(ffmpeg, &extract_args(input, wav_out), "extract audio")?;
    Ok(())
}
