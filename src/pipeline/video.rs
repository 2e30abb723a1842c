//! Video pipeline: extract the audio track, shift it, mux it back.
//!
//! Every intermediate file lives in the job's workspace, so a failure at any
//! stage leaves nothing behind once the workspace is dropped.

use super::audio::AudioPipeline;
use super::context::StageContext;
use super::error::{Error, Result};
use repitch_av::Transcoder;
use repitch_common::paths::is_video_file;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the extracted track inside the workspace.
pub const EXTRACTED_AUDIO: &str = "orig_audio.wav";
/// Name of the shifted track inside the workspace.
pub const SHIFTED_AUDIO: &str = "shifted_audio.wav";

/// Output path a video job writes to.
///
/// `.mp4`, `.mov` and `.mkv` (any case) are kept; anything else gets `.mp4`
/// appended.
pub fn coerce_video_output(path: &Path) -> PathBuf {
    if is_video_file(path) {
        path.to_path_buf()
    } else {
        let mut coerced = path.as_os_str().to_owned();
        coerced.push(".mp4");
        PathBuf::from(coerced)
    }
}

/// Runs the extract, shift and mux stages for one video file.
#[derive(Clone)]
pub struct VideoPipeline {
    audio: AudioPipeline,
    transcoder: Arc<dyn Transcoder>,
}

impl VideoPipeline {
    pub fn new(audio: AudioPipeline, transcoder: Arc<dyn Transcoder>) -> Self {
        Self { audio, transcoder }
    }

    /// Shift the audio of `input` and write the result to `output`,
    /// returning the path actually written.
    ///
    /// Progress: 12 before extraction, 40 once extracted, the embedded audio
    /// run mapped into 40..95, then 95 once muxed.
    pub fn run(
        &self,
        input: &Path,
        output: &Path,
        semitones: f64,
        sample_rate: Option<u32>,
        ctx: &StageContext<'_>,
    ) -> Result<PathBuf> {
        if !is_video_file(input) {
            return Err(Error::unsupported(input));
        }

        let requested = output;
        let output = coerce_video_output(requested);
        if output != requested {
            tracing::warn!("Output {:?} coerced to {:?}", requested, output);
        }

        let workspace = ctx.workspace;

        ctx.progress.report(12, "Extracting audio track");
        let extracted = workspace.temp_file(EXTRACTED_AUDIO);
        tracing::info!("Extracting audio from {:?}", input);
        self.transcoder.extract_audio(input, &extracted)?;
        ctx.stage_done(40, "Audio track extracted")?;

        let shifted = workspace.temp_file(SHIFTED_AUDIO);
        let audio_ctx = ctx.scoped(40, 95);
        self.audio
            .run(&extracted, &shifted, semitones, sample_rate, &audio_ctx)?;
        ctx.cancel.check()?;

        let staged = workspace.stage(&output);
        tracing::info!("Muxing shifted audio with video from {:?}", input);
        self.transcoder.mux(input, &shifted, &staged)?;
        ctx.stage_done(95, "Muxed shifted audio")?;

        workspace.finalize(&staged, &output)?;
        Ok(output)
    }
}

impl std::fmt::Debug for VideoPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoPipeline")
            .field("audio", &self.audio)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_video_output() {
        assert_eq!(
            coerce_video_output(Path::new("clip_out")),
            PathBuf::from("clip_out.mp4")
        );
        assert_eq!(coerce_video_output(Path::new("a.mp4")), PathBuf::from("a.mp4"));
        assert_eq!(coerce_video_output(Path::new("a.MOV")), PathBuf::from("a.MOV"));
        assert_eq!(coerce_video_output(Path::new("a.mkv")), PathBuf::from("a.mkv"));
        assert_eq!(coerce_video_output(Path::new("a.wav")), PathBuf::from("a.wav.mp4"));
        assert_eq!(coerce_video_output(Path::new("a.avi")), PathBuf::from("a.avi.mp4"));
    }
}
