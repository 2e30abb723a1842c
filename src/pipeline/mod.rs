//! Pitch-shifting pipelines.
//!
//! [`AudioPipeline`] handles plain audio files; [`VideoPipeline`] wraps it
//! with transcoder extract and mux stages. Both consume the pitch-shift and
//! transcoder capabilities through traits so they can run against fakes.

pub mod audio;
pub mod context;
pub mod error;
pub mod progress;
pub mod transform;
pub mod video;

pub use audio::{coerce_audio_output, AudioPipeline, ChannelBuffers};
pub use context::{CancelToken, StageContext};
pub use error::{Error, ErrorKind, Result};
pub use progress::{Progress, ProgressCallback};
pub use repitch_av::Workspace;
pub use transform::{ChannelTransform, MIN_ANALYSIS_WINDOW};
pub use video::{coerce_video_output, VideoPipeline};

use repitch_av::Transcoder;
use repitch_dsp::PitchShift;
use std::sync::Arc;

/// Both pipelines, built over one pair of capabilities.
#[derive(Debug, Clone)]
pub struct Pipelines {
    pub audio: AudioPipeline,
    pub video: VideoPipeline,
}

impl Pipelines {
    pub fn new(shifter: Arc<dyn PitchShift>, transcoder: Arc<dyn Transcoder>) -> Self {
        let audio = AudioPipeline::new(ChannelTransform::new(shifter), Arc::clone(&transcoder));
        let video = VideoPipeline::new(audio.clone(), transcoder);
        Self { audio, video }
    }

    /// Pipelines using the configured phase vocoder and ffmpeg.
    pub fn from_config(config: &crate::config::Config) -> anyhow::Result<Self> {
        let shifter: Arc<dyn PitchShift> = Arc::new(config.vocoder()?);
        let transcoder: Arc<dyn Transcoder> = Arc::new(config.transcoder()?);
        Ok(Self::new(shifter, transcoder))
    }
}
