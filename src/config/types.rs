use repitch_common::PitchUnit;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub vocoder: VocoderConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

/// Where to find the external transcoder.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Explicit path to ffmpeg; wins over everything else when it exists.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Directory holding a bundled ffmpeg, checked before PATH.
    #[serde(default)]
    pub bundled_dir: Option<PathBuf>,
}

/// Encoder settings for the lossy outputs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    #[serde(default = "default_bitrate")]
    pub mp3_bitrate: String,

    /// Codec the shifted track is re-encoded to when muxing video.
    #[serde(default = "default_mux_codec")]
    pub mux_audio_codec: String,

    #[serde(default = "default_bitrate")]
    pub mux_audio_bitrate: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            mp3_bitrate: default_bitrate(),
            mux_audio_codec: default_mux_codec(),
            mux_audio_bitrate: default_bitrate(),
        }
    }
}

fn default_bitrate() -> String {
    "192k".to_string()
}

fn default_mux_codec() -> String {
    "aac".to_string()
}

/// Phase vocoder analysis parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VocoderConfig {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,

    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
}

impl Default for VocoderConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            hop_length: default_hop_length(),
        }
    }
}

fn default_fft_size() -> usize {
    2048
}

fn default_hop_length() -> usize {
    512
}

/// Values the CLI uses when a flag is omitted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub unit: PitchUnit,

    /// Output sample rate; `None` keeps the source rate.
    #[serde(default)]
    pub sample_rate: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    /// Parent directory for job workspaces. System temp dir when unset.
    #[serde(default)]
    pub temp_root: Option<PathBuf>,
}
