mod types;

pub use types::*;

use anyhow::{Context, Result};
use repitch_av::{AudioCodec, FfmpegTranscoder, MuxOptions};
use repitch_dsp::PhaseVocoder;
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config).with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./repitch.toml",
        "./config.toml",
        "~/.config/repitch/config.toml",
        "/etc/repitch/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let vocoder = &config.vocoder;
    if vocoder.fft_size < 256 || !vocoder.fft_size.is_power_of_two() {
        anyhow::bail!(
            "vocoder.fft_size must be a power of two of at least 256, got {}",
            vocoder.fft_size
        );
    }
    if vocoder.hop_length == 0 || vocoder.hop_length > vocoder.fft_size {
        anyhow::bail!(
            "vocoder.hop_length must be between 1 and fft_size ({}), got {}",
            vocoder.fft_size,
            vocoder.hop_length
        );
    }

    if config.audio.mp3_bitrate.trim().is_empty() {
        anyhow::bail!("audio.mp3_bitrate cannot be empty");
    }
    if config.audio.mux_audio_bitrate.trim().is_empty() {
        anyhow::bail!("audio.mux_audio_bitrate cannot be empty");
    }
    config
        .audio
        .mux_audio_codec
        .parse::<AudioCodec>()
        .map_err(|e| anyhow::anyhow!("audio.mux_audio_codec: {}", e))?;

    if config.defaults.sample_rate == Some(0) {
        anyhow::bail!("defaults.sample_rate must be positive");
    }

    if let Some(ref path) = config.tools.ffmpeg_path {
        if !path.exists() {
            tracing::warn!("Configured ffmpeg path does not exist: {:?}", path);
        }
    }

    Ok(())
}

impl Config {
    /// Resolve the ffmpeg executable: configured path, bundled copy, PATH,
    /// then the bare name.
    pub fn resolve_ffmpeg(&self) -> PathBuf {
        repitch_av::resolve_tool(
            "ffmpeg",
            self.tools.ffmpeg_path.as_deref(),
            self.tools.bundled_dir.as_deref(),
        )
    }

    /// Build the transcoder described by this configuration.
    pub fn transcoder(&self) -> Result<FfmpegTranscoder> {
        let codec = self
            .audio
            .mux_audio_codec
            .parse::<AudioCodec>()
            .map_err(|e| anyhow::anyhow!(e))?;

        // Lossless codecs ignore the bitrate.
        let bitrate = codec
            .default_bitrate()
            .map(|_| self.audio.mux_audio_bitrate.clone());

        Ok(FfmpegTranscoder::new(self.resolve_ffmpeg())
            .with_mp3_bitrate(self.audio.mp3_bitrate.clone())
            .with_mux_options(MuxOptions { codec, bitrate }))
    }

    /// Build the pitch shifter described by this configuration.
    pub fn vocoder(&self) -> Result<PhaseVocoder> {
        PhaseVocoder::new(self.vocoder.fft_size, self.vocoder.hop_length)
            .context("Invalid vocoder settings")
    }
}
