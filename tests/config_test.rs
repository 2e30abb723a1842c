//! Integration tests for configuration loading and the objects built from it.

use repitch::config::{load_config, load_config_or_default, Config};
use repitch::pipeline::Pipelines;
use repitch_av::AudioCodec;
use std::fs;
use tempfile::tempdir;

#[test]
fn explicit_config_file_drives_transcoder_and_vocoder() {
    let dir = tempdir().unwrap();
    let ffmpeg = dir.path().join("ffmpeg");
    fs::write(&ffmpeg, b"").unwrap();
    let path = dir.path().join("repitch.toml");
    fs::write(
        &path,
        format!(
            r#"
[tools]
ffmpeg_path = "{}"

[audio]
mp3_bitrate = "256k"
mux_audio_codec = "flac"

[vocoder]
fft_size = 4096
hop_length = 1024
"#,
            ffmpeg.display()
        ),
    )
    .unwrap();

    let config = load_config_or_default(Some(&path)).unwrap();
    assert_eq!(config.resolve_ffmpeg(), ffmpeg);

    let transcoder = config.transcoder().unwrap();
    assert_eq!(transcoder.program(), ffmpeg.as_path());
    assert_eq!(transcoder.mp3_bitrate(), "256k");
    assert_eq!(transcoder.mux_options().codec, AudioCodec::Flac);
    assert!(transcoder.mux_options().bitrate.is_none());

    let vocoder = config.vocoder().unwrap();
    assert_eq!(vocoder.fft_size(), 4096);
    assert_eq!(vocoder.hop_length(), 1024);

    assert!(Pipelines::from_config(&config).is_ok());
}

#[test]
fn invalid_file_is_rejected_with_path_context() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[vocoder]\nfft_size = 1000\n").unwrap();

    let err = load_config(&path).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("bad.toml"), "{chain}");
    assert!(chain.contains("fft_size"), "{chain}");
}

#[test]
fn malformed_toml_fails_to_parse() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[audio\nmp3_bitrate = ").unwrap();

    assert!(load_config(&path).is_err());
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(load_config_or_default(Some(&dir.path().join("nope.toml"))).is_err());
}

#[test]
fn default_config_builds_pipelines() {
    let config = Config::default();
    let transcoder = config.transcoder().unwrap();
    assert_eq!(transcoder.mux_options().codec, AudioCodec::Aac);
    assert_eq!(transcoder.mux_options().bitrate.as_deref(), Some("192k"));
    assert!(Pipelines::from_config(&config).is_ok());
}
