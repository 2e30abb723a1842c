//! Shared fixtures for integration tests: WAV files, a fake transcoder and
//! fake pitch shifters, so pipelines run without ffmpeg.

#![allow(dead_code)]

use repitch::pipeline::Pipelines;
use repitch_av::Transcoder;
use repitch_dsp::{PitchShift, ShiftError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Write a sine tone as 16-bit PCM.
pub fn write_sine_wav(path: &Path, freq: f32, sample_rate: u32, channels: u16, frames: usize) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let sample = (2.0 * std::f32::consts::PI * freq * t).sin() * 0.5;
        for _ in 0..channels {
            writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
        }
    }
    writer.finalize().unwrap();
}

/// (channels, sample_rate, frames) of a WAV file.
pub fn wav_shape(path: &Path) -> (u16, u32, u32) {
    let reader = hound::WavReader::open(path).unwrap();
    let spec = reader.spec();
    (spec.channels, spec.sample_rate, reader.duration())
}

/// Shifter that returns its input scaled by a constant.
pub struct Gain(pub f32);

impl PitchShift for Gain {
    fn shift(&self, buffer: &[f32], _sample_rate: u32, _semitones: f64) -> Result<Vec<f32>, ShiftError> {
        Ok(buffer.iter().map(|s| s * self.0).collect())
    }
}

/// Shifter that always rejects.
pub struct Failing;

impl PitchShift for Failing {
    fn shift(&self, _buffer: &[f32], _sample_rate: u32, _semitones: f64) -> Result<Vec<f32>, ShiftError> {
        Err(ShiftError::InvalidParameters("rejected by test shifter".into()))
    }
}

/// Shifter that sleeps per channel, giving tests time to cancel.
pub struct Slow(pub Duration);

impl PitchShift for Slow {
    fn shift(&self, buffer: &[f32], _sample_rate: u32, _semitones: f64) -> Result<Vec<f32>, ShiftError> {
        std::thread::sleep(self.0);
        Ok(buffer.to_vec())
    }
}

/// Shifter that blocks until released, so a job stays Running.
#[derive(Clone, Default)]
pub struct Gate {
    open: Arc<AtomicBool>,
}

impl Gate {
    pub fn release(&self) {
        self.open.store(true, Ordering::SeqCst);
    }
}

impl PitchShift for Gate {
    fn shift(&self, buffer: &[f32], _sample_rate: u32, _semitones: f64) -> Result<Vec<f32>, ShiftError> {
        while !self.open.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(5));
        }
        Ok(buffer.to_vec())
    }
}

/// Transcoder that copies files around and records what it was asked to do.
#[derive(Default)]
pub struct FakeTranscoder {
    pub calls: Mutex<Vec<String>>,
    /// Extraction source used instead of the real video file.
    pub audio_source: Option<PathBuf>,
    pub fail_extract: bool,
    pub fail_mux: bool,
}

impl FakeTranscoder {
    /// Extraction yields a copy of `wav`.
    pub fn with_audio(wav: &Path) -> Self {
        Self {
            audio_source: Some(wav.to_path_buf()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

impl Transcoder for FakeTranscoder {
    fn extract_audio(&self, input: &Path, wav_out: &Path) -> repitch_av::Result<()> {
        self.record("extract");
        if self.fail_extract {
            return Err(repitch_av::Error::tool_failed(
                "ffmpeg",
                "audio extraction failed with exit code 1",
                "Output file #0 does not contain any stream",
            ));
        }
        let source = self.audio_source.as_deref().unwrap_or(input);
        std::fs::copy(source, wav_out)?;
        Ok(())
    }

    fn mux(&self, _video_source: &Path, audio: &Path, output: &Path) -> repitch_av::Result<()> {
        self.record("mux");
        if self.fail_mux {
            return Err(repitch_av::Error::tool_failed(
                "ffmpeg",
                "mux failed with exit code 1",
                "Conversion failed!",
            ));
        }
        std::fs::copy(audio, output)?;
        Ok(())
    }

    fn encode_mp3(&self, wav: &Path, mp3_out: &Path) -> repitch_av::Result<()> {
        self.record("encode_mp3");
        std::fs::copy(wav, mp3_out)?;
        Ok(())
    }
}

pub fn pipelines(shifter: impl PitchShift + 'static, transcoder: Arc<FakeTranscoder>) -> Pipelines {
    let shifter: Arc<dyn PitchShift> = Arc::new(shifter);
    let transcoder: Arc<dyn Transcoder> = transcoder;
    Pipelines::new(shifter, transcoder)
}

/// Collects events from a synchronous run.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<repitch::JobEvent>>>,
}

impl Recorder {
    pub fn sink(&self) -> impl Fn(repitch::JobEvent) + Send + Sync + 'static {
        let events = Arc::clone(&self.events);
        move |event| events.lock().unwrap().push(event)
    }

    pub fn events(&self) -> Vec<repitch::JobEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn percents(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                repitch::JobEvent::Progress { percent, .. } => Some(percent),
                _ => None,
            })
            .collect()
    }
}
