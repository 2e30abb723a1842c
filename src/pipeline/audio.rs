//! Audio pipeline: decode, shift every channel, encode.

use super::context::StageContext;
use super::error::{Error, Result};
use super::transform::ChannelTransform;
use repitch_av::{Transcoder, Workspace};
use repitch_common::paths::{has_extension, is_audio_file};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-channel sample buffers that share one sample rate and one length.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBuffers {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl ChannelBuffers {
    /// Wrap per-channel buffers.
    ///
    /// # Errors
    ///
    /// Fails when there are no channels, the rate is zero, or the channels
    /// differ in length.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if channels.is_empty() {
            return Err(Error::Decode("no audio channels".to_string()));
        }
        if sample_rate == 0 {
            return Err(Error::Decode("sample rate is zero".to_string()));
        }
        let frames = channels[0].len();
        if let Some(bad) = channels.iter().position(|c| c.len() != frames) {
            return Err(Error::Decode(format!(
                "channel {} has {} samples, expected {}",
                bad,
                channels[bad].len(),
                frames
            )));
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Split interleaved samples into channels.
    pub fn from_interleaved(
        samples: &[f32],
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if num_channels == 0 {
            return Err(Error::Decode("no audio channels".to_string()));
        }
        let frames = samples.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];
        for frame in samples.chunks_exact(num_channels) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::new(channels, sample_rate)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Frame-interleaved samples.
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len() * self.num_channels());
        for i in 0..self.len() {
            for channel in &self.channels {
                out.push(channel[i]);
            }
        }
        out
    }
}

/// Output path an audio job writes to.
///
/// `.wav` and `.mp3` (any case) are kept; anything else gets `.wav`
/// appended.
pub fn coerce_audio_output(path: &Path) -> PathBuf {
    if has_extension(path, "wav") || has_extension(path, "mp3") {
        path.to_path_buf()
    } else {
        let mut coerced = path.as_os_str().to_owned();
        coerced.push(".wav");
        PathBuf::from(coerced)
    }
}

/// Decodes, shifts and encodes plain audio files.
#[derive(Clone)]
pub struct AudioPipeline {
    transform: ChannelTransform,
    transcoder: Arc<dyn Transcoder>,
}

impl AudioPipeline {
    /// `transcoder` is only used for MP3 output.
    pub fn new(transform: ChannelTransform, transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            transform,
            transcoder,
        }
    }

    pub fn transform(&self) -> &ChannelTransform {
        &self.transform
    }

    /// Decode `path` into per-channel buffers.
    ///
    /// With `requested_sample_rate` the result is resampled to that rate,
    /// otherwise the native rate is kept.
    pub fn decode(
        &self,
        path: &Path,
        requested_sample_rate: Option<u32>,
    ) -> Result<ChannelBuffers> {
        if !is_audio_file(path) {
            return Err(Error::unsupported(path));
        }

        tracing::info!("Decoding {:?}", path);
        let decoded = decode_file(path)?;
        tracing::debug!(
            "Decoded {} channel(s), {} samples at {} Hz",
            decoded.num_channels(),
            decoded.len(),
            decoded.sample_rate()
        );

        match requested_sample_rate {
            Some(rate) if rate != decoded.sample_rate() => {
                tracing::info!("Resampling {} Hz -> {} Hz", decoded.sample_rate(), rate);
                let from = decoded.sample_rate();
                let channels =
                    repitch_dsp::resample_channels(&decoded.into_channels(), from, rate)
                        .map_err(|e| Error::Decode(format!("resampling failed: {e}")))?;
                ChannelBuffers::new(channels, rate)
            }
            _ => Ok(decoded),
        }
    }

    /// Shift every channel independently and reassemble them in order.
    ///
    /// If the capability returns channels of different lengths, the shorter
    /// ones are padded with silence so the set keeps one length.
    pub fn process(&self, buffers: &ChannelBuffers, semitones: f64) -> Result<ChannelBuffers> {
        tracing::info!(
            "Shifting {} channel(s) by {} semitones",
            buffers.num_channels(),
            semitones
        );

        let mut shifted = buffers
            .channels()
            .iter()
            .enumerate()
            .map(|(index, channel)| {
                tracing::debug!("Shifting channel {}", index);
                self.transform
                    .shift(channel, buffers.sample_rate(), semitones)
            })
            .collect::<Result<Vec<_>>>()?;

        let longest = shifted.iter().map(Vec::len).max().unwrap_or(0);
        for channel in shifted.iter_mut() {
            channel.resize(longest, 0.0);
        }

        ChannelBuffers::new(shifted, buffers.sample_rate())
    }

    /// Encode to `output`, returning the path actually written.
    ///
    /// `.wav` is written directly, `.mp3` goes through the transcoder, any
    /// other path is coerced to `.wav` (see [`coerce_audio_output`]). The
    /// file only appears at its destination once it is complete.
    pub fn encode(
        &self,
        buffers: &ChannelBuffers,
        output: &Path,
        workspace: &Workspace,
    ) -> Result<PathBuf> {
        let (staged, actual) = self.encode_staged(buffers, output, workspace)?;
        workspace.finalize(&staged, &actual)?;
        Ok(actual)
    }

    /// Encode into the workspace. Returns the staged file and its final
    /// destination.
    fn encode_staged(
        &self,
        buffers: &ChannelBuffers,
        output: &Path,
        workspace: &Workspace,
    ) -> Result<(PathBuf, PathBuf)> {
        let actual = coerce_audio_output(output);
        if actual != output {
            tracing::warn!("Output {:?} coerced to {:?}", output, actual);
        }

        let staged = workspace.stage(&actual);

        if has_extension(&actual, "mp3") {
            // Removed when dropped, whether or not the encode succeeds.
            let intermediate = tempfile::Builder::new()
                .prefix("encode_intermediate-")
                .suffix(".wav")
                .tempfile_in(workspace.temp_dir())
                .map_err(|e| {
                    Error::Workspace(format!("failed to create intermediate file: {e}"))
                })?
                .into_temp_path();
            write_wav(buffers, &intermediate)?;
            self.transcoder.encode_mp3(&intermediate, &staged)?;
        } else {
            write_wav(buffers, &staged)?;
        }

        tracing::info!("Encoded {:?}", actual);
        Ok((staged, actual))
    }

    /// Decode, shift and encode one file, reporting 10/30/70/90.
    pub fn run(
        &self,
        input: &Path,
        output: &Path,
        semitones: f64,
        sample_rate: Option<u32>,
        ctx: &StageContext<'_>,
    ) -> Result<PathBuf> {
        ctx.progress.report(10, "Decoding audio");
        let buffers = self.decode(input, sample_rate)?;
        ctx.stage_done(
            30,
            &format!(
                "Decoded {} channel(s) at {} Hz",
                buffers.num_channels(),
                buffers.sample_rate()
            ),
        )?;

        let shifted = self.process(&buffers, semitones)?;
        ctx.stage_done(70, "Pitch shift complete")?;

        let (staged, actual) = self.encode_staged(&shifted, output, ctx.workspace)?;
        ctx.stage_done(90, "Encoding complete")?;

        ctx.workspace.finalize(&staged, &actual)?;
        Ok(actual)
    }
}

impl std::fmt::Debug for AudioPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioPipeline")
            .field("transform", &self.transform)
            .finish_non_exhaustive()
    }
}

/// Write 16-bit PCM WAV.
pub fn write_wav(buffers: &ChannelBuffers, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: buffers.num_channels() as u16,
        sample_rate: buffers.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| Error::Encode(format!("failed to create {:?}: {e}", path)))?;

    for i in 0..buffers.len() {
        for channel in buffers.channels() {
            let sample = (channel[i].clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
            writer
                .write_sample(sample)
                .map_err(|e| Error::Encode(format!("write error: {e}")))?;
        }
    }

    writer
        .finalize()
        .map_err(|e| Error::Encode(format!("finalize error: {e}")))?;
    Ok(())
}

/// Decode any supported audio file with symphonia.
fn decode_file(path: &Path) -> Result<ChannelBuffers> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::Decode(format!("failed to open {:?}: {e}", path)))?;
    decode_source(Box::new(file), path)
}

/// Decode from any media source. `path` supplies the format hint and the
/// name used in messages.
fn decode_source(
    source: Box<dyn symphonia::core::io::MediaSource>,
    path: &Path,
) -> Result<ChannelBuffers> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
    use symphonia::core::errors::Error as SymphoniaError;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|value| value.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| Error::Decode(format!("unrecognised audio data: {err}")))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("no decodable audio track found".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut num_channels = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|err| Error::Decode(format!("unsupported audio codec: {err}")))?;

    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut buffer_frames = 0usize;
    let mut samples = Vec::<f32>::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::IoError(err)) => {
                return Err(Error::Decode(format!("failed to read {:?}: {err}", path)));
            }
            Err(SymphoniaError::ResetRequired) => {
                return Err(Error::Decode(
                    "chained audio streams are not supported".to_string(),
                ));
            }
            Err(err) => {
                return Err(Error::Decode(format!("failed to read audio packet: {err}")));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(audio_buf) => {
                let spec = *audio_buf.spec();
                sample_rate.get_or_insert(spec.rate);
                num_channels.get_or_insert(spec.channels.count());

                // Packets can grow (e.g. VBR frames), so reallocate on demand.
                if buffer_frames < audio_buf.capacity() {
                    buffer_frames = audio_buf.capacity();
                    sample_buf = Some(SampleBuffer::<f32>::new(buffer_frames as u64, spec));
                }
                if let Some(buffer) = sample_buf.as_mut() {
                    buffer.copy_interleaved_ref(audio_buf);
                    samples.extend_from_slice(buffer.samples());
                }
            }
            Err(SymphoniaError::DecodeError(err)) => {
                tracing::warn!("Skipping undecodable packet in {:?}: {}", path, err);
                continue;
            }
            Err(err) => {
                return Err(Error::Decode(format!("failed to decode audio packet: {err}")));
            }
        }
    }

    let sample_rate =
        sample_rate.ok_or_else(|| Error::Decode("audio sample rate is unknown".to_string()))?;
    let num_channels =
        num_channels.ok_or_else(|| Error::Decode("audio channel count is unknown".to_string()))?;

    if samples.is_empty() {
        return Err(Error::Decode("no decodable audio samples found".to_string()));
    }

    ChannelBuffers::from_interleaved(&samples, num_channels, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use repitch_dsp::PitchShift;

    /// Multiplies every sample by the shift amount.
    struct Scale;

    impl PitchShift for Scale {
        fn shift(&self, signal: &[f32], _sr: u32, semitones: f64) -> repitch_dsp::Result<Vec<f32>> {
            Ok(signal.iter().map(|s| s * semitones as f32).collect())
        }
    }

    /// Transcoder that must never be called.
    struct NoTranscoder;

    impl Transcoder for NoTranscoder {
        fn extract_audio(&self, _: &Path, _: &Path) -> repitch_av::Result<()> {
            panic!("extract_audio called")
        }
        fn mux(&self, _: &Path, _: &Path, _: &Path) -> repitch_av::Result<()> {
            panic!("mux called")
        }
        fn encode_mp3(&self, _: &Path, _: &Path) -> repitch_av::Result<()> {
            panic!("encode_mp3 called")
        }
    }

    fn pipeline() -> AudioPipeline {
        AudioPipeline::new(
            ChannelTransform::new(Arc::new(Scale)),
            Arc::new(NoTranscoder),
        )
    }

    #[test]
    fn test_coerce_audio_output() {
        assert_eq!(coerce_audio_output(Path::new("a.wav")), PathBuf::from("a.wav"));
        assert_eq!(coerce_audio_output(Path::new("a.WAV")), PathBuf::from("a.WAV"));
        assert_eq!(coerce_audio_output(Path::new("a.mp3")), PathBuf::from("a.mp3"));
        assert_eq!(coerce_audio_output(Path::new("a")), PathBuf::from("a.wav"));
        assert_eq!(
            coerce_audio_output(Path::new("notes.txt")),
            PathBuf::from("notes.txt.wav")
        );
        assert_eq!(
            coerce_audio_output(Path::new("song.flac")),
            PathBuf::from("song.flac.wav")
        );
    }

    #[test]
    fn test_channel_buffers_rejects_ragged_channels() {
        assert!(ChannelBuffers::new(vec![vec![0.0; 3], vec![0.0; 4]], 44100).is_err());
        assert!(ChannelBuffers::new(vec![], 44100).is_err());
        assert!(ChannelBuffers::new(vec![vec![0.0; 3]], 0).is_err());
    }

    #[test]
    fn test_interleave_roundtrip() {
        let buffers = ChannelBuffers::from_interleaved(&[1.0, -1.0, 2.0, -2.0], 2, 8000).unwrap();
        assert_eq!(buffers.channel(0), Some(&[1.0, 2.0][..]));
        assert_eq!(buffers.channel(1), Some(&[-1.0, -2.0][..]));
        assert_eq!(buffers.interleaved(), vec![1.0, -1.0, 2.0, -2.0]);
        assert_eq!(buffers.len(), 2);
        assert!((buffers.duration_secs() - 0.00025).abs() < 1e-9);
    }

    #[test]
    fn test_process_keeps_channel_order_and_count() {
        let buffers =
            ChannelBuffers::new(vec![vec![0.1; 3000], vec![0.2; 3000], vec![0.3; 3000]], 44100)
                .unwrap();
        let out = pipeline().process(&buffers, 2.0).unwrap();

        assert_eq!(out.num_channels(), 3);
        assert_eq!(out.sample_rate(), 44100);
        assert!((out.channel(0).unwrap()[0] - 0.2).abs() < 1e-6);
        assert!((out.channel(1).unwrap()[0] - 0.4).abs() < 1e-6);
        assert!((out.channel(2).unwrap()[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_channels_are_shifted_independently() {
        let steady: Vec<f32> = (0..3000).map(|i| (i as f32 * 0.01).sin()).collect();
        let first = ChannelBuffers::new(vec![vec![0.1; 3000], steady.clone()], 44100).unwrap();
        let noisy: Vec<f32> = (0..3000).map(|i| ((i * 7919) % 201) as f32 / 100.0 - 1.0).collect();
        let second = ChannelBuffers::new(vec![noisy, steady], 44100).unwrap();

        let a = pipeline().process(&first, 3.0).unwrap();
        let b = pipeline().process(&second, 3.0).unwrap();

        assert_ne!(a.channel(0), b.channel(0));
        assert_eq!(a.channel(1), b.channel(1));
    }

    #[test]
    fn test_encode_wav_and_decode_back() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new().unwrap();
        let buffers = ChannelBuffers::new(vec![vec![0.5; 1000], vec![-0.25; 1000]], 22050).unwrap();

        let out = pipeline()
            .encode(&buffers, &dir.path().join("out.wav"), &workspace)
            .unwrap();
        assert_eq!(out, dir.path().join("out.wav"));

        let decoded = pipeline().decode(&out, None).unwrap();
        assert_eq!(decoded.num_channels(), 2);
        assert_eq!(decoded.sample_rate(), 22050);
        assert_eq!(decoded.len(), 1000);
        assert!((decoded.channel(0).unwrap()[10] - 0.5).abs() < 1e-3);
        assert!((decoded.channel(1).unwrap()[10] + 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_encode_coerces_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new().unwrap();
        let buffers = ChannelBuffers::new(vec![vec![0.0; 10]], 8000).unwrap();

        let out = pipeline()
            .encode(&buffers, &dir.path().join("result"), &workspace)
            .unwrap();
        assert_eq!(out, dir.path().join("result.wav"));
        assert!(out.exists());
        assert!(!dir.path().join("result").exists());
    }

    #[test]
    fn test_decode_rejects_unsupported_extension() {
        let err = pipeline().decode(Path::new("movie.avi"), None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_decode_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        std::fs::write(&path, b"definitely not RIFF data").unwrap();

        let err = pipeline().decode(&path, None).unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "{err:?}");
    }

    #[test]
    fn test_decode_missing_file() {
        let err = pipeline()
            .decode(Path::new("/definitely/missing/song.wav"), None)
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    /// Transcoder whose MP3 encode copies the WAV, or fails on request.
    struct CopyMp3 {
        fail: bool,
    }

    impl Transcoder for CopyMp3 {
        fn extract_audio(&self, _: &Path, _: &Path) -> repitch_av::Result<()> {
            panic!("extract_audio called")
        }
        fn mux(&self, _: &Path, _: &Path, _: &Path) -> repitch_av::Result<()> {
            panic!("mux called")
        }
        fn encode_mp3(&self, wav: &Path, mp3_out: &Path) -> repitch_av::Result<()> {
            assert!(wav.exists());
            if self.fail {
                return Err(repitch_av::Error::tool_failed("ffmpeg", "mp3 failed", "no lame"));
            }
            std::fs::copy(wav, mp3_out)?;
            Ok(())
        }
    }

    #[test]
    fn test_mp3_intermediate_is_removed() {
        for fail in [false, true] {
            let dir = tempfile::tempdir().unwrap();
            let workspace = Workspace::new().unwrap();
            let pipeline = AudioPipeline::new(
                ChannelTransform::new(Arc::new(Scale)),
                Arc::new(CopyMp3 { fail }),
            );
            let buffers = ChannelBuffers::new(vec![vec![0.25; 500]], 8000).unwrap();

            let result = pipeline.encode(&buffers, &dir.path().join("out.mp3"), &workspace);
            assert_eq!(result.is_ok(), !fail);
            assert_eq!(dir.path().join("out.mp3").exists(), !fail);

            let leftovers: Vec<_> = std::fs::read_dir(workspace.temp_dir())
                .unwrap()
                .map(|e| e.unwrap().file_name())
                .filter(|name| name.to_string_lossy().starts_with("encode_intermediate"))
                .collect();
            assert!(leftovers.is_empty(), "{leftovers:?}");
        }
    }

    /// Serves `data` until `fail_at` bytes have been read, then errors.
    struct FlakySource {
        data: std::io::Cursor<Vec<u8>>,
        fail_at: u64,
    }

    impl std::io::Read for FlakySource {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.data.position() >= self.fail_at {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "device went away",
                ));
            }
            let remaining = (self.fail_at - self.data.position()) as usize;
            let len = buf.len().min(remaining);
            self.data.read(&mut buf[..len])
        }
    }

    impl std::io::Seek for FlakySource {
        fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
            self.data.seek(pos)
        }
    }

    impl symphonia::core::io::MediaSource for FlakySource {
        fn is_seekable(&self) -> bool {
            true
        }

        fn byte_len(&self) -> Option<u64> {
            Some(self.data.get_ref().len() as u64)
        }
    }

    fn wav_bytes(frames: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..frames {
                writer.write_sample((i % 100) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_read_failure_mid_stream_is_a_decode_error() {
        let data = wav_bytes(100_000);
        let source = FlakySource {
            data: std::io::Cursor::new(data),
            fail_at: 120_000,
        };

        let err = decode_source(Box::new(source), Path::new("song.wav")).unwrap_err();
        assert!(matches!(err, Error::Decode(ref msg) if msg.contains("device went away")), "{err:?}");
    }

    #[test]
    fn test_truncated_file_decodes_what_is_there() {
        let mut data = wav_bytes(10_000);
        data.truncate(data.len() / 2);
        let len = data.len() as u64;
        let source = FlakySource {
            data: std::io::Cursor::new(data),
            fail_at: len + 1,
        };

        let decoded = decode_source(Box::new(source), Path::new("song.wav")).unwrap();
        assert_eq!(decoded.num_channels(), 1);
        assert!(decoded.len() > 3000 && decoded.len() < 5000, "{}", decoded.len());
    }
}
