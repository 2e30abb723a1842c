use repitch_common::{MediaKind, PitchUnit};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One conversion request.
///
/// `output` is the requested path; the path actually written may carry a
/// coerced extension and is reported on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Shift in semitones. Values beyond ±24 are accepted here.
    pub semitones: f64,
    /// Output sample rate; `None` keeps the source rate.
    pub sample_rate: Option<u32>,
}

impl JobSpec {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, semitones: f64) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            semitones,
            sample_rate: None,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: Option<u32>) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Pipeline family of the input, `None` when unsupported.
    pub fn media_kind(&self) -> Option<MediaKind> {
        MediaKind::classify(&self.input)
    }

    /// Default output name next to `input`:
    /// `{stem}_pitch{+|-}{amount}{semi|tone}.{wav|mp4}`.
    ///
    /// ```
    /// use repitch::job::JobSpec;
    /// use repitch_common::PitchUnit;
    /// use std::path::{Path, PathBuf};
    ///
    /// assert_eq!(
    ///     JobSpec::suggest_output_path(Path::new("/music/song.mp3"), -2.5, PitchUnit::Tones),
    ///     PathBuf::from("/music/song_pitch-2.5tone.wav"),
    /// );
    /// ```
    pub fn suggest_output_path(input: &Path, amount: f64, unit: PitchUnit) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let sign = if amount >= 0.0 { '+' } else { '-' };
        let extension = MediaKind::classify(input)
            .unwrap_or(MediaKind::Audio)
            .default_output_extension();

        let name = format!(
            "{}_pitch{}{}{}.{}",
            stem,
            sign,
            amount.abs(),
            unit.label(),
            extension
        );
        input.with_file_name(name)
    }
}
