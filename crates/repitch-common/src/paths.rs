//! Path utilities for detecting file types by extension.
//!
//! These tables decide which pipeline a job runs through: audio files are
//! decoded directly, video files go through the transcoder first.

use std::path::Path;

/// List of supported audio file extensions.
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "flac", "m4a", "aac"];

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv"];

/// Lowercased extension of a path, if it has one.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use repitch_common::paths::extension_lowercase;
///
/// assert_eq!(extension_lowercase(Path::new("Song.MP3")).as_deref(), Some("mp3"));
/// assert_eq!(extension_lowercase(Path::new("no_extension")), None);
/// ```
pub fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check whether a path ends in the given extension, ignoring case.
pub fn has_extension(path: &Path, ext: &str) -> bool {
    extension_lowercase(path)
        .map(|actual| actual == ext.to_lowercase())
        .unwrap_or(false)
}

/// Check if a path has an audio file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use repitch_common::paths::is_audio_file;
///
/// assert!(is_audio_file(Path::new("song.flac")));
/// assert!(is_audio_file(Path::new("/path/to/voice.M4A")));
/// assert!(!is_audio_file(Path::new("clip.mp4")));
/// ```
pub fn is_audio_file(path: &Path) -> bool {
    extension_lowercase(path)
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use repitch_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("clip.mkv")));
/// assert!(!is_video_file(Path::new("song.wav")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    extension_lowercase(path)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Get the list of audio file extensions.
#[must_use]
pub fn audio_extensions() -> &'static [&'static str] {
    AUDIO_EXTENSIONS
}

/// Get the list of video file extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_audio_file() {
        for name in ["a.wav", "a.mp3", "a.ogg", "a.flac", "a.m4a", "a.aac"] {
            assert!(is_audio_file(Path::new(name)), "{name}");
        }

        // Case insensitive
        assert!(is_audio_file(Path::new("song.WAV")));
        assert!(is_audio_file(Path::new("song.Mp3")));

        assert!(!is_audio_file(Path::new("clip.mp4")));
        assert!(!is_audio_file(Path::new("notes.txt")));
        assert!(!is_audio_file(Path::new("no_extension")));
    }

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("clip.mp4")));
        assert!(is_video_file(Path::new("clip.mov")));
        assert!(is_video_file(Path::new("clip.mkv")));
        assert!(is_video_file(Path::new("/path/to/clip.MKV")));

        // Containers the pipeline does not handle
        assert!(!is_video_file(Path::new("clip.avi")));
        assert!(!is_video_file(Path::new("clip.webm")));
        assert!(!is_video_file(Path::new("song.wav")));
    }

    #[test]
    fn test_sets_are_disjoint() {
        for ext in audio_extensions() {
            assert!(!video_extensions().contains(ext));
        }
        assert_eq!(audio_extensions().len(), 6);
        assert_eq!(video_extensions().len(), 3);
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("out.WAV"), "wav"));
        assert!(has_extension(Path::new("out.mp3"), "MP3"));
        assert!(!has_extension(Path::new("out"), "wav"));
        assert!(!has_extension(Path::new("out.wav.txt"), "wav"));
    }

    #[test]
    fn test_edge_cases() {
        assert!(!is_audio_file(Path::new("")));
        assert!(!is_video_file(Path::new("")));

        // Hidden files and multiple dots
        assert!(is_audio_file(Path::new(".hidden.wav")));
        assert!(is_video_file(Path::new("holiday.2024.final.mp4")));
        assert!(!is_audio_file(Path::new(".wav")));
    }
}
