//! Failure taxonomy shared by the audio and video pipelines.

use repitch_dsp::ShiftError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a job.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input extension is outside both supported sets.
    #[error("unsupported format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// Source file unreadable or corrupt.
    #[error("decode error: {0}")]
    Decode(String),

    /// The pitch-shift capability rejected a buffer.
    #[error("transform error: {0}")]
    Transform(#[from] ShiftError),

    /// The external transcoder could not run or exited non-zero.
    #[error("{tool} failed: {message}")]
    ExternalProcess {
        tool: String,
        message: String,
        stderr: String,
    },

    /// Output writer failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Scoped temp directory or output finalisation failed.
    #[error("workspace error: {0}")]
    Workspace(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cancelled between stages.
    #[error("job cancelled")]
    Cancelled,
}

/// Error class surfaced to callers on the failure event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnsupportedFormat,
    DecodeError,
    TransformError,
    ExternalProcessError,
    EncodeError,
    WorkspaceError,
    IoError,
    Cancelled,
    /// The worker died without reporting (panic).
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::UnsupportedFormat => "UnsupportedFormat",
            Self::DecodeError => "DecodeError",
            Self::TransformError => "TransformError",
            Self::ExternalProcessError => "ExternalProcessError",
            Self::EncodeError => "EncodeError",
            Self::WorkspaceError => "WorkspaceError",
            Self::IoError => "IoError",
            Self::Cancelled => "Cancelled",
            Self::Internal => "Internal",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Create an unsupported format error.
    pub fn unsupported(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedFormat { path: path.into() }
    }

    /// Error class of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::Decode(_) => ErrorKind::DecodeError,
            Self::Transform(_) => ErrorKind::TransformError,
            Self::ExternalProcess { .. } => ErrorKind::ExternalProcessError,
            Self::Encode(_) => ErrorKind::EncodeError,
            Self::Workspace(_) => ErrorKind::WorkspaceError,
            Self::Io(_) => ErrorKind::IoError,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Raw diagnostic detail: captured transcoder stderr when there is
    /// any, otherwise the debug form of the failure. Only cancellation
    /// carries none.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Cancelled => None,
            Self::ExternalProcess { stderr, .. } if !stderr.is_empty() => Some(stderr.clone()),
            Self::Transform(e) => Some(format!("{:?}", e)),
            Self::Io(e) => Some(format!("{:?}", e)),
            other => Some(format!("{:?}", other)),
        }
    }
}

impl From<repitch_av::Error> for Error {
    fn from(err: repitch_av::Error) -> Self {
        use repitch_av::Error as AvError;

        match err {
            AvError::ToolNotFound { tool } => Self::ExternalProcess {
                message: format!("{} executable not found", tool),
                tool,
                stderr: String::new(),
            },
            AvError::ToolFailed {
                tool,
                message,
                stderr,
            } => Self::ExternalProcess {
                tool,
                message,
                stderr,
            },
            AvError::FileNotFound { path } => {
                Self::Decode(format!("file not found: {}", path.display()))
            }
            AvError::Io(e) => Self::Io(e),
            AvError::Workspace(msg) => Self::Workspace(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failure_keeps_stderr() {
        let err: Error = repitch_av::Error::tool_failed(
            "ffmpeg",
            "extract audio failed with exit code 1",
            "clip.mp4: Invalid data found when processing input",
        )
        .into();

        assert_eq!(err.kind(), ErrorKind::ExternalProcessError);
        assert_eq!(
            err.to_string(),
            "ffmpeg failed: extract audio failed with exit code 1"
        );
        assert_eq!(
            err.detail().as_deref(),
            Some("clip.mp4: Invalid data found when processing input")
        );
    }

    #[test]
    fn test_missing_tool_is_external_process_error() {
        let err: Error = repitch_av::Error::tool_not_found("ffmpeg").into();
        assert_eq!(err.kind(), ErrorKind::ExternalProcessError);
        let detail = err.detail().unwrap();
        assert!(detail.contains("ExternalProcess"), "{detail}");
        assert!(detail.contains("ffmpeg"), "{detail}");
    }

    #[test]
    fn test_every_failure_but_cancel_has_detail() {
        let cases = [
            (Error::Decode("bad header in song.mp3".into()), "bad header in song.mp3"),
            (Error::Encode("disk full".into()), "disk full"),
            (Error::Workspace("rename failed".into()), "rename failed"),
            (Error::unsupported("clip.avi"), "clip.avi"),
        ];
        for (err, needle) in cases {
            let detail = err.detail().unwrap_or_else(|| panic!("no detail for {err}"));
            assert!(detail.contains(needle), "{detail}");
        }
        assert!(Error::Cancelled.detail().is_none());
    }

    #[test]
    fn test_shift_error_is_transform_error() {
        let err: Error = ShiftError::InvalidSampleRate(0).into();
        assert_eq!(err.kind(), ErrorKind::TransformError);
        assert_eq!(err.to_string(), "transform error: invalid sample rate: 0");
        assert!(err.detail().unwrap().contains("InvalidSampleRate"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Error::unsupported("a.avi").kind().to_string(), "UnsupportedFormat");
        assert_eq!(Error::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(
            Error::Encode("disk full".into()).kind().to_string(),
            "EncodeError"
        );
    }
}
