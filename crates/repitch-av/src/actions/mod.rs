//! ffmpeg command construction and execution.
//!
//! Each action is split into an argument builder (pure, unit tested) and a
//! runner that spawns the configured executable:
//! - extracting a PCM audio track from a container
//! - muxing a replacement audio track against an existing video stream
//! - encoding a WAV file to MP3

mod encode;
mod extract;
mod mux;

pub use encode::{encode_mp3, mp3_args};
pub use extract::{extract_args, extract_audio};
pub use mux::{mux, mux_args, AudioCodec, MuxOptions};

use crate::{Error, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Output};

/// Output captured from a finished tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Everything the tool wrote to stdout.
    pub stdout: String,
    /// Everything the tool wrote to stderr.
    pub stderr: String,
}

/// Run a tool to completion, capturing stdout and stderr in full.
///
/// A spawn failure with `NotFound` becomes [`Error::ToolNotFound`]; a non-zero
/// exit becomes [`Error::ToolFailed`] carrying the complete stderr.
pub fn run_tool(program: &Path, args: &[OsString], what: &str) -> Result<ToolOutput> {
    let tool = tool_name(program);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "Running {}: {:?} {}",
        what,
        program,
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let output: Output = Command::new(program).args(args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::tool_not_found(&tool)
        } else {
            Error::Io(e)
        }
    })?;

    let captured = ToolOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if !output.status.success() {
        let message = match output.status.code() {
            Some(code) => format!("{} failed with exit code {}", what, code),
            None => format!("{} terminated by signal", what),
        };

        #[cfg(feature = "tracing")]
        tracing::error!("{}: {}", message, captured.stderr.trim_end());

        return Err(Error::tool_failed(tool, message, captured.stderr));
    }

    Ok(captured)
}

/// Short tool name for diagnostics (`/opt/bin/ffmpeg` -> `ffmpeg`).
fn tool_name(program: &Path) -> String {
    program
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

pub(crate) fn require_input(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::file_not_found(path))
    }
}
