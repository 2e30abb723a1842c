//! # repitch-av
//!
//! External transcoder integration for repitch.
//!
//! This crate provides:
//! - The [`Transcoder`] capability and its ffmpeg implementation
//! - Tool discovery and bundled-vs-system path resolution
//! - Per-job scoped [`Workspace`]s with atomic output finalisation
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use repitch_av::{resolve_tool, FfmpegTranscoder, Transcoder, Workspace};
//! use std::path::Path;
//!
//! let ffmpeg = resolve_tool("ffmpeg", None, None);
//! let transcoder = FfmpegTranscoder::new(ffmpeg);
//! let workspace = Workspace::new()?;
//! let wav = workspace.temp_file("orig_audio.wav");
//! transcoder.extract_audio(Path::new("clip.mp4"), &wav)?;
//! # Ok::<(), repitch_av::Error>(())
//! ```

pub mod actions;
mod error;
pub mod tools;
pub mod transcoder;
pub mod workspace;

// Re-exports
pub use actions::{AudioCodec, MuxOptions, ToolOutput};
pub use error::{Error, Result};
pub use tools::{check_tool, check_tools, resolve_tool, ToolInfo};
pub use transcoder::{FfmpegTranscoder, Transcoder};
pub use workspace::Workspace;
