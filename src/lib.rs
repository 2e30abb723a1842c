//! Repitch - pitch-shift audio files and the audio track of video files
//!
//! This library crate exposes the job runner and pipelines for the binary
//! and for integration testing.

pub mod config;
pub mod job;
pub mod pipeline;

pub use job::{Job, JobEvent, JobHandle, JobOutcome, JobSlot, JobSpec, JobState};
pub use pipeline::{Error, ErrorKind, Pipelines};
