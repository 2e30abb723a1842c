use crate::pipeline::{Error, ErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use super::JobSpec;

/// Lifecycle of a job. Terminal states never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Idle,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// What a failed job reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: ErrorKind,
    pub message: String,
    /// Diagnostic text: transcoder stderr or an error chain.
    pub detail: Option<String>,
}

impl JobFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }
}

impl From<&Error> for JobFailure {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            detail: err.detail(),
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n\n{}", detail.trim_end())?;
        }
        Ok(())
    }
}

/// Notifications a job sends to its observer, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    Started,
    Progress { percent: u8, step: String },
    Succeeded { output: PathBuf },
    Failed(JobFailure),
    Cancelled,
}

impl JobEvent {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed(_) | Self::Cancelled)
    }
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded(PathBuf),
    Failed(JobFailure),
    Cancelled,
}

impl JobOutcome {
    pub fn state(&self) -> JobState {
        match self {
            Self::Succeeded(_) => JobState::Succeeded,
            Self::Failed(_) => JobState::Failed,
            Self::Cancelled => JobState::Cancelled,
        }
    }

    /// Path actually written, on success.
    pub fn output(&self) -> Option<&PathBuf> {
        match self {
            Self::Succeeded(path) => Some(path),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// Snapshot of a job built from its event stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub input: PathBuf,
    pub file_name: String,
    pub semitones: f64,
    pub state: JobState,
    pub progress: u8,
    pub current_step: Option<String>,
    pub output: Option<PathBuf>,
    pub error: Option<JobFailure>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(id: Uuid, spec: &JobSpec) -> Self {
        let file_name = spec
            .input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            id,
            input: spec.input.clone(),
            file_name,
            semitones: spec.semitones,
            state: JobState::Idle,
            progress: 0,
            current_step: None,
            output: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn start(&mut self) {
        self.state = JobState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn update_progress(&mut self, progress: u8, step: &str) {
        self.progress = progress.min(100).max(self.progress);
        self.current_step = Some(step.to_string());
    }

    pub fn complete(&mut self, output: PathBuf) {
        self.state = JobState::Succeeded;
        self.progress = 100;
        self.current_step = None;
        self.output = Some(output);
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, failure: JobFailure) {
        self.state = JobState::Failed;
        self.error = Some(failure);
        self.completed_at = Some(Utc::now());
    }

    pub fn cancel(&mut self) {
        self.state = JobState::Cancelled;
        self.completed_at = Some(Utc::now());
    }

    /// Fold one event into the record. Events after a terminal one are ignored.
    pub fn apply(&mut self, event: &JobEvent) {
        if self.state.is_terminal() {
            return;
        }
        match event {
            JobEvent::Started => self.start(),
            JobEvent::Progress { percent, step } => self.update_progress(*percent, step),
            JobEvent::Succeeded { output } => self.complete(output.clone()),
            JobEvent::Failed(failure) => self.fail(failure.clone()),
            JobEvent::Cancelled => self.cancel(),
        }
    }

    /// Wall-clock run time, once both ends are known.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}
