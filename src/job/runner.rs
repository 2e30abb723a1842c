//! Running a [`JobSpec`] to completion.
//!
//! A [`Job`] runs synchronously on whatever thread calls [`Job::run`];
//! [`Job::spawn`] moves it onto tokio's blocking pool and hands back a
//! [`JobHandle`] that streams its events.

use super::types::{JobEvent, JobFailure, JobOutcome, JobRecord};
use super::JobSpec;
use crate::pipeline::{CancelToken, Error, ErrorKind, Pipelines, Progress, StageContext, Workspace};
use repitch_common::MediaKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Progress reported as soon as a job is running.
pub const START_PERCENT: u8 = 5;

/// Observer for job events.
pub type EventSink = Arc<dyn Fn(JobEvent) + Send + Sync>;

/// One pitch-shift conversion. Consumed by running it.
pub struct Job {
    id: Uuid,
    spec: JobSpec,
    pipelines: Pipelines,
    temp_root: Option<PathBuf>,
    cancel: CancelToken,
}

impl Job {
    pub fn new(spec: JobSpec, pipelines: Pipelines) -> Self {
        Self {
            id: Uuid::new_v4(),
            spec,
            pipelines,
            temp_root: None,
            cancel: CancelToken::new(),
        }
    }

    /// Create the job's workspace under `root` instead of the system temp dir.
    pub fn with_temp_root(mut self, root: Option<PathBuf>) -> Self {
        self.temp_root = root;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    /// Token that stops the job at its next stage boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run to completion on the current thread, sending every event to `sink`.
    ///
    /// An unsupported input fails straight away without a `Started` event.
    /// Otherwise the sink sees `Started`, progress starting at 5 and ending at
    /// 100 on success, then exactly one terminal event.
    pub fn run<F>(self, sink: F) -> JobOutcome
    where
        F: Fn(JobEvent) + Send + Sync + 'static,
    {
        self.run_with(Arc::new(sink))
    }

    fn run_with(self, sink: EventSink) -> JobOutcome {
        let Some(kind) = self.spec.media_kind() else {
            let err = Error::unsupported(&self.spec.input);
            tracing::warn!("Job {} rejected: {}", self.id, err);
            return finish(&sink, Err(err));
        };

        tracing::info!(
            "Job {} started: {:?} -> {:?} ({:+} semitones, {})",
            self.id,
            self.spec.input,
            self.spec.output,
            self.spec.semitones,
            kind
        );
        sink(JobEvent::Started);

        let progress_sink = Arc::clone(&sink);
        let progress = Progress::new(Box::new(move |percent, step| {
            progress_sink(JobEvent::Progress {
                percent,
                step: step.to_string(),
            });
        }));
        progress.report(START_PERCENT, "Starting");

        let result = self.execute(kind, &progress);
        if result.is_ok() {
            progress.report(100, "Done");
        }
        finish(&sink, result)
    }

    fn execute(&self, kind: MediaKind, progress: &Progress) -> crate::pipeline::Result<PathBuf> {
        self.cancel.check()?;

        let workspace = match &self.temp_root {
            Some(root) => Workspace::new_in(root)?,
            None => Workspace::new()?,
        };
        tracing::debug!("Job {} workspace: {:?}", self.id, workspace.temp_dir());

        let ctx = StageContext::new(&workspace, progress.clone(), self.cancel.clone());
        let spec = &self.spec;
        let result = match kind {
            MediaKind::Audio => self.pipelines.audio.run(
                &spec.input,
                &spec.output,
                spec.semitones,
                spec.sample_rate,
                &ctx,
            ),
            MediaKind::Video => self.pipelines.video.run(
                &spec.input,
                &spec.output,
                spec.semitones,
                spec.sample_rate,
                &ctx,
            ),
        };

        if let Err(e) = workspace.cleanup() {
            tracing::warn!("Failed to clean up workspace for job {}: {}", self.id, e);
        }
        result
    }

    /// Run on tokio's blocking pool. Must be called inside a runtime.
    pub fn spawn(self) -> JobHandle {
        self.spawn_inner(None)
    }

    pub(crate) fn spawn_inner(self, busy: Option<Arc<AtomicBool>>) -> JobHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let record = JobRecord::new(self.id, &self.spec);
        let cancel = self.cancel.clone();
        let id = self.id;

        let task = tokio::task::spawn_blocking(move || {
            let release = busy.map(|busy| Arc::new(SlotRelease::new(busy)));
            // Frees the slot if the worker panics before its terminal event.
            let _guard = release.clone().map(ReleaseOnDrop);
            self.run(move |event| {
                // The slot is free before the caller can see the job end.
                if event.is_terminal() {
                    if let Some(release) = &release {
                        release.release();
                    }
                }
                // The receiver may already be gone; the outcome is still returned.
                let _ = tx.send(event);
            })
        });

        JobHandle {
            id,
            events: rx,
            cancel,
            task,
            record,
        }
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("spec", &self.spec)
            .field("temp_root", &self.temp_root)
            .finish_non_exhaustive()
    }
}

fn finish(sink: &EventSink, result: crate::pipeline::Result<PathBuf>) -> JobOutcome {
    let outcome = match result {
        Ok(output) => {
            tracing::info!("Job finished: {:?}", output);
            JobOutcome::Succeeded(output)
        }
        Err(Error::Cancelled) => {
            tracing::info!("Job cancelled");
            JobOutcome::Cancelled
        }
        Err(err) => {
            tracing::error!("Job failed: {}", err);
            JobOutcome::Failed(JobFailure::from(&err))
        }
    };

    sink(match &outcome {
        JobOutcome::Succeeded(output) => JobEvent::Succeeded {
            output: output.clone(),
        },
        JobOutcome::Failed(failure) => JobEvent::Failed(failure.clone()),
        JobOutcome::Cancelled => JobEvent::Cancelled,
    });
    outcome
}

/// Clears a slot's busy flag at most once, so a late release cannot free a
/// slot that a newer job has taken.
struct SlotRelease {
    busy: Arc<AtomicBool>,
    released: AtomicBool,
}

impl SlotRelease {
    fn new(busy: Arc<AtomicBool>) -> Self {
        Self {
            busy,
            released: AtomicBool::new(false),
        }
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.busy.store(false, Ordering::SeqCst);
        }
    }
}

struct ReleaseOnDrop(Arc<SlotRelease>);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Handle to a job running in the background.
pub struct JobHandle {
    id: Uuid,
    events: mpsc::UnboundedReceiver<JobEvent>,
    cancel: CancelToken,
    task: JoinHandle<JobOutcome>,
    record: JobRecord,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next event, or `None` once the job has ended and all events are read.
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        let event = self.events.recv().await?;
        self.record.apply(&event);
        Some(event)
    }

    /// Ask the job to stop at its next stage boundary.
    pub fn cancel(&self) {
        tracing::debug!("Cancellation requested for job {}", self.id);
        self.cancel.cancel();
    }

    /// Token for cancelling from elsewhere without borrowing the handle.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// State as of the last event read through [`next_event`](Self::next_event).
    pub fn record(&self) -> &JobRecord {
        &self.record
    }

    /// Wait for the job to end. Unread events are discarded.
    pub async fn wait(self) -> JobOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Job {} worker died: {}", self.id, e);
                JobOutcome::Failed(JobFailure::new(
                    ErrorKind::Internal,
                    format!("job worker died: {e}"),
                ))
            }
        }
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.id)
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}
