//! At most one running job at a time.

use super::{Job, JobHandle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a job is already running")]
    Busy,
}

/// Admits a new job only when the previous one has finished.
#[derive(Debug, Clone, Default)]
pub struct JobSlot {
    busy: Arc<AtomicBool>,
}

impl JobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Spawn `job`, or refuse with [`SubmitError::Busy`] while another runs.
    ///
    /// The slot frees itself when the worker returns, even if it panics.
    pub fn submit(&self, job: Job) -> Result<JobHandle, SubmitError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("Refusing job {}: slot busy", job.id());
            return Err(SubmitError::Busy);
        }
        Ok(job.spawn_inner(Some(Arc::clone(&self.busy))))
    }
}
