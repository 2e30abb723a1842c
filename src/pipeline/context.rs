//! Per-job state threaded through pipeline stages.

use super::error::{Error, Result};
use super::progress::Progress;
use repitch_av::Workspace;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag, checked only between stages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The current stage still runs to completion.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`Error::Cancelled`] if cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// What a pipeline run borrows from the job that owns it.
pub struct StageContext<'a> {
    /// Scoped temp directory owned by the job.
    pub workspace: &'a Workspace,
    pub progress: Progress,
    pub cancel: CancelToken,
}

impl<'a> StageContext<'a> {
    pub fn new(workspace: &'a Workspace, progress: Progress, cancel: CancelToken) -> Self {
        Self {
            workspace,
            progress,
            cancel,
        }
    }

    /// Same workspace and cancel flag, progress mapped onto `start..=end`.
    pub fn scoped(&self, start: u8, end: u8) -> StageContext<'a> {
        StageContext {
            workspace: self.workspace,
            progress: self.progress.scoped(start, end),
            cancel: self.cancel.clone(),
        }
    }

    /// Report progress, then check for cancellation before the next stage.
    pub fn stage_done(&self, percent: u8, step: &str) -> Result<()> {
        self.progress.report(percent, step);
        self.cancel.check()
    }
}
