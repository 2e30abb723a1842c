//! Monotonic progress reporting.
//!
//! Pipelines report in their own 0-100 scale. A [`Progress`] maps that scale
//! into the range it was scoped to and forwards the result to one shared
//! callback, dropping anything that would move the overall value backwards.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(u8, &str) + Send + Sync>;

struct Shared {
    callback: Option<ProgressCallback>,
    last: AtomicU8,
}

/// Handle used by pipeline stages to report progress.
#[derive(Clone)]
pub struct Progress {
    shared: Arc<Shared>,
    start: f32,
    end: f32,
}

impl Progress {
    /// Report into `callback` over the full 0-100 range.
    pub fn new(callback: ProgressCallback) -> Self {
        Self::with_callback(Some(callback))
    }

    /// A reporter that only logs.
    pub fn silent() -> Self {
        Self::with_callback(None)
    }

    fn with_callback(callback: Option<ProgressCallback>) -> Self {
        Self {
            shared: Arc::new(Shared {
                callback,
                last: AtomicU8::new(0),
            }),
            start: 0.0,
            end: 100.0,
        }
    }

    /// Sub-reporter whose 0-100 maps onto `start..=end` of this one.
    pub fn scoped(&self, start: u8, end: u8) -> Self {
        let (start, end) = (start.min(100) as f32, end.min(100) as f32);
        Self {
            shared: Arc::clone(&self.shared),
            start: self.map(start),
            end: self.map(end.max(start)),
        }
    }

    fn map(&self, local: f32) -> f32 {
        self.start + (self.end - self.start) * local.clamp(0.0, 100.0) / 100.0
    }

    /// Report `percent` (in this reporter's scale) for `step`.
    ///
    /// Values below the last reported overall value are dropped.
    pub fn report(&self, percent: u8, step: &str) {
        let overall = self.map(percent as f32).round().clamp(0.0, 100.0) as u8;

        let previous = self.shared.last.fetch_max(overall, Ordering::SeqCst);
        if overall < previous {
            tracing::trace!("Dropping regressing progress {}% < {}%", overall, previous);
            return;
        }

        tracing::info!("[{}%] {}", overall, step);
        if let Some(ref cb) = self.shared.callback {
            cb(overall, step);
        }
    }

    /// Highest overall value reported so far.
    pub fn current(&self) -> u8 {
        self.shared.last.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("current", &self.current())
            .finish()
    }
}
