//! Conversion jobs: one request, one run, one terminal event.

mod runner;
mod slot;
mod spec;
mod types;

pub use runner::{EventSink, Job, JobHandle, START_PERCENT};
pub use slot::{JobSlot, SubmitError};
pub use spec::JobSpec;
pub use types::{JobEvent, JobFailure, JobOutcome, JobRecord, JobState};
