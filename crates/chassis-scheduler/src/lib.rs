//! Recurring-job scheduler: regex-pattern-matched time triggers evaluated
//! against a single shared one-second tick, with a no-overlap guarantee per
//! job.

pub mod job;
pub mod scheduler;

pub use job::{ActionFuture, BoxedAction, Job, ResultCallback, SchedulerError};
pub use scheduler::Scheduler;
