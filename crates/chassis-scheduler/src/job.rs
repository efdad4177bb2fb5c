//! A single scheduled job: a pattern matched against the current tick's
//! formatted time, an async action, and the running/paused flags the tick
//! loop synchronizes on.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use regex::{Regex, RegexBuilder};

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("job '{id}' pattern is invalid: {source}")]
    InvalidPattern { id: String, #[source] source: regex::Error },
    #[error("job '{id}' action panicked")]
    ActionPanicked { id: String },
    #[error("job '{id}' action failed: {reason}")]
    ActionFailed { id: String, reason: String },
}

pub type ActionFuture = Pin<Box<dyn Future<Output = Result<(), SchedulerError>> + Send>>;
pub type BoxedAction = Arc<dyn Fn() -> ActionFuture + Send + Sync>;
pub type ResultCallback = Arc<dyn Fn(&str, Result<(), &SchedulerError>) + Send + Sync>;

/// Builds the case-insensitive match pattern the scheduler compares against
/// each tick's formatted time: every literal `*` in `raw` becomes
/// `[A-Za-z0-9]+`.
pub fn compile_pattern(id: &str, raw: &str) -> Result<Regex, SchedulerError> {
    let expanded = raw.replace('*', "[A-Za-z0-9]+");
    RegexBuilder::new(&expanded)
        .case_insensitive(true)
        .build()
        .map_err(|source| SchedulerError::InvalidPattern { id: id.to_string(), source })
}

pub struct Job {
    pub id: String,
    pub pattern: Regex,
    pub action: BoxedAction,
    pub paused: AtomicBool,
    pub running: AtomicBool,
    pub on_success: Option<ResultCallback>,
    pub on_error: Option<ResultCallback>,
    pub on_finish: Option<ResultCallback>,
}

impl Job {
    pub fn new(id: impl Into<String>, pattern: &str, action: BoxedAction) -> Result<Self, SchedulerError> {
        let id = id.into();
        let pattern = compile_pattern(&id, pattern)?;
        Ok(Self {
            id,
            pattern,
            action,
            paused: AtomicBool::new(false),
            running: AtomicBool::new(false),
            on_success: None,
            on_error: None,
            on_finish: None,
        })
    }

    pub fn on_success(mut self, cb: ResultCallback) -> Self {
        self.on_success = Some(cb);
        self
    }

    pub fn on_error(mut self, cb: ResultCallback) -> Self {
        self.on_error = Some(cb);
        self
    }

    pub fn on_finish(mut self, cb: ResultCallback) -> Self {
        self.on_finish = Some(cb);
        self
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Attempts to claim this job for the current tick. Returns `true` only
    /// for the caller that wins the compare-exchange, preventing a
    /// double-match within the same one-second tick.
    pub fn try_claim(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn release(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_expands_star_to_alphanumeric_class() {
        let pattern = compile_pattern("job", "Mon,*").unwrap();
        assert!(pattern.is_match("Mon,2026-07-28,09:00:00"));
        assert!(!pattern.is_match("Tue,2026-07-28,09:00:00"));
    }

    #[test]
    fn pattern_is_case_insensitive() {
        let pattern = compile_pattern("job", "mon,*").unwrap();
        assert!(pattern.is_match("MON,2026-07-28,09:00:00"));
    }

    #[test]
    fn try_claim_is_exclusive() {
        let job = Job::new("j", "*", Arc::new(|| Box::pin(async { Ok(()) }))).unwrap();
        assert!(job.try_claim());
        assert!(!job.try_claim());
        job.release();
        assert!(job.try_claim());
    }
}
