//! The tick loop itself: one shared `tokio::time::interval`, evaluated
//! against every registered job each second, using the same
//! append-only-under-lock idiom as `chassis_core::registry`, generalized
//! from a name→driver map to an id→job list.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use parking_lot::RwLock;

use crate::job::{BoxedAction, Job, SchedulerError};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

fn format_now() -> String {
    Local::now().format("%a,%Y-%m-%d,%H:%M:%S").to_string()
}

#[derive(Default)]
pub struct Scheduler {
    jobs: RwLock<Vec<Arc<Job>>>,
    started: AtomicBool,
}

impl Scheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn create_job(
        &self,
        id: impl Into<String>,
        pattern: &str,
        action: BoxedAction,
    ) -> Result<Arc<Job>, SchedulerError> {
        self.add_job(Job::new(id, pattern, action)?)
    }

    /// Registers an already-built [`Job`] (use this to attach
    /// `on_success`/`on_error`/`on_finish` callbacks before the job starts
    /// being matched against ticks).
    pub fn add_job(&self, job: Job) -> Result<Arc<Job>, SchedulerError> {
        let job = Arc::new(job);
        self.jobs.write().push(job.clone());
        Ok(job)
    }

    pub fn job(&self, id: &str) -> Option<Arc<Job>> {
        self.jobs.read().iter().find(|job| job.id == id).cloned()
    }

    /// Spawns the shared tick task. Idempotent: a second call is a no-op,
    /// logged rather than panicking.
    pub fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!("scheduler already started, ignoring duplicate start() call");
            return;
        }

        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            loop {
                ticker.tick().await;
                scheduler.tick().await;
            }
        });
    }

    async fn tick(self: &Arc<Self>) {
        let now = format_now();
        let jobs = self.jobs.read().clone();

        for job in jobs {
            if job.is_paused() || !job.pattern.is_match(&now) {
                continue;
            }
            if !job.try_claim() {
                continue;
            }

            let job = job.clone();
            tokio::spawn(async move {
                let result = tokio::spawn((job.action)()).await;
                let outcome = match result {
                    Ok(inner) => inner,
                    Err(_) => Err(SchedulerError::ActionPanicked { id: job.id.clone() }),
                };

                job.release();

                match &outcome {
                    Ok(()) => {
                        if let Some(cb) = &job.on_success {
                            cb(&job.id, Ok(()));
                        }
                    }
                    Err(err) => {
                        tracing::error!(job = %job.id, error = %err, "scheduled job failed");
                        if let Some(cb) = &job.on_error {
                            cb(&job.id, Err(err));
                        }
                    }
                }
                if let Some(cb) = &job.on_finish {
                    cb(&job.id, outcome.as_ref().map(|_| ()));
                }
            });
        }
    }
}
