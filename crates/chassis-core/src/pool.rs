//! Bounded-parallelism worker pool, exposing a `conc`-flavored API
//! (`Pool::new().with_max_concurrency(..)`, panicking `wait()`) on top of
//! `tokio`: a `tokio::sync::Semaphore` caps concurrency, a
//! `tokio::task::JoinSet` tracks in-flight tasks, and `wait()` re-panics the
//! first captured task panic.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Bounded-concurrency task pool. Build with [`Pool::new`] and
/// [`Pool::with_max_concurrency`], then [`Pool::spawn`] tasks and
/// [`Pool::wait`] for them to finish.
pub struct Pool {
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<()>,
    configured: AtomicBool,
    max: usize,
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    /// Unbounded by default (`usize::MAX` permits), matching `conc.Pool`'s
    /// default of unlimited concurrency until `WithMaxGoroutines` is called.
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(Semaphore::MAX_PERMITS)),
            tasks: JoinSet::new(),
            configured: AtomicBool::new(false),
            max: usize::MAX,
        }
    }

    /// Convenience constructor capping concurrency at the number of
    /// available CPUs, for CPU-bound workloads with no natural external
    /// concurrency limit.
    pub fn with_cpu_concurrency() -> Self {
        Self::new().with_max_concurrency(num_cpus::get())
    }

    /// Caps concurrent tasks at `n`. Panics if `n == 0`, and panics if called
    /// after the pool has already spawned a task or been waited on
    /// ("configured after init").
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        assert!(n > 0, "max concurrency must be greater than zero");
        assert!(
            !self.configured.load(Ordering::SeqCst),
            "pool configured after first use"
        );
        self.max = n;
        self.semaphore = Arc::new(Semaphore::new(n));
        self
    }

    /// Spawns `task` to run as soon as a permit is available.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.configured.store(true, Ordering::SeqCst);
        let semaphore = self.semaphore.clone();
        self.tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            task.await;
        });
    }

    /// Awaits every spawned task. Re-panics the first task panic observed:
    /// the pool never silently swallows a worker crash.
    pub async fn wait(&mut self) {
        self.configured.store(true, Ordering::SeqCst);
        while let Some(result) = self.tasks.join_next().await {
            if let Err(join_err) = result {
                if join_err.is_panic() {
                    std::panic::resume_unwind(join_err.into_panic());
                }
            }
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max
    }
}

/// Variant that collects task errors instead of propagating them as panics.
pub struct ErrorPool<E> {
    pool: Pool,
    errors: Arc<parking_lot::Mutex<Vec<E>>>,
}

impl<E: Send + 'static> ErrorPool<E> {
    pub fn new() -> Self {
        Self {
            pool: Pool::new(),
            errors: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.pool = self.pool.with_max_concurrency(n);
        self
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
    {
        let errors = self.errors.clone();
        self.pool.spawn(async move {
            if let Err(e) = task.await {
                errors.lock().push(e);
            }
        });
    }

    /// Awaits every task and returns every collected error, in completion
    /// order.
    pub async fn wait(mut self) -> Vec<E> {
        self.pool.wait().await;
        Arc::try_unwrap(self.errors)
            .map(|m| m.into_inner())
            .unwrap_or_default()
    }
}

impl<E: Send + 'static> Default for ErrorPool<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Variant that exposes a shared [`CancellationToken`] every task can poll,
/// so one task's early-exit can signal the rest to stop.
pub struct ContextPool {
    pool: Pool,
    token: CancellationToken,
}

impl ContextPool {
    pub fn new() -> Self {
        Self {
            pool: Pool::new(),
            token: CancellationToken::new(),
        }
    }

    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.pool = self.pool.with_max_concurrency(n);
        self
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.pool.spawn(task);
    }

    /// Cancels the shared token, then awaits every task.
    pub async fn cancel_and_wait(mut self) {
        self.token.cancel();
        self.pool.wait().await;
    }

    pub async fn wait(&mut self) {
        self.pool.wait().await;
    }
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    #[should_panic(expected = "greater than zero")]
    fn zero_max_concurrency_panics() {
        Pool::new().with_max_concurrency(0);
    }

    #[tokio::test]
    async fn observed_concurrency_never_exceeds_cap() {
        let cap = 4usize;
        let mut pool = Pool::new().with_max_concurrency(cap);

        let current = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        for _ in 0..40 {
            let current = current.clone();
            let max_seen = max_seen.clone();
            pool.spawn(async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                current.fetch_sub(1, Ordering::SeqCst);
            });
        }

        pool.wait().await;
        assert!(max_seen.load(Ordering::SeqCst) <= cap);
    }

    #[tokio::test]
    #[should_panic(expected = "task panic")]
    async fn task_panic_propagates_from_wait() {
        let mut pool = Pool::new();
        pool.spawn(async { panic!("task panic") });
        pool.wait().await;
    }

    #[tokio::test]
    async fn error_pool_collects_every_error() {
        let mut pool: ErrorPool<&'static str> = ErrorPool::new().with_max_concurrency(2);
        pool.spawn(async { Err("one") });
        pool.spawn(async { Ok(()) });
        pool.spawn(async { Err("two") });

        let mut errors = pool.wait().await;
        errors.sort();
        assert_eq!(errors, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn context_pool_token_is_shared() {
        let pool = ContextPool::new();
        let token = pool.token();
        assert!(!token.is_cancelled());
        pool.cancel_and_wait().await;
        assert!(token.is_cancelled());
    }

    #[test]
    fn cpu_concurrency_matches_available_parallelism() {
        let pool = Pool::with_cpu_concurrency();
        assert_eq!(pool.max_concurrency(), num_cpus::get());
    }
}
