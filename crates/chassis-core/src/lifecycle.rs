//! Application lifecycle: construct everything, then bind routes, then
//! signal readiness, strictly in that order across every registered
//! component, following an explicit numbered-phase bootstrap rather than
//! implicit ordering.

use std::fmt;

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::LifecycleError;

/// 0 = highest priority, 7 = lowest. Default is `Normal` (5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(0);
    pub const NORMAL: Priority = Priority(5);
    pub const LOWEST: Priority = Priority(7);

    /// Clamps `value` into the valid `0..=7` range.
    pub fn new(value: u8) -> Self {
        Priority(value.min(7))
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A component registered with the lifecycle runner.
#[async_trait]
pub trait Application: Send + Sync {
    fn name(&self) -> &str;

    fn priority(&self) -> Priority {
        Priority::default()
    }

    async fn register(&self) -> Result<(), BoxError>;
    async fn router(&self) -> Result<(), BoxError>;
    async fn when_ready(&self) -> Result<(), BoxError>;

    /// Returns `Some(self)` for apps that also implement [`Extensible`].
    /// `Lifecycle::run` calls this to fire post-register extensions without
    /// resorting to a parallel, caller-threaded extensions list or runtime
    /// reflection; the default `None` costs nothing for apps that don't
    /// implement `Extensible`.
    fn as_extensible(&self) -> Option<&dyn Extensible> {
        None
    }
}

/// Opt-in extension points fired once, right after `register()`. An app that
/// wants extra side effects after registration implements this trait
/// explicitly instead of exposing magically-named methods discovered via
/// reflection, and overrides [`Application::as_extensible`] to return
/// `Some(self)` so `Lifecycle::run` picks it up.
pub trait Extensible: Application {
    fn extensions(&self) -> Vec<Box<dyn Fn() + Send + Sync>> {
        Vec::new()
    }
}

/// Opt-in hot-reload hook.
#[async_trait]
pub trait Reloadable: Application {
    async fn reload(&self) -> Result<(), BoxError>;
}

/// Runs the three-phase startup discipline over a priority-sorted app list.
///
/// `on_fatal` is called (and `run` returns early) the first time any phase
/// errors; the framework itself never calls `std::process::exit` — the
/// binary's `main` decides the exit code.
pub struct Lifecycle;

impl Lifecycle {
    pub async fn run(
        apps: Vec<Box<dyn Application>>,
    ) -> Result<Vec<Box<dyn Application>>, LifecycleError> {
        let mut indexed: Vec<(usize, Box<dyn Application>)> = apps.into_iter().enumerate().collect();
        indexed.sort_by_key(|(_, a)| a.priority());

        // Phase 1: register, then fire opt-in extensions in the same order.
        for (_, app) in &indexed {
            info!(app = app.name(), phase = "register", "starting phase");
            app.register().await.map_err(|source| LifecycleError {
                app: app.name().to_string(),
                phase: "register",
                source,
            })?;

            if let Some(extensible) = app.as_extensible() {
                for ext in extensible.extensions() {
                    ext();
                }
            }
        }

        // Phase 2: bind routes for every app.
        for (_, app) in &indexed {
            info!(app = app.name(), phase = "router", "starting phase");
            app.router().await.map_err(|source| LifecycleError {
                app: app.name().to_string(),
                phase: "router",
                source,
            })?;
        }

        // Phase 3: signal readiness for every app.
        for (_, app) in &indexed {
            info!(app = app.name(), phase = "when_ready", "starting phase");
            app.when_ready().await.map_err(|source| LifecycleError {
                app: app.name().to_string(),
                phase: "when_ready",
                source,
            })?;
        }

        Ok(indexed.into_iter().map(|(_, a)| a).collect())
    }

    /// Reloads every app that opted into `Reloadable`. Errors are logged,
    /// never fatal.
    pub async fn reload_all(apps: &[Box<dyn Reloadable>]) {
        for app in apps {
            if let Err(err) = app.reload().await {
                error!(app = app.name(), error = %err, "reload failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recording {
        name: &'static str,
        priority: Priority,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Application for Recording {
        fn name(&self) -> &str {
            self.name
        }
        fn priority(&self) -> Priority {
            self.priority
        }
        async fn register(&self) -> Result<(), BoxError> {
            self.log.lock().unwrap().push(format!("{}.register", self.name));
            Ok(())
        }
        async fn router(&self) -> Result<(), BoxError> {
            self.log.lock().unwrap().push(format!("{}.router", self.name));
            Ok(())
        }
        async fn when_ready(&self) -> Result<(), BoxError> {
            self.log.lock().unwrap().push(format!("{}.when_ready", self.name));
            Ok(())
        }
    }

    #[tokio::test]
    async fn phases_run_in_total_order_across_apps() {
        // A(priority 1), B(priority 5) -> A.Register, B.Register,
        // A.Router, B.Router, A.WhenReady, B.WhenReady.
        let log = Arc::new(Mutex::new(Vec::new()));
        let a: Box<dyn Application> = Box::new(Recording {
            name: "A",
            priority: Priority::new(1),
            log: log.clone(),
        });
        let b: Box<dyn Application> = Box::new(Recording {
            name: "B",
            priority: Priority::new(5),
            log: log.clone(),
        });

        Lifecycle::run(vec![b, a]).await.unwrap();

        let observed = log.lock().unwrap().clone();
        assert_eq!(
            observed,
            vec![
                "A.register", "B.register", "A.router", "B.router", "A.when_ready", "B.when_ready",
            ]
        );
    }

    struct Failing;
    #[async_trait]
    impl Application for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        async fn register(&self) -> Result<(), BoxError> {
            Err("boom".into())
        }
        async fn router(&self) -> Result<(), BoxError> {
            Ok(())
        }
        async fn when_ready(&self) -> Result<(), BoxError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn register_failure_is_reported_not_panicked() {
        let apps: Vec<Box<dyn Application>> = vec![Box::new(Failing)];
        let err = Lifecycle::run(apps).await.unwrap_err();
        assert_eq!(err.app, "failing");
        assert_eq!(err.phase, "register");
    }

    struct WithExtensions {
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Application for WithExtensions {
        fn name(&self) -> &str {
            "extended"
        }
        async fn register(&self) -> Result<(), BoxError> {
            self.log.lock().unwrap().push("extended.register".to_string());
            Ok(())
        }
        async fn router(&self) -> Result<(), BoxError> {
            Ok(())
        }
        async fn when_ready(&self) -> Result<(), BoxError> {
            Ok(())
        }
        fn as_extensible(&self) -> Option<&dyn Extensible> {
            Some(self)
        }
    }

    impl Extensible for WithExtensions {
        fn extensions(&self) -> Vec<Box<dyn Fn() + Send + Sync>> {
            let log = self.log.clone();
            vec![Box::new(move || log.lock().unwrap().push("extended.extension".to_string()))]
        }
    }

    #[tokio::test]
    async fn extensible_app_fires_extensions_right_after_register() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let apps: Vec<Box<dyn Application>> = vec![Box::new(WithExtensions { log: log.clone() })];

        Lifecycle::run(apps).await.unwrap();

        assert_eq!(log.lock().unwrap().clone(), vec!["extended.register", "extended.extension"]);
    }

    #[tokio::test]
    async fn non_extensible_app_is_unaffected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a: Box<dyn Application> = Box::new(Recording { name: "A", priority: Priority::default(), log: log.clone() });
        assert!(a.as_extensible().is_none());
        Lifecycle::run(vec![a]).await.unwrap();
    }
}
