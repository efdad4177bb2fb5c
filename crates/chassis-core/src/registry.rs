//! Generic driver registry & façade.
//!
//! Instantiated once per pluggable subsystem (pub/sub, memo): a name-keyed
//! map plus a "current default" promoted on first insert, guarded by a
//! single lock so `add_driver`/`set_default_driver` never race, while the
//! driver's own internals stay responsible for request-path concurrency.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// A driver runtime-bound to one of the pluggable subsystems.
///
/// `register()` MUST be idempotent in the sense that the registry only ever
/// calls it once per driver instance; a second `add_driver` call with the
/// same name is a logic error the caller should avoid, not something the
/// registry silently tolerates.
pub trait Driver: Send + Sync {
    fn name(&self) -> &str;

    /// Called exactly once by the registry when the driver is added.
    fn register(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

struct Inner<T: ?Sized> {
    drivers: HashMap<String, Arc<T>>,
    default: Option<Arc<T>>,
}

impl<T: ?Sized> Default for Inner<T> {
    fn default() -> Self {
        Self {
            drivers: HashMap::new(),
            default: None,
        }
    }
}

/// A name -> driver map with a promotable default, safe to share across
/// tasks via `Arc<Registry<T>>`.
pub struct Registry<T: ?Sized + Driver + 'static> {
    inner: RwLock<Inner<T>>,
}

impl<T: ?Sized + Driver + 'static> Default for Registry<T> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl<T: ?Sized + Driver + 'static> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `driver` under `driver.name()` if no driver of that name is
    /// already registered, then calls `Driver::register()`. The caller is
    /// responsible for treating a `register()` failure as fatal — this
    /// method only surfaces the error, it never aborts the process itself.
    ///
    /// The first driver ever added is promoted to default automatically.
    ///
    /// Holds one write lock across the name check, `register()`, and the
    /// insert, so two concurrent calls for the same name can't both pass the
    /// check and both call `register()` before either is visible to the
    /// other.
    pub fn add_driver(
        &self,
        driver: Arc<T>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let name = driver.name().to_string();
        let mut guard = self.inner.write();
        if guard.drivers.contains_key(&name) {
            return Ok(());
        }

        driver.register()?;

        let promote = guard.default.is_none();
        guard.drivers.insert(name, driver.clone());
        if promote {
            guard.default = Some(driver);
        }
        Ok(())
    }

    /// Ensures `driver` is registered, then promotes it to default.
    pub fn set_default_driver(
        &self,
        driver: Arc<T>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.add_driver(driver.clone())?;
        self.inner.write().default = Some(driver);
        Ok(())
    }

    pub fn use_driver(&self, name: &str) -> Option<Arc<T>> {
        self.inner.read().drivers.get(name).cloned()
    }

    pub fn driver(&self, name: &str) -> Option<(Arc<T>, bool)> {
        self.inner.read().drivers.get(name).cloned().map(|d| (d, true))
    }

    pub fn drivers(&self) -> HashMap<String, Arc<T>> {
        self.inner.read().drivers.clone()
    }

    pub fn default_driver(&self) -> Option<Arc<T>> {
        self.inner.read().default.clone()
    }
}
