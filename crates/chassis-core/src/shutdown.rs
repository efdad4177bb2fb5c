//! Graceful shutdown registry.
//!
//! A single process-wide ordered list of nullary callbacks, fired once on
//! termination. Any driver can hook into it — notably the pub/sub broker
//! drivers, which drain in-flight publishes on shutdown.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

use tracing::error;

type Hook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
pub struct ShutdownRegistry {
    hooks: Mutex<Vec<Hook>>,
}

impl ShutdownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a callback. Hooks run in registration order on `run()`.
    pub fn register(&self, hook: impl FnOnce() + Send + 'static) {
        self.hooks.lock().unwrap().push(Box::new(hook));
    }

    /// Runs every registered hook exactly once, in registration order. A
    /// panicking hook is caught and logged; it never prevents the remaining
    /// hooks from running.
    pub fn run(&self) {
        let hooks = std::mem::take(&mut *self.hooks.lock().unwrap());
        for hook in hooks {
            let result = catch_unwind(AssertUnwindSafe(hook));
            if let Err(payload) = result {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                error!(panic = %message, "shutdown hook panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn hooks_run_in_registration_order() {
        let registry = ShutdownRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            registry.register(move || order.lock().unwrap().push(i));
        }

        registry.run();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn panicking_hook_does_not_block_later_hooks() {
        let registry = ShutdownRegistry::new();
        let ran = Arc::new(AtomicUsize::new(0));

        registry.register(|| panic!("boom"));
        let ran2 = ran.clone();
        registry.register(move || {
            ran2.fetch_add(1, Ordering::SeqCst);
        });

        registry.run();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hooks_run_exactly_once() {
        let registry = ShutdownRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        registry.register(move || {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        registry.run();
        registry.run();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
