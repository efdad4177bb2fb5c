//! The layered configuration store itself, built on top of
//! [`crate::normalize`], [`crate::value::Value`], [`crate::args`],
//! [`crate::yaml`] and [`crate::backend::SettingsBackend`]. Loads from
//! process env vars, a pluggable backend, a YAML file, and trailing argv
//! overrides, in ascending precedence.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::args;
use crate::backend::{BackendError, NullBackend, SettingsBackend};
use crate::normalize::normalize;
use crate::value::Value;
use crate::yaml;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read config file {path}: {source}")]
    ReadConfig { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    ParseConfig { path: PathBuf, #[source] source: yaml::YamlError },
    #[error("settings backend error: {0}")]
    Backend(#[from] BackendError),
}

type TrackCallback = Box<dyn Fn(&str, &Value) + Send + Sync>;
type ReloadCallback = Box<dyn Fn() + Send + Sync>;

/// The domain a `set`/`save_to_db` write-through row is lazily created
/// under when the caller doesn't specify one.
const DEFAULT_DOMAIN: &str = "default";

enum Pattern {
    All,
    Prefix(String),
    Exact(String),
}

impl Pattern {
    fn parse(raw: &str) -> Self {
        if raw == "*" {
            Pattern::All
        } else if let Some(prefix) = raw.strip_suffix(".*") {
            Pattern::Prefix(format!("{}_", normalize(prefix)))
        } else {
            Pattern::Exact(normalize(raw))
        }
    }

    fn matches(&self, normalized_key: &str) -> bool {
        match self {
            Pattern::All => true,
            Pattern::Prefix(prefix) => normalized_key.starts_with(prefix.as_str()),
            Pattern::Exact(exact) => normalized_key == exact,
        }
    }
}

struct Tracker {
    pattern: Pattern,
    callback: TrackCallback,
}

/// The process-wide settings store: a flat, normalized key/value map loaded
/// once at startup from four ascending-precedence sources, with change
/// tracking and write-through persistence layered on top.
pub struct Store {
    values: RwLock<BTreeMap<String, String>>,
    backend: Arc<dyn SettingsBackend>,
    config_path: RwLock<PathBuf>,
    trackers: RwLock<Vec<Tracker>>,
    on_reload: RwLock<Vec<ReloadCallback>>,
}

impl Store {
    /// Loads, in ascending precedence: process env vars → backend rows
    /// (skipped entirely for [`NullBackend`]) → YAML file (default
    /// `./config.yml`, missing file tolerated) → trailing argv overrides.
    pub fn init(config_path: Option<PathBuf>) -> Result<Arc<Self>, SettingsError> {
        Self::init_with(config_path, Arc::new(NullBackend), &std::env::args().skip(1).collect::<Vec<_>>())
    }

    pub fn init_with(
        config_path: Option<PathBuf>,
        backend: Arc<dyn SettingsBackend>,
        argv: &[String],
    ) -> Result<Arc<Self>, SettingsError> {
        let path = config_path.unwrap_or_else(|| PathBuf::from("./config.yml"));

        let store = Arc::new(Self {
            values: RwLock::new(BTreeMap::new()),
            backend,
            config_path: RwLock::new(path),
            trackers: RwLock::new(Vec::new()),
            on_reload: RwLock::new(Vec::new()),
        });

        store.load_all(argv)?;
        Ok(store)
    }

    fn load_all(&self, argv: &[String]) -> Result<(), SettingsError> {
        let mut values = BTreeMap::new();

        for (key, value) in std::env::vars() {
            values.insert(normalize(&key), value);
        }

        match self.backend.load_all() {
            Ok(rows) => {
                for row in rows {
                    values.insert(normalize(&row.name), row.value);
                }
            }
            Err(err) => tracing::warn!(error = %err, "settings backend load failed, continuing"),
        }

        let path = self.config_path.read().clone();
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(raw) => match yaml::flatten(&raw) {
                    Ok(pairs) => {
                        for (key, value) in pairs {
                            values.insert(normalize(&key), value);
                        }
                    }
                    Err(source) => {
                        tracing::warn!(error = %source, "config YAML parse failed, continuing");
                    }
                },
                Err(source) => {
                    tracing::warn!(error = %source, "config YAML read failed, continuing");
                    let _ = SettingsError::ReadConfig { path: path.clone(), source };
                }
            }
        }

        for (key, value) in args::parse(argv) {
            values.insert(normalize(&key), value);
        }

        *self.values.write() = values;
        Ok(())
    }

    /// Re-runs [`Self::load_all`] against the process's real argv, then
    /// fires every registered `on_reload` callback.
    pub fn reload(&self) -> Result<(), SettingsError> {
        let argv: Vec<String> = std::env::args().skip(1).collect();
        self.load_all(&argv)?;
        for callback in self.on_reload.read().iter() {
            callback();
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Value {
        let normalized = normalize(key);
        Value::new(self.values.read().get(&normalized).cloned().unwrap_or_default())
    }

    pub fn get_or(&self, key: &str, default: impl Into<String>) -> Value {
        let normalized = normalize(key);
        match self.values.read().get(&normalized) {
            Some(v) => Value::new(v.clone()),
            None => Value::new(default.into()),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.read().contains_key(&normalize(key))
    }

    pub fn all(&self) -> BTreeMap<String, String> {
        self.values.read().clone()
    }

    /// Sets `key` to `value` and fires any tracker whose pattern matches.
    /// The write-through to the backend is best-effort: a failure is logged,
    /// never returned, so a backend outage can't stop callbacks from
    /// observing the new in-memory value.
    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<(), SettingsError> {
        let normalized = normalize(key);
        let value = value.into();

        self.values.write().insert(normalized.clone(), value.clone());

        if let Err(err) = self.backend.upsert(crate::backend::SettingRow {
            domain: DEFAULT_DOMAIN.to_string(),
            name: normalized.clone(),
            value: value.clone(),
            ..Default::default()
        }) {
            tracing::warn!(key = %normalized, error = %err, "settings backend write-through failed, continuing");
        }

        let wrapped = Value::new(value);
        for tracker in self.trackers.read().iter() {
            if tracker.pattern.matches(&normalized) {
                (tracker.callback)(&normalized, &wrapped);
            }
        }

        Ok(())
    }

    pub fn set_multi(&self, pairs: impl IntoIterator<Item = (String, String)>) -> Result<(), SettingsError> {
        for (key, value) in pairs {
            self.set(&key, value)?;
        }
        Ok(())
    }

    /// Registers `callback` for keys matching `pattern` (`*`, `PREFIX.*`, or
    /// an exact key). Fires `callback` exactly once immediately, with the
    /// current value of `pattern` if it names an exact key, or an empty
    /// value otherwise.
    pub fn track(&self, pattern: &str, callback: impl Fn(&str, &Value) + Send + Sync + 'static) {
        let parsed = Pattern::parse(pattern);
        let initial_key = normalize(pattern.trim_end_matches(".*").trim_end_matches('*'));
        let initial_value = self.get(&initial_key);
        callback(&initial_key, &initial_value);

        self.trackers.write().push(Tracker { pattern: parsed, callback: Box::new(callback) });
    }

    pub fn on_reload(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.on_reload.write().push(Box::new(callback));
    }

    pub fn save_to_yaml(&self, path: &Path) -> Result<(), SettingsError> {
        let raw = yaml::to_string(&self.values.read()).map_err(|source| SettingsError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, raw).map_err(|source| SettingsError::ReadConfig { path: path.to_path_buf(), source })
    }

    pub fn save_to_db(&self) -> Result<(), SettingsError> {
        for (key, value) in self.values.read().iter() {
            self.backend.upsert(crate::backend::SettingRow {
                domain: DEFAULT_DOMAIN.to_string(),
                name: key.clone(),
                value: value.clone(),
                ..Default::default()
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store_with_argv(argv: &[&str]) -> Arc<Store> {
        Store::init_with(
            Some(PathBuf::from("/nonexistent/config.yml")),
            Arc::new(NullBackend),
            &argv.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        )
        .unwrap()
    }

    #[test]
    fn args_win_over_defaults() {
        let store = store_with_argv(&["--database.port", "5432"]);
        assert_eq!(store.get("database.port").as_i64(), 5432);
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = store_with_argv(&[]);
        store.set("http.timeout", "2s").unwrap();
        assert_eq!(store.get("http.timeout").as_duration().unwrap().as_secs(), 2);
    }

    #[test]
    fn wildcard_tracker_fires_on_matching_prefix_only() {
        let store = store_with_argv(&[]);
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = hits.clone();
        store.track("DATABASE.*", move |_, _| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        let after_registration = hits.load(Ordering::SeqCst);

        store.set("DATABASE.HOST", "x").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), after_registration + 1);

        store.set("CACHE.HOST", "y").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), after_registration + 1);
    }

    #[test]
    fn star_tracker_fires_on_any_set() {
        let store = store_with_argv(&[]);
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        store.track("*", move |_, _| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        let baseline = hits.load(Ordering::SeqCst);

        store.set("ANYTHING", "z").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), baseline + 1);
    }

    #[test]
    fn callback_fires_exactly_once_on_registration() {
        let store = store_with_argv(&[]);
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        store.track("SOME.KEY", move |_, _| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tracker_invocation_count_matches_registration_plus_matching_sets() {
        let store = store_with_argv(&[]);
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        store.track("DB.*", move |_, _| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.set("DB.HOST", "a").unwrap();
        store.set("DB.PORT", "1").unwrap();
        store.set("CACHE.X", "y").unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn has_and_all_reflect_loaded_state() {
        let store = store_with_argv(&["--feature.flag", "on"]);
        assert!(store.has("feature.flag"));
        assert!(!store.has("missing.key"));
        assert!(store.all().contains_key("FEATURE_FLAG"));
    }

    #[test]
    fn save_to_yaml_then_reloaded_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");

        let store = store_with_argv(&[]);
        store.set("DATABASE.HOST", "localhost").unwrap();
        store.save_to_yaml(&path).unwrap();

        let reloaded = Store::init_with(Some(path), Arc::new(NullBackend), &[]).unwrap();
        assert_eq!(reloaded.get("database.host").as_str(), "localhost");
    }

    struct FailingBackend;
    impl SettingsBackend for FailingBackend {
        fn load_all(&self) -> Result<Vec<crate::backend::SettingRow>, BackendError> {
            Ok(Vec::new())
        }
        fn upsert(&self, _row: crate::backend::SettingRow) -> Result<(), BackendError> {
            Err(BackendError::Other("write-through unavailable".into()))
        }
    }

    #[test]
    fn set_succeeds_and_fires_trackers_despite_backend_failure() {
        let store = Store::init_with(
            Some(PathBuf::from("/nonexistent/config.yml")),
            Arc::new(FailingBackend),
            &[],
        )
        .unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        store.track("DATABASE.*", move |_, _| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        let after_registration = hits.load(Ordering::SeqCst);

        assert!(store.set("DATABASE.HOST", "localhost").is_ok());
        assert_eq!(store.get("database.host").as_str(), "localhost");
        assert_eq!(hits.load(Ordering::SeqCst), after_registration + 1);
    }
}
