//! Write-through persistence hook, represented as a trait so a real database
//! integration slots in without touching [`crate::store::Store`].

use std::collections::HashMap;

use parking_lot::RwLock;

/// A settings domain: a named grouping of settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomainRow {
    pub name: String,
    pub title: String,
    pub description: String,
}

/// A single persisted setting row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingRow {
    pub domain: String,
    pub name: String,
    pub value: String,
    pub title: String,
    pub description: String,
    pub read_only: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("settings backend error: {0}")]
    Other(String),
}

/// Write-through persistence for the database-backed settings source.
/// Implementations back this with a real table; [`NullBackend`] and
/// [`MemoryBackend`] are provided for deployments (and tests) with no
/// database.
pub trait SettingsBackend: Send + Sync {
    fn load_all(&self) -> Result<Vec<SettingRow>, BackendError>;
    fn upsert(&self, row: SettingRow) -> Result<(), BackendError>;
    fn domains(&self) -> Result<Vec<DomainRow>, BackendError> {
        Ok(Vec::new())
    }

    /// Schema migration hook, invoked by `--migrate`. No-op unless a
    /// concrete backend overrides it.
    fn migrate(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// A backend with nothing behind it: `Store::init` skips the db-source load
/// step entirely when this is in use.
#[derive(Debug, Default)]
pub struct NullBackend;

impl SettingsBackend for NullBackend {
    fn load_all(&self) -> Result<Vec<SettingRow>, BackendError> {
        Ok(Vec::new())
    }

    fn upsert(&self, _row: SettingRow) -> Result<(), BackendError> {
        Ok(())
    }
}

/// In-process stand-in for a real database, used by tests and by deployments
/// that want write-through persistence without a database dependency.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    rows: RwLock<HashMap<(String, String), SettingRow>>,
    domains: RwLock<HashMap<String, DomainRow>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(self, domain: DomainRow) -> Self {
        self.domains.write().insert(domain.name.clone(), domain);
        self
    }
}

impl SettingsBackend for MemoryBackend {
    fn load_all(&self) -> Result<Vec<SettingRow>, BackendError> {
        Ok(self.rows.read().values().cloned().collect())
    }

    fn upsert(&self, row: SettingRow) -> Result<(), BackendError> {
        self.rows.write().insert((row.domain.clone(), row.name.clone()), row);
        Ok(())
    }

    fn domains(&self) -> Result<Vec<DomainRow>, BackendError> {
        Ok(self.domains.read().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_round_trips_rows() {
        let backend = MemoryBackend::new();
        backend
            .upsert(SettingRow {
                domain: "database".into(),
                name: "host".into(),
                value: "localhost".into(),
                ..Default::default()
            })
            .unwrap();

        let rows = backend.load_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, "localhost");
    }

    #[test]
    fn null_backend_is_always_empty() {
        let backend = NullBackend;
        assert!(backend.load_all().unwrap().is_empty());
        backend
            .upsert(SettingRow { domain: "x".into(), name: "y".into(), ..Default::default() })
            .unwrap();
        assert!(backend.load_all().unwrap().is_empty());
    }
}
