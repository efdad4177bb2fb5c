//! Typed `Domain`/`SettingEntry` view over the flat store, for callers that
//! want to enumerate or describe settings the way a database-backed driver
//! would. The backing store is still the flat dot-key map; this is a
//! read-only projection.

use crate::backend::{DomainRow, SettingRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingEntry {
    pub domain: String,
    pub name: String,
    pub value: String,
    pub title: String,
    pub description: String,
    pub read_only: bool,
    pub visible: bool,
}

impl From<SettingRow> for SettingEntry {
    fn from(row: SettingRow) -> Self {
        Self {
            domain: row.domain,
            name: row.name,
            value: row.value,
            title: row.title,
            description: row.description,
            read_only: row.read_only,
            visible: row.visible,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
    pub title: String,
    pub description: String,
    pub entries: Vec<SettingEntry>,
}

impl Domain {
    pub fn from_row(row: DomainRow, entries: Vec<SettingEntry>) -> Self {
        Self { name: row.name, title: row.title, description: row.description, entries }
    }

    pub fn entry(&self, name: &str) -> Option<&SettingEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_finds_entry_by_name() {
        let domain = Domain::from_row(
            DomainRow { name: "database".into(), title: "Database".into(), description: String::new() },
            vec![SettingEntry {
                domain: "database".into(),
                name: "host".into(),
                value: "localhost".into(),
                title: String::new(),
                description: String::new(),
                read_only: false,
                visible: true,
            }],
        );

        assert_eq!(domain.entry("host").unwrap().value, "localhost");
        assert!(domain.entry("missing").is_none());
    }
}
