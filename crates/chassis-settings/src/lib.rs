//! Layered configuration store: process env vars, a pluggable write-through
//! backend, a flattened YAML file, and trailing CLI-style overrides, merged
//! in ascending precedence into one flat, normalized key/value map with
//! change tracking.

pub mod args;
pub mod backend;
pub mod domain;
pub mod normalize;
pub mod store;
pub mod value;
pub mod yaml;

pub use backend::{DomainRow, MemoryBackend, NullBackend, SettingRow, SettingsBackend};
pub use domain::{Domain, SettingEntry};
pub use normalize::normalize;
pub use store::{SettingsError, Store};
pub use value::{byte_count, Value, ValueError};
