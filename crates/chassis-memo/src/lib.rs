//! Pluggable key/value memo driver contract unifying the historical
//! memo/cache split into one trait, with in-memory and Redis backends.

pub mod driver;
pub mod memory;
pub mod options;
pub mod redis;

pub use driver::{MemoDriver, MemoError};
pub use memory::MemoryMemo;
pub use options::{MemoOptions, PERMANENT};
pub use redis::RedisMemo;
