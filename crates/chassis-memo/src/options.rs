//! Typed options for [`crate::driver::MemoDriver`], replacing a loosely
//! typed variadic option list with named, chainable setters.

use std::time::Duration;

/// Sentinel TTL meaning "never expires".
pub const PERMANENT: i64 = -1;

#[derive(Debug, Clone, Default)]
pub struct MemoOptions {
    pub ttl: Option<Duration>,
    pub bucket: Option<String>,
}

impl MemoOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn permanent(mut self) -> Self {
        self.ttl = None;
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }
}
