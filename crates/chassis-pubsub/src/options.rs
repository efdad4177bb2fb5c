//! Typed options builder for subscribe/publish calls, replacing a loosely
//! typed variadic option list with named, chainable setters.

/// Options accepted by [`crate::driver::PubSubDriver::subscribe`] and
/// [`crate::driver::PubSubDriver::publish`].
#[derive(Debug, Clone, Default)]
pub struct PubSubOptions {
    pub ignore_prefix: bool,
    pub bucket: Option<String>,
    pub queue_group: Option<String>,
    pub jetstream: bool,
}

impl PubSubOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_prefix(mut self) -> Self {
        self.ignore_prefix = true;
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn queue_group(mut self, group: impl Into<String>) -> Self {
        self.queue_group = Some(group.into());
        self
    }

    pub fn jetstream(mut self) -> Self {
        self.jetstream = true;
        self
    }
}
