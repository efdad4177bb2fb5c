//! Shared primitives used by every chassis subsystem crate: the generic
//! driver registry/façade, the application lifecycle runner, the graceful
//! shutdown registry, the bounded worker pool, and the marshal/unmarshal +
//! variadic-option helpers that `chassis-pubsub` and `chassis-memo` build
//! their driver contracts on top of.

pub mod error;
pub mod lifecycle;
pub mod params;
pub mod pool;
pub mod registry;
pub mod serializer;
