//! Back-compat adapter for heterogeneous variadic options.
//!
//! The primary API for both pub/sub and memo drivers is a typed builder
//! (`PubSubOptions`, `MemoOptions`) with fluent setters — see
//! `chassis-pubsub::options` and `chassis-memo::options`. This module only
//! supplies the small scanning helper those builders use internally to stay
//! source-compatible with a caller who still wants to pass a loosely-typed
//! list of options and have unrecognized entries ignored rather than error.

use std::any::Any;

/// Scans `items` for the first value of type `T`, ignoring everything else.
/// Unrecognized items are skipped rather than causing a parse failure.
pub fn extract<T: 'static + Clone>(items: &[Box<dyn Any + Send + Sync>]) -> Option<T> {
    items.iter().find_map(|item| item.downcast_ref::<T>().cloned())
}

/// Returns `true` if any item in `items` matches `T` (used for marker/sentinel
/// option types like `IgnorePrefix` or `WithJetStream`).
pub fn contains<T: 'static>(items: &[Box<dyn Any + Send + Sync>]) -> bool {
    items.iter().any(|item| item.is::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    struct Bucket(String);
    struct IgnorePrefix;

    #[test]
    fn extracts_typed_value_and_ignores_rest() {
        let items: Vec<Box<dyn Any + Send + Sync>> =
            vec![Box::new(42i32), Box::new(Bucket("b".into())), Box::new("unrelated")];

        assert_eq!(extract::<Bucket>(&items), Some(Bucket("b".into())));
        assert_eq!(extract::<f64>(&items), None);
    }

    #[test]
    fn contains_detects_marker_type() {
        let items: Vec<Box<dyn Any + Send + Sync>> = vec![Box::new(IgnorePrefix)];
        assert!(contains::<IgnorePrefix>(&items));
        assert!(!contains::<Bucket>(&items));
    }
}
