//! Key normalization: settings keys are case-insensitive dot-paths,
//! normalized to uppercase with non-alphanumeric characters collapsed to
//! `_` so equivalent spellings (`Database.Host`, `DATABASE_HOST`, …) always
//! resolve to the same entry.

/// Upper-cases `key` and replaces every character outside `[A-Za-z0-9]` with
/// `_`. Idempotent: `normalize(normalize(k)) == normalize(k)`.
pub fn normalize(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
