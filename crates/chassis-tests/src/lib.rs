//! No library surface of its own — this crate exists to host the
//! cross-crate end-to-end scenario tests under `tests/`.
