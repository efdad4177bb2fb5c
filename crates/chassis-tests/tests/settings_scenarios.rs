//! End-to-end settings scenarios spanning the full env -> backend -> yaml ->
//! args precedence chain in one real `Store`.

use std::path::PathBuf;
use std::sync::Arc;

use chassis_settings::{NullBackend, Store};

#[test]
fn env_then_args_precedence_resolves_to_args() {
    std::env::set_var("DATABASE_PORT", "3306");

    let store = Store::init_with(
        Some(PathBuf::from("/nonexistent/config.yml")),
        Arc::new(NullBackend),
        &["--DATABASE.PORT".to_string(), "5432".to_string()],
    )
    .unwrap();

    assert_eq!(store.get("database.port").as_i64(), 5432);

    std::env::remove_var("DATABASE_PORT");
}

#[test]
fn set_then_get_duration_round_trips() {
    let store =
        Store::init_with(Some(PathBuf::from("/nonexistent/config.yml")), Arc::new(NullBackend), &[]).unwrap();

    store.set("HTTP.TIMEOUT", "2s").unwrap();
    assert_eq!(store.get("http.timeout").as_duration().unwrap().as_secs(), 2);
}
