//! Process entrypoint: parses the CLI, bootstraps settings, registers the
//! default drivers, runs the three-phase lifecycle, then waits for a signal
//! before draining the shutdown registry. Exit code is `0` on a graceful
//! shutdown, `1` on a fatal lifecycle error.

mod cli;
mod demo_app;

use std::sync::Arc;

use chassis_core::lifecycle::{Application, Lifecycle};
use chassis_core::registry::Registry;
use chassis_core::shutdown::ShutdownRegistry;
use chassis_memo::MemoryMemo;
use chassis_pubsub::MemoryPubSub;
use chassis_scheduler::Scheduler;
use chassis_settings::Store;
use clap::Parser;

use cli::Cli;
use demo_app::DemoApplication;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let backend: Arc<dyn chassis_settings::SettingsBackend> = Arc::new(chassis_settings::MemoryBackend::new());
    let mut argv = cli.overrides.clone();
    if cli.test {
        argv.push("--settings.test_mode".to_string());
        argv.push("true".to_string());
    }

    let settings = Store::init_with(Some(cli.config.clone()), backend.clone(), &argv)
        .map_err(|err| miette::miette!("settings failed to initialize: {err}"))?;

    if cli.migrate {
        backend.migrate().map_err(|err| miette::miette!("migration failed: {err}"))?;
        tracing::info!("migration complete");
        return Ok(());
    }

    let shutdown = Arc::new(ShutdownRegistry::new());

    let pubsub_registry: Registry<dyn chassis_pubsub::PubSubDriver> = Registry::new();
    let memory_pubsub = Arc::new(MemoryPubSub::new());
    pubsub_registry
        .add_driver(memory_pubsub.clone())
        .map_err(|err| miette::miette!("pubsub driver registration failed: {err}"))?;

    let memo_registry: Registry<dyn chassis_memo::MemoDriver> = Registry::new();
    let memory_memo = Arc::new(MemoryMemo::new());
    memo_registry
        .add_driver(memory_memo.clone())
        .map_err(|err| miette::miette!("memo driver registration failed: {err}"))?;

    let scheduler = Scheduler::new();
    scheduler.start();

    let apps: Vec<Box<dyn Application>> =
        vec![Box::new(DemoApplication::new(settings.clone(), memory_pubsub.clone(), memory_memo.clone()))];

    let result = Lifecycle::run(apps).await;

    match result {
        Ok(_apps) => {
            tracing::info!("lifecycle started, awaiting shutdown signal");
            wait_for_shutdown_signal().await;
            shutdown.run();
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %err, "lifecycle failed to start");
            std::process::exit(1);
        }
    }
}
