//! Binary entrypoint (spec §6): process bootstrap, environment-driven
//! listener binding, and the top-level axum serve + graceful-shutdown loop.
//! The store/log/session/registry/dispatcher wiring itself lives in
//! `warden_engine::bootstrap` so it can be driven identically from tests.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

const APP_NAME: &str = "warden";

fn data_dir() -> PathBuf {
    std::env::var("WARDEN_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./warden-data"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = config::load_and_apply(APP_NAME, None);

    let data_dir = data_dir();
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let _tracing_guard = config::init_tracing(&log_dir, "warden-engine");

    let max_in_flight: usize = std::env::var("WARDEN_MAX_IN_FLIGHT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(warden_dispatch::DEFAULT_MAX_IN_FLIGHT);

    let engine = warden_engine::bootstrap(&data_dir, max_in_flight).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let dispatcher_handle = tokio::spawn(engine.dispatcher.clone().run(shutdown_rx.clone()));
    let sweep_handle = tokio::spawn(warden_engine::session_sweep_loop(
        engine.queue.clone(),
        Duration::from_secs(3600),
        shutdown_rx.clone(),
    ));

    let addr = std::env::var("WARDEN_LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:8099".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "warden-engine listening");

    let app = warden_engine::app::router(engine.state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = dispatcher_handle.await;
    let _ = sweep_handle.await;
    Ok(())
}
