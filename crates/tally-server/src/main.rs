use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use tracing::info;

use tally_core::config::Config;
use tally_duckdb::DuckDbBackend;
use tally_server::state::AppState;

/// `tally health`: liveness check for container HEALTHCHECKs.
///
/// Calls `GET http://localhost:$TALLY_PORT/health` and exits 0 on HTTP 200,
/// 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("TALLY_PORT").unwrap_or_else(|_| "8091".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }

    // Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tally=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/tally.db", cfg.data_dir);
    let db = DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)?;

    let addr = format!("0.0.0.0:{}", cfg.port);
    let state = Arc::new(AppState::new(Arc::new(db), cfg.clone()));
    let app = tally_server::app::build_app(state);

    info!(
        port = cfg.port,
        heartbeat_secs = cfg.heartbeat_secs,
        subscriber_capacity = cfg.subscriber_capacity,
        "Tally listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("Tally stopped");
    Ok(())
}
