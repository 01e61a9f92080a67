//! Proctoring Worker - Main Entry Point

use tokio::io::BufReader;
use tracing::info;
use worker::{build_engine, init_logging, run, ProctorService, WorkerSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).or_else(|| std::env::var("PROCTOR_CONFIG").ok());
    let settings = WorkerSettings::load(config_path.as_deref())?;
    init_logging(settings.log_json);

    info!("=== Proctor Worker v{} ===", env!("CARGO_PKG_VERSION"));

    let engine = build_engine(&settings.proctor.detection)?;
    let service = ProctorService::new(engine, &settings);

    info!("Waiting for frames on stdin...");
    run(service, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    info!("Input closed, worker shutting down");
    Ok(())
}
