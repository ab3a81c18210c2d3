//! Main entry point for the bdtd-scraper CLI

use bdtd_scraper::cli::Cli;
use bdtd_scraper::shutdown::StopCoordinator;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting.
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bdtd_scraper=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    // Ctrl+C stops submitting new requests; in-flight ones finish so the
    // partial output stays consistent.
    let stop = StopCoordinator::shared();
    tokio::spawn({
        let stop = stop.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - finishing in-flight requests...");
                stop.request_stop();
            }
        }
    });

    if let Err(e) = cli.execute(stop).await.map_err(|e| anyhow::anyhow!(e)) {
        error!("Search failed: {}", e);
        std::process::exit(1);
    }
}
