//! Battery Telemetry - Main Entry Point

use poller::config::Settings;
use poller::{logging, run_once};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "battery-telemetry".to_string());
    let settings = Settings::load(&config_path)?;

    let _guard = logging::init(&settings.log);

    info!("=== Telemetry run start ===");
    run_once(&settings).await;
    info!("===  Telemetry run end  ===");

    Ok(())
}
