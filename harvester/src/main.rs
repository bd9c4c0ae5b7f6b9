/// Velo Harvest - Main Entry Point
///
/// Collects Brussels bike-counter data: discovers the sensors from the
/// mobility API, then fans the per-sensor history downloads out across a
/// bounded fetch queue.
mod pipeline;

use tracing::info;

use pipeline::HarvestConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "velo_harvester=info,velo_fetcher=info".into()),
        )
        .init();

    info!("=== Velo Harvest Starting ===");

    let config = HarvestConfig::from_env();
    pipeline::run(&config).await?;

    info!("Velo Harvest finished.");
    Ok(())
}
