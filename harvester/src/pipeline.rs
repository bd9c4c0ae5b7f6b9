/// The harvest pipeline: directory setup, sensor discovery, and the
/// parallel per-sensor history fetch.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use velo_fetcher::fetch::output_path;
use velo_fetcher::query::DEFAULT_OUTPUT_FORMAT;
use velo_fetcher::{FeatureCollection, FetchQueue, Fetcher, Query};

/// Endpoint of the Brussels mobility bike-count API.
const DEFAULT_API_URL: &str = "https://data.mobility.brussels/bike/api/counts";

/// Runtime configuration. The defaults cover the full historical window
/// of the Brussels counters, so a bare invocation needs no environment.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub api_url: String,
    pub data_dir: PathBuf,
    pub start_date: String,
    pub end_date: String,
    pub max_concurrent: usize,
    pub timeout_secs: u64,
}

impl HarvestConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        let api_url =
            std::env::var("VELO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let data_dir = std::env::var("VELO_DATA_DIR").unwrap_or_else(|_| "data".to_string());
        let start_date =
            std::env::var("VELO_START_DATE").unwrap_or_else(|_| "20181206".to_string());
        let end_date = std::env::var("VELO_END_DATE").unwrap_or_else(|_| "20230331".to_string());
        let max_concurrent: usize = std::env::var("MAX_CONCURRENT_FETCHES")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let timeout_secs: u64 = std::env::var("FETCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        Self {
            api_url,
            data_dir: PathBuf::from(data_dir),
            start_date,
            end_date,
            max_concurrent,
            timeout_secs,
        }
    }

    /// Directory the per-sensor files are written to.
    fn sensors_dir(&self) -> PathBuf {
        self.data_dir.join("sensors")
    }
}

/// Run the full harvest: discover the sensors, then fetch every sensor's
/// count history. Per-sensor failures are logged and counted; only the
/// discovery phase is fatal to the run.
pub async fn run(config: &HarvestConfig) -> anyhow::Result<()> {
    let sensors_dir = config.sensors_dir();
    ensure_dir(&config.data_dir)?;
    ensure_dir(&sensors_dir)?;

    let fetcher = Arc::new(Fetcher::new(&config.api_url, config.timeout_secs)?);

    info!("Obtaining sensor ids");
    let listing_path = output_path(&config.data_dir, "bikes_sensors", "json");
    fetcher
        .fetch_to_file(&Query::devices(), &listing_path)
        .await
        .context("failed to fetch the sensor directory")?;

    // Re-open the listing file and extract every device name.
    let listing = std::fs::read_to_string(&listing_path)
        .with_context(|| format!("failed to read {}", listing_path.display()))?;
    let collection: FeatureCollection = serde_json::from_str(&listing)
        .context("sensor directory is not a valid feature collection")?;
    let sensors = collection.device_names();

    info!(
        "Found {} sensors in the API. Getting their data ...",
        sensors.len()
    );

    let queue = FetchQueue::new(config.max_concurrent);
    let start_date = config.start_date.clone();
    let end_date = config.end_date.clone();
    let stats = queue
        .run_all(sensors, move |sensor_id| {
            let fetcher = Arc::clone(&fetcher);
            let sensors_dir = sensors_dir.clone();
            let start_date = start_date.clone();
            let end_date = end_date.clone();
            async move {
                let query =
                    Query::history(&sensor_id, &start_date, &end_date, DEFAULT_OUTPUT_FORMAT);
                let dest = output_path(
                    &sensors_dir,
                    &format!("bikes_counts_{}", sensor_id),
                    "csv",
                );
                fetcher.fetch_to_file(&query, &dest).await
            }
        })
        .await;

    info!(
        "Harvest complete: {} fetched, {} failed, {} sensors total",
        stats.done, stats.failed, stats.total_tracked
    );
    Ok(())
}

/// Create a directory if absent, logging only when it was created.
fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        info!("{} - Directory created", path.display());
    }
    Ok(())
}
