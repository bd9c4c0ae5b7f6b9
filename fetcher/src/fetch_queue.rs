/// Concurrent fetch queue for fanning per-sensor downloads out.
///
/// Uses a tokio Semaphore to bound concurrency and track every fetch.
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, Semaphore};
use tracing::{error, info, warn};

use crate::errors::FetchResult;

/// State of one tracked fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Queued,
    Running,
    Done,
    Failed,
}

/// Bookkeeping entry for one sensor fetch.
#[derive(Debug, Clone)]
pub struct TrackedFetch {
    pub sensor_id: String,
    pub status: FetchState,
    pub enqueued_at: chrono::DateTime<Utc>,
    pub started_at: Option<chrono::DateTime<Utc>>,
}

/// Fan-out queue with bounded concurrency.
///
/// Each unit of work is independent and stateless; a job's failure is
/// terminal for that sensor only. It is logged and recorded in the
/// tracked state, never propagated to the caller.
pub struct FetchQueue {
    /// Semaphore to limit concurrent fetches.
    semaphore: Arc<Semaphore>,
    /// Tracked fetch metadata.
    fetches: Arc<Mutex<HashMap<String, TrackedFetch>>>,
    /// Max concurrent fetches.
    max_concurrent: usize,
}

impl FetchQueue {
    /// Create a new fetch queue with the given concurrency limit.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            fetches: Arc::new(Mutex::new(HashMap::new())),
            max_concurrent,
        }
    }

    /// Run `job` once per sensor id with at most `max_concurrent` in
    /// flight, and wait until every id reaches a terminal state.
    ///
    /// Ordering between ids is unspecified. Duplicate ids are tracked
    /// once; they would only overwrite the same output file.
    pub async fn run_all<F, Fut>(&self, sensor_ids: Vec<String>, job: F) -> QueueStats
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = FetchResult<PathBuf>> + Send + 'static,
    {
        let mut handles = Vec::with_capacity(sensor_ids.len());

        for sensor_id in sensor_ids {
            if !self.enqueue(&sensor_id).await {
                continue;
            }

            // Build the future up front; it is not polled until the
            // spawned task holds a permit.
            let fut = job(sensor_id.clone());
            let semaphore = Arc::clone(&self.semaphore);
            let fetches = Arc::clone(&self.fetches);

            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => {
                        warn!("Semaphore closed for sensor {}", sensor_id);
                        return;
                    }
                };

                if let Some(fetch) = fetches.lock().await.get_mut(&sensor_id) {
                    fetch.status = FetchState::Running;
                    fetch.started_at = Some(Utc::now());
                }

                match fut.await {
                    Ok(path) => {
                        if let Some(fetch) = fetches.lock().await.get_mut(&sensor_id) {
                            fetch.status = FetchState::Done;
                        }
                        info!("Sensor {} fetched to {}", sensor_id, path.display());
                    }
                    Err(e) => {
                        if let Some(fetch) = fetches.lock().await.get_mut(&sensor_id) {
                            fetch.status = FetchState::Failed;
                        }
                        error!("Fetch for sensor {} failed: {}", sensor_id, e);
                    }
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Fetch task panicked: {}", e);
            }
        }

        self.stats().await
    }

    /// Track a sensor. Returns false if already tracked.
    async fn enqueue(&self, sensor_id: &str) -> bool {
        let mut fetches = self.fetches.lock().await;
        if fetches.contains_key(sensor_id) {
            warn!("Sensor {} already in queue", sensor_id);
            return false;
        }

        fetches.insert(
            sensor_id.to_string(),
            TrackedFetch {
                sensor_id: sensor_id.to_string(),
                status: FetchState::Queued,
                enqueued_at: Utc::now(),
                started_at: None,
            },
        );
        true
    }

    /// Get the current state of one tracked fetch.
    pub async fn get_status(&self, sensor_id: &str) -> Option<TrackedFetch> {
        self.fetches.lock().await.get(sensor_id).cloned()
    }

    /// Get queue statistics.
    pub async fn stats(&self) -> QueueStats {
        let fetches = self.fetches.lock().await;
        QueueStats {
            max_concurrent: self.max_concurrent,
            queued: fetches
                .values()
                .filter(|f| f.status == FetchState::Queued)
                .count(),
            running: fetches
                .values()
                .filter(|f| f.status == FetchState::Running)
                .count(),
            done: fetches
                .values()
                .filter(|f| f.status == FetchState::Done)
                .count(),
            failed: fetches
                .values()
                .filter(|f| f.status == FetchState::Failed)
                .count(),
            total_tracked: fetches.len(),
        }
    }
}

/// Queue statistics snapshot.
#[derive(Debug, Clone, serde::Serialize)]
pub struct QueueStats {
    pub max_concurrent: usize,
    pub queued: usize,
    pub running: usize,
    pub done: usize,
    pub failed: usize,
    pub total_tracked: usize,
}
