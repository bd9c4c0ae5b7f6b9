//! Shared fetching logic for Velo Harvest: query construction, API
//! response models, the HTTP fetcher, and the bounded fetch queue.

pub mod errors;
pub mod fetch;
pub mod fetch_queue;
pub mod models;
pub mod query;

pub use errors::{FetchError, FetchResult};
pub use fetch::{output_path, Fetcher, DEFAULT_TIMEOUT_SECS};
pub use fetch_queue::{FetchQueue, QueueStats};
pub use models::FeatureCollection;
pub use query::Query;
