/// HTTP fetching for the counts API.
///
/// One `reqwest::Client` is built up front with the per-request timeout
/// and reused for every call; successful responses are written verbatim
/// to disk, every other outcome leaves the filesystem untouched.
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{error, info};

use crate::errors::{FetchError, FetchResult};
use crate::query::Query;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Build the output path `<dir>/<filename>.<filetype>`.
pub fn output_path(dir: &Path, filename: &str, filetype: &str) -> PathBuf {
    dir.join(format!("{}.{}", filename, filetype))
}

/// HTTP fetcher for the counts API.
pub struct Fetcher {
    client: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl Fetcher {
    /// Create a fetcher for the given endpoint with the given request
    /// timeout.
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            timeout_secs,
        })
    }

    /// The endpoint this fetcher talks to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Perform one GET and write the response body to `dest`.
    ///
    /// The file is created (or overwritten) only when the server answers
    /// 200, and then holds exactly the bytes of the response body. 404,
    /// any other non-200 status, and timeouts are returned as errors with
    /// no file produced. No retries.
    pub async fn fetch_to_file(&self, query: &Query, dest: &Path) -> FetchResult<PathBuf> {
        info!("Making request to {}", self.url);
        info!("Query parameters: {:?}", query.params());

        let response = self
            .client
            .get(&self.url)
            .query(query.params())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        match response.status() {
            StatusCode::OK => {
                info!("Request successful");
                let body = response.bytes().await.map_err(|e| self.classify(e))?;
                tokio::fs::write(dest, &body).await?;
                info!("File created: {}", dest.display());
                Ok(dest.to_path_buf())
            }
            StatusCode::NOT_FOUND => {
                error!("Resource not found: {}", self.url);
                Err(FetchError::NotFound {
                    url: self.url.clone(),
                })
            }
            status => {
                error!("Request unsuccessful: status {} from {}", status, self.url);
                Err(FetchError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: self.url.clone(),
                })
            }
        }
    }

    /// Map reqwest timeouts onto the dedicated timeout variant.
    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            error!("Request timed out");
            FetchError::Timeout(self.timeout_secs)
        } else {
            err.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::RawQuery;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    /// Serve `app` on a loopback port, returning the base URL.
    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("data"), "bikes_sensors", "json");
        assert_eq!(path, PathBuf::from("data/bikes_sensors.json"));
    }

    #[tokio::test]
    async fn test_success_writes_body_verbatim() {
        let body = "Date,Count\n2018/12/06,153\n";
        let app = Router::new().route("/counts", get(move || async move { body }));
        let base = spawn_server(app).await;

        let dir = tempfile::tempdir().unwrap();
        let dest = output_path(dir.path(), "data", "csv");

        let fetcher = Fetcher::new(format!("{}/counts", base), 5).unwrap();
        let query = Query::history("CB02411", "20181206", "20181210", "csv");
        let written = fetcher.fetch_to_file(&query, &dest).await.unwrap();

        assert_eq!(written, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), body.as_bytes());
    }

    #[tokio::test]
    async fn test_query_parameters_reach_the_server() {
        // The server echoes the raw query string back as the body, so the
        // written file doubles as a record of what was sent.
        let app = Router::new().route(
            "/counts",
            get(|RawQuery(q): RawQuery| async move { q.unwrap_or_default() }),
        );
        let base = spawn_server(app).await;

        let dir = tempfile::tempdir().unwrap();
        let dest = output_path(dir.path(), "echo", "txt");

        let fetcher = Fetcher::new(format!("{}/counts", base), 5).unwrap();
        let query = Query::history("CEK049", "20181206", "20230331", "csv");
        fetcher.fetch_to_file(&query, &dest).await.unwrap();

        let echoed = std::fs::read_to_string(&dest).unwrap();
        assert_eq!(
            echoed,
            "request=history&featureID=CEK049&startDate=20181206&endDate=20230331&outputFormat=csv"
        );
    }

    #[tokio::test]
    async fn test_not_found_produces_no_file() {
        // No /counts route registered: axum answers 404.
        let app = Router::new().route("/elsewhere", get(|| async { "nope" }));
        let base = spawn_server(app).await;

        let dir = tempfile::tempdir().unwrap();
        let dest = output_path(dir.path(), "data", "csv");

        let fetcher = Fetcher::new(format!("{}/counts", base), 5).unwrap();
        let err = fetcher
            .fetch_to_file(&Query::devices(), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::NotFound { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_server_error_produces_no_file() {
        let app = Router::new().route(
            "/counts",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let base = spawn_server(app).await;

        let dir = tempfile::tempdir().unwrap();
        let dest = output_path(dir.path(), "data", "csv");

        let fetcher = Fetcher::new(format!("{}/counts", base), 5).unwrap();
        let err = fetcher
            .fetch_to_file(&Query::devices(), &dest)
            .await
            .unwrap_err();

        match err {
            FetchError::UnexpectedStatus { status, .. } => assert_eq!(status, 500),
            other => panic!("expected UnexpectedStatus, got {:?}", other),
        }
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_timeout_produces_no_file() {
        let app = Router::new().route(
            "/counts",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        );
        let base = spawn_server(app).await;

        let dir = tempfile::tempdir().unwrap();
        let dest = output_path(dir.path(), "data", "csv");

        let fetcher = Fetcher::new(format!("{}/counts", base), 1).unwrap();
        let err = fetcher
            .fetch_to_file(&Query::devices(), &dest)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(!dest.exists());
    }
}
