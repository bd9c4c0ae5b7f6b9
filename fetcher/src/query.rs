/// Query construction for the counts API.
///
/// A query is either the fixed history shape
/// `{request, featureID, startDate, endDate, outputFormat}` or an
/// arbitrary caller-supplied override that replaces it entirely — the
/// two are never merged.
use tracing::error;

/// Default start of the observation window (YYYYMMDD).
pub const DEFAULT_START_DATE: &str = "20181206";

/// Default end of the observation window (YYYYMMDD).
pub const DEFAULT_END_DATE: &str = "20181210";

/// Default response format requested from the API.
pub const DEFAULT_OUTPUT_FORMAT: &str = "csv";

/// Query parameters for one API call, in send order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    /// Fixed-shape query with an explicit request type.
    ///
    /// An empty `sensor_id` is logged as an error but the query is still
    /// built with the empty string; callers that need a hard failure must
    /// check before building.
    pub fn fixed(
        request_type: &str,
        sensor_id: &str,
        start_date: &str,
        end_date: &str,
        output_format: &str,
    ) -> Self {
        if sensor_id.is_empty() {
            error!("Sensor ID is missing");
        }
        Self {
            params: vec![
                ("request".to_string(), request_type.to_string()),
                ("featureID".to_string(), sensor_id.to_string()),
                ("startDate".to_string(), start_date.to_string()),
                ("endDate".to_string(), end_date.to_string()),
                ("outputFormat".to_string(), output_format.to_string()),
            ],
        }
    }

    /// Fixed-shape query for one sensor's count history.
    pub fn history(sensor_id: &str, start_date: &str, end_date: &str, output_format: &str) -> Self {
        Self::fixed("history", sensor_id, start_date, end_date, output_format)
    }

    /// Caller-supplied override. Replaces the fixed shape entirely; none
    /// of the history defaults are merged in.
    pub fn custom<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The device-directory query used to enumerate sensors.
    pub fn devices() -> Self {
        Self::custom([("request", "devices")])
    }

    /// The parameters as `(name, value)` pairs.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}
