use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the primary OCR API (models, synchronous OCR, benchmarks).
    #[serde(default = "default_ocr_api_url")]
    pub ocr_api_url: String,

    /// Base URL of the pipeline job API. Runs on a different origin than the OCR API.
    #[serde(default = "default_pipeline_api_url")]
    pub pipeline_api_url: String,

    /// Interval between job status polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-request timeout for every HTTP call, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_ocr_api_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_pipeline_api_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ocr_api_url: default_ocr_api_url(),
            pipeline_api_url: default_pipeline_api_url(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Load from `.env` (if present) and process environment variables.
    ///
    /// Recognised variables: `OCR_API_URL`, `PIPELINE_API_URL`,
    /// `POLL_INTERVAL_MS`, `REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Build a config pointing at explicit origins, other settings defaulted.
    pub fn new(ocr_api_url: impl Into<String>, pipeline_api_url: impl Into<String>) -> Self {
        Self {
            ocr_api_url: ocr_api_url.into(),
            pipeline_api_url: pipeline_api_url.into(),
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let vars: Vec<(String, String)> = Vec::new();
        let config: ClientConfig = envy::from_iter(vars).unwrap();
        assert_eq!(config.ocr_api_url, "http://localhost:8000/api/v1");
        assert_eq!(config.pipeline_api_url, "http://localhost:8001");
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_env_overrides_each_origin_independently() {
        let vars = vec![
            ("PIPELINE_API_URL".to_string(), "http://10.0.0.5:9001".to_string()),
            ("POLL_INTERVAL_MS".to_string(), "250".to_string()),
        ];
        let config: ClientConfig = envy::from_iter(vars).unwrap();
        assert_eq!(config.ocr_api_url, "http://localhost:8000/api/v1");
        assert_eq!(config.pipeline_api_url, "http://10.0.0.5:9001");
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = ClientConfig::default().with_poll_interval(Duration::ZERO);
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_oversized_interval_saturates() {
        let config = ClientConfig::default().with_poll_interval(Duration::MAX);
        assert_eq!(config.poll_interval_ms, u64::MAX);
        assert_eq!(config.poll_interval(), Duration::from_millis(u64::MAX));
    }
}
