//! Request plumbing shared by the OCR and pipeline clients.

use reqwest::multipart::Part;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::models::document::Document;

/// Build a `reqwest` client with the configured per-request timeout.
pub(crate) fn build_client(timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .user_agent(concat!("vllm-ocr-client/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(ApiError::Http)
}

/// Parse and check a base origin. Must be an absolute http(s) URL.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw).map_err(|e| ApiError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "expected an http or https origin".to_string(),
        });
    }
    Ok(url)
}

/// Append path segments to a base URL. Each segment is percent-encoded.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Multipart `file` part carrying the document bytes and sniffed MIME type.
pub(crate) fn document_part(document: &Document) -> Result<Part, ApiError> {
    Part::bytes(document.bytes().to_vec())
        .file_name(document.file_name().to_string())
        .mime_str(document.mime_type())
        .map_err(ApiError::Http)
}

/// Check the status code, then decode the JSON body.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    let body = response.text().await.map_err(ApiError::Http)?;
    serde_json::from_str(&body).map_err(ApiError::Decode)
}

/// Turn a non-2xx response into `ApiError::Status`.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status,
        detail: error_detail(status, &body),
    })
}

/// FastAPI puts the message under `detail`, either a string or a list of
/// validation errors. Fall back to the raw body, then the reason phrase.
fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(other) if !other.is_null() => return other.to_string(),
            _ => {}
        }
    }
    let body = body.trim();
    if body.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        body.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Service returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    Validation(#[from] garde::Report),

    #[error("Service response did not include a job identifier")]
    MissingJobId,
}

impl ApiError {
    /// The message a user should see, e.g. the service's `detail` string.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}
