use garde::Validate;
use reqwest::multipart::Form;
use reqwest::{Client, Url};
use std::time::{Duration, Instant};

use crate::models::document::Document;
use crate::models::model::{BenchmarkRow, ModelInfo, SetActiveModelRequest};
use crate::models::ocr::{OcrResponse, ProcessOptions};
use crate::services::http::{self, ApiError};

/// Client for the primary OCR API: synchronous extraction, model registry and benchmarks.
pub struct OcrApiClient {
    http: Client,
    base_url: Url,
}

impl OcrApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            http: http::build_client(timeout)?,
            base_url: http::parse_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /models`
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        let response = self
            .http
            .get(http::endpoint(&self.base_url, &["models"]))
            .send()
            .await?;
        http::decode_json(response).await
    }

    /// `POST /models/active`. The response body carries no contract beyond success.
    pub async fn set_active_model(&self, name: &str) -> Result<(), ApiError> {
        let body = SetActiveModelRequest { name: name.to_string() };
        body.validate()?;

        let response = self
            .http
            .post(http::endpoint(&self.base_url, &["models", "active"]))
            .json(&body)
            .send()
            .await?;
        http::ensure_success(response).await?;

        tracing::info!(model = %name, "Active model changed");
        Ok(())
    }

    /// Send an image to `POST /ocr/process` and wait for the extracted result.
    ///
    /// No retries: a transport or service error is returned to the caller as is.
    pub async fn process(&self, document: &Document, options: &ProcessOptions) -> Result<OcrResponse, ApiError> {
        options.validate()?;

        let mut form = Form::new().part("file", http::document_part(document)?);
        for (name, value) in options.form_fields() {
            form = form.text(name, value);
        }

        tracing::debug!(
            file = %document.file_name(),
            bytes = document.len(),
            model = options.model_name.as_deref().unwrap_or("<active>"),
            "Submitting document for synchronous OCR"
        );

        let start = Instant::now();
        let response = self
            .http
            .post(http::endpoint(&self.base_url, &["ocr", "process"]))
            .multipart(form)
            .send()
            .await?;
        let result: OcrResponse = http::decode_json(response).await?;
        let elapsed = start.elapsed();

        metrics::histogram!("ocr_process_seconds").record(elapsed.as_secs_f64());
        tracing::info!(
            file = %document.file_name(),
            format = %result.format,
            duration_ms = elapsed.as_millis() as u64,
            "OCR extraction complete"
        );

        Ok(result)
    }

    /// `GET /benchmark`
    pub async fn benchmarks(&self) -> Result<Vec<BenchmarkRow>, ApiError> {
        let response = self
            .http
            .get(http::endpoint(&self.base_url, &["benchmark"]))
            .send()
            .await?;
        http::decode_json(response).await
    }
}
