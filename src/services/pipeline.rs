use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

use crate::models::document::Document;
use crate::models::job::{JobResultResponse, SubmitResponse};
use crate::models::schema::{DocumentKind, ExtractionSchema};
use crate::services::http::{self, ApiError};

/// The job endpoints the tracker drives. Implemented over HTTP by
/// [`PipelineApiClient`]; tests substitute scripted implementations.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Submit a document (and optional schema) as a new job.
    async fn submit_job(
        &self,
        document: &Document,
        schema: Option<&ExtractionSchema>,
    ) -> Result<SubmitResponse, ApiError>;

    /// Fetch the current status (and result, once completed) of a job.
    async fn fetch_result(&self, job_id: &str) -> Result<JobResultResponse, ApiError>;
}

/// Client for the pipeline API, which lives on its own origin.
pub struct PipelineApiClient {
    http: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl PipelineApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            http: http::build_client(timeout)?,
            base_url: http::parse_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /api/v1/ocr/direct`: bypasses the job queue and returns the
    /// structured result for a known identity document kind.
    ///
    /// Only served by deployments that mount the fast OCR router next to the
    /// job routes; elsewhere this is a 404 surfaced as `ApiError::Status`.
    pub async fn process_direct(&self, document: &Document, kind: DocumentKind) -> Result<serde_json::Value, ApiError> {
        let form = Form::new()
            .part("file", http::document_part(document)?)
            .text("type", kind.as_ref().to_string());

        let response = self
            .http
            .post(http::endpoint(&self.base_url, &["api", "v1", "ocr", "direct"]))
            .multipart(form)
            .send()
            .await?;
        let result = http::decode_json(response).await?;

        tracing::info!(file = %document.file_name(), kind = %kind, "Direct extraction complete");
        Ok(result)
    }

    /// `GET /health`
    pub async fn health_check(&self) -> Result<HealthResponse, ApiError> {
        let response = self
            .http
            .get(http::endpoint(&self.base_url, &["health"]))
            .send()
            .await?;
        http::decode_json(response).await
    }
}

#[async_trait]
impl PipelineApi for PipelineApiClient {
    async fn submit_job(
        &self,
        document: &Document,
        schema: Option<&ExtractionSchema>,
    ) -> Result<SubmitResponse, ApiError> {
        let mut form = Form::new().part("file", http::document_part(document)?);
        if let Some(schema) = schema.filter(|s| !s.is_empty()) {
            form = form.text("schema", schema.to_json_string());
        }

        let response = self
            .http
            .post(http::endpoint(&self.base_url, &["v1", "ocr", "schema"]))
            .multipart(form)
            .send()
            .await?;
        let submitted: SubmitResponse = http::decode_json(response).await?;

        if submitted.job_id.trim().is_empty() {
            return Err(ApiError::MissingJobId);
        }
        Ok(submitted)
    }

    async fn fetch_result(&self, job_id: &str) -> Result<JobResultResponse, ApiError> {
        let response = self
            .http
            .get(http::endpoint(&self.base_url, &["v1", "ocr", "results", job_id]))
            .send()
            .await?;
        http::decode_json(response).await
    }
}
