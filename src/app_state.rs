use std::sync::Arc;

use crate::config::ClientConfig;
use crate::services::{
    http::ApiError,
    ocr::OcrApiClient,
    pipeline::{PipelineApi, PipelineApiClient},
    registry::ModelRegistry,
    tracker::JobTracker,
};

/// Service clients built once from configuration and shared by every command.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ClientConfig>,
    pub ocr: Arc<OcrApiClient>,
    pub pipeline: Arc<PipelineApiClient>,
}

impl AppState {
    pub fn new(config: ClientConfig, ocr: OcrApiClient, pipeline: PipelineApiClient) -> Self {
        Self {
            config: Arc::new(config),
            ocr: Arc::new(ocr),
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, ApiError> {
        let timeout = config.request_timeout();
        let ocr = OcrApiClient::new(&config.ocr_api_url, timeout)?;
        let pipeline = PipelineApiClient::new(&config.pipeline_api_url, timeout)?;
        Ok(Self::new(config, ocr, pipeline))
    }

    /// A fresh job tracker bound to the pipeline client.
    pub fn job_tracker(&self) -> JobTracker {
        let api: Arc<dyn PipelineApi> = self.pipeline.clone();
        JobTracker::new(api, self.config.poll_interval())
    }

    pub fn model_registry(&self) -> ModelRegistry {
        ModelRegistry::new(Arc::clone(&self.ocr))
    }
}
