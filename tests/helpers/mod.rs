//! Test helper utilities: a scripted pipeline service and client builders.

// Shared by several test binaries; each uses a subset.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

use reqwest::StatusCode;
use vllm_ocr_client::{
    app_state::AppState,
    config::ClientConfig,
    models::{
        document::Document,
        job::{JobResultResponse, JobStatus, SubmitResponse},
        schema::ExtractionSchema,
    },
    services::{http::ApiError, pipeline::PipelineApi},
};

use crate::fixtures::PNG_BYTES;

/// One scripted answer to a status poll.
pub enum PollStep {
    Status(JobResultResponse),
    /// Simulates a transport failure for this tick.
    Unreachable,
    /// Blocks until the gate is notified, then answers.
    Held(Arc<Notify>, JobResultResponse),
}

/// In-memory stand-in for the pipeline service.
///
/// Poll answers are consumed from the script in order; once it runs dry
/// every poll reports `processing`.
pub struct ScriptedPipeline {
    job_id: String,
    submit_error: Option<StatusCode>,
    submit_gate: Option<Arc<Notify>>,
    steps: Mutex<VecDeque<PollStep>>,
    pub submit_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
    pub last_schema: Mutex<Option<ExtractionSchema>>,
}

impl ScriptedPipeline {
    pub fn new(job_id: &str, steps: Vec<PollStep>) -> Self {
        Self {
            job_id: job_id.to_string(),
            submit_error: None,
            submit_gate: None,
            steps: Mutex::new(steps.into()),
            submit_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            last_schema: Mutex::new(None),
        }
    }

    /// Scripted service that hands out a fresh v4 job id.
    pub fn with_random_id(steps: Vec<PollStep>) -> Self {
        Self::new(&Uuid::new_v4().to_string(), steps)
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn failing_submit(status: StatusCode) -> Self {
        let mut pipeline = Self::new("unused", Vec::new());
        pipeline.submit_error = Some(status);
        pipeline
    }

    pub fn with_submit_gate(mut self, gate: Arc<Notify>) -> Self {
        self.submit_gate = Some(gate);
        self
    }

    /// Queue more poll answers, e.g. before a second submission.
    pub fn push_steps(&self, steps: Vec<PollStep>) {
        self.steps.lock().unwrap().extend(steps);
    }

    pub fn submits(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PipelineApi for ScriptedPipeline {
    async fn submit_job(
        &self,
        _document: &Document,
        schema: Option<&ExtractionSchema>,
    ) -> Result<SubmitResponse, ApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_schema.lock().unwrap() = schema.cloned();

        if let Some(gate) = &self.submit_gate {
            gate.notified().await;
        }
        if let Some(status) = self.submit_error {
            return Err(ApiError::Status {
                status,
                detail: "queue unavailable".to_string(),
            });
        }
        Ok(SubmitResponse {
            job_id: self.job_id.clone(),
            status: JobStatus::Submitted,
        })
    }

    async fn fetch_result(&self, job_id: &str) -> Result<JobResultResponse, ApiError> {
        assert_eq!(job_id, self.job_id, "polled an unexpected job id");
        self.poll_calls.fetch_add(1, Ordering::SeqCst);

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(PollStep::Status(response)) => Ok(response),
            Some(PollStep::Unreachable) => Err(ApiError::Status {
                status: StatusCode::BAD_GATEWAY,
                detail: "connection reset".to_string(),
            }),
            Some(PollStep::Held(gate, response)) => {
                gate.notified().await;
                Ok(response)
            }
            None => Ok(status(JobStatus::Processing)),
        }
    }
}

pub fn status(status: JobStatus) -> JobResultResponse {
    JobResultResponse {
        status,
        result: None,
        error: None,
    }
}

pub fn completed(result: serde_json::Value) -> JobResultResponse {
    JobResultResponse {
        status: JobStatus::Completed,
        result: Some(result),
        error: None,
    }
}

pub fn failed(error: Option<&str>) -> JobResultResponse {
    JobResultResponse {
        status: JobStatus::Failed,
        result: None,
        error: error.map(str::to_string),
    }
}

pub fn sample_document() -> Document {
    Document::from_bytes("nid_front.png", PNG_BYTES.to_vec()).expect("fixture is a PNG")
}

/// App state whose two origins both point at one mock server, with a short poll interval.
pub fn state_for(ocr_base: &str, pipeline_base: &str) -> AppState {
    let config = ClientConfig::new(ocr_base, pipeline_base).with_poll_interval(Duration::from_millis(20));
    AppState::from_config(config).expect("mock server URL is valid")
}

/// Let spawned tasks run; with paused time this also auto-advances the clock.
pub async fn settle(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
