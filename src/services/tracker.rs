//! Lifecycle of one pipeline job, from submission to a terminal status.
//!
//! The tracker owns a single job record. `submit` obtains a job id and spawns
//! a [`PollTask`] that fetches the job status immediately and then on a fixed
//! interval until the service reports `completed` or `failed`. `reset`
//! abandons the job locally; nothing is sent to the service.
//!
//! Every submit and reset bumps an epoch counter. A poll task only applies
//! responses while the record still carries the epoch and job id it was
//! spawned for, so a late response for an abandoned job is dropped.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::models::document::Document;
use crate::models::job::{Job, JobResultResponse, JobSnapshot, JobState};
use crate::models::schema::ExtractionSchema;
use crate::services::http::ApiError;
use crate::services::pipeline::PipelineApi;

/// Handle to a running poll loop. Stopping it aborts the task.
pub struct PollTask {
    handle: JoinHandle<()>,
}

impl PollTask {
    fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

struct JobRecord {
    epoch: u64,
    snapshot: JobSnapshot,
    poller: Option<PollTask>,
}

struct Shared {
    record: Mutex<JobRecord>,
    updates: watch::Sender<JobSnapshot>,
}

enum PollFlow {
    Continue,
    Stop,
}

impl Shared {
    fn new() -> Self {
        let (updates, _) = watch::channel(JobSnapshot::default());
        Self {
            record: Mutex::new(JobRecord {
                epoch: 0,
                snapshot: JobSnapshot::default(),
                poller: None,
            }),
            updates,
        }
    }

    fn lock(&self) -> MutexGuard<'_, JobRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, record: &JobRecord) {
        self.updates.send_replace(record.snapshot.clone());
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.lock().epoch == epoch
    }

    /// Apply one status response. Terminal states are never overwritten.
    fn apply_poll(&self, epoch: u64, job_id: &str, response: JobResultResponse) -> PollFlow {
        let mut record = self.lock();
        if record.epoch != epoch || record.snapshot.job_id() != Some(job_id) {
            tracing::debug!(job_id = %job_id, epoch, "Dropping status for abandoned job");
            return PollFlow::Stop;
        }
        if record.snapshot.state.is_terminal() {
            return PollFlow::Stop;
        }

        let next = response.status.client_state();
        if let Some(job) = record.snapshot.job.as_mut() {
            job.status = response.status;
        }

        match next {
            JobState::Completed => {
                if let Some(job) = record.snapshot.job.as_mut() {
                    job.result = response.result;
                }
                record.snapshot.state = JobState::Completed;
                metrics::counter!("pipeline_jobs_completed_total").increment(1);
                tracing::info!(job_id = %job_id, "Pipeline job completed");
            }
            JobState::Failed => {
                let error = response
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "Job failed".to_string());
                record.snapshot.state = JobState::Failed;
                record.snapshot.error = Some(error.clone());
                metrics::counter!("pipeline_jobs_failed_total").increment(1);
                tracing::warn!(job_id = %job_id, error = %error, "Pipeline job failed");
            }
            _ => {
                record.snapshot.state = JobState::Processing;
                tracing::trace!(job_id = %job_id, status = %response.status, "Job still processing");
            }
        }

        let flow = if next.is_terminal() {
            // The loop exits on its own; detach the handle.
            drop(record.poller.take());
            PollFlow::Stop
        } else {
            PollFlow::Continue
        };
        self.publish(&record);
        flow
    }
}

async fn poll_until_settled(
    api: Arc<dyn PipelineApi>,
    shared: Arc<Shared>,
    epoch: u64,
    job_id: String,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // First tick completes immediately.
        ticker.tick().await;

        match api.fetch_result(&job_id).await {
            Ok(response) => {
                if let PollFlow::Stop = shared.apply_poll(epoch, &job_id, response) {
                    break;
                }
            }
            Err(e) => {
                if !shared.is_current(epoch) {
                    break;
                }
                metrics::counter!("pipeline_poll_errors_total").increment(1);
                tracing::warn!(job_id = %job_id, error = %e, "Status poll failed, retrying next tick");
            }
        }
    }
}

/// Tracks one externally executed extraction job at a time.
pub struct JobTracker {
    api: Arc<dyn PipelineApi>,
    shared: Arc<Shared>,
    poll_interval: Duration,
}

impl JobTracker {
    pub fn new(api: Arc<dyn PipelineApi>, poll_interval: Duration) -> Self {
        Self {
            api,
            shared: Arc::new(Shared::new()),
            poll_interval,
        }
    }

    /// Submit a document as a new job and start polling it.
    ///
    /// Rejected without contacting the service while another job is
    /// `submitted` or `processing`.
    pub async fn submit(
        &self,
        document: &Document,
        schema: Option<&ExtractionSchema>,
    ) -> Result<String, TrackerError> {
        let epoch = {
            let mut record = self.shared.lock();
            if record.snapshot.state.is_active() {
                return Err(TrackerError::JobInFlight {
                    state: record.snapshot.state,
                });
            }
            if let Some(poller) = record.poller.take() {
                poller.stop();
            }
            record.epoch += 1;
            record.snapshot = JobSnapshot {
                state: JobState::Submitted,
                ..JobSnapshot::default()
            };
            self.shared.publish(&record);
            record.epoch
        };

        let outcome = self
            .api
            .submit_job(document, schema)
            .await
            .and_then(|submitted| {
                if submitted.job_id.trim().is_empty() {
                    Err(ApiError::MissingJobId)
                } else {
                    Ok(submitted)
                }
            });

        let mut record = self.shared.lock();
        if record.epoch != epoch {
            return Err(TrackerError::Abandoned);
        }

        match outcome {
            Ok(submitted) => {
                let job_id = submitted.job_id;
                record.snapshot.job = Some(Job::new(job_id.clone(), submitted.status));
                record.snapshot.state = JobState::Processing;
                record.poller = Some(PollTask::spawn(poll_until_settled(
                    Arc::clone(&self.api),
                    Arc::clone(&self.shared),
                    epoch,
                    job_id.clone(),
                    self.poll_interval,
                )));
                self.shared.publish(&record);

                metrics::counter!("pipeline_jobs_submitted_total").increment(1);
                tracing::info!(
                    job_id = %job_id,
                    epoch,
                    status = %submitted.status,
                    file = %document.file_name(),
                    "Pipeline job submitted"
                );
                Ok(job_id)
            }
            Err(error) => {
                record.snapshot = JobSnapshot {
                    state: JobState::Idle,
                    job: None,
                    error: Some(format!("Failed to submit job: {}", error.user_message())),
                };
                self.shared.publish(&record);
                tracing::error!(error = %error, "Pipeline job submission failed");
                Err(TrackerError::Submit(error))
            }
        }
    }

    /// Abandon the current job, if any, and return to `idle`.
    pub fn reset(&self) {
        let mut record = self.shared.lock();
        record.epoch += 1;
        if let Some(poller) = record.poller.take() {
            poller.stop();
        }
        let abandoned = record.snapshot.job_id().map(str::to_owned);
        record.snapshot = JobSnapshot::default();
        self.shared.publish(&record);

        tracing::info!(job_id = ?abandoned, "Job tracker reset");
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.shared.lock().snapshot.clone()
    }

    /// Receive every snapshot the tracker publishes.
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Wait until no job is in flight. Polling has no timeout, so this only
    /// returns once the job settles or the tracker is reset.
    pub async fn wait_until_settled(&self) -> JobSnapshot {
        let mut updates = self.subscribe();
        let settled = match updates.wait_for(|s| !s.state.is_active()).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }

    pub fn is_polling(&self) -> bool {
        self.shared
            .lock()
            .poller
            .as_ref()
            .is_some_and(|p| !p.is_finished())
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        if let Some(poller) = self.shared.lock().poller.take() {
            poller.stop();
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("A job is already {state}; wait for it to finish or reset first")]
    JobInFlight { state: JobState },

    #[error("Job submission failed: {0}")]
    Submit(#[from] ApiError),

    #[error("Tracker was reset while the submission was in flight")]
    Abandoned,
}
