use garde::Validate;
use serde::{Deserialize, Serialize};

/// An extraction model known to the OCR service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub provider: String,
    pub active: bool,
}

/// Body of `POST /models/active`.
#[derive(Debug, Serialize, Validate)]
pub struct SetActiveModelRequest {
    #[garde(length(min = 1, max = 200))]
    pub name: String,
}

/// One row of the service's benchmark table. Values are display strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BenchmarkRow {
    pub model: String,
    pub accuracy: String,
    pub avg_latency: String,
    pub throughput: String,
    pub memory_usage: String,
}
