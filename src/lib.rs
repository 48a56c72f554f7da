//! VLLM-OCR client
//!
//! Typed clients for the OCR extraction service and its asynchronous job
//! pipeline: synchronous extraction, model registry, benchmarks, and a job
//! tracker that submits documents and polls them to a terminal status.

pub mod app_state;
pub mod config;
pub mod models;
pub mod services;
