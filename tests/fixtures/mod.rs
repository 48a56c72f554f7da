//! Canned documents and service payloads shared by the integration suites.

#![allow(dead_code)]

use serde_json::{json, Value};

/// Smallest byte prefix `image::guess_format` recognises as PNG.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x02\0\0\0";

/// JFIF header.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

pub fn models_payload() -> Value {
    json!([
        {"name": "deepseek-ocr:latest", "provider": "ollama", "active": false},
        {"name": "qwen3-vl:8b", "provider": "ollama", "active": true}
    ])
}

pub fn benchmark_payload() -> Value {
    json!([
        {
            "model": "deepseek-ocr:latest",
            "accuracy": "98.5%",
            "avg_latency": "1.2s",
            "throughput": "50 img/min",
            "memory_usage": "4GB"
        },
        {
            "model": "qwen3-vl:8b",
            "accuracy": "97.8%",
            "avg_latency": "0.8s",
            "throughput": "70 img/min",
            "memory_usage": "3.5GB"
        }
    ])
}

pub fn ocr_payload() -> Value {
    json!({
        "text": "GOVERNMENT OF THE PEOPLE'S REPUBLIC OF BANGLADESH\nName: JOHN DOE",
        "format": "plain",
        "metadata": {"model": "qwen3-vl:8b", "api_process_time": 1.42},
        "bounding_boxes": [{"label": "name", "points": [[10, 10], [120, 10], [120, 30], [10, 30]]}]
    })
}

pub fn nid_front_result() -> Value {
    json!({
        "name": "JOHN DOE",
        "name_bn": "জন ডো",
        "father_name": "RICHARD DOE",
        "mother_name": "JANE DOE",
        "dob": "1990-01-01",
        "nid_no": "1234567890"
    })
}
