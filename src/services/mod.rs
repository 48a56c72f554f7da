pub mod http;
pub mod ocr;
pub mod pipeline;
pub mod registry;
pub mod tracker;
