pub mod document;
pub mod job;
pub mod model;
pub mod ocr;
pub mod schema;
