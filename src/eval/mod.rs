//! Evaluation
//!
//! `batch` writes one `LogRecord` per routed query to a JSON log;
//! `analyze` reads it back and aggregates an `EvaluationReport`.

mod log;
mod report;

pub use log::{EvaluationLog, LogRecord};
pub use report::EvaluationReport;
