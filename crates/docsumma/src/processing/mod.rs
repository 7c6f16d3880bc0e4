//! Batch processing: directory pass, OCR retry policy, answer persistence

mod answers;
mod batch;
mod report;
mod retry;

pub use answers::AnswerWriter;
pub use batch::BatchOrchestrator;
pub use report::{BatchReport, FileOutcome, FileReport};
pub use retry::ConversionAttempt;
