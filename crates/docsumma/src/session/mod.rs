//! Per-document QA sessions: index building and conversational answering

mod builder;
mod memory;
mod qa;

pub use builder::IndexBuilder;
pub use memory::{ConversationMemory, Turn};
pub use qa::QaSession;
