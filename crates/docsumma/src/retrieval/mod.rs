//! Retrieval over embedded chunks

mod index;

pub use index::VectorIndex;
