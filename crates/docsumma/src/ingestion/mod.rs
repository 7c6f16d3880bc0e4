//! Document ingestion: conversion to markdown, loading and chunking

pub mod converter;
pub mod engine;
mod loader;
pub mod native;
mod ocr;
mod splitter;

pub use converter::DocumentConverter;
pub use engine::{ConversionEngine, ConversionOptions, ConvertedDocument, ConvertedPage};
pub use loader::{LoadedDocument, MarkdownLoader};
pub use native::NativeEngine;
pub use ocr::PdfOcr;
pub use splitter::RecursiveCharacterSplitter;
