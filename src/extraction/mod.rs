//! Content extraction module
//!
//! This module turns ebook markup into plain text and reads book metadata
//! from package documents.

pub mod content;
pub mod events;
pub mod metadata;

pub use content::{
    collapse_whitespace, extract, ExtractConfig, ExtractConfigBuilder, ExtractedText, IgnoreSet,
    TextExtractor, HEADING_TAGS,
};
pub use events::{tokenize, tokenize_bytes, MarkupEvent};
pub use metadata::{title_case_slug, BookMetadata};
