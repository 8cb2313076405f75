//! Ebook Corpus - plain-text corpora from public-domain ebook sources
//!
//! This crate lists the ebook repositories of a GitHub organization, clones
//! them, flattens their XHTML chapters to plain text and records a
//! title/author manifest. The finished corpus can be searched for a keyword
//! in context, and a character counting baseline measures raw scan speed
//! over it.
//!
//! # Architecture
//!
//! ```text
//! GitHub API ──▶ RepoLister ──▶ repos.txt
//!                                   │
//!                                   ▼
//!                 git clone ──▶ Scraper ──▶ <output>/<work>/merged.txt
//!                                   │              │
//!                        ┌──────────┴───┐          ▼
//!                        │ TextExtractor│   Concordance / baseline
//!                        │ BookMetadata │
//!                        └──────────────┘
//!                                   │
//!                                   ▼
//!                            manifest.json
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use ebook_corpus::extraction::{ExtractConfig, TextExtractor};
//!
//! let extractor = TextExtractor::new(ExtractConfig::default());
//! let text = extractor
//!     .extract("<head><title>X</title></head><body><p>Call me   Ishmael.</p></body>")
//!     .unwrap();
//! assert_eq!(text, "Call me Ishmael.");
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod corpus;
pub mod error;
pub mod extraction;
pub mod sources;

// Re-exports for convenience
pub use corpus::{Concordance, Manifest, Scraper};
pub use error::{Error, Result};
pub use extraction::{extract, BookMetadata, ExtractConfig, IgnoreSet, TextExtractor};
pub use sources::RepoLister;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
