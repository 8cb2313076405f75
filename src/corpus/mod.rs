//! Corpus assembly
//!
//! Scraping works into plain text, the title/author manifest, keyword in
//! context search over the finished corpus and the character counting
//! baseline that search is measured against.

pub mod baseline;
pub mod concordance;
pub mod manifest;
pub mod scrape;

pub use baseline::{count_char, load_pages, run_baseline, BaselineReport, Page};
pub use concordance::{
    context_left, context_right, Concordance, Match, SearchConfig, SearchConfigBuilder,
    SearchReport, CONTEXT_LENGTH,
};
pub use manifest::{Manifest, MANIFEST_FILE};
pub use scrape::{
    text_files, OutputMode, RepoSource, ScrapeConfig, ScrapeConfigBuilder, ScrapedWork, Scraper,
    MERGED_FILE,
};
