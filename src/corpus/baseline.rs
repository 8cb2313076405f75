//! Character counting baseline
//!
//! Loads every merged work text and times a plain scan counting one
//! character. The number is the floor any text search over the corpus has
//! to beat.

use crate::corpus::scrape::MERGED_FILE;
use crate::error::Result;
use glob::Pattern;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// One loaded work text
#[derive(Debug, Clone)]
pub struct Page {
    /// Work directory name
    pub name: String,
    /// Path of the merged text file
    pub path: PathBuf,
    /// File contents
    pub text: String,
}

/// Result of one baseline run
#[derive(Debug, Clone, Serialize)]
pub struct BaselineReport {
    /// Number of matching characters
    pub result: usize,
    /// Wall time of the scan only (loading excluded)
    pub duration: Duration,
    /// Pages scanned
    pub pages: usize,
    /// Whether the scan ran on the rayon pool
    pub parallel: bool,
}

impl BaselineReport {
    /// Scan time in whole microseconds
    pub fn duration_us(&self) -> u128 {
        self.duration.as_micros()
    }
}

/// Load `<dir>/*/merged.txt` in path order. Unreadable files are skipped.
#[instrument(skip(dir), fields(dir = %dir.display()))]
pub fn load_pages(dir: &Path) -> Result<Vec<Page>> {
    let pattern = format!(
        "{}/*/{}",
        Pattern::escape(&dir.to_string_lossy()),
        MERGED_FILE
    );

    let mut paths: Vec<PathBuf> = glob::glob(&pattern)?.filter_map(|p| p.ok()).collect();
    paths.sort();

    let mut pages = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match std::fs::read_to_string(&path) {
            Ok(text) => pages.push(Page { name, path, text }),
            Err(e) => warn!("Failed to load {}: {}", path.display(), e),
        }
    }

    info!("Loaded {} pages", pages.len());
    Ok(pages)
}

/// Occurrences of `needle` in `text`
pub fn count_char(text: &str, needle: char) -> usize {
    text.chars().filter(|&c| c == needle).count()
}

/// Count `needle` across all pages and time the scan
pub fn run_baseline(pages: &[Page], needle: char, parallel: bool) -> BaselineReport {
    let start = Instant::now();
    let result: usize = if parallel {
        pages.par_iter().map(|p| count_char(&p.text, needle)).sum()
    } else {
        pages.iter().map(|p| count_char(&p.text, needle)).sum()
    };
    let duration = start.elapsed();

    BaselineReport {
        result,
        duration,
        pages: pages.len(),
        parallel,
    }
}
