//! Keyword-in-context search
//!
//! Finds every whole-word occurrence of a literal keyword across the
//! loaded work texts and returns it with up to [`CONTEXT_LENGTH`] bytes of
//! text on either side. Pages are searched in parallel on a rayon pool.
//!
//! ```rust
//! use ebook_corpus::corpus::{Concordance, Page, SearchConfig};
//! use std::path::PathBuf;
//!
//! let page = Page {
//!     name: "herman-melville_moby-dick".to_string(),
//!     path: PathBuf::from("corpus/herman-melville_moby-dick/merged.txt"),
//!     text: "Call me Ishmael. Some years ago".to_string(),
//! };
//! let concordance = Concordance::new("Ishmael", SearchConfig::default()).unwrap();
//! let hits = concordance.find(&page);
//! assert_eq!(hits[0].left, "Call me ");
//! assert_eq!(hits[0].right, ". Some years ago");
//! ```

use crate::corpus::baseline::Page;
use crate::error::{Error, Result};
use rayon::prelude::*;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Default bytes of context kept on each side of a hit
pub const CONTEXT_LENGTH: usize = 40;

/// One keyword hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Work directory name of the page
    pub filename: String,
    /// Text before the keyword
    pub left: String,
    /// Text after the keyword
    pub right: String,
}

/// Search settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Bytes of context on each side, widened to character boundaries
    /// (default: 40)
    pub context: usize,
    /// Match regardless of case (default: false)
    pub case_insensitive: bool,
    /// Worker threads (None = rayon's global pool)
    pub jobs: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            context: CONTEXT_LENGTH,
            case_insensitive: false,
            jobs: None,
        }
    }
}

impl SearchConfig {
    /// Create a new config builder
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }
}

/// Builder for SearchConfig
#[derive(Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Set the context width in bytes
    pub fn context(mut self, bytes: usize) -> Self {
        self.config.context = bytes;
        self
    }

    /// Enable or disable case-insensitive matching
    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.config.case_insensitive = enabled;
        self
    }

    /// Limit the worker threads (0 is treated as 1)
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.jobs = Some(jobs.max(1));
        self
    }

    /// Build the config
    pub fn build(self) -> SearchConfig {
        self.config
    }
}

/// Outcome of a search over many pages
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    /// Hits in page order, then text order
    pub matches: Vec<Match>,
    /// Pages searched
    pub pages: usize,
    /// Wall time of the search
    pub duration: Duration,
}

impl SearchReport {
    /// Duration in milliseconds
    pub fn duration_ms(&self) -> u128 {
        self.duration.as_millis()
    }
}

/// A compiled keyword search
#[derive(Debug, Clone)]
pub struct Concordance {
    keyword: String,
    pattern: Regex,
    config: SearchConfig,
}

impl Concordance {
    /// Compile a search for the literal `keyword`
    pub fn new<S: Into<String>>(keyword: S, config: SearchConfig) -> Result<Self> {
        let keyword = keyword.into();
        if keyword.is_empty() {
            return Err(Error::Query("keyword is empty".to_string()));
        }
        let pattern = RegexBuilder::new(&regex::escape(&keyword))
            .case_insensitive(config.case_insensitive)
            .build()
            .map_err(|e| Error::Query(e.to_string()))?;
        Ok(Self {
            keyword,
            pattern,
            config,
        })
    }

    /// The keyword being searched for
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// The active configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Whole-word hits in one page.
    ///
    /// A hit directly preceded or followed by an alphabetic character is part
    /// of a longer word and is skipped.
    pub fn find(&self, page: &Page) -> Vec<Match> {
        let text = page.text.as_str();
        self.pattern
            .find_iter(text)
            .filter(|m| is_word_boundary(text, m.start(), m.end()))
            .map(|m| Match {
                filename: page.name.clone(),
                left: context_left(text, m.start(), self.config.context).to_string(),
                right: context_right(text, m.end(), self.config.context).to_string(),
            })
            .collect()
    }

    /// Search every page in parallel
    #[instrument(skip(self, pages), fields(keyword = %self.keyword, pages = pages.len()))]
    pub fn search(&self, pages: &[Page]) -> Result<SearchReport> {
        let start = Instant::now();
        let matches = match self.config.jobs {
            Some(jobs) => {
                debug!("Searching on {} threads", jobs);
                rayon::ThreadPoolBuilder::new()
                    .num_threads(jobs)
                    .build()
                    .map_err(|e| Error::generic(format!("search pool: {e}")))?
                    .install(|| self.find_all(pages))
            }
            None => self.find_all(pages),
        };
        let duration = start.elapsed();

        info!("{} matches in {:?}", matches.len(), duration);
        Ok(SearchReport {
            matches,
            pages: pages.len(),
            duration,
        })
    }

    fn find_all(&self, pages: &[Page]) -> Vec<Match> {
        pages.par_iter().flat_map_iter(|page| self.find(page)).collect()
    }
}

fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphabetic) && !after.is_some_and(char::is_alphabetic)
}

/// Up to `width` bytes ending at `index`, widened left to a char boundary
pub fn context_left(text: &str, index: usize, width: usize) -> &str {
    let mut from = index.saturating_sub(width);
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    &text[from..index]
}

/// Up to `width` bytes starting at `index`, widened right to a char boundary
pub fn context_right(text: &str, index: usize, width: usize) -> &str {
    let mut to = index.saturating_add(width).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }
    &text[index..to]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn page(name: &str, text: &str) -> Page {
        Page {
            name: name.to_string(),
            path: PathBuf::from(format!("{name}/merged.txt")),
            text: text.to_string(),
        }
    }

    fn find(keyword: &str, text: &str) -> Vec<Match> {
        Concordance::new(keyword, SearchConfig::default())
            .unwrap()
            .find(&page("w", text))
    }

    #[test]
    fn test_whole_words_only() {
        let hits = find("cat", "cat concatenate cats bobcat (cat) Cat");
        let lefts: Vec<&str> = hits.iter().map(|m| m.left.as_str()).collect();
        assert_eq!(lefts, vec!["", "cat concatenate cats bobcat ("]);
    }

    #[test]
    fn test_non_ascii_letter_is_part_of_word() {
        assert!(find("cat", "écat catñ").is_empty());
        assert_eq!(find("cat", "–cat–").len(), 1);
    }

    #[test]
    fn test_context_clamped_at_text_edges() {
        let hits = find("cat", "cat and dog");
        assert_eq!(hits[0].left, "");
        assert_eq!(hits[0].right, " and dog");

        let hits = find("dog", "cat and dog");
        assert_eq!(hits[0].left, "cat and ");
        assert_eq!(hits[0].right, "");
    }

    #[test]
    fn test_context_width() {
        let text = format!("{}cat{}", "x ".repeat(30), " y".repeat(30));
        let hits = find("cat", &text);
        assert_eq!(hits[0].left.len(), CONTEXT_LENGTH);
        assert_eq!(hits[0].right.len(), CONTEXT_LENGTH);
    }

    #[test]
    fn test_context_widens_to_char_boundaries() {
        // '–' is three bytes; a 2-byte window lands inside it on both sides
        let text = "a–cat–b";
        assert_eq!(context_left(text, 4, 2), "–");
        assert_eq!(context_right(text, 7, 2), "–");

        let concordance =
            Concordance::new("cat", SearchConfig::builder().context(2).build()).unwrap();
        let hits = concordance.find(&page("w", text));
        assert_eq!(hits[0].left, "–");
        assert_eq!(hits[0].right, "–");
    }

    #[test]
    fn test_context_inside_multibyte_run() {
        let text = "a–b–c";
        assert_eq!(context_left(text, 4, 1), "–");
        assert_eq!(context_left(text, 4, 3), "–");
        assert_eq!(context_right(text, 5, 1), "–");
        assert_eq!(context_right(text, 5, 3), "–");
    }

    #[test]
    fn test_keyword_is_literal() {
        assert_eq!(find("a.b", "a.b axb").len(), 1);
        assert_eq!(find("(c)", "x (c) y").len(), 1);
    }

    #[test]
    fn test_case_insensitive() {
        let concordance = Concordance::new(
            "whale",
            SearchConfig::builder().case_insensitive(true).build(),
        )
        .unwrap();
        assert_eq!(concordance.find(&page("w", "Whale, WHALE and whale.")).len(), 3);
        assert_eq!(find("whale", "Whale, WHALE and whale.").len(), 1);
    }

    #[test]
    fn test_empty_keyword_rejected() {
        let err = Concordance::new("", SearchConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Query(_)));
    }

    #[test]
    fn test_search_keeps_page_order() {
        let pages: Vec<Page> = (0..20)
            .map(|i| page(&format!("work-{i:02}"), "the whale, the whale"))
            .collect();
        let concordance =
            Concordance::new("whale", SearchConfig::builder().jobs(3).build()).unwrap();
        let report = concordance.search(&pages).unwrap();

        assert_eq!(report.pages, 20);
        assert_eq!(report.matches.len(), 40);
        assert_eq!(report.matches[0].filename, "work-00");
        assert_eq!(report.matches[0].right, ", the whale");
        assert_eq!(report.matches[39].filename, "work-19");
        assert_eq!(report.matches[39].left, "the whale, the ");
    }

    #[test]
    fn test_match_json_shape() {
        let json = serde_json::to_value(find("me", "Call me Ishmael.").remove(0)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"filename": "w", "left": "Call ", "right": " Ishmael."})
        );
    }
}
