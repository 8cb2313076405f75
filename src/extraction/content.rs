//! Plain-text extraction from ebook markup
//!
//! Flattens an XHTML document into its visible text. Text nested under
//! any tag in the configured [`IgnoreSet`] is dropped, surviving text runs
//! are joined with single spaces, and whitespace runs are optionally
//! collapsed.
//!
//! ```rust
//! use ebook_corpus::extraction::extract;
//!
//! let text = extract("<h1>Chapter One</h1><p>It was a dark night.</p>", ["h1"]).unwrap();
//! assert_eq!(text, "It was a dark night.");
//! ```

use super::events::{tokenize, tokenize_bytes, MarkupEvent};
use crate::error::Result;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::{debug, instrument};

/// Tags whose subtrees hold headings and document metadata
pub const HEADING_TAGS: [&str; 8] = ["head", "h1", "h2", "h3", "h4", "h5", "h6", "hgroup"];

/// Set of tag names whose entire subtree is excluded from output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreSet {
    #[serde(deserialize_with = "normalized_tags")]
    tags: BTreeSet<String>,
}

fn normalized_tags<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(IgnoreSet::from_tags(raw).tags)
}

impl IgnoreSet {
    /// An ignore set that suppresses nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// `head`, `h1`..`h6` and `hgroup`
    pub fn headings() -> Self {
        Self::from_tags(HEADING_TAGS)
    }

    /// Build from tag names. Names are trimmed and lowercased, blanks dropped.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { tags }
    }

    /// Whether `name` (already lowercase) is ignored
    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains(name)
    }

    /// True if nothing is suppressed
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Number of ignored tag names
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Ignored tag names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_tags(iter)
    }
}

/// Configuration for text extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Tags whose subtree text is dropped (default: headings)
    pub ignore: IgnoreSet,
    /// Collapse whitespace runs to a single space (default: true)
    pub collapse_whitespace: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            ignore: IgnoreSet::headings(),
            collapse_whitespace: true,
        }
    }
}

impl ExtractConfig {
    /// Create a new config builder
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder::default()
    }
}

/// Builder for ExtractConfig
#[derive(Default)]
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    /// Replace the ignore set
    pub fn ignore(mut self, ignore: IgnoreSet) -> Self {
        self.config.ignore = ignore;
        self
    }

    /// Replace the ignore set from tag names
    pub fn ignore_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.ignore = IgnoreSet::from_tags(tags);
        self
    }

    /// Enable/disable whitespace collapsing
    pub fn collapse_whitespace(mut self, collapse: bool) -> Self {
        self.config.collapse_whitespace = collapse;
        self
    }

    /// Build the config
    pub fn build(self) -> ExtractConfig {
        self.config
    }
}

/// Extracted text with simple counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Flattened text
    pub text: String,
    /// Whitespace-separated word count
    pub word_count: usize,
    /// Character count
    pub char_count: usize,
}

impl ExtractedText {
    fn new(text: String) -> Self {
        let word_count = text.split_whitespace().count();
        let char_count = text.chars().count();
        Self {
            text,
            word_count,
            char_count,
        }
    }
}

/// Per-document state: the ignore stack and the text buffer.
struct TextReducer<'a> {
    ignore: &'a IgnoreSet,
    stack: Vec<String>,
    buffer: Vec<String>,
}

impl<'a> TextReducer<'a> {
    fn new(ignore: &'a IgnoreSet) -> Self {
        Self {
            ignore,
            stack: Vec::new(),
            buffer: Vec::new(),
        }
    }

    fn handle(&mut self, event: MarkupEvent) {
        match event {
            // Void and self-closing tags push like any other start tag.
            MarkupEvent::StartTag { name, .. } => {
                if self.ignore.contains(&name) {
                    self.stack.push(name);
                }
            }
            // Only the top entry may be popped; anything else is a no-op.
            MarkupEvent::EndTag { name } => {
                if self.stack.last() == Some(&name) {
                    self.stack.pop();
                }
            }
            MarkupEvent::Text(chunk) => {
                if self.stack.is_empty() {
                    self.buffer.push(chunk);
                }
            }
        }
    }

    fn finish(self, collapse: bool) -> String {
        let joined = self.buffer.join(" ");
        if collapse {
            collapse_whitespace(&joined)
        } else {
            joined
        }
    }
}

/// Markup-to-text extractor
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    config: ExtractConfig,
}

impl TextExtractor {
    /// Create an extractor with the given configuration
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Extract the visible text of one document.
    ///
    /// Malformed markup is recovered, so a `&str` document does not fail;
    /// only [`extract_bytes`](Self::extract_bytes) can reject its input.
    #[instrument(skip_all, fields(len = document.len()))]
    pub fn extract(&self, document: &str) -> Result<String> {
        let events = tokenize(document);
        debug!("Tokenized {} events", events.len());
        Ok(self.extract_events(events))
    }

    /// Extract from raw file bytes, which must be UTF-8
    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<String> {
        Ok(self.extract_events(tokenize_bytes(bytes)?))
    }

    /// Reduce an already tokenized event sequence to text
    pub fn extract_events<I>(&self, events: I) -> String
    where
        I: IntoIterator<Item = MarkupEvent>,
    {
        let mut reducer = TextReducer::new(&self.config.ignore);
        for event in events {
            reducer.handle(event);
        }
        reducer.finish(self.config.collapse_whitespace)
    }

    /// Extract text plus word and character counts
    pub fn extract_document(&self, document: &str) -> Result<ExtractedText> {
        let text = self.extract(document)?;
        let extracted = ExtractedText::new(text);
        debug!(
            "Extracted {} words, {} chars",
            extracted.word_count, extracted.char_count
        );
        Ok(extracted)
    }

    /// Extract many independent documents in parallel, preserving order
    pub fn extract_many<S>(&self, documents: &[S]) -> Vec<Result<String>>
    where
        S: AsRef<str> + Sync,
    {
        documents
            .par_iter()
            .map(|doc| self.extract(doc.as_ref()))
            .collect()
    }
}

/// Extract text from `document`, dropping text under any of `ignore_tags`.
///
/// Whitespace collapsing is enabled. An empty tag list suppresses nothing.
pub fn extract<I, S>(document: &str, ignore_tags: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let config = ExtractConfig::builder().ignore_tags(ignore_tags).build();
    TextExtractor::new(config).extract(document)
}

fn whitespace_run() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"[\t\n\x0B\x0C\r ]+").unwrap())
}

/// Replace each run of ASCII whitespace with one space
pub fn collapse_whitespace(text: &str) -> String {
    whitespace_run().replace_all(text, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn no_collapse(ignore: &[&str]) -> TextExtractor {
        TextExtractor::new(
            ExtractConfig::builder()
                .ignore_tags(ignore)
                .collapse_whitespace(false)
                .build(),
        )
    }

    #[test]
    fn test_heading_suppressed() {
        let text = extract("<h1>Chapter One</h1><p>It was a dark night.</p>", ["h1"]).unwrap();
        assert_eq!(text, "It was a dark night.");
    }

    #[test]
    fn test_internal_spaces_collapsed() {
        let text = extract("<p>Hello   world</p>", Vec::<String>::new()).unwrap();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn test_nested_head_suppressed_without_leading_space() {
        let text = extract("<head><title>X</title></head><body>Y</body>", ["head"]).unwrap();
        assert_eq!(text, "Y");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(extract("", HEADING_TAGS).unwrap(), "");
    }

    #[test]
    fn test_chunks_joined_with_single_space() {
        let text = no_collapse(&[]).extract("<p>a</p><p>b</p>").unwrap();
        assert_eq!(text, "a b");
    }

    #[test]
    fn test_without_collapse_keeps_raw_whitespace() {
        let text = no_collapse(&[]).extract("<p>a</p>\n<p>b  c</p>").unwrap();
        assert_eq!(text, "a \n b  c");
    }

    #[test]
    fn test_with_collapse() {
        let text = extract("<p>a</p>\n<p>b\t\tc</p>", HEADING_TAGS).unwrap();
        assert_eq!(text, "a b c");
    }

    #[test]
    fn test_mismatched_end_tag_keeps_suppression() {
        // </p> does not pop h2 from the stack
        let text = extract("<h2>Title</p> still hidden</h2><p>shown</p>", ["h2"]).unwrap();
        assert_eq!(text, "shown");
    }

    #[test]
    fn test_out_of_order_close_sticks() {
        // h1 closes while h2 is on top, so h1 is never popped
        let text = extract("<h1><h2>x</h1>y</h2>z", ["h1", "h2"]).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_stray_end_tag_is_noop() {
        let text = extract("<p>a</h1>b</p>", ["h1"]).unwrap();
        assert_eq!(text, "a b");
    }

    #[test]
    fn test_self_closing_ignored_tag_pushes() {
        let text = extract("a<hgroup/>b", ["hgroup"]).unwrap();
        assert_eq!(text, "a");
    }

    #[test]
    fn test_ignore_set_normalization() {
        let set = IgnoreSet::from_tags([" H1 ", "", "  ", "HEAD"]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["h1", "head"]);
        assert_eq!(set.len(), 2);
        assert!(IgnoreSet::from_tags(["", " "]).is_empty());
    }

    #[test]
    fn test_deserialized_ignore_set_is_normalized() {
        let set: IgnoreSet = serde_json::from_str(r#"{"tags":[" H1 ","","Head"]}"#).unwrap();
        assert_eq!(set, IgnoreSet::from_tags(["h1", "head"]));

        let config: ExtractConfig = serde_json::from_str(
            r#"{"ignore":{"tags":["H1"]},"collapse_whitespace":true}"#,
        )
        .unwrap();
        let text = TextExtractor::new(config).extract("<h1>T</h1>b").unwrap();
        assert_eq!(text, "b");
    }

    #[test]
    fn test_blank_configuration_suppresses_nothing() {
        let text = extract("<h1>Title</h1><p>Body</p>", ["", "  "]).unwrap();
        assert_eq!(text, "Title Body");
    }

    #[test]
    fn test_default_config_ignores_headings() {
        let doc = "<html><head><title>T</title></head><body><hgroup><h2>Part</h2></hgroup><p>Text</p></body></html>";
        let text = TextExtractor::default().extract(doc).unwrap();
        assert_eq!(text, "Text");
    }

    #[test]
    fn test_extract_document_counts() {
        let extracted = TextExtractor::default()
            .extract_document("<p>one two  three</p>")
            .unwrap();
        assert_eq!(extracted.text, "one two three");
        assert_eq!(extracted.word_count, 3);
        assert_eq!(extracted.char_count, 13);
    }

    #[test]
    fn test_extract_bytes() {
        let extractor = TextExtractor::default();
        assert_eq!(extractor.extract_bytes(b"<p>caf\xc3\xa9</p>").unwrap(), "caf\u{e9}");
        assert!(extractor.extract_bytes(b"<p>\xff</p>").is_err());
    }

    #[test]
    fn test_extract_many_preserves_order() {
        let docs = ["<p>first</p>", "<h1>x</h1><p>second</p>", ""];
        let results: Vec<String> = TextExtractor::default()
            .extract_many(&docs)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(results, vec!["first", "second", ""]);
    }

    #[test]
    fn test_collapse_whitespace_idempotent() {
        let once = collapse_whitespace(" a \t\r\n b\x0C ");
        assert_eq!(once, " a b ");
        assert_eq!(collapse_whitespace(&once), once);
    }

    #[test]
    fn test_collapse_leaves_non_ascii_space() {
        assert_eq!(collapse_whitespace("Mr.\u{a0}Darcy"), "Mr.\u{a0}Darcy");
    }

    #[test]
    fn test_extract_events_directly() {
        let events = vec![
            MarkupEvent::StartTag {
                name: "head".to_string(),
                self_closing: false,
            },
            MarkupEvent::Text("meta".to_string()),
            MarkupEvent::EndTag {
                name: "head".to_string(),
            },
            MarkupEvent::Text("body".to_string()),
        ];
        assert_eq!(TextExtractor::default().extract_events(events), "body");
    }
}
