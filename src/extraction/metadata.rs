//! Book metadata extraction
//!
//! Reads title, author and canonical URL from an OPF package document.
//! When no package document is available the same fields are derived from
//! the Standard Ebooks repository naming scheme,
//! `author-slug_title-slug[_contributor-slug...]`.

use crate::error::{ExtractionError, Result};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Base URL for ebook pages derived from repository names
pub const EBOOKS_BASE_URL: &str = "https://standardebooks.org/ebooks";

/// Title, author and URL of one work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadata {
    /// Work title
    pub title: String,
    /// Primary author
    pub author: String,
    /// Canonical URL, if known
    pub url: Option<String>,
}

impl BookMetadata {
    /// Parse an OPF package document.
    ///
    /// Uses the first `dc:title`, `dc:creator` and `dc:identifier`. A `url:`
    /// scheme prefix on the identifier is removed; identifiers that are not
    /// URLs are ignored.
    #[instrument(skip_all)]
    pub fn from_opf(xml: &str) -> Result<Self> {
        let document = Html::parse_document(xml);
        let any = Selector::parse("*")
            .map_err(|e| ExtractionError::InvalidSelector(format!("{e:?}")))?;

        let first_text = |name: &str| -> Option<String> {
            document
                .select(&any)
                .find(|el| el.value().name() == name)
                .map(element_text)
                .filter(|t| !t.is_empty())
        };

        let title = first_text("dc:title")
            .ok_or_else(|| ExtractionError::ElementNotFound("dc:title".to_string()))?;
        let author = first_text("dc:creator")
            .ok_or_else(|| ExtractionError::ElementNotFound("dc:creator".to_string()))?;
        let url = first_text("dc:identifier").and_then(|id| {
            let id = id.strip_prefix("url:").unwrap_or(&id);
            (id.starts_with("http://") || id.starts_with("https://")).then(|| id.to_string())
        });

        debug!("OPF metadata: {} by {}", title, author);
        Ok(Self { title, author, url })
    }

    /// Derive metadata from a repository name such as
    /// `jane-austen_pride-and-prejudice`.
    pub fn from_repo_name(repo: &str) -> Self {
        let slugs: Vec<&str> = repo.split('_').filter(|s| !s.is_empty()).collect();
        match slugs.as_slice() {
            [author, title, ..] => Self {
                title: title_case_slug(title),
                author: title_case_slug(author),
                url: Some(format!("{}/{}", EBOOKS_BASE_URL, slugs.join("/"))),
            },
            _ => Self {
                title: title_case_slug(repo),
                author: "Unknown".to_string(),
                url: None,
            },
        }
    }

    /// Metadata from `opf` when present and parseable, otherwise from the
    /// repository name. A missing OPF URL is filled from the repository name.
    pub fn resolve(repo: &str, opf: Option<&str>) -> Self {
        let fallback = Self::from_repo_name(repo);
        let Some(xml) = opf else {
            debug!("No package document for {}, using repository name", repo);
            return fallback;
        };
        match Self::from_opf(xml) {
            Ok(mut meta) => {
                if meta.url.is_none() {
                    meta.url = fallback.url;
                }
                meta
            }
            Err(e) => {
                warn!("Unusable package document for {}: {}", repo, e);
                fallback
            }
        }
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// `pride-and-prejudice` becomes `Pride And Prejudice`
pub fn title_case_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
