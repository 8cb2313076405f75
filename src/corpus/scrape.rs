//! Per-work scraping
//!
//! A work is one ebook repository. Scraping a work reads its XHTML chapter
//! files in name order, extracts their text, writes the text under
//! `<output>/<repo>/` and resolves the work's metadata.
//!
//! ```text
//! repo ──▶ checkout (git clone | local mirror)
//!              │
//!              ▼
//!   src/epub/text/*.xhtml ──▶ TextExtractor ──▶ <output>/<repo>/*.txt
//!   src/epub/content.opf  ──▶ BookMetadata  ──▶ manifest.json
//! ```

use crate::corpus::manifest::{Manifest, MANIFEST_FILE};
use crate::error::{Error, ExtractionError, Result};
use crate::extraction::{BookMetadata, ExtractConfig, TextExtractor};
use crate::sources::{clone_shallow, clone_url, DEFAULT_ORG};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Chapter files inside a checkout
pub const TEXT_DIR: &str = "src/epub/text";

/// Package document inside a checkout
pub const OPF_PATH: &str = "src/epub/content.opf";

/// Name of the single-file output of a work
pub const MERGED_FILE: &str = "merged.txt";

/// Repositories of the organization that are not books
pub const NON_BOOK_REPOS: [&str; 4] = ["tools", "web", "manual", "sublime-text-se-plugin"];

/// How extracted text is written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// One `<stem>.txt` per chapter file
    PerDocument,
    /// All chapters joined into `merged.txt`
    #[default]
    Merged,
}

/// Where work checkouts come from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RepoSource {
    /// Shallow-clone each repository into a temporary directory
    #[default]
    Clone,
    /// Use existing checkouts at `<root>/<repo>`
    Local(PathBuf),
}

/// Configuration for scraping
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Root directory for work output and the manifest (default: `corpus`)
    pub output_dir: PathBuf,
    /// GitHub organization to clone from
    pub org: String,
    /// Output layout (default: merged)
    pub mode: OutputMode,
    /// Text extraction settings
    pub extract: ExtractConfig,
    /// Maximum works in flight (default: 4)
    pub jobs: usize,
    /// Checkout source
    pub source: RepoSource,
    /// Repository names to skip
    pub skip: Vec<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("corpus"),
            org: DEFAULT_ORG.to_string(),
            mode: OutputMode::default(),
            extract: ExtractConfig::default(),
            jobs: 4,
            source: RepoSource::default(),
            skip: NON_BOOK_REPOS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScrapeConfig {
    /// Create a new config builder
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder::default()
    }

    /// Path of the manifest file
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(MANIFEST_FILE)
    }
}

/// Builder for ScrapeConfig
#[derive(Default)]
pub struct ScrapeConfigBuilder {
    config: ScrapeConfig,
}

impl ScrapeConfigBuilder {
    /// Set the output directory
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Set the organization
    pub fn org<S: Into<String>>(mut self, org: S) -> Self {
        self.config.org = org.into();
        self
    }

    /// Set the output layout
    pub fn mode(mut self, mode: OutputMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the extraction settings
    pub fn extract(mut self, extract: ExtractConfig) -> Self {
        self.config.extract = extract;
        self
    }

    /// Set the concurrency limit (0 is treated as 1)
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.jobs = jobs.max(1);
        self
    }

    /// Set the checkout source
    pub fn source(mut self, source: RepoSource) -> Self {
        self.config.source = source;
        self
    }

    /// Replace the skip list
    pub fn skip<I, S>(mut self, repos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.skip = repos.into_iter().map(Into::into).collect();
        self
    }

    /// Build the config
    pub fn build(self) -> ScrapeConfig {
        self.config
    }
}

/// Summary of one scraped work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedWork {
    /// Repository name
    pub repo: String,
    /// Resolved metadata
    pub metadata: BookMetadata,
    /// Chapter files processed
    pub documents: usize,
    /// Total extracted words
    pub word_count: usize,
    /// Files written
    pub outputs: Vec<PathBuf>,
    /// Completion time
    pub scraped_at: DateTime<Utc>,
}

/// Work scraper
pub struct Scraper {
    config: ScrapeConfig,
    extractor: TextExtractor,
}

impl Scraper {
    /// Create a scraper
    pub fn new(config: ScrapeConfig) -> Self {
        let extractor = TextExtractor::new(config.extract.clone());
        Self { config, extractor }
    }

    /// The active configuration
    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Whether `repo` is on the skip list
    pub fn should_skip(&self, repo: &str) -> bool {
        self.config.skip.iter().any(|s| s == repo)
    }

    /// Scrape a work from an existing checkout directory
    #[instrument(skip(self, checkout), fields(checkout = %checkout.display()))]
    pub async fn scrape_checkout(&self, repo: &str, checkout: &Path) -> Result<ScrapedWork> {
        if !tokio::fs::try_exists(checkout).await? {
            return Err(Error::generic(format!(
                "checkout {} does not exist",
                checkout.display()
            )));
        }
        let files = text_files(checkout)?;
        info!("Found {} chapter files", files.len());
        let output_names = match self.config.mode {
            OutputMode::PerDocument => output_names(&files)?,
            OutputMode::Merged => Vec::new(),
        };

        let mut documents = Vec::with_capacity(files.len());
        for path in &files {
            let bytes = tokio::fs::read(path).await?;
            let text = String::from_utf8(bytes)
                .map_err(|e| ExtractionError::Encoding(e.utf8_error()))?;
            documents.push(text);
        }

        let extractor = self.extractor.clone();
        let texts =
            tokio::task::spawn_blocking(move || extractor.extract_many(documents.as_slice()))
                .await
                .map_err(|e| Error::generic(format!("extraction task failed: {e}")))?
                .into_iter()
                .collect::<Result<Vec<String>>>()?;

        let dest = self.config.output_dir.join(repo);
        match tokio::fs::remove_dir_all(&dest).await {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
        tokio::fs::create_dir_all(&dest).await?;

        let outputs = match self.config.mode {
            OutputMode::PerDocument => {
                let mut outputs = Vec::with_capacity(files.len());
                for (name, text) in output_names.iter().zip(&texts) {
                    let out = dest.join(name);
                    tokio::fs::write(&out, text).await?;
                    debug!("Wrote {}", out.display());
                    outputs.push(out);
                }
                outputs
            }
            OutputMode::Merged => {
                let out = dest.join(MERGED_FILE);
                tokio::fs::write(&out, texts.join("\n")).await?;
                debug!("Wrote {}", out.display());
                vec![out]
            }
        };

        let opf = match tokio::fs::read_to_string(checkout.join(OPF_PATH)).await {
            Ok(xml) => Some(xml),
            Err(e) => {
                debug!("No package document: {}", e);
                None
            }
        };
        let metadata = BookMetadata::resolve(repo, opf.as_deref());

        Ok(ScrapedWork {
            repo: repo.to_string(),
            metadata,
            documents: files.len(),
            word_count: texts.iter().map(|t| t.split_whitespace().count()).sum(),
            outputs,
            scraped_at: Utc::now(),
        })
    }

    /// Scrape a work from the configured source
    #[instrument(skip(self))]
    pub async fn scrape_repo(&self, repo: &str) -> Result<ScrapedWork> {
        match &self.config.source {
            RepoSource::Local(root) => self.scrape_checkout(repo, &root.join(repo)).await,
            RepoSource::Clone => {
                let tmp = tempfile::tempdir()?;
                let checkout = tmp.path().join(repo);
                clone_shallow(&clone_url(&self.config.org, repo), &checkout).await?;
                self.scrape_checkout(repo, &checkout).await
            }
        }
    }

    /// Scrape many works with bounded concurrency.
    ///
    /// Failed works are logged and left out of the returned manifest.
    pub async fn scrape_all<I, S>(&self, repos: I) -> Manifest
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let repos: Vec<String> = repos
            .into_iter()
            .map(Into::into)
            .filter(|r| {
                let skip = self.should_skip(r);
                if skip {
                    debug!("Skipping non-book repository {}", r);
                }
                !skip
            })
            .collect();
        info!("Scraping {} works, {} at a time", repos.len(), self.config.jobs);

        let results: Vec<(String, Result<ScrapedWork>)> = stream::iter(repos)
            .map(|repo| async move {
                let result = self.scrape_repo(&repo).await;
                (repo, result)
            })
            .buffer_unordered(self.config.jobs.max(1))
            .collect()
            .await;

        let mut manifest = Manifest::new();
        for (repo, result) in results {
            match result {
                Ok(work) => {
                    info!(
                        "Scraped {} ({} documents, {} words)",
                        repo, work.documents, work.word_count
                    );
                    manifest.insert(repo, work.metadata);
                }
                Err(e) => warn!("Failed to scrape {}: {}", repo, e),
            }
        }
        manifest
    }

    /// Merge `manifest` into the manifest on disk and save it
    pub fn update_manifest(&self, manifest: Manifest) -> Result<Manifest> {
        let path = self.config.manifest_path();
        let mut current = Manifest::load_or_default(&path)?;
        current.merge(manifest);
        current.save(&path)?;
        Ok(current)
    }
}

/// Chapter files (`.xhtml`, `.html`) of a checkout, ordered by file name
pub fn text_files(checkout: &Path) -> Result<Vec<PathBuf>> {
    let base = Pattern::escape(&checkout.join(TEXT_DIR).to_string_lossy());
    let mut files = Vec::new();
    for ext in ["xhtml", "html"] {
        let pattern = format!("{base}/*.{ext}");
        files.extend(glob::glob(&pattern)?.filter_map(|p| p.ok()));
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Per-document output names (`<stem>.txt`), one per chapter file.
///
/// Two chapter files with the same stem (`ch.xhtml`, `ch.html`) would write
/// the same output, so that is an error.
fn output_names(files: &[PathBuf]) -> Result<Vec<String>> {
    let mut seen: HashMap<String, &Path> = HashMap::with_capacity(files.len());
    let mut names = Vec::with_capacity(files.len());
    for path in files {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = format!("{stem}.txt");
        if let Some(previous) = seen.insert(name.clone(), path.as_path()) {
            return Err(Error::generic(format!(
                "{} and {} would both be written to {}",
                previous.display(),
                path.display(),
                name
            )));
        }
        names.push(name);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = ScrapeConfig::default();
        assert_eq!(config.mode, OutputMode::Merged);
        assert_eq!(config.org, "standardebooks");
        assert_eq!(config.manifest_path(), PathBuf::from("corpus/manifest.json"));
    }

    #[test]
    fn test_builder_clamps_jobs() {
        let config = ScrapeConfig::builder().jobs(0).build();
        assert_eq!(config.jobs, 1);
    }

    #[test]
    fn test_should_skip() {
        let scraper = Scraper::new(ScrapeConfig::default());
        assert!(scraper.should_skip("tools"));
        assert!(!scraper.should_skip("jane-austen_emma"));
    }

    #[test]
    fn test_text_files_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join(TEXT_DIR);
        std::fs::create_dir_all(&text).unwrap();
        for name in ["chapter-2.xhtml", "chapter-1.xhtml", "colophon.html", "notes.css"] {
            std::fs::write(text.join(name), "").unwrap();
        }
        let names: Vec<String> = text_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["chapter-1.xhtml", "chapter-2.xhtml", "colophon.html"]);
    }

    #[test]
    fn test_output_names_reject_shared_stem() {
        let files = vec![PathBuf::from("t/ch.html"), PathBuf::from("t/ch.xhtml")];
        let err = output_names(&files).unwrap_err();
        assert!(err.to_string().contains("ch.txt"));

        let files = vec![PathBuf::from("t/ch-1.xhtml"), PathBuf::from("t/ch-2.html")];
        assert_eq!(output_names(&files).unwrap(), vec!["ch-1.txt", "ch-2.txt"]);
    }

    #[test]
    fn test_text_files_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(text_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_output_mode_serde() {
        assert_eq!(
            serde_json::to_string(&OutputMode::PerDocument).unwrap(),
            "\"per-document\""
        );
    }
}
