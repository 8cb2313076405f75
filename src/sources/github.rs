//! GitHub organization repository listing
//!
//! Walks the paginated `GET /users/{org}/repos` endpoint by following the
//! `rel="next"` entry of each response's `Link` header.
//!
//! # Configuration
//!
//! - `GITHUB_TOKEN` (required): bearer token sent with every request

use crate::error::{Result, SourceError};
use reqwest::header::{ACCEPT, LINK};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use url::Url;

/// Default GitHub REST API base
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Environment variable holding the API token
pub const GITHUB_TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Organization whose repositories hold the ebook sources
pub const DEFAULT_ORG: &str = "standardebooks";

const API_VERSION: &str = "2022-11-28";

/// Settings for repository listing
#[derive(Clone)]
pub struct GithubConfig {
    /// Organization (or user) to list
    pub org: String,
    /// API base URL (default: https://api.github.com)
    pub api_base: String,
    /// Repositories per page (default: 100)
    pub per_page: u32,
    /// Directory for raw page payloads (None = don't dump)
    pub dump_dir: Option<PathBuf>,
    token: String,
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("org", &self.org)
            .field("api_base", &self.api_base)
            .field("per_page", &self.per_page)
            .field("dump_dir", &self.dump_dir)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl GithubConfig {
    /// Create a config with an explicit token
    pub fn new<S: Into<String>, T: Into<String>>(org: S, token: T) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SourceError::MissingToken.into());
        }
        Ok(Self {
            org: org.into(),
            api_base: GITHUB_API_BASE.to_string(),
            per_page: 100,
            dump_dir: None,
            token,
        })
    }

    /// Create a config reading the token from `GITHUB_TOKEN`
    pub fn from_env<S: Into<String>>(org: S) -> Result<Self> {
        let token =
            std::env::var(GITHUB_TOKEN_ENV_VAR).map_err(|_| SourceError::MissingToken)?;
        Self::new(org, token)
    }

    /// Override the API base URL
    pub fn with_api_base<S: Into<String>>(mut self, base: S) -> Self {
        self.api_base = base.into();
        self
    }

    /// Dump each raw page payload into `dir`
    pub fn with_dump_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    /// URL of the first listing page
    pub fn first_page_url(&self) -> Result<Url> {
        let raw = format!(
            "{}/users/{}/repos?per_page={}",
            self.api_base.trim_end_matches('/'),
            self.org,
            self.per_page
        );
        Url::parse(&raw).map_err(|e| SourceError::InvalidUrl(format!("{raw}: {e}")).into())
    }
}

/// The fields of a repository listing entry that the corpus needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    /// Repository name, e.g. `jane-austen_emma`
    pub name: String,
    /// `owner/name`
    pub full_name: String,
    /// Whether the repository is archived
    #[serde(default)]
    pub archived: bool,
}

/// Paginated repository lister
pub struct RepoLister {
    client: reqwest::Client,
    config: GithubConfig,
}

impl RepoLister {
    /// Create a lister with its own HTTP client
    pub fn new(config: GithubConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// Fetch every page of the organization's repositories
    #[instrument(skip(self), fields(org = %self.config.org))]
    pub async fn list_all(&self) -> Result<Vec<RepoSummary>> {
        let mut next = Some(self.config.first_page_url()?.to_string());
        let mut page = 1usize;
        let mut repos = Vec::new();

        while let Some(url) = next {
            info!("Fetching repository page {}", page);
            let response = self
                .client
                .get(&url)
                .header(ACCEPT, "application/vnd.github+json")
                .header("X-GitHub-Api-Version", API_VERSION)
                .bearer_auth(&self.config.token)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(SourceError::Http {
                    status: status.as_u16(),
                    message,
                }
                .into());
            }

            // A missing Link header means this is the only page.
            next = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_link_header);
            debug!("Next page: {:?}", next);

            let payload: serde_json::Value = response.json().await?;
            if let Some(dir) = &self.config.dump_dir {
                tokio::fs::create_dir_all(dir).await?;
                let path = dir.join(format!("response{page}.json"));
                tokio::fs::write(&path, serde_json::to_vec(&payload)?).await?;
            }

            let batch: Vec<RepoSummary> = serde_json::from_value(payload)
                .map_err(|e| SourceError::UnexpectedPayload(e.to_string()))?;
            info!("Page {} listed {} repositories", page, batch.len());
            repos.extend(batch);
            page += 1;
        }

        Ok(repos)
    }
}

/// Return the `rel="next"` target of an HTTP `Link` header.
///
/// ```rust
/// use ebook_corpus::sources::parse_link_header;
///
/// let header = r#"<https://api.github.com/user/1/repos?page=3>; rel="next", <https://api.github.com/user/1/repos?page=9>; rel="last""#;
/// assert_eq!(
///     parse_link_header(header).as_deref(),
///     Some("https://api.github.com/user/1/repos?page=3")
/// );
/// ```
pub fn parse_link_header(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        segments
            .any(|param| param.trim() == r#"rel="next""#)
            .then(|| target.trim_start_matches('<').trim_end_matches('>').to_string())
    })
}

/// Write one `full_name` per line
pub fn write_repo_list(path: &Path, repos: &[RepoSummary]) -> Result<()> {
    let mut body = String::new();
    for repo in repos {
        body.push_str(&repo.full_name);
        body.push('\n');
    }
    std::fs::write(path, body)?;
    Ok(())
}

/// Read a repository list, accepting `owner/name` or bare `name` lines
pub fn read_repo_list(path: &Path) -> Result<Vec<String>> {
    let body = std::fs::read_to_string(path)?;
    Ok(body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.rsplit('/').next().unwrap_or(line).to_string())
        .collect())
}
