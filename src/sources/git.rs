//! Shallow clones via the system `git`

use crate::error::{Result, SourceError};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, instrument};

/// HTTPS clone URL for `org/repo` on GitHub
pub fn clone_url(org: &str, repo: &str) -> String {
    format!("https://github.com/{org}/{repo}.git")
}

/// `git clone --depth 1 <url> <dest>`
///
/// `dest` must not exist or must be an empty directory.
#[instrument(skip(dest), fields(dest = %dest.display()))]
pub async fn clone_shallow(url: &str, dest: &Path) -> Result<()> {
    let output = Command::new("git")
        .args(["clone", "--depth", "1", "--quiet"])
        .arg(url)
        .arg(dest)
        .output()
        .await?;

    if !output.status.success() {
        return Err(SourceError::CloneFailed {
            repo: url.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    debug!("Cloned {}", url);
    Ok(())
}
