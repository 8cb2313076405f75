//! Corpus manifest
//!
//! Maps each work's directory name to its title, author and URL. Stored as
//! pretty-printed JSON next to the work directories.

use crate::error::Result;
use crate::extraction::BookMetadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// File name of the manifest inside the output directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Work name → metadata, ordered by work name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, BookMetadata>,
}

impl Manifest {
    /// Empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a work's metadata
    pub fn insert<S: Into<String>>(&mut self, work: S, metadata: BookMetadata) {
        self.entries.insert(work.into(), metadata);
    }

    /// Metadata for one work
    pub fn get(&self, work: &str) -> Option<&BookMetadata> {
        self.entries.get(work)
    }

    /// Number of works
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no works are listed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Works in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BookMetadata)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Add every entry of `other`, replacing duplicates
    pub fn merge(&mut self, other: Manifest) {
        self.entries.extend(other.entries);
    }

    /// Read a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Read a manifest file, or start empty if it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No manifest at {}, starting empty", path.display());
            Ok(Self::new())
        }
    }

    /// Write the manifest as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Wrote manifest with {} works to {}", self.len(), path.display());
        Ok(())
    }
}
