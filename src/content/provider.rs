use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::entity::{Article, ChangelogEntry, ContentEntity, Project};

/// Maximum accepted content file size (32 MB).
const MAX_CONTENT_FILE_SIZE: u64 = 32 * 1024 * 1024;

/// Errors that can occur while loading content entities.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Failed to read content file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid content JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Content file too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },
}

/// Source of the entities a feed is built from.
///
/// The engine never reads content on its own; callers inject it through this
/// trait (or pass a slice directly), so tests can use synthetic sets and the
/// web layer can use whatever loader it already has.
pub trait ContentProvider {
    fn entities(&self) -> Result<Vec<ContentEntity>, ContentError>;
}

/// In-memory content, grouped by type the way content loaders hand it over.
///
/// Deserializes from:
///
/// ```json
/// { "articles": [...], "projects": [...], "changelog": [...] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContentSet {
    pub articles: Vec<Article>,
    pub projects: Vec<Project>,
    pub changelog: Vec<ChangelogEntry>,
}

impl ContentSet {
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.articles.len() + self.projects.len() + self.changelog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_entities(self) -> Vec<ContentEntity> {
        let mut entities = Vec::with_capacity(self.len());
        entities.extend(self.articles.into_iter().map(ContentEntity::Article));
        entities.extend(self.projects.into_iter().map(ContentEntity::Project));
        entities.extend(self.changelog.into_iter().map(ContentEntity::Changelog));
        entities
    }
}

impl ContentProvider for ContentSet {
    fn entities(&self) -> Result<Vec<ContentEntity>, ContentError> {
        Ok(self.clone().into_entities())
    }
}

/// A JSON content file on disk, read on every call.
#[derive(Debug, Clone)]
pub struct JsonContentFile {
    path: PathBuf,
}

impl JsonContentFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContentProvider for JsonContentFile {
    fn entities(&self) -> Result<Vec<ContentEntity>, ContentError> {
        let size = std::fs::metadata(&self.path)?.len();
        if size > MAX_CONTENT_FILE_SIZE {
            return Err(ContentError::TooLarge {
                size,
                max: MAX_CONTENT_FILE_SIZE,
            });
        }

        let json = std::fs::read_to_string(&self.path)?;
        let set = ContentSet::from_json(&json)?;
        tracing::info!(
            path = %self.path.display(),
            articles = set.articles.len(),
            projects = set.projects.len(),
            changelog = set.changelog.len(),
            "Loaded content"
        );
        Ok(set.into_entities())
    }
}
