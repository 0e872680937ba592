use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use url::Url;

use crate::domain::CatalogEntry;
use crate::error::ScoreError;

/// The flat output directory scores are saved into.
///
/// Filenames follow `{level} - {title} - {composer} - {remote name}` so an
/// entry's files can be found again by prefix on the next run.
#[derive(Debug, Clone)]
pub struct ScoreStore {
    root: Utf8PathBuf,
}

fn forbidden_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap())
}

pub fn sanitize_component(value: &str) -> String {
    forbidden_chars().replace_all(value, "").into_owned()
}

/// The last path segment of a candidate URL, sanitized for use in a
/// filename. Falls back to a fixed name for URLs with a bare path.
pub fn remote_basename(url: &str) -> String {
    let segment = Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(String::from))
        })
        .unwrap_or_default();
    let name = sanitize_component(&segment);
    if name.is_empty() {
        "score.pdf".to_string()
    } else {
        name
    }
}

impl ScoreStore {
    pub fn new(root: &Path) -> Result<Self, ScoreError> {
        let root = Utf8PathBuf::from_path_buf(root.to_path_buf())
            .map_err(|_| ScoreError::Filesystem("non-utf8 output directory".to_string()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn ensure_root(&self) -> Result<(), ScoreError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| ScoreError::Storage(err.to_string()))
    }

    pub fn entry_prefix(&self, entry: &CatalogEntry) -> String {
        format!(
            "{} - {} - {} - ",
            sanitize_component(&entry.level),
            sanitize_component(&entry.title),
            sanitize_component(&entry.composer),
        )
    }

    pub fn file_path(&self, entry: &CatalogEntry, remote_name: &str) -> Utf8PathBuf {
        self.root
            .join(format!("{}{}", self.entry_prefix(entry), remote_name))
    }

    /// Sizes of this entry's PDFs already on disk, for resume seeding.
    /// Unreadable files are skipped rather than failing the scan.
    pub fn existing_sizes(&self, entry: &CatalogEntry) -> Result<Vec<u64>, ScoreError> {
        if !self.root.as_std_path().exists() {
            return Ok(Vec::new());
        }
        let prefix = self.entry_prefix(entry);
        let mut sizes = Vec::new();
        let dir = fs::read_dir(self.root.as_std_path())
            .map_err(|err| ScoreError::Filesystem(err.to_string()))?;
        for dir_entry in dir {
            let dir_entry = dir_entry.map_err(|err| ScoreError::Filesystem(err.to_string()))?;
            let name = dir_entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with(&prefix) || !name.to_lowercase().ends_with(".pdf") {
                continue;
            }
            if let Ok(meta) = dir_entry.metadata() {
                if meta.is_file() {
                    sizes.push(meta.len());
                }
            }
        }
        Ok(sizes)
    }

    pub fn remove_file(&self, path: &Utf8Path) -> Result<(), ScoreError> {
        fs::remove_file(path.as_std_path()).map_err(|err| ScoreError::Storage(err.to_string()))
    }
}
