use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ScoreError {
    #[error("invalid catalog record: {0}")]
    InvalidEntry(String),

    #[error("failed to read catalog at {0}")]
    CatalogRead(PathBuf),

    #[error("failed to parse catalog: {0}")]
    CatalogParse(String),

    #[error("failed to rewrite catalog at {0}: {1}")]
    CatalogWrite(PathBuf, String),

    #[error("failed to load config file: {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("search request failed: {0}")]
    SearchHttp(String),

    #[error("search returned status {status}: {message}")]
    SearchStatus { status: u16, message: String },

    #[error("IMSLP request failed: {0}")]
    ImslpHttp(String),

    #[error("IMSLP returned status {status}: {message}")]
    ImslpStatus { status: u16, message: String },

    #[error("Internet Archive request failed: {0}")]
    ArchiveHttp(String),

    #[error("Internet Archive returned status {status}: {message}")]
    ArchiveStatus { status: u16, message: String },

    #[error("Mutopia request failed: {0}")]
    MutopiaHttp(String),

    #[error("Mutopia returned status {status}: {message}")]
    MutopiaStatus { status: u16, message: String },

    #[error("download failed: {0}")]
    DownloadHttp(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
