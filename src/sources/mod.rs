use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use url::Url;

use crate::domain::{SourceTag, TitleVariant};
use crate::error::ScoreError;

pub mod archive;
pub mod duck;
pub mod imslp;
pub mod mutopia;

pub use archive::InternetArchiveSource;
pub use duck::DuckDuckGoSource;
pub use imslp::ImslpSource;
pub use mutopia::MutopiaSource;

/// What a cascade step hands to a connector. Each connector reads the
/// fields it needs: the search connector consumes `query`, the rest work
/// from the raw title variant and composer.
#[derive(Debug, Clone)]
pub struct SourceRequest<'a> {
    pub query: Option<&'a str>,
    pub variant: &'a TitleVariant,
    pub composer: &'a str,
    pub max_results: usize,
}

/// One external retrieval source.
///
/// `fetch` returns a finite, ordered, capped list of candidate PDF URLs.
/// Connectivity and parse failures never escape a connector: they are
/// logged and surface as an empty list, so the cascade always proceeds.
pub trait SourceConnector: Send + Sync {
    fn tag(&self) -> SourceTag;

    /// True when the orchestrator should call `fetch` once per generated
    /// search query instead of once per title variant.
    fn consumes_queries(&self) -> bool {
        false
    }

    fn fetch(&self, request: &SourceRequest<'_>) -> Vec<String>;
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client, ScoreError> {
    // Several of the scraped hosts refuse default library user agents.
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|err| ScoreError::SearchHttp(err.to_string()))
}

/// Candidates must point at a `.pdf` path; everything else is discarded at
/// the connector boundary.
pub(crate) fn is_pdf_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(parsed) => parsed.path().to_lowercase().ends_with(".pdf"),
        Err(_) => candidate.to_lowercase().ends_with(".pdf"),
    }
}
