use std::time::Duration;

use camino::Utf8Path;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use tracing::{debug, warn};

use crate::error::ScoreError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Retrieves candidate documents: a cheap size probe before committing to a
/// download, then the download itself.
pub trait PdfFetcher: Send + Sync {
    /// Advertised content length via HEAD, if the host reports one.
    fn probe_size(&self, url: &str) -> Option<u64>;

    /// Downloads `url` to `destination`. `Ok(Some(bytes))` on success;
    /// `Ok(None)` when the candidate is rejected (bad status, not a PDF,
    /// connection trouble) and the cascade should simply move on;
    /// `Err(Storage)` only when the local filesystem refuses the write.
    fn download(&self, url: &str, destination: &Utf8Path) -> Result<Option<u64>, ScoreError>;
}

#[derive(Clone)]
pub struct HttpPdfFetcher {
    probe: Client,
    download: Client,
}

impl HttpPdfFetcher {
    pub fn new() -> Result<Self, ScoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!(
                "Mozilla/5.0 (compatible; scorefetch/{})",
                env!("CARGO_PKG_VERSION")
            ))
            .map_err(|err| ScoreError::DownloadHttp(err.to_string()))?,
        );
        let probe = Client::builder()
            .default_headers(headers.clone())
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|err| ScoreError::DownloadHttp(err.to_string()))?;
        let download = Client::builder()
            .default_headers(headers)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|err| ScoreError::DownloadHttp(err.to_string()))?;
        Ok(Self { probe, download })
    }
}

impl PdfFetcher for HttpPdfFetcher {
    fn probe_size(&self, url: &str) -> Option<u64> {
        let response = match self.probe.head(url).send() {
            Ok(response) => response,
            Err(err) => {
                debug!(url, error = %err, "size probe failed");
                return None;
            }
        };
        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
    }

    fn download(&self, url: &str, destination: &Utf8Path) -> Result<Option<u64>, ScoreError> {
        let mut response = match self.download.get(url).send() {
            Ok(response) => response,
            Err(err) => {
                warn!(url, error = %err, "download request failed");
                return Ok(None);
            }
        };
        if response.status() != reqwest::StatusCode::OK {
            debug!(url, status = %response.status(), "download rejected");
            return Ok(None);
        }
        let is_pdf = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_lowercase().contains("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            debug!(url, "download rejected: not a PDF content type");
            return Ok(None);
        }

        let parent = destination
            .parent()
            .ok_or_else(|| ScoreError::Storage("destination has no parent".to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix("scorefetch")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| ScoreError::Storage(err.to_string()))?;

        if let Err(err) = response.copy_to(&mut temp) {
            warn!(url, error = %err, "download aborted mid-stream");
            return Ok(None);
        }
        let bytes = temp
            .as_file()
            .metadata()
            .map_err(|err| ScoreError::Storage(err.to_string()))?
            .len();
        temp.persist(destination.as_std_path())
            .map_err(|err| ScoreError::Storage(err.to_string()))?;
        Ok(Some(bytes))
    }
}
