use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::warn;

use crate::domain::SourceTag;
use crate::error::ScoreError;
use crate::sources::{http_client, SourceConnector, SourceRequest};

const SEARCH_ENDPOINT: &str = "https://archive.org/advancedsearch.php";
const PAGE_TIMEOUT: Duration = Duration::from_secs(10);

// The advanced search API pages slowly; ten rows is plenty when only a few
// candidates per entry are ever needed.
const MAX_ROWS: usize = 10;

/// Internet Archive. One structured query against the advanced-search API;
/// candidate URLs are composed from returned identifiers, no page scraping.
pub struct InternetArchiveSource {
    client: Client,
}

impl InternetArchiveSource {
    pub fn new() -> Result<Self, ScoreError> {
        Ok(Self {
            client: http_client(PAGE_TIMEOUT)?,
        })
    }

    fn try_fetch(&self, request: &SourceRequest<'_>) -> Result<Vec<String>, ScoreError> {
        let rows = request.max_results.min(MAX_ROWS);
        let query = format!(
            "\"{}\" \"{}\" AND mediatype:texts",
            request.variant.text(),
            request.composer
        );
        let response = self
            .client
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("q", query.as_str()),
                ("fl[]", "identifier"),
                ("rows", &rows.to_string()),
                ("output", "json"),
            ])
            .send()
            .map_err(|err| ScoreError::ArchiveHttp(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ScoreError::ArchiveStatus {
                status: response.status().as_u16(),
                message: "advanced search failed".to_string(),
            });
        }
        let body: Value = response
            .json()
            .map_err(|err| ScoreError::ArchiveHttp(err.to_string()))?;

        Ok(identifiers(&body)
            .into_iter()
            .take(rows)
            .map(|identifier| download_url(&identifier))
            .collect())
    }
}

impl SourceConnector for InternetArchiveSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Archive
    }

    fn fetch(&self, request: &SourceRequest<'_>) -> Vec<String> {
        match self.try_fetch(request) {
            Ok(urls) => urls,
            Err(err) => {
                warn!(variant = %request.variant, error = %err, "Internet Archive lookup failed");
                Vec::new()
            }
        }
    }
}

fn identifiers(body: &Value) -> Vec<String> {
    body.get("response")
        .and_then(|value| value.get("docs"))
        .and_then(|value| value.as_array())
        .map(|docs| {
            docs.iter()
                .filter_map(|doc| doc.get("identifier").and_then(|v| v.as_str()))
                .map(|identifier| identifier.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn download_url(identifier: &str) -> String {
    format!("https://archive.org/download/{identifier}/{identifier}_text.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_download_urls_from_identifiers() {
        let body: Value = serde_json::from_str(
            r#"{"response": {"docs": [
                {"identifier": "minuetbach1725"},
                {"other": "ignored"},
                {"identifier": "bachnotebooks"}
            ]}}"#,
        )
        .unwrap();
        let ids = identifiers(&body);
        assert_eq!(ids, vec!["minuetbach1725", "bachnotebooks"]);
        assert_eq!(
            download_url(&ids[0]),
            "https://archive.org/download/minuetbach1725/minuetbach1725_text.pdf"
        );
    }

    #[test]
    fn malformed_payload_yields_no_identifiers() {
        let body: Value = serde_json::from_str(r#"{"unexpected": true}"#).unwrap();
        assert!(identifiers(&body).is_empty());
    }
}
