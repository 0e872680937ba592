use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::domain::SourceTag;
use crate::error::ScoreError;
use crate::sources::{http_client, SourceConnector, SourceRequest};

const BASE_URL: &str = "https://imslp.org";
const PAGE_TIMEOUT: Duration = Duration::from_secs(10);

fn non_word_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\w\s]").unwrap())
}

/// IMSLP (Petrucci Music Library). Searches the wiki, then visits each hit's
/// piece page and takes its first `Special:FilePath/….pdf` link. A search
/// qualified with the composer that returns nothing is retried once with the
/// title alone.
pub struct ImslpSource {
    client: Client,
}

impl ImslpSource {
    pub fn new() -> Result<Self, ScoreError> {
        Ok(Self {
            client: http_client(PAGE_TIMEOUT)?,
        })
    }

    fn search(&self, terms: &str) -> Result<Vec<String>, ScoreError> {
        let cleaned = non_word_chars().replace_all(terms, "").into_owned();
        let response = self
            .client
            .get(format!("{BASE_URL}/index.php"))
            .query(&[("title", "Special:Search"), ("search", cleaned.as_str())])
            .send()
            .map_err(|err| ScoreError::ImslpHttp(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ScoreError::ImslpStatus {
                status: response.status().as_u16(),
                message: "search failed".to_string(),
            });
        }
        let body = response
            .text()
            .map_err(|err| ScoreError::ImslpHttp(err.to_string()))?;

        let document = Html::parse_document(&body);
        let heading = Selector::parse("div.mw-search-result-heading a[href]").unwrap();
        Ok(document
            .select(&heading)
            .filter_map(|element| element.value().attr("href"))
            .map(|href| href.to_string())
            .collect())
    }

    fn piece_page_pdf(&self, relative: &str) -> Result<Option<String>, ScoreError> {
        let page_url = format!("{BASE_URL}{relative}");
        let response = self
            .client
            .get(&page_url)
            .send()
            .map_err(|err| ScoreError::ImslpHttp(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ScoreError::ImslpStatus {
                status: response.status().as_u16(),
                message: format!("piece page {page_url} failed"),
            });
        }
        let body = response
            .text()
            .map_err(|err| ScoreError::ImslpHttp(err.to_string()))?;

        let document = Html::parse_document(&body);
        let anchor = Selector::parse("a[href]").unwrap();
        for element in document.select(&anchor) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if href.contains("Special:FilePath/") && href.to_lowercase().ends_with(".pdf") {
                return Ok(Some(format!("{BASE_URL}{href}")));
            }
        }
        Ok(None)
    }

    fn try_fetch(&self, request: &SourceRequest<'_>) -> Result<Vec<String>, ScoreError> {
        let title = request.variant.text();
        let mut hits = self.search(&format!("{title} {}", request.composer))?;
        if hits.is_empty() {
            debug!(title = %title, "no hits with composer, retrying title-only");
            hits = self.search(&title)?;
        }

        let mut urls = Vec::new();
        for relative in hits.iter().take(request.max_results) {
            if let Some(url) = self.piece_page_pdf(relative)? {
                urls.push(url);
            }
            if urls.len() >= request.max_results {
                break;
            }
        }
        Ok(urls)
    }
}

impl SourceConnector for ImslpSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Imslp
    }

    fn fetch(&self, request: &SourceRequest<'_>) -> Vec<String> {
        match self.try_fetch(request) {
            Ok(urls) => urls,
            Err(err) => {
                warn!(variant = %request.variant, error = %err, "IMSLP lookup failed");
                Vec::new()
            }
        }
    }
}
