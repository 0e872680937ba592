use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::domain::SourceTag;
use crate::error::ScoreError;
use crate::sources::{is_pdf_url, SourceConnector, SourceRequest};

const API_ENDPOINT: &str = "https://api.duckduckgo.com/";
const HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

// The search engine rate-limits aggressively; a slow response is treated the
// same as no response rather than holding up the cascade.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(2);

/// DuckDuckGo web search. Consumes one generated query per call; tries the
/// structured instant-answer API first and falls back to scraping the HTML
/// results page for the same query.
pub struct DuckDuckGoSource {
    client: Client,
}

impl DuckDuckGoSource {
    pub fn new() -> Result<Self, ScoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        headers.insert(REFERER, HeaderValue::from_static(HTML_ENDPOINT));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(SEARCH_TIMEOUT)
            .build()
            .map_err(|err| ScoreError::SearchHttp(err.to_string()))?;
        Ok(Self { client })
    }

    fn api_search(&self, query: &str, max_results: usize) -> Result<Vec<String>, ScoreError> {
        let response = self
            .client
            .get(API_ENDPOINT)
            .query(&[("q", query), ("format", "json"), ("no_html", "1")])
            .send()
            .map_err(|err| ScoreError::SearchHttp(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ScoreError::SearchStatus {
                status: response.status().as_u16(),
                message: "instant answer request failed".to_string(),
            });
        }
        let body: Value = response
            .json()
            .map_err(|err| ScoreError::SearchHttp(err.to_string()))?;

        let mut urls = Vec::new();
        collect_result_urls(&body, max_results, &mut urls);
        Ok(urls)
    }

    fn html_search(&self, query: &str, max_results: usize) -> Result<Vec<String>, ScoreError> {
        let response = self
            .client
            .get(HTML_ENDPOINT)
            .query(&[("q", query)])
            .send()
            .map_err(|err| ScoreError::SearchHttp(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ScoreError::SearchStatus {
                status: response.status().as_u16(),
                message: "html search failed".to_string(),
            });
        }
        let body = response
            .text()
            .map_err(|err| ScoreError::SearchHttp(err.to_string()))?;

        let document = Html::parse_document(&body);
        let anchor = Selector::parse("a.result__a[href]").unwrap();
        let mut urls = Vec::new();
        for element in document.select(&anchor) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let real = extract_real_url(href);
            if is_pdf_url(&real) {
                urls.push(real);
                if urls.len() >= max_results {
                    break;
                }
            }
        }
        Ok(urls)
    }
}

impl SourceConnector for DuckDuckGoSource {
    fn tag(&self) -> SourceTag {
        SourceTag::DuckDuckGo
    }

    fn consumes_queries(&self) -> bool {
        true
    }

    fn fetch(&self, request: &SourceRequest<'_>) -> Vec<String> {
        let Some(query) = request.query else {
            return Vec::new();
        };
        match self.api_search(query, request.max_results) {
            Ok(urls) if !urls.is_empty() => return urls,
            Ok(_) => debug!(query, "instant answer yielded nothing, scraping html results"),
            Err(err) => debug!(query, error = %err, "instant answer failed, scraping html results"),
        }
        match self.html_search(query, request.max_results) {
            Ok(urls) => urls,
            Err(err) => {
                warn!(query, error = %err, "search scrape failed");
                Vec::new()
            }
        }
    }
}

/// Results pages link through a redirect endpoint whose `uddg` query
/// parameter carries the destination; unwrap it when present.
pub fn extract_real_url(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    let Ok(parsed) = Url::parse(&absolute) else {
        return absolute;
    };
    parsed
        .query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, value)| value.into_owned())
        .unwrap_or(absolute)
}

fn collect_result_urls(value: &Value, max_results: usize, urls: &mut Vec<String>) {
    for key in ["Results", "RelatedTopics"] {
        if let Some(items) = value.get(key).and_then(|v| v.as_array()) {
            collect_from_items(items, max_results, urls);
        }
    }
}

fn collect_from_items(items: &[Value], max_results: usize, urls: &mut Vec<String>) {
    for item in items {
        if urls.len() >= max_results {
            return;
        }
        if let Some(url) = item.get("FirstURL").and_then(|v| v.as_str()) {
            if is_pdf_url(url) {
                urls.push(url.to_string());
            }
        }
        // Topic groups nest another result list one level down.
        if let Some(nested) = item.get("Topics").and_then(|v| v.as_array()) {
            collect_from_items(nested, max_results, urls);
        }
    }
}
