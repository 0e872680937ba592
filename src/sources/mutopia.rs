use std::time::Duration;

use reqwest::blocking::Client;
use scraper::{Html, Selector};
use tracing::warn;

use crate::domain::SourceTag;
use crate::error::ScoreError;
use crate::sources::{http_client, SourceConnector, SourceRequest};

const BASE_URL: &str = "https://www.mutopiaproject.org";
const PAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Mutopia Project. A single title search against the piece-info CGI,
/// scraping every `.pdf` anchor from the result page. The composer is not
/// part of the query; the relevance filter screens the results instead.
pub struct MutopiaSource {
    client: Client,
}

impl MutopiaSource {
    pub fn new() -> Result<Self, ScoreError> {
        Ok(Self {
            client: http_client(PAGE_TIMEOUT)?,
        })
    }

    fn try_fetch(&self, request: &SourceRequest<'_>) -> Result<Vec<String>, ScoreError> {
        let title = request.variant.text();
        let response = self
            .client
            .get(format!("{BASE_URL}/cgibin/piece-info.cgi"))
            .query(&[("searchtext", title.as_str())])
            .send()
            .map_err(|err| ScoreError::MutopiaHttp(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ScoreError::MutopiaStatus {
                status: response.status().as_u16(),
                message: "piece search failed".to_string(),
            });
        }
        let body = response
            .text()
            .map_err(|err| ScoreError::MutopiaHttp(err.to_string()))?;

        Ok(extract_pdf_links(&body, request.max_results))
    }
}

impl SourceConnector for MutopiaSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Mutopia
    }

    fn fetch(&self, request: &SourceRequest<'_>) -> Vec<String> {
        match self.try_fetch(request) {
            Ok(urls) => urls,
            Err(err) => {
                warn!(variant = %request.variant, error = %err, "Mutopia lookup failed");
                Vec::new()
            }
        }
    }
}

fn extract_pdf_links(body: &str, max_results: usize) -> Vec<String> {
    let document = Html::parse_document(body);
    let anchor = Selector::parse(r#"a[href$=".pdf"]"#).unwrap();
    let mut urls = Vec::new();
    for element in document.select(&anchor) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let url = if href.starts_with("http") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{BASE_URL}{href}")
        } else {
            format!("{BASE_URL}/{href}")
        };
        urls.push(url);
        if urls.len() >= max_results {
            break;
        }
    }
    urls
}
