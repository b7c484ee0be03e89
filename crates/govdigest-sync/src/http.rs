//! HTTP client for the Federal Register documents endpoint.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("source returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A document as accepted from the upstream source: published, with a
/// parsed publication date. Not yet enriched or persisted.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub document_number: String,
    pub title: String,
    pub doc_type: String,
    pub abstract_text: String,
    pub publication_date: NaiveDate,
    pub html_url: String,
}

/// Seam for the upstream source so ingestion can run against fixtures.
#[async_trait]
pub trait PolicySource: Send + Sync {
    /// The newest page of published documents, newest first.
    async fn fetch_newest(&self) -> Result<Vec<FetchedDocument>, FetchError>;
}

/// Read-only client for the Federal Register documents API.
pub struct FederalRegisterClient {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
}

#[derive(Deserialize)]
struct DocumentsResponse {
    #[serde(default)]
    results: Vec<RawDocument>,
}

#[derive(Deserialize)]
struct RawDocument {
    document_number: String,
    title: String,
    #[serde(rename = "type")]
    doc_type: String,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
    #[serde(default)]
    publication_date: Option<String>,
    html_url: String,
}

impl FederalRegisterClient {
    /// `base_url` should be like `https://www.federalregister.gov/api/v1`
    /// (no trailing slash).
    pub fn new(base_url: String, page_size: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size,
        }
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/documents.json?per_page={}&sort=published+desc",
            self.base_url, self.page_size
        )
    }
}

#[async_trait]
impl PolicySource for FederalRegisterClient {
    async fn fetch_newest(&self) -> Result<Vec<FetchedDocument>, FetchError> {
        let url = self.documents_url();
        info!(url = %url, "fetching newest policies");
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let listing: DocumentsResponse = resp.json().await?;
        let documents = accept_published(listing.results);
        info!(count = documents.len(), "fetched policies");
        Ok(documents)
    }
}

/// Keep only documents with a non-empty, parseable publication date.
fn accept_published(raw: Vec<RawDocument>) -> Vec<FetchedDocument> {
    raw.into_iter()
        .filter_map(|doc| {
            let date = doc.publication_date.as_deref().unwrap_or_default();
            if date.is_empty() {
                return None;
            }
            let publication_date = match date.parse::<NaiveDate>() {
                Ok(d) => d,
                Err(err) => {
                    warn!(
                        document_number = %doc.document_number,
                        %err,
                        "skipping document with unparseable publication date"
                    );
                    return None;
                }
            };
            Some(FetchedDocument {
                document_number: doc.document_number,
                title: doc.title,
                doc_type: doc.doc_type,
                abstract_text: doc.abstract_text.unwrap_or_default(),
                publication_date,
                html_url: doc.html_url,
            })
        })
        .collect()
}
