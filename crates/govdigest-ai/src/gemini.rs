//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use govdigest_core::policy::PolicyDigest;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{Summarizer, digest::parse_digest};

const GEMINI_ROOT: &str = "https://generativelanguage.googleapis.com/v1beta";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("Gemini API key is not configured")]
    MissingApiKey,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("empty response from Gemini")]
    EmptyResponse,
}

/// Summarization client for the Gemini generative-text API.
///
/// The whole call carries a deadline: summarization is the slowest and
/// least essential network step of ingestion, and a stuck call must not
/// stall the cycle.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: i64,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

/// The summarization instruction: neutral tone, both sides, plain language,
/// and an explicit JSON shape so no prose parsing is needed on the happy
/// path.
fn build_prompt(abstract_text: &str) -> String {
    format!(
        "Summarize the following policy abstract with a neutral tone. List the pros and \
         cons without supporting any side. The summary should be easy to understand for a \
         younger generation. Provide insights into both the advantages and disadvantages \
         of the policy, without taking a stance. Respond with a JSON object containing \
         exactly the string fields \"summary\", \"pros\", and \"cons\": \"{abstract_text}\""
    )
}

fn extract_text(resp: GenerateContentResponse) -> Result<String, SummarizeError> {
    resp.candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or(SummarizeError::EmptyResponse)
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(&self, abstract_text: &str) -> Result<PolicyDigest, SummarizeError> {
        if self.api_key.is_empty() {
            return Err(SummarizeError::MissingApiKey);
        }

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(abstract_text),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                max_output_tokens: 1024,
                response_mime_type: "application/json",
            },
        };

        let url = format!(
            "{GEMINI_ROOT}/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let resp = self.client.post(&url).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SummarizeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = resp.json().await?;
        let text = extract_text(parsed)?;
        debug!(chars = text.len(), "summarization response received");
        Ok(parse_digest(&text))
    }
}
