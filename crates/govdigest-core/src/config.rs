//! Runtime configuration shared across the GovDigest crates.

use serde::{Deserialize, Serialize};

pub const DEFAULT_POLICY_API_URL: &str = "https://www.federalregister.gov/api/v1";
pub const DEFAULT_PAGE_SIZE: u32 = 5;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_SUMMARIZE_TIMEOUT_SECS: u64 = 30;

/// Endpoint and credential configuration.
///
/// Secrets (API keys) are expected from the environment; the CLI maps
/// `GEMINI_API_KEY`, `FIREBASE_API_KEY`, and `FIREBASE_PROJECT_ID` into
/// this struct via clap's env support.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the policy source API (no trailing slash).
    pub policy_api_url: String,
    /// Documents requested per ingestion cycle, newest first.
    pub page_size: u32,
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// Deadline for a single summarization call. The slowest and least
    /// essential network step, so it gets a timeout the others do not.
    pub summarize_timeout_secs: u64,
    pub firebase_api_key: String,
    pub firebase_project_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy_api_url: DEFAULT_POLICY_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            summarize_timeout_secs: DEFAULT_SUMMARIZE_TIMEOUT_SECS,
            firebase_api_key: String::new(),
            firebase_project_id: String::new(),
        }
    }
}
