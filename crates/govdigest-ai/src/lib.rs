//! Summarization: turn a policy abstract into a neutral summary with pros
//! and cons.

use async_trait::async_trait;
use govdigest_core::policy::PolicyDigest;

pub mod digest;
pub use digest::parse_digest;

mod gemini;
pub use gemini::{GeminiClient, SummarizeError};

/// The summarization seam. The production implementation is
/// [`GeminiClient`]; ingestion tests substitute stubs.
///
/// Callers must treat any error as recoverable: the document is still
/// stored, with [`PolicyDigest::unavailable`] in place of the digest.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, abstract_text: &str) -> Result<PolicyDigest, SummarizeError>;
}
