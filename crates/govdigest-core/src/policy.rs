//! Shared policy types persisted in the document store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A regulatory document ingested from the upstream policy source.
///
/// Identity fields are assigned upstream and immutable once fetched. The
/// digest is computed once at ingestion and never recomputed; the vote
/// counters are the only mutable fields after first persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Upstream document number, e.g. "2025-01234". Store key.
    pub document_number: String,
    pub title: String,
    /// Type label: "Rule", "Notice", "Proposed Rule", ...
    pub doc_type: String,
    pub abstract_text: String,
    pub publication_date: NaiveDate,
    /// Detail page on the upstream source.
    pub html_url: String,
    pub digest: PolicyDigest,
    pub counts: VoteCounts,
    /// Set at first persistence, never updated.
    pub created_at: DateTime<Utc>,
}

/// Generated neutral summary with pros and cons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDigest {
    pub summary: String,
    pub pros: String,
    pub cons: String,
}

impl PolicyDigest {
    /// Fixed fallback used whenever summarization fails or the response
    /// cannot be parsed. Ingestion stores this rather than failing.
    pub fn unavailable() -> Self {
        Self {
            summary: "Summary unavailable.".to_string(),
            pros: "Pros unavailable.".to_string(),
            cons: "Cons unavailable.".to_string(),
        }
    }
}

/// Aggregate vote counters on a policy. Never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    pub upvotes: u64,
    pub downvotes: u64,
}

/// A user's active vote on a single policy.
///
/// Absence of a vote record entry means no-vote; there is never more than
/// one active choice per user per policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Upvote,
    Downvote,
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upvote" => Some(Self::Upvote),
            "downvote" => Some(Self::Downvote),
            _ => None,
        }
    }
}
