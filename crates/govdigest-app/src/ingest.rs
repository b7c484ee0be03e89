//! Ingestion: fetch the newest documents, enrich each with a digest, and
//! persist the ones not already stored.

use std::sync::Arc;

use chrono::Utc;
use govdigest_ai::Summarizer;
use govdigest_core::policy::{Policy, PolicyDigest, VoteCounts};
use govdigest_store::{DocumentStore, StoreError};
use govdigest_sync::{FetchError, FetchedDocument, PolicySource};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum IngestError {
    /// The source or the store was unreachable; the cycle aborts and any
    /// previously loaded state is retained by the caller.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub fetched: usize,
    pub inserted: usize,
    /// Already stored, either found up front or lost the insert race.
    pub skipped: usize,
    /// Stored with the placeholder digest after a summarization failure.
    pub fallbacks: usize,
}

pub struct IngestService<S, P, Z> {
    store: Arc<S>,
    source: P,
    summarizer: Z,
}

impl<S, P, Z> IngestService<S, P, Z>
where
    S: DocumentStore,
    P: PolicySource,
    Z: Summarizer,
{
    pub fn new(store: Arc<S>, source: P, summarizer: Z) -> Self {
        Self {
            store,
            source,
            summarizer,
        }
    }

    /// Run one ingestion cycle.
    ///
    /// Summarization failures never fail the cycle: the document is stored
    /// with the placeholder digest. Existing documents are never touched,
    /// so re-running over the same upstream batch is a no-op.
    pub async fn ingest_latest(&self) -> Result<IngestReport, IngestError> {
        let fetched = self.source.fetch_newest().await?;
        let mut report = IngestReport {
            fetched: fetched.len(),
            ..IngestReport::default()
        };

        for doc in fetched {
            if self.store.get_policy(&doc.document_number).await?.is_some() {
                report.skipped += 1;
                continue;
            }

            let digest = match self.summarizer.summarize(&doc.abstract_text).await {
                Ok(digest) => digest,
                Err(err) => {
                    warn!(
                        document_number = %doc.document_number,
                        %err,
                        "summarization failed, storing placeholder digest"
                    );
                    report.fallbacks += 1;
                    PolicyDigest::unavailable()
                }
            };

            let policy = new_policy(doc, digest);
            if self.store.insert_policy(&policy).await? {
                report.inserted += 1;
            } else {
                report.skipped += 1;
            }
        }

        info!(
            fetched = report.fetched,
            inserted = report.inserted,
            skipped = report.skipped,
            fallbacks = report.fallbacks,
            "ingestion cycle complete"
        );
        Ok(report)
    }
}

fn new_policy(doc: FetchedDocument, digest: PolicyDigest) -> Policy {
    Policy {
        document_number: doc.document_number,
        title: doc.title,
        doc_type: doc.doc_type,
        abstract_text: doc.abstract_text,
        publication_date: doc.publication_date,
        html_url: doc.html_url,
        digest,
        counts: VoteCounts::default(),
        created_at: Utc::now(),
    }
}
