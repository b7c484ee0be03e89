//! The `apply_vote` operation: session precondition, per-document in-flight
//! guard, transition, and one atomic store commit.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use govdigest_core::policy::{VoteChoice, VoteCounts};
use govdigest_core::vote::transition;
use govdigest_store::{DocumentStore, Session, StoreError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum VoteError {
    /// No active session. The caller must prompt sign-in; nothing was
    /// read or written.
    #[error("sign in to vote")]
    Unauthenticated,

    /// A vote for this document is still outstanding from this client.
    #[error("a vote for {0} is already in progress")]
    VoteInFlight(String),

    #[error("unknown document: {0}")]
    UnknownDocument(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Returned to the caller so displayed state can be updated without
/// re-reading the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteReceipt {
    pub choice: Option<VoteChoice>,
    pub counts: VoteCounts,
}

pub struct VoteService<S> {
    store: Arc<S>,
    in_flight: Mutex<BTreeSet<String>>,
}

/// Releases the in-flight slot for a document on every exit path.
struct InFlightGuard<'a> {
    set: &'a Mutex<BTreeSet<String>>,
    document_number: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.document_number);
    }
}

fn lock(set: &Mutex<BTreeSet<String>>) -> MutexGuard<'_, BTreeSet<String>> {
    set.lock().unwrap_or_else(|e| e.into_inner())
}

impl<S: DocumentStore> VoteService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            in_flight: Mutex::new(BTreeSet::new()),
        }
    }

    /// Apply the user's requested vote choice to a document.
    ///
    /// Repeating the active choice retracts it; switching moves one count
    /// between buckets. Counter deltas and the vote-record update land in
    /// one atomic commit. Requests for a document whose previous vote is
    /// still outstanding are rejected, never queued.
    pub async fn apply_vote(
        &self,
        session: Option<&Session>,
        document_number: &str,
        requested: VoteChoice,
    ) -> Result<VoteReceipt, VoteError> {
        let session = session.ok_or(VoteError::Unauthenticated)?;

        let _guard = {
            let mut in_flight = lock(&self.in_flight);
            if !in_flight.insert(document_number.to_string()) {
                return Err(VoteError::VoteInFlight(document_number.to_string()));
            }
            InFlightGuard {
                set: &self.in_flight,
                document_number: document_number.to_string(),
            }
        };

        let policy = self
            .store
            .get_policy(document_number)
            .await?
            .ok_or_else(|| VoteError::UnknownDocument(document_number.to_string()))?;
        let votes = self.store.user_votes(&session.uid).await?;
        let current = votes.get(document_number).copied();

        let (next, deltas) = transition(current, requested);
        let deltas = deltas.clamped_to(&policy.counts);
        self.store
            .commit_vote(&session.uid, document_number, next, deltas)
            .await?;

        let counts = deltas.apply_to(&policy.counts);
        info!(
            uid = %session.uid,
            %document_number,
            choice = next.map(|c| c.as_str()).unwrap_or("none"),
            upvotes = counts.upvotes,
            downvotes = counts.downvotes,
            "vote applied"
        );
        Ok(VoteReceipt {
            choice: next,
            counts,
        })
    }
}
