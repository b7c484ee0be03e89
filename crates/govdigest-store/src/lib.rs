//! Hosted backend: document store (policies + per-user vote records) and
//! email/password authentication.

use std::collections::BTreeMap;

use async_trait::async_trait;
use govdigest_core::policy::{Policy, VoteChoice};
use govdigest_core::vote::CounterDeltas;

mod error;
pub use error::StoreError;

pub mod auth;
pub use auth::{AuthClient, AuthError, Session};

mod firestore;
pub use firestore::FirestoreStore;

mod memory;
pub use memory::MemoryStore;

/// The hosted document database holding the `policies` and `userVotes`
/// collections.
///
/// Counter mutation goes through [`commit_vote`](DocumentStore::commit_vote),
/// which applies server-side increments and the vote-record update as one
/// atomic commit; there is no read-modify-write of counters anywhere.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a stored policy by document number. `Ok(None)` if absent.
    async fn get_policy(&self, document_number: &str) -> Result<Option<Policy>, StoreError>;

    /// Insert a policy keyed by its document number.
    ///
    /// Idempotent: returns `Ok(false)` without touching the stored copy
    /// (counters, digest, `created_at`) when the key already exists.
    async fn insert_policy(&self, policy: &Policy) -> Result<bool, StoreError>;

    /// All stored policies, unordered.
    async fn list_policies(&self) -> Result<Vec<Policy>, StoreError>;

    /// The user's vote-choice map, keyed by document number. Absent record
    /// means no votes yet.
    async fn user_votes(&self, uid: &str) -> Result<BTreeMap<String, VoteChoice>, StoreError>;

    /// Atomically apply counter deltas to the policy and set (or, for
    /// `None`, remove) the user's vote-record entry for that policy.
    ///
    /// Deltas must already be clamped against the counters the caller read.
    async fn commit_vote(
        &self,
        uid: &str,
        document_number: &str,
        choice: Option<VoteChoice>,
        deltas: CounterDeltas,
    ) -> Result<(), StoreError>;
}
