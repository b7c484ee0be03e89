//! In-memory document store used by tests and offline development.
//!
//! Matches the Firestore implementation's semantics: idempotent insert,
//! atomic vote commit under one lock, counters clamped at zero.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use govdigest_core::policy::{Policy, VoteChoice};
use govdigest_core::vote::CounterDeltas;

use crate::{DocumentStore, StoreError};

#[derive(Default)]
struct Inner {
    policies: BTreeMap<String, Policy>,
    votes: BTreeMap<String, BTreeMap<String, VoteChoice>>,
    writes: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutating operations accepted so far. Lets tests assert
    /// that a failed precondition issued no writes.
    pub fn write_count(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_policy(&self, document_number: &str) -> Result<Option<Policy>, StoreError> {
        Ok(self.lock().policies.get(document_number).cloned())
    }

    async fn insert_policy(&self, policy: &Policy) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        if inner.policies.contains_key(&policy.document_number) {
            return Ok(false);
        }
        inner.writes += 1;
        inner
            .policies
            .insert(policy.document_number.clone(), policy.clone());
        Ok(true)
    }

    async fn list_policies(&self) -> Result<Vec<Policy>, StoreError> {
        Ok(self.lock().policies.values().cloned().collect())
    }

    async fn user_votes(&self, uid: &str) -> Result<BTreeMap<String, VoteChoice>, StoreError> {
        Ok(self.lock().votes.get(uid).cloned().unwrap_or_default())
    }

    async fn commit_vote(
        &self,
        uid: &str,
        document_number: &str,
        choice: Option<VoteChoice>,
        deltas: CounterDeltas,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.writes += 1;

        if let Some(policy) = inner.policies.get_mut(document_number) {
            policy.counts = deltas.apply_to(&policy.counts);
        }

        let record = inner.votes.entry(uid.to_string()).or_default();
        match choice {
            Some(choice) => {
                record.insert(document_number.to_string(), choice);
            }
            None => {
                record.remove(document_number);
            }
        }
        Ok(())
    }
}
