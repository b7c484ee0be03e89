//! Firestore REST implementation of the document store.
//!
//! Two collections: `policies` keyed by document number and `userVotes`
//! keyed by user id. A vote lands as a single `documents:commit` carrying
//! both a counter field transform (server-side atomic increment) and the
//! vote-record merge, so the two can never diverge through a partial write
//! and concurrent voters cannot lose updates.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use govdigest_core::policy::{Policy, PolicyDigest, VoteChoice, VoteCounts};
use govdigest_core::vote::CounterDeltas;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{DocumentStore, StoreError};

const FIRESTORE_ROOT: &str = "https://firestore.googleapis.com/v1";
const POLICIES: &str = "policies";
const USER_VOTES: &str = "userVotes";
/// Upper bound on one `policies` listing; well above the feed's daily volume.
const LIST_PAGE_SIZE: u32 = 300;

pub struct FirestoreStore {
    client: reqwest::Client,
    /// `projects/{project}/databases/(default)`
    database: String,
    /// Firebase ID token attached as a bearer, if signed in.
    token: Option<String>,
}

impl FirestoreStore {
    pub fn new(project_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            database: format!("projects/{project_id}/databases/(default)"),
            token: None,
        }
    }

    /// Attach the ID token of an authenticated session to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn docs_path(&self) -> String {
        format!("{}/documents", self.database)
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{FIRESTORE_ROOT}/{}/{collection}/{id}", self.docs_path())
    }

    fn list_url(&self) -> String {
        format!(
            "{FIRESTORE_ROOT}/{}/{POLICIES}?pageSize={LIST_PAGE_SIZE}",
            self.docs_path()
        )
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get_policy(&self, document_number: &str) -> Result<Option<Policy>, StoreError> {
        let url = self.doc_url(POLICIES, document_number);
        let resp = self.authed(self.client.get(&url)).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        let doc: Value = resp.json().await?;
        Ok(Some(decode_policy(&doc)?))
    }

    async fn insert_policy(&self, policy: &Policy) -> Result<bool, StoreError> {
        let url = format!(
            "{FIRESTORE_ROOT}/{}/{POLICIES}?documentId={}",
            self.docs_path(),
            policy.document_number
        );
        let body = json!({ "fields": encode_policy_fields(policy) });
        let resp = self.authed(self.client.post(&url)).json(&body).send().await?;
        // ALREADY_EXISTS: the stored copy wins; never overwrite counters
        // or digest on re-ingest.
        if resp.status() == StatusCode::CONFLICT {
            debug!(document_number = %policy.document_number, "policy already stored");
            return Ok(false);
        }
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        Ok(true)
    }

    async fn list_policies(&self) -> Result<Vec<Policy>, StoreError> {
        let resp = self.authed(self.client.get(self.list_url())).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        let listing: Value = resp.json().await?;
        let mut policies = Vec::new();
        if let Some(docs) = listing.get("documents").and_then(Value::as_array) {
            for doc in docs {
                match decode_policy(doc) {
                    Ok(policy) => policies.push(policy),
                    // A malformed row should not hide the rest of the feed.
                    Err(err) => warn!(%err, "skipping undecodable policy document"),
                }
            }
        }
        Ok(policies)
    }

    async fn user_votes(&self, uid: &str) -> Result<BTreeMap<String, VoteChoice>, StoreError> {
        let url = self.doc_url(USER_VOTES, uid);
        let resp = self.authed(self.client.get(&url)).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(BTreeMap::new());
        }
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        let doc: Value = resp.json().await?;
        Ok(decode_vote_map(&doc))
    }

    async fn commit_vote(
        &self,
        uid: &str,
        document_number: &str,
        choice: Option<VoteChoice>,
        deltas: CounterDeltas,
    ) -> Result<(), StoreError> {
        let url = format!("{FIRESTORE_ROOT}/{}/documents:commit", self.database);
        let body = build_vote_commit(&self.docs_path(), uid, document_number, choice, deltas);
        let resp = self.authed(self.client.post(&url)).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

// ── Commit body ──

/// Build the `documents:commit` body for a vote: one transform write with
/// atomic counter increments plus one masked update of the user's vote map.
fn build_vote_commit(
    docs_path: &str,
    uid: &str,
    document_number: &str,
    choice: Option<VoteChoice>,
    deltas: CounterDeltas,
) -> Value {
    let mut writes = Vec::new();

    let mut transforms = Vec::new();
    if deltas.upvotes != 0 {
        transforms.push(json!({
            "fieldPath": "upvotes",
            "increment": { "integerValue": deltas.upvotes.to_string() },
        }));
    }
    if deltas.downvotes != 0 {
        transforms.push(json!({
            "fieldPath": "downvotes",
            "increment": { "integerValue": deltas.downvotes.to_string() },
        }));
    }
    if !transforms.is_empty() {
        writes.push(json!({
            "transform": {
                "document": format!("{docs_path}/{POLICIES}/{document_number}"),
                "fieldTransforms": transforms,
            }
        }));
    }

    // Masked update: only this document's entry in the vote map is touched,
    // so one write merges into the map instead of replacing it. Omitting
    // the masked field from `fields` deletes it (vote retraction).
    let votes_fields = match choice {
        Some(choice) => json!({ document_number: { "stringValue": choice.as_str() } }),
        None => json!({}),
    };
    writes.push(json!({
        "update": {
            "name": format!("{docs_path}/{USER_VOTES}/{uid}"),
            "fields": { "votes": { "mapValue": { "fields": votes_fields } } },
        },
        "updateMask": { "fieldPaths": [vote_field_path(document_number)] },
    }));

    json!({ "writes": writes })
}

/// Field path for one entry of the vote map. Document numbers contain `-`,
/// which must be backtick-quoted in Firestore field paths.
fn vote_field_path(document_number: &str) -> String {
    format!("votes.`{document_number}`")
}

// ── Value codec ──

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

fn integer_value(n: u64) -> Value {
    // Firestore carries 64-bit integers as strings.
    json!({ "integerValue": n.to_string() })
}

fn encode_policy_fields(policy: &Policy) -> Value {
    json!({
        "document_number": string_value(&policy.document_number),
        "title": string_value(&policy.title),
        "type": string_value(&policy.doc_type),
        "abstract": string_value(&policy.abstract_text),
        "publication_date": string_value(&policy.publication_date.to_string()),
        "html_url": string_value(&policy.html_url),
        "summary": string_value(&policy.digest.summary),
        "pros": string_value(&policy.digest.pros),
        "cons": string_value(&policy.digest.cons),
        "upvotes": integer_value(policy.counts.upvotes),
        "downvotes": integer_value(policy.counts.downvotes),
        "created_at": {
            "timestampValue": policy.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        },
    })
}

fn str_field(fields: &Value, name: &str) -> Result<String, StoreError> {
    fields
        .get(name)
        .and_then(|v| v.get("stringValue"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::Malformed(format!("missing string field `{name}`")))
}

fn int_field(fields: &Value, name: &str) -> Result<u64, StoreError> {
    let raw = fields
        .get(name)
        .and_then(|v| v.get("integerValue"))
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Malformed(format!("missing integer field `{name}`")))?;
    // Clamp drifted negative counters to zero instead of failing the read.
    Ok(raw.parse::<i64>().unwrap_or(0).max(0) as u64)
}

fn decode_policy(doc: &Value) -> Result<Policy, StoreError> {
    let fields = doc
        .get("fields")
        .ok_or_else(|| StoreError::Malformed("document has no fields".into()))?;

    let publication_date = str_field(fields, "publication_date")?
        .parse::<NaiveDate>()
        .map_err(|e| StoreError::Malformed(format!("bad publication_date: {e}")))?;
    let created_at = fields
        .get("created_at")
        .and_then(|v| v.get("timestampValue"))
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Malformed("missing created_at".into()))?
        .parse::<DateTime<Utc>>()
        .map_err(|e| StoreError::Malformed(format!("bad created_at: {e}")))?;

    Ok(Policy {
        document_number: str_field(fields, "document_number")?,
        title: str_field(fields, "title")?,
        doc_type: str_field(fields, "type")?,
        abstract_text: str_field(fields, "abstract")?,
        publication_date,
        html_url: str_field(fields, "html_url")?,
        digest: PolicyDigest {
            summary: str_field(fields, "summary")?,
            pros: str_field(fields, "pros")?,
            cons: str_field(fields, "cons")?,
        },
        counts: VoteCounts {
            upvotes: int_field(fields, "upvotes")?,
            downvotes: int_field(fields, "downvotes")?,
        },
        created_at,
    })
}

fn decode_vote_map(doc: &Value) -> BTreeMap<String, VoteChoice> {
    let mut votes = BTreeMap::new();
    let entries = doc
        .pointer("/fields/votes/mapValue/fields")
        .and_then(Value::as_object);
    if let Some(entries) = entries {
        for (document_number, value) in entries {
            let raw = value.get("stringValue").and_then(Value::as_str);
            match raw.and_then(VoteChoice::parse) {
                Some(choice) => {
                    votes.insert(document_number.clone(), choice);
                }
                None => warn!(%document_number, "skipping unrecognised vote entry"),
            }
        }
    }
    votes
}

#[cfg(test)]
mod tests {
    use super::*;
    use govdigest_core::policy::PolicyDigest;

    fn sample_policy() -> Policy {
        Policy {
            document_number: "2025-01234".into(),
            title: "Air Quality Designations".into(),
            doc_type: "Rule".into(),
            abstract_text: "Establishes designations.".into(),
            publication_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            html_url: "https://www.federalregister.gov/d/2025-01234".into(),
            digest: PolicyDigest {
                summary: "Sets new rules.".into(),
                pros: "Cleaner air.".into(),
                cons: "Costs.".into(),
            },
            counts: VoteCounts {
                upvotes: 4,
                downvotes: 1,
            },
            created_at: "2025-03-15T10:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn listing_url_carries_the_page_cap() {
        let store = FirestoreStore::new("my-project");
        assert_eq!(
            store.list_url(),
            format!(
                "https://firestore.googleapis.com/v1/projects/my-project/databases/(default)\
                 /documents/policies?pageSize={LIST_PAGE_SIZE}"
            )
        );
    }

    #[test]
    fn policy_fields_roundtrip() {
        let policy = sample_policy();
        let doc = json!({ "fields": encode_policy_fields(&policy) });
        let decoded = decode_policy(&doc).unwrap();
        assert_eq!(decoded.document_number, policy.document_number);
        assert_eq!(decoded.doc_type, "Rule");
        assert_eq!(decoded.publication_date, policy.publication_date);
        assert_eq!(decoded.counts, policy.counts);
        assert_eq!(decoded.digest, policy.digest);
        assert_eq!(decoded.created_at, policy.created_at);
    }

    #[test]
    fn decode_rejects_missing_fields() {
        let doc = json!({ "fields": { "title": { "stringValue": "x" } } });
        assert!(decode_policy(&doc).is_err());
    }

    #[test]
    fn negative_stored_counter_reads_as_zero() {
        let mut doc = json!({ "fields": encode_policy_fields(&sample_policy()) });
        doc["fields"]["upvotes"] = json!({ "integerValue": "-2" });
        let decoded = decode_policy(&doc).unwrap();
        assert_eq!(decoded.counts.upvotes, 0);
    }

    #[test]
    fn vote_map_decodes_and_skips_junk() {
        let doc = json!({
            "fields": { "votes": { "mapValue": { "fields": {
                "2025-01234": { "stringValue": "upvote" },
                "2025-09999": { "stringValue": "downvote" },
                "2025-00001": { "stringValue": "maybe" },
            }}}}
        });
        let votes = decode_vote_map(&doc);
        assert_eq!(votes.get("2025-01234"), Some(&VoteChoice::Upvote));
        assert_eq!(votes.get("2025-09999"), Some(&VoteChoice::Downvote));
        assert!(!votes.contains_key("2025-00001"));
    }

    #[test]
    fn empty_vote_doc_decodes_empty() {
        assert!(decode_vote_map(&json!({})).is_empty());
    }

    #[test]
    fn commit_body_combines_transform_and_update() {
        let docs = "projects/p/databases/(default)/documents";
        let body = build_vote_commit(
            docs,
            "uid-1",
            "2025-01234",
            Some(VoteChoice::Downvote),
            CounterDeltas {
                upvotes: -1,
                downvotes: 1,
            },
        );
        let writes = body["writes"].as_array().unwrap();
        assert_eq!(writes.len(), 2);

        let transform = &writes[0]["transform"];
        assert_eq!(
            transform["document"],
            format!("{docs}/policies/2025-01234")
        );
        let transforms = transform["fieldTransforms"].as_array().unwrap();
        assert_eq!(transforms.len(), 2);
        assert_eq!(transforms[0]["increment"]["integerValue"], "-1");
        assert_eq!(transforms[1]["increment"]["integerValue"], "1");

        let update = &writes[1];
        assert_eq!(update["update"]["name"], format!("{docs}/userVotes/uid-1"));
        assert_eq!(
            update["update"]["fields"]["votes"]["mapValue"]["fields"]["2025-01234"]
                ["stringValue"],
            "downvote"
        );
        assert_eq!(
            update["updateMask"]["fieldPaths"][0],
            "votes.`2025-01234`"
        );
    }

    #[test]
    fn retraction_commit_deletes_map_entry() {
        let docs = "projects/p/databases/(default)/documents";
        let body = build_vote_commit(
            docs,
            "uid-1",
            "2025-01234",
            None,
            CounterDeltas {
                upvotes: -1,
                downvotes: 0,
            },
        );
        let writes = body["writes"].as_array().unwrap();
        assert_eq!(writes.len(), 2);
        // Only the upvote transform; no zero-delta entry.
        assert_eq!(
            writes[0]["transform"]["fieldTransforms"]
                .as_array()
                .unwrap()
                .len(),
            1
        );
        // Masked field omitted from `fields` → deletion of the entry.
        let fields = &writes[1]["update"]["fields"]["votes"]["mapValue"]["fields"];
        assert!(fields.as_object().unwrap().is_empty());
        assert_eq!(
            writes[1]["updateMask"]["fieldPaths"][0],
            "votes.`2025-01234`"
        );
    }

    #[test]
    fn all_zero_deltas_skip_the_transform_write() {
        let body = build_vote_commit(
            "projects/p/databases/(default)/documents",
            "uid-1",
            "2025-01234",
            Some(VoteChoice::Upvote),
            CounterDeltas::default(),
        );
        let writes = body["writes"].as_array().unwrap();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].get("transform").is_none());
    }
}
