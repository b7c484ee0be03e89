//! Serializable view state with a unidirectional update function.
//!
//! The browse surface (search, type filter, sort, expanded card, vote
//! in-flight flags) is explicit state transformed by [`update`] so the
//! transitions are testable without any rendering.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::policy::Policy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

/// Browse-surface state. Serializable so a host UI can persist and restore it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub query: String,
    /// Exact type-label filter; `None` shows all types.
    pub type_filter: Option<String>,
    pub sort: SortOrder,
    /// Document number of the expanded card, if any.
    pub expanded: Option<String>,
    /// Documents with an outstanding vote; the vote control is disabled for
    /// these to prevent overlapping read-modify-write cycles.
    pub vote_in_flight: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Search(String),
    FilterType(Option<String>),
    Sort(SortOrder),
    /// Expand the card, or collapse it if already expanded.
    ToggleCard(String),
    VoteStarted(String),
    VoteSettled(String),
}

/// Fold one event into the state.
pub fn update(mut state: ViewState, event: ViewEvent) -> ViewState {
    match event {
        ViewEvent::Search(query) => state.query = query,
        ViewEvent::FilterType(label) => state.type_filter = label,
        ViewEvent::Sort(order) => state.sort = order,
        ViewEvent::ToggleCard(id) => {
            state.expanded = if state.expanded.as_deref() == Some(id.as_str()) {
                None
            } else {
                Some(id)
            };
        }
        ViewEvent::VoteStarted(id) => {
            state.vote_in_flight.insert(id);
        }
        ViewEvent::VoteSettled(id) => {
            state.vote_in_flight.remove(&id);
        }
    }
    state
}

impl ViewState {
    pub fn vote_allowed(&self, document_number: &str) -> bool {
        !self.vote_in_flight.contains(document_number)
    }
}

/// Apply search, type filter, and sort to the working set.
///
/// Search is a case-insensitive substring match over title, abstract, and
/// generated summary. The type filter is an exact label match. Sort is by
/// publication date, ties broken by document number for a stable order.
pub fn visible<'a>(state: &ViewState, policies: &'a [Policy]) -> Vec<&'a Policy> {
    let needle = state.query.to_lowercase();
    let mut matched: Vec<&Policy> = policies
        .iter()
        .filter(|p| {
            state
                .type_filter
                .as_deref()
                .is_none_or(|label| p.doc_type == label)
        })
        .filter(|p| {
            needle.is_empty()
                || p.title.to_lowercase().contains(&needle)
                || p.abstract_text.to_lowercase().contains(&needle)
                || p.digest.summary.to_lowercase().contains(&needle)
        })
        .collect();

    matched.sort_by(|a, b| {
        let key_a = (a.publication_date, a.document_number.as_str());
        let key_b = (b.publication_date, b.document_number.as_str());
        match state.sort {
            SortOrder::Newest => key_b.cmp(&key_a),
            SortOrder::Oldest => key_a.cmp(&key_b),
        }
    });
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{PolicyDigest, VoteCounts};
    use chrono::NaiveDate;

    fn policy(id: &str, title: &str, doc_type: &str, date: (i32, u32, u32)) -> Policy {
        Policy {
            document_number: id.into(),
            title: title.into(),
            doc_type: doc_type.into(),
            abstract_text: format!("Abstract for {title}."),
            publication_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            html_url: format!("https://www.federalregister.gov/d/{id}"),
            digest: PolicyDigest {
                summary: format!("Summary of {title}."),
                pros: "Pros.".into(),
                cons: "Cons.".into(),
            },
            counts: VoteCounts::default(),
            created_at: "2025-03-15T10:00:00Z".parse().unwrap(),
        }
    }

    fn fixture() -> Vec<Policy> {
        vec![
            policy("A-1", "Ozone Standards", "Rule", (2025, 3, 10)),
            policy("B-2", "Import Duties Notice", "Notice", (2025, 3, 12)),
            policy("C-3", "Fisheries Closure", "Rule", (2025, 3, 11)),
        ]
    }

    fn ids(policies: &[&Policy]) -> Vec<String> {
        policies.iter().map(|p| p.document_number.clone()).collect()
    }

    #[test]
    fn default_sort_is_newest_first() {
        let all = fixture();
        let shown = visible(&ViewState::default(), &all);
        assert_eq!(ids(&shown), ["B-2", "C-3", "A-1"]);
    }

    #[test]
    fn oldest_sort_reverses() {
        let all = fixture();
        let state = update(ViewState::default(), ViewEvent::Sort(SortOrder::Oldest));
        let shown = visible(&state, &all);
        assert_eq!(ids(&shown), ["A-1", "C-3", "B-2"]);
    }

    #[test]
    fn search_matches_title_case_insensitive() {
        let all = fixture();
        let state = update(ViewState::default(), ViewEvent::Search("ozone".into()));
        let shown = visible(&state, &all);
        assert_eq!(ids(&shown), ["A-1"]);
    }

    #[test]
    fn search_matches_abstract_and_summary() {
        let all = fixture();
        let state = update(
            ViewState::default(),
            ViewEvent::Search("abstract for fisheries".into()),
        );
        assert_eq!(ids(&visible(&state, &all)), ["C-3"]);

        let state = update(
            ViewState::default(),
            ViewEvent::Search("summary of import".into()),
        );
        assert_eq!(ids(&visible(&state, &all)), ["B-2"]);
    }

    #[test]
    fn type_filter_is_exact() {
        let all = fixture();
        let state = update(
            ViewState::default(),
            ViewEvent::FilterType(Some("Rule".into())),
        );
        assert_eq!(ids(&visible(&state, &all)), ["C-3", "A-1"]);

        let state = update(state, ViewEvent::FilterType(Some("Proposed Rule".into())));
        assert!(visible(&state, &all).is_empty());

        let state = update(state, ViewEvent::FilterType(None));
        assert_eq!(visible(&state, &all).len(), 3);
    }

    #[test]
    fn toggle_card_expands_and_collapses() {
        let state = update(ViewState::default(), ViewEvent::ToggleCard("A-1".into()));
        assert_eq!(state.expanded.as_deref(), Some("A-1"));
        let state = update(state, ViewEvent::ToggleCard("B-2".into()));
        assert_eq!(state.expanded.as_deref(), Some("B-2"));
        let state = update(state, ViewEvent::ToggleCard("B-2".into()));
        assert_eq!(state.expanded, None);
    }

    #[test]
    fn in_flight_flags_gate_voting() {
        let state = update(ViewState::default(), ViewEvent::VoteStarted("A-1".into()));
        assert!(!state.vote_allowed("A-1"));
        assert!(state.vote_allowed("B-2"));
        let state = update(state, ViewEvent::VoteSettled("A-1".into()));
        assert!(state.vote_allowed("A-1"));
    }

    #[test]
    fn view_state_json_roundtrip() {
        let state = ViewState {
            query: "ozone".into(),
            type_filter: Some("Rule".into()),
            sort: SortOrder::Oldest,
            expanded: Some("A-1".into()),
            vote_in_flight: BTreeSet::from(["B-2".to_string()]),
        };
        let json = serde_json::to_string(&state).unwrap();
        let parsed: ViewState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
