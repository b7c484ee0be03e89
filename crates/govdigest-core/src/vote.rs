//! Vote reconciliation state machine.
//!
//! Per (user, policy) pair the vote state is one of no-vote, upvoted, or
//! downvoted, modelled as `Option<VoteChoice>`. A vote request transitions
//! the state and yields counter deltas:
//!
//! - no-vote + upvote      → upvoted    (+1 up)
//! - no-vote + downvote    → downvoted  (+1 down)
//! - upvoted + upvote      → no-vote    (-1 up, retraction)
//! - upvoted + downvote    → downvoted  (-1 up, +1 down)
//! - downvoted + downvote  → no-vote    (-1 down, retraction)
//! - downvoted + upvote    → upvoted    (-1 down, +1 up)
//!
//! Repeating the active choice is an idempotent toggle: two identical
//! requests net to zero. Decrements clamp at zero against the last-read
//! counters so a counter can never go negative even when local and remote
//! state have drifted.

use crate::policy::{VoteChoice, VoteCounts};

/// Signed counter deltas produced by a vote transition.
///
/// Values are only ever -1, 0, or +1 per counter. Clamp against the
/// current counters with [`CounterDeltas::clamped_to`] before committing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterDeltas {
    pub upvotes: i64,
    pub downvotes: i64,
}

impl CounterDeltas {
    pub fn is_zero(&self) -> bool {
        self.upvotes == 0 && self.downvotes == 0
    }

    /// Drop any decrement that would take an already-zero counter negative.
    pub fn clamped_to(self, counts: &VoteCounts) -> Self {
        Self {
            upvotes: if self.upvotes < 0 && counts.upvotes == 0 {
                0
            } else {
                self.upvotes
            },
            downvotes: if self.downvotes < 0 && counts.downvotes == 0 {
                0
            } else {
                self.downvotes
            },
        }
    }

    /// Apply to counters. Callers are expected to clamp first; saturation
    /// here is a second guard against drifted remote state.
    pub fn apply_to(self, counts: &VoteCounts) -> VoteCounts {
        VoteCounts {
            upvotes: add_clamped(counts.upvotes, self.upvotes),
            downvotes: add_clamped(counts.downvotes, self.downvotes),
        }
    }
}

fn add_clamped(count: u64, delta: i64) -> u64 {
    if delta >= 0 {
        count.saturating_add(delta as u64)
    } else {
        count.saturating_sub(delta.unsigned_abs())
    }
}

/// Compute the next vote state and the counter deltas for a request.
pub fn transition(
    current: Option<VoteChoice>,
    requested: VoteChoice,
) -> (Option<VoteChoice>, CounterDeltas) {
    use VoteChoice::{Downvote, Upvote};

    match (current, requested) {
        (None, Upvote) => (
            Some(Upvote),
            CounterDeltas {
                upvotes: 1,
                downvotes: 0,
            },
        ),
        (None, Downvote) => (
            Some(Downvote),
            CounterDeltas {
                upvotes: 0,
                downvotes: 1,
            },
        ),
        // Repeating the active choice retracts it.
        (Some(Upvote), Upvote) => (
            None,
            CounterDeltas {
                upvotes: -1,
                downvotes: 0,
            },
        ),
        (Some(Downvote), Downvote) => (
            None,
            CounterDeltas {
                upvotes: 0,
                downvotes: -1,
            },
        ),
        // Switching moves one count between buckets.
        (Some(Upvote), Downvote) => (
            Some(Downvote),
            CounterDeltas {
                upvotes: -1,
                downvotes: 1,
            },
        ),
        (Some(Downvote), Upvote) => (
            Some(Upvote),
            CounterDeltas {
                upvotes: 1,
                downvotes: -1,
            },
        ),
    }
}
