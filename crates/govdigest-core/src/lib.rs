pub mod config;
pub mod policy;
pub mod view;
pub mod vote;

pub use config::Config;
pub use policy::{Policy, PolicyDigest, VoteChoice, VoteCounts};
pub use view::{SortOrder, ViewEvent, ViewState};
pub use vote::{CounterDeltas, transition};
