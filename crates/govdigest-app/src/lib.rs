//! Application services composing the store, the summarizer, and the
//! upstream source.

pub mod ingest;
pub mod vote;

pub use ingest::{IngestError, IngestReport, IngestService};
pub use vote::{VoteError, VoteReceipt, VoteService};
