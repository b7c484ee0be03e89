//! Upstream policy source: read-only client for the newest regulatory
//! documents.

mod http;
pub use http::{FederalRegisterClient, FetchError, FetchedDocument, PolicySource};
