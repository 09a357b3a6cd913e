//! Business logic layer
//!
//! Services coordinate the candidate store, apply the duplicate rules and own
//! the ingestion transactions.

pub mod candidates;
pub mod dedup;
pub mod ingest;

pub use candidates::CandidateService;
pub use dedup::DuplicateResolver;
pub use ingest::{BulkIngestor, IngestReport};
