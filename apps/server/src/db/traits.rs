//! Candidate store trait definition

use async_trait::async_trait;
use talentry_intake::{Candidate, NaturalKey, NewCandidate};

use crate::Result;

/// Result of writing a new natural key over an existing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(Candidate),
    NotFound,
    /// The new canonical natural key is already stored.
    Conflict,
}

/// Abstract interface over the durable `candidates` relation.
///
/// Covers the single-row paths and the key-column probe. Batch ingestion
/// talks to PostgreSQL directly.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Return the stored natural keys whose persisted canonical key equals
    /// the canonical key of one of `probes`. Only the three key columns are
    /// read.
    async fn find_key_rows(&self, probes: &[NaturalKey]) -> Result<Vec<NaturalKey>>;

    /// Insert one candidate. Returns `None` when the store's uniqueness
    /// constraint rejects the row.
    async fn insert(&self, candidate: &NewCandidate) -> Result<Option<Candidate>>;

    async fn get(&self, id: i64) -> Result<Option<Candidate>>;

    async fn update(&self, id: i64, candidate: &NewCandidate) -> Result<UpdateOutcome>;

    /// Returns `false` when no row had this id.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Cheap round trip used by health checks.
    async fn ping(&self) -> Result<()>;
}
