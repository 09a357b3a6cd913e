//! Candidate service - single-record insert path and edit path

use std::collections::HashSet;
use std::sync::Arc;

use talentry_intake::{Candidate, NaturalKey, NewCandidate};

use crate::{
    db::{CandidateStore, UpdateOutcome},
    metrics,
    services::DuplicateResolver,
    Result,
};

pub struct CandidateService {
    store: Arc<dyn CandidateStore>,
    resolver: DuplicateResolver,
}

impl CandidateService {
    pub fn new(store: Arc<dyn CandidateStore>) -> Self {
        let resolver = DuplicateResolver::new(store.clone());
        Self { store, resolver }
    }

    pub fn resolver(&self) -> &DuplicateResolver {
        &self.resolver
    }

    /// Canonical keys of `candidates` already present in the store.
    pub async fn existing_keys(&self, candidates: &[NewCandidate]) -> Result<HashSet<String>> {
        let keys: Vec<NaturalKey> = candidates.iter().map(NewCandidate::natural_key).collect();
        self.resolver.existing_keys(&keys).await
    }

    /// Insert `candidate` unless its canonical key is already stored.
    ///
    /// Returns the stored row, or `None` when the candidate is a duplicate.
    /// A duplicate detected by the store's unique constraint (a concurrent
    /// insert won the race) is reported the same way.
    pub async fn create(&self, candidate: &NewCandidate) -> Result<Option<Candidate>> {
        let existing = self.existing_keys(std::slice::from_ref(candidate)).await?;
        if !existing.is_empty() {
            tracing::info!(
                mail_id = %candidate.mail_id,
                skill_set = %candidate.skill_set,
                "Duplicate candidate rejected"
            );
            metrics::record_conflict("create");
            metrics::record_skipped(metrics::PATH_SINGLE, 1);
            return Ok(None);
        }

        match self.store.insert(candidate).await? {
            Some(stored) => {
                tracing::info!(candidate_id = stored.id, "Candidate created");
                metrics::record_inserted(metrics::PATH_SINGLE, 1);
                Ok(Some(stored))
            }
            None => {
                tracing::info!(
                    mail_id = %candidate.mail_id,
                    "Duplicate candidate rejected by unique constraint"
                );
                metrics::record_conflict("create");
                metrics::record_skipped(metrics::PATH_SINGLE, 1);
                Ok(None)
            }
        }
    }

    /// Insert `candidate` iff its canonical key is absent.
    pub async fn insert_single(&self, candidate: &NewCandidate) -> Result<bool> {
        Ok(self.create(candidate).await?.is_some())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Candidate>> {
        self.store.get(id).await
    }

    /// Replace every field of candidate `id`.
    ///
    /// When the natural key changes (raw text differs or the calendar day
    /// differs), the update is a conflict if the new canonical key is already
    /// stored. The row being edited counts, so re-casing its own address is a
    /// conflict too.
    pub async fn update(&self, id: i64, candidate: &NewCandidate) -> Result<UpdateOutcome> {
        let Some(current) = self.store.get(id).await? else {
            return Ok(UpdateOutcome::NotFound);
        };

        let current_key = current.natural_key();
        let new_key = candidate.natural_key();

        if !new_key.same_raw_identity(&current_key) {
            let existing = self
                .resolver
                .existing_keys(std::slice::from_ref(&new_key))
                .await?;

            if !existing.is_empty() {
                tracing::info!(
                    candidate_id = id,
                    mail_id = %candidate.mail_id,
                    "Update rejected, canonical natural key already stored"
                );
                metrics::record_conflict("update");
                return Ok(UpdateOutcome::Conflict);
            }
        }

        let outcome = self.store.update(id, candidate).await?;
        match &outcome {
            UpdateOutcome::Updated(_) => tracing::info!(candidate_id = id, "Candidate updated"),
            UpdateOutcome::Conflict => metrics::record_conflict("update"),
            UpdateOutcome::NotFound => {}
        }
        Ok(outcome)
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            tracing::info!(candidate_id = id, "Candidate deleted");
        }
        Ok(deleted)
    }

    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }
}
