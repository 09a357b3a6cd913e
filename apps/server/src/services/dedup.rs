//! Duplicate resolver
//!
//! Decides which canonical keys of a set of candidates are already held by the
//! store. Keys are computed by [`talentry_intake::canonical_key`] and the store
//! matches its persisted copy verbatim. The canonical keys of returned rows
//! are intersected with the input keys here.

use std::collections::HashSet;
use std::sync::Arc;

use talentry_intake::NaturalKey;

use crate::{db::CandidateStore, Result};

#[derive(Clone)]
pub struct DuplicateResolver {
    store: Arc<dyn CandidateStore>,
}

impl DuplicateResolver {
    pub fn new(store: Arc<dyn CandidateStore>) -> Self {
        Self { store }
    }

    /// Canonical keys among `keys` that already exist in the store.
    ///
    /// An empty input never touches the store.
    pub async fn existing_keys(&self, keys: &[NaturalKey]) -> Result<HashSet<String>> {
        if keys.is_empty() {
            return Ok(HashSet::new());
        }

        let wanted: HashSet<String> = keys.iter().map(NaturalKey::canonical).collect();

        // One probe per distinct canonical key.
        let mut seen = HashSet::with_capacity(wanted.len());
        let probes: Vec<NaturalKey> = keys
            .iter()
            .filter(|key| seen.insert(key.canonical()))
            .cloned()
            .collect();

        let stored = self.store.find_key_rows(&probes).await?;

        let existing: HashSet<String> = stored
            .iter()
            .map(NaturalKey::canonical)
            .filter(|key| wanted.contains(key))
            .collect();

        tracing::debug!(
            probed = probes.len(),
            matched_rows = stored.len(),
            existing = existing.len(),
            "Resolved existing candidate keys"
        );

        Ok(existing)
    }
}
