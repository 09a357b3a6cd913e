//! Database layer

pub mod candidates;
pub mod traits;

pub use candidates::{PostgresCandidateStore, EXISTING_KEYS_SQL};
pub use traits::{CandidateStore, UpdateOutcome};
