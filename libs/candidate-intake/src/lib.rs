//! Candidate intake primitives
//!
//! Everything in this crate is pure: no database, no network. It provides
//!
//! - the candidate domain types shared by the server ([`candidate`])
//! - the natural-key canonicalization used for duplicate detection ([`key`])
//! - request validation with row-numbered messages ([`validation`])
//! - decoding of batch uploads in JSON or CSV form ([`decode`])

pub mod candidate;
pub mod decode;
pub mod error;
pub mod key;
pub mod validation;

pub use candidate::{Candidate, CandidateRequest, NewCandidate, SkillLevel};
pub use decode::{decode_upload, parse_availability, UploadFormat};
pub use error::{DecodeError, Result};
pub use key::{canonical_key, NaturalKey};
pub use validation::{validate_batch, validate_request};
