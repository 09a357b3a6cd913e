//! Natural-key canonicalization
//!
//! A candidate's business identity is the triple (contact address, skill set,
//! availability date). Two records are the same candidate when their canonical
//! keys are equal: both text fields are lowercased and the date is truncated to
//! the calendar day.
//!
//! The key is computed here and only here. The store persists it alongside the
//! raw columns and matches on it verbatim.

use chrono::{Datelike, NaiveDateTime};

/// Separator between the three key components.
///
/// It may occur inside a skill label or an address local part, but never in
/// an address domain, so the first separator after the last `@` always ends
/// the contact address.
pub const KEY_SEPARATOR: char = '|';

/// Accepted availability years. Keeps the date component at four digits.
pub const AVAILABILITY_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Build the canonical deduplication key for a natural-key triple.
pub fn canonical_key(mail_id: &str, skill_set: &str, availability: NaiveDateTime) -> String {
    let day = availability.date();
    format!(
        "{}{sep}{}{sep}{:04}-{:02}-{:02}",
        mail_id.to_lowercase(),
        skill_set.to_lowercase(),
        day.year(),
        day.month(),
        day.day(),
        sep = KEY_SEPARATOR
    )
}

/// Raw natural-key triple as stored, without any folding applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub mail_id: String,
    pub skill_set: String,
    pub availability_date: NaiveDateTime,
}

impl NaturalKey {
    pub fn new(mail_id: &str, skill_set: &str, availability_date: NaiveDateTime) -> Self {
        Self {
            mail_id: mail_id.to_string(),
            skill_set: skill_set.to_string(),
            availability_date,
        }
    }

    pub fn canonical(&self) -> String {
        canonical_key(&self.mail_id, &self.skill_set, self.availability_date)
    }

    /// True when `other` names the same raw triple at day granularity.
    ///
    /// Text is compared exactly (case-sensitive), the date by calendar day.
    pub fn same_raw_identity(&self, other: &NaturalKey) -> bool {
        self.mail_id == other.mail_id
            && self.skill_set == other.skill_set
            && self.availability_date.date() == other.availability_date.date()
    }
}
