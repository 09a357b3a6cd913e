//! Candidate domain types

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::key::NaturalKey;

/// Primary skill level band.
///
/// Six ordinal bands, `P0` (entry) through `P5`. Parsing is case-insensitive,
/// the canonical spelling is upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SkillLevel {
    P0,
    P1,
    P2,
    P3,
    P4,
    P5,
}

impl SkillLevel {
    pub const ALL: [SkillLevel; 6] = [
        SkillLevel::P0,
        SkillLevel::P1,
        SkillLevel::P2,
        SkillLevel::P3,
        SkillLevel::P4,
        SkillLevel::P5,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::P0 => "P0",
            SkillLevel::P1 => "P1",
            SkillLevel::P2 => "P2",
            SkillLevel::P3 => "P3",
            SkillLevel::P4 => "P4",
            SkillLevel::P5 => "P5",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        SkillLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown skill level '{s}'"))
    }
}

impl TryFrom<String> for SkillLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SkillLevel> for String {
    fn from(level: SkillLevel) -> Self {
        level.as_str().to_string()
    }
}

/// A validated candidate that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCandidate {
    pub name: String,
    pub mail_id: String,
    pub skill_set: String,
    pub experience_months: i32,
    pub availability_date: NaiveDateTime,
    pub primary_skill_level: SkillLevel,
}

impl NewCandidate {
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(&self.mail_id, &self.skill_set, self.availability_date)
    }
}

/// A stored candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    pub mail_id: String,
    pub skill_set: String,
    pub experience_months: i32,
    pub availability_date: NaiveDateTime,
    pub primary_skill_level: SkillLevel,
}

impl Candidate {
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(&self.mail_id, &self.skill_set, self.availability_date)
    }
}

/// Candidate as submitted by a client, before validation.
///
/// Field names are camelCase on the wire; the PascalCase and all-lowercase
/// spellings are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRequest {
    #[serde(default, alias = "Name")]
    #[validate(custom(function = "crate::validation::name"))]
    pub name: String,

    #[serde(default, alias = "MailId", alias = "mailid")]
    #[validate(custom(function = "crate::validation::mail_id"))]
    pub mail_id: String,

    #[serde(default, alias = "SkillSet", alias = "skillset")]
    #[validate(custom(function = "crate::validation::skill_set"))]
    pub skill_set: String,

    #[serde(default, alias = "ExperienceMonths", alias = "experiencemonths")]
    #[validate(range(min = 0, message = "ExperienceMonths cannot be negative."))]
    pub experience_months: i32,

    #[serde(
        default,
        alias = "AvailabilityDate",
        alias = "availabilitydate",
        deserialize_with = "crate::decode::deserialize_availability"
    )]
    #[validate(required(message = "AvailabilityDate is required."))]
    pub availability_date: Option<NaiveDateTime>,

    #[serde(
        default = "default_skill_level",
        alias = "PrimarySkillLevel",
        alias = "primaryskilllevel"
    )]
    #[validate(custom(function = "crate::validation::skill_level"))]
    pub primary_skill_level: String,
}

pub(crate) fn default_skill_level() -> String {
    SkillLevel::P0.as_str().to_string()
}
