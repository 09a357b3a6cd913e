//! Batch upload decoding
//!
//! Uploads arrive either as a JSON array of candidate objects or as
//! comma-separated text with a header line. Both decode into
//! [`CandidateRequest`] rows which are then validated separately.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

use crate::candidate::{default_skill_level, CandidateRequest};
use crate::error::{DecodeError, Result};
use crate::key::AVAILABILITY_YEARS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Json,
    Csv,
}

impl UploadFormat {
    /// Pick the format from a `Content-Type` header value.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/json" | "text/json" => Some(UploadFormat::Json),
            "text/csv" | "application/csv" => Some(UploadFormat::Csv),
            _ => None,
        }
    }

    /// Pick the format from a short name or file extension (`json`, `.csv`).
    pub fn from_name(name: &str) -> Result<Self> {
        let lowered = name.trim().trim_start_matches('.').to_ascii_lowercase();
        match lowered.as_str() {
            "json" => Ok(UploadFormat::Json),
            "csv" => Ok(UploadFormat::Csv),
            _ => Err(DecodeError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// Decode an uploaded document into candidate requests.
pub fn decode_upload(format: UploadFormat, body: &[u8]) -> Result<Vec<CandidateRequest>> {
    match format {
        UploadFormat::Json => decode_json(body),
        UploadFormat::Csv => decode_csv(body),
    }
}

fn decode_json(body: &[u8]) -> Result<Vec<CandidateRequest>> {
    Ok(serde_json::from_slice(body)?)
}

const COL_NAME: &str = "name";
const COL_MAIL_ID: &str = "mailid";
const COL_SKILL_SET: &str = "skillset";
const COL_EXPERIENCE: &str = "experiencemonths";
const COL_AVAILABILITY: &str = "availabilitydate";
const COL_SKILL_LEVEL: &str = "primaryskilllevel";

fn decode_csv(body: &[u8]) -> Result<Vec<CandidateRequest>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body);

    let columns: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(index, header)| (header.to_ascii_lowercase(), index))
        .collect();

    if columns.is_empty() || columns.keys().all(|h| h.is_empty()) {
        return Ok(Vec::new());
    }
    for required in [COL_EXPERIENCE, COL_AVAILABILITY] {
        if !columns.contains_key(required) {
            return Err(DecodeError::MissingColumn(required));
        }
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        // Header is line 1.
        let row = record
            .position()
            .map(|p| p.line())
            .unwrap_or(index as u64 + 2);

        let field = |column: &str| columns.get(column).and_then(|&i| record.get(i));

        let experience_months = field(COL_EXPERIENCE)
            .and_then(|v| v.parse::<i32>().ok())
            .ok_or(DecodeError::InvalidField {
                row,
                field: "ExperienceMonths",
            })?;
        let availability_date = field(COL_AVAILABILITY)
            .and_then(parse_availability)
            .ok_or(DecodeError::InvalidField {
                row,
                field: "AvailabilityDate",
            })?;

        rows.push(CandidateRequest {
            name: field(COL_NAME).unwrap_or_default().to_string(),
            mail_id: field(COL_MAIL_ID).unwrap_or_default().to_string(),
            skill_set: field(COL_SKILL_SET).unwrap_or_default().to_string(),
            experience_months,
            availability_date: Some(availability_date),
            primary_skill_level: field(COL_SKILL_LEVEL)
                .map(str::to_string)
                .unwrap_or_else(default_skill_level),
        });
    }

    Ok(rows)
}

/// Parse an availability date.
///
/// Accepts a bare calendar date, an ISO local date-time (`T` or space
/// separated, optional fractional seconds) or an RFC 3339 timestamp, which is
/// converted to UTC before its offset is dropped.
///
/// Fractional seconds are truncated to microseconds, the precision of a
/// PostgreSQL `TIMESTAMP`. Years outside 0001..=9999 are rejected.
pub fn parse_availability(value: &str) -> Option<NaiveDateTime> {
    parse_timestamp(value.trim())
        .map(|dt| dt.trunc_subsecs(6))
        .filter(|dt| AVAILABILITY_YEARS.contains(&dt.year()))
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).naive_utc())
}

pub(crate) fn deserialize_availability<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_availability(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid availability date '{s}'"))),
    }
}
