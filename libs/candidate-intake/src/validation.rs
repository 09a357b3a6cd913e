//! Request validation
//!
//! Turns a [`CandidateRequest`] into a [`NewCandidate`] or a list of
//! human-readable messages. Batch uploads prefix every message with the
//! 1-based row number (`Row 3: Name is required.`).

use std::borrow::Cow;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::candidate::{CandidateRequest, NewCandidate, SkillLevel};

/// Order in which field messages are reported.
const FIELD_ORDER: [&str; 6] = [
    "name",
    "mail_id",
    "skill_set",
    "experience_months",
    "availability_date",
    "primary_skill_level",
];

pub(crate) fn name(value: &str) -> Result<(), ValidationError> {
    required(value, "Name is required.")
}

pub(crate) fn skill_set(value: &str) -> Result<(), ValidationError> {
    required(value, "SkillSet is required.")
}

pub(crate) fn mail_id(value: &str) -> Result<(), ValidationError> {
    required(value, "MailId is required.")?;
    if !value.validate_email() {
        return Err(error("email", "MailId must be a valid email address."));
    }
    Ok(())
}

pub(crate) fn skill_level(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<SkillLevel>()
        .map(|_| ())
        .map_err(|_| error("skill_level", "PrimarySkillLevel must be P0-P5."))
}

fn required(value: &str, message: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("required", message));
    }
    Ok(())
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

fn collect_messages(errors: &ValidationErrors) -> Vec<String> {
    let fields = errors.field_errors();
    let mut messages = Vec::new();
    for field in FIELD_ORDER {
        let Some(field_errors) = fields.get(field) else {
            continue;
        };
        for err in field_errors.iter() {
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{field} is invalid ({}).", err.code));
            messages.push(message);
        }
    }
    messages
}

/// Validate a single request.
///
/// `row` is the 1-based position inside a batch upload; `None` for a
/// single-record submission.
pub fn validate_request(
    request: &CandidateRequest,
    row: Option<usize>,
) -> Result<NewCandidate, Vec<String>> {
    let prefix = row.map(|n| format!("Row {n}: ")).unwrap_or_default();

    let mut messages = match request.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => collect_messages(&errors),
    };

    let level = request.primary_skill_level.parse::<SkillLevel>().ok();
    if let (Some(availability_date), Some(primary_skill_level), true) =
        (request.availability_date, level, messages.is_empty())
    {
        return Ok(NewCandidate {
            name: request.name.clone(),
            mail_id: request.mail_id.clone(),
            skill_set: request.skill_set.clone(),
            experience_months: request.experience_months,
            availability_date,
            primary_skill_level,
        });
    }

    if messages.is_empty() {
        messages.push("Candidate is invalid.".to_string());
    }
    Err(messages
        .into_iter()
        .map(|m| format!("{prefix}{m}"))
        .collect())
}

/// Validate every row of a batch, collecting all messages.
///
/// Succeeds only if every row is valid.
pub fn validate_batch(requests: &[CandidateRequest]) -> Result<Vec<NewCandidate>, Vec<String>> {
    let mut accepted = Vec::with_capacity(requests.len());
    let mut messages = Vec::new();

    for (index, request) in requests.iter().enumerate() {
        match validate_request(request, Some(index + 1)) {
            Ok(candidate) => accepted.push(candidate),
            Err(errs) => messages.extend(errs),
        }
    }

    if messages.is_empty() {
        Ok(accepted)
    } else {
        Err(messages)
    }
}
