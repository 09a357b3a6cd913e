//! Candidate handlers

use crate::{db::UpdateOutcome, services::IngestReport, state::AppState, Error, Result};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use talentry_intake::{
    decode_upload, validate_batch, validate_request, CandidateRequest, NewCandidate,
    UploadFormat,
};

pub const REASON_FOR_SKIP: &str = "Duplicate MailId + SkillSet + AvailabilityDate";

#[derive(Debug, Default, Deserialize)]
pub struct BulkUploadQuery {
    /// `json` or `csv`; used when the Content-Type does not name a format.
    pub format: Option<String>,
}

fn parse_request(body: &Bytes) -> Result<NewCandidate> {
    let request: CandidateRequest = serde_json::from_slice(body)
        .map_err(|e| Error::Validation(vec![format!("Request body is invalid: {e}")]))?;
    validate_request(&request, None).map_err(Error::Validation)
}

fn errors_response(errors: Vec<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
}

/// POST /api/candidates
pub async fn create_candidate(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let candidate = match parse_request(&body) {
        Ok(candidate) => candidate,
        Err(Error::Validation(errors)) => return Ok(errors_response(errors)),
        Err(e) => return Err(e),
    };

    match state.candidate_service.create(&candidate).await? {
        Some(stored) => Ok((StatusCode::CREATED, Json(stored)).into_response()),
        None => Err(Error::DuplicateCandidate),
    }
}

/// GET /api/candidates/:id
pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let candidate = state
        .candidate_service
        .get(id)
        .await?
        .ok_or(Error::CandidateNotFound(id))?;

    Ok((StatusCode::OK, Json(candidate)).into_response())
}

/// PUT /api/candidates/:id
pub async fn update_candidate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Response> {
    let candidate = match parse_request(&body) {
        Ok(candidate) => candidate,
        Err(Error::Validation(errors)) => return Ok(errors_response(errors)),
        Err(e) => return Err(e),
    };

    match state.candidate_service.update(id, &candidate).await? {
        UpdateOutcome::Updated(stored) => Ok((StatusCode::OK, Json(stored)).into_response()),
        UpdateOutcome::NotFound => Err(Error::CandidateNotFound(id)),
        UpdateOutcome::Conflict => Err(Error::DuplicateCandidate),
    }
}

/// DELETE /api/candidates/:id
pub async fn delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response> {
    if state.candidate_service.delete(id).await? {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(Error::CandidateNotFound(id))
    }
}

/// POST /api/candidates/bulk
///
/// The request body is the uploaded file itself.
pub async fn bulk_upload(
    State(state): State<AppState>,
    Query(query): Query<BulkUploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    if body.is_empty() {
        return Err(Error::InvalidUpload("File is missing.".to_string()));
    }

    let format = upload_format(&headers, query.format.as_deref())?;
    let requests = decode_upload(format, &body)?;
    if requests.is_empty() {
        return Err(Error::InvalidUpload(
            "No candidates found in file.".to_string(),
        ));
    }

    let limit = state.config.ingest.max_batch_rows;
    if limit > 0 && requests.len() > limit {
        return Err(Error::BatchTooLarge {
            received: requests.len(),
            limit,
        });
    }

    let candidates = match validate_batch(&requests) {
        Ok(candidates) => candidates,
        Err(errors) => {
            tracing::info!(
                rows = requests.len(),
                invalid = errors.len(),
                "Bulk upload failed validation"
            );
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "message": "Validation failed for uploaded file.",
                    "errors": errors,
                })),
            )
                .into_response());
        }
    };

    let report = state.bulk_ingestor.ingest(&candidates).await?;

    Ok((StatusCode::OK, Json(bulk_summary(&report))).into_response())
}

/// Pick the upload format from Content-Type, falling back to `?format=`.
fn upload_format(headers: &HeaderMap, format: Option<&str>) -> Result<UploadFormat> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    if let Some(found) = content_type.and_then(UploadFormat::from_content_type) {
        return Ok(found);
    }
    if let Some(name) = format {
        return Ok(UploadFormat::from_name(name)?);
    }

    Err(Error::UnsupportedMediaType(
        content_type.unwrap_or("none").to_string(),
    ))
}

pub(crate) fn bulk_summary(report: &IngestReport) -> serde_json::Value {
    let mut body = json!({
        "totalReceived": report.total_received(),
        "inserted": report.inserted,
        "skipped": report.skipped,
        "timeTakenMs": report.elapsed_ms(),
    });
    if report.skipped > 0 {
        body["reasonForSkip"] = json!(REASON_FOR_SKIP);
    }
    body
}
