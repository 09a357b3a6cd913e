//! Prometheus exposition endpoint

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{metrics, Error, Result};

/// GET /metrics
pub async fn prometheus_metrics() -> Result<Response> {
    let body = metrics::gather().map_err(|e| Error::Internal(format!("metrics encoding: {e}")))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
