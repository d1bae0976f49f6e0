use std::time::Duration;

use axum::extract::Request;
use hookgate_core::RawEvent;

use crate::errors::RequestError;

/// Buffers the whole body and captures it with its headers.
///
/// Nothing is parsed until every byte has arrived. A client that disconnects,
/// exceeds `limit` or is slower than `timeout` gets an error and no decision.
pub async fn capture_raw_event(
    request: Request,
    limit: usize,
    timeout: Duration,
) -> Result<RawEvent, RequestError> {
    let (parts, body) = request.into_parts();
    let bytes = tokio::time::timeout(timeout, axum::body::to_bytes(body, limit))
        .await
        .map_err(|_| RequestError::Timeout)?
        .map_err(RequestError::BodyRead)?;

    tracing::debug!("Captured body of {} bytes", bytes.len());
    Ok(RawEvent::capture(parts.headers, bytes))
}
