use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hookgate_core::GateDecision;

use crate::SharedState;
use crate::capture::capture_raw_event;
use crate::errors::RequestError;

pub async fn webhook_handler(
    State(state): State<SharedState>,
    request: Request,
) -> Result<Response, RequestError> {
    tracing::trace!("Path: {:?}", request.uri().path());
    let event = capture_raw_event(request, state.body_limit, state.read_timeout).await?;

    let response = match state.gate.evaluate(&event) {
        GateDecision::HandshakeAccept(token) if state.echo_token => {
            (StatusCode::OK, token.to_string()).into_response()
        }
        decision => decision.into_response(),
    };
    Ok(response)
}
