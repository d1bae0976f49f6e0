use std::fmt::Display;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::{Error, SignatureVerifier, TokenExtractor, VerificationToken};

pub const DEFAULT_SIGNATURE_HEADER: &str = "x-notion-signature";
const UNKNOWN_EVENT: &str = "unknown";

/// A request exactly as it arrived: headers plus the untouched body bytes.
///
/// Signatures are computed over these bytes, so there is no way to replace
/// the body once captured.
#[derive(Clone, Debug)]
pub struct RawEvent {
    headers: HeaderMap,
    body: Bytes,
}

impl RawEvent {
    pub fn capture(headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    MissingSignature,
    SignatureMismatch,
    MissingSecret,
    InvalidSecret,
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::MissingSignature => write!(f, "missing signature"),
            RejectReason::SignatureMismatch => write!(f, "signature mismatch"),
            RejectReason::MissingSecret => write!(f, "no signing secret configured"),
            RejectReason::InvalidSecret => write!(f, "signing secret unusable"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    HandshakeAccept(VerificationToken),
    EventAccept(String),
    Reject(RejectReason),
}

impl IntoResponse for GateDecision {
    fn into_response(self) -> Response {
        match self {
            GateDecision::HandshakeAccept(_) | GateDecision::EventAccept(_) => {
                (StatusCode::OK, "ok").into_response()
            }
            // Same body for every reason.
            GateDecision::Reject(_) => (StatusCode::UNAUTHORIZED, "unauthorized").into_response(),
        }
    }
}

pub struct WebhookGate {
    extractor: TokenExtractor,
    verifier: SignatureVerifier,
    signature_header: HeaderName,
}

impl WebhookGate {
    pub fn new(extractor: TokenExtractor, verifier: SignatureVerifier) -> Self {
        Self {
            extractor,
            verifier,
            signature_header: HeaderName::from_static(DEFAULT_SIGNATURE_HEADER),
        }
    }

    pub fn with_signature_header(mut self, header: HeaderName) -> Self {
        self.signature_header = header;
        self
    }

    /// Handshake if a verification token is present, otherwise the signature
    /// decides. A handshake never touches the verifier.
    pub fn evaluate(&self, event: &RawEvent) -> GateDecision {
        match self.extractor.extract(event.headers(), event.body()) {
            Some(token) => {
                tracing::info!("Verification handshake received, token: {token}");
                GateDecision::HandshakeAccept(token)
            }
            None => self.check_signature(event),
        }
    }

    fn check_signature(&self, event: &RawEvent) -> GateDecision {
        let header = event.headers().get(&self.signature_header);
        // A present but non-ASCII header cannot match a hex digest.
        let signature = header.map(|v| v.to_str().unwrap_or_default());

        match self.verifier.verify(event.body(), signature) {
            Ok(true) => {
                let event_type = event_type(event.body());
                tracing::info!("Event accepted, type: {event_type}");
                GateDecision::EventAccept(event_type)
            }
            Ok(false) => {
                let reason = if signature.is_some() {
                    RejectReason::SignatureMismatch
                } else {
                    RejectReason::MissingSignature
                };
                tracing::warn!(
                    signature_present = signature.is_some(),
                    "Event rejected: {reason}"
                );
                GateDecision::Reject(reason)
            }
            Err(Error::MissingSecret) => {
                tracing::error!("Event rejected: no signing secret configured");
                GateDecision::Reject(RejectReason::MissingSecret)
            }
            Err(Error::InvalidSecret) => {
                tracing::error!("Event rejected: signing secret unusable as HMAC key");
                GateDecision::Reject(RejectReason::InvalidSecret)
            }
        }
    }
}

/// Best-effort event discriminator, preferring `event.type` over `type`.
pub fn event_type(raw_body: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<Value>(raw_body) else {
        return UNKNOWN_EVENT.to_string();
    };

    value
        .pointer("/event/type")
        .and_then(Value::as_str)
        .or_else(|| value.get("type").and_then(Value::as_str))
        .unwrap_or(UNKNOWN_EVENT)
        .to_string()
}
