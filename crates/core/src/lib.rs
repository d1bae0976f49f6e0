#![allow(clippy::missing_errors_doc)]

pub use crate::errors::Error;
pub use crate::gate::{
    DEFAULT_SIGNATURE_HEADER, GateDecision, RawEvent, RejectReason, WebhookGate, event_type,
};
pub use crate::secret::SharedSecret;
pub use crate::signature::{SignatureVerifier, sign, verify};
pub use crate::token::{DEFAULT_TOKEN_HEADER, Strategy, TokenExtractor, VerificationToken};

mod errors;
mod gate;
mod secret;
mod signature;
mod token;
