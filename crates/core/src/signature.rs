use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{Error, SharedSecret};

const SIGNATURE_PREFIX: &str = "sha256=";

/// Lower-case hex HMAC-SHA256 of `body` keyed by `secret`.
pub fn sign(secret: &SharedSecret, body: &[u8]) -> Result<String, Error> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.expose()).map_err(|_| Error::InvalidSecret)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks `signature` against the HMAC of `raw_body`.
///
/// A missing secret is a configuration error, never an implicit accept. A
/// missing signature is `Ok(false)`. The received value is trimmed, stripped
/// of an optional `sha256=` prefix and lower-cased before comparing.
pub fn verify(
    raw_body: &[u8],
    signature: Option<&str>,
    secret: Option<&SharedSecret>,
) -> Result<bool, Error> {
    let secret = secret
        .filter(|s| !s.is_empty())
        .ok_or(Error::MissingSecret)?;

    let Some(signature) = signature else {
        return Ok(false);
    };

    let expected = sign(secret, raw_body)?;
    let received = normalize(signature);

    // Length is public (always 64 hex chars), checking it up front reveals
    // nothing about how much of the digest matched.
    if received.len() != expected.len() {
        return Ok(false);
    }

    Ok(constant_time_eq::constant_time_eq(
        received.as_bytes(),
        expected.as_bytes(),
    ))
}

fn normalize(signature: &str) -> String {
    let signature = signature.trim();
    let signature = signature
        .get(..SIGNATURE_PREFIX.len())
        .filter(|p| p.eq_ignore_ascii_case(SIGNATURE_PREFIX))
        .map_or(signature, |_| &signature[SIGNATURE_PREFIX.len()..]);
    signature.to_ascii_lowercase()
}

/// Signature checker with its secret fixed at construction.
#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    secret: Option<SharedSecret>,
}

impl SignatureVerifier {
    pub fn new(secret: Option<SharedSecret>) -> Self {
        Self { secret }
    }

    pub fn verify(&self, raw_body: &[u8], signature: Option<&str>) -> Result<bool, Error> {
        verify(raw_body, signature, self.secret.as_ref())
    }
}
