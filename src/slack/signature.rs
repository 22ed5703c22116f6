//! Slack request signing (`v0` scheme).
//!
//! Slack signs every Events API delivery with
//! `v0=hex(HMAC-SHA256(signing_secret, "v0:" + timestamp + ":" + body))`
//! and sends the timestamp it used alongside. Verification checks the
//! timestamp window first, then compares signatures in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::errors::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// Signature scheme version prefix.
pub const VERSION: &str = "v0";

/// Header carrying the Unix timestamp the request was signed at.
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Header carrying the `v0=` signature.
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Compute the `v0=` signature Slack would send for `body` at `timestamp`.
///
/// # Errors
///
/// Returns [`SignatureError::Mismatch`] if the MAC cannot be keyed, which
/// HMAC only does for keys it cannot accept.
pub fn sign(secret: &[u8], timestamp: &str, body: &[u8]) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::Mismatch)?;
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(format!("{VERSION}={}", hex::encode(mac.finalize().into_bytes())))
}

/// Verify an inbound request against the shared signing secret.
///
/// `now` is the current Unix time in seconds; `tolerance_seconds` bounds the
/// allowed skew in either direction.
///
/// # Errors
///
/// Returns the [`SignatureError`] describing the first failed check.
pub fn verify(
    secret: &[u8],
    timestamp: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
    now: i64,
    tolerance_seconds: u64,
) -> Result<(), SignatureError> {
    let timestamp = timestamp
        .map(str::trim)
        .filter(|ts| !ts.is_empty())
        .ok_or(SignatureError::MissingTimestamp)?;
    let sent_at: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp)?;
    if now.abs_diff(sent_at) > tolerance_seconds {
        return Err(SignatureError::StaleTimestamp);
    }

    let provided = signature
        .map(str::trim)
        .filter(|sig| !sig.is_empty())
        .ok_or(SignatureError::MissingSignature)?;

    let expected = sign(secret, timestamp, body)?;
    if bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
