//! Authentication of Stripe webhook events.
//!
//! Stripe signs every webhook delivery. The `Stripe-Signature` header looks like
//! `t=1719830462,v1=5257a869e7ec...,v0=6ffbb59b2300...`. The `v1` entries are hex-encoded HMAC-SHA256 digests of
//! `"{t}.{raw body}"` keyed with the endpoint's signing secret. There may be more than one `v1` entry while a secret
//! is being rolled, and any one of them matching is sufficient.
//!
//! Verification works on the raw body bytes exactly as they arrived. Re-serializing a parsed body will almost
//! certainly change it and break the signature.
use std::str::FromStr;

use chrono::Utc;
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

use crate::{StripeApiError, StripeEvent};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";
/// Signatures stamped further than this into the future are rejected.
pub const MAX_CLOCK_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

impl FromStr for SignatureHeader {
    type Err = StripeApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in s.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| StripeApiError::MalformedSignatureHeader(format!("'{part}' is not a key=value pair")))?;
            match key {
                "t" => {
                    let t = value.parse::<i64>().map_err(|e| {
                        StripeApiError::MalformedSignatureHeader(format!("Invalid timestamp '{value}'. {e}"))
                    })?;
                    timestamp = Some(t);
                },
                "v1" => match hex::decode(value) {
                    Ok(sig) => signatures.push(sig),
                    Err(e) => debug!("🔐️ Ignoring non-hex v1 signature in webhook header. {e}"),
                },
                // v0 and any future schemes are ignored
                _ => {},
            }
        }
        let timestamp =
            timestamp.ok_or_else(|| StripeApiError::MalformedSignatureHeader("No timestamp in header".into()))?;
        if signatures.is_empty() {
            return Err(StripeApiError::MalformedSignatureHeader("No v1 signatures in header".into()));
        }
        Ok(Self { timestamp, signatures })
    }
}

fn new_mac(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, StripeApiError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| StripeApiError::Initialization(format!("Invalid webhook secret. {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Checks `header` against `payload`. `now` is the current unix time in seconds and `tolerance` the maximum age of the
/// signature in seconds (zero disables the age check).
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: i64,
    now: i64,
) -> Result<(), StripeApiError> {
    if secret.is_empty() {
        return Err(StripeApiError::MissingWebhookSecret);
    }
    let header = header.parse::<SignatureHeader>()?;
    let mac = new_mac(secret, header.timestamp, payload)?;
    // verify_slice does a constant-time comparison
    let matched = header.signatures.iter().any(|sig| mac.clone().verify_slice(sig).is_ok());
    if !matched {
        return Err(StripeApiError::SignatureMismatch);
    }
    let age = now - header.timestamp;
    if tolerance > 0 && age > tolerance {
        return Err(StripeApiError::TimestampOutsideTolerance { age, tolerance });
    }
    if age < -MAX_CLOCK_SKEW_SECS {
        return Err(StripeApiError::TimestampOutsideTolerance { age, tolerance });
    }
    Ok(())
}

/// Verifies the signature of a webhook delivery and, only if that succeeds, decodes the event.
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: i64,
) -> Result<StripeEvent, StripeApiError> {
    verify_signature(payload, header, secret, tolerance, Utc::now().timestamp())?;
    serde_json::from_slice(payload).map_err(|e| StripeApiError::JsonError(e.to_string()))
}

/// Produces a `Stripe-Signature` header value for `payload`. Useful for tests and replay tooling.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, StripeApiError> {
    let mac = new_mac(secret, timestamp, payload)?;
    let signature = hex::encode(mac.finalize().into_bytes());
    Ok(format!("t={timestamp},v1={signature}"))
}
