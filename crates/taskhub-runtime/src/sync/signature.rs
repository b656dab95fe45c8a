//! Request signing for the sync endpoint.
//!
//! The header looks like `t=<unix seconds>&s=<hex hmac>`, where the HMAC is
//! SHA-256 over the raw body followed by the timestamp string. Keys may carry
//! a `signkey-<env>-` prefix that is not part of the secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "x-inngest-signature";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing signature header")]
    Missing,

    #[error("Malformed signature header")]
    Malformed,

    #[error("Signature has expired")]
    Expired,

    #[error("Invalid signature")]
    Mismatch,

    #[error("Invalid signing key")]
    InvalidKey,
}

fn strip_key_prefix(signing_key: &str) -> &str {
    signing_key
        .strip_prefix("signkey-")
        .and_then(|rest| rest.split_once('-'))
        .filter(|(env, _)| !env.is_empty() && env.chars().all(|c| c.is_alphanumeric() || c == '_'))
        .map(|(_, secret)| secret)
        .unwrap_or(signing_key)
}

fn mac_for(body: &[u8], signing_key: &str, ts: i64) -> Result<HmacSha256, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(strip_key_prefix(signing_key).as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    mac.update(body);
    mac.update(ts.to_string().as_bytes());
    Ok(mac)
}

/// Build a signature header value for `body` at `ts`.
pub fn sign(body: &[u8], signing_key: &str, ts: i64) -> Result<String, SignatureError> {
    let digest = mac_for(body, signing_key, ts)?.finalize().into_bytes();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    Ok(format!("t={}&s={}", ts, hex))
}

/// Check a signature header against `body`.
///
/// Signatures older than `max_age_secs` relative to `now` are rejected.
pub fn verify_signature(
    header: Option<&str>,
    body: &[u8],
    signing_key: &str,
    max_age_secs: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(SignatureError::Missing)?;

    let mut ts = None;
    let mut sig = None;
    for pair in header.split('&') {
        match pair.split_once('=') {
            Some(("t", v)) => ts = v.parse::<i64>().ok(),
            Some(("s", v)) => sig = decode_hex(v),
            _ => {}
        }
    }
    let (ts, sig) = ts.zip(sig).ok_or(SignatureError::Malformed)?;

    if now.checked_sub(ts).map_or(true, |age| age > max_age_secs) {
        return Err(SignatureError::Expired);
    }

    mac_for(body, signing_key, ts)?
        .verify_slice(&sig)
        .map_err(|_| SignatureError::Mismatch)
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.is_empty() || s.len() % 2 != 0 || !s.is_ascii() {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "signkey-test-8ee2262a15e8d3c42d6a840db7af3de2aab08ef632b32a37a687f24b34dba3ff";
    const BODY: &[u8] = br#"{"event":{"name":"clerk/user.created","data":{"id":"user_1"}}}"#;
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_sign_then_verify() {
        let header = sign(BODY, KEY, NOW).unwrap();
        assert!(header.starts_with("t=1700000000&s="));
        assert_eq!(verify_signature(Some(&header), BODY, KEY, 300, NOW + 10), Ok(()));
    }

    #[test]
    fn test_prefix_is_not_part_of_secret() {
        let bare = KEY.trim_start_matches("signkey-test-");
        assert_eq!(sign(BODY, KEY, NOW), sign(BODY, bare, NOW));
        assert_ne!(sign(BODY, KEY, NOW), sign(BODY, "other", NOW));
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let header = sign(BODY, KEY, NOW).unwrap();
        let err = verify_signature(Some(&header), b"{}", KEY, 300, NOW).unwrap_err();
        assert_eq!(err, SignatureError::Mismatch);
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let header = sign(BODY, "signkey-prod-abc", NOW).unwrap();
        let err = verify_signature(Some(&header), BODY, KEY, 300, NOW).unwrap_err();
        assert_eq!(err, SignatureError::Mismatch);
    }

    #[test]
    fn test_expired_signature() {
        let header = sign(BODY, KEY, NOW).unwrap();
        let err = verify_signature(Some(&header), BODY, KEY, 300, NOW + 301).unwrap_err();
        assert_eq!(err, SignatureError::Expired);
    }

    #[test]
    fn test_extreme_timestamp_is_expired() {
        let header = format!("t={}&s=00", i64::MIN);
        assert!(matches!(
            verify_signature(Some(&header), b"{}", "k", 300, NOW),
            Err(SignatureError::Expired)
        ));
    }

    #[test]
    fn test_missing_and_malformed_headers() {
        assert_eq!(
            verify_signature(None, BODY, KEY, 300, NOW),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verify_signature(Some(""), BODY, KEY, 300, NOW),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verify_signature(Some("t=abc&s=00"), BODY, KEY, 300, NOW),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_signature(Some("t=1700000000&s=zz"), BODY, KEY, 300, NOW),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_signature(Some("s=00ff"), BODY, KEY, 300, NOW),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("00ff10"), Some(vec![0x00, 0xff, 0x10]));
        assert_eq!(decode_hex("0"), None);
        assert_eq!(decode_hex(""), None);
    }
}
