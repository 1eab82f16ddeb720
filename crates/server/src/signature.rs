//! Webhook signature verification
//!
//! Header format: `t=<unix seconds>,v1=<hex hmac-sha256(secret, "<t>.<body>")>`

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "layercode-signature";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,

    #[error("malformed signature header")]
    Malformed,

    #[error("signature timestamp outside tolerance")]
    Expired,

    #[error("signature mismatch")]
    Mismatch,
}

struct ParsedHeader<'a> {
    timestamp: &'a str,
    digest: Vec<u8>,
}

fn parse_header(header: &str) -> Result<ParsedHeader<'_>, SignatureError> {
    let mut timestamp = None;
    let mut digest = None;

    for part in header.split(',') {
        let (key, value) = part.trim().split_once('=').ok_or(SignatureError::Malformed)?;
        match key.trim() {
            "t" => timestamp = Some(value.trim()),
            "v1" => digest = Some(value.trim()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    let digest = digest.ok_or(SignatureError::Malformed)?;
    let digest = hex::decode(digest).map_err(|_| SignatureError::Malformed)?;

    Ok(ParsedHeader { timestamp, digest })
}

fn mac_for(secret: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Mismatch)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac)
}

/// Check a signature header against the raw request body
///
/// `now` is unix seconds. Timestamps further than `tolerance_secs` from it in
/// either direction are rejected.
pub fn verify_signature(
    header: Option<&str>,
    body: &[u8],
    secret: &str,
    tolerance_secs: u64,
    now: i64,
) -> Result<(), SignatureError> {
    let parsed = parse_header(header.ok_or(SignatureError::Missing)?)?;

    let signed_at: i64 = parsed
        .timestamp
        .parse()
        .map_err(|_| SignatureError::Malformed)?;
    if now.abs_diff(signed_at) > tolerance_secs {
        return Err(SignatureError::Expired);
    }

    mac_for(secret, parsed.timestamp, body)?
        .verify_slice(&parsed.digest)
        .map_err(|_| SignatureError::Mismatch)
}

/// Build a signature header value for `body`
pub fn sign_payload(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let t = timestamp.to_string();
    let digest = match mac_for(secret, &t, body) {
        Ok(mac) => hex::encode(mac.finalize().into_bytes()),
        Err(_) => String::new(),
    };
    format!("t={},v1={}", t, digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"type":"message","session_id":"s1","text":"hi"}"#;

    #[test]
    fn test_valid_signature() {
        let header = sign_payload(SECRET, 1_700_000_000, BODY);
        assert!(header.starts_with("t=1700000000,v1="));
        assert_eq!(
            verify_signature(Some(&header), BODY, SECRET, 300, 1_700_000_100),
            Ok(())
        );
    }

    #[test]
    fn test_tampered_body_or_secret() {
        let header = sign_payload(SECRET, 1_700_000_000, BODY);
        assert_eq!(
            verify_signature(Some(&header), b"{}", SECRET, 300, 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            verify_signature(Some(&header), BODY, "other", 300, 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_expired_signature() {
        let header = sign_payload(SECRET, 1_700_000_000, BODY);
        assert_eq!(
            verify_signature(Some(&header), BODY, SECRET, 300, 1_700_000_301),
            Err(SignatureError::Expired)
        );
        assert_eq!(
            verify_signature(Some(&header), BODY, SECRET, 300, 1_699_999_000),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn test_malformed_headers() {
        assert_eq!(
            verify_signature(None, BODY, SECRET, 300, 0),
            Err(SignatureError::Missing)
        );
        for header in ["", "t=1", "v1=abcd", "t=abc,v1=00", "t=1,v1=zz", "garbage"] {
            assert_eq!(
                verify_signature(Some(header), BODY, SECRET, 300, 1),
                Err(SignatureError::Malformed),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn test_header_order_and_spacing() {
        let header = sign_payload(SECRET, 42, BODY);
        let (t, v1) = header.split_once(',').unwrap();
        let reordered = format!("{} , {}", v1, t);
        assert!(verify_signature(Some(&reordered), BODY, SECRET, 300, 42).is_ok());
    }
}
