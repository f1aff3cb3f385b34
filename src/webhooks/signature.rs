use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header scheme: `t=<unix seconds>,v1=<hex hmac-sha256>`, where the MAC
/// covers `"{t}.{raw body}"`. Multiple `v1` entries are accepted (secret
/// rotation); any one match passes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed signature header")]
    Malformed,
    #[error("signed timestamp outside tolerance")]
    StaleTimestamp,
    #[error("signature mismatch")]
    Mismatch,
}

pub fn verify(
    secret: &str,
    header: &str,
    body: &[u8],
    now_unix: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = v.parse::<i64>().ok(),
            Some(("v1", v)) => {
                if let Ok(sig) = hex::decode(v) {
                    candidates.push(sig);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }
    if (now_unix - timestamp).abs() > tolerance_secs {
        return Err(SignatureError::StaleTimestamp);
    }

    for candidate in &candidates {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| SignatureError::Malformed)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        // verify_slice is constant-time
        if mac.verify_slice(candidate).is_ok() {
            return Ok(());
        }
    }
    Err(SignatureError::Mismatch)
}

#[cfg(test)]
pub(crate) fn sign(secret: &str, body: &[u8], timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test123secret456";
    const NOW: i64 = 1_756_300_000;

    #[test]
    fn valid_signature_is_accepted() {
        let body = br#"{"type":"checkout.completed"}"#;
        let header = sign(SECRET, body, NOW);
        assert_eq!(verify(SECRET, &header, body, NOW, 300), Ok(()));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let body = br#"{"type":"checkout.completed"}"#;
        let header = sign("wrong_secret", body, NOW);
        assert_eq!(
            verify(SECRET, &header, body, NOW, 300),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn tampered_body_is_rejected() {
        let original = br#"{"type":"checkout.completed"}"#;
        let tampered = br#"{"type":"checkout.completed","hacked":true}"#;
        let header = sign(SECRET, original, NOW);
        assert_eq!(
            verify(SECRET, &header, tampered, NOW, 300),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn stale_timestamp_is_rejected_even_with_valid_mac() {
        let body = br#"{}"#;
        let stale = NOW - 600;
        let header = sign(SECRET, body, stale);
        assert_eq!(
            verify(SECRET, &header, body, NOW, 300),
            Err(SignatureError::StaleTimestamp)
        );
    }

    #[test]
    fn future_timestamp_beyond_tolerance_is_rejected() {
        let body = br#"{}"#;
        let header = sign(SECRET, body, NOW + 600);
        assert_eq!(
            verify(SECRET, &header, body, NOW, 300),
            Err(SignatureError::StaleTimestamp)
        );
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let body = br#"{}"#;
        for header in [
            "",
            "v1=deadbeef",
            "t=not-a-number,v1=deadbeef",
            "t=123",
            "t=123,v1=not-hex!",
        ] {
            assert_eq!(
                verify(SECRET, header, body, NOW, 300),
                Err(SignatureError::Malformed),
                "header {header:?} should be malformed"
            );
        }
    }

    #[test]
    fn rotated_secret_second_v1_entry_passes() {
        let body = br#"{"id":"evt_1"}"#;
        let good = sign(SECRET, body, NOW);
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t={NOW},v1={},v1={good_sig}", "ab".repeat(32));
        assert_eq!(verify(SECRET, &header, body, NOW, 300), Ok(()));
    }
}
