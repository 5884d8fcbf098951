//! Forge webhook signature verification (spec §1: "the source-forge webhook
//! surface" is named plumbing outside the core, but the full engine needs it
//! to actually receive events). HMAC-SHA256 over the raw request body,
//! compared in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Verifies a `sha256=<hex>`-style signature header (the convention shared by
/// GitHub and GitLab forge webhooks) against `body` using `secret`.
pub fn verify_forge_signature(secret: &str, body: &[u8], signature_header: &str) -> bool {
    let Some(hex_sig) = signature_header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let computed = mac.finalize().into_bytes();

    computed.ct_eq(&expected).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn matching_signature_verifies() {
        let body = b"{\"action\":\"opened\"}";
        let sig = sign("s3cret", body);
        assert!(verify_forge_signature("s3cret", body, &sig));
    }

    #[test]
    fn wrong_secret_fails() {
        let body = b"{\"action\":\"opened\"}";
        let sig = sign("s3cret", body);
        assert!(!verify_forge_signature("other", body, &sig));
    }

    #[test]
    fn malformed_header_fails_closed() {
        assert!(!verify_forge_signature("s3cret", b"{}", "not-a-signature"));
    }
}
