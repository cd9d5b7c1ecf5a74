//! HMAC-SHA256 signing and verification.
//!
//! Signatures are lowercase hex digests over a canonical string assembled by
//! the caller ([`crate::payload`] and [`crate::redirect`] define the field
//! order). Verification is constant-time via [`Mac::verify_slice`].

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// The presented signature does not match the recomputed digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("gateway signature mismatch")]
pub struct SignatureMismatch;

/// Sign a canonical string with the shared secret.
pub fn sign(secret: &str, canonical: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a hex signature against the canonical string.
///
/// Malformed hex fails the same way as a wrong digest; callers only learn
/// that the signature did not verify.
pub fn verify(secret: &str, canonical: &str, signature_hex: &str) -> Result<(), SignatureMismatch> {
    let presented = hex::decode(signature_hex).map_err(|_| SignatureMismatch)?;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(canonical.as_bytes());
    mac.verify_slice(&presented).map_err(|_| SignatureMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-gateway-secret";

    #[test]
    fn sign_matches_known_vector() {
        // Computed independently with `hmac`/`hashlib`.
        assert_eq!(
            sign(SECRET, "70000|GW-20250110-0042|BR-7f9c2d|success"),
            "7ba05187a9ace1b6e03e5c8442cd06832be57188670dfb23c9e226ecc6a20aca"
        );
    }

    #[test]
    fn sign_then_verify_roundtrip() {
        let canonical = "50000|GW-1|BR-1|success";
        let sig = sign(SECRET, canonical);
        assert!(verify(SECRET, canonical, &sig).is_ok());
    }

    #[test]
    fn verify_rejects_tampered_canonical() {
        let sig = sign(SECRET, "50000|GW-1|BR-1|success");
        assert_eq!(
            verify(SECRET, "99999|GW-1|BR-1|success", &sig),
            Err(SignatureMismatch)
        );
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let canonical = "50000|GW-1|BR-1|success";
        let sig = sign("other-secret", canonical);
        assert_eq!(verify(SECRET, canonical, &sig), Err(SignatureMismatch));
    }

    #[test]
    fn verify_rejects_malformed_hex() {
        assert_eq!(
            verify(SECRET, "50000|GW-1|BR-1|success", "not hex at all"),
            Err(SignatureMismatch)
        );
    }
}
