//! Signature verification collaborator for the Replay Guard.
//!
//! The guards never implement cryptography. They ask a
//! [`SignatureVerifier`] whether a token's signature is valid for its
//! `signer` over [`AuthorizationToken::signing_payload`]. [`Ed25519Verifier`]
//! is the default implementation.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use vaultguard_types::{AuthorizationToken, GuardError, Identity, Result};

/// Checks token signatures.
pub trait SignatureVerifier: Send + Sync {
    /// # Errors
    /// Returns [`GuardError::InvalidSignature`] if the signature does not verify.
    fn verify(&self, token: &AuthorizationToken) -> Result<()>;
}

/// Strict ed25519 verification. `signer` is the verifying key bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, token: &AuthorizationToken) -> Result<()> {
        let key = VerifyingKey::from_bytes(token.signer.as_bytes()).map_err(|_| {
            GuardError::InvalidSignature {
                reason: format!("signer {} is not a valid ed25519 key", token.signer.short()),
            }
        })?;
        let signature =
            Signature::from_slice(&token.signature).map_err(|_| GuardError::InvalidSignature {
                reason: format!("signature must be 64 bytes, got {}", token.signature.len()),
            })?;
        key.verify_strict(&token.signing_payload(), &signature)
            .map_err(|_| GuardError::InvalidSignature {
                reason: format!("signature does not verify for {}", token.signer.short()),
            })
    }
}

/// Set `token.signer` to `key`'s public half and sign the token.
///
/// Timestamps are truncated to milliseconds first, the precision the
/// signature covers.
pub fn sign_token(key: &SigningKey, token: &mut AuthorizationToken) {
    token.truncate_timestamps();
    token.signer = Identity::from_pubkey(key.verifying_key().to_bytes());
    token.signature = key.sign(&token.signing_payload()).to_bytes().to_vec();
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use vaultguard_types::AccountKey;

    use super::*;

    fn signed(seed: u8) -> AuthorizationToken {
        let key = SigningKey::from_bytes(&[seed; 32]);
        let mut token = AuthorizationToken::dummy(AccountKey([1u8; 32]), "withdraw", 1, Utc::now());
        sign_token(&key, &mut token);
        token
    }

    #[test]
    fn valid_signature_accepted() {
        assert!(Ed25519Verifier.verify(&signed(7)).is_ok());
    }

    #[test]
    fn signing_truncates_timestamps_to_millis() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let mut token = signed(7);
        token.issued_at += Duration::microseconds(1_500);
        token.expires_at += Duration::nanoseconds(999);
        sign_token(&key, &mut token);

        assert_eq!(token.issued_at.timestamp_subsec_nanos() % 1_000_000, 0);
        assert_eq!(token.expires_at.timestamp_subsec_nanos() % 1_000_000, 0);
        assert!(Ed25519Verifier.verify(&token).is_ok());
    }

    #[test]
    fn tampered_payload_rejected() {
        let mut token = signed(7);
        token.nonce += 1;
        assert!(matches!(
            Ed25519Verifier.verify(&token),
            Err(GuardError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn foreign_signer_rejected() {
        let mut token = signed(7);
        token.signature = signed(8).signature;
        assert!(Ed25519Verifier.verify(&token).is_err());
    }

    #[test]
    fn malformed_signature_rejected() {
        let mut token = signed(7);
        token.signature.truncate(10);
        let err = Ed25519Verifier.verify(&token).unwrap_err();
        assert!(err.to_string().contains("64 bytes"));
    }
}
