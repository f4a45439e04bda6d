//! Identifiers used throughout VaultGuard.
//!
//! Identities and program ids are raw 32-byte public keys. Account keys are
//! derived deterministically from a namespace and an owner, so the same
//! `(namespace, owner)` pair always addresses the same record. Orders use
//! UUIDv7 for time-ordered sorting.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::constants;

fn digest32(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// An authenticated principal. This is the raw ed25519 public key (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Identity(pub [u8; 32]);

impl Identity {
    #[must_use]
    pub fn from_pubkey(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// AccountKey
// ---------------------------------------------------------------------------

/// Stable key of an account or reward ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountKey(pub [u8; 32]);

impl AccountKey {
    /// Derive the key owned by `owner` within `namespace` (e.g. `b"vault"`).
    ///
    /// Two derivations with the same inputs always yield the same key, which
    /// is what makes a second `initialize` land on the existing record.
    #[must_use]
    pub fn derive(namespace: &[u8], owner: &Identity) -> Self {
        Self(digest32(&[
            constants::ACCOUNT_KEY_DOMAIN,
            namespace,
            b":",
            owner.as_bytes(),
        ]))
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// OrderKey
// ---------------------------------------------------------------------------

/// Globally unique order key. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderKey(pub Uuid);

impl OrderKey {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for OrderKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ProgramId
// ---------------------------------------------------------------------------

/// Identity of a delegated-call target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ProgramId(pub [u8; 32]);

impl ProgramId {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Deterministic program id from a human-readable name. Handy for
    /// configuration files and fixtures.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(digest32(&[constants::PROGRAM_ID_DOMAIN, name.as_bytes()]))
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prog:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// TokenId
// ---------------------------------------------------------------------------

/// Identity of an authorization token: SHA-256 of its canonical payload.
///
/// The signature is deliberately not part of the id, so a re-encoded
/// signature over the same payload is still the same token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TokenId(pub [u8; 32]);

impl TokenId {
    #[must_use]
    pub fn of_payload(payload: &[u8]) -> Self {
        Self(digest32(&[payload]))
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tok:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Name of the authorized action a token is bound to (e.g. `"withdraw"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Action(pub String);

impl Action {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_key_derivation_is_deterministic() {
        let owner = Identity([7u8; 32]);
        assert_eq!(
            AccountKey::derive(b"vault", &owner),
            AccountKey::derive(b"vault", &owner)
        );
    }

    #[test]
    fn account_key_separates_namespaces_and_owners() {
        let alice = Identity([1u8; 32]);
        let bob = Identity([2u8; 32]);
        assert_ne!(
            AccountKey::derive(b"vault", &alice),
            AccountKey::derive(b"rewards", &alice)
        );
        assert_ne!(
            AccountKey::derive(b"vault", &alice),
            AccountKey::derive(b"vault", &bob)
        );
    }

    #[test]
    fn order_keys_are_unique() {
        let a = OrderKey::new();
        let b = OrderKey::new();
        assert_ne!(a, b);
    }

    #[test]
    fn program_id_from_name() {
        assert_eq!(ProgramId::from_name("oracle"), ProgramId::from_name("oracle"));
        assert_ne!(ProgramId::from_name("oracle"), ProgramId::from_name("attacker"));
    }

    #[test]
    fn display_prefixes() {
        assert!(Identity([0u8; 32]).to_string().starts_with("id:"));
        assert!(AccountKey([0u8; 32]).to_string().starts_with("acct:"));
        assert!(ProgramId([0u8; 32]).to_string().starts_with("prog:"));
        assert!(TokenId([0u8; 32]).to_string().starts_with("tok:"));
        assert_eq!(Action::new("withdraw").to_string(), "withdraw");
    }

    #[test]
    fn serde_roundtrips() {
        let key = AccountKey::derive(b"vault", &Identity([9u8; 32]));
        let json = serde_json::to_string(&key).unwrap();
        let back: AccountKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, back);

        let order = OrderKey::new();
        let json = serde_json::to_string(&order).unwrap();
        let back: OrderKey = serde_json::from_str(&json).unwrap();
        assert_eq!(order, back);
    }
}
