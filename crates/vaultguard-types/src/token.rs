//! # AuthorizationToken: single-use signed authorization
//!
//! A token authorizes one `action` on one account. It carries a nonce and a
//! validity window, and is signed by `signer` over its canonical payload.
//!
//! ## Security Properties
//!
//! - **Scope-bound**: the payload includes the account key and action, so a
//!   token for `withdraw` on account A is useless for anything else
//! - **Single-use**: the Replay Guard records the token id on consumption
//! - **Time-bound**: outside `[issued_at, expires_at)` the token is rejected.
//!   Timestamps are signed and compared at millisecond precision; anything
//!   finer is not part of the token
//! - **Signature-bound**: verified by an external collaborator; the core
//!   never implements the cryptography itself

use std::collections::HashSet;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountKey, Action, Identity, Record, TokenId, constants};

/// A signed, single-use authorization for `(account, action)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationToken {
    pub account: AccountKey,
    pub action: Action,
    /// Public key expected to have produced `signature`.
    pub signer: Identity,
    pub nonce: u64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Signature over [`AuthorizationToken::signing_payload`].
    pub signature: Vec<u8>,
}

impl AuthorizationToken {
    /// Canonical signing payload.
    ///
    /// Format: `"vaultguard:token:v1:" || account(32) || len(action)(4) || action || signer(32)
    /// || nonce(8) || issued_at_ms(8) || expires_at_ms(8)`, integers little-endian.
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        let action = self.action.as_str().as_bytes();
        let mut payload = Vec::with_capacity(128 + action.len());
        payload.extend_from_slice(constants::TOKEN_DOMAIN);
        payload.extend_from_slice(self.account.as_bytes());
        // Length prefix keeps "ab"+"c" and "a"+"bc" apart.
        payload.extend_from_slice(&u32::try_from(action.len()).unwrap_or(u32::MAX).to_le_bytes());
        payload.extend_from_slice(action);
        payload.extend_from_slice(self.signer.as_bytes());
        payload.extend_from_slice(&self.nonce.to_le_bytes());
        payload.extend_from_slice(&self.issued_at.timestamp_millis().to_le_bytes());
        payload.extend_from_slice(&self.expires_at.timestamp_millis().to_le_bytes());
        payload
    }

    /// Drop sub-millisecond precision from both timestamps, so the fields
    /// hold exactly what [`AuthorizationToken::signing_payload`] encodes.
    pub fn truncate_timestamps(&mut self) {
        self.issued_at = self.issued_at.trunc_subsecs(3);
        self.expires_at = self.expires_at.trunc_subsecs(3);
    }

    /// Replay-protection identity of this token.
    #[must_use]
    pub fn id(&self) -> TokenId {
        TokenId::of_payload(&self.signing_payload())
    }

    /// Is `now` inside `[issued_at, expires_at)`, in milliseconds?
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let now = now.timestamp_millis();
        self.issued_at.timestamp_millis() <= now && now < self.expires_at.timestamp_millis()
    }

    /// Length of the validity window, in whole milliseconds.
    #[must_use]
    pub fn lifetime(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(
            self.expires_at.timestamp_millis() - self.issued_at.timestamp_millis(),
        )
    }
}

/// Unit of replay protection: one `(account, action)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ReplayScope {
    pub account: AccountKey,
    pub action: Action,
}

impl ReplayScope {
    #[must_use]
    pub fn of(token: &AuthorizationToken) -> Self {
        Self {
            account: token.account,
            action: token.action.clone(),
        }
    }
}

impl std::fmt::Display for ReplayScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.account, self.action)
    }
}

/// Consumed tokens for one [`ReplayScope`].
///
/// Entries are never evicted: a consumed token stays rejected for the life
/// of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceRecord {
    pub consumed: HashSet<TokenId>,
    /// Highest nonce accepted so far (monotonic nonce mode).
    pub highest_nonce: Option<u64>,
}

impl NonceRecord {
    #[must_use]
    pub fn is_consumed(&self, token: &TokenId) -> bool {
        self.consumed.contains(token)
    }

    /// Would `nonce` be accepted under monotonic ordering?
    #[must_use]
    pub fn accepts_monotonic(&self, nonce: u64) -> bool {
        self.highest_nonce.is_none_or(|highest| nonce > highest)
    }

    pub fn record(&mut self, token: TokenId, nonce: u64) {
        self.consumed.insert(token);
        self.highest_nonce = Some(self.highest_nonce.map_or(nonce, |h| h.max(nonce)));
    }
}

impl Record for NonceRecord {
    const KIND: &'static str = "nonce_record";

    fn is_initialized(&self) -> bool {
        true
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl AuthorizationToken {
    /// Unsigned token valid for one hour from `issued_at`.
    pub fn dummy(account: AccountKey, action: &str, nonce: u64, issued_at: DateTime<Utc>) -> Self {
        let mut token = Self {
            account,
            action: Action::new(action),
            signer: Identity([0u8; 32]),
            nonce,
            issued_at,
            expires_at: issued_at + chrono::Duration::hours(1),
            signature: vec![0u8; 64],
        };
        token.truncate_timestamps();
        token
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn make_token() -> AuthorizationToken {
        AuthorizationToken::dummy(AccountKey([4u8; 32]), "withdraw", 1, Utc::now())
    }

    #[test]
    fn signing_payload_deterministic() {
        let token = make_token();
        assert_eq!(token.signing_payload(), token.signing_payload());
        assert_eq!(token.id(), token.id());
    }

    #[test]
    fn sub_millisecond_differences_are_not_part_of_the_token() {
        let t0 = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let mut a = AuthorizationToken::dummy(AccountKey([4u8; 32]), "withdraw", 1, t0);
        let mut b = a.clone();
        a.issued_at = t0 + Duration::microseconds(200);
        b.issued_at = t0 + Duration::microseconds(700);
        assert_eq!(a.id(), b.id());

        // Both agree on validity at every instant inside the shared millisecond.
        let now = t0 + Duration::microseconds(400);
        assert_eq!(a.is_valid_at(now), b.is_valid_at(now));
        assert!(a.is_valid_at(now));
        assert_eq!(a.lifetime(), b.lifetime());

        a.truncate_timestamps();
        b.truncate_timestamps();
        assert_eq!(a, b);
        assert_eq!(a.issued_at, t0);
        assert_eq!(a.issued_at.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn payload_binds_nonce_action_and_account() {
        let base = make_token();

        let mut other_nonce = base.clone();
        other_nonce.nonce = 2;
        assert_ne!(base.id(), other_nonce.id());

        let mut other_action = base.clone();
        other_action.action = Action::new("deposit");
        assert_ne!(base.id(), other_action.id());

        let mut other_account = base.clone();
        other_account.account = AccountKey([5u8; 32]);
        assert_ne!(base.id(), other_account.id());
    }

    #[test]
    fn signature_is_not_part_of_identity() {
        let base = make_token();
        let mut resigned = base.clone();
        resigned.signature = vec![1u8; 64];
        assert_eq!(base.id(), resigned.id());
    }

    #[test]
    fn validity_window_is_half_open() {
        let token = make_token();
        assert!(token.is_valid_at(token.issued_at));
        assert!(token.is_valid_at(token.issued_at + Duration::minutes(59)));
        assert!(!token.is_valid_at(token.expires_at));
        assert!(!token.is_valid_at(token.issued_at - Duration::seconds(1)));
        assert_eq!(token.lifetime(), Duration::hours(1));
    }

    #[test]
    fn nonce_record_tracks_consumption_and_high_water_mark() {
        let mut record = NonceRecord::default();
        let token = make_token();
        assert!(!record.is_consumed(&token.id()));
        assert!(record.accepts_monotonic(0));

        record.record(token.id(), 5);
        assert!(record.is_consumed(&token.id()));
        assert!(!record.accepts_monotonic(5));
        assert!(!record.accepts_monotonic(3));
        assert!(record.accepts_monotonic(6));

        // A lower nonce never lowers the high-water mark.
        record.record(TokenId([9u8; 32]), 2);
        assert_eq!(record.highest_nonce, Some(5));
    }

    #[test]
    fn scope_is_account_and_action() {
        let token = make_token();
        let scope = ReplayScope::of(&token);
        assert_eq!(scope.account, token.account);
        assert_eq!(scope.action, token.action);
    }
}
