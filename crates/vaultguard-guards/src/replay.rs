//! Replay Guard: single-use authorization tokens.
//!
//! Replay protection is scoped per `(account, action)`. Inside a scope the
//! unit is the token id (hash of the canonical payload), so a token can be
//! consumed at most once no matter how many times it is presented.
//!
//! ## Consumption order
//!
//! ```text
//! validity window + max lifetime  → TokenExpired
//! signer is not the authority     → InvalidSignature
//! signature (verifier)            → InvalidSignature
//! ── lock nonce scope ─────────────────────────────
//! already consumed                → TokenReused
//! monotonic mode, nonce too low   → TokenReused
//! caller mutation                 → its error, nothing recorded
//! record consumption, commit
//! ```
//!
//! The scope lock is held across the check, the caller's mutation and the
//! record, so two concurrent consumptions of one token cannot both pass.
//!
//! A token only counts if it was signed by the authority the caller expects
//! for the scope (normally the account owner). A well-formed token signed by
//! any other key is rejected before it can touch the scope's nonce record.

use std::marker::PhantomData;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use vaultguard_store::AccountStore;
use vaultguard_types::{
    AuthorizationToken, GuardConfig, GuardError, Identity, NonceMode, ReplayScope, Result,
    TokenId,
};

use crate::{
    policy::{Policy, Secure},
    verifier::{Ed25519Verifier, SignatureVerifier},
};

/// Consumes authorization tokens at most once per scope.
#[derive(Debug, Clone)]
pub struct ReplayGuard<P: Policy = Secure, V: SignatureVerifier = Ed25519Verifier> {
    verifier: V,
    nonce_mode: NonceMode,
    max_lifetime: Duration,
    _policy: PhantomData<P>,
}

impl<P: Policy, V: SignatureVerifier> ReplayGuard<P, V> {
    #[must_use]
    pub fn new(verifier: V, nonce_mode: NonceMode, max_lifetime: Duration) -> Self {
        Self {
            verifier,
            nonce_mode,
            max_lifetime,
            _policy: PhantomData,
        }
    }

    #[must_use]
    pub fn from_config(config: &GuardConfig, verifier: V) -> Self {
        Self::new(verifier, config.nonce_mode, config.max_token_lifetime())
    }

    #[must_use]
    pub fn nonce_mode(&self) -> NonceMode {
        self.nonce_mode
    }

    /// Consume `token`, issued by `authority`, with no attached mutation.
    /// Returns its id.
    pub fn consume(
        &self,
        store: &AccountStore,
        token: &AuthorizationToken,
        authority: &Identity,
        now: DateTime<Utc>,
    ) -> Result<TokenId> {
        self.consume_with(store, token, authority, now, || Ok(()))?;
        Ok(token.id())
    }

    /// Consume `token` and run `mutation` in the same critical section.
    ///
    /// The token is recorded only if `mutation` succeeds, so either both
    /// the effect and the consumption commit or neither does.
    ///
    /// # Errors
    /// - [`GuardError::TokenExpired`] outside the validity window, or if the
    ///   window exceeds the configured maximum lifetime
    /// - [`GuardError::InvalidSignature`] if `token` was not signed by
    ///   `authority` or the verifier rejects it
    /// - [`GuardError::TokenReused`] if the token (or, in monotonic mode, a
    ///   nonce at least as high) was already consumed in this scope
    /// - any error returned by `mutation`
    pub fn consume_with<R, F>(
        &self,
        store: &AccountStore,
        token: &AuthorizationToken,
        authority: &Identity,
        now: DateTime<Utc>,
        mutation: F,
    ) -> Result<R>
    where
        F: FnOnce() -> Result<R>,
    {
        let id = token.id();
        if !token.is_valid_at(now) || token.lifetime() > self.max_lifetime {
            debug!(token = %id, "Token outside its validity window");
            return Err(GuardError::TokenExpired { token: id });
        }
        if token.signer != *authority {
            warn!(
                token = %id,
                signer = %token.signer,
                authority = %authority,
                "Token not issued by the expected authority"
            );
            return Err(GuardError::InvalidSignature {
                reason: format!(
                    "signed by {}, expected {}",
                    token.signer.short(),
                    authority.short()
                ),
            });
        }
        if let Err(err) = self.verifier.verify(token) {
            warn!(token = %id, signer = %token.signer, "Token signature rejected");
            return Err(err);
        }

        let scope = ReplayScope::of(token);
        if !P::TRACK_CONSUMED_TOKENS {
            let out = mutation()?;
            debug!(token = %id, scope = %scope, policy = P::NAME, "Token accepted untracked");
            return Ok(out);
        }

        // Only tokens from the scope's authority get this far.
        let slot = store.nonces().slot(&scope);
        let mut guard = slot.lock();
        let mut record = guard
            .current()
            .map(|v| v.record.clone())
            .unwrap_or_default();

        let stale =
            self.nonce_mode == NonceMode::Monotonic && !record.accepts_monotonic(token.nonce);
        if record.is_consumed(&id) || stale {
            warn!(
                token = %id,
                scope = %scope,
                nonce = token.nonce,
                "Replayed authorization token rejected"
            );
            return Err(GuardError::TokenReused {
                token: id,
                action: token.action.clone(),
            });
        }

        let out = mutation()?;

        record.record(id, token.nonce);
        guard.commit(record);
        debug!(token = %id, scope = %scope, policy = P::NAME, "Token consumed");
        Ok(out)
    }

    /// Has `token` been consumed in its scope?
    #[must_use]
    pub fn is_consumed(&self, store: &AccountStore, token: &AuthorizationToken) -> bool {
        store
            .nonces()
            .get(&ReplayScope::of(token))
            .is_ok_and(|v| v.record.is_consumed(&token.id()))
    }
}

impl<P: Policy> Default for ReplayGuard<P, Ed25519Verifier> {
    fn default() -> Self {
        Self::from_config(&GuardConfig::default(), Ed25519Verifier)
    }
}
