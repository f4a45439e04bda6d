//! Initialization Guard: one-shot setup per key.
//!
//! Setup writes the record's `created_at` anchor. If setup could run twice,
//! a caller could reset the anchor (and with it every time-derived value,
//! such as reward accrual) whenever it suited them. The guard therefore
//! checks and writes the `initialized` flag under the key's slot lock:
//!
//! - no record, or an uninitialized placeholder → create, `initialized = true`
//! - initialized record → [`GuardError::AlreadyInitialized`], record untouched

use std::{fmt::Display, hash::Hash, marker::PhantomData};

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use vaultguard_store::{AccountStore, Table};
use vaultguard_types::{Account, AccountKey, GuardError, Identity, Record, Result, RewardLedger};

use crate::policy::{Policy, Secure};

/// One-shot setup for accounts and reward ledgers.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitGuard<P: Policy = Secure> {
    _policy: PhantomData<P>,
}

impl<P: Policy> InitGuard<P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _policy: PhantomData,
        }
    }

    /// Set up the reward ledger under `key` with `created_at = now`.
    ///
    /// # Errors
    /// - [`GuardError::AlreadyInitialized`] if the ledger is already set up
    pub fn initialize(
        &self,
        store: &AccountStore,
        owner: Identity,
        key: AccountKey,
        now: DateTime<Utc>,
    ) -> Result<RewardLedger> {
        setup::<P, _, _>(store.ledgers(), &key, RewardLedger::new(key, owner, now))
    }

    /// Set up the vault account under `key` with a zero balance.
    ///
    /// # Errors
    /// - [`GuardError::AlreadyInitialized`] if the account is already set up
    pub fn initialize_account(
        &self,
        store: &AccountStore,
        owner: Identity,
        key: AccountKey,
        now: DateTime<Utc>,
    ) -> Result<Account> {
        setup::<P, _, _>(store.accounts(), &key, Account::new(key, owner, now))
    }
}

fn setup<P, K, T>(table: &Table<K, T>, key: &K, fresh: T) -> Result<T>
where
    P: Policy,
    K: Eq + Hash + Ord + Clone + Display,
    T: Record,
{
    let slot = table.slot(key);
    let mut guard = slot.lock();

    if guard.current().is_some_and(|v| v.record.is_initialized()) {
        if !P::ALLOW_REINITIALIZE {
            warn!(kind = T::KIND, key = %key, "Repeated initialization rejected");
            return Err(GuardError::AlreadyInitialized(format!("{} {key}", T::KIND)));
        }
        warn!(
            kind = T::KIND,
            key = %key,
            policy = P::NAME,
            "Re-running setup over an initialized record"
        );
    }

    let version = guard.commit(fresh.clone());
    info!(kind = T::KIND, key = %key, version, "Record initialized");
    Ok(fresh)
}
