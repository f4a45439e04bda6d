//! Time-based reward ledgers.
//!
//! Points are a pure function of `now - created_at`. A claim overwrites
//! `points` with the accrued total rather than adding to it, so claiming
//! twice at the same instant yields the same value and no interval is ever
//! counted twice.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use tracing::debug;
use vaultguard_store::AccountStore;
use vaultguard_types::{
    AccountKey, GuardError, Identity, Result, RewardLedger, constants, ledger,
};

use crate::{
    init::InitGuard,
    policy::{Policy, Secure},
};

/// Reward ledger operations at a fixed accrual rate.
#[derive(Debug, Clone, Copy)]
pub struct Rewards<P: Policy = Secure> {
    rate_per_sec: u64,
    _policy: PhantomData<P>,
}

impl<P: Policy> Rewards<P> {
    #[must_use]
    pub fn new(rate_per_sec: u64) -> Self {
        Self {
            rate_per_sec,
            _policy: PhantomData,
        }
    }

    #[must_use]
    pub fn rate_per_sec(&self) -> u64 {
        self.rate_per_sec
    }

    /// Set up the ledger for `owner` (one-shot under [`Secure`]).
    pub fn initialize(
        &self,
        store: &AccountStore,
        owner: Identity,
        key: AccountKey,
        now: DateTime<Utc>,
    ) -> Result<RewardLedger> {
        InitGuard::<P>::new().initialize(store, owner, key, now)
    }

    /// Points the ledger has earned by `now`, without committing anything.
    pub fn accrued(&self, store: &AccountStore, key: &AccountKey, now: DateTime<Utc>) -> Result<u64> {
        let ledger = store.ledgers().get(key)?.record;
        ledger::accrued_points(ledger.created_at, now, self.rate_per_sec)
    }

    /// Bring `points` up to the accrued total at `now`. Returns the new total.
    ///
    /// # Errors
    /// - [`GuardError::NotFound`] if the ledger was never initialized
    /// - [`GuardError::Unauthorized`] if `caller` does not own the ledger
    /// - [`GuardError::TimestampRegression`] if `now` is earlier than the
    ///   anchor or than the instant the stored total was claimed at
    pub fn claim(
        &self,
        store: &AccountStore,
        caller: &Identity,
        key: &AccountKey,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let slot = store.ledgers().existing_slot(key)?;
        let mut guard = slot.lock();
        let mut ledger = guard.staged()?;
        if !ledger.initialized {
            return Err(GuardError::NotFound(format!("reward_ledger {key}")));
        }
        if ledger.owner != *caller {
            return Err(GuardError::Unauthorized {
                reason: format!("{} does not own ledger {key}", caller.short()),
            });
        }

        let accrued = ledger::accrued_points(ledger.created_at, now, self.rate_per_sec)?;
        if accrued < ledger.points {
            let behind = (ledger.points - accrued) / self.rate_per_sec.max(1);
            return Err(GuardError::TimestampRegression {
                delta_secs: i64::try_from(behind).unwrap_or(i64::MAX),
            });
        }

        ledger.points = accrued;
        let version = guard.commit(ledger);
        debug!(ledger = %key, points = accrued, version, "Rewards claimed");
        Ok(accrued)
    }
}

impl<P: Policy> Default for Rewards<P> {
    fn default() -> Self {
        Self::new(constants::DEFAULT_REWARD_RATE_PER_SEC)
    }
}
