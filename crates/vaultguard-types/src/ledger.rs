//! Reward ledger records.
//!
//! Points accrue linearly with time since `created_at`. Because accrual is a
//! pure function of `(now - created_at)`, anyone able to rewrite
//! `created_at` can erase or inflate past accrual. That is exactly what a
//! repeatable `initialize` would allow, and why `created_at` is immutable
//! after the first successful setup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountKey, GuardError, Identity, Record, Result, numeric};

/// Time-based reward ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardLedger {
    pub key: AccountKey,
    pub owner: Identity,
    /// Anchor of all accrual. Written once.
    pub created_at: DateTime<Utc>,
    pub points: u64,
    pub initialized: bool,
}

impl RewardLedger {
    #[must_use]
    pub fn new(key: AccountKey, owner: Identity, now: DateTime<Utc>) -> Self {
        Self {
            key,
            owner,
            created_at: now,
            points: 0,
            initialized: true,
        }
    }

    /// Points this ledger has earned by `now` at `rate_per_sec`.
    pub fn accrued_at(&self, now: DateTime<Utc>, rate_per_sec: u64) -> Result<u64> {
        accrued_points(self.created_at, now, rate_per_sec)
    }
}

impl Record for RewardLedger {
    const KIND: &'static str = "reward_ledger";

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// `elapsed_secs * rate_per_sec`, computed without wrapping.
///
/// # Errors
/// - [`GuardError::TimestampRegression`] if `now` precedes `created_at`
/// - [`GuardError::ArithmeticOverflow`] if the product exceeds `u64::MAX`
pub fn accrued_points(
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    rate_per_sec: u64,
) -> Result<u64> {
    let elapsed = (now - created_at).num_seconds();
    let elapsed = u64::try_from(elapsed)
        .map_err(|_| GuardError::TimestampRegression { delta_secs: -elapsed })?;
    numeric::checked_mul(elapsed, rate_per_sec)
}
