//! Account records for the vault model.
//!
//! An account holds a single `u64` balance owned by one identity. Balances
//! only ever change through the Numeric Guard under the secure policy, so a
//! committed balance is never the product of wrap-around arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountKey, Identity, Record};

/// A balance-holding account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub key: AccountKey,
    /// Identity allowed to move funds and the subject of delegation checks.
    pub owner: Identity,
    pub balance: u64,
    /// When setup first ran. Never rewritten by the secure policy.
    pub created_at: DateTime<Utc>,
    /// Flips false → true exactly once per key.
    pub initialized: bool,
}

impl Account {
    /// A freshly initialized account with a zero balance.
    #[must_use]
    pub fn new(key: AccountKey, owner: Identity, now: DateTime<Utc>) -> Self {
        Self {
            key,
            owner,
            balance: 0,
            created_at: now,
            initialized: true,
        }
    }

    /// A zeroed, not-yet-initialized placeholder (an allocated but unset record).
    #[must_use]
    pub fn placeholder(key: AccountKey, owner: Identity) -> Self {
        Self {
            key,
            owner,
            balance: 0,
            created_at: DateTime::<Utc>::default(),
            initialized: false,
        }
    }

    #[must_use]
    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        self.owner == *identity
    }
}

impl Record for Account {
    const KIND: &'static str = "account";

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Account {
    /// An initialized account holding `balance`, keyed under the `vault` namespace.
    pub fn dummy(owner: Identity, balance: u64) -> Self {
        Self {
            key: AccountKey::derive(b"vault", &owner),
            owner,
            balance,
            created_at: Utc::now(),
            initialized: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_is_initialized_and_empty() {
        let owner = Identity([1u8; 32]);
        let key = AccountKey::derive(b"vault", &owner);
        let now = Utc::now();
        let acct = Account::new(key, owner, now);
        assert!(acct.is_initialized());
        assert_eq!(acct.balance, 0);
        assert_eq!(acct.created_at, now);
        assert!(acct.is_owned_by(&owner));
        assert!(!acct.is_owned_by(&Identity([2u8; 32])));
    }

    #[test]
    fn placeholder_is_not_initialized() {
        let owner = Identity([1u8; 32]);
        let acct = Account::placeholder(AccountKey::derive(b"vault", &owner), owner);
        assert!(!acct.is_initialized());
    }

    #[test]
    fn account_serde_roundtrip() {
        let acct = Account::dummy(Identity([3u8; 32]), 500);
        let json = serde_json::to_string(&acct).unwrap();
        let back: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(acct, back);
    }
}
