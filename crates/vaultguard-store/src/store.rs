//! Account Store: the single owner of all record storage.
//!
//! Guards hold no persistent state of their own. They borrow an
//! `AccountStore`, lock the slots a transition touches, validate, and
//! commit. The store lives for the hosting session and is shared by
//! reference (typically `Arc<AccountStore>`).
//!
//! ## Lock ordering
//!
//! Transitions that span several records lock them in this order, which
//! keeps concurrent transitions deadlock-free:
//!
//! ```text
//! nonce scope → order → reward ledger → accounts (ascending key)
//! ```

use vaultguard_types::{
    Account, AccountKey, NonceRecord, Order, OrderKey, ReplayScope, Result, RewardLedger, numeric,
};

use crate::table::{Table, Versioned};

/// Keyed storage for every record kind the guards operate on.
pub struct AccountStore {
    accounts: Table<AccountKey, Account>,
    orders: Table<OrderKey, Order>,
    ledgers: Table<AccountKey, RewardLedger>,
    nonces: Table<ReplayScope, NonceRecord>,
}

impl AccountStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: Table::new(),
            orders: Table::new(),
            ledgers: Table::new(),
            nonces: Table::new(),
        }
    }

    /// Snapshot of the account under `key`.
    ///
    /// # Errors
    /// Returns `NotFound` if no account was ever committed under `key`.
    pub fn get(&self, key: &AccountKey) -> Result<Account> {
        self.accounts.get(key).map(|v| v.record)
    }

    /// Snapshot including the commit version.
    pub fn get_versioned(&self, key: &AccountKey) -> Result<Versioned<Account>> {
        self.accounts.get(key)
    }

    /// Atomically replace the account under `key`. Returns the new version.
    pub fn put(&self, key: &AccountKey, account: Account) -> u64 {
        self.accounts.put(key, account)
    }

    /// Create an account unless an initialized one already exists.
    ///
    /// # Errors
    /// Returns `AlreadyExists` if an initialized record is present.
    pub fn create(&self, key: &AccountKey, initial: Account) -> Result<u64> {
        let version = self.accounts.create(key, initial)?;
        tracing::debug!(account = %key, version, "Account created");
        Ok(version)
    }

    /// Current commit version of an account (0 if absent).
    #[must_use]
    pub fn account_version(&self, key: &AccountKey) -> u64 {
        self.accounts.version(key)
    }

    /// Sum of every account balance, computed without wrapping.
    ///
    /// Used as a conservation check: transfers and fills move value between
    /// accounts, so only deposits and withdrawals may change this total.
    pub fn total_balance(&self) -> Result<u64> {
        numeric::checked_sum(
            self.accounts
                .snapshot()
                .into_iter()
                .map(|(_, v)| v.record.balance),
        )
    }

    #[must_use]
    pub fn accounts(&self) -> &Table<AccountKey, Account> {
        &self.accounts
    }

    #[must_use]
    pub fn orders(&self) -> &Table<OrderKey, Order> {
        &self.orders
    }

    #[must_use]
    pub fn ledgers(&self) -> &Table<AccountKey, RewardLedger> {
        &self.ledgers
    }

    #[must_use]
    pub fn nonces(&self) -> &Table<ReplayScope, NonceRecord> {
        &self.nonces
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}
