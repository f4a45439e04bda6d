//! Vault operations: owner-checked deposits, withdrawals, and transfers.
//!
//! All balance arithmetic goes through the policy. Under [`Secure`] that is
//! the Numeric Guard, so a rejected operation leaves the balance exactly as
//! it was. Under [`Insecure`](crate::policy::Insecure) it wraps.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use vaultguard_store::{AccountStore, SlotGuard};
use vaultguard_types::{Account, AccountKey, GuardError, Identity, Result};

use crate::{
    init::InitGuard,
    policy::{Policy, Secure},
};

/// Balance-holding accounts with owner checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vault<P: Policy = Secure> {
    _policy: PhantomData<P>,
}

impl<P: Policy> Vault<P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _policy: PhantomData,
        }
    }

    /// Open an account for `owner` under `key` (one-shot).
    ///
    /// # Errors
    /// - [`GuardError::AlreadyInitialized`] if the account already exists
    pub fn open(
        &self,
        store: &AccountStore,
        owner: Identity,
        key: AccountKey,
        now: DateTime<Utc>,
    ) -> Result<Account> {
        InitGuard::<P>::new().initialize_account(store, owner, key, now)
    }

    /// Current balance of `key`.
    pub fn balance(&self, store: &AccountStore, key: &AccountKey) -> Result<u64> {
        let slot = store.accounts().existing_slot(key)?;
        let guard = slot.lock();
        live_account(&guard).map(|a| a.balance)
    }

    /// Credit `amount` to the caller's account. Returns the new balance.
    ///
    /// # Errors
    /// - [`GuardError::NotFound`] if the account was never opened
    /// - [`GuardError::Unauthorized`] if `caller` is not the owner
    /// - [`GuardError::ArithmeticOverflow`] if the balance would exceed `u64::MAX`
    pub fn deposit(
        &self,
        store: &AccountStore,
        caller: &Identity,
        key: &AccountKey,
        amount: u64,
    ) -> Result<u64> {
        let slot = store.accounts().existing_slot(key)?;
        let mut guard = slot.lock();
        let mut account = live_account(&guard)?;
        ensure_owner(&account, caller)?;

        account.balance = P::add(account.balance, amount)?;
        let balance = account.balance;
        let version = guard.commit(account);
        debug!(account = %key, amount, balance, version, "Deposit committed");
        Ok(balance)
    }

    /// Debit `amount` from the caller's account. Returns the new balance.
    ///
    /// # Errors
    /// - [`GuardError::NotFound`] if the account was never opened
    /// - [`GuardError::Unauthorized`] if `caller` is not the owner
    /// - [`GuardError::ArithmeticUnderflow`] if `amount` exceeds the balance
    pub fn withdraw(
        &self,
        store: &AccountStore,
        caller: &Identity,
        key: &AccountKey,
        amount: u64,
    ) -> Result<u64> {
        let slot = store.accounts().existing_slot(key)?;
        let mut guard = slot.lock();
        let mut account = live_account(&guard)?;
        ensure_owner(&account, caller)?;

        account.balance = P::sub(account.balance, amount)?;
        let balance = account.balance;
        let version = guard.commit(account);
        debug!(account = %key, amount, balance, version, "Withdrawal committed");
        Ok(balance)
    }

    /// Move `amount` from `from` (owned by `caller`) to `to`.
    ///
    /// Both accounts are locked in key order and committed together. A
    /// transfer to the same account is a successful no-op.
    pub fn transfer(
        &self,
        store: &AccountStore,
        caller: &Identity,
        from: &AccountKey,
        to: &AccountKey,
        amount: u64,
    ) -> Result<()> {
        if from == to {
            let slot = store.accounts().existing_slot(from)?;
            let guard = slot.lock();
            let account = live_account(&guard)?;
            return ensure_owner(&account, caller);
        }

        let slots = store.accounts().existing_slots_sorted(&[*from, *to])?;
        let mut first = slots[0].lock();
        let mut second = slots[1].lock();
        let (src_guard, dst_guard) = if first.key() == from {
            (&mut first, &mut second)
        } else {
            (&mut second, &mut first)
        };

        let mut src = live_account(src_guard)?;
        let mut dst = live_account(dst_guard)?;
        ensure_owner(&src, caller)?;

        src.balance = P::sub(src.balance, amount)?;
        dst.balance = P::add(dst.balance, amount)?;

        src_guard.commit(src);
        dst_guard.commit(dst);
        debug!(from = %from, to = %to, amount, "Transfer committed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shared account checks
// ---------------------------------------------------------------------------

/// The staged account behind `guard`, provided it has been initialized.
pub(crate) fn live_account(guard: &SlotGuard<'_, AccountKey, Account>) -> Result<Account> {
    let account = guard.staged()?;
    ensure_live(&account)?;
    Ok(account)
}

/// Placeholders count as absent.
pub(crate) fn ensure_live(account: &Account) -> Result<()> {
    if account.initialized {
        return Ok(());
    }
    Err(GuardError::NotFound(format!("account {}", account.key)))
}

pub(crate) fn ensure_owner(account: &Account, caller: &Identity) -> Result<()> {
    if account.is_owned_by(caller) {
        return Ok(());
    }
    warn!(account = %account.key, caller = %caller, "Caller does not own account");
    Err(GuardError::Unauthorized {
        reason: format!("{} does not own {}", caller.short(), account.key),
    })
}
