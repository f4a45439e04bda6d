//! Delegation Guard: capability check before, invariant check after.
//!
//! A delegated call hands external code authority over the caller's
//! account. The callee is treated as adversarial:
//!
//! 1. **Before**: the target must be on the [`AllowList`] and the program
//!    actually invoked must identify as that target. Otherwise the call is
//!    rejected with [`GuardError::UntrustedTarget`] and nothing runs.
//! 2. **During**: the callee works on a staged copy of the account through
//!    a [`DelegationContext`]. Its changes are invisible until commit. No
//!    store lock is held while it runs, so a callee may read or write the
//!    store itself.
//! 3. **After**: the staged owner must still be in the caller's trust
//!    domain (the pre-call owner or a configured trusted authority). A
//!    callee that reassigned ownership gets [`GuardError::OwnershipHijacked`]
//!    and every staged change is discarded.
//! 4. **Commit**: the staged account replaces the snapshot only if the
//!    stored version is unchanged. Any write to the account during the call
//!    turns the commit into [`GuardError::VersionConflict`].

use std::{collections::BTreeSet, marker::PhantomData};

use tracing::{debug, warn};
use vaultguard_store::AccountStore;
use vaultguard_types::{
    Account, AllowList, DelegationRequest, GuardConfig, GuardError, Identity, ProgramId, Result,
    numeric,
};

use crate::{
    policy::{Policy, Secure},
    vault::{ensure_live, ensure_owner},
};

/// External code that may be invoked with authority over an account.
pub trait DelegatedProgram: Send + Sync {
    /// Identity this program runs as.
    fn id(&self) -> ProgramId;

    /// Act on the staged account.
    ///
    /// # Errors
    /// Any error aborts the delegated call with nothing committed.
    fn invoke(&self, ctx: &mut DelegationContext) -> Result<()>;
}

/// What a callee sees: a staged copy of the caller's account.
#[derive(Debug, Clone)]
pub struct DelegationContext {
    caller: Identity,
    account: Account,
}

impl DelegationContext {
    #[must_use]
    pub fn caller(&self) -> &Identity {
        &self.caller
    }

    #[must_use]
    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Reassign the account's owner.
    pub fn assign_owner(&mut self, owner: Identity) {
        self.account.owner = owner;
    }

    /// Debit the staged balance. Returns the new balance.
    pub fn debit(&mut self, amount: u64) -> Result<u64> {
        self.account.balance = numeric::checked_sub(self.account.balance, amount)?;
        Ok(self.account.balance)
    }

    /// Credit the staged balance. Returns the new balance.
    pub fn credit(&mut self, amount: u64) -> Result<u64> {
        self.account.balance = numeric::checked_add(self.account.balance, amount)?;
        Ok(self.account.balance)
    }
}

/// Guards delegated calls against untrusted targets and ownership hijacks.
#[derive(Debug, Clone, Default)]
pub struct DelegationGuard<P: Policy = Secure> {
    trusted_authorities: BTreeSet<Identity>,
    _policy: PhantomData<P>,
}

impl<P: Policy> DelegationGuard<P> {
    /// `trusted_authorities` may hold an account after a delegated call in
    /// addition to its pre-call owner.
    #[must_use]
    pub fn new(trusted_authorities: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            trusted_authorities: trusted_authorities.into_iter().collect(),
            _policy: PhantomData,
        }
    }

    #[must_use]
    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new(config.trusted_authorities.iter().copied())
    }

    /// Is `identity` an acceptable owner for an account previously owned by `owner`?
    #[must_use]
    pub fn in_trust_domain(&self, owner: &Identity, identity: &Identity) -> bool {
        identity == owner || self.trusted_authorities.contains(identity)
    }

    /// Invoke `program` on the caller's account. Returns the committed account.
    ///
    /// # Errors
    /// - [`GuardError::UntrustedTarget`] if the target is not allow-listed or
    ///   `program` is not the requested target
    /// - [`GuardError::NotFound`] / [`GuardError::Unauthorized`] if the caller
    ///   does not own an opened account
    /// - [`GuardError::DelegatedCallFailed`] if the callee returned an error
    /// - [`GuardError::OwnershipHijacked`] if the callee moved ownership out
    ///   of the trust domain
    /// - [`GuardError::VersionConflict`] if the account was written while the
    ///   callee ran
    pub fn call_external(
        &self,
        store: &AccountStore,
        request: &DelegationRequest,
        allow_list: &AllowList,
        program: &dyn DelegatedProgram,
    ) -> Result<Account> {
        let target = request.target;
        if P::ENFORCE_ALLOW_LIST && (!allow_list.contains(&target) || program.id() != target) {
            warn!(
                target = %target,
                program = %program.id(),
                caller = %request.caller,
                "Delegated call to untrusted target rejected"
            );
            return Err(GuardError::UntrustedTarget(target));
        }

        let snapshot = store.accounts().get(&request.caller_account)?;
        ensure_live(&snapshot.record)?;
        ensure_owner(&snapshot.record, &request.caller)?;
        let owner_before = snapshot.record.owner;

        let mut ctx = DelegationContext {
            caller: request.caller,
            account: snapshot.record,
        };
        program
            .invoke(&mut ctx)
            .map_err(|e| GuardError::DelegatedCallFailed {
                target,
                reason: e.to_string(),
            })?;

        let staged = ctx.account;
        if P::REVALIDATE_OWNERSHIP && !self.in_trust_domain(&owner_before, &staged.owner) {
            warn!(
                target = %target,
                account = %request.caller_account,
                new_owner = %staged.owner,
                "Delegated call tried to take ownership; changes discarded"
            );
            return Err(GuardError::OwnershipHijacked { target });
        }

        let version = store
            .accounts()
            .compare_and_put(&request.caller_account, staged.clone(), snapshot.version)
            .inspect_err(|_| {
                warn!(
                    target = %target,
                    account = %request.caller_account,
                    "Account changed during delegated call; changes discarded"
                );
            })?;
        debug!(
            target = %target,
            account = %request.caller_account,
            balance = staged.balance,
            version,
            policy = P::NAME,
            "Delegated call committed"
        );
        Ok(staged)
    }
}
