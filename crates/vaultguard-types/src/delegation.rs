//! Delegated-call request and allow-list types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{AccountKey, GuardConfig, Identity, ProgramId};

/// A request to let external code act on the caller's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRequest {
    /// Authenticated identity making the call.
    pub caller: Identity,
    /// Account the callee is granted authority over.
    pub caller_account: AccountKey,
    /// Program the caller wants to invoke.
    pub target: ProgramId,
}

/// Fixed set of programs that may be invoked through a delegated call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList {
    programs: BTreeSet<ProgramId>,
}

impl AllowList {
    #[must_use]
    pub fn new(programs: impl IntoIterator<Item = ProgramId>) -> Self {
        Self {
            programs: programs.into_iter().collect(),
        }
    }

    /// The allow-list named by `trusted_programs` in the configuration.
    #[must_use]
    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new(config.trusted_programs.iter().copied())
    }

    #[must_use]
    pub fn contains(&self, program: &ProgramId) -> bool {
        self.programs.contains(program)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
