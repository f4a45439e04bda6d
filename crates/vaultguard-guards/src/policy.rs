//! Secure and insecure guard policies.
//!
//! Every guard is generic over a [`Policy`]. The policy is picked by type at
//! construction, so one guard instance always enforces exactly one rule set
//! and the two variants can be tested side by side:
//!
//! ```text
//! Vault::<Secure>::new()     // checked arithmetic, owner checks
//! Vault::<Insecure>::new()   // wrapping arithmetic (negative tests only)
//! ```
//!
//! [`Insecure`] reproduces the classic account-program bugs: wrapping
//! balances, re-runnable setup, fills that ignore the observed price,
//! unrestricted delegated calls and replayable tokens. It exists to prove
//! that the secure guards reject what the insecure ones let through.

use vaultguard_types::{Result, numeric};

/// The rule set a guard enforces.
pub trait Policy: Send + Sync + 'static {
    /// Name used in log events.
    const NAME: &'static str;
    /// `initialize` on an initialized record re-runs setup instead of failing.
    const ALLOW_REINITIALIZE: bool;
    /// `fill_order` compares `expected_price` against the current price.
    const ENFORCE_PRICE_LOCK: bool;
    /// `call_external` requires the target to be allow-listed.
    const ENFORCE_ALLOW_LIST: bool;
    /// `call_external` re-checks ownership after the callee returns.
    const REVALIDATE_OWNERSHIP: bool;
    /// Consumed tokens are recorded and rejected on reuse.
    const TRACK_CONSUMED_TOKENS: bool;

    fn add(a: u64, b: u64) -> Result<u64>;
    fn sub(a: u64, b: u64) -> Result<u64>;
    fn mul(a: u64, b: u64) -> Result<u64>;
}

/// Production rule set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Secure;

impl Policy for Secure {
    const NAME: &'static str = "secure";
    const ALLOW_REINITIALIZE: bool = false;
    const ENFORCE_PRICE_LOCK: bool = true;
    const ENFORCE_ALLOW_LIST: bool = true;
    const REVALIDATE_OWNERSHIP: bool = true;
    const TRACK_CONSUMED_TOKENS: bool = true;

    fn add(a: u64, b: u64) -> Result<u64> {
        numeric::checked_add(a, b)
    }

    fn sub(a: u64, b: u64) -> Result<u64> {
        numeric::checked_sub(a, b)
    }

    fn mul(a: u64, b: u64) -> Result<u64> {
        numeric::checked_mul(a, b)
    }
}

/// Deliberately broken rule set for negative testing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Insecure;

impl Policy for Insecure {
    const NAME: &'static str = "insecure";
    const ALLOW_REINITIALIZE: bool = true;
    const ENFORCE_PRICE_LOCK: bool = false;
    const ENFORCE_ALLOW_LIST: bool = false;
    const REVALIDATE_OWNERSHIP: bool = false;
    const TRACK_CONSUMED_TOKENS: bool = false;

    fn add(a: u64, b: u64) -> Result<u64> {
        Ok(a.wrapping_add(b))
    }

    fn sub(a: u64, b: u64) -> Result<u64> {
        Ok(a.wrapping_sub(b))
    }

    fn mul(a: u64, b: u64) -> Result<u64> {
        Ok(a.wrapping_mul(b))
    }
}
