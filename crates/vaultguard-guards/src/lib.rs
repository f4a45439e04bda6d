//! # vaultguard-guards
//!
//! Transition guards for the **VaultGuard** account state machine.
//!
//! Every state change to an [`AccountStore`](vaultguard_store::AccountStore)
//! passes through a guard that validates the transition and then commits it
//! atomically, or rejects it with nothing written:
//!
//! - [`Vault`]: owner-checked deposits, withdrawals, and transfers on the Numeric Guard
//! - [`InitGuard`]: one-shot setup, `created_at` never rewritten
//! - [`OrderGuard`]: orders whose fills lock in the price the taker observed
//! - [`DelegationGuard`]: allow-listed external calls with post-call ownership checks
//! - [`ReplayGuard`]: single-use signed authorization tokens
//! - [`Rewards`]: time-based accrual anchored on the one-shot `created_at`
//!
//! ## Policies
//!
//! Guards are generic over a [`Policy`]. [`Secure`] is the default and the
//! only one meant for production. [`Insecure`] reproduces the classic bugs
//! (wrapping balances, re-runnable setup, front-runnable fills, unchecked
//! delegated calls, replayable tokens) so tests can show the difference.
//!
//! ```text
//!                    ┌───────────── GuardSuite<P> ─────────────┐
//!   caller ──▶ guard │ validate (policy P) ──▶ stage ──▶ commit │──▶ AccountStore
//!                    └──────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod delegation;
pub mod init;
pub mod policy;
pub mod replay;
pub mod rewards;
pub mod suite;
pub mod telemetry;
pub mod vault;
pub mod verifier;

pub use commitment::OrderGuard;
pub use delegation::{DelegatedProgram, DelegationContext, DelegationGuard};
pub use init::InitGuard;
pub use policy::{Insecure, Policy, Secure};
pub use replay::ReplayGuard;
pub use rewards::Rewards;
pub use suite::GuardSuite;
pub use telemetry::init_tracing;
pub use vault::Vault;
pub use verifier::{Ed25519Verifier, SignatureVerifier, sign_token};
