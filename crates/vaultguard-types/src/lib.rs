//! # vaultguard-types
//!
//! Shared records, identifiers, errors, and configuration for **VaultGuard**.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Identity`], [`AccountKey`], [`OrderKey`], [`ProgramId`], [`TokenId`], [`Action`]
//! - **Records**: [`Account`], [`Order`], [`RewardLedger`], [`NonceRecord`], all implementing [`Record`]
//! - **Authorization**: [`AuthorizationToken`], [`ReplayScope`]
//! - **Delegation**: [`DelegationRequest`], [`AllowList`]
//! - **Numeric Guard**: [`numeric::checked_add`], [`numeric::checked_sub`], [`numeric::checked_mul`]
//! - **Configuration**: [`GuardConfig`], [`NonceMode`], [`LoggingConfig`]
//! - **Errors**: [`GuardError`] with `VG_ERR_` prefix codes
//! - **Constants**: defaults and domain-separation tags

pub mod account;
pub mod config;
pub mod constants;
pub mod delegation;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod numeric;
pub mod order;
pub mod record;
pub mod token;

// Re-export all primary types at crate root for ergonomic imports:
//   use vaultguard_types::{Account, Order, GuardError, ...};

pub use account::*;
pub use config::*;
pub use delegation::*;
pub use error::*;
pub use ids::*;
pub use ledger::*;
pub use order::*;
pub use record::*;
pub use token::*;

// Constants and numeric helpers are accessed via their module paths
// (`vaultguard_types::constants::FOO`, `vaultguard_types::numeric::checked_add`).
