//! # vaultguard-store
//!
//! **Account Store**: keyed, versioned record storage with a per-key
//! exclusive section.
//!
//! ## Guarantees
//!
//! - **Per-key serializability**: two operations on the same key are
//!   linearizable; operations on disjoint keys never contend.
//! - **All-or-nothing commit**: a transition stages new records under its
//!   slot locks and commits them only after every check has passed.
//! - **No implicit destruction**: records are created on first commit and
//!   live for the whole session.
//!
//! ```text
//! Guard → AccountStore::{accounts,orders,ledgers,nonces}() → Table::slot(key)
//!       → Slot::lock() → validate staged copy → SlotGuard::commit()
//! ```

pub mod store;
pub mod table;

pub use store::AccountStore;
pub use table::{Slot, SlotGuard, Table, Versioned};
