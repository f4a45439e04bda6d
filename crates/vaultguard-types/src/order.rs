//! Order types for the commitment guard.
//!
//! ## State Machine
//!
//! ```text
//!   CREATED ──update_price──▶ PRICE_UPDATED ──update_price──┐
//!      │                         │    ▲                      │
//!      │                         │    └──────────────────────┘
//!      ├── fill (drained) ──────▶├──▶ FILLED
//!      └── expire ──────────────▶└──▶ EXPIRED
//! ```
//!
//! The maker may reprice at any time while the order is open. The taker is
//! protected not by restricting repricing but by locking the price they
//! observed into the fill request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountKey, Identity, OrderKey, Record};

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Created,
    PriceUpdated,
    Filled,
    Expired,
}

impl OrderStatus {
    /// `Filled` and `Expired` are terminal.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Created | Self::PriceUpdated)
    }

    /// Can an order in this status move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        self.is_open() && target != Self::Created
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::PriceUpdated => write!(f, "PRICE_UPDATED"),
            Self::Filled => write!(f, "FILLED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// A maker's standing offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub key: OrderKey,
    pub maker: Identity,
    /// Account credited when the order is filled.
    pub maker_account: AccountKey,
    /// Price per unit.
    pub price: u64,
    /// Remaining fillable amount.
    pub amount: u64,
    pub original_amount: u64,
    pub status: OrderStatus,
    /// Price the taker locked in on the most recent fill.
    pub locked_price: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Order {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }

    #[must_use]
    pub fn filled_amount(&self) -> u64 {
        self.original_amount.saturating_sub(self.amount)
    }
}

impl Record for Order {
    const KIND: &'static str = "order";

    fn is_initialized(&self) -> bool {
        true
    }
}

/// Receipt returned by a successful fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub order: OrderKey,
    pub quantity: u64,
    pub price: u64,
    /// `quantity * price`, moved from taker to maker.
    pub cost: u64,
    /// Order amount left after this fill.
    pub remaining: u64,
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy(maker: Identity, price: u64, amount: u64) -> Self {
        let now = Utc::now();
        Self {
            key: OrderKey::new(),
            maker,
            maker_account: AccountKey::derive(b"vault", &maker),
            price,
            amount,
            original_amount: amount,
            status: OrderStatus::Created,
            locked_price: None,
            created_at: now,
            updated_at: now,
            expires_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn open_statuses() {
        assert!(OrderStatus::Created.is_open());
        assert!(OrderStatus::PriceUpdated.is_open());
        assert!(!OrderStatus::Filled.is_open());
        assert!(!OrderStatus::Expired.is_open());
    }

    #[test]
    fn transitions_are_monotonic() {
        assert!(OrderStatus::Created.can_transition_to(OrderStatus::PriceUpdated));
        assert!(OrderStatus::PriceUpdated.can_transition_to(OrderStatus::PriceUpdated));
        assert!(OrderStatus::PriceUpdated.can_transition_to(OrderStatus::Filled));
        assert!(OrderStatus::Created.can_transition_to(OrderStatus::Expired));
        assert!(!OrderStatus::Filled.can_transition_to(OrderStatus::PriceUpdated));
        assert!(!OrderStatus::Expired.can_transition_to(OrderStatus::Filled));
        assert!(!OrderStatus::PriceUpdated.can_transition_to(OrderStatus::Created));
    }

    #[test]
    fn expiry_is_inclusive() {
        let mut order = Order::dummy(Identity([1u8; 32]), 10, 10);
        let now = Utc::now();
        assert!(!order.is_expired_at(now));
        order.expires_at = Some(now);
        assert!(order.is_expired_at(now));
        assert!(!order.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn filled_amount_tracks_remaining() {
        let mut order = Order::dummy(Identity([1u8; 32]), 10, 10);
        order.amount = 4;
        assert_eq!(order.filled_amount(), 6);
    }

    #[test]
    fn status_display() {
        assert_eq!(OrderStatus::PriceUpdated.to_string(), "PRICE_UPDATED");
    }
}
