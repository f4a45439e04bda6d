//! Order/Commitment Guard: price-locked fills.
//!
//! A maker may reprice an open order at any time. A taker protects
//! themselves by passing the price they observed as `expected_price`; the
//! fill only executes if that still equals the order's current price. A
//! maker who front-runs the fill with `update_price` therefore causes a
//! [`GuardError::PriceMismatch`] instead of a surprise charge.
//!
//! ## Fill pipeline
//!
//! ```text
//! lock order → lock taker+maker accounts (key order)
//!   → status / expiry → price lock → quantity → ownership
//!   → cost = qty × price → debit taker, credit maker
//!   → commit order + both accounts
//! ```
//!
//! Nothing is committed until every check has passed, so a rejected fill
//! leaves the order and both balances untouched.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use vaultguard_store::AccountStore;
use vaultguard_types::{
    AccountKey, Fill, GuardError, Identity, Order, OrderKey, OrderStatus, Result,
};

use crate::{
    policy::{Policy, Secure},
    vault::{ensure_owner, live_account},
};

/// Create, reprice, fill, and expire orders.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderGuard<P: Policy = Secure> {
    _policy: PhantomData<P>,
}

impl<P: Policy> OrderGuard<P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _policy: PhantomData,
        }
    }

    /// Post an order with no expiry.
    pub fn create_order(
        &self,
        store: &AccountStore,
        maker: Identity,
        maker_account: AccountKey,
        price: u64,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        self.create_order_with_expiry(store, maker, maker_account, price, amount, now, None)
    }

    /// Post an order that stops being fillable at `expires_at`.
    ///
    /// # Errors
    /// - [`GuardError::InvalidOrder`] if `price` or `amount` is zero, or the
    ///   expiry is not after `now`
    /// - [`GuardError::NotFound`] if `maker_account` was never opened
    /// - [`GuardError::Unauthorized`] if `maker` does not own `maker_account`
    #[allow(clippy::too_many_arguments)]
    pub fn create_order_with_expiry(
        &self,
        store: &AccountStore,
        maker: Identity,
        maker_account: AccountKey,
        price: u64,
        amount: u64,
        now: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Order> {
        if price == 0 {
            return Err(GuardError::InvalidOrder {
                reason: "price must be > 0".into(),
            });
        }
        if amount == 0 {
            return Err(GuardError::InvalidOrder {
                reason: "amount must be > 0".into(),
            });
        }
        if expires_at.is_some_and(|expiry| expiry <= now) {
            return Err(GuardError::InvalidOrder {
                reason: "expiry must be in the future".into(),
            });
        }
        {
            let slot = store.accounts().existing_slot(&maker_account)?;
            let guard = slot.lock();
            ensure_owner(&live_account(&guard)?, &maker)?;
        }

        let order = Order {
            key: OrderKey::new(),
            maker,
            maker_account,
            price,
            amount,
            original_amount: amount,
            status: OrderStatus::Created,
            locked_price: None,
            created_at: now,
            updated_at: now,
            expires_at,
        };
        store.orders().create(&order.key, order.clone())?;
        info!(order = %order.key, maker = %maker, price, amount, "Order created");
        Ok(order)
    }

    /// Snapshot of an order.
    pub fn get(&self, store: &AccountStore, key: &OrderKey) -> Result<Order> {
        store.orders().get(key).map(|v| v.record)
    }

    /// Reprice an open order. Only the maker may do this.
    ///
    /// # Errors
    /// - [`GuardError::Unauthorized`] if `caller` is not the maker
    /// - [`GuardError::OrderClosed`] if the order is filled or expired
    /// - [`GuardError::InvalidOrder`] if `new_price` is zero
    pub fn update_price(
        &self,
        store: &AccountStore,
        caller: &Identity,
        order_key: &OrderKey,
        new_price: u64,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        let slot = store.orders().existing_slot(order_key)?;
        let mut guard = slot.lock();
        let mut order = guard.staged()?;

        if order.maker != *caller {
            return Err(GuardError::Unauthorized {
                reason: format!("{} is not the maker of {order_key}", caller.short()),
            });
        }
        if !order.status.can_transition_to(OrderStatus::PriceUpdated) {
            return Err(GuardError::OrderClosed(*order_key));
        }
        if new_price == 0 {
            return Err(GuardError::InvalidOrder {
                reason: "price must be > 0".into(),
            });
        }

        let old_price = order.price;
        order.price = new_price;
        order.status = OrderStatus::PriceUpdated;
        order.updated_at = now;
        let version = guard.commit(order.clone());
        debug!(order = %order_key, old_price, new_price, version, "Order repriced");
        Ok(order)
    }

    /// Fill `fill_amount` units at `expected_price`.
    ///
    /// # Errors
    /// - [`GuardError::OrderClosed`] / [`GuardError::OrderExpired`]
    /// - [`GuardError::PriceMismatch`] if the price moved since the taker saw it
    /// - [`GuardError::InvalidOrder`] if `fill_amount` is zero
    /// - [`GuardError::InsufficientLiquidity`] if `fill_amount` exceeds the order
    /// - [`GuardError::Unauthorized`] if `taker` does not own `taker_account`
    /// - [`GuardError::SelfTradeBlocked`] if the taker account is the maker account
    /// - [`GuardError::InsufficientBalance`] if the taker cannot pay
    /// - [`GuardError::ArithmeticOverflow`] on cost or maker credit overflow
    #[allow(clippy::too_many_arguments)]
    pub fn fill_order(
        &self,
        store: &AccountStore,
        taker: &Identity,
        taker_account: &AccountKey,
        order_key: &OrderKey,
        fill_amount: u64,
        expected_price: u64,
        now: DateTime<Utc>,
    ) -> Result<Fill> {
        let order_slot = store.orders().existing_slot(order_key)?;
        let mut order_guard = order_slot.lock();
        let mut order = order_guard.staged()?;

        if !order.is_open() {
            return Err(GuardError::OrderClosed(*order_key));
        }
        if order.is_expired_at(now) {
            return Err(GuardError::OrderExpired(*order_key));
        }
        if P::ENFORCE_PRICE_LOCK && expected_price != order.price {
            warn!(
                order = %order_key,
                expected = expected_price,
                actual = order.price,
                "Fill rejected: price changed after commitment"
            );
            return Err(GuardError::PriceMismatch {
                expected: expected_price,
                actual: order.price,
            });
        }
        if fill_amount == 0 {
            return Err(GuardError::InvalidOrder {
                reason: "fill amount must be > 0".into(),
            });
        }
        if fill_amount > order.amount {
            return Err(GuardError::InsufficientLiquidity {
                requested: fill_amount,
                remaining: order.amount,
            });
        }
        if *taker_account == order.maker_account {
            return Err(GuardError::SelfTradeBlocked);
        }

        let slots = store
            .accounts()
            .existing_slots_sorted(&[*taker_account, order.maker_account])?;
        let mut first = slots[0].lock();
        let mut second = slots[1].lock();
        let (taker_guard, maker_guard) = if first.key() == taker_account {
            (&mut first, &mut second)
        } else {
            (&mut second, &mut first)
        };

        let mut taker_acct = live_account(taker_guard)?;
        let mut maker_acct = live_account(maker_guard)?;
        ensure_owner(&taker_acct, taker)?;

        let price = order.price;
        let cost = P::mul(fill_amount, price)?;
        taker_acct.balance =
            P::sub(taker_acct.balance, cost).map_err(|_| GuardError::InsufficientBalance {
                needed: cost,
                available: taker_acct.balance,
            })?;
        maker_acct.balance = P::add(maker_acct.balance, cost)?;

        order.amount -= fill_amount;
        order.locked_price = Some(expected_price);
        order.updated_at = now;
        if order.amount == 0 {
            order.status = OrderStatus::Filled;
        }
        let fill = Fill {
            order: *order_key,
            quantity: fill_amount,
            price,
            cost,
            remaining: order.amount,
        };

        order_guard.commit(order);
        taker_guard.commit(taker_acct);
        maker_guard.commit(maker_acct);
        debug!(
            order = %order_key,
            taker = %taker,
            quantity = fill_amount,
            price,
            cost,
            remaining = fill.remaining,
            "Order filled"
        );
        Ok(fill)
    }

    /// Close an order whose expiry has passed.
    ///
    /// # Errors
    /// - [`GuardError::OrderClosed`] if the order is already filled or expired
    /// - [`GuardError::OrderNotExpired`] if it has no expiry or it is still ahead
    pub fn expire_order(
        &self,
        store: &AccountStore,
        order_key: &OrderKey,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        let slot = store.orders().existing_slot(order_key)?;
        let mut guard = slot.lock();
        let mut order = guard.staged()?;

        if !order.status.can_transition_to(OrderStatus::Expired) {
            return Err(GuardError::OrderClosed(*order_key));
        }
        if !order.is_expired_at(now) {
            return Err(GuardError::OrderNotExpired(*order_key));
        }

        order.status = OrderStatus::Expired;
        order.updated_at = now;
        guard.commit(order.clone());
        info!(order = %order_key, "Order expired");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{policy::Insecure, vault::Vault};

    struct Market {
        store: AccountStore,
        maker: Identity,
        taker: Identity,
        maker_acct: AccountKey,
        taker_acct: AccountKey,
    }

    fn market<P: Policy>(taker_funds: u64) -> Market {
        let store = AccountStore::new();
        let vault = Vault::<P>::new();
        let maker = Identity([10u8; 32]);
        let taker = Identity([20u8; 32]);
        let maker_acct = AccountKey::derive(b"vault", &maker);
        let taker_acct = AccountKey::derive(b"vault", &taker);
        vault.open(&store, maker, maker_acct, Utc::now()).unwrap();
        vault.open(&store, taker, taker_acct, Utc::now()).unwrap();
        vault.deposit(&store, &taker, &taker_acct, taker_funds).unwrap();
        Market {
            store,
            maker,
            taker,
            maker_acct,
            taker_acct,
        }
    }

    #[test]
    fn create_validates_inputs() {
        let m = market::<Secure>(0);
        let guard = OrderGuard::<Secure>::new();
        let now = Utc::now();
        assert!(matches!(
            guard.create_order(&m.store, m.maker, m.maker_acct, 0, 5, now),
            Err(GuardError::InvalidOrder { .. })
        ));
        assert!(matches!(
            guard.create_order(&m.store, m.maker, m.maker_acct, 5, 0, now),
            Err(GuardError::InvalidOrder { .. })
        ));
        assert!(matches!(
            guard.create_order(&m.store, m.taker, m.maker_acct, 5, 5, now),
            Err(GuardError::Unauthorized { .. })
        ));
        let stranger = Identity([99u8; 32]);
        assert!(matches!(
            guard.create_order(&m.store, stranger, AccountKey::derive(b"vault", &stranger), 5, 5, now),
            Err(GuardError::NotFound(_))
        ));
    }

    #[test]
    fn fill_at_observed_price() {
        let m = market::<Secure>(1_000);
        let guard = OrderGuard::<Secure>::new();
        let now = Utc::now();
        let order = guard
            .create_order(&m.store, m.maker, m.maker_acct, 10, 50, now)
            .unwrap();

        let fill = guard
            .fill_order(&m.store, &m.taker, &m.taker_acct, &order.key, 20, 10, now)
            .unwrap();
        assert_eq!(fill.cost, 200);
        assert_eq!(fill.remaining, 30);
        assert_eq!(m.store.get(&m.taker_acct).unwrap().balance, 800);
        assert_eq!(m.store.get(&m.maker_acct).unwrap().balance, 200);

        let stored = guard.get(&m.store, &order.key).unwrap();
        assert_eq!(stored.status, OrderStatus::Created);
        assert_eq!(stored.locked_price, Some(10));
        assert_eq!(stored.filled_amount(), 20);
    }

    #[test]
    fn front_run_reprice_is_caught() {
        let m = market::<Secure>(10_000);
        let guard = OrderGuard::<Secure>::new();
        let now = Utc::now();
        let order = guard
            .create_order(&m.store, m.maker, m.maker_acct, 10, 50, now)
            .unwrap();
        guard
            .update_price(&m.store, &m.maker, &order.key, 100, now)
            .unwrap();

        let err = guard
            .fill_order(&m.store, &m.taker, &m.taker_acct, &order.key, 5, 10, now)
            .unwrap_err();
        assert_eq!(
            err,
            GuardError::PriceMismatch {
                expected: 10,
                actual: 100
            }
        );
        assert_eq!(m.store.get(&m.taker_acct).unwrap().balance, 10_000);
        assert_eq!(m.store.get(&m.maker_acct).unwrap().balance, 0);
        assert_eq!(guard.get(&m.store, &order.key).unwrap().amount, 50);
    }

    #[test]
    fn insecure_fill_ignores_expected_price() {
        let m = market::<Insecure>(10_000);
        let guard = OrderGuard::<Insecure>::new();
        let now = Utc::now();
        let order = guard
            .create_order(&m.store, m.maker, m.maker_acct, 10, 50, now)
            .unwrap();
        guard
            .update_price(&m.store, &m.maker, &order.key, 100, now)
            .unwrap();

        let fill = guard
            .fill_order(&m.store, &m.taker, &m.taker_acct, &order.key, 5, 10, now)
            .unwrap();
        assert_eq!(fill.cost, 500);
        assert_eq!(m.store.get(&m.taker_acct).unwrap().balance, 9_500);
    }

    #[test]
    fn draining_fill_closes_order() {
        let m = market::<Secure>(1_000);
        let guard = OrderGuard::<Secure>::new();
        let now = Utc::now();
        let order = guard
            .create_order(&m.store, m.maker, m.maker_acct, 2, 10, now)
            .unwrap();
        let fill = guard
            .fill_order(&m.store, &m.taker, &m.taker_acct, &order.key, 10, 2, now)
            .unwrap();
        assert_eq!(fill.remaining, 0);
        assert_eq!(
            guard.get(&m.store, &order.key).unwrap().status,
            OrderStatus::Filled
        );

        assert_eq!(
            guard
                .fill_order(&m.store, &m.taker, &m.taker_acct, &order.key, 1, 2, now)
                .unwrap_err(),
            GuardError::OrderClosed(order.key)
        );
        assert_eq!(
            guard
                .update_price(&m.store, &m.maker, &order.key, 3, now)
                .unwrap_err(),
            GuardError::OrderClosed(order.key)
        );
    }

    #[test]
    fn fill_quantity_and_balance_checks() {
        let m = market::<Secure>(15);
        let guard = OrderGuard::<Secure>::new();
        let now = Utc::now();
        let order = guard
            .create_order(&m.store, m.maker, m.maker_acct, 10, 5, now)
            .unwrap();

        assert!(matches!(
            guard.fill_order(&m.store, &m.taker, &m.taker_acct, &order.key, 0, 10, now),
            Err(GuardError::InvalidOrder { .. })
        ));
        assert_eq!(
            guard
                .fill_order(&m.store, &m.taker, &m.taker_acct, &order.key, 6, 10, now)
                .unwrap_err(),
            GuardError::InsufficientLiquidity {
                requested: 6,
                remaining: 5
            }
        );
        assert_eq!(
            guard
                .fill_order(&m.store, &m.taker, &m.taker_acct, &order.key, 2, 10, now)
                .unwrap_err(),
            GuardError::InsufficientBalance {
                needed: 20,
                available: 15
            }
        );
        assert_eq!(m.store.get(&m.taker_acct).unwrap().balance, 15);
    }

    #[test]
    fn taker_must_own_account_and_not_self_trade() {
        let m = market::<Secure>(100);
        let guard = OrderGuard::<Secure>::new();
        let now = Utc::now();
        let order = guard
            .create_order(&m.store, m.maker, m.maker_acct, 1, 5, now)
            .unwrap();

        assert!(matches!(
            guard.fill_order(&m.store, &m.maker, &m.taker_acct, &order.key, 1, 1, now),
            Err(GuardError::Unauthorized { .. })
        ));
        assert_eq!(
            guard
                .fill_order(&m.store, &m.maker, &m.maker_acct, &order.key, 1, 1, now)
                .unwrap_err(),
            GuardError::SelfTradeBlocked
        );
    }

    #[test]
    fn unknown_order_rejected_without_allocating() {
        let m = market::<Secure>(100);
        let guard = OrderGuard::<Secure>::new();
        let now = Utc::now();
        let ghost = OrderKey::new();
        let stranger = Identity([99u8; 32]);
        let order_slots = m.store.orders().slot_count();
        let account_slots = m.store.accounts().slot_count();

        assert!(matches!(
            guard.fill_order(&m.store, &m.taker, &m.taker_acct, &ghost, 1, 1, now),
            Err(GuardError::NotFound(_))
        ));
        assert!(matches!(
            guard.update_price(&m.store, &m.maker, &ghost, 2, now),
            Err(GuardError::NotFound(_))
        ));
        assert!(matches!(
            guard.expire_order(&m.store, &ghost, now),
            Err(GuardError::NotFound(_))
        ));
        assert!(matches!(
            guard.create_order(&m.store, stranger, AccountKey::derive(b"vault", &stranger), 5, 5, now),
            Err(GuardError::NotFound(_))
        ));
        assert_eq!(m.store.orders().slot_count(), order_slots);
        assert_eq!(m.store.accounts().slot_count(), account_slots);

        let order = guard
            .create_order(&m.store, m.maker, m.maker_acct, 1, 5, now)
            .unwrap();
        let ghost_taker = AccountKey::derive(b"vault", &stranger);
        assert!(matches!(
            guard.fill_order(&m.store, &stranger, &ghost_taker, &order.key, 1, 1, now),
            Err(GuardError::NotFound(_))
        ));
        assert_eq!(m.store.accounts().slot_count(), account_slots);
        assert_eq!(guard.get(&m.store, &order.key).unwrap().amount, 5);
    }

    #[test]
    fn only_maker_reprices() {
        let m = market::<Secure>(0);
        let guard = OrderGuard::<Secure>::new();
        let now = Utc::now();
        let order = guard
            .create_order(&m.store, m.maker, m.maker_acct, 1, 5, now)
            .unwrap();
        assert!(matches!(
            guard.update_price(&m.store, &m.taker, &order.key, 2, now),
            Err(GuardError::Unauthorized { .. })
        ));
        assert_eq!(guard.get(&m.store, &order.key).unwrap().price, 1);
    }

    #[test]
    fn expiry_lifecycle() {
        let m = market::<Secure>(100);
        let guard = OrderGuard::<Secure>::new();
        let now = Utc::now();
        let expiry = now + Duration::seconds(60);
        let order = guard
            .create_order_with_expiry(&m.store, m.maker, m.maker_acct, 1, 5, now, Some(expiry))
            .unwrap();

        assert_eq!(
            guard.expire_order(&m.store, &order.key, now).unwrap_err(),
            GuardError::OrderNotExpired(order.key)
        );
        // A rejected fill on an expired order does not itself close the order.
        assert_eq!(
            guard
                .fill_order(&m.store, &m.taker, &m.taker_acct, &order.key, 1, 1, expiry)
                .unwrap_err(),
            GuardError::OrderExpired(order.key)
        );
        assert!(guard.get(&m.store, &order.key).unwrap().is_open());

        let expired = guard.expire_order(&m.store, &order.key, expiry).unwrap();
        assert_eq!(expired.status, OrderStatus::Expired);
        assert_eq!(
            guard.expire_order(&m.store, &order.key, expiry).unwrap_err(),
            GuardError::OrderClosed(order.key)
        );
    }
}
