//! Per-entity holdings of commodities and money with an available/reserved
//! split.
//!
//! Reserving marks stock or cash as committed to a pending order. Because
//! matching is deferred to the settlement phase, the reservation is what
//! prevents an entity from committing the same unit twice within a turn.
//! Invariant: `0 <= reserved <= total` for every commodity and for money.

use std::collections::HashMap;

use thiserror::Error;

use crate::catalog::CommodityId;
use crate::types::{Money, Quantity};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InventoryError {
    /// Unconditional removal exceeded total holdings. A caller-logic bug,
    /// surfaced rather than silently corrected.
    #[error("insufficient quantity: needed {needed}, held {held}")]
    InsufficientQuantity { needed: Quantity, held: Quantity },

    /// Reservation exceeded unreserved stock or cash. Recoverable: the
    /// caller should adjust or skip the action.
    #[error("insufficient available: needed {needed}, available {available}")]
    InsufficientAvailable {
        needed: Quantity,
        available: Quantity,
    },

    #[error("insufficient money: needed {needed}, held {held}")]
    InsufficientMoney { needed: Money, held: Money },

    #[error("insufficient available money: needed {needed}, available {available}")]
    InsufficientAvailableMoney { needed: Money, available: Money },

    /// Reserved would exceed total or go negative. Always a programming
    /// error; never silently clamped.
    #[error("reservation invariant violated: {0}")]
    InvariantViolation(&'static str),
}

#[derive(Debug, Clone, Copy, Default)]
struct Holding {
    total: Quantity,
    reserved: Quantity,
}

/// Inventory owned exclusively by one entity (actor or ship).
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    goods: HashMap<CommodityId, Holding>,
    money_total: Money,
    money_reserved: Money,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_money(mut self, money: Money) -> Self {
        self.money_total = money;
        self
    }

    // === Commodities ===

    pub fn add(&mut self, commodity: CommodityId, qty: Quantity) {
        if qty == 0 {
            return;
        }
        self.goods.entry(commodity).or_default().total += qty;
    }

    /// Remove from total holdings. Fails if `qty` exceeds the available
    /// (unreserved) amount; reserved stock belongs to open orders.
    pub fn remove(&mut self, commodity: CommodityId, qty: Quantity) -> Result<(), InventoryError> {
        if qty == 0 {
            return Ok(());
        }
        let holding = self.goods.entry(commodity).or_default();
        let available = holding.total - holding.reserved;
        if available < qty {
            return Err(InventoryError::InsufficientQuantity {
                needed: qty,
                held: holding.total,
            });
        }
        holding.total -= qty;
        Ok(())
    }

    /// Mark stock as committed to a pending order.
    pub fn reserve(&mut self, commodity: CommodityId, qty: Quantity) -> Result<(), InventoryError> {
        let holding = self.goods.entry(commodity).or_default();
        let available = holding.total - holding.reserved;
        if available < qty {
            return Err(InventoryError::InsufficientAvailable {
                needed: qty,
                available,
            });
        }
        holding.reserved += qty;
        debug_assert!(holding.reserved <= holding.total);
        Ok(())
    }

    /// Return reserved stock to available (order cancelled or repriced).
    pub fn unreserve(
        &mut self,
        commodity: CommodityId,
        qty: Quantity,
    ) -> Result<(), InventoryError> {
        let holding = self.goods.entry(commodity).or_default();
        if holding.reserved < qty {
            return Err(InventoryError::InvariantViolation(
                "unreserve would drive reserved below zero",
            ));
        }
        holding.reserved -= qty;
        Ok(())
    }

    /// Consume reserved stock: the matched portion of a sell order leaves
    /// the inventory through here, total and reserved dropping together.
    pub fn take_reserved(
        &mut self,
        commodity: CommodityId,
        qty: Quantity,
    ) -> Result<(), InventoryError> {
        let holding = self.goods.entry(commodity).or_default();
        if holding.reserved < qty {
            return Err(InventoryError::InvariantViolation(
                "take_reserved exceeds reserved stock",
            ));
        }
        holding.reserved -= qty;
        holding.total -= qty;
        Ok(())
    }

    pub fn quantity(&self, commodity: CommodityId) -> Quantity {
        self.goods.get(&commodity).map(|h| h.total).unwrap_or(0)
    }

    pub fn available(&self, commodity: CommodityId) -> Quantity {
        self.goods
            .get(&commodity)
            .map(|h| h.total - h.reserved)
            .unwrap_or(0)
    }

    pub fn reserved(&self, commodity: CommodityId) -> Quantity {
        self.goods.get(&commodity).map(|h| h.reserved).unwrap_or(0)
    }

    pub fn has_available(&self, commodity: CommodityId, qty: Quantity) -> bool {
        self.available(commodity) >= qty
    }

    /// Total units across all commodities (available + reserved).
    pub fn total_units(&self) -> u64 {
        self.goods.values().map(|h| h.total as u64).sum()
    }

    /// Iterate (commodity, total, reserved) for non-empty holdings.
    pub fn holdings(&self) -> impl Iterator<Item = (CommodityId, Quantity, Quantity)> + '_ {
        self.goods
            .iter()
            .filter(|(_, h)| h.total > 0)
            .map(|(&c, h)| (c, h.total, h.reserved))
    }

    // === Money (identical reserve/unreserve contract) ===

    pub fn add_money(&mut self, amount: Money) {
        debug_assert!(amount >= 0);
        self.money_total += amount;
    }

    pub fn remove_money(&mut self, amount: Money) -> Result<(), InventoryError> {
        let available = self.money_total - self.money_reserved;
        if available < amount {
            return Err(InventoryError::InsufficientMoney {
                needed: amount,
                held: self.money_total,
            });
        }
        self.money_total -= amount;
        Ok(())
    }

    pub fn reserve_money(&mut self, amount: Money) -> Result<(), InventoryError> {
        let available = self.money_total - self.money_reserved;
        if available < amount {
            return Err(InventoryError::InsufficientAvailableMoney {
                needed: amount,
                available,
            });
        }
        self.money_reserved += amount;
        debug_assert!(self.money_reserved <= self.money_total);
        Ok(())
    }

    pub fn unreserve_money(&mut self, amount: Money) -> Result<(), InventoryError> {
        if self.money_reserved < amount {
            return Err(InventoryError::InvariantViolation(
                "unreserve_money would drive reserved below zero",
            ));
        }
        self.money_reserved -= amount;
        Ok(())
    }

    /// Spend reserved cash: the matched portion of a buy order pays out
    /// through here, total and reserved dropping together.
    pub fn spend_reserved_money(&mut self, amount: Money) -> Result<(), InventoryError> {
        if self.money_reserved < amount {
            return Err(InventoryError::InvariantViolation(
                "spend_reserved_money exceeds reserved cash",
            ));
        }
        self.money_reserved -= amount;
        self.money_total -= amount;
        Ok(())
    }

    pub fn money(&self) -> Money {
        self.money_total
    }

    pub fn available_money(&self) -> Money {
        self.money_total - self.money_reserved
    }

    pub fn reserved_money(&self) -> Money {
        self.money_reserved
    }

    /// Check the reservation invariant across every holding and money.
    pub fn invariant_holds(&self) -> bool {
        self.money_reserved >= 0
            && self.money_reserved <= self.money_total
            && self.goods.values().all(|h| h.reserved <= h.total)
    }
}
