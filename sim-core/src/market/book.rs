use crate::types::Price;

use super::orders::{Order, OrderId, Side};

// === ORDER BOOK ===

/// Outstanding orders for one commodity on one market.
///
/// Orders rest unsorted between settlements; the matching pass sorts by
/// price-time priority (price, then order id as the placement timestamp).
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    pub buys: Vec<Order>,
    pub sells: Vec<Order>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, order: Order) {
        match order.side {
            Side::Buy => self.buys.push(order),
            Side::Sell => self.sells.push(order),
        }
    }

    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.buys
            .iter()
            .chain(self.sells.iter())
            .find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.buys
            .iter_mut()
            .chain(self.sells.iter_mut())
            .find(|o| o.id == id)
    }

    pub fn remove(&mut self, id: OrderId) -> Option<Order> {
        if let Some(pos) = self.buys.iter().position(|o| o.id == id) {
            return Some(self.buys.remove(pos));
        }
        if let Some(pos) = self.sells.iter().position(|o| o.id == id) {
            return Some(self.sells.remove(pos));
        }
        None
    }

    /// Highest resting bid price.
    pub fn best_bid(&self) -> Option<Price> {
        self.buys.iter().map(|o| o.price).max()
    }

    /// Lowest resting ask price.
    pub fn best_ask(&self) -> Option<Price> {
        self.sells.iter().map(|o| o.price).min()
    }

    pub fn is_empty(&self) -> bool {
        self.buys.is_empty() && self.sells.is_empty()
    }

    /// Sort both sides into matching priority: buys by price descending,
    /// sells by price ascending, oldest first within a price level.
    pub fn sort_for_matching(&mut self) {
        self.buys.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id)));
        self.sells.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id)));
    }
}
