use serde::{Deserialize, Serialize};

use crate::catalog::CommodityId;
use crate::types::{Price, Quantity, TraderId, Turn};

// === ORDERS & TRANSACTIONS ===

/// Monotonic per-market order id. Doubles as the time-priority tie-break:
/// a smaller id was placed earlier.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// A resting limit order. Persists across turns until filled or cancelled;
/// partial fills reduce `quantity` but keep the id (and so the time
/// priority) of the original placement.
#[derive(Clone, Debug)]
pub struct Order {
    pub id: OrderId,
    pub owner: TraderId,
    pub commodity: CommodityId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub placed_turn: Turn,
}

impl Order {
    /// Money committed by a buy order (quantity x bid price).
    pub fn escrow(&self) -> i64 {
        self.quantity as i64 * self.price
    }
}

/// A completed trade. Created only by settlement, immutable once recorded.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub commodity: CommodityId,
    /// Execution price: the resting seller's ask.
    pub price: Price,
    pub quantity: Quantity,
    pub buyer: TraderId,
    pub seller: TraderId,
    pub turn: Turn,
}
