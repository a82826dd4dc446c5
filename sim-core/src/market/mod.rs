//! Per-planet commodity market: one order book per commodity, deferred
//! batch matching once per turn, and a rolling trade log for price queries.
//!
//! Placing an order immediately reserves the committed resource (goods for
//! a sell, escrowed money for a buy) on the owner's inventory; the actual
//! transfer happens at settlement. Cancellation fully reverses the
//! reservation at any point before settlement consumes the order.

mod book;
mod orders;
mod settle;

pub use book::OrderBook;
pub use orders::{Order, OrderId, Side, Transaction};

use std::collections::{BTreeMap, HashMap, VecDeque};

use thiserror::Error;

use crate::catalog::CommodityId;
use crate::inventory::{Inventory, InventoryError};
use crate::types::{Price, Quantity, TraderId, Turn};

/// Trades kept per commodity for moving-average queries.
const HISTORY_CAP: usize = 256;

/// Window for the short average-price query.
const AVG_PRICE_WINDOW: usize = 10;

/// Default window for the moving-average query.
pub const MOVING_AVERAGE_WINDOW: usize = 30;

#[derive(Debug, Error)]
pub enum MarketError {
    /// The committed resource could not be reserved; no partial placement.
    #[error("order rejected: {0}")]
    Rejected(#[from] InventoryError),

    #[error("unknown order {0:?}")]
    UnknownOrder(OrderId),

    #[error("order {0:?} belongs to another trader")]
    NotOwner(OrderId),

    #[error("invalid order: {0}")]
    InvalidOrder(&'static str),

    /// Reservation accounting failed to cover a settlement transfer. A
    /// programming error: reservations are created with every order and
    /// must exactly back the open book.
    #[error("settlement transfer failed for commodity {commodity:?}: {source}")]
    Settlement {
        commodity: CommodityId,
        source: InventoryError,
    },

    #[error("trader {0:?} has no inventory")]
    UnknownTrader(TraderId),
}

/// Resolves trader references to their inventories during settlement.
/// The entity store implements this; tests can supply a plain map.
pub trait InventoryAccess {
    fn inventory_mut(&mut self, trader: TraderId) -> Option<&mut Inventory>;
}

impl InventoryAccess for HashMap<TraderId, Inventory> {
    fn inventory_mut(&mut self, trader: TraderId) -> Option<&mut Inventory> {
        self.get_mut(&trader)
    }
}

/// Matching outcome for one settlement pass over every book.
#[derive(Debug, Clone, Default)]
pub struct SettleReport {
    pub transactions: Vec<Transaction>,
}

impl SettleReport {
    pub fn trade_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn volume(&self) -> u64 {
        self.transactions.iter().map(|t| t.quantity as u64).sum()
    }
}

// === MARKET ===

#[derive(Debug, Clone, Default)]
pub struct Market {
    books: BTreeMap<CommodityId, OrderBook>,
    history: BTreeMap<CommodityId, VecDeque<Transaction>>,
    /// Order id -> commodity, for cancel/modify lookup.
    index: HashMap<OrderId, CommodityId>,
    next_order_id: u64,
}

impl Market {
    pub fn new() -> Self {
        Self::default()
    }

    // === Order placement ===

    /// Validate and reserve, then rest the order on the book.
    ///
    /// A sell reserves `qty` units of the commodity; a buy escrows
    /// `qty * price` credits. Failure leaves inventory and book untouched.
    pub fn place_order(
        &mut self,
        owner: TraderId,
        inventory: &mut Inventory,
        commodity: CommodityId,
        side: Side,
        price: Price,
        quantity: Quantity,
        turn: Turn,
    ) -> Result<OrderId, MarketError> {
        if quantity == 0 {
            return Err(MarketError::InvalidOrder("zero quantity"));
        }
        if price <= 0 {
            return Err(MarketError::InvalidOrder("non-positive price"));
        }

        match side {
            Side::Sell => inventory.reserve(commodity, quantity)?,
            Side::Buy => inventory.reserve_money(quantity as i64 * price)?,
        }

        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;

        self.books.entry(commodity).or_default().push(Order {
            id,
            owner,
            commodity,
            side,
            price,
            quantity,
            placed_turn: turn,
        });
        self.index.insert(id, commodity);

        Ok(id)
    }

    /// Remove an order and return its reservation to the owner.
    pub fn cancel_order(
        &mut self,
        owner: TraderId,
        order_id: OrderId,
        inventory: &mut Inventory,
    ) -> Result<(), MarketError> {
        let commodity = *self
            .index
            .get(&order_id)
            .ok_or(MarketError::UnknownOrder(order_id))?;
        let book = self
            .books
            .get_mut(&commodity)
            .ok_or(MarketError::UnknownOrder(order_id))?;

        let order = book
            .get(order_id)
            .ok_or(MarketError::UnknownOrder(order_id))?;
        if order.owner != owner {
            return Err(MarketError::NotOwner(order_id));
        }

        let order = book.remove(order_id).expect("order located above");
        self.index.remove(&order_id);

        match order.side {
            Side::Sell => inventory.unreserve(order.commodity, order.quantity)?,
            Side::Buy => inventory.unreserve_money(order.escrow())?,
        }
        Ok(())
    }

    /// Reprice a resting order, keeping its timestamp (and so its place in
    /// the time-priority queue). Buy orders re-reserve the escrow delta.
    pub fn modify_order(
        &mut self,
        owner: TraderId,
        order_id: OrderId,
        new_price: Price,
        inventory: &mut Inventory,
    ) -> Result<(), MarketError> {
        if new_price <= 0 {
            return Err(MarketError::InvalidOrder("non-positive price"));
        }
        let commodity = *self
            .index
            .get(&order_id)
            .ok_or(MarketError::UnknownOrder(order_id))?;
        let book = self
            .books
            .get_mut(&commodity)
            .ok_or(MarketError::UnknownOrder(order_id))?;
        let order = book
            .get_mut(order_id)
            .ok_or(MarketError::UnknownOrder(order_id))?;
        if order.owner != owner {
            return Err(MarketError::NotOwner(order_id));
        }

        if order.side == Side::Buy {
            let old_escrow = order.escrow();
            let new_escrow = order.quantity as i64 * new_price;
            if new_escrow > old_escrow {
                inventory.reserve_money(new_escrow - old_escrow)?;
            } else {
                inventory.unreserve_money(old_escrow - new_escrow)?;
            }
        }
        order.price = new_price;
        Ok(())
    }

    // === Settlement ===

    /// Match every book once, transferring reserved goods and escrowed
    /// money between inventories. Fills for each commodity are computed
    /// first and applied as one batch, so a partial pass is never visible.
    ///
    /// Execution is at the seller's ask; the buyer's escrow above the ask
    /// is refunded per unit filled. Partially-filled orders rest with
    /// their original timestamp.
    pub fn settle(
        &mut self,
        turn: Turn,
        traders: &mut dyn InventoryAccess,
    ) -> Result<SettleReport, MarketError> {
        let mut report = SettleReport::default();

        for (&commodity, book) in self.books.iter_mut() {
            let fills = settle::match_book(book);
            if fills.is_empty() {
                continue;
            }

            // Apply the batch: goods out of the seller's reservation, money
            // out of the buyer's escrow, refund the bid-ask difference.
            for fill in &fills {
                let proceeds = fill.quantity as i64 * fill.ask;
                let refund = fill.quantity as i64 * (fill.bid - fill.ask);

                let seller_inv = traders
                    .inventory_mut(fill.seller)
                    .ok_or(MarketError::UnknownTrader(fill.seller))?;
                seller_inv
                    .take_reserved(commodity, fill.quantity)
                    .map_err(|source| MarketError::Settlement { commodity, source })?;
                seller_inv.add_money(proceeds);

                let buyer_inv = traders
                    .inventory_mut(fill.buyer)
                    .ok_or(MarketError::UnknownTrader(fill.buyer))?;
                buyer_inv
                    .spend_reserved_money(proceeds)
                    .map_err(|source| MarketError::Settlement { commodity, source })?;
                buyer_inv
                    .unreserve_money(refund)
                    .map_err(|source| MarketError::Settlement { commodity, source })?;
                buyer_inv.add(commodity, fill.quantity);

                let transaction = Transaction {
                    commodity,
                    price: fill.ask,
                    quantity: fill.quantity,
                    buyer: fill.buyer,
                    seller: fill.seller,
                    turn,
                };
                report.transactions.push(transaction);

                let log = self.history.entry(commodity).or_default();
                log.push_back(transaction);
                while log.len() > HISTORY_CAP {
                    log.pop_front();
                }
            }

            // Shrink filled orders; drop the exhausted ones.
            let mut filled: HashMap<OrderId, Quantity> = HashMap::new();
            for fill in &fills {
                *filled.entry(fill.buy_id).or_insert(0) += fill.quantity;
                *filled.entry(fill.sell_id).or_insert(0) += fill.quantity;
            }
            for orders in [&mut book.buys, &mut book.sells] {
                orders.retain_mut(|o| {
                    if let Some(&qty) = filled.get(&o.id) {
                        o.quantity -= qty;
                    }
                    o.quantity > 0
                });
            }
            self.index
                .retain(|id, &mut c| c != commodity || book.get(*id).is_some());
        }

        Ok(report)
    }

    // === Queries ===

    /// (best resting buy price, best resting sell price)
    pub fn bid_ask_spread(&self, commodity: CommodityId) -> (Option<Price>, Option<Price>) {
        match self.books.get(&commodity) {
            Some(book) => (book.best_bid(), book.best_ask()),
            None => (None, None),
        }
    }

    /// Unweighted mean price of the most recent trades. None until the
    /// commodity has traded at least once.
    pub fn avg_price(&self, commodity: CommodityId) -> Option<f64> {
        let log = self.history.get(&commodity).filter(|l| !l.is_empty())?;
        let recent = log.iter().rev().take(AVG_PRICE_WINDOW);
        let (sum, n) = recent.fold((0i64, 0usize), |(s, n), t| (s + t.price, n + 1));
        Some(sum as f64 / n as f64)
    }

    /// Volume-weighted mean price over the last `window` trades. None
    /// until the commodity has traded at least once.
    pub fn moving_average(&self, commodity: CommodityId, window: usize) -> Option<f64> {
        let log = self.history.get(&commodity).filter(|l| !l.is_empty())?;
        let recent = log.iter().rev().take(window);
        let (value, volume) = recent.fold((0i64, 0u64), |(v, q), t| {
            (v + t.price * t.quantity as i64, q + t.quantity as u64)
        });
        if volume == 0 {
            return None;
        }
        Some(value as f64 / volume as f64)
    }

    /// Price of the most recent trade.
    pub fn last_price(&self, commodity: CommodityId) -> Option<Price> {
        self.history
            .get(&commodity)
            .and_then(|l| l.back())
            .map(|t| t.price)
    }

    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        let commodity = self.index.get(&order_id)?;
        self.books.get(commodity)?.get(order_id)
    }

    /// All resting orders owned by a trader, across commodities.
    pub fn orders_for(&self, trader: TraderId) -> Vec<&Order> {
        self.books
            .values()
            .flat_map(|b| b.buys.iter().chain(b.sells.iter()))
            .filter(|o| o.owner == trader)
            .collect()
    }

    pub fn book(&self, commodity: CommodityId) -> Option<&OrderBook> {
        self.books.get(&commodity)
    }

    pub fn history(&self, commodity: CommodityId) -> impl Iterator<Item = &Transaction> {
        self.history.get(&commodity).into_iter().flatten()
    }

    /// Total escrowed and reserved commitments currently backing the book;
    /// used by defensive checks in tests.
    pub fn open_order_count(&self) -> usize {
        self.books.values().map(|b| b.buys.len() + b.sells.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    const FOOD: CommodityId = CommodityId(0);
    const FUEL: CommodityId = CommodityId(1);

    fn trader(n: u64) -> TraderId {
        TraderId::Actor(KeyData::from_ffi(n).into())
    }

    fn funded(money: i64) -> Inventory {
        Inventory::new().with_money(money)
    }

    fn stocked(commodity: CommodityId, qty: Quantity) -> Inventory {
        let mut inv = Inventory::new();
        inv.add(commodity, qty);
        inv
    }

    #[test]
    fn test_buy_order_escrows_money() {
        let mut market = Market::new();
        let mut inv = funded(100);

        let id = market
            .place_order(trader(1), &mut inv, FOOD, Side::Buy, 10, 5, 1)
            .unwrap();

        assert_eq!(inv.money(), 100);
        assert_eq!(inv.reserved_money(), 50);
        assert_eq!(inv.available_money(), 50);
        assert!(market.order(id).is_some());
    }

    #[test]
    fn test_sell_order_reserves_goods() {
        let mut market = Market::new();
        let mut inv = stocked(FOOD, 10);

        market
            .place_order(trader(1), &mut inv, FOOD, Side::Sell, 8, 5, 1)
            .unwrap();

        assert_eq!(inv.quantity(FOOD), 10);
        assert_eq!(inv.available(FOOD), 5);
        assert_eq!(inv.reserved(FOOD), 5);
    }

    #[test]
    fn test_placement_is_all_or_nothing() {
        let mut market = Market::new();
        let mut inv = funded(30);

        let err = market
            .place_order(trader(1), &mut inv, FOOD, Side::Buy, 10, 5, 1)
            .unwrap_err();
        assert!(matches!(err, MarketError::Rejected(_)));
        assert_eq!(inv.reserved_money(), 0);
        assert_eq!(market.open_order_count(), 0);
    }

    #[test]
    fn test_cancel_restores_reservation() {
        let mut market = Market::new();
        let mut buyer = funded(100);
        let mut seller = stocked(FOOD, 10);

        let buy = market
            .place_order(trader(1), &mut buyer, FOOD, Side::Buy, 10, 5, 1)
            .unwrap();
        let sell = market
            .place_order(trader(2), &mut seller, FOOD, Side::Sell, 8, 5, 1)
            .unwrap();

        market.cancel_order(trader(1), buy, &mut buyer).unwrap();
        market.cancel_order(trader(2), sell, &mut seller).unwrap();

        assert_eq!(buyer.money(), 100);
        assert_eq!(buyer.reserved_money(), 0);
        assert_eq!(seller.available(FOOD), 10);
        assert_eq!(seller.reserved(FOOD), 0);
        assert_eq!(market.open_order_count(), 0);
    }

    #[test]
    fn test_cancel_rejects_foreign_order() {
        let mut market = Market::new();
        let mut buyer = funded(100);
        let buy = market
            .place_order(trader(1), &mut buyer, FOOD, Side::Buy, 10, 5, 1)
            .unwrap();

        let mut thief_inv = funded(0);
        let err = market
            .cancel_order(trader(2), buy, &mut thief_inv)
            .unwrap_err();
        assert!(matches!(err, MarketError::NotOwner(_)));
        assert!(market.order(buy).is_some());
    }

    #[test]
    fn test_modify_reprices_escrow() {
        let mut market = Market::new();
        let mut buyer = funded(100);
        let buy = market
            .place_order(trader(1), &mut buyer, FOOD, Side::Buy, 10, 5, 1)
            .unwrap();
        assert_eq!(buyer.reserved_money(), 50);

        market.modify_order(trader(1), buy, 12, &mut buyer).unwrap();
        assert_eq!(buyer.reserved_money(), 60);

        market.modify_order(trader(1), buy, 8, &mut buyer).unwrap();
        assert_eq!(buyer.reserved_money(), 40);
        assert_eq!(market.order(buy).unwrap().price, 8);
    }

    fn two_party_setup() -> (Market, HashMap<TraderId, Inventory>) {
        let mut traders = HashMap::new();
        traders.insert(trader(1), funded(100));
        traders.insert(trader(2), stocked(FOOD, 10));
        (Market::new(), traders)
    }

    #[test]
    fn test_settle_transfers_at_ask_with_refund() {
        let (mut market, mut traders) = two_party_setup();

        // Buyer bids 10, seller asks 8: trade at 8, refund 2/unit.
        market
            .place_order(
                trader(1),
                traders.get_mut(&trader(1)).unwrap(),
                FOOD,
                Side::Buy,
                10,
                5,
                1,
            )
            .unwrap();
        market
            .place_order(
                trader(2),
                traders.get_mut(&trader(2)).unwrap(),
                FOOD,
                Side::Sell,
                8,
                5,
                1,
            )
            .unwrap();

        let report = market.settle(1, &mut traders).unwrap();
        assert_eq!(report.trade_count(), 1);
        assert_eq!(report.volume(), 5);

        let buyer = &traders[&trader(1)];
        assert_eq!(buyer.quantity(FOOD), 5);
        assert_eq!(buyer.money(), 60, "paid 40 at the ask, refunded 10");
        assert_eq!(buyer.reserved_money(), 0);

        let seller = &traders[&trader(2)];
        assert_eq!(seller.quantity(FOOD), 5);
        assert_eq!(seller.money(), 40);
        assert_eq!(seller.reserved(FOOD), 0);

        assert_eq!(market.open_order_count(), 0);
        assert_eq!(market.last_price(FOOD), Some(8));
    }

    #[test]
    fn test_partial_fill_rests_with_original_timestamp() {
        let (mut market, mut traders) = two_party_setup();

        let sell = market
            .place_order(
                trader(2),
                traders.get_mut(&trader(2)).unwrap(),
                FOOD,
                Side::Sell,
                5,
                10,
                1,
            )
            .unwrap();
        market
            .place_order(
                trader(1),
                traders.get_mut(&trader(1)).unwrap(),
                FOOD,
                Side::Buy,
                5,
                4,
                1,
            )
            .unwrap();

        market.settle(1, &mut traders).unwrap();

        let rest = market.order(sell).expect("remainder still resting");
        assert_eq!(rest.quantity, 6);
        assert_eq!(rest.placed_turn, 1);
        assert_eq!(rest.id, sell);

        // The remainder is still backed by the seller's reservation.
        assert_eq!(traders[&trader(2)].reserved(FOOD), 6);
    }

    #[test]
    fn test_unmatched_orders_persist_across_settles() {
        let (mut market, mut traders) = two_party_setup();

        market
            .place_order(
                trader(1),
                traders.get_mut(&trader(1)).unwrap(),
                FOOD,
                Side::Buy,
                7,
                5,
                1,
            )
            .unwrap();
        market
            .place_order(
                trader(2),
                traders.get_mut(&trader(2)).unwrap(),
                FOOD,
                Side::Sell,
                10,
                5,
                1,
            )
            .unwrap();

        let report = market.settle(1, &mut traders).unwrap();
        assert_eq!(report.trade_count(), 0);
        assert_eq!(market.open_order_count(), 2);
        assert_eq!(market.avg_price(FOOD), None);
    }

    #[test]
    fn test_price_queries() {
        let (mut market, mut traders) = two_party_setup();

        for (qty, ask) in [(2u32, 6i64), (3, 8)] {
            market
                .place_order(
                    trader(1),
                    traders.get_mut(&trader(1)).unwrap(),
                    FOOD,
                    Side::Buy,
                    ask,
                    qty,
                    1,
                )
                .unwrap();
            market
                .place_order(
                    trader(2),
                    traders.get_mut(&trader(2)).unwrap(),
                    FOOD,
                    Side::Sell,
                    ask,
                    qty,
                    1,
                )
                .unwrap();
        }
        market.settle(1, &mut traders).unwrap();

        // avg: (6 + 8) / 2; vwap: (2*6 + 3*8) / 5
        assert_eq!(market.avg_price(FOOD), Some(7.0));
        assert_eq!(market.moving_average(FOOD, MOVING_AVERAGE_WINDOW), Some(7.2));
        assert_eq!(market.avg_price(FUEL), None);
        assert_eq!(market.moving_average(FUEL, MOVING_AVERAGE_WINDOW), None);
        assert_eq!(market.bid_ask_spread(FUEL), (None, None));
    }
}
