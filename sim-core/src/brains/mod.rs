//! Pluggable decision policy per actor and ship.
//!
//! Brains decide from read-only views of the turn-start state and return
//! commands; the scheduler executes the commands against the mutable world.
//! The split keeps every mutation inside the turn phases and makes the
//! read/write separation explicit.

mod colonist;
mod industrialist;
mod market_maker;
mod trader;

pub use colonist::ColonistBrain;
pub use industrialist::IndustrialistBrain;
pub use market_maker::MarketMakerBrain;
pub use trader::TraderBrain;

use crate::catalog::{Catalog, CommodityId, ProcessId};
use crate::drives::DriveSet;
use crate::entities::Ship;
use crate::inventory::Inventory;
use crate::market::{Market, Order, OrderId, Side};
use crate::skills::SkillSet;
use crate::types::{PlanetId, Price, Quantity, TraderId, Turn};

/// Wage paid for a turn of government work. The external money faucet
/// keeping a young colony liquid.
pub const GOVERNMENT_WAGE: i64 = 10;

/// Price assumed for a commodity that has never traded.
pub const DEFAULT_PRICE_ESTIMATE: f64 = 5.0;

/// Best guess at a commodity's going rate: recent trades, else the default.
pub fn price_estimate(market: &Market, commodity: CommodityId) -> f64 {
    market
        .avg_price(commodity)
        .unwrap_or(DEFAULT_PRICE_ESTIMATE)
}

// === COMMANDS ===

/// The one production/economic action an actor takes per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EconomicAction {
    RunProcess(ProcessId),
    GovernmentWork,
}

/// Market orders an entity wants placed or cancelled this turn. Cancels
/// execute before placements, so freed reservations back the new orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketAction {
    Place {
        commodity: CommodityId,
        side: Side,
        price: Price,
        quantity: Quantity,
    },
    Cancel(OrderId),
}

// === VIEWS ===

/// Read-only slice of the world an actor brain decides from. Market state
/// reflects only fully-settled prior turns.
pub struct ActorView<'a> {
    pub trader: TraderId,
    pub inventory: &'a Inventory,
    pub skills: &'a SkillSet,
    pub drives: Option<&'a DriveSet>,
    pub market: &'a Market,
    pub catalog: &'a Catalog,
    pub turn: Turn,
}

impl ActorView<'_> {
    pub fn my_orders(&self) -> Vec<&Order> {
        self.market.orders_for(self.trader)
    }

    /// Best resting ask not owned by this trader.
    pub fn best_foreign_ask(&self, commodity: CommodityId) -> Option<&Order> {
        let book = self.market.book(commodity)?;
        book.sells
            .iter()
            .filter(|o| o.owner != self.trader)
            .min_by_key(|o| (o.price, o.id))
    }

    /// Best resting bid not owned by this trader.
    pub fn best_foreign_bid(&self, commodity: CommodityId) -> Option<&Order> {
        let book = self.market.book(commodity)?;
        book.buys
            .iter()
            .filter(|o| o.owner != self.trader)
            .max_by_key(|o| (o.price, std::cmp::Reverse(o.id)))
    }
}

/// A planet as seen from a ship deciding where to fly.
pub struct PlanetInfo<'a> {
    pub id: PlanetId,
    pub name: &'a str,
    pub position: (f64, f64),
    pub market: &'a Market,
}

/// Read-only slice of the world a ship brain decides from.
pub struct ShipView<'a> {
    pub trader: TraderId,
    pub ship: &'a Ship,
    /// Market at the ship's current planet.
    pub market: &'a Market,
    pub catalog: &'a Catalog,
    /// Every planet in the world, current one included.
    pub planets: &'a [PlanetInfo<'a>],
    pub turn: Turn,
}

impl ShipView<'_> {
    pub fn my_orders(&self) -> Vec<&Order> {
        self.market.orders_for(self.trader)
    }

    pub fn current_position(&self) -> (f64, f64) {
        self.planets
            .iter()
            .find(|p| p.id == self.ship.planet)
            .map(|p| p.position)
            .unwrap_or((0.0, 0.0))
    }
}

// === TRAITS ===

/// Decision policy for an actor. Implementations must not assume any
/// particular execution order among actors within a turn.
pub trait ActorBrain {
    fn decide_economic_action(&self, view: &ActorView) -> Option<EconomicAction>;
    fn decide_market_actions(&self, view: &ActorView) -> Vec<MarketAction>;
}

/// Decision policy for a ship docked at a planet.
pub trait ShipBrain {
    fn decide_market_actions(&self, view: &ShipView) -> Vec<MarketAction>;
    fn decide_travel(&self, view: &ShipView) -> Option<PlanetId>;
}
