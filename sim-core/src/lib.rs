//! Turn-based interplanetary economy simulation.
//!
//! Actors produce, consume, and trade commodities on planets; ships
//! arbitrage price differences between planetary markets. Each turn the
//! scheduler runs every entity's action hooks in a freshly randomized
//! order, then settles every market once. Inventories carry an
//! available/reserved split so that deferred matching can never
//! double-commit goods or money.

pub mod brains;
pub mod catalog;
pub mod drives;
pub mod entities;
pub mod inventory;
pub mod market;
pub mod production;
pub mod skills;
pub mod snapshot;
mod tick;
mod types;
mod world;

pub use brains::{
    ActorBrain, ActorView, ColonistBrain, EconomicAction, GOVERNMENT_WAGE, IndustrialistBrain,
    MarketAction, MarketMakerBrain, PlanetInfo, ShipBrain, ShipView, TraderBrain,
};
pub use catalog::{Catalog, CommodityDef, CommodityId, ProcessDef, ProcessId};
pub use drives::{Drive, DriveMetrics, DriveSet};
pub use entities::{Actor, Entities, Ship, ShipStatus};
pub use inventory::{Inventory, InventoryError};
pub use market::{
    InventoryAccess, MOVING_AVERAGE_WINDOW, Market, MarketError, Order, OrderBook, OrderId,
    SettleReport, Side, Transaction,
};
pub use production::{BlockedReason, ProcessOutcome, ProcessResult};
pub use skills::{SkillId, SkillSet, UNSKILLED_RATING};
pub use snapshot::WorldSnapshot;
pub use tick::TurnSummary;
pub use types::{ActorId, Money, PlanetId, Price, Quantity, ShipId, TraderId, Turn};
pub use world::{Planet, World};
