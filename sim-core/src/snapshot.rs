//! Read-only projection of world state for rendering and export.
//!
//! Captured after `run_turn` completes; never consulted by the core
//! itself.

use serde::Serialize;
use slotmap::Key;

use crate::entities::ShipStatus;
use crate::world::World;

#[derive(Debug, Clone, Serialize)]
pub struct MarketPriceSnapshot {
    pub commodity: String,
    pub last_price: Option<i64>,
    pub best_bid: Option<i64>,
    pub best_ask: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanetSnapshot {
    pub id: u64,
    pub name: String,
    pub prices: Vec<MarketPriceSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HoldingSnapshot {
    pub commodity: String,
    pub total: u32,
    pub reserved: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActorSnapshot {
    pub name: String,
    pub money: i64,
    pub reserved_money: i64,
    pub holdings: Vec<HoldingSnapshot>,
    pub last_action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShipSnapshot {
    pub name: String,
    pub money: i64,
    pub status: ShipStatus,
    pub cargo: Vec<HoldingSnapshot>,
    pub last_action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub turn: u64,
    pub planets: Vec<PlanetSnapshot>,
    pub actors: Vec<ActorSnapshot>,
    pub ships: Vec<ShipSnapshot>,
}

impl WorldSnapshot {
    pub fn capture(world: &World) -> Self {
        let catalog = &world.catalog;
        let commodity_name =
            |id: crate::catalog::CommodityId| catalog.commodity(id).key.clone();

        let planets = world
            .planets
            .iter()
            .map(|(id, p)| PlanetSnapshot {
                id: id.data().as_ffi(),
                name: p.name.clone(),
                prices: catalog
                    .commodities()
                    .map(|c| {
                        let (best_bid, best_ask) = p.market.bid_ask_spread(c.id);
                        MarketPriceSnapshot {
                            commodity: c.key.clone(),
                            last_price: p.market.last_price(c.id),
                            best_bid,
                            best_ask,
                        }
                    })
                    .collect(),
            })
            .collect();

        // Holdings are sorted so snapshots of identical states serialize
        // identically regardless of hash-map iteration order.
        let sorted_holdings = |inv: &crate::inventory::Inventory| {
            let mut holdings: Vec<HoldingSnapshot> = inv
                .holdings()
                .map(|(c, total, reserved)| HoldingSnapshot {
                    commodity: commodity_name(c),
                    total,
                    reserved,
                })
                .collect();
            holdings.sort_by(|a, b| a.commodity.cmp(&b.commodity));
            holdings
        };

        let actors = world
            .entities
            .actors
            .values()
            .map(|a| ActorSnapshot {
                name: a.name.clone(),
                money: a.inventory.money(),
                reserved_money: a.inventory.reserved_money(),
                holdings: sorted_holdings(&a.inventory),
                last_action: a.last_action.clone(),
            })
            .collect();

        let ships = world
            .entities
            .ships
            .values()
            .map(|s| ShipSnapshot {
                name: s.name.clone(),
                money: s.cargo.money(),
                status: s.status,
                cargo: sorted_holdings(&s.cargo),
                last_action: s.last_action.clone(),
            })
            .collect();

        Self {
            turn: world.turn,
            planets,
            actors,
            ships,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
