//! Actors and ships: the holders of inventory and decision policy.

mod actor;
mod ship;

pub use actor::Actor;
pub use ship::{MAINTENANCE_CHANCE, MAINTENANCE_FUEL_COST, Ship, ShipStatus};

use slotmap::SlotMap;

use crate::inventory::Inventory;
use crate::market::InventoryAccess;
use crate::types::{ActorId, ShipId, TraderId};

/// Owning store for every entity in the world. Settlement resolves trader
/// references through this to reach both actor and ship inventories.
#[derive(Default)]
pub struct Entities {
    pub actors: SlotMap<ActorId, Actor>,
    pub ships: SlotMap<ShipId, Ship>,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inventory(&self, trader: TraderId) -> Option<&Inventory> {
        match trader {
            TraderId::Actor(id) => self.actors.get(id).map(|a| &a.inventory),
            TraderId::Ship(id) => self.ships.get(id).map(|s| &s.cargo),
        }
    }

}

impl InventoryAccess for Entities {
    fn inventory_mut(&mut self, trader: TraderId) -> Option<&mut Inventory> {
        match trader {
            TraderId::Actor(id) => self.actors.get_mut(id).map(|a| &mut a.inventory),
            TraderId::Ship(id) => self.ships.get_mut(id).map(|s| &mut s.cargo),
        }
    }
}
