use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::brains::ShipBrain;
use crate::catalog::CommodityId;
use crate::inventory::Inventory;
use crate::types::{Money, PlanetId};

/// Fuel units consumed by one maintenance overhaul.
pub const MAINTENANCE_FUEL_COST: u32 = 5;

/// Chance a departing ship is grounded for maintenance instead.
pub const MAINTENANCE_CHANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipStatus {
    Docked,
    Traveling,
    NeedsMaintenance,
}

/// A trading vessel moving transportable commodities between planets.
/// Its cargo hold is an ordinary inventory, so ships trade on planetary
/// markets under the same reservation rules as actors.
pub struct Ship {
    pub name: String,
    /// Current planet while docked; origin while traveling.
    pub planet: PlanetId,
    pub destination: Option<PlanetId>,
    pub cargo: Inventory,
    pub cargo_capacity: u32,
    pub fuel_capacity: u32,
    /// Divisor on journey fuel cost; > 1.0 is better than stock.
    pub fuel_efficiency: f64,
    pub status: ShipStatus,
    /// Fraction of the current journey completed.
    pub travel_progress: f64,
    /// Total turns for the current journey.
    pub travel_time: u32,
    pub brain: Box<dyn ShipBrain>,
    pub last_action: String,
}

impl Ship {
    pub fn new(name: impl Into<String>, planet: PlanetId, brain: Box<dyn ShipBrain>) -> Self {
        Self {
            name: name.into(),
            planet,
            destination: None,
            cargo: Inventory::new(),
            cargo_capacity: 100,
            fuel_capacity: 50,
            fuel_efficiency: 1.0,
            status: ShipStatus::Docked,
            travel_progress: 0.0,
            travel_time: 0,
            brain,
            last_action: String::new(),
        }
    }

    pub fn with_money(mut self, money: Money) -> Self {
        self.cargo.add_money(money);
        self
    }

    pub fn with_cargo_capacity(mut self, capacity: u32) -> Self {
        self.cargo_capacity = capacity;
        self
    }

    pub fn with_fuel_capacity(mut self, capacity: u32) -> Self {
        self.fuel_capacity = capacity;
        self
    }

    /// Euclidean distance between planet positions.
    pub fn distance(from: (f64, f64), to: (f64, f64)) -> f64 {
        ((to.0 - from.0).powi(2) + (to.1 - from.1).powi(2)).sqrt()
    }

    /// Base fuel for a journey: 1 unit per 10 distance, rounded up.
    pub fn fuel_needed(distance: f64) -> u32 {
        (distance / 10.0).ceil() as u32
    }

    /// Fuel for this ship after efficiency adjustment.
    pub fn adjusted_fuel_needed(&self, distance: f64) -> u32 {
        (Self::fuel_needed(distance) as f64 / self.fuel_efficiency).ceil() as u32
    }

    pub fn cargo_space_available(&self) -> u32 {
        self.cargo_capacity
            .saturating_sub(self.cargo.total_units() as u32)
    }

    /// Begin a journey. Rolls the maintenance check, consumes fuel, and
    /// sets the travel clock (1 turn per 20 distance, minimum 1).
    pub fn start_journey<R: Rng>(
        &mut self,
        destination: PlanetId,
        distance: f64,
        fuel_commodity: CommodityId,
        rng: &mut R,
    ) -> bool {
        if self.status != ShipStatus::Docked || destination == self.planet {
            return false;
        }

        if rng.random::<f64>() < MAINTENANCE_CHANCE {
            self.status = ShipStatus::NeedsMaintenance;
            self.last_action = "Maintenance required before departure".to_string();
            return false;
        }

        let fuel = self.adjusted_fuel_needed(distance);
        if self.cargo.remove(fuel_commodity, fuel).is_err() {
            self.last_action = format!("Insufficient fuel for journey (need {fuel})");
            return false;
        }

        self.travel_time = ((distance / 20.0).ceil() as u32).max(1);
        self.travel_progress = 0.0;
        self.status = ShipStatus::Traveling;
        self.destination = Some(destination);
        self.last_action = format!("Departed ({} turns)", self.travel_time);
        true
    }

    /// Advance the journey one turn. Returns true on arrival.
    pub fn update_journey(&mut self) -> bool {
        if self.status != ShipStatus::Traveling {
            return false;
        }
        let Some(destination) = self.destination else {
            self.status = ShipStatus::Docked;
            return false;
        };

        self.travel_progress += 1.0 / self.travel_time as f64;
        if self.travel_progress + 1e-9 >= 1.0 {
            self.planet = destination;
            self.destination = None;
            self.status = ShipStatus::Docked;
            self.travel_progress = 0.0;
            self.last_action = "Arrived".to_string();
            true
        } else {
            let remaining = ((1.0 - self.travel_progress) * self.travel_time as f64).ceil();
            self.last_action = format!("En route ({remaining} turns remaining)");
            false
        }
    }

    /// Overhaul using fuel stock. Returns to Docked on success.
    pub fn perform_maintenance(&mut self, fuel_commodity: CommodityId) -> bool {
        if self
            .cargo
            .remove(fuel_commodity, MAINTENANCE_FUEL_COST)
            .is_ok()
        {
            self.status = ShipStatus::Docked;
            self.last_action = format!("Performed maintenance using {MAINTENANCE_FUEL_COST} fuel");
            true
        } else {
            self.last_action = "Cannot perform maintenance - insufficient fuel".to_string();
            false
        }
    }
}
