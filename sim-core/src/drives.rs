//! Actor needs: food, clothing, shelter.
//!
//! Drives own the consumption side of the turn and expose normalized
//! metrics that brains read when scoring actions. The metrics have memory
//! (missed-consumption debt decays rather than resetting), so drives live
//! on the actor.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CommodityId};
use crate::inventory::Inventory;
use crate::types::Turn;

/// All metrics in [0, 1].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DriveMetrics {
    /// Was the need met this turn?
    pub health: f64,
    /// Accumulated deprivation; decays when the need is met.
    pub debt: f64,
    /// How deep the stock buffer runs relative to its target.
    pub buffer: f64,
    /// Relative weight of this drive for action scoring.
    pub urgency: f64,
}

const DEBT_DECAY_FACTOR: f64 = 0.8;
const DEBT_MISS_PENALTY: f64 = 0.2;

/// Buffer -> [0,1] with diminishing returns:
/// ln(1 + min(x, cap)/target) / ln(1 + cap/target).
fn log_norm_ratio(x: f64, target: f64, cap: f64) -> f64 {
    let ratio = x.clamp(0.0, cap) / target;
    let denom = (1.0 + cap / target).ln();
    if denom <= 0.0 {
        0.0
    } else {
        ((1.0 + ratio).ln() / denom).clamp(0.0, 1.0)
    }
}

// === SINGLE DRIVE ===

/// One recurring need: consume `amount` of `commodity` every `interval`
/// turns. Food is the interval-1 case; clothing and shelter wear out on
/// longer cycles.
#[derive(Debug, Clone)]
pub struct Drive {
    commodity: CommodityId,
    amount: u32,
    interval: Turn,
    buffer_target: f64,
    buffer_cap: f64,
    urgency: f64,
    pub metrics: DriveMetrics,
}

impl Drive {
    pub fn new(
        commodity: CommodityId,
        amount: u32,
        interval: Turn,
        buffer_target: f64,
        buffer_cap: f64,
        urgency: f64,
    ) -> Self {
        Self {
            commodity,
            amount,
            interval,
            buffer_target,
            buffer_cap,
            urgency,
            metrics: DriveMetrics {
                health: 1.0,
                debt: 0.0,
                buffer: 0.0,
                urgency,
            },
        }
    }

    pub fn commodity(&self) -> CommodityId {
        self.commodity
    }

    /// Consume if due this turn and update metrics.
    pub fn tick(&mut self, turn: Turn, inventory: &mut Inventory) -> DriveMetrics {
        let due = self.interval <= 1 || turn % self.interval == 0;

        let satisfied = if due {
            inventory.remove(self.commodity, self.amount).is_ok()
        } else {
            // Off-cycle turns keep last health; debt still decays.
            self.metrics.health >= 1.0
        };

        let stock_turns =
            inventory.available(self.commodity) as f64 / self.amount.max(1) as f64 * self.interval as f64;

        self.metrics.health = if satisfied { 1.0 } else { 0.0 };
        self.metrics.debt = (self.metrics.debt * DEBT_DECAY_FACTOR
            + if satisfied { 0.0 } else { DEBT_MISS_PENALTY })
        .min(1.0);
        self.metrics.buffer = log_norm_ratio(stock_turns, self.buffer_target, self.buffer_cap);
        self.metrics.urgency = self.urgency;
        self.metrics
    }
}

// === DRIVE SET ===

/// The standard need bundle for a colonist actor.
#[derive(Debug, Clone)]
pub struct DriveSet {
    pub food: Drive,
    pub clothing: Drive,
    pub shelter: Drive,
}

impl DriveSet {
    /// Wire drives to the catalog's standard commodities.
    pub fn standard(catalog: &Catalog) -> Option<Self> {
        let food = catalog.find_commodity("food")?;
        let clothing = catalog.find_commodity("clothing")?;
        let shelter = catalog.find_commodity("shelter")?;
        Some(Self {
            food: Drive::new(food, 1, 1, 7.0, 30.0, 1.0),
            clothing: Drive::new(clothing, 1, 10, 20.0, 60.0, 0.5),
            shelter: Drive::new(shelter, 1, 25, 50.0, 100.0, 0.3),
        })
    }

    pub fn tick(&mut self, turn: Turn, inventory: &mut Inventory) {
        self.food.tick(turn, inventory);
        self.clothing.tick(turn, inventory);
        self.shelter.tick(turn, inventory);
    }

    /// The drive most in need of attention, weighted by urgency.
    pub fn most_pressing(&self) -> &Drive {
        let score = |d: &Drive| (d.metrics.debt + (1.0 - d.metrics.buffer)) * d.metrics.urgency;
        let mut best = &self.food;
        for d in [&self.clothing, &self.shelter] {
            if score(d) > score(best) {
                best = d;
            }
        }
        best
    }
}
