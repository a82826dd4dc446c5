use crate::catalog::ProcessId;
use crate::market::Side;
use crate::production;
use crate::types::Quantity;

use super::{ActorBrain, ActorView, EconomicAction, MarketAction, price_estimate};

/// Food the industrialist keeps off the market for its own consumption.
const FOOD_KEEP: Quantity = 6;

/// Input stock to hold, in runs of the specialty process.
const INPUT_BUFFER_RUNS: Quantity = 3;

/// Specialist actor committed to one process: keeps an input buffer
/// stocked, runs the process every turn it can, and sells the output at a
/// margin over the going rate.
#[derive(Debug, Clone, Copy)]
pub struct IndustrialistBrain {
    pub specialty: ProcessId,
    /// Multiplier over the price estimate when quoting output.
    pub margin: f64,
}

impl IndustrialistBrain {
    pub fn new(specialty: ProcessId) -> Self {
        Self {
            specialty,
            margin: 1.1,
        }
    }
}

impl ActorBrain for IndustrialistBrain {
    fn decide_economic_action(&self, view: &ActorView) -> Option<EconomicAction> {
        let process = view.catalog.process(self.specialty);
        if production::can_execute(process, view.inventory).is_ok() {
            Some(EconomicAction::RunProcess(self.specialty))
        } else {
            // Can't run: earn toward the missing inputs instead.
            Some(EconomicAction::GovernmentWork)
        }
    }

    fn decide_market_actions(&self, view: &ActorView) -> Vec<MarketAction> {
        let mut actions: Vec<MarketAction> = view
            .my_orders()
            .iter()
            .map(|o| MarketAction::Cancel(o.id))
            .collect();

        let process = view.catalog.process(self.specialty);
        let food = view.catalog.find_commodity("food");
        let mut budget = view.inventory.available_money();

        // Restock inputs toward the buffer, paying up to the going rate.
        for &(commodity, per_run) in &process.inputs {
            let target = per_run * INPUT_BUFFER_RUNS;
            let held = view.inventory.quantity(commodity);
            if held >= target {
                continue;
            }
            let price = match view.best_foreign_ask(commodity) {
                Some(ask) => ask.price,
                None => price_estimate(view.market, commodity).ceil() as i64,
            };
            if price <= 0 {
                continue;
            }
            let affordable = (budget / price).max(0) as Quantity;
            let quantity = (target - held).min(affordable);
            if quantity > 0 {
                budget -= quantity as i64 * price;
                actions.push(MarketAction::Place {
                    commodity,
                    side: Side::Buy,
                    price,
                    quantity,
                });
            }
        }

        // Quote output at a margin over the estimate.
        for &(commodity, _) in &process.outputs {
            let keep = if Some(commodity) == food { FOOD_KEEP } else { 0 };
            let quantity = view.inventory.available(commodity).saturating_sub(keep);
            if quantity == 0 {
                continue;
            }
            let price = (price_estimate(view.market, commodity) * self.margin).ceil() as i64;
            actions.push(MarketAction::Place {
                commodity,
                side: Side::Sell,
                price: price.max(1),
                quantity,
            });
        }

        actions
    }
}
