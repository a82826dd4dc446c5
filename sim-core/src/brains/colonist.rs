use crate::market::Side;
use crate::production;
use crate::types::Quantity;

use super::{
    ActorBrain, ActorView, EconomicAction, GOVERNMENT_WAGE, MarketAction, price_estimate,
};

/// Stock of food below which a colonist drops everything to make more.
const FOOD_PANIC_LEVEL: Quantity = 5;

/// Food a colonist holds back from the market for its own pantry.
const FOOD_KEEP: Quantity = 6;

/// Generalist actor: feeds itself first, then chases whichever process
/// pays best at current prices, falling back to government work. Trades
/// as a price taker, matching resting orders rather than quoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColonistBrain;

impl ColonistBrain {
    /// Most profitable runnable process at current price estimates, if any
    /// beats a turn of government work.
    fn most_profitable_process(&self, view: &ActorView) -> Option<EconomicAction> {
        let mut best = None;
        let mut best_profit = GOVERNMENT_WAGE as f64;

        for process in view.catalog.processes() {
            if production::can_execute(process, view.inventory).is_err() {
                continue;
            }
            let input_cost: f64 = process
                .inputs
                .iter()
                .map(|&(c, q)| price_estimate(view.market, c) * q as f64)
                .sum();
            let output_value: f64 = process
                .outputs
                .iter()
                .map(|&(c, q)| price_estimate(view.market, c) * q as f64)
                .sum();
            let profit = output_value - input_cost;
            if profit > best_profit {
                best_profit = profit;
                best = Some(EconomicAction::RunProcess(process.id));
            }
        }
        best
    }

    /// Price-taker trades for one commodity: buy up to `min_keep` against
    /// the best resting ask, sell the excess into the best resting bid.
    fn trade_commodity(
        &self,
        view: &ActorView,
        key: &str,
        min_keep: Quantity,
        actions: &mut Vec<MarketAction>,
    ) {
        let Some(commodity) = view.catalog.find_commodity(key) else {
            return;
        };

        let held = view.inventory.quantity(commodity);
        if held < min_keep {
            if let Some(ask) = view.best_foreign_ask(commodity) {
                let wanted = min_keep - held;
                let affordable = (view.inventory.available_money() / ask.price).max(0) as Quantity;
                let quantity = wanted.min(affordable);
                if quantity > 0 {
                    actions.push(MarketAction::Place {
                        commodity,
                        side: Side::Buy,
                        price: ask.price,
                        quantity,
                    });
                }
            }
            return;
        }

        let excess = view.inventory.available(commodity).saturating_sub(min_keep);
        if excess > 0 {
            if let Some(bid) = view.best_foreign_bid(commodity) {
                actions.push(MarketAction::Place {
                    commodity,
                    side: Side::Sell,
                    price: bid.price,
                    quantity: excess,
                });
            }
        }
    }
}

impl ActorBrain for ColonistBrain {
    fn decide_economic_action(&self, view: &ActorView) -> Option<EconomicAction> {
        let food = view.catalog.find_commodity("food");
        let biomass = view.catalog.find_commodity("biomass");

        // Pantry first: produce food directly, or gather the biomass for it.
        // A hungry turn on record counts as a panic even with stock on hand.
        let starving = view
            .drives
            .map(|d| d.food.metrics.debt > 0.0)
            .unwrap_or(false);
        if let (Some(food), Some(biomass)) = (food, biomass) {
            if starving || view.inventory.quantity(food) < FOOD_PANIC_LEVEL {
                if let Some(make_food) = view.catalog.find_process("make_food") {
                    if production::can_execute(view.catalog.process(make_food), view.inventory)
                        .is_ok()
                    {
                        return Some(EconomicAction::RunProcess(make_food));
                    }
                }
                if view.inventory.quantity(biomass) < 2 {
                    if let Some(gather) = view.catalog.find_process("gather_biomass") {
                        if production::can_execute(view.catalog.process(gather), view.inventory)
                            .is_ok()
                        {
                            return Some(EconomicAction::RunProcess(gather));
                        }
                    }
                }
            }
        }

        self.most_profitable_process(view)
            .or(Some(EconomicAction::GovernmentWork))
    }

    fn decide_market_actions(&self, view: &ActorView) -> Vec<MarketAction> {
        let mut actions: Vec<MarketAction> = view
            .my_orders()
            .iter()
            .map(|o| MarketAction::Cancel(o.id))
            .collect();

        self.trade_commodity(view, "food", FOOD_KEEP, &mut actions);
        self.trade_commodity(view, "nova_fuel", 0, &mut actions);

        // Cover whichever non-food need is running down, one unit at a time.
        if let Some(drives) = view.drives {
            let pressing = drives.most_pressing();
            let commodity = pressing.commodity();
            if pressing.metrics.debt > 0.0
                && view.catalog.find_commodity("food") != Some(commodity)
                && view.inventory.available(commodity) == 0
            {
                if let Some(ask) = view.best_foreign_ask(commodity) {
                    if view.inventory.available_money() >= ask.price {
                        actions.push(MarketAction::Place {
                            commodity,
                            side: Side::Buy,
                            price: ask.price,
                            quantity: 1,
                        });
                    }
                }
            }
        }

        actions
    }
}
