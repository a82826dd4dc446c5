use crate::catalog::CommodityId;
use crate::market::{MOVING_AVERAGE_WINDOW, Side};
use crate::types::Quantity;

use super::{ActorBrain, ActorView, EconomicAction, MarketAction, price_estimate};

/// Stock of each quoted commodity the maker tries to hold.
const TARGET_STOCK: Quantity = 20;

/// Liquidity provider: requotes both sides of each configured commodity
/// every turn around the moving average. Buys below, sells above; the
/// spread is its compensation for carrying inventory.
#[derive(Debug, Clone)]
pub struct MarketMakerBrain {
    pub commodities: Vec<CommodityId>,
    /// Half-spread as a fraction of the mid price.
    pub half_spread: f64,
}

impl MarketMakerBrain {
    pub fn new(commodities: Vec<CommodityId>) -> Self {
        Self {
            commodities,
            half_spread: 0.1,
        }
    }

    fn mid(&self, view: &ActorView, commodity: CommodityId) -> f64 {
        view.market
            .moving_average(commodity, MOVING_AVERAGE_WINDOW)
            .unwrap_or_else(|| price_estimate(view.market, commodity))
    }
}

impl ActorBrain for MarketMakerBrain {
    fn decide_economic_action(&self, view: &ActorView) -> Option<EconomicAction> {
        let _ = view;
        // Makers earn from the spread, not from production.
        Some(EconomicAction::GovernmentWork)
    }

    fn decide_market_actions(&self, view: &ActorView) -> Vec<MarketAction> {
        let mut actions: Vec<MarketAction> = view
            .my_orders()
            .iter()
            .map(|o| MarketAction::Cancel(o.id))
            .collect();

        let mut budget = view.inventory.available_money();

        for &commodity in &self.commodities {
            let mid = self.mid(view, commodity);
            let bid = ((mid * (1.0 - self.half_spread)).floor() as i64).max(1);
            let ask = ((mid * (1.0 + self.half_spread)).ceil() as i64).max(bid + 1);

            let held = view.inventory.quantity(commodity);
            if held < TARGET_STOCK {
                let affordable = (budget / bid).max(0) as Quantity;
                let quantity = (TARGET_STOCK - held).min(affordable);
                if quantity > 0 {
                    budget -= quantity as i64 * bid;
                    actions.push(MarketAction::Place {
                        commodity,
                        side: Side::Buy,
                        price: bid,
                        quantity,
                    });
                }
            }

            let sellable = view.inventory.available(commodity);
            if sellable > 0 {
                actions.push(MarketAction::Place {
                    commodity,
                    side: Side::Sell,
                    price: ask,
                    quantity: sellable,
                });
            }
        }

        actions
    }
}
