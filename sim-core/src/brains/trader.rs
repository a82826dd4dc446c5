use crate::entities::Ship;
use crate::market::Side;
use crate::types::{PlanetId, Quantity};

use super::{MarketAction, PlanetInfo, ShipBrain, ShipView, price_estimate};

/// Margin demanded over the going rate when unloading cargo.
const SELL_MARGIN: f64 = 1.05;

/// Arbitrage trader: keeps fuel topped up, buys cargo where it is cheap,
/// carries it to the dearest reachable market, and sells at a margin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraderBrain;

/// What a market will plausibly pay: recent trades, else the best resting
/// bid. Fresh colonies have bids long before they have a trade history.
fn price_signal(market: &crate::market::Market, commodity: crate::catalog::CommodityId) -> Option<f64> {
    market
        .avg_price(commodity)
        .or_else(|| market.bid_ask_spread(commodity).0.map(|p| p as f64))
}

impl TraderBrain {
    /// Best price signal for the cargo good across the other planets, used
    /// to recognize a good market when docked at one.
    fn best_price_elsewhere(&self, view: &ShipView, key: &str) -> Option<f64> {
        let commodity = view.catalog.find_commodity(key)?;
        view.planets
            .iter()
            .filter(|p| p.id != view.ship.planet)
            .filter_map(|p| price_signal(p.market, commodity))
            .fold(None, |best: Option<f64>, price| {
                Some(best.map_or(price, |b| b.max(price)))
            })
    }

    fn reachable<'a>(&self, view: &'a ShipView, ship: &Ship) -> Vec<&'a PlanetInfo<'a>> {
        let fuel = view.catalog.find_commodity("nova_fuel");
        let here = view.current_position();
        view.planets
            .iter()
            .filter(|p| p.id != ship.planet)
            .filter(|p| {
                let distance = Ship::distance(here, p.position);
                let needed = ship.adjusted_fuel_needed(distance);
                fuel.map(|f| ship.cargo.quantity(f) >= needed).unwrap_or(false)
            })
            .collect()
    }
}

impl ShipBrain for TraderBrain {
    fn decide_market_actions(&self, view: &ShipView) -> Vec<MarketAction> {
        let mut actions: Vec<MarketAction> = view
            .my_orders()
            .iter()
            .map(|o| MarketAction::Cancel(o.id))
            .collect();

        let Some(food) = view.catalog.find_commodity("food") else {
            return actions;
        };
        let Some(fuel) = view.catalog.find_commodity("nova_fuel") else {
            return actions;
        };

        let ship = view.ship;
        let mut space = ship.cargo_space_available();
        let mut budget = ship.cargo.available_money();

        // Fuel first: an empty tank strands the route.
        let fuel_held = ship.cargo.quantity(fuel);
        if fuel_held < ship.fuel_capacity / 2 {
            let price = price_estimate(view.market, fuel).ceil() as i64;
            if price > 0 {
                let wanted = (ship.fuel_capacity - fuel_held).min(space);
                let quantity = wanted.min((budget / price).max(0) as Quantity);
                if quantity > 0 {
                    budget -= quantity as i64 * price;
                    space -= quantity;
                    actions.push(MarketAction::Place {
                        commodity: fuel,
                        side: Side::Buy,
                        price,
                        quantity,
                    });
                }
            }
        }

        let carrying = ship.cargo.available(food);
        if carrying > 0 {
            // Unload when this market pays at least as well as any other.
            let here = price_estimate(view.market, food);
            let elsewhere = self.best_price_elsewhere(view, "food").unwrap_or(0.0);
            if here >= elsewhere {
                let price = ((here * SELL_MARGIN).ceil() as i64).max(2);
                actions.push(MarketAction::Place {
                    commodity: food,
                    side: Side::Sell,
                    price,
                    quantity: carrying,
                });
            }
        } else if space > 0 && budget > 0 {
            // Lift cargo against the resting asks; pay one over to jump
            // the queue, the route margin covers it.
            let book_ask = view
                .market
                .book(food)
                .and_then(|b| b.sells.iter().filter(|o| o.owner != view.trader).map(|o| o.price).min());
            if let Some(ask) = book_ask {
                let price = ask + 1;
                let quantity = space.min((budget / price).max(0) as Quantity);
                if quantity > 0 {
                    actions.push(MarketAction::Place {
                        commodity: food,
                        side: Side::Buy,
                        price,
                        quantity,
                    });
                }
            }
        }

        actions
    }

    fn decide_travel(&self, view: &ShipView) -> Option<PlanetId> {
        let ship = view.ship;
        let food = view.catalog.find_commodity("food")?;
        let reachable = self.reachable(view, ship);
        if reachable.is_empty() {
            return None;
        }

        let carrying = ship.cargo.quantity(food) > 0;
        let here = price_estimate(view.market, food);

        if carrying {
            // Seek the dearest market that beats staying put.
            reachable
                .iter()
                .filter_map(|p| price_signal(p.market, food).map(|price| (p.id, price)))
                .filter(|&(_, price)| price > here)
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id)
        } else {
            // Seek the cheapest market to restock.
            reachable
                .iter()
                .filter_map(|p| price_signal(p.market, food).map(|price| (p.id, price)))
                .filter(|&(_, price)| price < here)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id)
        }
    }
}
