//! Turn orchestration: randomized action phases followed by deferred
//! market settlement.
//!
//! Every entity acts in a freshly shuffled order each turn, so no one
//! holds a standing first-mover advantage. All actions complete before any
//! market settles, which is what makes an order placed in turn N first
//! observable in inventories at turn N+1.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use slotmap::Key;

use crate::brains::{
    ActorView, EconomicAction, GOVERNMENT_WAGE, MarketAction, PlanetInfo, ShipView,
};
use crate::production::{self, ProcessOutcome};
use crate::types::{ActorId, PlanetId, ShipId, TraderId, Turn};
use crate::world::World;

/// Experience gained per successful process run; a multiplier run teaches
/// a little more.
const SKILL_GAIN: f64 = 0.01;
const SKILL_GAIN_MULTIPLIER_BONUS: f64 = 0.02;

/// Counters for one completed turn, for external logging and export.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TurnSummary {
    pub turn: Turn,
    /// Transactions recorded across all markets
    pub trades: usize,
    /// Units changing hands across all markets
    pub trade_volume: u64,
    pub productions: usize,
    /// Turns of wage labor taken instead of production; the only money
    /// faucet in the system
    pub government_work: usize,
    /// Botched process runs (inputs wasted)
    pub failed_productions: usize,
    /// Process attempts stopped by unmet preconditions
    pub blocked_actions: usize,
    /// Rejected market commands and other recoverable entity errors
    pub action_errors: usize,
}

impl World {
    /// Advance exactly one turn: actor phase, ship phase, settlement.
    pub fn run_turn(&mut self) -> TurnSummary {
        self.turn += 1;
        let turn = self.turn;
        let mut summary = TurnSummary {
            turn,
            ..TurnSummary::default()
        };

        // === ACTION PHASE: ACTORS ===
        // Redrawn every turn; a fixed order would leak a standing
        // information advantage to whoever acts first.
        let mut actor_ids: Vec<ActorId> = self.entities.actors.keys().collect();
        actor_ids.shuffle(&mut self.rng);
        for id in actor_ids {
            self.run_actor_turn(id, turn, &mut summary);
        }

        // === ACTION PHASE: SHIPS ===
        let mut ship_ids: Vec<ShipId> = self.entities.ships.keys().collect();
        ship_ids.shuffle(&mut self.rng);
        for id in ship_ids {
            self.run_ship_turn(id, turn, &mut summary);
        }

        // === SETTLEMENT PHASE ===
        // Each market settles exactly once; fills become visible to
        // entities at the start of next turn's action phase.
        let planet_ids: Vec<PlanetId> = self.planets.keys().collect();
        for planet_id in planet_ids {
            self.settle_planet(planet_id, turn, &mut summary);
        }

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "turn",
            turn = turn,
            trades = summary.trades as u64,
            trade_volume = summary.trade_volume,
            productions = summary.productions as u64,
            government_work = summary.government_work as u64,
            failed_productions = summary.failed_productions as u64,
            blocked_actions = summary.blocked_actions as u64,
            action_errors = summary.action_errors as u64,
        );

        summary
    }

    fn run_actor_turn(&mut self, id: ActorId, turn: Turn, summary: &mut TurnSummary) {
        // 1. Drives: consumption happens before the brain looks at stocks.
        {
            let Some(actor) = self.entities.actors.get_mut(id) else {
                return;
            };
            if let Some(drives) = actor.drives.as_mut() {
                drives.tick(turn, &mut actor.inventory);
            }
        }

        // 2. Decide from a read-only view of settled state.
        let (economic, market_actions) = {
            let actor = &self.entities.actors[id];
            let market = &self.planets[actor.planet].market;
            let view = ActorView {
                trader: TraderId::Actor(id),
                inventory: &actor.inventory,
                skills: &actor.skills,
                drives: actor.drives.as_ref(),
                market,
                catalog: &self.catalog,
                turn,
            };
            (
                actor.brain.decide_economic_action(&view),
                actor.brain.decide_market_actions(&view),
            )
        };

        // 3. Execute. A failing command is logged and skipped; the rest of
        // the entity's turn and the rest of the phase proceed.
        let actor = self
            .entities
            .actors
            .get_mut(id)
            .expect("actor present above");

        match economic {
            Some(EconomicAction::RunProcess(process_id)) => {
                let process = self.catalog.process(process_id);
                let rating = actor.skills.combined_rating(&process.skills);
                let result =
                    production::execute(process, &mut actor.inventory, rating, &mut self.rng);

                match result.outcome {
                    ProcessOutcome::Completed => {
                        summary.productions += 1;
                        let gain = if result.multiplier_applied {
                            SKILL_GAIN + SKILL_GAIN_MULTIPLIER_BONUS
                        } else {
                            SKILL_GAIN
                        };
                        // Practice pays off, but only on a finished run.
                        for skill in &process.skills {
                            actor.skills.improve(skill, gain);
                        }
                        actor.last_action = if result.multiplier_applied {
                            format!("Executed process: {} (x2)", process.name)
                        } else {
                            format!("Executed process: {}", process.name)
                        };
                    }
                    ProcessOutcome::Botched => {
                        summary.failed_productions += 1;
                        actor.last_action = format!("Failed process: {}", process.name);
                    }
                    ProcessOutcome::Blocked(reason) => {
                        summary.blocked_actions += 1;
                        actor.last_action = format!("Blocked process: {} ({reason:?})", process.name);
                    }
                }

                #[cfg(feature = "instrument")]
                tracing::info!(
                    target: "production",
                    turn = turn,
                    actor_id = id.data().as_ffi(),
                    process_id = process_id.0,
                    outcome = outcome_str(result.outcome),
                    multiplier = result.multiplier_applied,
                );
            }
            Some(EconomicAction::GovernmentWork) => {
                actor.inventory.add_money(GOVERNMENT_WAGE);
                summary.government_work += 1;
                actor.last_action = format!("Government work for {GOVERNMENT_WAGE} credits");
            }
            None => {
                actor.last_action = "Idle".to_string();
            }
        }

        let planet = actor.planet;
        let market = &mut self.planets[planet].market;
        for action in market_actions {
            let result = match action {
                MarketAction::Place {
                    commodity,
                    side,
                    price,
                    quantity,
                } => market
                    .place_order(
                        TraderId::Actor(id),
                        &mut actor.inventory,
                        commodity,
                        side,
                        price,
                        quantity,
                        turn,
                    )
                    .map(|_order_id| {
                        #[cfg(feature = "instrument")]
                        tracing::info!(
                            target: "order",
                            turn = turn,
                            planet_id = planet.data().as_ffi(),
                            order_id = _order_id.0,
                            trader = id.data().as_ffi(),
                            trader_kind = "actor",
                            commodity_id = commodity.0,
                            side = side_str(side),
                            quantity = quantity,
                            price = price,
                        );
                    }),
                MarketAction::Cancel(order_id) => {
                    market.cancel_order(TraderId::Actor(id), order_id, &mut actor.inventory)
                }
            };
            if let Err(_err) = result {
                summary.action_errors += 1;
                #[cfg(feature = "instrument")]
                tracing::debug!(
                    target: "action_error",
                    turn = turn,
                    trader = id.data().as_ffi(),
                    error = %_err,
                );
            }
        }
    }

    fn run_ship_turn(&mut self, id: ShipId, turn: Turn, summary: &mut TurnSummary) {
        use crate::entities::ShipStatus;

        let Some(status) = self.entities.ships.get(id).map(|s| s.status) else {
            return;
        };

        match status {
            ShipStatus::Traveling => {
                self.entities.ships[id].update_journey();
            }
            ShipStatus::NeedsMaintenance => {
                if let Some(fuel) = self.catalog.find_commodity("nova_fuel") {
                    self.entities.ships[id].perform_maintenance(fuel);
                }
            }
            ShipStatus::Docked => {
                let (market_actions, travel) = {
                    let ship = &self.entities.ships[id];
                    let infos: Vec<PlanetInfo> = self
                        .planets
                        .iter()
                        .map(|(planet_id, p)| PlanetInfo {
                            id: planet_id,
                            name: &p.name,
                            position: p.position,
                            market: &p.market,
                        })
                        .collect();
                    let view = ShipView {
                        trader: TraderId::Ship(id),
                        ship,
                        market: &self.planets[ship.planet].market,
                        catalog: &self.catalog,
                        planets: &infos,
                        turn,
                    };
                    (
                        ship.brain.decide_market_actions(&view),
                        ship.brain.decide_travel(&view),
                    )
                };

                let ship = self.entities.ships.get_mut(id).expect("ship present above");
                let planet = ship.planet;
                {
                    let market = &mut self.planets[planet].market;
                    for action in market_actions {
                        let result = match action {
                            MarketAction::Place {
                                commodity,
                                side,
                                price,
                                quantity,
                            } => {
                                // Cargo holds transportable goods only.
                                if !self.catalog.commodity(commodity).transportable {
                                    summary.action_errors += 1;
                                    continue;
                                }
                                market
                                    .place_order(
                                        TraderId::Ship(id),
                                        &mut ship.cargo,
                                        commodity,
                                        side,
                                        price,
                                        quantity,
                                        turn,
                                    )
                                    .map(|_order_id| {
                                        #[cfg(feature = "instrument")]
                                        tracing::info!(
                                            target: "order",
                                            turn = turn,
                                            planet_id = planet.data().as_ffi(),
                                            order_id = _order_id.0,
                                            trader = id.data().as_ffi(),
                                            trader_kind = "ship",
                                            commodity_id = commodity.0,
                                            side = side_str(side),
                                            quantity = quantity,
                                            price = price,
                                        );
                                    })
                            }
                            MarketAction::Cancel(order_id) => {
                                market.cancel_order(TraderId::Ship(id), order_id, &mut ship.cargo)
                            }
                        };
                        if let Err(_err) = result {
                            summary.action_errors += 1;
                            #[cfg(feature = "instrument")]
                            tracing::debug!(
                                target: "action_error",
                                turn = turn,
                                trader = id.data().as_ffi(),
                                error = %_err,
                            );
                        }
                    }
                }

                if let Some(destination) = travel {
                    if let Some(dest_planet) = self.planets.get(destination) {
                        let from = self.planets[planet].position;
                        let distance = crate::entities::Ship::distance(from, dest_planet.position);
                        if let Some(fuel) = self.catalog.find_commodity("nova_fuel") {
                            ship.start_journey(destination, distance, fuel, &mut self.rng);
                        }
                    }
                }
            }
        }
    }

    fn settle_planet(&mut self, planet_id: PlanetId, turn: Turn, summary: &mut TurnSummary) {
        let Some(planet) = self.planets.get_mut(planet_id) else {
            return;
        };

        match planet.market.settle(turn, &mut self.entities) {
            Ok(report) => {
                summary.trades += report.trade_count();
                summary.trade_volume += report.volume();

                #[cfg(feature = "instrument")]
                for t in &report.transactions {
                    tracing::info!(
                        target: "fill",
                        turn = turn,
                        planet_id = planet_id.data().as_ffi(),
                        commodity_id = t.commodity.0,
                        quantity = t.quantity,
                        price = t.price,
                        buyer = t.buyer.to_u64(),
                        seller = t.seller.to_u64(),
                    );
                }
            }
            Err(_err) => {
                // Reservation accounting failed to back the book: a bug,
                // surfaced loudly, but the rest of the turn continues.
                debug_assert!(false, "settlement failed: {_err}");
                #[cfg(feature = "instrument")]
                tracing::error!(
                    target: "settlement_error",
                    turn = turn,
                    planet_id = planet_id.data().as_ffi(),
                    error = %_err,
                );
            }
        }
    }
}

#[cfg(feature = "instrument")]
fn side_str(side: crate::market::Side) -> &'static str {
    match side {
        crate::market::Side::Buy => "buy",
        crate::market::Side::Sell => "sell",
    }
}

#[cfg(feature = "instrument")]
fn outcome_str(outcome: ProcessOutcome) -> &'static str {
    match outcome {
        ProcessOutcome::Completed => "completed",
        ProcessOutcome::Botched => "botched",
        ProcessOutcome::Blocked(_) => "blocked",
    }
}
