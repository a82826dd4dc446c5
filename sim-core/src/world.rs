//! World container and scenario setup.

use rand::SeedableRng;
use rand::rngs::StdRng;
use slotmap::SlotMap;

use crate::brains::{ActorBrain, ColonistBrain, MarketMakerBrain};
use crate::catalog::{Catalog, CommodityId};
use crate::drives::DriveSet;
use crate::entities::{Actor, Entities, Ship};
use crate::market::Market;
use crate::skills::{SkillId, SkillSet};
use crate::types::{ActorId, PlanetId, ShipId, Turn};

/// A planet: a location with one market.
pub struct Planet {
    pub name: String,
    pub position: (f64, f64),
    pub market: Market,
}

/// Complete state of one simulation run.
pub struct World {
    pub turn: Turn,
    pub catalog: Catalog,
    pub planets: SlotMap<PlanetId, Planet>,
    pub entities: Entities,
    /// Seeded for reproducible runs; drives the per-turn shuffles, process
    /// outcomes, and ship maintenance rolls.
    pub(crate) rng: StdRng,
}

impl World {
    pub fn new(catalog: Catalog) -> Self {
        Self::with_rng(catalog, StdRng::from_os_rng())
    }

    /// Fixed seed for reproducible runs and tests.
    pub fn with_seed(catalog: Catalog, seed: u64) -> Self {
        Self::with_rng(catalog, StdRng::seed_from_u64(seed))
    }

    fn with_rng(catalog: Catalog, rng: StdRng) -> Self {
        Self {
            turn: 0,
            catalog,
            planets: SlotMap::with_key(),
            entities: Entities::new(),
            rng,
        }
    }

    // === Construction ===

    pub fn add_planet(&mut self, name: impl Into<String>, position: (f64, f64)) -> PlanetId {
        self.planets.insert(Planet {
            name: name.into(),
            position,
            market: Market::new(),
        })
    }

    pub fn add_actor(&mut self, actor: Actor) -> ActorId {
        self.entities.actors.insert(actor)
    }

    pub fn add_ship(&mut self, ship: Ship) -> ShipId {
        self.entities.ships.insert(ship)
    }

    // === Accessors ===

    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.get(id)
    }

    pub fn market(&self, planet: PlanetId) -> Option<&Market> {
        self.planets.get(planet).map(|p| &p.market)
    }

    pub fn market_mut(&mut self, planet: PlanetId) -> Option<&mut Market> {
        self.planets.get_mut(planet).map(|p| &mut p.market)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.entities.actors.get(id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.entities.actors.get_mut(id)
    }

    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.entities.ships.get(id)
    }

    pub fn ship_mut(&mut self, id: ShipId) -> Option<&mut Ship> {
        self.entities.ships.get_mut(id)
    }

    // === Aggregates (conservation checks and reporting) ===

    /// Total money across every entity, reserved included.
    pub fn total_money(&self) -> i64 {
        let actors: i64 = self.entities.actors.values().map(|a| a.inventory.money()).sum();
        let ships: i64 = self.entities.ships.values().map(|s| s.cargo.money()).sum();
        actors + ships
    }

    /// Total units of one commodity across every entity, reserved included.
    pub fn total_commodity(&self, commodity: CommodityId) -> u64 {
        let actors: u64 = self
            .entities
            .actors
            .values()
            .map(|a| a.inventory.quantity(commodity) as u64)
            .sum();
        let ships: u64 = self
            .entities
            .ships
            .values()
            .map(|s| s.cargo.quantity(commodity) as u64)
            .sum();
        actors + ships
    }

    // === Scenario setup ===

    /// One planet, a handful of colonists, and market makers quoting food
    /// and fuel. The standard smoke-test scenario.
    pub fn setup_simple(num_colonists: usize, num_market_makers: usize, seed: u64) -> Self {
        let catalog = Catalog::standard();
        let food = catalog.find_commodity("food").expect("standard catalog");
        let fuel = catalog.find_commodity("nova_fuel").expect("standard catalog");
        let farming = SkillId::new("farming");

        let mut world = Self::with_seed(catalog, seed);
        let planet = world.add_planet("Hearth", (0.0, 0.0));

        for i in 1..=num_colonists {
            let drives = DriveSet::standard(&world.catalog).expect("standard catalog");
            let mut actor = Actor::new(
                format!("Colonist-{i}"),
                planet,
                Box::new(ColonistBrain) as Box<dyn ActorBrain>,
            )
            .with_money(50)
            .with_skills(SkillSet::new().with_rating(farming.clone(), 1.0))
            .with_drives(drives);
            actor.inventory.add(food, 10);
            actor.inventory.add(world.catalog.find_commodity("biomass").unwrap(), 4);
            world.add_actor(actor);
        }

        for i in 1..=num_market_makers {
            let mut actor = Actor::new(
                format!("MarketMaker-{i}"),
                planet,
                Box::new(MarketMakerBrain::new(vec![food, fuel])) as Box<dyn ActorBrain>,
            )
            .with_money(1000);
            actor.inventory.add(food, 30);
            actor.inventory.add(fuel, 20);
            world.add_actor(actor);
        }

        world
    }
}
