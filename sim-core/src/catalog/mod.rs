//! Static registry of commodities and production processes.
//!
//! The catalog is built once at setup and read-only during simulation.
//! Definitions are interned: every inventory line, order, and recipe refers
//! to them by id.

mod commodity;
mod process;

pub use commodity::{CommodityDef, CommodityId};
pub use process::{ProcessDef, ProcessId};

use crate::skills::SkillId;

/// Immutable registry of commodity and process definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    commodities: Vec<CommodityDef>,
    processes: Vec<ProcessDef>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a commodity definition, returning its id.
    pub fn add_commodity(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        transportable: bool,
        description: impl Into<String>,
    ) -> CommodityId {
        let id = CommodityId::new(self.commodities.len() as u32);
        self.commodities
            .push(CommodityDef::new(id, key, name, transportable).with_description(description));
        id
    }

    /// Intern a process definition built via the `ProcessDef` builders.
    /// The definition's id must be the one returned by `next_process_id`.
    pub fn add_process(&mut self, def: ProcessDef) -> ProcessId {
        debug_assert_eq!(def.id.0 as usize, self.processes.len());
        let id = def.id;
        self.processes.push(def);
        id
    }

    pub fn next_process_id(&self) -> ProcessId {
        ProcessId::new(self.processes.len() as u32)
    }

    pub fn commodity(&self, id: CommodityId) -> &CommodityDef {
        &self.commodities[id.0 as usize]
    }

    pub fn process(&self, id: ProcessId) -> &ProcessDef {
        &self.processes[id.0 as usize]
    }

    /// Look up a commodity by its string key.
    pub fn find_commodity(&self, key: &str) -> Option<CommodityId> {
        self.commodities.iter().find(|c| c.key == key).map(|c| c.id)
    }

    /// Look up a process by its string key.
    pub fn find_process(&self, key: &str) -> Option<ProcessId> {
        self.processes.iter().find(|p| p.key == key).map(|p| p.id)
    }

    pub fn commodities(&self) -> impl Iterator<Item = &CommodityDef> {
        self.commodities.iter()
    }

    pub fn processes(&self) -> impl Iterator<Item = &ProcessDef> {
        self.processes.iter()
    }

    pub fn processes_producing(&self, commodity: CommodityId) -> Vec<&ProcessDef> {
        self.processes.iter().filter(|p| p.produces(commodity)).collect()
    }

    pub fn processes_consuming(&self, commodity: CommodityId) -> Vec<&ProcessDef> {
        self.processes.iter().filter(|p| p.consumes(commodity)).collect()
    }

    /// The standard catalog used by tests and simple scenarios: a small
    /// production web from raw gathering up through fabricated goods.
    pub fn standard() -> Self {
        let mut catalog = Self::new();

        let biomass = catalog.add_commodity(
            "biomass",
            "Biomass",
            true,
            "Raw organic matter gathered planetside.",
        );
        let food = catalog.add_commodity(
            "food",
            "Food",
            true,
            "Basic nourishment required by actors.",
        );
        let nova_fuel = catalog.add_commodity(
            "nova_fuel",
            "NovaFuel",
            true,
            "High-density energy source for starship travel.",
        );
        let ore = catalog.add_commodity("ore", "Ore", true, "Unrefined metallic ore.");
        let metal = catalog.add_commodity("metal", "Metal", true, "Refined structural metal.");
        let tools = catalog.add_commodity("tools", "Tools", true, "Hand tools for extraction work.");
        let clothing =
            catalog.add_commodity("clothing", "Clothing", true, "Woven garments; wear out over time.");
        let shelter = catalog.add_commodity(
            "shelter",
            "Shelter",
            false,
            "Fixed habitation; degrades and needs replacement.",
        );
        let smelter = catalog.add_commodity(
            "smelter",
            "Smelter",
            false,
            "Fixed facility for refining ore into metal.",
        );
        let refinery = catalog.add_commodity(
            "fuel_refinery",
            "Fuel Refinery",
            false,
            "Fixed facility for distilling fuel from biomass.",
        );
        let workshop = catalog.add_commodity(
            "workshop",
            "Workshop",
            false,
            "Fixed facility for fabrication work.",
        );

        let farming = SkillId::new("farming");
        let mining = SkillId::new("mining");
        let refining = SkillId::new("refining");
        let fabrication = SkillId::new("fabrication");

        let id = catalog.next_process_id();
        catalog.add_process(
            ProcessDef::new(id, "gather_biomass", "Gather Biomass")
                .with_output(biomass, 2)
                .with_labor(1)
                .with_skill(farming.clone()),
        );
        let id = catalog.next_process_id();
        catalog.add_process(
            ProcessDef::new(id, "make_food", "Make Food")
                .with_input(biomass, 2)
                .with_output(food, 3)
                .with_labor(1)
                .with_skill(farming),
        );
        let id = catalog.next_process_id();
        catalog.add_process(
            ProcessDef::new(id, "mine_ore", "Mine Ore")
                .with_output(ore, 2)
                .with_tool(tools)
                .with_labor(2)
                .with_skill(mining),
        );
        let id = catalog.next_process_id();
        catalog.add_process(
            ProcessDef::new(id, "refine_metal", "Refine Metal")
                .with_input(ore, 3)
                .with_output(metal, 1)
                .with_facility(smelter)
                .with_labor(2)
                .with_skill(refining.clone()),
        );
        let id = catalog.next_process_id();
        catalog.add_process(
            ProcessDef::new(id, "refine_fuel", "Refine Fuel")
                .with_input(biomass, 3)
                .with_output(nova_fuel, 2)
                .with_facility(refinery)
                .with_labor(2)
                .with_skill(refining),
        );
        let id = catalog.next_process_id();
        catalog.add_process(
            ProcessDef::new(id, "make_tools", "Make Tools")
                .with_input(metal, 1)
                .with_output(tools, 1)
                .with_facility(workshop)
                .with_labor(2)
                .with_skill(fabrication.clone()),
        );
        let id = catalog.next_process_id();
        catalog.add_process(
            ProcessDef::new(id, "weave_clothing", "Weave Clothing")
                .with_input(biomass, 2)
                .with_output(clothing, 1)
                .with_labor(1)
                .with_skill(fabrication.clone()),
        );
        let id = catalog.next_process_id();
        catalog.add_process(
            ProcessDef::new(id, "build_shelter", "Build Shelter")
                .with_input(metal, 2)
                .with_output(shelter, 1)
                .with_tool(tools)
                .with_labor(4)
                .with_skill(fabrication),
        );

        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_and_lookup() {
        let catalog = Catalog::standard();

        let food = catalog.find_commodity("food").unwrap();
        assert_eq!(catalog.commodity(food).name, "Food");
        assert!(catalog.commodity(food).transportable);

        let shelter = catalog.find_commodity("shelter").unwrap();
        assert!(!catalog.commodity(shelter).transportable);

        let make_food = catalog.find_process("make_food").unwrap();
        assert!(catalog.process(make_food).produces(food));
    }

    #[test]
    fn test_production_web_queries() {
        let catalog = Catalog::standard();
        let biomass = catalog.find_commodity("biomass").unwrap();

        let producers = catalog.processes_producing(biomass);
        assert_eq!(producers.len(), 1);
        assert_eq!(producers[0].key, "gather_biomass");

        // biomass feeds food, fuel, and clothing
        let consumers = catalog.processes_consuming(biomass);
        assert_eq!(consumers.len(), 3);
    }
}
