// Process definitions for production chains

use serde::{Deserialize, Serialize};

use crate::skills::SkillId;
use crate::types::Quantity;

use super::commodity::CommodityId;

// === PROCESS ID ===

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ProcessId(pub u32);

impl ProcessId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

// === PROCESS DEFINITION ===

/// A recipe converting input commodities and labor into output commodities.
///
/// Each run requires:
/// - Input goods (consumed)
/// - Tools (owned, not consumed)
/// - Facilities (owned, non-transportable, not consumed)
///
/// Outcomes are modulated by the actor's rating in the associated skills;
/// with several skills the arithmetic mean of the ratings applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDef {
    pub id: ProcessId,
    /// Stable string key, unique across the catalog.
    pub key: String,
    pub name: String,
    /// Input goods consumed per run
    pub inputs: Vec<(CommodityId, Quantity)>,
    /// Output goods produced per run
    pub outputs: Vec<(CommodityId, Quantity)>,
    /// Tools that must be owned (quantity >= 1), never consumed
    pub tools: Vec<CommodityId>,
    /// Facilities that must be owned, never consumed
    pub facilities: Vec<CommodityId>,
    /// Abstract labor cost per run
    pub labor: u32,
    /// Skills whose ratings gate success and multiplier outcomes
    pub skills: Vec<SkillId>,
    pub description: String,
}

impl ProcessDef {
    pub fn new(id: ProcessId, key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            key: key.into(),
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            tools: Vec::new(),
            facilities: Vec::new(),
            labor: 1,
            skills: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_input(mut self, commodity: CommodityId, qty: Quantity) -> Self {
        self.inputs.push((commodity, qty));
        self
    }

    pub fn with_output(mut self, commodity: CommodityId, qty: Quantity) -> Self {
        self.outputs.push((commodity, qty));
        self
    }

    pub fn with_tool(mut self, commodity: CommodityId) -> Self {
        self.tools.push(commodity);
        self
    }

    pub fn with_facility(mut self, commodity: CommodityId) -> Self {
        self.facilities.push(commodity);
        self
    }

    pub fn with_labor(mut self, labor: u32) -> Self {
        self.labor = labor;
        self
    }

    pub fn with_skill(mut self, skill: SkillId) -> Self {
        self.skills.push(skill);
        self
    }

    /// Does this process produce the given commodity?
    pub fn produces(&self, commodity: CommodityId) -> bool {
        self.outputs.iter().any(|&(c, _)| c == commodity)
    }

    /// Does this process consume the given commodity?
    pub fn consumes(&self, commodity: CommodityId) -> bool {
        self.inputs.iter().any(|&(c, _)| c == commodity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIOMASS: CommodityId = CommodityId(1);
    const FOOD: CommodityId = CommodityId(2);
    const TOOLS: CommodityId = CommodityId(3);

    #[test]
    fn test_process_builder() {
        let process = ProcessDef::new(ProcessId::new(1), "make_food", "Make Food")
            .with_input(BIOMASS, 2)
            .with_output(FOOD, 3)
            .with_tool(TOOLS)
            .with_labor(2)
            .with_skill(SkillId::new("farming"));

        assert_eq!(process.key, "make_food");
        assert_eq!(process.labor, 2);
        assert!(process.consumes(BIOMASS));
        assert!(process.produces(FOOD));
        assert!(!process.produces(BIOMASS));
        assert_eq!(process.tools, vec![TOOLS]);
        assert_eq!(process.skills.len(), 1);
    }
}
