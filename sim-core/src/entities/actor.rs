use crate::brains::ActorBrain;
use crate::drives::DriveSet;
use crate::inventory::Inventory;
use crate::skills::SkillSet;
use crate::types::{Money, PlanetId};

/// An economic agent bound to a planet. Holds inventory and money, acts
/// once per turn through its brain.
pub struct Actor {
    pub name: String,
    pub planet: PlanetId,
    pub inventory: Inventory,
    pub skills: SkillSet,
    pub drives: Option<DriveSet>,
    pub brain: Box<dyn ActorBrain>,
    /// Human-readable record of the last action, for logs and snapshots.
    pub last_action: String,
}

impl Actor {
    pub fn new(name: impl Into<String>, planet: PlanetId, brain: Box<dyn ActorBrain>) -> Self {
        Self {
            name: name.into(),
            planet,
            inventory: Inventory::new(),
            skills: SkillSet::new(),
            drives: None,
            brain,
            last_action: String::new(),
        }
    }

    pub fn with_money(mut self, money: Money) -> Self {
        self.inventory.add_money(money);
        self
    }

    pub fn with_skills(mut self, skills: SkillSet) -> Self {
        self.skills = skills;
        self
    }

    pub fn with_drives(mut self, drives: DriveSet) -> Self {
        self.drives = Some(drives);
        self
    }
}
