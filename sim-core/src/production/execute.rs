// Process execution logic

use rand::Rng;

use crate::catalog::{CommodityId, ProcessDef};
use crate::inventory::Inventory;
use crate::skills;
use crate::types::Quantity;

// === PRECONDITIONS ===

/// Why a process could not start. Expected and frequent; brains use this to
/// pick a different action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockedReason {
    /// Not enough unreserved stock of an input
    MissingInput(CommodityId),
    /// A required tool is not owned
    MissingTool(CommodityId),
    /// A required facility is not owned
    MissingFacility(CommodityId),
}

/// Check whether one run of `process` could start right now.
///
/// Checked in order: inputs available (unreserved), tools owned (>= 1, not
/// consumed), facilities owned. No side effects.
pub fn can_execute(process: &ProcessDef, inventory: &Inventory) -> Result<(), BlockedReason> {
    for &(commodity, qty) in &process.inputs {
        if !inventory.has_available(commodity, qty) {
            return Err(BlockedReason::MissingInput(commodity));
        }
    }
    for &tool in &process.tools {
        if inventory.quantity(tool) < 1 {
            return Err(BlockedReason::MissingTool(tool));
        }
    }
    for &facility in &process.facilities {
        if inventory.quantity(facility) < 1 {
            return Err(BlockedReason::MissingFacility(facility));
        }
    }
    Ok(())
}

// === EXECUTION ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Inputs consumed, outputs produced
    Completed,
    /// Skill check failed: inputs consumed (wasted materials), no outputs.
    /// Unreachable for ratings >= 1.0.
    Botched,
    /// Preconditions unmet; nothing moved
    Blocked(BlockedReason),
}

#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub outcome: ProcessOutcome,
    /// Whether the x2 batch multiplier triggered
    pub multiplier_applied: bool,
    /// Inputs actually removed (good, quantity)
    pub consumed: Vec<(CommodityId, Quantity)>,
    /// Outputs actually added (good, quantity)
    pub produced: Vec<(CommodityId, Quantity)>,
}

impl ProcessResult {
    fn blocked(reason: BlockedReason) -> Self {
        Self {
            outcome: ProcessOutcome::Blocked(reason),
            multiplier_applied: false,
            consumed: Vec::new(),
            produced: Vec::new(),
        }
    }
}

/// Execute one run of `process` against `inventory`.
///
/// Preconditions are checked first; any failure returns `Blocked` with no
/// side effects. Otherwise the skill checks roll against `rng`:
///
/// - success probability = 1.0 at rating >= 1.0, else the rating itself. A
///   failed run consumes the base inputs and produces nothing.
/// - on success, multiplier chance = (rating - 1.0) x 0.5 (capped at 1.0).
///   A triggered multiplier doubles both inputs consumed and outputs
///   produced, provided the doubled inputs are actually available;
///   otherwise the run falls back to the base batch.
///
/// Deterministic given a fixed random source.
pub fn execute<R: Rng>(
    process: &ProcessDef,
    inventory: &mut Inventory,
    skill_rating: f64,
    rng: &mut R,
) -> ProcessResult {
    if let Err(reason) = can_execute(process, inventory) {
        return ProcessResult::blocked(reason);
    }

    // Processes with no associated skills always complete at base batch.
    let (success, multiplier) = if process.skills.is_empty() {
        (true, false)
    } else {
        let success = skills::success_check(rng, skill_rating);
        let multiplier = success && skills::multiplier_check(rng, skill_rating);
        (success, multiplier)
    };

    if !success {
        // Botched attempt: the materials are wasted.
        let consumed = consume_inputs(process, inventory, 1);
        return ProcessResult {
            outcome: ProcessOutcome::Botched,
            multiplier_applied: false,
            consumed,
            produced: Vec::new(),
        };
    }

    // The x2 batch needs 2x inputs; preconditions only guaranteed 1x.
    let batch: Quantity = if multiplier && doubled_inputs_available(process, inventory) {
        2
    } else {
        1
    };

    let consumed = consume_inputs(process, inventory, batch);

    let mut produced = Vec::with_capacity(process.outputs.len());
    for &(commodity, qty) in &process.outputs {
        let amount = qty * batch;
        inventory.add(commodity, amount);
        produced.push((commodity, amount));
    }

    ProcessResult {
        outcome: ProcessOutcome::Completed,
        multiplier_applied: batch == 2,
        consumed,
        produced,
    }
}

fn doubled_inputs_available(process: &ProcessDef, inventory: &Inventory) -> bool {
    process
        .inputs
        .iter()
        .all(|&(commodity, qty)| inventory.available(commodity) >= qty * 2)
}

fn consume_inputs(
    process: &ProcessDef,
    inventory: &mut Inventory,
    batch: Quantity,
) -> Vec<(CommodityId, Quantity)> {
    let mut consumed = Vec::with_capacity(process.inputs.len());
    for &(commodity, qty) in &process.inputs {
        let amount = qty * batch;
        // Availability was verified by the precondition pass.
        inventory
            .remove(commodity, amount)
            .expect("inputs verified available before consumption");
        consumed.push((commodity, amount));
    }
    consumed
}
