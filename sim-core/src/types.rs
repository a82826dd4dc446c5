use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

// ============================================================================
// IDs - Using slotmap for generational indices
// ============================================================================

new_key_type! {
    pub struct PlanetId;
    pub struct ActorId;
    pub struct ShipId;
}

/// Either side of a trade. Both actors and ships hold inventories and
/// participate in markets under a single trader identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraderId {
    Actor(ActorId),
    Ship(ShipId),
}

impl TraderId {
    /// Stable numeric form for logging and export.
    pub fn to_u64(self) -> u64 {
        use slotmap::Key;
        match self {
            TraderId::Actor(id) => id.data().as_ffi(),
            TraderId::Ship(id) => id.data().as_ffi(),
        }
    }

}

// ============================================================================
// Scalar aliases
// ============================================================================

/// Discrete units of a commodity.
pub type Quantity = u32;

/// Credits. Integer so conservation checks are exact.
pub type Money = i64;

/// Limit price in credits per unit.
pub type Price = i64;

/// Simulation turn counter, starting at 1 on the first `run_turn`.
pub type Turn = u64;
