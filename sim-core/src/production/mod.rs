//! Skill-modulated execution of production processes against an inventory.

mod execute;

pub use execute::{
    BlockedReason, ProcessOutcome, ProcessResult, can_execute, execute,
};
