//! Skill ratings and the stochastic checks they drive.
//!
//! Ratings start at 0.5 (unskilled) and climb slowly with production
//! experience. The core only reads ratings to compute success and
//! multiplier probabilities; when and how much to improve them is entity
//! policy.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default rating for a skill the actor has never practiced.
pub const UNSKILLED_RATING: f64 = 0.5;

// === SKILL ID ===

#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SkillId(pub String);

impl SkillId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// === SKILL SET ===

/// Per-actor ratings keyed by skill.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillSet {
    ratings: HashMap<SkillId, f64>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rating(mut self, skill: SkillId, rating: f64) -> Self {
        self.ratings.insert(skill, rating);
        self
    }

    pub fn rating(&self, skill: &SkillId) -> f64 {
        self.ratings.get(skill).copied().unwrap_or(UNSKILLED_RATING)
    }

    pub fn set_rating(&mut self, skill: SkillId, rating: f64) {
        self.ratings.insert(skill, rating);
    }

    /// Add experience to a skill, initializing at the unskilled default.
    pub fn improve(&mut self, skill: &SkillId, amount: f64) {
        let rating = self
            .ratings
            .entry(skill.clone())
            .or_insert(UNSKILLED_RATING);
        *rating += amount;
    }

    /// Combined rating over several skills: the arithmetic mean. An empty
    /// list rates as unskilled.
    pub fn combined_rating(&self, skills: &[SkillId]) -> f64 {
        if skills.is_empty() {
            return UNSKILLED_RATING;
        }
        let sum: f64 = skills.iter().map(|s| self.rating(s)).sum();
        sum / skills.len() as f64
    }
}

// === SKILL CHECKS ===

/// Probability that a process run succeeds outright.
///
/// Ratings at or above 1.0 never fail; below 1.0 the probability is the
/// rating itself (0.8 rating = 80% success).
pub fn success_probability(rating: f64) -> f64 {
    rating.clamp(0.0, 1.0)
}

/// Probability that a successful run doubles its batch.
///
/// Zero at or below 1.0, then (rating - 1.0) x 0.5, capped at certainty.
pub fn multiplier_probability(rating: f64) -> f64 {
    ((rating - 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Roll the success check against an injectable random source.
pub fn success_check<R: Rng>(rng: &mut R, rating: f64) -> bool {
    if rating >= 1.0 {
        return true;
    }
    rng.random::<f64>() < success_probability(rating)
}

/// Roll the multiplier check against an injectable random source.
pub fn multiplier_check<R: Rng>(rng: &mut R, rating: f64) -> bool {
    if rating <= 1.0 {
        return false;
    }
    rng.random::<f64>() < multiplier_probability(rating)
}
