//! Round scoring - target species, catch records, and the running total.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::Species;

/// One caught fish, appended per catch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaughtFishRecord {
    pub species: Species,
    /// Whether the species matched the target at catch time.
    pub correct: bool,
    /// Signed score delta this catch produced.
    pub points: i32,
    /// Simulation-clock seconds when the catch happened.
    pub caught_at: f64,
}

/// Scoring state for the current round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    target: Species,
    records: Vec<CaughtFishRecord>,
    score: i32,
}

impl Round {
    pub fn new() -> Self {
        Self {
            target: Species::Goldfish,
            records: Vec::new(),
            score: 0,
        }
    }

    pub fn target(&self) -> Species {
        self.target
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn records(&self) -> &[CaughtFishRecord] {
        &self.records
    }

    /// Score one catch: full points on the target species, the penalty
    /// otherwise. The record is appended and the total updated.
    pub fn record_catch(&mut self, species: Species, miss_penalty: i32, now: f64) -> CaughtFishRecord {
        let correct = species == self.target;
        let points = if correct { species.points() } else { miss_penalty };
        let record = CaughtFishRecord {
            species,
            correct,
            points,
            caught_at: now,
        };
        self.records.push(record);
        self.score += points;
        record
    }

    /// Pick a fresh target among the candidate species.
    pub fn rotate_target(&mut self, rng: &mut impl Rng) -> Species {
        let candidates: Vec<Species> = Species::all()
            .iter()
            .copied()
            .filter(|s| s.is_target_candidate())
            .collect();
        self.target = candidates[rng.gen_range(0..candidates.len())];
        self.target
    }

    /// Wipe records and score for a new round. The target is kept until
    /// the next rotation.
    pub fn reset(&mut self) {
        self.records.clear();
        self.score = 0;
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::new()
    }
}
