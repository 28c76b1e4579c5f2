//! Fish components - species identity, swim state, and lifecycle markers.

use serde::{Deserialize, Serialize};

use super::Vec3;

/// Species that can spawn. Point values rise with rarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Clownfish,
    Tuna,
    BluefinTuna,
    Piranha,
    Goldfish,
    Starfish,
}

impl Species {
    pub fn all() -> [Species; 6] {
        [
            Species::Clownfish,
            Species::Tuna,
            Species::BluefinTuna,
            Species::Piranha,
            Species::Goldfish,
            Species::Starfish,
        ]
    }

    /// Points awarded when this species is speared while it is the target.
    pub fn points(&self) -> i32 {
        match self {
            Species::Starfish => 5,
            Species::Clownfish => 10,
            Species::Tuna => 20,
            Species::BluefinTuna => 30,
            Species::Piranha => 40,
            Species::Goldfish => 50,
        }
    }

    /// Whether the rotation may pick this species as the target.
    /// Clownfish and starfish are decoys, never targets.
    pub fn is_target_candidate(&self) -> bool {
        matches!(
            self,
            Species::Tuna | Species::BluefinTuna | Species::Piranha | Species::Goldfish
        )
    }

    /// Extra wall clearance for bulkier models, added to the room safety
    /// margin.
    pub fn clearance(&self) -> f32 {
        match self {
            Species::Tuna => 0.10,
            Species::BluefinTuna => 0.15,
            Species::Piranha => 0.05,
            _ => 0.0,
        }
    }
}

/// Identity of a spawned fish
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fish {
    pub species: Species,
    /// Cruise speed in m/s, sampled once at spawn.
    pub speed: f32,
}

/// Per-entity swim state, advanced every tick by the swim system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Swim {
    pub velocity: Vec3,
    /// Point the fish is currently steering toward.
    pub target: Vec3,
    /// Phase accumulators for lateral sway and vertical bob.
    pub sway_phase: f32,
    pub bob_phase: f32,
    /// Per-fish sway rate in radians per second.
    pub sway_rate: f32,
    /// Seconds until the next voluntary direction change.
    pub retarget_in: f32,
}

impl Swim {
    /// Swim state for a freshly placed fish. The target equals the
    /// position, so the first tick immediately proposes a real one.
    pub fn at_rest(position: Vec3, sway_phase: f32, sway_rate: f32, retarget_in: f32) -> Self {
        Self {
            velocity: Vec3::ZERO,
            target: position,
            sway_phase,
            bob_phase: sway_phase * 0.7,
            sway_rate,
            retarget_in,
        }
    }
}

/// Marks a fish as caught. Set once and never cleared, so a spear test
/// can never score the same fish twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Caught;

/// Marks a fish held by the player's grab interaction. The swim system
/// releases control while this is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Grabbed;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_exclude_decoys() {
        assert!(!Species::Starfish.is_target_candidate());
        assert!(!Species::Clownfish.is_target_candidate());
        let candidates = Species::all()
            .iter()
            .filter(|s| s.is_target_candidate())
            .count();
        assert_eq!(candidates, 4);
    }

    #[test]
    fn test_points_rise_with_rarity() {
        assert!(Species::Goldfish.points() > Species::Tuna.points());
        assert!(Species::Tuna.points() > Species::Clownfish.points());
    }
}
