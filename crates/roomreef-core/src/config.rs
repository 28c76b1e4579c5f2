//! Session configuration - every tunable in one place.

use roomreef_logic::constants::motion;
use serde::{Deserialize, Serialize};

/// Tunables for a room session. `Default` gives the values the game
/// ships with; hosts may override any field through [`SessionConfig::from_json`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of fish per population.
    pub fish_count: usize,
    /// Seconds the scan aggregation window stays open.
    pub scan_window: f32,
    /// Seconds after which the session spawns without any scan data.
    pub spawn_fallback: f32,
    /// Seconds between target-species rotations.
    pub target_rotation: f32,
    /// Minimum distance from a fish center to the boundary edge.
    pub safety_margin: f32,
    /// Catch radius around the weapon tip.
    pub catch_radius: f32,
    /// Forward offset of the weapon tip along its local +Z axis.
    pub tip_offset: f32,
    /// Cruise speed range sampled per fish, in m/s.
    pub speed_min: f32,
    pub speed_max: f32,
    /// Peak lateral sway speed in m/s.
    pub sway_speed: f32,
    /// Peak vertical bob speed in m/s.
    pub bob_speed: f32,
    /// Vertical bob frequency in radians per second.
    pub bob_frequency: f32,
    /// Angular slew rate toward the travel direction, per second.
    pub turn_rate: f32,
    /// Voluntary retarget interval range in seconds.
    pub retarget_min: f32,
    pub retarget_max: f32,
    /// Retarget interval range after a collision, in seconds.
    pub cooldown_min: f32,
    pub cooldown_max: f32,
    /// Score delta when the caught species is not the target.
    pub miss_penalty: i32,
    /// Synthetic room used when no usable scan ever arrives.
    pub fallback_center_x: f32,
    pub fallback_center_z: f32,
    pub fallback_width: f32,
    pub fallback_depth: f32,
    pub fallback_height: f32,
    pub fallback_floor_y: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fish_count: 8,
            scan_window: 15.0,
            spawn_fallback: 20.0,
            target_rotation: 10.0,
            safety_margin: motion::EDGE_SAFETY,
            catch_radius: 0.18,
            tip_offset: 0.2,
            speed_min: 0.3,
            speed_max: 0.7,
            sway_speed: 0.15,
            bob_speed: 0.1,
            bob_frequency: 2.0,
            turn_rate: 4.0,
            retarget_min: 4.0,
            retarget_max: 9.0,
            cooldown_min: 2.0,
            cooldown_max: 5.0,
            miss_penalty: -5,
            fallback_center_x: 0.0,
            fallback_center_z: -2.0,
            fallback_width: 6.0,
            fallback_depth: 4.0,
            fallback_height: 2.5,
            fallback_floor_y: 0.0,
        }
    }
}

impl SessionConfig {
    /// Parse a (possibly partial) JSON override. Absent fields keep
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = SessionConfig::default();
        assert_eq!(config.fish_count, 8);
        assert!((config.scan_window - 15.0).abs() < 0.001);
        assert!((config.safety_margin - 0.4).abs() < 0.001);
        assert_eq!(config.miss_penalty, -5);
    }

    #[test]
    fn test_partial_json_override() {
        let config = SessionConfig::from_json(r#"{"fish_count": 3, "scan_window": 5.0}"#)
            .expect("valid override");
        assert_eq!(config.fish_count, 3);
        assert!((config.scan_window - 5.0).abs() < 0.001);
        // untouched fields fall back to defaults
        assert!((config.spawn_fallback - 20.0).abs() < 0.001);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(SessionConfig::from_json("{not json").is_err());
    }
}
