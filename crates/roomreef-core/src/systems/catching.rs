//! Catch system - spear-tip collision tests against live fish.

use hecs::{Entity, World};
use roomreef_logic::transform::Pose;

use crate::components::{Caught, Fish, Position, Species, Vec3};
use crate::config::SessionConfig;
use crate::events::{EventBus, ReefEvent};
use crate::round::{CaughtFishRecord, Round};

/// World position of the weapon tip: the pose origin pushed forward
/// along the weapon's local +Z axis.
pub fn weapon_tip(pose: &Pose, tip_offset: f32) -> Vec3 {
    let (x, y, z) = pose.transform_point(0.0, 0.0, tip_offset);
    Vec3::new(x, y, z)
}

/// Test the spear at `pose` against every live fish. Hits are marked
/// caught exactly once, scored through the round, published on the bus
/// and removed from the world. Returns the records for this test.
pub fn catch_system(
    world: &mut World,
    round: &mut Round,
    events: &mut EventBus,
    config: &SessionConfig,
    pose: &Pose,
    now: f64,
) -> Vec<CaughtFishRecord> {
    let tip = weapon_tip(pose, config.tip_offset);
    let radius_sq = config.catch_radius * config.catch_radius;

    let hits: Vec<(Entity, Species)> = world
        .query::<(&Position, &Fish, Option<&Caught>)>()
        .iter()
        .filter(|(_, (position, _, caught))| {
            caught.is_none() && position.world.distance_squared(&tip) <= radius_sq
        })
        .map(|(entity, (_, fish, _))| (entity, fish.species))
        .collect();

    let mut records = Vec::with_capacity(hits.len());
    for (entity, species) in hits {
        // Mark first so the entity can never score again, then remove it
        let _ = world.insert_one(entity, Caught);
        let record = round.record_catch(species, config.miss_penalty, now);
        events.publish(ReefEvent::FishCaught(record));
        let _ = world.despawn(entity);
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Heading, Swim};
    use crate::systems::live_fish;

    fn spawn_fish_at(world: &mut World, species: Species, pos: Vec3) -> Entity {
        world.spawn((
            Position { world: pos },
            Swim::at_rest(pos, 0.0, 1.5, 5.0),
            Heading::default(),
            Fish {
                species,
                speed: 0.5,
            },
        ))
    }

    /// Pose whose tip (0.2 m along +Z) lands exactly on `target`.
    fn pose_hitting(target: Vec3, tip_offset: f32) -> Pose {
        Pose::from_translation(target.x, target.y, target.z - tip_offset)
    }

    #[test]
    fn test_target_catch_scores_and_removes() {
        let mut world = World::new();
        let mut round = Round::new();
        let mut events = EventBus::new();
        let config = SessionConfig::default();
        let target = round.target();
        let fish_pos = Vec3::new(1.0, 1.2, -0.5);
        spawn_fish_at(&mut world, target, fish_pos);

        let records = catch_system(
            &mut world,
            &mut round,
            &mut events,
            &config,
            &pose_hitting(fish_pos, config.tip_offset),
            3.0,
        );

        assert_eq!(records.len(), 1);
        assert!(records[0].correct);
        assert_eq!(round.score(), target.points());
        assert_eq!(live_fish(&world), 0);
        let drained = events.drain();
        assert_eq!(drained.len(), 1);
        match &drained[0] {
            ReefEvent::FishCaught(record) => assert_eq!(record.species, target),
            other => panic!("Expected FishCaught, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_species_penalized() {
        let mut world = World::new();
        let mut round = Round::new();
        let mut events = EventBus::new();
        let config = SessionConfig::default();
        let decoy = Species::Starfish;
        assert_ne!(round.target(), decoy);
        let fish_pos = Vec3::new(0.0, 1.0, 0.0);
        spawn_fish_at(&mut world, decoy, fish_pos);

        let records = catch_system(
            &mut world,
            &mut round,
            &mut events,
            &config,
            &pose_hitting(fish_pos, config.tip_offset),
            1.0,
        );

        assert_eq!(records.len(), 1);
        assert!(!records[0].correct);
        assert_eq!(round.score(), config.miss_penalty);
    }

    #[test]
    fn test_miss_leaves_everything_alone() {
        let mut world = World::new();
        let mut round = Round::new();
        let mut events = EventBus::new();
        let config = SessionConfig::default();
        spawn_fish_at(&mut world, Species::Tuna, Vec3::new(0.0, 1.0, 0.0));

        let records = catch_system(
            &mut world,
            &mut round,
            &mut events,
            &config,
            &pose_hitting(Vec3::new(2.0, 1.0, 2.0), config.tip_offset),
            1.0,
        );

        assert!(records.is_empty());
        assert_eq!(round.score(), 0);
        assert_eq!(live_fish(&world), 1);
        assert!(events.is_empty());
    }

    #[test]
    fn test_second_test_cannot_double_count() {
        let mut world = World::new();
        let mut round = Round::new();
        let mut events = EventBus::new();
        let config = SessionConfig::default();
        let fish_pos = Vec3::new(0.5, 1.0, 0.5);
        spawn_fish_at(&mut world, round.target(), fish_pos);
        let pose = pose_hitting(fish_pos, config.tip_offset);

        let first = catch_system(&mut world, &mut round, &mut events, &config, &pose, 1.0);
        let second = catch_system(&mut world, &mut round, &mut events, &config, &pose, 1.1);

        assert_eq!(first.len(), 1);
        assert!(second.is_empty(), "double catch must be a no-op");
        assert_eq!(round.records().len(), 1);
    }

    #[test]
    fn test_tip_respects_weapon_rotation() {
        // Weapon at the origin pointing along world +X (yaw 90 degrees)
        let pose = Pose::from_translation_rotation_y(0.0, 1.0, 0.0, std::f32::consts::FRAC_PI_2);
        let tip = weapon_tip(&pose, 0.2);
        assert!((tip.x - 0.2).abs() < 0.001, "tip.x={}", tip.x);
        assert!((tip.y - 1.0).abs() < 0.001);
        assert!(tip.z.abs() < 0.001, "tip.z={}", tip.z);
    }
}
