//! Spawn system - population placement inside the scanned boundary.

use hecs::{Entity, World};
use rand::Rng;
use roomreef_logic::constants::spawn;

use crate::components::{Fish, Heading, Position, Species, Swim, Vec3};
use crate::config::SessionConfig;
use crate::state::BoundaryState;

/// Spawn a full population inside the current boundary. Does nothing
/// when the room has not been scanned. Returns how many spawned.
pub fn spawn_population(world: &mut World, state: &BoundaryState, config: &SessionConfig) -> usize {
    if !state.scanned() {
        return 0;
    }
    let mut rng = rand::thread_rng();
    let pool = Species::all();
    let mut spawned = 0;
    for _ in 0..config.fish_count {
        let species = pool[rng.gen_range(0..pool.len())];
        let position = sample_spawn_point(state, species.clearance(), &mut rng);
        let speed = rng.gen_range(config.speed_min..config.speed_max);
        let sway_phase = rng.gen_range(0.0..std::f32::consts::TAU);
        let sway_rate = 1.2 + rng.gen::<f32>() * 0.8;
        let retarget_in = rng.gen_range(config.retarget_min..config.retarget_max);
        world.spawn((
            Position { world: position },
            Swim::at_rest(position, sway_phase, sway_rate, retarget_in),
            Heading {
                yaw: rng.gen_range(0.0..std::f32::consts::TAU),
                roll: 0.0,
            },
            Fish { species, speed },
        ));
        spawned += 1;
    }
    spawned
}

/// Move every live fish to a fresh point inside the (new) boundary and
/// zero its motion so it settles naturally. Used when a re-scan
/// replaces the room out from under the population.
pub fn reposition_population(
    world: &mut World,
    state: &BoundaryState,
    config: &SessionConfig,
) -> usize {
    if !state.scanned() {
        return 0;
    }
    let mut rng = rand::thread_rng();
    let mut moves: Vec<(Entity, Vec3, f32)> = Vec::new();
    for (entity, fish) in world.query::<&Fish>().iter() {
        let point = sample_spawn_point(state, fish.species.clearance(), &mut rng);
        let retarget_in = rng.gen_range(config.retarget_min..config.retarget_max);
        moves.push((entity, point, retarget_in));
    }
    let count = moves.len();
    for (entity, point, retarget_in) in moves {
        if let Ok(mut position) = world.get::<&mut Position>(entity) {
            position.world = point;
        }
        if let Ok(mut swim) = world.get::<&mut Swim>(entity) {
            swim.velocity = Vec3::ZERO;
            swim.target = point;
            swim.retarget_in = retarget_in;
        }
    }
    count
}

/// Remove every fish entity. Returns how many were removed.
pub fn despawn_all(world: &mut World) -> usize {
    let entities: Vec<Entity> = world.query::<&Fish>().iter().map(|(e, _)| e).collect();
    let count = entities.len();
    for entity in entities {
        let _ = world.despawn(entity);
    }
    count
}

/// Number of live fish in the world.
pub fn live_fish(world: &World) -> usize {
    world.query::<&Fish>().iter().count()
}

/// Pick a spawn point, inset from the walls by the species clearance on
/// top of the base margin. With an oriented box the sample is drawn in
/// its local rectangle and round-tripped through the inverse transform;
/// a sample that lands outside the rectangle (minus tolerance) is
/// retried, and after 20 failures the axis-aligned footprint takes over.
fn sample_spawn_point(state: &BoundaryState, clearance: f32, rng: &mut impl Rng) -> Vec3 {
    let y = sample_height(state, rng);
    let inset = spawn::LATERAL_INSET + clearance;
    if let Some(bx) = state.oriented() {
        let span_x = (bx.half_width - inset).max(0.0) * 2.0;
        let span_z = (bx.half_depth - inset).max(0.0) * 2.0;
        let limit_x = (bx.half_width - spawn::ORIENTED_TOLERANCE).max(0.0);
        let limit_z = (bx.half_depth - spawn::ORIENTED_TOLERANCE).max(0.0);
        for _ in 0..20 {
            let lx = (rng.gen::<f32>() - 0.5) * span_x;
            let lz = (rng.gen::<f32>() - 0.5) * span_z;
            let (wx, _, wz) = bx.to_world.transform_point(lx, 0.0, lz);
            let (cx, _, cz) = bx.to_local.transform_point(wx, 0.0, wz);
            if cx.abs() <= limit_x && cz.abs() <= limit_z {
                return Vec3::new(wx, y, wz);
            }
        }
    }
    let bounds = state.bounds();
    let x = if bounds.width() > inset * 2.0 + 0.01 {
        rng.gen_range(bounds.min_x + inset..bounds.max_x - inset)
    } else {
        bounds.center_x()
    };
    let z = if bounds.depth() > inset * 2.0 + 0.01 {
        rng.gen_range(bounds.min_z + inset..bounds.max_z - inset)
    } else {
        bounds.center_z()
    };
    Vec3::new(x, y, z)
}

fn sample_height(state: &BoundaryState, rng: &mut impl Rng) -> f32 {
    let lo = state.floor_y() + spawn::FLOOR_OFFSET;
    let hi = state.ceiling_y() - spawn::CEILING_OFFSET;
    if lo < hi {
        rng.gen_range(lo..hi)
    } else {
        (lo + hi) * 0.5
    }
}
