//! Swim system - steering, sway, boundary constraint and recovery.

use hecs::{Entity, World};
use rand::Rng;
use roomreef_logic::boundary::{Axis, Boundary, Correction};
use roomreef_logic::constants::motion;

use crate::components::{Fish, Grabbed, Heading, Position, Swim, Vec3};
use crate::config::SessionConfig;
use crate::state::BoundaryState;

struct SwimUpdate {
    entity: Entity,
    position: Position,
    swim: Swim,
    heading: Heading,
}

/// Advance every free-swimming fish by one tick.
///
/// Per fish: steer toward the current target, add sway and bob,
/// constrain the step against the room boundary, deflect off obstacle
/// volumes, clamp to the vertical band, then run the safety net so the
/// committed position always honors the edge margin. Held fish and an
/// unscanned room freeze in place.
pub fn swim_system(
    world: &mut World,
    state: &BoundaryState,
    config: &SessionConfig,
    sim_time: f64,
    delta_seconds: f32,
) {
    if !state.scanned() || delta_seconds <= 0.0 {
        return;
    }
    let dt = delta_seconds;
    let boundary = state.boundary();
    let mut rng = rand::thread_rng();
    let mut updates = Vec::new();

    for (entity, (position, swim, heading, fish, grabbed)) in world
        .query::<(&Position, &Swim, &Heading, &Fish, Option<&Grabbed>)>()
        .iter()
    {
        if grabbed.is_some() {
            continue;
        }
        let margin = config.safety_margin + fish.species.clearance();
        let mut swim = *swim;
        let mut heading = *heading;
        let mut pos = position.world;

        // Retarget when the goal is reached or the wander timer lapses
        swim.retarget_in -= dt;
        if pos.distance(&swim.target) < motion::TARGET_REACHED || swim.retarget_in <= 0.0 {
            match propose_target(&boundary, state, margin, fish.speed, &pos, &mut rng) {
                Some(target) => {
                    swim.target = target;
                    swim.retarget_in = rng.gen_range(config.retarget_min..config.retarget_max);
                }
                // Nowhere legal to go right now; retry shortly
                None => swim.retarget_in = rng.gen_range(config.cooldown_min..config.cooldown_max),
            }
        }

        // Blend velocity toward the target direction
        let desired = (swim.target - pos).normalize() * fish.speed;
        swim.velocity = swim.velocity.lerp(&desired, (dt * 1.5).min(1.0));

        // Cosmetic sway and bob, scaled by the tick like everything else
        swim.sway_phase += dt * swim.sway_rate;
        swim.bob_phase += dt * config.bob_frequency;
        let lateral = swim.velocity.cross(&Vec3::UP).normalize();
        let sway = lateral * (swim.sway_phase.sin() * config.sway_speed);
        let bob = Vec3::new(0.0, swim.bob_phase.sin() * config.bob_speed, 0.0);

        // Tentative step, constrained against the boundary
        let next = pos + (swim.velocity + sway + bob) * dt;
        let hit = boundary.constrain(
            pos.x,
            pos.z,
            next.x,
            next.z,
            swim.velocity.x,
            swim.velocity.z,
            margin,
        );
        pos.x = hit.x;
        pos.z = hit.z;
        pos.y = next.y;
        swim.velocity.x = hit.vel_x;
        swim.velocity.z = hit.vel_z;
        let mut collided = hit.blocked;

        // Obstacle volumes: bounce along the dominant axis and cancel
        // this tick's motion on it
        for obstacle in state.obstacles() {
            if let Some(d) = obstacle.deflect(pos.x, pos.y, pos.z, motion::FISH_RADIUS) {
                match d.axis {
                    Axis::X => {
                        swim.velocity.x = d.sign * swim.velocity.x.abs() * motion::BOUNCE_KICK;
                        pos.x = position.world.x;
                    }
                    Axis::Y => {
                        swim.velocity.y = d.sign * swim.velocity.y.abs() * motion::BOUNCE_KICK;
                        pos.y = position.world.y;
                    }
                    Axis::Z => {
                        swim.velocity.z = d.sign * swim.velocity.z.abs() * motion::BOUNCE_KICK;
                        pos.z = position.world.z;
                    }
                }
                collided = true;
                break;
            }
        }

        // Safety net: the committed position must honor the margin
        match boundary.recover(pos.x, pos.z, margin) {
            Correction::None => {}
            Correction::PushedInward { x, z } => {
                pos.x = x;
                pos.z = z;
                collided = true;
            }
            Correction::Teleported { x, z } => {
                pos.x = x;
                pos.z = z;
                swim.velocity = Vec3::ZERO;
                swim.retarget_in = 0.0;
            }
        }

        // Vertical band between floor and ceiling
        let (floor, ceiling) = state.vertical_range(motion::VERTICAL_CLEARANCE);
        if pos.y < floor {
            pos.y = floor + motion::CLAMP_INSET;
            swim.velocity.y = swim.velocity.y.abs() * motion::BOUNCE_KICK;
        } else if pos.y > ceiling {
            pos.y = ceiling - motion::CLAMP_INSET;
            swim.velocity.y = -swim.velocity.y.abs() * motion::BOUNCE_KICK;
        }

        // Slew the heading toward the travel direction
        let planar = (swim.velocity.x * swim.velocity.x + swim.velocity.z * swim.velocity.z).sqrt();
        if planar > 1e-4 {
            let target_yaw = swim.velocity.x.atan2(swim.velocity.z);
            heading.yaw += wrap_angle(target_yaw - heading.yaw) * (dt * config.turn_rate).min(1.0);
            heading.yaw = wrap_angle(heading.yaw);
        }
        heading.roll = ((sim_time * 0.5).sin() * 0.02) as f32;

        // A collision puts the fish on a short cooldown before its next
        // voluntary turn, unless a teleport already forced one
        if collided && swim.retarget_in > 0.0 {
            swim.retarget_in = rng.gen_range(config.cooldown_min..config.cooldown_max);
        }

        updates.push(SwimUpdate {
            entity,
            position: Position { world: pos },
            swim,
            heading,
        });
    }

    for update in updates {
        if let Ok(mut position) = world.get::<&mut Position>(update.entity) {
            *position = update.position;
        }
        if let Ok(mut swim) = world.get::<&mut Swim>(update.entity) {
            *swim = update.swim;
        }
        if let Ok(mut heading) = world.get::<&mut Heading>(update.entity) {
            *heading = update.heading;
        }
    }
}

/// Sample a wander target. Candidates come from the axis-aligned
/// footprint and must pass the active boundary test twice: at the point
/// itself, and one notional second of travel toward it.
fn propose_target(
    boundary: &Boundary<'_>,
    state: &BoundaryState,
    margin: f32,
    speed: f32,
    from: &Vec3,
    rng: &mut impl Rng,
) -> Option<Vec3> {
    let bounds = state.bounds();
    if bounds.width() <= margin * 2.0 + 0.01 || bounds.depth() <= margin * 2.0 + 0.01 {
        return None;
    }
    let (y_lo, y_hi) = state.vertical_range(motion::VERTICAL_CLEARANCE);
    for _ in 0..12 {
        let x = rng.gen_range(bounds.min_x + margin..bounds.max_x - margin);
        let z = rng.gen_range(bounds.min_z + margin..bounds.max_z - margin);
        let y = if y_lo < y_hi {
            rng.gen_range(y_lo..y_hi)
        } else {
            (y_lo + y_hi) * 0.5
        };
        if !boundary.contains(x, z, margin) {
            continue;
        }
        let candidate = Vec3::new(x, y, z);
        let dir = (candidate - *from).normalize();
        let probe = *from + dir * (speed * motion::LOOKAHEAD_SECS);
        if boundary.contains(probe.x, probe.z, margin) {
            return Some(candidate);
        }
    }
    None
}

/// Wrap an angle to (-PI, PI].
fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % std::f32::consts::TAU;
    if a > std::f32::consts::PI {
        a -= std::f32::consts::TAU;
    } else if a < -std::f32::consts::PI {
        a += std::f32::consts::TAU;
    }
    a
}
