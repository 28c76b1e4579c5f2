//! Boundary representations and constrained-motion dispatch.
//!
//! A scanned room yields up to three nested representations of the same
//! playable area: the exact floor polygon, an oriented (rotated) box
//! fitted to it, and a world axis-aligned box. [`Boundary`] is the tagged
//! view the motion code dispatches over, tightest representation first.

use serde::{Deserialize, Serialize};

use crate::constants::motion;
use crate::polygon::{self, PolyPoint};
use crate::transform::Pose;

const EPSILON: f32 = 1e-6;

/// World-space axis-aligned rectangle in the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Aabb {
    pub fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_z,
            max_z,
        }
    }

    /// Smallest rectangle covering all points. None for an empty set.
    pub fn from_points(points: &[PolyPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self::new(first.x, first.x, first.z, first.z);
        for p in &points[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.min_z = bounds.min_z.min(p.z);
            bounds.max_z = bounds.max_z.max(p.z);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f32 {
        self.max_z - self.min_z
    }

    pub fn center_x(&self) -> f32 {
        (self.min_x + self.max_x) * 0.5
    }

    pub fn center_z(&self) -> f32 {
        (self.min_z + self.max_z) * 0.5
    }

    pub fn contains(&self, x: f32, z: f32, margin: f32) -> bool {
        x >= self.min_x + margin
            && x <= self.max_x - margin
            && z >= self.min_z + margin
            && z <= self.max_z - margin
    }

    /// Clamp a point into the rectangle, keeping `margin` from each face.
    pub fn clamp(&self, x: f32, z: f32, margin: f32) -> (f32, f32) {
        (
            x.max(self.min_x + margin).min(self.max_x - margin),
            z.max(self.min_z + margin).min(self.max_z - margin),
        )
    }
}

/// World-space 3D box, used for obstacle volumes (tables, shelves).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub min_z: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub max_z: f32,
}

impl BoxBounds {
    /// Smallest box covering all world points. None for an empty set.
    pub fn from_points(points: &[(f32, f32, f32)]) -> Option<Self> {
        let &(x, y, z) = points.first()?;
        let mut b = Self {
            min_x: x,
            min_y: y,
            min_z: z,
            max_x: x,
            max_y: y,
            max_z: z,
        };
        for &(x, y, z) in &points[1..] {
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.min_z = b.min_z.min(z);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
            b.max_z = b.max_z.max(z);
        }
        Some(b)
    }

    pub fn center(&self) -> (f32, f32, f32) {
        (
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
            (self.min_z + self.max_z) * 0.5,
        )
    }

    /// Bounce axis for a body of `radius` overlapping the box, or None when
    /// the body is clear. The axis with the largest offset from the box
    /// center wins; vertical only when it dominates both horizontals.
    pub fn deflect(&self, x: f32, y: f32, z: f32, radius: f32) -> Option<Deflection> {
        if x < self.min_x - radius
            || x > self.max_x + radius
            || y < self.min_y - radius
            || y > self.max_y + radius
            || z < self.min_z - radius
            || z > self.max_z + radius
        {
            return None;
        }
        let (cx, cy, cz) = self.center();
        let dx = x - cx;
        let dy = y - cy;
        let dz = z - cz;
        let axis = if dy.abs() > dx.abs() && dy.abs() > dz.abs() {
            Axis::Y
        } else if dx.abs() > dz.abs() {
            Axis::X
        } else {
            Axis::Z
        };
        let sign = match axis {
            Axis::X => dx.signum(),
            Axis::Y => dy.signum(),
            Axis::Z => dz.signum(),
        };
        Some(Deflection { axis, sign })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Result of an obstacle overlap test: the axis to bounce along and the
/// outward sign on that axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deflection {
    pub axis: Axis,
    pub sign: f32,
}

/// Rotated-rectangle boundary carrying its own local<->world transforms.
///
/// The pose is re-centered on the polygon's local bounding rectangle at
/// construction, so local (0,0,0) is exactly the box center and the
/// containment test needs no offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    pub center_x: f32,
    pub center_z: f32,
    pub half_width: f32,
    pub half_depth: f32,
    pub rotation_y: f32,
    pub to_world: Pose,
    pub to_local: Pose,
}

impl OrientedBox {
    /// Fit a box to a plane's local polygon. None for an empty polygon.
    pub fn from_plane(pose: &Pose, local_polygon: &[PolyPoint]) -> Option<Self> {
        let rect = Aabb::from_points(local_polygon)?;
        let to_world = pose.translate_local(rect.center_x(), 0.0, rect.center_z());
        let to_local = to_world.inverse_rigid();
        let (center_x, _, center_z) = to_world.translation();
        Some(Self {
            center_x,
            center_z,
            half_width: rect.width() * 0.5,
            half_depth: rect.depth() * 0.5,
            rotation_y: to_world.rotation_y(),
            to_world,
            to_local,
        })
    }

    pub fn contains(&self, x: f32, z: f32, margin: f32) -> bool {
        let (lx, _, lz) = self.to_local.transform_point(x, 0.0, z);
        lx.abs() <= (self.half_width - margin).max(0.0)
            && lz.abs() <= (self.half_depth - margin).max(0.0)
    }
}

/// The active boundary, tightest representation first. Dispatch happens
/// here so callers never probe which fields of a scan happen to be set.
#[derive(Debug, Clone, Copy)]
pub enum Boundary<'a> {
    /// No completed scan. All motion freezes.
    None,
    AxisAligned(&'a Aabb),
    Oriented(&'a OrientedBox),
    Polygon(&'a [PolyPoint]),
}

/// Outcome of constraining one step of motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryHit {
    pub x: f32,
    pub z: f32,
    pub vel_x: f32,
    pub vel_z: f32,
    /// True when the step hit the boundary and was blocked or clamped.
    pub blocked: bool,
}

/// Forced correction applied by the per-tick safety net.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    /// Position already legal.
    None,
    /// Inside but within the margin band; nudged back to margin depth.
    PushedInward { x: f32, z: f32 },
    /// Fully outside; relocated to the polygon centroid.
    Teleported { x: f32, z: f32 },
}

impl Boundary<'_> {
    pub fn available(&self) -> bool {
        !matches!(self, Boundary::None)
    }

    /// Containment with a keep-out margin from the edge.
    pub fn contains(&self, x: f32, z: f32, margin: f32) -> bool {
        match self {
            Boundary::None => false,
            Boundary::AxisAligned(bounds) => bounds.contains(x, z, margin),
            Boundary::Oriented(bx) => bx.contains(x, z, margin),
            Boundary::Polygon(poly) => {
                polygon::point_in_polygon(x, z, poly)
                    && polygon::distance_to_edge(x, z, poly) >= margin
            }
        }
    }

    /// Constrain one step from (x, z) toward (next_x, next_z).
    ///
    /// A polygon boundary blocks the step outright and reflects the
    /// velocity off the violated edge; box boundaries clamp the position
    /// to the face and flip the offending velocity component with a
    /// small outward kick.
    pub fn constrain(
        &self,
        x: f32,
        z: f32,
        next_x: f32,
        next_z: f32,
        vel_x: f32,
        vel_z: f32,
        margin: f32,
    ) -> BoundaryHit {
        match self {
            Boundary::None => BoundaryHit {
                x,
                z,
                vel_x,
                vel_z,
                blocked: true,
            },
            Boundary::Polygon(poly) => {
                if polygon::point_in_polygon(next_x, next_z, poly)
                    && polygon::distance_to_edge(next_x, next_z, poly) >= margin
                {
                    return BoundaryHit {
                        x: next_x,
                        z: next_z,
                        vel_x,
                        vel_z,
                        blocked: false,
                    };
                }
                let speed = (vel_x * vel_x + vel_z * vel_z).sqrt();
                let mut rvx = -vel_x;
                let mut rvz = -vel_z;
                if speed > EPSILON {
                    if let Some(hit) = polygon::closest_point_on_edge(next_x, next_z, poly) {
                        let (nx, nz) = polygon::segment_normal(poly, hit.segment);
                        let (rx, rz) = polygon::reflect(vel_x / speed, vel_z / speed, nx, nz);
                        rvx = rx * speed;
                        rvz = rz * speed;
                    }
                }
                BoundaryHit {
                    x,
                    z,
                    vel_x: rvx,
                    vel_z: rvz,
                    blocked: true,
                }
            }
            Boundary::Oriented(bx) => {
                let (mut lx, _, mut lz) = bx.to_local.transform_point(next_x, 0.0, next_z);
                let (mut lvx, lvy, mut lvz) = bx.to_local.rotate_vector(vel_x, 0.0, vel_z);
                let limit_x = (bx.half_width - margin).max(0.0);
                let limit_z = (bx.half_depth - margin).max(0.0);
                let mut blocked = false;
                if lx.abs() > limit_x {
                    let side = lx.signum();
                    lx = side * (limit_x - motion::CLAMP_INSET).max(0.0);
                    lvx = -side * lvx.abs() * motion::BOUNCE_KICK;
                    blocked = true;
                }
                if lz.abs() > limit_z {
                    let side = lz.signum();
                    lz = side * (limit_z - motion::CLAMP_INSET).max(0.0);
                    lvz = -side * lvz.abs() * motion::BOUNCE_KICK;
                    blocked = true;
                }
                if !blocked {
                    return BoundaryHit {
                        x: next_x,
                        z: next_z,
                        vel_x,
                        vel_z,
                        blocked: false,
                    };
                }
                let (wx, _, wz) = bx.to_world.transform_point(lx, 0.0, lz);
                let (wvx, _, wvz) = bx.to_world.rotate_vector(lvx, lvy, lvz);
                BoundaryHit {
                    x: wx,
                    z: wz,
                    vel_x: wvx,
                    vel_z: wvz,
                    blocked: true,
                }
            }
            Boundary::AxisAligned(bounds) => {
                let mut px = next_x;
                let mut pz = next_z;
                let mut vx = vel_x;
                let mut vz = vel_z;
                let mut blocked = false;
                if px < bounds.min_x + margin {
                    px = bounds.min_x + margin + motion::CLAMP_INSET;
                    vx = vx.abs() * motion::BOUNCE_KICK;
                    blocked = true;
                } else if px > bounds.max_x - margin {
                    px = bounds.max_x - margin - motion::CLAMP_INSET;
                    vx = -vx.abs() * motion::BOUNCE_KICK;
                    blocked = true;
                }
                if pz < bounds.min_z + margin {
                    pz = bounds.min_z + margin + motion::CLAMP_INSET;
                    vz = vz.abs() * motion::BOUNCE_KICK;
                    blocked = true;
                } else if pz > bounds.max_z - margin {
                    pz = bounds.max_z - margin - motion::CLAMP_INSET;
                    vz = -vz.abs() * motion::BOUNCE_KICK;
                    blocked = true;
                }
                BoundaryHit {
                    x: px,
                    z: pz,
                    vel_x: vx,
                    vel_z: vz,
                    blocked,
                }
            }
        }
    }

    /// Per-tick safety net: force an already-committed position legal.
    ///
    /// Inside a polygon's margin band the point is pushed back to margin
    /// depth; at a corner that push can land inside the adjacent edge's
    /// band, so it repeats up to three times before falling back to a
    /// centroid teleport. Box boundaries simply clamp.
    pub fn recover(&self, x: f32, z: f32, margin: f32) -> Correction {
        match self {
            Boundary::None => Correction::None,
            Boundary::Polygon(poly) => {
                let mut px = x;
                let mut pz = z;
                let mut pushed = false;
                for _ in 0..3 {
                    if !polygon::point_in_polygon(px, pz, poly) {
                        let c = polygon::centroid(poly);
                        return Correction::Teleported { x: c.x, z: c.z };
                    }
                    if polygon::distance_to_edge(px, pz, poly) >= margin - EPSILON {
                        return if pushed {
                            Correction::PushedInward { x: px, z: pz }
                        } else {
                            Correction::None
                        };
                    }
                    match polygon::closest_point_on_edge(px, pz, poly) {
                        Some(edge) => {
                            let dx = px - edge.x;
                            let dz = pz - edge.z;
                            let len = (dx * dx + dz * dz).sqrt();
                            if len > EPSILON {
                                px = edge.x + dx / len * margin;
                                pz = edge.z + dz / len * margin;
                            } else {
                                let (nx, nz) = polygon::segment_normal(poly, edge.segment);
                                px = edge.x + nx * margin;
                                pz = edge.z + nz * margin;
                            }
                            pushed = true;
                        }
                        None => return Correction::None,
                    }
                }
                let c = polygon::centroid(poly);
                Correction::Teleported { x: c.x, z: c.z }
            }
            Boundary::Oriented(bx) => {
                let (lx, ly, lz) = bx.to_local.transform_point(x, 0.0, z);
                let limit_x = (bx.half_width - margin).max(0.0);
                let limit_z = (bx.half_depth - margin).max(0.0);
                if lx.abs() <= limit_x && lz.abs() <= limit_z {
                    return Correction::None;
                }
                let (wx, _, wz) = bx.to_world.transform_point(
                    lx.clamp(-limit_x, limit_x),
                    ly,
                    lz.clamp(-limit_z, limit_z),
                );
                Correction::PushedInward { x: wx, z: wz }
            }
            Boundary::AxisAligned(bounds) => {
                if bounds.contains(x, z, margin) {
                    return Correction::None;
                }
                let (cx, cz) = bounds.clamp(x, z, margin);
                Correction::PushedInward { x: cx, z: cz }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARGIN: f32 = 0.4;

    /// 4x4 m room centered on the origin.
    fn room_poly() -> Vec<PolyPoint> {
        vec![
            PolyPoint::new(-2.0, -2.0),
            PolyPoint::new(2.0, -2.0),
            PolyPoint::new(2.0, 2.0),
            PolyPoint::new(-2.0, 2.0),
        ]
    }

    fn tilted_box() -> OrientedBox {
        // 4x3 rectangle rotated 45 degrees around (1, 0, -1)
        let pose =
            Pose::from_translation_rotation_y(1.0, 0.0, -1.0, std::f32::consts::FRAC_PI_4);
        let local = vec![
            PolyPoint::new(-2.0, -1.5),
            PolyPoint::new(2.0, -1.5),
            PolyPoint::new(2.0, 1.5),
            PolyPoint::new(-2.0, 1.5),
        ];
        OrientedBox::from_plane(&pose, &local).unwrap()
    }

    // --- Axis-aligned bounds ---

    #[test]
    fn test_aabb_contains_respects_margin() {
        let bounds = Aabb::new(-2.0, 2.0, -2.0, 2.0);
        assert!(bounds.contains(0.0, 0.0, MARGIN));
        assert!(!bounds.contains(1.9, 0.0, MARGIN));
        assert!(!bounds.contains(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_aabb_clamp_pulls_inside() {
        let bounds = Aabb::new(-2.0, 2.0, -2.0, 2.0);
        let (x, z) = bounds.clamp(5.0, -9.0, MARGIN);
        assert!((x - 1.6).abs() < 0.001, "x={x}");
        assert!((z + 1.6).abs() < 0.001, "z={z}");
    }

    #[test]
    fn test_aabb_from_no_points() {
        assert!(Aabb::from_points(&[]).is_none());
    }

    // --- Oriented box ---

    #[test]
    fn test_oriented_round_trip() {
        let bx = tilted_box();
        let (wx, wy, wz) = bx.to_world.transform_point(0.3, 0.0, 0.4);
        let (lx, ly, lz) = bx.to_local.transform_point(wx, wy, wz);
        assert!((lx - 0.3).abs() < 1e-4, "lx={lx}");
        assert!(ly.abs() < 1e-4, "ly={ly}");
        assert!((lz - 0.4).abs() < 1e-4, "lz={lz}");
    }

    #[test]
    fn test_oriented_box_recenters_offset_polygon() {
        // Polygon whose local bbox center is (2, 1), not the origin
        let local = vec![
            PolyPoint::new(1.0, 0.0),
            PolyPoint::new(3.0, 0.0),
            PolyPoint::new(3.0, 2.0),
            PolyPoint::new(1.0, 2.0),
        ];
        let bx = OrientedBox::from_plane(&Pose::IDENTITY, &local).unwrap();
        assert!((bx.center_x - 2.0).abs() < 0.001);
        assert!((bx.center_z - 1.0).abs() < 0.001);
        assert!((bx.half_width - 1.0).abs() < 0.001);
        assert!(bx.contains(2.0, 1.0, 0.4));
        assert!(!bx.contains(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_oriented_contains_tracks_rotation() {
        let bx = tilted_box();
        // The box center is always inside; a point past the rotated long
        // axis is not, even though an unrotated box would contain it.
        assert!(bx.contains(bx.center_x, bx.center_z, MARGIN));
        let (far_x, _, far_z) = bx.to_world.transform_point(1.9, 0.0, 0.0);
        assert!(bx.contains(far_x, far_z, 0.0));
        assert!(!bx.contains(far_x, far_z, 0.5));
    }

    // --- Obstacle deflection ---

    #[test]
    fn test_deflect_picks_dominant_axis() {
        let table = BoxBounds {
            min_x: 0.0,
            min_y: 0.0,
            min_z: 0.0,
            max_x: 2.0,
            max_y: 1.0,
            max_z: 2.0,
        };
        let hit = table.deflect(1.8, 0.5, 1.0, 0.15).unwrap();
        assert_eq!(hit.axis, Axis::X);
        assert!(hit.sign > 0.0);

        let above = table.deflect(1.0, 0.95, 1.0, 0.15).unwrap();
        assert_eq!(above.axis, Axis::Y);
        assert!(above.sign > 0.0);
    }

    #[test]
    fn test_deflect_misses_clear_point() {
        let table = BoxBounds {
            min_x: 0.0,
            min_y: 0.0,
            min_z: 0.0,
            max_x: 2.0,
            max_y: 1.0,
            max_z: 2.0,
        };
        assert!(table.deflect(3.0, 0.5, 1.0, 0.15).is_none());
    }

    // --- Constrain ---

    #[test]
    fn test_polygon_blocks_escaping_step() {
        let poly = room_poly();
        let boundary = Boundary::Polygon(&poly);
        // Moving +X at 2 m/s from (1.9, 0); a 0.1 s step would commit (2.1, 0)
        let hit = boundary.constrain(1.9, 0.0, 2.1, 0.0, 2.0, 0.0, MARGIN);
        assert!(hit.blocked);
        assert!((hit.x - 1.9).abs() < 0.001, "x={}", hit.x);
        assert!(hit.z.abs() < 0.001);
        // Head-on into the +X wall: velocity reverses, speed kept
        assert!((hit.vel_x + 2.0).abs() < 0.001, "vel_x={}", hit.vel_x);
        assert!(hit.vel_z.abs() < 0.001);
    }

    #[test]
    fn test_polygon_commits_legal_step() {
        let poly = room_poly();
        let hit = Boundary::Polygon(&poly).constrain(0.0, 0.0, 0.5, 0.0, 1.0, 0.0, MARGIN);
        assert!(!hit.blocked);
        assert!((hit.x - 0.5).abs() < 0.001);
        assert!((hit.vel_x - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_oriented_constrain_clamps_and_reflects() {
        let bx = tilted_box();
        let boundary = Boundary::Oriented(&bx);
        // Step out past the local +X face
        let (cur_x, _, cur_z) = bx.to_world.transform_point(1.0, 0.0, 0.0);
        let (out_x, _, out_z) = bx.to_world.transform_point(2.5, 0.0, 0.0);
        let (vx, _, vz) = bx.to_world.rotate_vector(0.5, 0.0, 0.0);
        let hit = boundary.constrain(cur_x, cur_z, out_x, out_z, vx, vz, MARGIN);
        assert!(hit.blocked);
        assert!(bx.contains(hit.x, hit.z, 0.0));
        // Velocity now points back toward local -X
        let (lvx, _, _) = bx.to_local.rotate_vector(hit.vel_x, 0.0, hit.vel_z);
        assert!(lvx < 0.0, "lvx={lvx}");
    }

    #[test]
    fn test_aabb_constrain_flips_velocity() {
        let bounds = Aabb::new(-2.0, 2.0, -2.0, 2.0);
        let hit = Boundary::AxisAligned(&bounds).constrain(1.5, 0.0, 2.5, 0.0, 1.0, 0.0, MARGIN);
        assert!(hit.blocked);
        assert!(hit.x < 2.0 - MARGIN + 0.001);
        assert!(hit.vel_x < 0.0);
    }

    // --- Safety net ---

    #[test]
    fn test_recover_leaves_legal_position_alone() {
        let poly = room_poly();
        let correction = Boundary::Polygon(&poly).recover(0.0, 0.0, MARGIN);
        assert_eq!(correction, Correction::None);
    }

    #[test]
    fn test_recover_corner_within_one_call() {
        let poly = room_poly();
        let boundary = Boundary::Polygon(&poly);
        match boundary.recover(1.9, 1.9, MARGIN) {
            Correction::PushedInward { x, z } => {
                assert!(polygon::point_in_polygon(x, z, &poly));
                let d = polygon::distance_to_edge(x, z, &poly);
                assert!(d >= MARGIN - 0.001, "d={d}");
            }
            other => panic!("Expected PushedInward, got {:?}", other),
        }
    }

    #[test]
    fn test_recover_outside_teleports_to_centroid() {
        let poly = room_poly();
        match Boundary::Polygon(&poly).recover(5.0, 5.0, MARGIN) {
            Correction::Teleported { x, z } => {
                assert!(x.abs() < 0.001 && z.abs() < 0.001);
            }
            other => panic!("Expected Teleported, got {:?}", other),
        }
    }

    #[test]
    fn test_recover_oriented_clamps_outsider() {
        let bx = tilted_box();
        let boundary = Boundary::Oriented(&bx);
        let (out_x, _, out_z) = bx.to_world.transform_point(5.0, 0.0, 0.0);
        match boundary.recover(out_x, out_z, MARGIN) {
            Correction::PushedInward { x, z } => {
                assert!(bx.contains(x, z, MARGIN - 0.001));
            }
            other => panic!("Expected PushedInward, got {:?}", other),
        }
    }

    #[test]
    fn test_unscanned_boundary_never_contains() {
        assert!(!Boundary::None.contains(0.0, 0.0, 0.0));
        assert!(!Boundary::None.available());
    }
}
