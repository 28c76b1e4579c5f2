//! Floor-polygon geometry: containment, edge distance, inward normals,
//! reflection.
//!
//! A polygon is an ordered slice of [`PolyPoint`] treated as a closed loop
//! (the last vertex connects back to the first). All tests run purely in
//! the horizontal X/Z plane; vertical containment is a scalar clamp handled
//! by the caller.

use serde::{Deserialize, Serialize};

const EPSILON: f32 = 1e-6;

/// A polygon vertex in the horizontal plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PolyPoint {
    pub x: f32,
    pub z: f32,
}

impl PolyPoint {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }
}

/// Closest point on a polygon's outline, with the edge it lies on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePoint {
    pub x: f32,
    pub z: f32,
    pub segment: usize,
}

/// Ray-casting parity test. Returns false for degenerate polygons
/// (fewer than 3 vertices).
///
/// Boundary behavior is deterministic: a point lying exactly on a
/// minimum-X or minimum-Z edge counts as inside, one on a maximum-X or
/// maximum-Z edge as outside (the cast ray only crosses edges whose
/// span strictly covers the point's Z).
pub fn point_in_polygon(x: f32, z: f32, polygon: &[PolyPoint]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, zi) = (polygon[i].x, polygon[i].z);
        let (xj, zj) = (polygon[j].x, polygon[j].z);
        if (zi > z) != (zj > z) && x < (xj - xi) * (z - zi) / (zj - zi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Minimum distance from a point to any edge of the polygon.
/// Empty input yields +infinity.
pub fn distance_to_edge(x: f32, z: f32, polygon: &[PolyPoint]) -> f32 {
    let mut min_dist = f32::INFINITY;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        let dx = b.x - a.x;
        let dz = b.z - a.z;
        let len_sq = dx * dx + dz * dz;
        if len_sq < EPSILON {
            continue;
        }
        let t = (((x - a.x) * dx + (z - a.z) * dz) / len_sq).clamp(0.0, 1.0);
        let px = a.x + t * dx;
        let pz = a.z + t * dz;
        let dist = ((x - px) * (x - px) + (z - pz) * (z - pz)).sqrt();
        if dist < min_dist {
            min_dist = dist;
        }
    }
    min_dist
}

/// Closest point on the polygon outline, or None when no edge has
/// usable length.
pub fn closest_point_on_edge(x: f32, z: f32, polygon: &[PolyPoint]) -> Option<EdgePoint> {
    let mut best: Option<(f32, EdgePoint)> = None;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        let dx = b.x - a.x;
        let dz = b.z - a.z;
        let len_sq = dx * dx + dz * dz;
        if len_sq < EPSILON {
            continue;
        }
        let t = (((x - a.x) * dx + (z - a.z) * dz) / len_sq).clamp(0.0, 1.0);
        let px = a.x + t * dx;
        let pz = a.z + t * dz;
        let dist_sq = (x - px) * (x - px) + (z - pz) * (z - pz);
        if best.map_or(true, |(d, _)| dist_sq < d) {
            best = Some((
                dist_sq,
                EdgePoint {
                    x: px,
                    z: pz,
                    segment: i,
                },
            ));
        }
    }
    best.map(|(_, p)| p)
}

/// Vertex mean of the polygon (not the area centroid). Used as the
/// teleport destination for the safety net and to orient edge normals.
pub fn centroid(polygon: &[PolyPoint]) -> PolyPoint {
    if polygon.is_empty() {
        return PolyPoint::default();
    }
    let mut cx = 0.0;
    let mut cz = 0.0;
    for p in polygon {
        cx += p.x;
        cz += p.z;
    }
    let n = polygon.len() as f32;
    PolyPoint::new(cx / n, cz / n)
}

/// Unit normal of edge `segment`, oriented inward (toward the centroid).
/// Degenerate edges yield the zero vector.
pub fn segment_normal(polygon: &[PolyPoint], segment: usize) -> (f32, f32) {
    if polygon.len() < 2 || segment >= polygon.len() {
        return (0.0, 0.0);
    }
    let a = polygon[segment];
    let b = polygon[(segment + 1) % polygon.len()];
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    let len = (dx * dx + dz * dz).sqrt();
    if len < EPSILON {
        return (0.0, 0.0);
    }
    let mut nx = -dz / len;
    let mut nz = dx / len;
    let center = centroid(polygon);
    let mid_x = (a.x + b.x) * 0.5;
    let mid_z = (a.z + b.z) * 0.5;
    if nx * (center.x - mid_x) + nz * (center.z - mid_z) < 0.0 {
        nx = -nx;
        nz = -nz;
    }
    (nx, nz)
}

/// Reflect a direction across a surface normal: `R = V - 2(V·N)N`,
/// normalized. A zero-length result falls back to the reversed input.
pub fn reflect(dir_x: f32, dir_z: f32, normal_x: f32, normal_z: f32) -> (f32, f32) {
    let dot = dir_x * normal_x + dir_z * normal_z;
    let rx = dir_x - 2.0 * dot * normal_x;
    let rz = dir_z - 2.0 * dot * normal_z;
    let len = (rx * rx + rz * rz).sqrt();
    if len < EPSILON {
        return (-dir_x, -dir_z);
    }
    (rx / len, rz / len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<PolyPoint> {
        vec![
            PolyPoint::new(0.0, 0.0),
            PolyPoint::new(4.0, 0.0),
            PolyPoint::new(4.0, 4.0),
            PolyPoint::new(0.0, 4.0),
        ]
    }

    /// L-shape: a 4x4 square with its (+X,+Z) quadrant cut away.
    fn l_shape() -> Vec<PolyPoint> {
        vec![
            PolyPoint::new(0.0, 0.0),
            PolyPoint::new(4.0, 0.0),
            PolyPoint::new(4.0, 2.0),
            PolyPoint::new(2.0, 2.0),
            PolyPoint::new(2.0, 4.0),
            PolyPoint::new(0.0, 4.0),
        ]
    }

    // --- Containment ---

    #[test]
    fn test_center_is_inside() {
        assert!(point_in_polygon(2.0, 2.0, &square()));
    }

    #[test]
    fn test_far_point_is_outside() {
        assert!(!point_in_polygon(5.0, 5.0, &square()));
    }

    #[test]
    fn test_edge_points_are_deterministic() {
        // Minimum-X edge counts as inside, maximum-X edge as outside.
        assert!(point_in_polygon(0.0, 2.0, &square()));
        assert!(!point_in_polygon(4.0, 2.0, &square()));
    }

    #[test]
    fn test_degenerate_polygon_is_never_inside() {
        let line = vec![PolyPoint::new(0.0, 0.0), PolyPoint::new(4.0, 0.0)];
        assert!(!point_in_polygon(2.0, 0.0, &line));
        assert!(!point_in_polygon(0.0, 0.0, &[]));
    }

    #[test]
    fn test_concave_notch_is_outside() {
        let poly = l_shape();
        assert!(point_in_polygon(1.0, 1.0, &poly));
        assert!(point_in_polygon(1.0, 3.0, &poly));
        // The cut-away quadrant
        assert!(!point_in_polygon(3.0, 3.0, &poly));
    }

    // --- Edge distance ---

    #[test]
    fn test_distance_from_center() {
        let d = distance_to_edge(2.0, 2.0, &square());
        assert!((d - 2.0).abs() < 0.001, "d={d}");
    }

    #[test]
    fn test_distance_on_vertex_is_zero() {
        let d = distance_to_edge(0.0, 0.0, &square());
        assert!(d.abs() < 0.001, "d={d}");
    }

    #[test]
    fn test_distance_outside_is_positive() {
        let d = distance_to_edge(2.0, -1.0, &square());
        assert!((d - 1.0).abs() < 0.001, "d={d}");
    }

    #[test]
    fn test_distance_empty_polygon_is_infinite() {
        assert!(distance_to_edge(1.0, 1.0, &[]).is_infinite());
    }

    // --- Closest point ---

    #[test]
    fn test_closest_point_projects_onto_edge() {
        let p = closest_point_on_edge(2.0, -1.0, &square()).unwrap();
        assert!((p.x - 2.0).abs() < 0.001 && p.z.abs() < 0.001);
        assert_eq!(p.segment, 0);
    }

    #[test]
    fn test_closest_point_clamps_to_vertex() {
        let p = closest_point_on_edge(-1.0, -1.0, &square()).unwrap();
        assert!(p.x.abs() < 0.001 && p.z.abs() < 0.001);
    }

    #[test]
    fn test_closest_point_none_for_degenerate() {
        let dot = vec![PolyPoint::new(1.0, 1.0), PolyPoint::new(1.0, 1.0)];
        assert!(closest_point_on_edge(0.0, 0.0, &dot).is_none());
    }

    // --- Normals ---

    #[test]
    fn test_segment_normals_point_inward() {
        let poly = square();
        let center = centroid(&poly);
        for segment in 0..poly.len() {
            let (nx, nz) = segment_normal(&poly, segment);
            let a = poly[segment];
            let b = poly[(segment + 1) % poly.len()];
            let to_center_x = center.x - (a.x + b.x) * 0.5;
            let to_center_z = center.z - (a.z + b.z) * 0.5;
            assert!(
                nx * to_center_x + nz * to_center_z > 0.0,
                "segment {segment} normal ({nx},{nz}) points outward"
            );
        }
    }

    #[test]
    fn test_bottom_edge_normal_is_plus_z() {
        let (nx, nz) = segment_normal(&square(), 0);
        assert!(nx.abs() < 0.001 && (nz - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_centroid_of_square() {
        let c = centroid(&square());
        assert!((c.x - 2.0).abs() < 0.001 && (c.z - 2.0).abs() < 0.001);
    }

    // --- Reflection ---

    #[test]
    fn test_head_on_reflection_reverses() {
        let (rx, rz) = reflect(1.0, 0.0, -1.0, 0.0);
        assert!((rx + 1.0).abs() < 0.001, "rx={rx}");
        assert!(rz.abs() < 0.001, "rz={rz}");
    }

    #[test]
    fn test_angled_reflection_mirrors_one_component() {
        let inv = std::f32::consts::FRAC_1_SQRT_2;
        let (rx, rz) = reflect(inv, inv, -1.0, 0.0);
        assert!((rx + inv).abs() < 0.001, "rx={rx}");
        assert!((rz - inv).abs() < 0.001, "rz={rz}");
    }

    #[test]
    fn test_reflection_output_is_unit_length() {
        let (rx, rz) = reflect(3.0, 4.0, 0.0, -1.0);
        let len = (rx * rx + rz * rz).sqrt();
        assert!((len - 1.0).abs() < 0.001, "len={len}");
    }
}
