//! Room-scan aggregation.
//!
//! Plane samples stream in from the host's plane-detection capability
//! while a scan window is open. Each new plane is classified exactly
//! once; when the window closes the accumulated planes reduce to a
//! single [`RoomScanResult`] describing the playable volume.

use std::collections::HashMap;

use roomreef_logic::boundary::{Aabb, BoxBounds, OrientedBox};
use roomreef_logic::classify::{classify_surface, PlaneOrientation, SurfaceClass};
use roomreef_logic::constants::room;
use roomreef_logic::polygon::PolyPoint;
use roomreef_logic::transform::Pose;
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;

/// One detected plane as delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneSample {
    /// Stable identity across detection frames.
    pub id: u64,
    pub orientation: PlaneOrientation,
    /// Plane-local to world transform. Detection can fail to resolve a
    /// pose for a frame, in which case the sample is unusable.
    pub pose: Option<Pose>,
    /// Ordered outline in the plane's local XZ frame.
    pub polygon: Vec<PolyPoint>,
}

/// A sample that survived validation, with world-derived measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPlane {
    pub id: u64,
    pub class: SurfaceClass,
    pub pose: Pose,
    pub local_polygon: Vec<PolyPoint>,
    /// Outline projected to the world XZ plane.
    pub world_polygon: Vec<PolyPoint>,
    /// World bounding box of the outline.
    pub world_box: BoxBounds,
    pub avg_y: f32,
    pub footprint_area: f32,
    pub relief: f32,
}

/// Classify a raw sample. Malformed samples (missing pose, fewer than
/// three vertices) yield None and are dropped without ceremony.
fn classify_sample(sample: &PlaneSample) -> Option<ClassifiedPlane> {
    let pose = sample.pose?;
    if sample.polygon.len() < 3 {
        return None;
    }
    let world: Vec<(f32, f32, f32)> = sample
        .polygon
        .iter()
        .map(|p| pose.transform_point(p.x, 0.0, p.z))
        .collect();
    let world_box = BoxBounds::from_points(&world)?;
    let avg_y = world.iter().map(|&(_, y, _)| y).sum::<f32>() / world.len() as f32;
    let footprint_area = (world_box.max_x - world_box.min_x) * (world_box.max_z - world_box.min_z);
    let relief = world_box.max_y - world_box.min_y;
    let class = classify_surface(sample.orientation, avg_y, footprint_area, relief);
    Some(ClassifiedPlane {
        id: sample.id,
        class,
        pose,
        local_polygon: sample.polygon.clone(),
        world_polygon: world.iter().map(|&(x, _, z)| PolyPoint::new(x, z)).collect(),
        world_box,
        avg_y,
        footprint_area,
        relief,
    })
}

/// The one aggregated value a completed scan produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomScanResult {
    /// World axis-aligned footprint of the floor.
    pub bounds: Aabb,
    pub floor_y: f32,
    pub ceiling_y: f32,
    pub width: f32,
    pub depth: f32,
    pub center_x: f32,
    pub center_z: f32,
    /// Rotation-correct box fitted to the floor plane, when one resolved.
    pub oriented: Option<OrientedBox>,
    /// Exact floor outline in world space, when one resolved.
    pub floor_polygon: Option<Vec<PolyPoint>>,
    /// Volumes fish must swim around.
    pub obstacles: Vec<BoxBounds>,
}

impl RoomScanResult {
    /// The synthetic room used when no usable scan arrives, either
    /// because the capability is absent or the window expired empty.
    pub fn synthetic(config: &SessionConfig) -> Self {
        let half_w = config.fallback_width * 0.5;
        let half_d = config.fallback_depth * 0.5;
        let bounds = Aabb::new(
            config.fallback_center_x - half_w,
            config.fallback_center_x + half_w,
            config.fallback_center_z - half_d,
            config.fallback_center_z + half_d,
        );
        Self {
            bounds,
            floor_y: config.fallback_floor_y,
            ceiling_y: config.fallback_floor_y + config.fallback_height,
            width: config.fallback_width,
            depth: config.fallback_depth,
            center_x: config.fallback_center_x,
            center_z: config.fallback_center_z,
            oriented: None,
            floor_polygon: None,
            obstacles: Vec::new(),
        }
    }
}

/// Accumulates classified planes during a scan window.
///
/// Classification is idempotent per plane id: detection re-reports the
/// same planes every frame, and only the first report counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanAggregator {
    active: bool,
    planes: HashMap<u64, ClassifiedPlane>,
}

impl ScanAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scan window, discarding planes from any previous scan.
    pub fn begin(&mut self) {
        self.planes.clear();
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    pub fn count_of(&self, class: SurfaceClass) -> usize {
        self.planes.values().filter(|p| p.class == class).count()
    }

    /// Feed one sample into the open window. Returns whether it was
    /// accepted; repeats and malformed samples are silently ignored.
    pub fn observe(&mut self, sample: &PlaneSample) -> bool {
        if !self.active || self.planes.contains_key(&sample.id) {
            return false;
        }
        let Some(classified) = classify_sample(sample) else {
            return false;
        };
        self.planes.insert(sample.id, classified);
        true
    }

    /// Close the window and reduce to a result. None when no floor
    /// plane was observed; the session then falls back to the synthetic
    /// room.
    pub fn finish(&mut self) -> Option<RoomScanResult> {
        self.active = false;
        let floor = self
            .planes
            .values()
            .filter(|p| p.class.is_floor())
            .max_by(|a, b| a.footprint_area.total_cmp(&b.footprint_area))?
            .clone();

        // Highest floor candidate wins, never below the session origin.
        let floor_y = self
            .planes
            .values()
            .filter(|p| p.class.is_floor())
            .map(|p| p.avg_y)
            .fold(0.0, f32::max);

        let max_y = self
            .planes
            .values()
            .map(|p| p.world_box.max_y)
            .fold(f32::NEG_INFINITY, f32::max);
        let mut height = max_y - floor_y;
        if !height.is_finite() || height < room::MIN_HEIGHT {
            height = room::DEFAULT_HEIGHT;
        }
        let ceiling_y = floor_y + height.min(room::MAX_HEIGHT);

        let bounds = Aabb::from_points(&floor.world_polygon)?;
        let oriented = OrientedBox::from_plane(&floor.pose, &floor.local_polygon);
        let obstacles: Vec<BoxBounds> = self
            .planes
            .values()
            .filter(|p| p.class.is_obstacle())
            .map(|p| p.world_box)
            .collect();

        Some(RoomScanResult {
            width: bounds.width(),
            depth: bounds.depth(),
            center_x: bounds.center_x(),
            center_z: bounds.center_z(),
            bounds,
            floor_y,
            ceiling_y,
            oriented,
            floor_polygon: Some(floor.world_polygon),
            obstacles,
        })
    }

    /// Drop everything, window closed. Used on room reset.
    pub fn reset(&mut self) {
        self.planes.clear();
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(half_x: f32, half_z: f32) -> Vec<PolyPoint> {
        vec![
            PolyPoint::new(-half_x, -half_z),
            PolyPoint::new(half_x, -half_z),
            PolyPoint::new(half_x, half_z),
            PolyPoint::new(-half_x, half_z),
        ]
    }

    fn floor_sample(id: u64, half_x: f32, half_z: f32) -> PlaneSample {
        PlaneSample {
            id,
            orientation: PlaneOrientation::Horizontal,
            pose: Some(Pose::IDENTITY),
            polygon: rect(half_x, half_z),
        }
    }

    fn table_sample(id: u64, y: f32) -> PlaneSample {
        PlaneSample {
            id,
            orientation: PlaneOrientation::Horizontal,
            pose: Some(Pose::from_translation(1.0, y, 0.5)),
            polygon: rect(0.5, 0.4),
        }
    }

    fn open_aggregator() -> ScanAggregator {
        let mut agg = ScanAggregator::new();
        agg.begin();
        agg
    }

    // --- Sample validation ---

    #[test]
    fn test_rejects_degenerate_polygon() {
        let mut agg = open_aggregator();
        let mut sample = floor_sample(1, 2.0, 2.0);
        sample.polygon.truncate(2);
        assert!(!agg.observe(&sample));
        assert_eq!(agg.plane_count(), 0);
    }

    #[test]
    fn test_rejects_missing_pose() {
        let mut agg = open_aggregator();
        let mut sample = floor_sample(1, 2.0, 2.0);
        sample.pose = None;
        assert!(!agg.observe(&sample));
        assert_eq!(agg.plane_count(), 0);
    }

    #[test]
    fn test_rejects_when_window_closed() {
        let mut agg = ScanAggregator::new();
        assert!(!agg.observe(&floor_sample(1, 2.0, 2.0)));
    }

    #[test]
    fn test_replayed_plane_classified_once() {
        let mut agg = open_aggregator();
        let sample = floor_sample(7, 2.0, 2.0);
        assert!(agg.observe(&sample));
        assert!(!agg.observe(&sample));
        assert!(!agg.observe(&sample));
        assert_eq!(agg.plane_count(), 1);
    }

    // --- Classification through observe ---

    #[test]
    fn test_classifies_by_height() {
        let mut agg = open_aggregator();
        agg.observe(&floor_sample(1, 2.0, 2.0));
        agg.observe(&table_sample(2, 0.8));
        let mut wall = floor_sample(3, 1.0, 1.0);
        wall.orientation = PlaneOrientation::Vertical;
        agg.observe(&wall);

        assert_eq!(agg.count_of(SurfaceClass::Floor), 1);
        assert_eq!(agg.count_of(SurfaceClass::Table), 1);
        assert_eq!(agg.count_of(SurfaceClass::Wall), 1);
    }

    // --- Reduction ---

    #[test]
    fn test_finish_prefers_largest_floor() {
        let mut agg = open_aggregator();
        agg.observe(&floor_sample(1, 1.0, 1.0));
        agg.observe(&floor_sample(2, 3.0, 2.0));
        let result = agg.finish().expect("floor seen");

        assert!((result.width - 6.0).abs() < 0.001, "width={}", result.width);
        assert!((result.depth - 4.0).abs() < 0.001);
        assert!(result.floor_polygon.is_some());
        assert!(result.oriented.is_some());
        assert!(!agg.is_active());
    }

    #[test]
    fn test_finish_collects_obstacles_and_ceiling() {
        let mut agg = open_aggregator();
        agg.observe(&floor_sample(1, 3.0, 2.0));
        agg.observe(&table_sample(2, 0.8));
        let ceiling = PlaneSample {
            id: 3,
            orientation: PlaneOrientation::Horizontal,
            pose: Some(Pose::from_translation(0.0, 2.4, 0.0)),
            polygon: rect(3.0, 2.0),
        };
        agg.observe(&ceiling);
        let result = agg.finish().expect("floor seen");

        assert_eq!(result.obstacles.len(), 1);
        let table = &result.obstacles[0];
        assert!((table.max_y - 0.8).abs() < 0.001, "max_y={}", table.max_y);
        assert!((result.ceiling_y - 2.4).abs() < 0.001, "ceiling={}", result.ceiling_y);
        assert!(result.floor_y.abs() < 0.001);
    }

    #[test]
    fn test_finish_without_floor_is_none() {
        let mut agg = open_aggregator();
        agg.observe(&table_sample(1, 0.8));
        assert!(agg.finish().is_none());
    }

    #[test]
    fn test_short_room_gets_default_height() {
        // Nothing observed above the floor, so the raw height is zero
        let mut agg = open_aggregator();
        agg.observe(&floor_sample(1, 2.0, 2.0));
        let result = agg.finish().expect("floor seen");
        assert!(
            (result.ceiling_y - result.floor_y - room::DEFAULT_HEIGHT).abs() < 0.001,
            "ceiling={}",
            result.ceiling_y
        );
    }

    #[test]
    fn test_rotated_floor_keeps_oriented_frame() {
        let mut agg = open_aggregator();
        let yaw = std::f32::consts::FRAC_PI_6;
        let sample = PlaneSample {
            id: 1,
            orientation: PlaneOrientation::Horizontal,
            pose: Some(Pose::from_translation_rotation_y(1.0, 0.0, -2.0, yaw)),
            polygon: rect(2.0, 1.5),
        };
        agg.observe(&sample);
        let result = agg.finish().expect("floor seen");
        let bx = result.oriented.expect("oriented box");

        assert!((bx.half_width - 2.0).abs() < 0.001);
        assert!((bx.half_depth - 1.5).abs() < 0.001);
        assert!((bx.rotation_y - yaw).abs() < 0.001, "yaw={}", bx.rotation_y);
        // The rotated footprint spans a wider world rectangle
        assert!(result.width > 4.0);
    }

    #[test]
    fn test_begin_discards_previous_scan() {
        let mut agg = open_aggregator();
        agg.observe(&floor_sample(1, 2.0, 2.0));
        agg.begin();
        assert_eq!(agg.plane_count(), 0);
        // The same id is admissible again in the new window
        assert!(agg.observe(&floor_sample(1, 2.0, 2.0)));
    }

    // --- Synthetic fallback ---

    #[test]
    fn test_synthetic_room_dimensions() {
        let result = RoomScanResult::synthetic(&SessionConfig::default());
        assert!((result.bounds.min_x + 3.0).abs() < 0.001);
        assert!((result.bounds.max_x - 3.0).abs() < 0.001);
        assert!((result.bounds.min_z + 4.0).abs() < 0.001);
        assert!((result.bounds.max_z - 0.0).abs() < 0.001);
        assert!((result.ceiling_y - 2.5).abs() < 0.001);
        assert!(result.floor_polygon.is_none());
        assert!(result.oriented.is_none());
    }
}
