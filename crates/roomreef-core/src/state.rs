//! Boundary state - the single source of truth motion reads every tick.

use roomreef_logic::boundary::{Aabb, Boundary, BoxBounds, OrientedBox};
use roomreef_logic::constants::room;
use roomreef_logic::polygon::PolyPoint;
use serde::{Deserialize, Serialize};

use crate::scan::RoomScanResult;

/// Current room boundary.
///
/// Written only by the session's scan-completion and reset paths, and
/// replaced wholesale by [`BoundaryState::apply`], so the systems that
/// read it never observe half of a scan. Until the first apply, every
/// boundary query reports unavailable and motion stays frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryState {
    scanned: bool,
    floor_y: f32,
    ceiling_y: f32,
    bounds: Aabb,
    oriented: Option<OrientedBox>,
    floor_polygon: Option<Vec<PolyPoint>>,
    obstacles: Vec<BoxBounds>,
}

impl Default for BoundaryState {
    fn default() -> Self {
        Self {
            scanned: false,
            floor_y: 0.0,
            ceiling_y: room::DEFAULT_HEIGHT,
            bounds: Aabb::new(0.0, 0.0, 0.0, 0.0),
            oriented: None,
            floor_polygon: None,
            obstacles: Vec::new(),
        }
    }
}

impl BoundaryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scanned(&self) -> bool {
        self.scanned
    }

    pub fn floor_y(&self) -> f32 {
        self.floor_y
    }

    pub fn ceiling_y(&self) -> f32 {
        self.ceiling_y
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn oriented(&self) -> Option<&OrientedBox> {
        self.oriented.as_ref()
    }

    pub fn floor_polygon(&self) -> Option<&[PolyPoint]> {
        self.floor_polygon.as_deref()
    }

    pub fn obstacles(&self) -> &[BoxBounds] {
        &self.obstacles
    }

    /// Replace the whole boundary with a completed scan.
    pub fn apply(&mut self, result: &RoomScanResult) {
        self.scanned = true;
        self.floor_y = result.floor_y;
        self.ceiling_y = result.ceiling_y;
        self.bounds = result.bounds;
        self.oriented = result.oriented;
        self.floor_polygon = result.floor_polygon.clone();
        self.obstacles = result.obstacles.clone();
    }

    /// Drop back to unscanned. Motion freezes until the next apply.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The boundary view systems dispatch over, tightest representation
    /// first: exact polygon, then oriented box, then axis-aligned box.
    pub fn boundary(&self) -> Boundary<'_> {
        if !self.scanned {
            return Boundary::None;
        }
        if let Some(poly) = &self.floor_polygon {
            return Boundary::Polygon(poly);
        }
        if let Some(bx) = &self.oriented {
            return Boundary::Oriented(bx);
        }
        Boundary::AxisAligned(&self.bounds)
    }

    /// Vertical band entities may occupy, `clearance` in from each face.
    pub fn vertical_range(&self, clearance: f32) -> (f32, f32) {
        (self.floor_y + clearance, self.ceiling_y - clearance)
    }
}
