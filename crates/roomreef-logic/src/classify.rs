//! Plane classification: labeling detected surfaces by height and flatness.

use serde::{Deserialize, Serialize};

use crate::constants::classify;

/// Orientation reported by the plane-detection capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaneOrientation {
    Horizontal,
    Vertical,
}

/// What a detected plane was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceClass {
    Floor,
    Ceiling,
    Wall,
    /// Flat horizontal surface at desk/counter height with real footprint.
    Table,
    /// Horizontal surface below table height (benches, stools).
    LowFurniture,
    /// Horizontal surface above table height (shelves).
    Shelf,
    /// Mid-height horizontal surface matching no narrower bucket.
    Obstacle,
}

impl SurfaceClass {
    /// Obstacles are everything fish must swim around.
    pub fn is_obstacle(&self) -> bool {
        matches!(
            self,
            SurfaceClass::Table | SurfaceClass::LowFurniture | SurfaceClass::Shelf | SurfaceClass::Obstacle
        )
    }

    pub fn is_floor(&self) -> bool {
        matches!(self, SurfaceClass::Floor)
    }
}

/// Classify one detected plane from its orientation, the average world Y of
/// its vertices, its horizontal footprint area, and its vertical relief
/// (max Y minus min Y across vertices).
pub fn classify_surface(
    orientation: PlaneOrientation,
    avg_y: f32,
    footprint_area: f32,
    relief: f32,
) -> SurfaceClass {
    match orientation {
        PlaneOrientation::Vertical => SurfaceClass::Wall,
        PlaneOrientation::Horizontal => {
            if avg_y < classify::FLOOR_MAX_Y {
                SurfaceClass::Floor
            } else if avg_y > classify::CEILING_MIN_Y {
                SurfaceClass::Ceiling
            } else if (classify::TABLE_MIN_Y..=classify::TABLE_MAX_Y).contains(&avg_y)
                && footprint_area >= classify::TABLE_MIN_AREA
                && relief < classify::TABLE_MAX_RELIEF
            {
                SurfaceClass::Table
            } else if avg_y >= classify::LOW_FURNITURE_MIN_Y && avg_y < classify::TABLE_MIN_Y {
                SurfaceClass::LowFurniture
            } else if avg_y > classify::TABLE_MAX_Y && avg_y <= classify::SHELF_MAX_Y {
                SurfaceClass::Shelf
            } else {
                SurfaceClass::Obstacle
            }
        }
    }
}
