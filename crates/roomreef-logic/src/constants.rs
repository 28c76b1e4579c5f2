//! Tuning constants: classification bands, motion margins, spawn insets.
//!
//! Plain `f32` values in meters (and seconds where noted) with no engine
//! dependency. Both the core engine and the native simtest use these.

pub mod classify {
    /// Horizontal surfaces with average height below this are floor candidates.
    pub const FLOOR_MAX_Y: f32 = 0.3;
    /// Horizontal surfaces with average height above this are ceiling candidates.
    pub const CEILING_MIN_Y: f32 = 2.0;
    /// Table band: flat surfaces at desk/counter height.
    pub const TABLE_MIN_Y: f32 = 0.50;
    pub const TABLE_MAX_Y: f32 = 1.10;
    /// Minimum footprint (m²) for a surface to count as a table.
    pub const TABLE_MIN_AREA: f32 = 0.12;
    /// Maximum vertical relief for a surface to count as flat.
    pub const TABLE_MAX_RELIEF: f32 = 0.15;
    /// Low furniture (benches, stools) sits below the table band.
    pub const LOW_FURNITURE_MIN_Y: f32 = 0.25;
    /// Shelves sit above the table band, up to this height.
    pub const SHELF_MAX_Y: f32 = 1.40;
}

pub mod room {
    /// Assumed ceiling height when no ceiling plane was observed.
    pub const DEFAULT_HEIGHT: f32 = 2.5;
    /// Sanity clamp on detected room height, against sensor noise.
    pub const MIN_HEIGHT: f32 = 1.5;
    pub const MAX_HEIGHT: f32 = 5.0;
}

pub mod motion {
    /// Minimum allowed distance from an entity center to the boundary edge.
    pub const EDGE_SAFETY: f32 = 0.4;
    /// Clearance kept above the floor and below the ceiling.
    pub const VERTICAL_CLEARANCE: f32 = 0.2;
    /// An entity within this distance of its target picks a new one.
    pub const TARGET_REACHED: f32 = 0.4;
    /// Seconds of notional travel used to validate a proposed direction.
    pub const LOOKAHEAD_SECS: f32 = 1.0;
    /// Extra inset past a clamped face so the bounce does not re-trigger.
    pub const CLAMP_INSET: f32 = 0.05;
    /// Speed multiplier applied to a reflected velocity component.
    pub const BOUNCE_KICK: f32 = 1.1;
    /// Collision radius of a fish body against obstacle boxes.
    pub const FISH_RADIUS: f32 = 0.15;
}

pub mod spawn {
    /// Inset from lateral bounds when sampling spawn positions.
    pub const LATERAL_INSET: f32 = 0.3;
    /// Tolerance for the inverse-transform check on oriented samples.
    pub const ORIENTED_TOLERANCE: f32 = 0.25;
    /// Spawn band above the floor.
    pub const FLOOR_OFFSET: f32 = 0.3;
    /// Spawn band below the ceiling.
    pub const CEILING_OFFSET: f32 = 0.4;
}
