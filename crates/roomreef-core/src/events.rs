//! Typed events the session publishes for the host to drain.

use serde::Serialize;

use crate::components::Species;
use crate::round::CaughtFishRecord;
use crate::scan::RoomScanResult;

/// Session-level happenings. The host drains these once per frame and
/// reacts (spawning visuals, updating the HUD) without the simulation
/// knowing who listens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReefEvent {
    /// A scan window completed (or fell back) and the boundary is live.
    RoomScanned(RoomScanResult),
    /// The room was reset; boundary and population are gone.
    RoomReset,
    /// A fish was speared and scored.
    FishCaught(CaughtFishRecord),
    /// The target species rotated.
    TargetChanged(Species),
    /// No live fish remain.
    PopulationEmpty,
}

/// FIFO queue of pending events.
#[derive(Debug, Default)]
pub struct EventBus {
    pending: Vec<ReefEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, event: ReefEvent) {
        self.pending.push(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<ReefEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
