//! RoomReef Core - Room-Scale Fish Simulation Engine
//!
//! An ECS-based simulation of fish swimming inside a scanned physical
//! room: planes from the host's room scan become a boundary, a
//! population spawns inside it, and a spear pose can be tested against
//! the fish for scoring.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Fish
//! - **Components**: Pure data attached to entities (Position, Swim, Fish, etc.)
//! - **Systems**: Logic that queries and updates components
//!
//! The session engine wraps the world together with the scan
//! aggregator, boundary state, sim-clock timers, event bus and round
//! scoring.
//!
//! # Example
//!
//! ```rust,no_run
//! use roomreef_core::prelude::*;
//!
//! let mut session = RoomSession::new();
//!
//! // Feed the room scan
//! session.begin_scan();
//! // session.observe_plane(&sample) for each detected plane...
//! session.complete_scan();
//!
//! // Run simulation
//! loop {
//!     session.update(1.0 / 60.0); // 60 FPS
//!     for event in session.drain_events() {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod events;
pub mod persistence;
pub mod round;
pub mod scan;
pub mod state;
pub mod systems;
pub mod timers;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::SessionConfig;
    pub use crate::engine::RoomSession;
    pub use crate::events::ReefEvent;
    pub use crate::round::CaughtFishRecord;
    pub use crate::scan::PlaneSample;
}
