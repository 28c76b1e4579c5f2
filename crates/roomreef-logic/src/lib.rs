//! Pure boundary and motion logic for RoomReef.
//!
//! This crate contains all room-boundary math that is independent of any
//! engine, clock, or randomness source. Functions take plain data and
//! return results, making them unit-testable and portable between the
//! native engine, the headless simtest harness, and any future host.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`boundary`] | Boundary sum type, constrain/recover dispatch, obstacle boxes |
//! | [`classify`] | Plane orientation/surface enums and height-band classification |
//! | [`constants`] | Classification thresholds, motion margins, spawn insets |
//! | [`polygon`] | Point-in-polygon, edge distance, inward normals, reflection |
//! | [`transform`] | Column-major 4x4 rigid poses with cheap inverses |

pub mod boundary;
pub mod classify;
pub mod constants;
pub mod polygon;
pub mod transform;
