//! Systems - logic that operates on components each tick.

mod catching;
mod spawn;
mod swim;

pub use catching::*;
pub use spawn::*;
pub use swim::*;
