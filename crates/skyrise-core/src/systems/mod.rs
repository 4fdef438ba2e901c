//! Systems - per-tick logic that operates on the world and registries

mod elevator;
mod passengers;
mod schedule;

pub use elevator::*;
pub use passengers::*;
pub use schedule::*;
