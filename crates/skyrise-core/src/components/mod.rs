//! Component definitions for the simulation.
//!
//! Components are pure data structs. People are hecs entities carrying
//! `Person`, `Position`, `Journey` and `Stress`; the building types are the
//! keys and tags shared by the registries.

mod building;
mod common;
mod people;

pub use building::*;
pub use common::*;
pub use people::*;
