//! Skyrise Core - Tower Simulation Engine
//!
//! Discrete-time simulation of a vertical building: elevator dispatch,
//! passenger pathing and tenant schedules on a floor-by-tile grid.
//!
//! # Architecture
//!
//! People live in a `hecs` world; the building lives in typed registries:
//! - **Grid**: floors and tile occupancy (`grid`)
//! - **Tenants**: the data-driven tenant table and placed units (`tenants`)
//! - **Shafts**: shafts, cars, dispatch and waiting queues (`shafts`)
//! - **Systems**: per-tick logic for cars, people and schedules (`systems`)
//!
//! Money and progression stay outside; the engine talks to them through the
//! `Economy` trait.
//!
//! # Example
//!
//! ```rust,no_run
//! use skyrise_core::prelude::*;
//!
//! let mut engine = TowerEngine::new(SimConfig::default(), Ledger::new(500_000)).unwrap();
//! engine.handle_grid_click(0, 1, BuildMode::Floor).unwrap();
//! engine.handle_grid_click(10, 0, BuildMode::Elevator).unwrap();
//! engine.handle_grid_click(10, 1, BuildMode::Elevator).unwrap();
//! engine.handle_grid_click(2, 1, BuildMode::Tenant(TenantKind::Office)).unwrap();
//!
//! loop {
//!     engine.update(1.0 / 60.0);
//!     for event in engine.drain_events() {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

pub mod build;
pub mod clock;
pub mod components;
pub mod config;
pub mod economy;
pub mod engine;
pub mod error;
pub mod events;
pub mod grid;
pub mod satisfaction;
pub mod shafts;
pub mod systems;
pub mod tenants;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::build::{BuildMode, ClickOutcome};
    pub use crate::components::*;
    pub use crate::config::SimConfig;
    pub use crate::economy::{Economy, Ledger};
    pub use crate::engine::{PersonView, TowerEngine};
    pub use crate::error::{BuildError, ConfigError, GridError};
    pub use crate::events::SimEvent;
}
