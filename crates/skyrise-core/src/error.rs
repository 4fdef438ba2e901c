//! Error types. Every variant is a validation failure: the operation that
//! returned it left the simulation unchanged.

use crate::components::{Feature, TenantKind};
use thiserror::Error;

/// Floor and tile registry failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("floor {0} already exists")]
    FloorExists(i32),
    #[error("floor {0} is outside the buildable range")]
    OutOfRange(i32),
    #[error("floor {0} must be built next to an existing floor")]
    NotAdjacent(i32),
    #[error("floor {0} does not exist")]
    NoSuchFloor(i32),
    #[error("tiles {start}..{end} on floor {floor} are out of bounds")]
    OutOfBounds { floor: i32, start: i32, end: i32 },
    #[error("space occupied on floor {floor} at x={x}")]
    SpaceOccupied { floor: i32, x: i32 },
}

/// Build, demolish and spawn failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("insufficient funds: {cost} required")]
    InsufficientFunds { cost: i64 },
    #[error("feature not unlocked: {0}")]
    FeatureLocked(Feature),
    #[error("{kind} cannot be built on floor {floor}")]
    FloorNotAllowed { kind: TenantKind, floor: i32 },
    #[error("elevator shafts may not overlap (x={x})")]
    ShaftOverlap { x: i32 },
    #[error("shaft at x={x} already has the maximum number of cars")]
    ShaftFull { x: i32 },
    #[error("shaft at x={x} is in use")]
    ShaftInUse { x: i32 },
    #[error("unit at floor {floor}, x={x} is in use")]
    UnitInUse { floor: i32, x: i32 },
    #[error("nothing to demolish on floor {floor} at x={x}")]
    NothingToDemolish { floor: i32, x: i32 },
    #[error("no elevator connects floor {from} to floor {to}")]
    NoRoute { from: i32, to: i32 },
    #[error("no {0} unit available")]
    NoTenant(TenantKind),
    #[error("no unit at floor {floor}, x={x}")]
    NoSuchUnit { floor: i32, x: i32 },
    #[error("person no longer exists")]
    NoSuchPerson,
    #[error("person is {state} and cannot start a new trip")]
    PersonInTransit { state: &'static str },
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_error_converts() {
        let err: BuildError = GridError::NoSuchFloor(3).into();
        assert_eq!(err, BuildError::Grid(GridError::NoSuchFloor(3)));
        assert_eq!(err.to_string(), "floor 3 does not exist");
    }

    #[test]
    fn test_messages_name_the_feature() {
        let err = BuildError::FeatureLocked(Feature::Hotel);
        assert_eq!(err.to_string(), "feature not unlocked: hotel");
    }
}
