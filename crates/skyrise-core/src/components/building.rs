//! Building components: tiles, tenant kinds, shaft and tenant identifiers.

use serde::{Deserialize, Serialize};

/// Types of tenant unit that can be placed on a floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TenantKind {
    Office,
    Apartment,
    Coworking,
    FoodCourt,
    Hotel,
    Condo,
    Daycare,
    Security,
    Housekeeping,
}

impl TenantKind {
    pub const ALL: [TenantKind; 9] = [
        TenantKind::Office,
        TenantKind::Apartment,
        TenantKind::Coworking,
        TenantKind::FoodCourt,
        TenantKind::Hotel,
        TenantKind::Condo,
        TenantKind::Daycare,
        TenantKind::Security,
        TenantKind::Housekeeping,
    ];

    /// Staff populations prefer the service shafts
    pub fn is_staff(&self) -> bool {
        matches!(self, TenantKind::Security | TenantKind::Housekeeping)
    }

    /// Shaft namespace this population routes on first
    pub fn preferred_shaft(&self) -> ShaftKind {
        if self.is_staff() {
            ShaftKind::Service
        } else {
            ShaftKind::Passenger
        }
    }

    /// Populations with children in daycare (see `stress_multiplier`)
    pub fn uses_childcare(&self) -> bool {
        matches!(
            self,
            TenantKind::Office | TenantKind::Coworking | TenantKind::Apartment | TenantKind::Condo
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            TenantKind::Office => "office",
            TenantKind::Apartment => "apartment",
            TenantKind::Coworking => "coworking",
            TenantKind::FoodCourt => "food court",
            TenantKind::Hotel => "hotel",
            TenantKind::Condo => "condo",
            TenantKind::Daycare => "daycare",
            TenantKind::Security => "security",
            TenantKind::Housekeeping => "housekeeping",
        }
    }
}

impl std::fmt::Display for TenantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The two elevator namespaces. Mechanics are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShaftKind {
    Passenger,
    Service,
}

impl ShaftKind {
    pub fn other(&self) -> ShaftKind {
        match self {
            ShaftKind::Passenger => ShaftKind::Service,
            ShaftKind::Service => ShaftKind::Passenger,
        }
    }
}

/// One grid cell of a floor row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Empty,
    Tenant(TenantKind),
    Shaft(ShaftKind),
}

impl Tile {
    pub fn is_empty(&self) -> bool {
        matches!(self, Tile::Empty)
    }
}

/// Shafts are identified by namespace and leftmost grid column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShaftId {
    pub kind: ShaftKind,
    pub x: i32,
}

impl ShaftId {
    pub fn new(kind: ShaftKind, x: i32) -> Self {
        Self { kind, x }
    }
}

/// A car, addressed by its owning shaft and index in that shaft
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CarRef {
    pub shaft: ShaftId,
    pub index: usize,
}

/// Tenant units are identified by floor and leftmost grid column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TenantId {
    pub floor: i32,
    pub x: i32,
}

impl TenantId {
    pub fn new(floor: i32, x: i32) -> Self {
        Self { floor, x }
    }
}

/// Progression-gated build features (checked through `Economy::is_feature_unlocked`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    Basement,
    ServiceElevator,
    FoodCourt,
    Hotel,
    Housekeeping,
    Security,
    Coworking,
    Condo,
    Daycare,
}

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Feature::Basement => "basement",
            Feature::ServiceElevator => "service_elevator",
            Feature::FoodCourt => "food_court",
            Feature::Hotel => "hotel",
            Feature::Housekeeping => "housekeeping",
            Feature::Security => "security",
            Feature::Coworking => "coworking",
            Feature::Condo => "condo",
            Feature::Daycare => "daycare",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_prefer_service_shafts() {
        assert_eq!(TenantKind::Housekeeping.preferred_shaft(), ShaftKind::Service);
        assert_eq!(TenantKind::Security.preferred_shaft(), ShaftKind::Service);
        assert_eq!(TenantKind::Office.preferred_shaft(), ShaftKind::Passenger);
    }

    #[test]
    fn test_shaft_ids_order_by_kind_then_x() {
        let a = ShaftId::new(ShaftKind::Passenger, 20);
        let b = ShaftId::new(ShaftKind::Service, 2);
        let c = ShaftId::new(ShaftKind::Passenger, 4);
        let mut ids = vec![a, b, c];
        ids.sort();
        assert_eq!(ids, vec![c, a, b]);
    }
}
