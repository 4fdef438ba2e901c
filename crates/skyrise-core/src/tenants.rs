//! Tenant ruleset and the registry of placed tenant units.
//!
//! Every tenant kind is described by one `TenantRule` row; building and
//! demolishing go through a single routine parameterized by that row.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{Feature, TenantId, TenantKind};
use crate::config::PassengerConfig;
use crate::grid::LOBBY_FLOOR;

/// Which floors a tenant kind may be placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloorRule {
    AboveLobby,
    BelowLobby,
    /// Anywhere except the lobby
    NotLobby,
    /// Lobby and above
    NonBasement,
    Any,
}

impl FloorRule {
    pub fn allows(&self, floor: i32) -> bool {
        match self {
            FloorRule::AboveLobby => floor > LOBBY_FLOOR,
            FloorRule::BelowLobby => floor < LOBBY_FLOOR,
            FloorRule::NotLobby => floor != LOBBY_FLOOR,
            FloorRule::NonBasement => floor >= LOBBY_FLOOR,
            FloorRule::Any => true,
        }
    }
}

/// When a unit's population counts toward the building total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopulationTiming {
    /// As soon as the unit is built
    OnBuild,
    /// Only while a hotel room is occupied or once a condo is sold
    OnOccupancy,
}

/// One row of the tenant table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRule {
    pub kind: TenantKind,
    /// Tiles occupied
    pub width: i32,
    pub cost: i64,
    /// Returned on demolish
    pub refund: i64,
    /// Population delta reported to the economy
    pub population: i32,
    pub population_timing: PopulationTiming,
    /// People the unit sends into the building: workers, residents, guests,
    /// staff, or the daycare's child capacity
    pub occupants: u32,
    pub floors: FloorRule,
    pub unlock: Option<Feature>,
    /// Daily rent, read by the economy side
    pub rent: i64,
    /// Income per customer, stay, sale or child, depending on kind
    pub income: i64,
}

impl TenantRule {
    /// Built-in row for a kind
    pub fn default_for(kind: TenantKind) -> Self {
        use FloorRule::*;
        use PopulationTiming::*;
        let row = |width, cost: i64, population, timing, occupants, floors, unlock, rent, income| {
            TenantRule {
                kind,
                width,
                cost,
                refund: cost / 2,
                population,
                population_timing: timing,
                occupants,
                floors,
                unlock,
                rent,
                income,
            }
        };
        match kind {
            TenantKind::Office => row(4, 10_000, 6, OnBuild, 6, AboveLobby, None, 800, 0),
            TenantKind::Apartment => row(4, 8_000, 3, OnBuild, 3, AboveLobby, None, 600, 0),
            TenantKind::Coworking => row(
                6,
                15_000,
                8,
                OnBuild,
                8,
                AboveLobby,
                Some(Feature::Coworking),
                1_000,
                0,
            ),
            TenantKind::FoodCourt => {
                row(6, 12_000, 0, OnBuild, 0, Any, Some(Feature::FoodCourt), 300, 15)
            }
            TenantKind::Hotel => {
                row(3, 6_000, 2, OnOccupancy, 1, AboveLobby, Some(Feature::Hotel), 0, 400)
            }
            TenantKind::Condo => row(
                4,
                20_000,
                4,
                OnOccupancy,
                1,
                AboveLobby,
                Some(Feature::Condo),
                0,
                45_000,
            ),
            TenantKind::Daycare => {
                row(5, 9_000, 0, OnBuild, 10, NonBasement, Some(Feature::Daycare), 200, 50)
            }
            TenantKind::Security => {
                row(3, 5_000, 0, OnBuild, 2, Any, Some(Feature::Security), 0, 0)
            }
            TenantKind::Housekeeping => row(
                3,
                4_000,
                0,
                OnBuild,
                2,
                NotLobby,
                Some(Feature::Housekeeping),
                0,
                0,
            ),
        }
    }

    /// Population reported when the unit is placed
    pub fn build_population(&self) -> i32 {
        match self.population_timing {
            PopulationTiming::OnBuild => self.population,
            PopulationTiming::OnOccupancy => 0,
        }
    }
}

/// Data-driven table of tenant rules. Always holds a row for every kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<TenantRule>", into = "Vec<TenantRule>")]
pub struct TenantTable {
    rules: BTreeMap<TenantKind, TenantRule>,
}

impl TenantTable {
    pub fn rule(&self, kind: TenantKind) -> &TenantRule {
        &self.rules[&kind]
    }

    pub fn rules(&self) -> impl Iterator<Item = &TenantRule> {
        self.rules.values()
    }

    pub fn set(&mut self, rule: TenantRule) {
        self.rules.insert(rule.kind, rule);
    }
}

impl Default for TenantTable {
    fn default() -> Self {
        Vec::new().into()
    }
}

impl From<Vec<TenantRule>> for TenantTable {
    fn from(overrides: Vec<TenantRule>) -> Self {
        let mut rules: BTreeMap<TenantKind, TenantRule> = TenantKind::ALL
            .iter()
            .map(|&kind| (kind, TenantRule::default_for(kind)))
            .collect();
        for rule in overrides {
            rules.insert(rule.kind, rule);
        }
        Self { rules }
    }
}

impl From<TenantTable> for Vec<TenantRule> {
    fn from(table: TenantTable) -> Self {
        table.rules.into_values().collect()
    }
}

/// Hotel room state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelRoom {
    /// Reserved or occupied by a guest
    pub occupied: bool,
    pub needs_service: bool,
    pub last_serviced_day: i64,
    /// A housekeeper is on the way
    pub cleaner_assigned: bool,
}

impl HotelRoom {
    pub fn is_bookable(&self) -> bool {
        !self.occupied && !self.needs_service
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CondoState {
    ForSale,
    /// A buyer is on the way
    SalePending,
    /// Permanently occupied
    Sold,
}

/// Kind-specific unit state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitState {
    /// Offices, apartments, coworking, food courts, security, housekeeping
    Static,
    Hotel(HotelRoom),
    Condo(CondoState),
    Daycare { children: u32 },
}

impl UnitState {
    fn initial(kind: TenantKind, day: i64) -> Self {
        match kind {
            TenantKind::Hotel => UnitState::Hotel(HotelRoom {
                last_serviced_day: day,
                ..Default::default()
            }),
            TenantKind::Condo => UnitState::Condo(CondoState::ForSale),
            TenantKind::Daycare => UnitState::Daycare { children: 0 },
            _ => UnitState::Static,
        }
    }
}

/// A placed tenant unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantUnit {
    pub id: TenantId,
    pub kind: TenantKind,
    pub width: i32,
    pub state: UnitState,
}

impl TenantUnit {
    pub fn new(kind: TenantKind, floor: i32, x: i32, width: i32, day: i64) -> Self {
        Self {
            id: TenantId::new(floor, x),
            kind,
            width,
            state: UnitState::initial(kind, day),
        }
    }

    pub fn floor(&self) -> i32 {
        self.id.floor
    }

    pub fn covers(&self, floor: i32, x: i32) -> bool {
        floor == self.id.floor && x >= self.id.x && x - self.id.x < self.width
    }

    pub fn hotel(&self) -> Option<&HotelRoom> {
        match &self.state {
            UnitState::Hotel(room) => Some(room),
            _ => None,
        }
    }

    pub fn hotel_mut(&mut self) -> Option<&mut HotelRoom> {
        match &mut self.state {
            UnitState::Hotel(room) => Some(room),
            _ => None,
        }
    }

    /// Population this unit currently contributes
    pub fn current_population(&self, rule: &TenantRule) -> i32 {
        match (rule.population_timing, &self.state) {
            (PopulationTiming::OnBuild, _) => rule.population,
            (PopulationTiming::OnOccupancy, UnitState::Hotel(room)) if room.occupied => {
                rule.population
            }
            (PopulationTiming::OnOccupancy, UnitState::Condo(CondoState::Sold)) => {
                rule.population
            }
            _ => 0,
        }
    }
}

/// Read-only size of each tenant collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantCounts {
    pub by_kind: BTreeMap<TenantKind, usize>,
}

impl TenantCounts {
    pub fn get(&self, kind: TenantKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.by_kind.values().sum()
    }
}

/// All placed tenant units, iterated in `(floor, x)` order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantRegistry {
    units: BTreeMap<TenantId, TenantUnit>,
}

impl TenantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit: TenantUnit) {
        self.units.insert(unit.id, unit);
    }

    pub fn remove(&mut self, id: TenantId) -> Option<TenantUnit> {
        self.units.remove(&id)
    }

    pub fn get(&self, id: TenantId) -> Option<&TenantUnit> {
        self.units.get(&id)
    }

    pub fn get_mut(&mut self, id: TenantId) -> Option<&mut TenantUnit> {
        self.units.get_mut(&id)
    }

    /// Unit covering a tile, if any
    pub fn find_at(&self, floor: i32, x: i32) -> Option<&TenantUnit> {
        self.units
            .range(TenantId::new(floor, i32::MIN)..=TenantId::new(floor, x))
            .next_back()
            .map(|(_, unit)| unit)
            .filter(|unit| unit.covers(floor, x))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TenantUnit> {
        self.units.values()
    }

    pub fn units_of(&self, kind: TenantKind) -> impl Iterator<Item = &TenantUnit> {
        self.units.values().filter(move |u| u.kind == kind)
    }

    pub fn ids_of(&self, kind: TenantKind) -> Vec<TenantId> {
        self.units_of(kind).map(|u| u.id).collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn counts(&self) -> TenantCounts {
        let mut counts = TenantCounts::default();
        for unit in self.units.values() {
            *counts.by_kind.entry(unit.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Daycares currently looking after children
    pub fn childcare_active(&self) -> bool {
        self.units
            .values()
            .any(|u| matches!(u.state, UnitState::Daycare { children } if children > 0))
    }

    /// Accrual multiplier for a person of `kind` waiting on `floor`
    pub fn stress_multiplier(&self, floor: i32, kind: TenantKind, config: &PassengerConfig) -> f32 {
        let mut multiplier = 1.0;
        let security_nearby = self
            .units_of(TenantKind::Security)
            .any(|u| (u.floor() - floor).abs() <= config.security_radius);
        if security_nearby {
            multiplier *= config.security_multiplier;
        }
        if kind.uses_childcare() && self.childcare_active() {
            multiplier *= config.childcare_multiplier;
        }
        multiplier
    }
}
