//! Build and demolish: the grid click entry point.
//!
//! Every handler validates the whole action first, then charges the
//! economy, then mutates. A rejected click leaves the tower untouched.

use serde::{Deserialize, Serialize};

use crate::components::{Feature, Person, ShaftId, ShaftKind, TenantId, TenantKind, Tile};
use crate::economy::Economy;
use crate::engine::TowerEngine;
use crate::error::{BuildError, GridError};
use crate::events::SimEvent;
use crate::shafts::{Shaft, SHAFT_WIDTH};
use crate::tenants::TenantUnit;

/// What a click on the grid does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildMode {
    /// Calls a car when clicking a shaft
    #[default]
    None,
    Floor,
    Elevator,
    ServiceElevator,
    Tenant(TenantKind),
    Demolish,
}

/// Result of an accepted click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickOutcome {
    Nothing,
    FloorBuilt { floor: i32 },
    ShaftBuilt { shaft: ShaftId },
    ShaftExtended { shaft: ShaftId, min_floor: i32, max_floor: i32 },
    CarAdded { shaft: ShaftId, index: usize },
    TenantBuilt { unit: TenantId, kind: TenantKind },
    Demolished { refund: i64 },
    CarCalled { shaft: ShaftId, car: Option<usize> },
}

impl<E: Economy> TowerEngine<E> {
    /// Apply a click at `(grid_x, floor)`. Rejections are logged and queued
    /// as `SimEvent::BuildRejected`.
    pub fn handle_grid_click(
        &mut self,
        grid_x: i32,
        floor: i32,
        mode: BuildMode,
    ) -> Result<ClickOutcome, BuildError> {
        let result = self.check_column(grid_x, floor, mode).and_then(|()| match mode {
            BuildMode::None => Ok(self.call_car(grid_x, floor)),
            BuildMode::Floor => self.build_floor(floor),
            BuildMode::Elevator => self.build_elevator(ShaftKind::Passenger, grid_x, floor),
            BuildMode::ServiceElevator => self.build_elevator(ShaftKind::Service, grid_x, floor),
            BuildMode::Tenant(kind) => self.build_tenant(kind, grid_x, floor),
            BuildMode::Demolish => self.demolish(grid_x, floor),
        });
        if let Err(err) = &result {
            log::warn!("{:?} at floor {} x={} rejected: {}", mode, floor, grid_x, err);
            self.events.push(SimEvent::BuildRejected {
                reason: err.to_string(),
            });
        }
        result
    }

    /// Clicks that place or remove something must land inside the grid
    fn check_column(&self, grid_x: i32, floor: i32, mode: BuildMode) -> Result<(), BuildError> {
        let width = match mode {
            BuildMode::None | BuildMode::Floor => return Ok(()),
            BuildMode::Elevator | BuildMode::ServiceElevator => SHAFT_WIDTH,
            BuildMode::Tenant(kind) => self.config.tenants.rule(kind).width,
            BuildMode::Demolish => 1,
        };
        if (0..self.grid.width()).contains(&grid_x) {
            return Ok(());
        }
        Err(BuildError::Grid(GridError::OutOfBounds {
            floor,
            start: grid_x,
            end: grid_x.saturating_add(width),
        }))
    }

    fn charge(&mut self, cost: i64) -> Result<(), BuildError> {
        if self.economy.spend_money(cost) {
            Ok(())
        } else {
            Err(BuildError::InsufficientFunds { cost })
        }
    }

    fn require(&self, feature: Feature) -> Result<(), BuildError> {
        if self.economy.is_feature_unlocked(feature) {
            Ok(())
        } else {
            Err(BuildError::FeatureLocked(feature))
        }
    }

    fn call_car(&mut self, grid_x: i32, floor: i32) -> ClickOutcome {
        let Some(id) = self.shafts.find_at(floor, grid_x).map(|s| s.id) else {
            return ClickOutcome::Nothing;
        };
        let car = self.shafts.get_mut(id).and_then(|s| s.dispatch_call(floor));
        ClickOutcome::CarCalled { shaft: id, car }
    }

    pub fn build_floor(&mut self, floor: i32) -> Result<ClickOutcome, BuildError> {
        self.grid.can_add_floor(floor, false)?;
        let cost = if floor < 0 {
            self.require(Feature::Basement)?;
            self.config.costs.basement_floor
        } else {
            self.config.costs.floor
        };
        self.charge(cost)?;
        self.grid.add_floor(floor, false)?;
        log::info!("floor {} built for {}", floor, cost);
        Ok(ClickOutcome::FloorBuilt { floor })
    }

    pub fn build_elevator(
        &mut self,
        kind: ShaftKind,
        grid_x: i32,
        floor: i32,
    ) -> Result<ClickOutcome, BuildError> {
        if kind == ShaftKind::Service {
            self.require(Feature::ServiceElevator)?;
        }
        let existing = self
            .shafts
            .find_covering(kind, grid_x)
            .map(|s| (s.id, s.serves(floor), s.cars.len(), s.min_floor, s.max_floor));

        match existing {
            Some((id, true, cars, _, _)) => {
                if cars >= self.config.elevator.max_cars_per_shaft {
                    return Err(BuildError::ShaftFull { x: id.x });
                }
                let cost = self.config.costs.car;
                self.charge(cost)?;
                let floor_height = self.grid.floor_height_px();
                let Some(shaft) = self.shafts.get_mut(id) else {
                    return Err(BuildError::ShaftFull { x: id.x });
                };
                let index = shaft.add_car(floor, floor_height);
                shaft.invested += cost;
                log::info!("car {} added to shaft x={} at floor {}", index, id.x, floor);
                Ok(ClickOutcome::CarAdded { shaft: id, index })
            }
            Some((id, false, _, min_floor, max_floor)) => {
                if !self.grid.has_floor(floor) {
                    return Err(GridError::NoSuchFloor(floor).into());
                }
                let added: Vec<i32> = if floor < min_floor {
                    (floor..min_floor).collect()
                } else {
                    (max_floor + 1..=floor).collect()
                };
                for &f in &added {
                    self.grid.can_occupy(f, id.x, SHAFT_WIDTH)?;
                }
                let cost = self.config.costs.extension_per_floor * added.len() as i64;
                self.charge(cost)?;
                for &f in &added {
                    self.grid.occupy_tiles(f, id.x, SHAFT_WIDTH, Tile::Shaft(kind))?;
                }
                let Some(shaft) = self.shafts.get_mut(id) else {
                    return Err(BuildError::ShaftInUse { x: id.x });
                };
                shaft.min_floor = shaft.min_floor.min(floor);
                shaft.max_floor = shaft.max_floor.max(floor);
                shaft.invested += cost;
                log::info!(
                    "shaft x={} extended to floors {}..={}",
                    id.x,
                    shaft.min_floor,
                    shaft.max_floor
                );
                Ok(ClickOutcome::ShaftExtended {
                    shaft: id,
                    min_floor: shaft.min_floor,
                    max_floor: shaft.max_floor,
                })
            }
            None => {
                if self.shafts.overlapping(grid_x).is_some() {
                    return Err(BuildError::ShaftOverlap { x: grid_x });
                }
                self.grid.can_occupy(floor, grid_x, SHAFT_WIDTH)?;
                let cost = match kind {
                    ShaftKind::Passenger => self.config.costs.shaft,
                    ShaftKind::Service => self.config.costs.service_shaft,
                };
                self.charge(cost)?;
                self.grid
                    .occupy_tiles(floor, grid_x, SHAFT_WIDTH, Tile::Shaft(kind))?;
                let id = ShaftId::new(kind, grid_x);
                self.shafts
                    .insert(Shaft::new(id, floor, self.grid.floor_height_px(), cost));
                log::info!("{:?} shaft built at x={} floor {}", kind, grid_x, floor);
                Ok(ClickOutcome::ShaftBuilt { shaft: id })
            }
        }
    }

    pub fn build_tenant(
        &mut self,
        kind: TenantKind,
        grid_x: i32,
        floor: i32,
    ) -> Result<ClickOutcome, BuildError> {
        let rule = self.config.tenants.rule(kind);
        let (width, cost, population, floors, unlock) =
            (rule.width, rule.cost, rule.build_population(), rule.floors, rule.unlock);

        if let Some(feature) = unlock {
            self.require(feature)?;
        }
        if !floors.allows(floor) {
            return Err(BuildError::FloorNotAllowed { kind, floor });
        }
        self.grid.can_occupy(floor, grid_x, width)?;
        self.charge(cost)?;
        self.grid
            .occupy_tiles(floor, grid_x, width, Tile::Tenant(kind))?;
        self.tenants
            .insert(TenantUnit::new(kind, floor, grid_x, width, self.clock.day()));
        if population != 0 {
            self.economy.change_population(population);
        }
        log::info!("{} built at floor {} x={}", kind, floor, grid_x);
        Ok(ClickOutcome::TenantBuilt {
            unit: TenantId::new(floor, grid_x),
            kind,
        })
    }

    /// Remove the tenant unit or shaft under the click and refund it
    pub fn demolish(&mut self, grid_x: i32, floor: i32) -> Result<ClickOutcome, BuildError> {
        if let Some(unit) = self.tenants.find_at(floor, grid_x).map(|u| u.id) {
            return self.demolish_unit(unit);
        }
        if let Some(id) = self.shafts.find_at(floor, grid_x).map(|s| s.id) {
            return self.demolish_shaft(id, floor);
        }
        Err(BuildError::NothingToDemolish { floor, x: grid_x })
    }

    fn demolish_unit(&mut self, id: TenantId) -> Result<ClickOutcome, BuildError> {
        let in_use = self.people_where(|p, j| {
            let references = p.home == id || j.trip.goal.unit() == Some(id);
            references && !j.resting_at(id)
        });
        if !in_use.is_empty() {
            return Err(BuildError::UnitInUse { floor: id.floor, x: id.x });
        }
        let Some(unit) = self.tenants.remove(id) else {
            return Err(BuildError::NoSuchUnit { floor: id.floor, x: id.x });
        };
        let rule = self.config.tenants.rule(unit.kind);
        let (refund, population) = (rule.refund, unit.current_population(rule));

        let evicted = self.people_where(|_, j| j.resting_at(id));
        for entity in evicted {
            let kind = self
                .world
                .get::<&Person>(entity)
                .map(|p| p.kind)
                .unwrap_or(unit.kind);
            self.despawn(entity, kind);
        }
        if population != 0 {
            self.economy.change_population(-population);
        }
        self.grid.clear_tiles(id.floor, id.x, unit.width);
        self.economy.earn_money(refund);
        log::info!("{} at floor {} x={} demolished, refund {}", unit.kind, id.floor, id.x, refund);
        Ok(ClickOutcome::Demolished { refund })
    }

    fn demolish_shaft(&mut self, id: ShaftId, floor: i32) -> Result<ClickOutcome, BuildError> {
        let users = self.people_where(|_, j| j.state.shaft() == Some(id));
        let busy = self
            .shafts
            .get(id)
            .is_some_and(|s| s.passenger_count() > 0);
        if !users.is_empty() || busy || self.queues.waiting_at(id) > 0 {
            return Err(BuildError::ShaftInUse { x: id.x });
        }
        let Some(shaft) = self.shafts.remove(id) else {
            return Err(BuildError::NothingToDemolish { floor, x: id.x });
        };
        for f in shaft.min_floor..=shaft.max_floor {
            self.grid.clear_tiles(f, id.x, SHAFT_WIDTH);
        }
        let refund = (shaft.invested as f64 * self.config.costs.refund_ratio).round() as i64;
        self.economy.earn_money(refund);
        log::info!("shaft x={} demolished, refund {}", id.x, refund);
        Ok(ClickOutcome::Demolished { refund })
    }
}
