//! Schedule system - trigger trials per due game minute and their effects

use rand::Rng;

use crate::clock::{ScheduleAction, ScheduleRule};
use crate::components::{TenantId, TenantKind, TripGoal};
use crate::economy::Economy;
use crate::engine::TowerEngine;
use crate::error::BuildError;
use crate::events::SimEvent;
use crate::tenants::{CondoState, TenantRegistry, UnitState};

/// One independent trial per unit for every rule whose window contains
/// `hour`. Rules run in table order, units in id order.
pub fn draw_triggers<R: Rng>(
    rules: &[ScheduleRule],
    tenants: &TenantRegistry,
    hour: f32,
    rng: &mut R,
) -> Vec<(TenantId, ScheduleAction)> {
    let mut triggers = Vec::new();
    for rule in rules.iter().filter(|r| r.window.contains(hour)) {
        for unit in tenants.units_of(rule.kind) {
            if rng.gen::<f64>() < rule.probability {
                triggers.push((unit.id, rule.action));
            }
        }
    }
    triggers
}

impl<E: Economy> TowerEngine<E> {
    /// Process the current game minute once: day rollover, then triggers
    pub(crate) fn run_schedule(&mut self) {
        if self.clock.take_due_minute().is_none() {
            return;
        }
        let day = self.clock.day();
        if day > self.current_day {
            self.current_day = day;
            self.start_day(day);
        }
        let triggers = draw_triggers(
            &self.config.schedule,
            &self.tenants,
            self.clock.hour(),
            &mut self.rng,
        );
        for (unit, action) in triggers {
            self.apply_action(unit, action);
        }
    }

    fn start_day(&mut self, day: i64) {
        log::info!("day {} begins", day);
        self.events.push(SimEvent::DayStarted { day });
        let neglected = self
            .tenants
            .units_of(TenantKind::Hotel)
            .filter_map(|u| u.hotel())
            .filter(|room| room.needs_service && day - room.last_serviced_day > 1)
            .count();
        for _ in 0..neglected {
            self.file_hotel_complaint();
        }
    }

    /// Run one successful trial. Actions that cannot apply are skipped.
    pub(crate) fn apply_action(&mut self, unit: TenantId, action: ScheduleAction) {
        let Some(target) = self.tenants.get(unit) else {
            return;
        };
        let kind = target.kind;
        let state = target.state;
        let rule = self.config.tenants.rule(kind);
        let (occupants, population, income) = (rule.occupants, rule.population, rule.income);

        let result = match action {
            ScheduleAction::Arrive => {
                if self.residents_of(unit) < occupants as usize {
                    self.spawn_at_lobby(kind, unit).map(|_| ())
                } else {
                    Ok(())
                }
            }
            ScheduleAction::Depart => match self.first_resting(unit, unit) {
                Some(person) => {
                    let trip = self.exit_trip();
                    self.start_trip(person, trip)
                }
                None => Ok(()),
            },
            ScheduleAction::LunchOut => {
                let court = self.nearest_food_court(unit.floor);
                match (court, self.first_resting(unit, unit)) {
                    (Some(court), Some(person)) => {
                        let trip = self.stay_trip(court);
                        trip.and_then(|t| self.start_trip(person, t))
                    }
                    _ => Ok(()),
                }
            }
            ScheduleAction::LunchReturn => {
                let customer = self.people_where(|p, j| {
                    p.home == unit
                        && j.state.is_at_rest()
                        && j.trip.goal.unit().is_some_and(|u| {
                            let kind = self.tenants.get(u).map(|t| t.kind);
                            u != unit && kind == Some(TenantKind::FoodCourt)
                        })
                });
                match customer.first() {
                    Some(&person) => {
                        let trip = self.stay_trip(unit);
                        trip.and_then(|t| self.start_trip(person, t))
                    }
                    None => Ok(()),
                }
            }
            ScheduleAction::CheckIn => match state {
                UnitState::Hotel(room) if room.is_bookable() && self.residents_of(unit) == 0 => {
                    let spawned = self.spawn_at_lobby(kind, unit);
                    if spawned.is_ok() {
                        if let Some(room) = self.tenants.get_mut(unit).and_then(|u| u.hotel_mut()) {
                            room.occupied = true;
                        }
                        self.economy.change_population(population);
                    }
                    spawned.map(|_| ())
                }
                _ => Ok(()),
            },
            ScheduleAction::CheckOut => match (state, self.first_resting(unit, unit)) {
                (UnitState::Hotel(room), Some(guest)) if room.occupied => {
                    let trip = self.exit_trip();
                    let left = self.start_trip(guest, trip);
                    if left.is_ok() {
                        if let Some(room) = self.tenants.get_mut(unit).and_then(|u| u.hotel_mut()) {
                            room.occupied = false;
                            room.needs_service = true;
                        }
                        self.economy.earn_money(income);
                        self.economy.change_population(-population);
                    }
                    left
                }
                _ => Ok(()),
            },
            ScheduleAction::ShiftStart => {
                if self.residents_of(unit) >= occupants as usize {
                    Ok(())
                } else if kind == TenantKind::Housekeeping {
                    let x = self.grid.span_center_px(unit.x, target_width(&self.tenants, unit));
                    self.stay_trip(unit)
                        .and_then(|trip| self.spawn_at(kind, unit, unit.floor, x, trip))
                        .map(|_| ())
                } else {
                    self.spawn_at_lobby(kind, unit).map(|_| ())
                }
            }
            ScheduleAction::ServiceRooms => self.send_housekeeper(unit),
            ScheduleAction::ShiftEnd => {
                let staff = self.people_where(|p, j| p.home == unit && j.state.is_at_rest());
                match staff.first() {
                    Some(&person) if kind == TenantKind::Housekeeping => {
                        let trip = self.unit_trip(unit, TripGoal::ClockOut);
                        trip.and_then(|t| self.start_trip(person, t))
                    }
                    Some(&person) => {
                        let trip = self.exit_trip();
                        self.start_trip(person, trip)
                    }
                    None => Ok(()),
                }
            }
            ScheduleAction::DropOff => match state {
                UnitState::Daycare { children } if children < occupants && self.has_residents() => {
                    if let Some(t) = self.tenants.get_mut(unit) {
                        t.state = UnitState::Daycare {
                            children: children + 1,
                        };
                    }
                    self.economy.earn_money(income);
                    Ok(())
                }
                _ => Ok(()),
            },
            ScheduleAction::PickUp => match state {
                UnitState::Daycare { children } if children > 0 => {
                    if let Some(t) = self.tenants.get_mut(unit) {
                        t.state = UnitState::Daycare {
                            children: children - 1,
                        };
                    }
                    Ok(())
                }
                _ => Ok(()),
            },
            ScheduleAction::CondoSale => match state {
                UnitState::Condo(CondoState::ForSale) => {
                    let spawned = self.spawn_at_lobby(kind, unit);
                    if spawned.is_ok() {
                        if let Some(t) = self.tenants.get_mut(unit) {
                            t.state = UnitState::Condo(CondoState::SalePending);
                        }
                    }
                    spawned.map(|_| ())
                }
                _ => Ok(()),
            },
        };

        if let Err(err) = result {
            log::trace!("{:?} for {} at floor {} skipped: {}", action, kind, unit.floor, err);
        }
    }

    /// Send an idle housekeeper from `unit` to the first dirty unclaimed room
    fn send_housekeeper(&mut self, unit: TenantId) -> Result<(), BuildError> {
        let idle = self.people_where(|p, j| p.home == unit && j.state.is_at_rest());
        let Some(&person) = idle.first() else {
            return Ok(());
        };
        let room = self
            .tenants
            .units_of(TenantKind::Hotel)
            .find(|u| u.hotel().is_some_and(|r| r.needs_service && !r.cleaner_assigned))
            .map(|u| u.id);
        let Some(room) = room else {
            return Ok(());
        };
        let trip = self.unit_trip(room, TripGoal::Service { room })?;
        self.start_trip(person, trip)?;
        if let Some(state) = self.tenants.get_mut(room).and_then(|u| u.hotel_mut()) {
            state.cleaner_assigned = true;
        }
        Ok(())
    }

    /// People belonging to a unit, wherever they are
    fn residents_of(&self, unit: TenantId) -> usize {
        self.people_where(|p, _| p.home == unit).len()
    }

    /// First person from `home` resting at `at`
    fn first_resting(&self, home: TenantId, at: TenantId) -> Option<hecs::Entity> {
        self.people_where(|p, j| p.home == home && j.resting_at(at))
            .first()
            .copied()
    }

    /// Food court closest by floor, lowest id on ties
    fn nearest_food_court(&self, floor: i32) -> Option<TenantId> {
        self.tenants
            .units_of(TenantKind::FoodCourt)
            .min_by_key(|u| (u.floor() - floor).abs())
            .map(|u| u.id)
    }

    /// Families whose children a daycare can look after
    fn has_residents(&self) -> bool {
        self.tenants.units_of(TenantKind::Apartment).next().is_some()
            || self
                .tenants
                .units_of(TenantKind::Condo)
                .any(|u| u.state == UnitState::Condo(CondoState::Sold))
    }
}

fn target_width(tenants: &TenantRegistry, unit: TenantId) -> i32 {
    tenants.get(unit).map_or(1, |u| u.width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::tenants::TenantUnit;

    fn registry() -> TenantRegistry {
        let mut reg = TenantRegistry::new();
        reg.insert(TenantUnit::new(TenantKind::Office, 1, 0, 4, 0));
        reg.insert(TenantUnit::new(TenantKind::Office, 2, 0, 4, 0));
        reg.insert(TenantUnit::new(TenantKind::Hotel, 3, 0, 3, 0));
        reg
    }

    #[test]
    fn test_certain_rule_fires_once_per_unit() {
        let rules = vec![ScheduleRule::new(
            TenantKind::Office,
            8.0,
            9.0,
            1.0,
            ScheduleAction::Arrive,
        )];
        let mut rng = StdRng::seed_from_u64(1);
        let triggers = draw_triggers(&rules, &registry(), 8.5, &mut rng);
        assert_eq!(
            triggers,
            vec![
                (TenantId::new(1, 0), ScheduleAction::Arrive),
                (TenantId::new(2, 0), ScheduleAction::Arrive),
            ]
        );
    }

    #[test]
    fn test_closed_window_never_fires() {
        let rules = vec![ScheduleRule::new(
            TenantKind::Office,
            8.0,
            9.0,
            1.0,
            ScheduleAction::Arrive,
        )];
        let mut rng = StdRng::seed_from_u64(1);
        assert!(draw_triggers(&rules, &registry(), 9.0, &mut rng).is_empty());
    }

    #[test]
    fn test_zero_probability_never_fires() {
        let rules = vec![ScheduleRule::new(
            TenantKind::Hotel,
            0.0,
            24.0,
            0.0,
            ScheduleAction::CheckIn,
        )];
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert!(draw_triggers(&rules, &registry(), 12.0, &mut rng).is_empty());
        }
    }

    #[test]
    fn test_trials_are_seed_deterministic() {
        let rules = vec![ScheduleRule::new(
            TenantKind::Office,
            0.0,
            24.0,
            0.5,
            ScheduleAction::Depart,
        )];
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20)
                .flat_map(|_| draw_triggers(&rules, &registry(), 12.0, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(42), draw(42));
    }
}
