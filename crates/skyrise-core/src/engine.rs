//! Simulation engine - main entry point for running the tower

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::GameClock;
use crate::components::*;
use crate::config::SimConfig;
use crate::economy::Economy;
use crate::error::{BuildError, ConfigError};
use crate::events::SimEvent;
use crate::grid::{FloorGrid, LOBBY_FLOOR};
use crate::satisfaction::SatisfactionTracker;
use crate::shafts::{ShaftRegistry, WaitingQueues};
use crate::systems::*;
use crate::tenants::{CondoState, TenantCounts, TenantRegistry, UnitState};

/// Fixed ticks run by one `update` call at most; the remainder is dropped
const MAX_TICKS_PER_UPDATE: u32 = 1024;

/// Snapshot of one person for observers
#[derive(Debug, Clone, Copy)]
pub struct PersonView {
    pub entity: Entity,
    pub person: Person,
    pub position: Position,
    pub journey: Journey,
    pub stress: f32,
    pub level: StressLevel,
}

/// Main simulation engine
pub struct TowerEngine<E: Economy> {
    /// ECS world holding every person
    pub world: World,
    pub(crate) config: SimConfig,
    pub(crate) grid: FloorGrid,
    pub(crate) tenants: TenantRegistry,
    pub(crate) shafts: ShaftRegistry,
    pub(crate) queues: WaitingQueues,
    pub(crate) clock: GameClock,
    pub(crate) satisfaction: SatisfactionTracker,
    pub(crate) economy: E,
    pub(crate) rng: StdRng,
    pub(crate) events: Vec<SimEvent>,
    pub(crate) current_day: i64,
    next_person_id: u64,
    hotel_complaints: u32,
    angry_departures: u64,

    // Update timing
    accumulator: f32,
    time_scale: f32,
}

impl<E: Economy> TowerEngine<E> {
    /// Create an engine with only the lobby built
    pub fn new(config: SimConfig, economy: E) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut grid = FloorGrid::new(&config.grid);
        grid.add_floor(LOBBY_FLOOR, true).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let clock = GameClock::new(&config.clock);
        let current_day = clock.day();
        log::info!(
            "tower engine ready: {}x{} grid, seed {:#x}",
            config.grid.width,
            config.grid.max_floor + config.grid.basement_floors + 1,
            config.seed
        );
        Ok(Self {
            world: World::new(),
            rng: StdRng::seed_from_u64(config.seed),
            grid,
            tenants: TenantRegistry::new(),
            shafts: ShaftRegistry::new(),
            queues: WaitingQueues::new(),
            clock,
            satisfaction: SatisfactionTracker::new(),
            economy,
            events: Vec::new(),
            current_day,
            next_person_id: 0,
            hotel_complaints: 0,
            angry_departures: 0,
            accumulator: 0.0,
            time_scale: 1.0,
            config,
        })
    }

    /// Advance by real seconds, in fixed ticks
    pub fn update(&mut self, delta_seconds: f32) {
        self.accumulator += delta_seconds.max(0.0) * self.time_scale;
        let step = self.config.clock.tick_seconds;
        let mut ticks = 0;
        while self.accumulator >= step {
            if ticks == MAX_TICKS_PER_UPDATE {
                log::debug!("update fell behind, dropping {:.2}s", self.accumulator);
                self.accumulator = 0.0;
                break;
            }
            self.tick();
            self.accumulator -= step;
            ticks += 1;
        }
    }

    /// One fixed step: cars, then people, then schedule triggers
    pub fn tick(&mut self) {
        let dt = self.config.clock.tick_seconds;

        elevator_system(
            &mut self.world,
            &mut self.shafts,
            &mut self.queues,
            &self.grid,
            &self.config.elevator,
            dt,
        );

        let outcomes = {
            let mut ctx = PassengerContext {
                shafts: &mut self.shafts,
                queues: &mut self.queues,
                tenants: &self.tenants,
                grid: &self.grid,
                config: &self.config.passenger,
            };
            passenger_system(&mut self.world, &mut ctx, dt)
        };
        for outcome in outcomes {
            self.apply_outcome(outcome);
        }

        self.clock.advance(dt);
        self.run_schedule();
    }

    fn apply_outcome(&mut self, outcome: PassengerOutcome) {
        match outcome {
            PassengerOutcome::Arrived {
                entity,
                kind,
                goal,
                satisfaction,
            } => {
                self.record_trip(satisfaction);
                self.events.push(SimEvent::TripCompleted { kind, satisfaction });
                self.complete_goal(entity, kind, goal);
            }
            PassengerOutcome::GaveUp {
                entity: _,
                kind,
                floor,
                goal,
            } => {
                self.angry_departures += 1;
                self.roll_back_goal(kind, goal);
                self.record_trip(0.0);
                self.events.push(SimEvent::AngryDeparture { kind, floor });
            }
            PassengerOutcome::Gone { entity, kind } => self.despawn(entity, kind),
        }
    }

    /// Arrival effects of a finished trip
    fn complete_goal(&mut self, entity: Entity, kind: TenantKind, goal: TripGoal) {
        match goal {
            TripGoal::Exit | TripGoal::ClockOut => self.despawn(entity, kind),
            TripGoal::Stay { unit } => {
                let day = self.clock.day();
                let Some(target) = self.tenants.get_mut(unit) else {
                    return;
                };
                let rule = self.config.tenants.rule(target.kind);
                let state = target.state;
                match state {
                    _ if target.kind == TenantKind::FoodCourt => {
                        self.economy.earn_money(rule.income);
                    }
                    UnitState::Condo(CondoState::SalePending) => {
                        target.state = UnitState::Condo(CondoState::Sold);
                        self.economy.earn_money(rule.income);
                        self.economy.change_population(rule.population);
                        log::info!("condo at floor {} x={} sold (day {})", unit.floor, unit.x, day);
                    }
                    _ => {}
                }
            }
            TripGoal::Service { room } => {
                let day = self.clock.day();
                if let Some(state) = self.tenants.get_mut(room).and_then(|u| u.hotel_mut()) {
                    state.needs_service = false;
                    state.cleaner_assigned = false;
                    state.last_serviced_day = day;
                }
            }
        }
    }

    /// Undo what a trip reserved when its traveller gives up
    fn roll_back_goal(&mut self, kind: TenantKind, goal: TripGoal) {
        match (kind, goal) {
            (TenantKind::Hotel, TripGoal::Stay { unit }) => {
                let population = self.config.tenants.rule(TenantKind::Hotel).population;
                if let Some(room) = self.tenants.get_mut(unit).and_then(|u| u.hotel_mut()) {
                    if room.occupied {
                        room.occupied = false;
                        self.economy.change_population(-population);
                    }
                }
                self.file_hotel_complaint();
            }
            (TenantKind::Condo, TripGoal::Stay { unit }) => {
                if let Some(target) = self.tenants.get_mut(unit) {
                    if target.state == UnitState::Condo(CondoState::SalePending) {
                        target.state = UnitState::Condo(CondoState::ForSale);
                    }
                }
            }
            (_, TripGoal::Service { room }) => {
                if let Some(state) = self.tenants.get_mut(room).and_then(|u| u.hotel_mut()) {
                    state.cleaner_assigned = false;
                }
            }
            _ => {}
        }
    }

    pub(crate) fn file_hotel_complaint(&mut self) {
        self.hotel_complaints += 1;
        self.events.push(SimEvent::HotelComplaint);
    }

    fn record_trip(&mut self, sample: f32) {
        self.satisfaction.record(sample);
        self.events
            .push(SimEvent::SatisfactionChanged(self.satisfaction.mean()));
    }

    pub(crate) fn despawn(&mut self, entity: Entity, kind: TenantKind) {
        if self.world.despawn(entity).is_ok() {
            self.events.push(SimEvent::PersonRemoved { kind });
        }
    }

    // ── People ──────────────────────────────────────────────

    /// Spawn a person at `(floor, x)` who immediately begins `trip`.
    /// Nothing is spawned when no shaft connects the floors.
    pub(crate) fn spawn_at(
        &mut self,
        kind: TenantKind,
        home: TenantId,
        floor: i32,
        x: f32,
        trip: Trip,
    ) -> Result<Entity, BuildError> {
        let position = Position::new(floor, x, self.grid.floor_y(floor));
        let state = self.plan(&position, kind, &trip)?;
        let person = Person {
            id: self.next_person_id,
            kind,
            home,
        };
        self.next_person_id += 1;
        let entity = self
            .world
            .spawn((person, position, Journey { state, trip }, Stress::default()));
        self.events.push(SimEvent::PersonSpawned { kind });
        log::trace!("spawned {} #{} on floor {}", kind, person.id, floor);
        Ok(entity)
    }

    /// Spawn a person at the lobby entrance heading for the unit
    pub(crate) fn spawn_at_lobby(
        &mut self,
        kind: TenantKind,
        home: TenantId,
    ) -> Result<Entity, BuildError> {
        let trip = self.stay_trip(home)?;
        self.spawn_at(kind, home, LOBBY_FLOOR, 0.0, trip)
    }

    /// Debug entry point: spawn someone headed for the first unit of `kind`
    pub fn spawn_person(&mut self, kind: TenantKind) -> Result<Entity, BuildError> {
        let home = self
            .tenants
            .units_of(kind)
            .next()
            .map(|u| u.id)
            .ok_or(BuildError::NoTenant(kind))?;
        self.spawn_at_lobby(kind, home)
    }

    /// First state of `trip` from `position`, queueing behind everyone
    /// already waiting at or walking to the chosen shaft on that floor
    fn plan(
        &self,
        position: &Position,
        kind: TenantKind,
        trip: &Trip,
    ) -> Result<PersonState, BuildError> {
        let floor = position.floor;
        let next_slot =
            |shaft| self.queues.len(shaft, floor) + walkers_toward(&self.world, shaft, floor);
        plan_trip(
            position,
            kind,
            trip,
            &self.shafts,
            next_slot,
            &self.grid,
            &self.config.passenger,
        )
    }

    /// Give a person at rest a new trip from where they stand. Resets stress.
    /// People walking, queued or riding keep their current trip.
    pub fn start_trip(&mut self, entity: Entity, trip: Trip) -> Result<(), BuildError> {
        let (position, kind, state) = {
            let mut query = self
                .world
                .query_one::<(&Position, &Person, &Journey)>(entity)
                .map_err(|_| BuildError::NoSuchPerson)?;
            let (pos, person, journey) = query.get().ok_or(BuildError::NoSuchPerson)?;
            (*pos, person.kind, journey.state)
        };
        if !state.is_at_rest() {
            return Err(BuildError::PersonInTransit { state: state.name() });
        }
        let state = self.plan(&position, kind, &trip)?;
        if let Ok(mut journey) = self.world.get::<&mut Journey>(entity) {
            *journey = Journey { state, trip };
        }
        if let Ok(mut stress) = self.world.get::<&mut Stress>(entity) {
            stress.reset();
        }
        Ok(())
    }

    /// Trip ending inside a unit
    pub(crate) fn stay_trip(&self, unit: TenantId) -> Result<Trip, BuildError> {
        self.unit_trip(unit, TripGoal::Stay { unit })
    }

    pub(crate) fn unit_trip(&self, unit: TenantId, goal: TripGoal) -> Result<Trip, BuildError> {
        let target = self
            .tenants
            .get(unit)
            .ok_or(BuildError::NoSuchUnit {
                floor: unit.floor,
                x: unit.x,
            })?;
        Ok(Trip {
            dest_floor: unit.floor,
            dest_x: self.grid.span_center_px(unit.x, target.width),
            goal,
        })
    }

    /// Trip out of the building through the lobby
    pub(crate) fn exit_trip(&self) -> Trip {
        Trip {
            dest_floor: LOBBY_FLOOR,
            dest_x: -self.config.passenger.exit_margin_px,
            goal: TripGoal::Exit,
        }
    }

    /// People matching a predicate, in spawn order
    pub(crate) fn people_where(
        &self,
        mut keep: impl FnMut(&Person, &Journey) -> bool,
    ) -> Vec<Entity> {
        let mut found: Vec<(u64, Entity)> = self
            .world
            .query::<(&Person, &Journey)>()
            .iter()
            .filter(|(_, (person, journey))| keep(person, journey))
            .map(|(entity, (person, _))| (person.id, entity))
            .collect();
        found.sort_unstable_by_key(|(id, _)| *id);
        found.into_iter().map(|(_, entity)| entity).collect()
    }

    /// Snapshot of everyone, in spawn order
    pub fn people(&self) -> Vec<PersonView> {
        let max = self.config.passenger.max_stress;
        let mut views: Vec<PersonView> = self
            .world
            .query::<(&Person, &Position, &Journey, &Stress)>()
            .iter()
            .map(|(entity, (person, position, journey, stress))| PersonView {
                entity,
                person: *person,
                position: *position,
                journey: *journey,
                stress: stress.value,
                level: StressLevel::from_ratio(stress.ratio(max)),
            })
            .collect();
        views.sort_unstable_by_key(|v| v.person.id);
        views
    }

    pub fn person_count(&self) -> usize {
        self.world.len() as usize
    }

    // ── Readouts ────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &FloorGrid {
        &self.grid
    }

    pub fn tenants(&self) -> &TenantRegistry {
        &self.tenants
    }

    pub fn shafts(&self) -> &ShaftRegistry {
        &self.shafts
    }

    pub fn queues(&self) -> &WaitingQueues {
        &self.queues
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn economy(&self) -> &E {
        &self.economy
    }

    pub fn economy_mut(&mut self) -> &mut E {
        &mut self.economy
    }

    pub fn day(&self) -> i64 {
        self.clock.day()
    }

    pub fn hour(&self) -> f32 {
        self.clock.hour()
    }

    /// Building-wide mean trip satisfaction
    pub fn satisfaction(&self) -> f32 {
        self.satisfaction.mean()
    }

    pub fn trips_completed(&self) -> u64 {
        self.satisfaction.trips()
    }

    pub fn tenant_counts(&self) -> TenantCounts {
        self.tenants.counts()
    }

    pub fn hotel_complaints(&self) -> u32 {
        self.hotel_complaints
    }

    pub fn reset_hotel_complaints(&mut self) {
        self.hotel_complaints = 0;
    }

    pub fn angry_departures(&self) -> u64 {
        self.angry_departures
    }

    /// Take every event queued since the last call
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.clamp(0.0, 100.0);
    }
}
