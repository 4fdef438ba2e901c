//! Passenger system - per-tick walking, queueing, stress and trip completion

use hecs::{Entity, World};

use crate::components::{
    Journey, Person, PersonState, Position, ShaftId, Stress, TenantKind, Trip, TripGoal,
};
use crate::config::PassengerConfig;
use crate::error::BuildError;
use crate::grid::FloorGrid;
use crate::shafts::{queue_slot_x, ShaftRegistry, WaitingQueues};
use crate::tenants::TenantRegistry;

/// Registries the passenger system reads and writes
pub struct PassengerContext<'a> {
    pub shafts: &'a mut ShaftRegistry,
    pub queues: &'a mut WaitingQueues,
    pub tenants: &'a TenantRegistry,
    pub grid: &'a FloorGrid,
    pub config: &'a PassengerConfig,
}

/// Something that happened to a person this tick. Applied by the engine
/// after the pass over people.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PassengerOutcome {
    /// Reached the end of a trip
    Arrived {
        entity: Entity,
        kind: TenantKind,
        goal: TripGoal,
        satisfaction: f32,
    },
    /// Stress hit the maximum while waiting
    GaveUp {
        entity: Entity,
        kind: TenantKind,
        floor: i32,
        goal: TripGoal,
    },
    /// An angry leaver walked off the building edge
    Gone { entity: Entity, kind: TenantKind },
}

/// Entities with a `Person`, in spawn order
pub fn people_in_order(world: &World) -> Vec<Entity> {
    let mut people: Vec<(u64, Entity)> = world
        .query::<&Person>()
        .iter()
        .map(|(entity, person)| (person.id, entity))
        .collect();
    people.sort_unstable_by_key(|(id, _)| *id);
    people.into_iter().map(|(_, entity)| entity).collect()
}

pub fn passenger_system(
    world: &mut World,
    ctx: &mut PassengerContext<'_>,
    delta_seconds: f32,
) -> Vec<PassengerOutcome> {
    let mut outcomes = Vec::new();
    for entity in people_in_order(world) {
        let Ok(mut query) =
            world.query_one::<(&Person, &mut Position, &mut Journey, &mut Stress)>(entity)
        else {
            continue;
        };
        let Some((person, pos, journey, stress)) = query.get() else {
            continue;
        };
        let outcome = step_person(entity, person, pos, journey, stress, ctx, delta_seconds);
        outcomes.extend(outcome);
    }
    outcomes
}

fn step_person(
    entity: Entity,
    person: &Person,
    pos: &mut Position,
    journey: &mut Journey,
    stress: &mut Stress,
    ctx: &mut PassengerContext<'_>,
    dt: f32,
) -> Option<PassengerOutcome> {
    let config = ctx.config;
    let step = config.walk_speed_px * dt;
    let exit_x = -config.exit_margin_px;

    match journey.state {
        PersonState::WalkingToElevator { shaft, slot_x } => {
            if pos.walk_toward(slot_x, step) {
                ctx.queues.enqueue(shaft, pos.floor, entity);
                journey.state = PersonState::Waiting { shaft };
                if let Some(s) = ctx.shafts.get_mut(shaft) {
                    s.dispatch_call(pos.floor);
                }
            }
            None
        }
        PersonState::Waiting { shaft } => {
            let multiplier = ctx.tenants.stress_multiplier(pos.floor, person.kind, config);
            stress.accrue(config.stress_rate * multiplier * dt, config.max_stress);
            if stress.is_exhausted(config.max_stress) {
                ctx.queues.remove(shaft, pos.floor, entity);
                journey.state = PersonState::Leaving;
                log::debug!(
                    "{} #{} gave up waiting on floor {}",
                    person.kind,
                    person.id,
                    pos.floor
                );
                return Some(PassengerOutcome::GaveUp {
                    entity,
                    kind: person.kind,
                    floor: pos.floor,
                    goal: journey.trip.goal,
                });
            }
            if let Some(index) = ctx.queues.position(shaft, pos.floor, entity) {
                let slot = queue_slot_x(shaft, index, ctx.grid.tile_px(), config.queue_spacing_px);
                pos.walk_toward(slot, step);
            }
            None
        }
        PersonState::Riding { car } => {
            if let Some(c) = ctx.shafts.car(car) {
                let offset = c
                    .passengers
                    .iter()
                    .position(|&e| e == entity)
                    .unwrap_or(0) as f32;
                pos.floor = c.floor;
                pos.y = c.y;
                pos.x = ctx.grid.tile_left_px(car.shaft.x)
                    + config.rider_spacing_px * (offset + 1.0);
            }
            None
        }
        PersonState::WalkingToDestination => {
            if pos.walk_toward(journey.trip.dest_x, step) {
                journey.state = PersonState::AtDestination;
                return Some(PassengerOutcome::Arrived {
                    entity,
                    kind: person.kind,
                    goal: journey.trip.goal,
                    satisfaction: stress.trip_satisfaction(config.max_stress),
                });
            }
            None
        }
        PersonState::WalkingToExit => {
            if pos.walk_toward(exit_x, step) {
                return Some(PassengerOutcome::Arrived {
                    entity,
                    kind: person.kind,
                    goal: TripGoal::Exit,
                    satisfaction: stress.trip_satisfaction(config.max_stress),
                });
            }
            None
        }
        PersonState::Leaving => {
            if pos.walk_toward(exit_x, step) {
                return Some(PassengerOutcome::Gone {
                    entity,
                    kind: person.kind,
                });
            }
            None
        }
        PersonState::AtDestination => None,
    }
}

/// People on `floor` still walking toward a slot at `shaft`
pub fn walkers_toward(world: &World, shaft: ShaftId, floor: i32) -> usize {
    world
        .query::<(&Position, &Journey)>()
        .iter()
        .filter(|(_, (pos, journey))| {
            pos.floor == floor
                && matches!(
                    journey.state,
                    PersonState::WalkingToElevator { shaft: s, .. } if s == shaft
                )
        })
        .count()
}

/// First state of a trip from `pos`. Same-floor trips walk directly;
/// otherwise the person heads for slot `next_slot(shaft)` at the best shaft.
pub fn plan_trip(
    pos: &Position,
    kind: TenantKind,
    trip: &Trip,
    shafts: &ShaftRegistry,
    next_slot: impl Fn(ShaftId) -> usize,
    grid: &FloorGrid,
    config: &PassengerConfig,
) -> Result<PersonState, BuildError> {
    if trip.dest_floor == pos.floor {
        return Ok(match trip.goal {
            TripGoal::Exit => PersonState::WalkingToExit,
            _ => PersonState::WalkingToDestination,
        });
    }
    let shaft = shafts
        .route(kind, pos.floor, pos.x, trip.dest_floor, trip.dest_x, grid.tile_px())
        .ok_or(BuildError::NoRoute {
            from: pos.floor,
            to: trip.dest_floor,
        })?;
    let slot_x = queue_slot_x(shaft, next_slot(shaft), grid.tile_px(), config.queue_spacing_px);
    Ok(PersonState::WalkingToElevator { shaft, slot_x })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ShaftKind, TenantId};
    use crate::config::GridConfig;
    use crate::shafts::Shaft;

    struct Fixture {
        world: World,
        shafts: ShaftRegistry,
        queues: WaitingQueues,
        tenants: TenantRegistry,
        grid: FloorGrid,
        config: PassengerConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let grid = FloorGrid::new(&GridConfig::default());
            let mut shaft = Shaft::new(ShaftId::new(ShaftKind::Passenger, 10), 0, 48.0, 0);
            shaft.max_floor = 4;
            let mut shafts = ShaftRegistry::new();
            shafts.insert(shaft);
            Self {
                world: World::new(),
                shafts,
                queues: WaitingQueues::new(),
                tenants: TenantRegistry::new(),
                grid,
                config: PassengerConfig::default(),
            }
        }

        fn step(&mut self, dt: f32) -> Vec<PassengerOutcome> {
            let mut ctx = PassengerContext {
                shafts: &mut self.shafts,
                queues: &mut self.queues,
                tenants: &self.tenants,
                grid: &self.grid,
                config: &self.config,
            };
            passenger_system(&mut self.world, &mut ctx, dt)
        }

        fn plan(&self, pos: &Position, trip: &Trip) -> Result<PersonState, BuildError> {
            let next_slot = |shaft| {
                self.queues.len(shaft, pos.floor) + walkers_toward(&self.world, shaft, pos.floor)
            };
            let (shafts, grid, config) = (&self.shafts, &self.grid, &self.config);
            plan_trip(pos, TenantKind::Office, trip, shafts, next_slot, grid, config)
        }

        fn spawn(
            &mut self,
            id: u64,
            floor: i32,
            x: f32,
            state: PersonState,
            goal: TripGoal,
        ) -> Entity {
            self.world.spawn((
                Person {
                    id,
                    kind: TenantKind::Office,
                    home: TenantId::new(3, 20),
                },
                Position::new(floor, x, floor as f32 * 48.0),
                Journey {
                    state,
                    trip: Trip {
                        dest_floor: 3,
                        dest_x: 330.0,
                        goal,
                    },
                },
                Stress::default(),
            ))
        }
    }

    fn stay() -> TripGoal {
        TripGoal::Stay {
            unit: TenantId::new(3, 20),
        }
    }

    fn shaft_id() -> ShaftId {
        ShaftId::new(ShaftKind::Passenger, 10)
    }

    #[test]
    fn test_reaching_slot_enqueues_and_calls() {
        let mut f = Fixture::new();
        let state = PersonState::WalkingToElevator {
            shaft: shaft_id(),
            slot_x: 154.0,
        };
        let p = f.spawn(0, 2, 150.0, state, stay());
        f.step(0.1);

        assert_eq!(
            f.world.get::<&Journey>(p).unwrap().state,
            PersonState::Waiting { shaft: shaft_id() }
        );
        assert_eq!(f.queues.position(shaft_id(), 2, p), Some(0));
        assert!(f.shafts.get(shaft_id()).unwrap().cars[0].has_hall_call(2));
    }

    #[test]
    fn test_waiting_accrues_and_gives_up() {
        let mut f = Fixture::new();
        let p = f.spawn(0, 3, 154.0, PersonState::Waiting { shaft: shaft_id() }, stay());
        f.queues.enqueue(shaft_id(), 3, p);

        assert!(f.step(10.0).is_empty());
        assert_eq!(f.world.get::<&Stress>(p).unwrap().value, 20.0);

        f.world.get::<&mut Stress>(p).unwrap().value = 99.9;
        let outcomes = f.step(1.0);
        assert_eq!(
            outcomes,
            vec![PassengerOutcome::GaveUp {
                entity: p,
                kind: TenantKind::Office,
                floor: 3,
                goal: stay(),
            }]
        );
        assert_eq!(f.world.get::<&Stress>(p).unwrap().value, 100.0);
        assert_eq!(f.world.get::<&Journey>(p).unwrap().state, PersonState::Leaving);
        assert_eq!(f.queues.len(shaft_id(), 3), 0);
    }

    #[test]
    fn test_queue_reflows_after_departure() {
        let mut f = Fixture::new();
        let a = f.spawn(0, 1, 154.0, PersonState::Waiting { shaft: shaft_id() }, stay());
        let b = f.spawn(1, 1, 148.0, PersonState::Waiting { shaft: shaft_id() }, stay());
        f.queues.enqueue(shaft_id(), 1, a);
        f.queues.enqueue(shaft_id(), 1, b);
        f.queues.remove(shaft_id(), 1, a);

        f.step(0.5);
        assert_eq!(f.world.get::<&Position>(b).unwrap().x, 154.0);
    }

    #[test]
    fn test_destination_arrival_records_satisfaction() {
        let mut f = Fixture::new();
        let p = f.spawn(0, 3, 320.0, PersonState::WalkingToDestination, stay());
        f.world.get::<&mut Stress>(p).unwrap().value = 25.0;

        let outcomes = f.step(1.0);
        assert_eq!(
            outcomes,
            vec![PassengerOutcome::Arrived {
                entity: p,
                kind: TenantKind::Office,
                goal: stay(),
                satisfaction: 0.75,
            }]
        );
        assert_eq!(
            f.world.get::<&Journey>(p).unwrap().state,
            PersonState::AtDestination
        );
        assert!(f.step(1.0).is_empty());
    }

    #[test]
    fn test_leaving_walks_off_left_edge() {
        let mut f = Fixture::new();
        let p = f.spawn(0, 0, 0.0, PersonState::Leaving, stay());
        assert!(f.step(0.5).is_empty());
        let outcomes = f.step(1.0);
        assert!(matches!(outcomes[..], [PassengerOutcome::Gone { entity, .. }] if entity == p));
    }

    #[test]
    fn test_same_floor_trip_skips_elevator() {
        let f = Fixture::new();
        let pos = Position::new(3, 0.0, 144.0);
        let trip = Trip {
            dest_floor: 3,
            dest_x: 100.0,
            goal: stay(),
        };
        let state = f.plan(&pos, &trip);
        assert_eq!(state, Ok(PersonState::WalkingToDestination));
    }

    #[test]
    fn test_trip_without_shaft_is_rejected() {
        let f = Fixture::new();
        let pos = Position::new(0, 0.0, 0.0);
        let trip = Trip {
            dest_floor: 7,
            dest_x: 100.0,
            goal: stay(),
        };
        let state = f.plan(&pos, &trip);
        assert_eq!(state, Err(BuildError::NoRoute { from: 0, to: 7 }));
    }

    #[test]
    fn test_trip_slot_follows_queue_length() {
        let mut f = Fixture::new();
        let other = f.spawn(0, 0, 154.0, PersonState::Waiting { shaft: shaft_id() }, stay());
        f.queues.enqueue(shaft_id(), 0, other);

        let pos = Position::new(0, 0.0, 0.0);
        let trip = Trip {
            dest_floor: 3,
            dest_x: 330.0,
            goal: stay(),
        };
        let state = f.plan(&pos, &trip);
        assert_eq!(
            state,
            Ok(PersonState::WalkingToElevator {
                shaft: shaft_id(),
                slot_x: 148.0,
            })
        );
    }

    #[test]
    fn test_trip_slot_counts_people_still_walking() {
        let mut f = Fixture::new();
        let queued = f.spawn(0, 0, 154.0, PersonState::Waiting { shaft: shaft_id() }, stay());
        f.queues.enqueue(shaft_id(), 0, queued);
        let walking = PersonState::WalkingToElevator {
            shaft: shaft_id(),
            slot_x: 148.0,
        };
        f.spawn(1, 0, 40.0, walking, stay());
        // walking to the same shaft from another floor does not take a slot here
        f.spawn(2, 1, 40.0, walking, stay());

        let pos = Position::new(0, 0.0, 0.0);
        let trip = Trip {
            dest_floor: 3,
            dest_x: 330.0,
            goal: stay(),
        };
        assert_eq!(
            f.plan(&pos, &trip),
            Ok(PersonState::WalkingToElevator {
                shaft: shaft_id(),
                slot_x: 142.0,
            })
        );
    }
}
