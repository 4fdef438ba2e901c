//! Elevator system - car motion, arrival handling and idle look-for-work

use hecs::{Entity, World};

use crate::components::{CarRef, Journey, PersonState, Position, TripGoal};
use crate::config::ElevatorConfig;
use crate::grid::FloorGrid;
use crate::shafts::{Shaft, ShaftRegistry, WaitingQueues};

/// Advance every car by one tick. Shafts run in id order, cars by index.
pub fn elevator_system(
    world: &mut World,
    shafts: &mut ShaftRegistry,
    queues: &mut WaitingQueues,
    grid: &FloorGrid,
    config: &ElevatorConfig,
    delta_seconds: f32,
) {
    for shaft in shafts.iter_mut() {
        look_for_work(shaft, queues);

        for index in 0..shaft.cars.len() {
            let arrived = shaft.cars[index].advance(
                delta_seconds,
                config.car_speed_px,
                grid.floor_height_px(),
            );
            if arrived {
                handle_arrival(world, shaft, index, queues, grid, config.capacity);
            }
        }
    }
}

/// Dispatch every floor with people waiting that no car has committed to
pub fn look_for_work(shaft: &mut Shaft, queues: &WaitingQueues) {
    for floor in queues.floors_waiting(shaft.id) {
        if !shaft.has_stop_anywhere(floor) {
            shaft.dispatch_call(floor);
        }
    }
}

/// Car `index` has stopped at its target: let riders off, board the queue
/// in FIFO order up to capacity, then choose the next stop.
pub fn handle_arrival(
    world: &mut World,
    shaft: &mut Shaft,
    index: usize,
    queues: &mut WaitingQueues,
    grid: &FloorGrid,
    capacity: usize,
) {
    let id = shaft.id;
    let car = &mut shaft.cars[index];
    let floor = car.floor;
    let floor_y = grid.floor_y(floor);

    let riders = std::mem::take(&mut car.passengers);
    let mut staying: Vec<Entity> = Vec::with_capacity(riders.len());
    for rider in riders {
        let Ok(mut journey) = world.get::<&mut Journey>(rider) else {
            continue;
        };
        if journey.trip.dest_floor == floor {
            journey.state = match journey.trip.goal {
                TripGoal::Exit => PersonState::WalkingToExit,
                _ => PersonState::WalkingToDestination,
            };
            drop(journey);
            if let Ok(mut pos) = world.get::<&mut Position>(rider) {
                pos.floor = floor;
                pos.y = floor_y;
            }
        } else {
            staying.push(rider);
        }
    }
    car.passengers = staying;

    let car_ref = CarRef { shaft: id, index };
    while !car.is_full(capacity) {
        let Some(person) = queues.pop_front(id, floor) else {
            break;
        };
        let Ok(mut journey) = world.get::<&mut Journey>(person) else {
            continue;
        };
        journey.state = PersonState::Riding { car: car_ref };
        car.add_stop(journey.trip.dest_floor, false);
        car.passengers.push(person);
    }

    car.select_next_stop();
    log::trace!(
        "car {} of shaft x={} at floor {}: {} aboard",
        index,
        id.x,
        floor,
        car.passengers.len()
    );

    if queues.len(id, floor) > 0 {
        shaft.dispatch_call(floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Person, ShaftId, ShaftKind, Stress, TenantId, TenantKind, Trip};
    use crate::config::GridConfig;
    use crate::shafts::CarState;

    fn setup() -> (World, ShaftRegistry, WaitingQueues, FloorGrid, ShaftId) {
        let grid = FloorGrid::new(&GridConfig::default());
        let id = ShaftId::new(ShaftKind::Passenger, 10);
        let mut shaft = Shaft::new(id, 0, grid.floor_height_px(), 0);
        shaft.max_floor = 5;
        let mut shafts = ShaftRegistry::new();
        shafts.insert(shaft);
        (World::new(), shafts, WaitingQueues::new(), grid, id)
    }

    fn waiting(world: &mut World, id: ShaftId, dest: i32, n: u64) -> Entity {
        world.spawn((
            Person {
                id: n,
                kind: TenantKind::Office,
                home: TenantId::new(dest, 0),
            },
            Position::default(),
            Journey {
                state: PersonState::Waiting { shaft: id },
                trip: Trip {
                    dest_floor: dest,
                    dest_x: 0.0,
                    goal: TripGoal::Stay {
                        unit: TenantId::new(dest, 0),
                    },
                },
            },
            Stress::default(),
        ))
    }

    fn run(
        world: &mut World,
        shafts: &mut ShaftRegistry,
        queues: &mut WaitingQueues,
        grid: &FloorGrid,
        ticks: usize,
    ) {
        let config = ElevatorConfig {
            capacity: 2,
            ..Default::default()
        };
        for _ in 0..ticks {
            elevator_system(world, shafts, queues, grid, &config, 1.0 / 30.0);
        }
    }

    #[test]
    fn test_boards_at_current_floor_up_to_capacity() {
        let (mut world, mut shafts, mut queues, grid, id) = setup();
        let people: Vec<Entity> = (0..3).map(|n| waiting(&mut world, id, 3, n)).collect();
        for &p in &people {
            queues.enqueue(id, 0, p);
        }

        run(&mut world, &mut shafts, &mut queues, &grid, 2);

        let car = &shafts.get(id).unwrap().cars[0];
        assert_eq!(car.passengers, people[..2].to_vec());
        assert_eq!(car.state, CarState::Moving);
        assert_eq!(car.target, 3);
        assert_eq!(queues.len(id, 0), 1);
        assert!(matches!(
            world.get::<&Journey>(people[0]).unwrap().state,
            PersonState::Riding { .. }
        ));
        assert!(matches!(
            world.get::<&Journey>(people[2]).unwrap().state,
            PersonState::Waiting { .. }
        ));
    }

    #[test]
    fn test_riders_disembark_at_destination() {
        let (mut world, mut shafts, mut queues, grid, id) = setup();
        let p = waiting(&mut world, id, 2, 0);
        queues.enqueue(id, 0, p);

        // 2 floors at 120px/s is 0.8s
        run(&mut world, &mut shafts, &mut queues, &grid, 40);

        let car = &shafts.get(id).unwrap().cars[0];
        assert!(car.passengers.is_empty());
        assert_eq!(car.state, CarState::Idle);
        assert_eq!(car.floor, 2);
        assert_eq!(
            world.get::<&Journey>(p).unwrap().state,
            PersonState::WalkingToDestination
        );
        assert_eq!(world.get::<&Position>(p).unwrap().floor, 2);
    }

    #[test]
    fn test_exit_trip_walks_to_exit() {
        let (mut world, mut shafts, mut queues, grid, id) = setup();
        let p = waiting(&mut world, id, 0, 0);
        world.get::<&mut Journey>(p).unwrap().trip.goal = TripGoal::Exit;
        world.get::<&mut Position>(p).unwrap().floor = 4;
        queues.enqueue(id, 4, p);

        run(&mut world, &mut shafts, &mut queues, &grid, 120);

        assert_eq!(
            world.get::<&Journey>(p).unwrap().state,
            PersonState::WalkingToExit
        );
    }

    #[test]
    fn test_full_car_leaves_call_for_next_car() {
        let (mut world, mut shafts, mut queues, grid, id) = setup();
        shafts.get_mut(id).unwrap().add_car(5, grid.floor_height_px());
        for n in 0..3 {
            let p = waiting(&mut world, id, 3, n);
            queues.enqueue(id, 0, p);
        }

        run(&mut world, &mut shafts, &mut queues, &grid, 2);

        let shaft = shafts.get(id).unwrap();
        assert_eq!(shaft.cars[0].passengers.len(), 2);
        assert!(shaft.cars[1].has_hall_call(0));
    }
}
