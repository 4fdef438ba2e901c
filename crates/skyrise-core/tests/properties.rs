//! Property tests for dispatch, stress and satisfaction bounds.

use proptest::prelude::*;

use skyrise_core::components::{ShaftId, ShaftKind, Stress};
use skyrise_core::satisfaction::SatisfactionTracker;
use skyrise_core::shafts::{CarState, Shaft};

const FLOOR_HEIGHT: f32 = 48.0;

/// A shaft over floors 0..=max with cars parked or moving at random
fn shaft_with(max: i32, cars: &[(i32, Option<i32>)]) -> Shaft {
    let mut shaft = Shaft::new(ShaftId::new(ShaftKind::Passenger, 4), 0, FLOOR_HEIGHT, 0);
    shaft.max_floor = max;
    shaft.cars.clear();
    for &(floor, target) in cars {
        let index = shaft.add_car(floor.clamp(0, max), FLOOR_HEIGHT);
        if let Some(target) = target {
            let car = &mut shaft.cars[index];
            car.add_stop(target.clamp(0, max), false);
            car.select_next_stop();
        }
    }
    shaft
}

fn cars_strategy() -> impl Strategy<Value = Vec<(i32, Option<i32>)>> {
    prop::collection::vec((0..12i32, prop::option::of(0..12i32)), 1..5)
}

proptest! {
    #[test]
    fn hall_calls_are_never_shared(
        cars in cars_strategy(),
        calls in prop::collection::vec(0..12i32, 0..40),
    ) {
        let mut shaft = shaft_with(11, &cars);
        for floor in calls {
            shaft.dispatch_call(floor);
        }
        for floor in 0..=11 {
            let holders = shaft.cars.iter().filter(|c| c.has_hall_call(floor)).count();
            prop_assert!(holders <= 1);
        }
        for car in &shaft.cars {
            let mut floors: Vec<i32> = car.stops().iter().map(|s| s.floor).collect();
            let before = floors.len();
            floors.sort_unstable();
            floors.dedup();
            prop_assert_eq!(before, floors.len());
        }
    }

    #[test]
    fn repeated_call_is_idempotent(cars in cars_strategy(), floor in 0..12i32) {
        let mut shaft = shaft_with(11, &cars);
        shaft.dispatch_call(floor);
        let stops: Vec<_> = shaft.cars.iter().map(|c| c.stops().to_vec()).collect();
        let states: Vec<_> = shaft.cars.iter().map(|c| (c.state, c.target)).collect();

        prop_assert_eq!(shaft.dispatch_call(floor), None);
        let after: Vec<_> = shaft.cars.iter().map(|c| c.stops().to_vec()).collect();
        let after_states: Vec<_> = shaft.cars.iter().map(|c| (c.state, c.target)).collect();
        prop_assert_eq!(stops, after);
        prop_assert_eq!(states, after_states);
    }

    #[test]
    fn idle_cars_always_answer(floors in prop::collection::vec(0..12i32, 1..5), call in 0..12i32) {
        let cars: Vec<_> = floors.iter().map(|&f| (f, None)).collect();
        let mut shaft = shaft_with(11, &cars);
        let chosen = shaft.dispatch_call(call);
        prop_assert!(chosen.is_some());
        let index = chosen.unwrap_or(0);
        let best = floors.iter().map(|f| (f - call).abs()).min().unwrap_or(0);
        prop_assert_eq!((floors[index] - call).abs(), best);
        prop_assert!(floors[..index].iter().all(|f| (f - call).abs() > best));
        prop_assert_eq!(shaft.cars[index].state, CarState::Moving);
    }

    #[test]
    fn stress_stays_in_bounds(steps in prop::collection::vec(-50.0f32..80.0, 0..30)) {
        let mut stress = Stress::default();
        for amount in steps {
            stress.accrue(amount, 100.0);
            prop_assert!((0.0..=100.0).contains(&stress.value));
            let s = stress.trip_satisfaction(100.0);
            prop_assert!((0.0..=1.0).contains(&s));
            prop_assert!((s - (1.0 - stress.value / 100.0)).abs() < 1e-5);
        }
    }

    #[test]
    fn satisfaction_mean_stays_in_unit_range(
        samples in prop::collection::vec(-5.0f32..5.0, 0..50),
    ) {
        let mut tracker = SatisfactionTracker::new();
        for s in &samples {
            tracker.record(*s);
        }
        let mean = tracker.mean();
        prop_assert!((0.0..=1.0).contains(&mean));
        prop_assert_eq!(tracker.trips(), samples.len() as u64);
    }
}
