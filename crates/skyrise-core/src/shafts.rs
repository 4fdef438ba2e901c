//! Elevator shafts, cars, the dispatch heuristic and waiting queues.
//!
//! Dispatch is greedy and floor-local: a call goes to the nearest idle car
//! (lowest index on ties) unless a moving car is about to pass the floor and
//! is strictly closer. A floor already held as a stop by any car is never
//! assigned twice, which keeps repeated calls within a tick idempotent.

use std::collections::{BTreeMap, VecDeque};

use hecs::Entity;

use crate::components::{CarRef, ShaftId, ShaftKind, TenantKind};

/// Shafts are two tiles wide
pub const SHAFT_WIDTH: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarState {
    Idle,
    Moving,
}

/// A floor a car has committed to visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stop {
    pub floor: i32,
    /// Added by dispatch for a waiting queue (as opposed to a rider's destination)
    pub hall_call: bool,
}

/// An elevator cabin owned by one shaft
#[derive(Debug, Clone)]
pub struct Car {
    pub index: usize,
    /// Authoritative when idle; while moving, the nearest floor
    pub floor: i32,
    /// Vertical pixel position
    pub y: f32,
    pub target: i32,
    pub state: CarState,
    stops: Vec<Stop>,
    pub passengers: Vec<Entity>,
}

impl Car {
    pub fn new(index: usize, floor: i32, floor_height_px: f32) -> Self {
        Self {
            index,
            floor,
            y: floor as f32 * floor_height_px,
            target: floor,
            state: CarState::Idle,
            stops: Vec::new(),
            passengers: Vec::new(),
        }
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn has_stop(&self, floor: i32) -> bool {
        self.stops.iter().any(|s| s.floor == floor)
    }

    pub fn has_hall_call(&self, floor: i32) -> bool {
        self.stops.iter().any(|s| s.floor == floor && s.hall_call)
    }

    /// Add a pending stop unless already present. Returns true if added.
    pub fn add_stop(&mut self, floor: i32, hall_call: bool) -> bool {
        if let Some(stop) = self.stops.iter_mut().find(|s| s.floor == floor) {
            stop.hall_call |= hall_call;
            return false;
        }
        self.stops.push(Stop { floor, hall_call });
        true
    }

    pub fn remove_stop(&mut self, floor: i32) {
        self.stops.retain(|s| s.floor != floor);
    }

    /// Nearest pending stop; the first in insertion order wins ties
    pub fn nearest_stop(&self) -> Option<i32> {
        let mut best: Option<(i32, i32)> = None;
        for stop in &self.stops {
            let dist = (stop.floor - self.floor).abs();
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((stop.floor, dist));
            }
        }
        best.map(|(floor, _)| floor)
    }

    /// Head for the nearest stop, or go idle when none remain
    pub fn select_next_stop(&mut self) {
        match self.nearest_stop() {
            Some(floor) => {
                self.target = floor;
                self.state = CarState::Moving;
            }
            None => {
                self.target = self.floor;
                self.state = CarState::Idle;
            }
        }
    }

    /// Moving and the floor lies strictly between here and the current target
    pub fn passes(&self, floor: i32) -> bool {
        if self.state != CarState::Moving {
            return false;
        }
        let (lo, hi) = if self.floor <= self.target {
            (self.floor, self.target)
        } else {
            (self.target, self.floor)
        };
        floor > lo && floor < hi
    }

    pub fn is_full(&self, capacity: usize) -> bool {
        self.passengers.len() >= capacity
    }

    /// Advance toward the target. Snaps to the target floor and drops that
    /// stop once less than one step remains; returns true on arrival.
    pub fn advance(&mut self, delta_seconds: f32, speed_px: f32, floor_height_px: f32) -> bool {
        if self.state != CarState::Moving {
            return false;
        }
        let target_y = self.target as f32 * floor_height_px;
        let remaining = target_y - self.y;
        let step = speed_px * delta_seconds;
        if remaining.abs() < step {
            self.y = target_y;
            self.floor = self.target;
            self.remove_stop(self.target);
            true
        } else {
            self.y += remaining.signum() * step;
            self.floor = (self.y / floor_height_px).round() as i32;
            false
        }
    }
}

/// A vertical channel spanning a contiguous floor range
#[derive(Debug, Clone)]
pub struct Shaft {
    pub id: ShaftId,
    pub min_floor: i32,
    pub max_floor: i32,
    pub cars: Vec<Car>,
    /// Money spent on this shaft, for demolish refunds
    pub invested: i64,
}

impl Shaft {
    pub fn new(id: ShaftId, floor: i32, floor_height_px: f32, invested: i64) -> Self {
        Self {
            id,
            min_floor: floor,
            max_floor: floor,
            cars: vec![Car::new(0, floor, floor_height_px)],
            invested,
        }
    }

    pub fn serves(&self, floor: i32) -> bool {
        floor >= self.min_floor && floor <= self.max_floor
    }

    /// Grid column `x` lies inside this shaft
    pub fn covers_column(&self, x: i32) -> bool {
        x >= self.id.x && x - self.id.x < SHAFT_WIDTH
    }

    /// A shaft placed at column `x` would overlap this one
    pub fn overlaps(&self, x: i32) -> bool {
        x.abs_diff(self.id.x) < SHAFT_WIDTH as u32
    }

    pub fn add_car(&mut self, floor: i32, floor_height_px: f32) -> usize {
        let index = self.cars.len();
        self.cars.push(Car::new(index, floor, floor_height_px));
        index
    }

    /// Any car already committed to this floor
    pub fn has_stop_anywhere(&self, floor: i32) -> bool {
        self.cars.iter().any(|c| c.has_stop(floor))
    }

    pub fn passenger_count(&self) -> usize {
        self.cars.iter().map(|c| c.passengers.len()).sum()
    }

    /// Assign a floor call to a car. Returns the chosen car index, or None
    /// when the call is already being served, out of range, or no car fits.
    pub fn dispatch_call(&mut self, floor: i32) -> Option<usize> {
        if !self.serves(floor) || self.has_stop_anywhere(floor) {
            return None;
        }

        let mut best_idle: Option<(usize, i32)> = None;
        let mut best_passing: Option<(usize, i32)> = None;
        for car in &self.cars {
            let dist = (car.floor - floor).abs();
            match car.state {
                CarState::Idle => {
                    if best_idle.map_or(true, |(_, d)| dist < d) {
                        best_idle = Some((car.index, dist));
                    }
                }
                CarState::Moving => {
                    if car.passes(floor) && best_passing.map_or(true, |(_, d)| dist < d) {
                        best_passing = Some((car.index, dist));
                    }
                }
            }
        }

        let chosen = match (best_idle, best_passing) {
            (Some((_, idle_d)), Some((passing, passing_d))) if passing_d < idle_d => {
                Some((passing, true))
            }
            (Some((idle, _)), _) => Some((idle, false)),
            (None, Some((passing, _))) => Some((passing, true)),
            (None, None) => None,
        };

        let (index, passing) = chosen?;
        let car = &mut self.cars[index];
        car.add_stop(floor, true);
        if passing {
            car.target = floor;
        } else if car.state == CarState::Idle {
            car.select_next_stop();
        }
        log::trace!("shaft x={} floor {} call -> car {}", self.id.x, floor, index);
        Some(index)
    }
}

/// All shafts of both kinds, iterated in `ShaftId` order
#[derive(Debug, Clone, Default)]
pub struct ShaftRegistry {
    shafts: BTreeMap<ShaftId, Shaft>,
}

impl ShaftRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, shaft: Shaft) {
        self.shafts.insert(shaft.id, shaft);
    }

    pub fn remove(&mut self, id: ShaftId) -> Option<Shaft> {
        self.shafts.remove(&id)
    }

    pub fn get(&self, id: ShaftId) -> Option<&Shaft> {
        self.shafts.get(&id)
    }

    pub fn get_mut(&mut self, id: ShaftId) -> Option<&mut Shaft> {
        self.shafts.get_mut(&id)
    }

    pub fn car(&self, car: CarRef) -> Option<&Car> {
        self.shafts.get(&car.shaft).and_then(|s| s.cars.get(car.index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shaft> {
        self.shafts.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Shaft> {
        self.shafts.values_mut()
    }

    pub fn ids(&self) -> Vec<ShaftId> {
        self.shafts.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.shafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shafts.is_empty()
    }

    pub fn count_of(&self, kind: ShaftKind) -> usize {
        self.shafts.keys().filter(|id| id.kind == kind).count()
    }

    /// Shaft of `kind` whose columns include `x`
    pub fn find_covering(&self, kind: ShaftKind, x: i32) -> Option<&Shaft> {
        self.shafts
            .values()
            .find(|s| s.id.kind == kind && s.covers_column(x))
    }

    /// Shaft of any kind covering a tile
    pub fn find_at(&self, floor: i32, x: i32) -> Option<&Shaft> {
        self.shafts
            .values()
            .find(|s| s.covers_column(x) && s.serves(floor))
    }

    /// Any shaft whose columns a new shaft at `x` would overlap
    pub fn overlapping(&self, x: i32) -> Option<&Shaft> {
        self.shafts.values().find(|s| s.overlaps(x))
    }

    /// Pick the shaft with the least horizontal walking that serves both
    /// floors. Staff try service shafts first and fall back to passenger
    /// shafts; everyone else rides passenger shafts only.
    pub fn route(
        &self,
        kind: TenantKind,
        from_floor: i32,
        from_x: f32,
        to_floor: i32,
        to_x: f32,
        tile_px: f32,
    ) -> Option<ShaftId> {
        let preferred = kind.preferred_shaft();
        let route = self.route_in(preferred, from_floor, from_x, to_floor, to_x, tile_px);
        if route.is_some() || !kind.is_staff() {
            return route;
        }
        self.route_in(preferred.other(), from_floor, from_x, to_floor, to_x, tile_px)
    }

    fn route_in(
        &self,
        kind: ShaftKind,
        from_floor: i32,
        from_x: f32,
        to_floor: i32,
        to_x: f32,
        tile_px: f32,
    ) -> Option<ShaftId> {
        let mut best: Option<(ShaftId, f32)> = None;
        for shaft in self.shafts.values() {
            if shaft.id.kind != kind || !shaft.serves(from_floor) || !shaft.serves(to_floor) {
                continue;
            }
            let center = (shaft.id.x as f32 + SHAFT_WIDTH as f32 / 2.0) * tile_px;
            let walk = (center - from_x).abs() + (center - to_x).abs();
            if best.map_or(true, |(_, w)| walk < w) {
                best = Some((shaft.id, walk));
            }
        }
        best.map(|(id, _)| id)
    }
}

/// Horizontal pixel position of queue slot `index`, lined up to the left
/// of the shaft
pub fn queue_slot_x(shaft: ShaftId, index: usize, tile_px: f32, spacing_px: f32) -> f32 {
    shaft.x as f32 * tile_px - spacing_px * (index as f32 + 1.0)
}

/// FIFO queues per (shaft, floor)
#[derive(Debug, Clone, Default)]
pub struct WaitingQueues {
    queues: BTreeMap<(ShaftId, i32), VecDeque<Entity>>,
}

impl WaitingQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, shaft: ShaftId, floor: i32, person: Entity) {
        let queue = self.queues.entry((shaft, floor)).or_default();
        if !queue.contains(&person) {
            queue.push_back(person);
        }
    }

    pub fn len(&self, shaft: ShaftId, floor: i32) -> usize {
        self.queues.get(&(shaft, floor)).map_or(0, |q| q.len())
    }

    pub fn position(&self, shaft: ShaftId, floor: i32, person: Entity) -> Option<usize> {
        self.queues
            .get(&(shaft, floor))
            .and_then(|q| q.iter().position(|&e| e == person))
    }

    pub fn front(&self, shaft: ShaftId, floor: i32) -> Option<Entity> {
        self.queues.get(&(shaft, floor)).and_then(|q| q.front().copied())
    }

    pub fn pop_front(&mut self, shaft: ShaftId, floor: i32) -> Option<Entity> {
        let key = (shaft, floor);
        let queue = self.queues.get_mut(&key)?;
        let person = queue.pop_front();
        if queue.is_empty() {
            self.queues.remove(&key);
        }
        person
    }

    /// Remove a person, keeping the others in order. Returns true if found.
    pub fn remove(&mut self, shaft: ShaftId, floor: i32, person: Entity) -> bool {
        let key = (shaft, floor);
        let Some(queue) = self.queues.get_mut(&key) else {
            return false;
        };
        let before = queue.len();
        queue.retain(|&e| e != person);
        let removed = queue.len() != before;
        if queue.is_empty() {
            self.queues.remove(&key);
        }
        removed
    }

    /// Floors of a shaft with people waiting, ascending
    pub fn floors_waiting(&self, shaft: ShaftId) -> Vec<i32> {
        self.queues
            .range((shaft, i32::MIN)..=(shaft, i32::MAX))
            .filter(|(_, q)| !q.is_empty())
            .map(|((_, floor), _)| *floor)
            .collect()
    }

    pub fn waiting_at(&self, shaft: ShaftId) -> usize {
        self.queues
            .range((shaft, i32::MIN)..=(shaft, i32::MAX))
            .map(|(_, q)| q.len())
            .sum()
    }

    /// Number of queues containing `person`
    pub fn memberships(&self, person: Entity) -> usize {
        self.queues.values().filter(|q| q.contains(&person)).count()
    }

    pub fn total(&self) -> usize {
        self.queues.values().map(|q| q.len()).sum()
    }
}
