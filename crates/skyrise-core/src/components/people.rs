//! People-related components: Person, Journey, Trip, Stress.

use super::building::{CarRef, ShaftId, TenantId, TenantKind};
use serde::{Deserialize, Serialize};

/// Identity of a simulated person. `id` is the spawn sequence number and
/// defines the per-tick iteration order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    /// Tenant population this person belongs to
    pub kind: TenantKind,
    /// Unit the person works, lives or stays in
    pub home: TenantId,
}

/// What reaching the trip destination means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripGoal {
    /// Stay at a unit until a schedule trigger moves the person on
    Stay { unit: TenantId },
    /// Leave the building off the lobby's left boundary
    Exit,
    /// Housekeeper servicing a hotel room
    Service { room: TenantId },
    /// Staff ending their shift at their own unit
    ClockOut,
}

impl TripGoal {
    /// Unit this goal references, if any
    pub fn unit(&self) -> Option<TenantId> {
        match self {
            TripGoal::Stay { unit } => Some(*unit),
            TripGoal::Service { room } => Some(*room),
            TripGoal::Exit | TripGoal::ClockOut => None,
        }
    }
}

/// Where a trip ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub dest_floor: i32,
    /// Horizontal pixel target on the destination floor
    pub dest_x: f32,
    pub goal: TripGoal,
}

/// Passenger lifecycle. States that need a shaft or car carry it, so a
/// waiting or riding person without one cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PersonState {
    WalkingToElevator { shaft: ShaftId, slot_x: f32 },
    Waiting { shaft: ShaftId },
    Riding { car: CarRef },
    WalkingToDestination,
    AtDestination,
    WalkingToExit,
    Leaving,
}

impl PersonState {
    pub fn name(&self) -> &'static str {
        match self {
            PersonState::WalkingToElevator { .. } => "walking_to_elevator",
            PersonState::Waiting { .. } => "waiting",
            PersonState::Riding { .. } => "riding",
            PersonState::WalkingToDestination => "walking_to_destination",
            PersonState::AtDestination => "at_destination",
            PersonState::WalkingToExit => "walking_to_exit",
            PersonState::Leaving => "leaving",
        }
    }

    /// Shaft this state is bound to, if any
    pub fn shaft(&self) -> Option<ShaftId> {
        match self {
            PersonState::WalkingToElevator { shaft, .. } | PersonState::Waiting { shaft } => {
                Some(*shaft)
            }
            PersonState::Riding { car } => Some(car.shaft),
            _ => None,
        }
    }

    pub fn is_at_rest(&self) -> bool {
        matches!(self, PersonState::AtDestination)
    }
}

/// Current trip and lifecycle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Journey {
    pub state: PersonState,
    pub trip: Trip,
}

impl Journey {
    /// Person is somewhere at `unit` with nothing to do
    pub fn resting_at(&self, unit: TenantId) -> bool {
        self.state.is_at_rest() && self.trip.goal.unit() == Some(unit)
    }
}

/// Patience accumulator, 0.0 (calm) up to the configured maximum
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Stress {
    pub value: f32,
}

impl Stress {
    /// Accrue stress, never exceeding `max`
    pub fn accrue(&mut self, amount: f32, max: f32) {
        self.value = (self.value + amount.max(0.0)).clamp(0.0, max);
    }

    pub fn is_exhausted(&self, max: f32) -> bool {
        self.value >= max
    }

    pub fn ratio(&self, max: f32) -> f32 {
        if max <= 0.0 {
            1.0
        } else {
            (self.value / max).clamp(0.0, 1.0)
        }
    }

    /// Satisfaction recorded for a trip finished at this stress level
    pub fn trip_satisfaction(&self, max: f32) -> f32 {
        (1.0 - self.ratio(max)).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

/// Four-stop stress readout for observers. Not a game rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressLevel {
    Calm,
    Mild,
    Elevated,
    Critical,
}

impl StressLevel {
    pub fn from_ratio(ratio: f32) -> Self {
        if ratio < 0.25 {
            StressLevel::Calm
        } else if ratio < 0.5 {
            StressLevel::Mild
        } else if ratio < 0.75 {
            StressLevel::Elevated
        } else {
            StressLevel::Critical
        }
    }

    /// Linear RGB gradient through calm green, mild yellow, elevated orange
    /// and critical red.
    pub fn gradient(ratio: f32) -> [f32; 3] {
        const STOPS: [[f32; 3]; 4] = [
            [0.30, 0.80, 0.35],
            [0.95, 0.85, 0.25],
            [0.95, 0.55, 0.15],
            [0.90, 0.15, 0.15],
        ];
        let t = ratio.clamp(0.0, 1.0) * 3.0;
        let i = (t.floor() as usize).min(2);
        let f = t - i as f32;
        let (a, b) = (STOPS[i], STOPS[i + 1]);
        [
            a[0] + (b[0] - a[0]) * f,
            a[1] + (b[1] - a[1]) * f,
            a[2] + (b[2] - a[2]) * f,
        ]
    }
}
