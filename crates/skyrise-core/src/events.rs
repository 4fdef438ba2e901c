//! Notifications for the UI and economy collaborators, drained once per frame.

use serde::{Deserialize, Serialize};

use crate::components::TenantKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Building-wide mean after a new sample
    SatisfactionChanged(f32),
    /// A trip finished normally
    TripCompleted { kind: TenantKind, satisfaction: f32 },
    /// Someone gave up waiting
    AngryDeparture { kind: TenantKind, floor: i32 },
    PersonSpawned { kind: TenantKind },
    PersonRemoved { kind: TenantKind },
    /// A click was rejected; `reason` is the error message
    BuildRejected { reason: String },
    DayStarted { day: i64 },
    HotelComplaint,
}
