//! Scheduling clock - game time of day and the trigger table.

use serde::{Deserialize, Serialize};

use crate::components::TenantKind;
use crate::config::ClockConfig;

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Converts real seconds into game minutes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameClock {
    /// Game minutes since day 0, 00:00
    minutes: f64,
    minutes_per_second: f64,
    /// Last minute handed out by `take_due_minute`
    last_processed_minute: Option<i64>,
}

impl GameClock {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            minutes: config.start_hour.clamp(0.0, 24.0) * 60.0,
            minutes_per_second: config.minutes_per_second.max(0.0),
            last_processed_minute: None,
        }
    }

    pub fn advance(&mut self, real_seconds: f32) {
        self.minutes += real_seconds.max(0.0) as f64 * self.minutes_per_second;
    }

    /// Current whole game minute since day 0
    pub fn minute(&self) -> i64 {
        self.minutes.floor() as i64
    }

    pub fn day(&self) -> i64 {
        self.minute().div_euclid(MINUTES_PER_DAY)
    }

    /// Hour of day, 0.0..24.0
    pub fn hour(&self) -> f32 {
        (self.minutes.rem_euclid(MINUTES_PER_DAY as f64) / 60.0) as f32
    }

    pub fn minute_of_day(&self) -> i64 {
        self.minute().rem_euclid(MINUTES_PER_DAY)
    }

    /// Returns the current minute if it has not been processed yet.
    /// Minutes skipped by a large step are not replayed.
    pub fn take_due_minute(&mut self) -> Option<i64> {
        let minute = self.minute();
        if self.last_processed_minute == Some(minute) {
            return None;
        }
        self.last_processed_minute = Some(minute);
        Some(minute)
    }

    pub fn set_minutes_per_second(&mut self, rate: f64) {
        self.minutes_per_second = rate.max(0.0);
    }

    /// Formatted `Day N HH:MM`
    pub fn label(&self) -> String {
        let m = self.minute_of_day();
        format!("Day {} {:02}:{:02}", self.day(), m / 60, m % 60)
    }
}

/// Half-open hour range `[start, end)`. Wraps past midnight when end < start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start: f32,
    pub end: f32,
}

impl HourWindow {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, hour: f32) -> bool {
        let hour = hour.rem_euclid(24.0);
        if self.start <= self.end {
            hour >= self.start && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }

    pub fn is_valid(&self) -> bool {
        (0.0..=24.0).contains(&self.start) && (0.0..=24.0).contains(&self.end)
    }
}

/// What a successful trial does to a tenant unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleAction {
    /// Spawn an occupant at the lobby heading to the unit
    Arrive,
    /// One occupant at rest leaves for the exit
    Depart,
    /// One worker at rest goes to a food court
    LunchOut,
    /// One worker at a food court returns to their unit
    LunchReturn,
    /// Hotel guest arrives for a clean vacant room
    CheckIn,
    /// Hotel guest leaves, room needs service
    CheckOut,
    /// Staff begin their shift
    ShiftStart,
    /// An idle housekeeper heads to a room needing service
    ServiceRooms,
    /// Staff end their shift
    ShiftEnd,
    /// Daycare child count +1
    DropOff,
    /// Daycare child count -1
    PickUp,
    /// A buyer comes to look at an unsold condo
    CondoSale,
}

/// One row of the trigger table: an independent trial per unit of `kind`,
/// once per game minute while the window is open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRule {
    pub kind: TenantKind,
    pub window: HourWindow,
    pub probability: f64,
    pub action: ScheduleAction,
}

impl ScheduleRule {
    pub fn new(
        kind: TenantKind,
        start: f32,
        end: f32,
        probability: f64,
        action: ScheduleAction,
    ) -> Self {
        Self {
            kind,
            window: HourWindow::new(start, end),
            probability,
            action,
        }
    }
}

/// Built-in trigger table
pub fn default_schedule() -> Vec<ScheduleRule> {
    use ScheduleAction::*;
    use TenantKind::*;
    vec![
        ScheduleRule::new(Office, 8.0, 9.0, 0.2, Arrive),
        ScheduleRule::new(Office, 11.5, 12.5, 0.05, LunchOut),
        ScheduleRule::new(Office, 12.5, 14.0, 0.2, LunchReturn),
        ScheduleRule::new(Office, 17.0, 18.0, 0.2, Depart),
        ScheduleRule::new(Coworking, 9.0, 10.0, 0.25, Arrive),
        ScheduleRule::new(Coworking, 11.5, 12.5, 0.05, LunchOut),
        ScheduleRule::new(Coworking, 12.5, 14.0, 0.2, LunchReturn),
        ScheduleRule::new(Coworking, 18.0, 19.0, 0.25, Depart),
        ScheduleRule::new(Apartment, 7.0, 9.0, 0.1, Depart),
        ScheduleRule::new(Apartment, 17.5, 19.5, 0.1, Arrive),
        ScheduleRule::new(Hotel, 15.0, 21.0, 0.03, CheckIn),
        ScheduleRule::new(Hotel, 7.0, 11.0, 0.05, CheckOut),
        ScheduleRule::new(Housekeeping, 9.0, 10.0, 0.2, ShiftStart),
        ScheduleRule::new(Housekeeping, 10.0, 16.0, 0.1, ServiceRooms),
        ScheduleRule::new(Housekeeping, 16.0, 17.0, 0.2, ShiftEnd),
        ScheduleRule::new(Security, 7.0, 8.0, 0.2, ShiftStart),
        ScheduleRule::new(Security, 19.0, 20.0, 0.2, ShiftEnd),
        ScheduleRule::new(Daycare, 7.0, 9.0, 0.1, DropOff),
        ScheduleRule::new(Daycare, 17.0, 19.0, 0.15, PickUp),
        ScheduleRule::new(Condo, 10.0, 18.0, 0.01, CondoSale),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock_at(hour: f64) -> GameClock {
        GameClock::new(&ClockConfig {
            start_hour: hour,
            minutes_per_second: 1.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_clock_starts_at_configured_hour() {
        let clock = clock_at(6.0);
        assert_eq!(clock.hour(), 6.0);
        assert_eq!(clock.day(), 0);
        assert_eq!(clock.label(), "Day 0 06:00");
    }

    #[test]
    fn test_day_rolls_over() {
        let mut clock = clock_at(23.5);
        clock.advance(45.0);
        assert_eq!(clock.day(), 1);
        assert!((clock.hour() - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_due_minute_at_most_once() {
        let mut clock = clock_at(8.0);
        assert_eq!(clock.take_due_minute(), Some(480));
        clock.advance(0.5);
        assert_eq!(clock.take_due_minute(), None);
        clock.advance(0.5);
        assert_eq!(clock.take_due_minute(), Some(481));
        assert_eq!(clock.take_due_minute(), None);
    }

    #[test]
    fn test_skipped_minutes_not_replayed() {
        let mut clock = clock_at(8.0);
        clock.take_due_minute();
        clock.advance(10.0);
        assert_eq!(clock.take_due_minute(), Some(490));
        assert_eq!(clock.take_due_minute(), None);
    }

    #[test]
    fn test_hour_window() {
        let office = HourWindow::new(8.0, 9.0);
        assert!(office.contains(8.0));
        assert!(office.contains(8.99));
        assert!(!office.contains(9.0));

        let night = HourWindow::new(22.0, 6.0);
        assert!(night.contains(23.0));
        assert!(night.contains(3.0));
        assert!(!night.contains(12.0));
    }

    #[test]
    fn test_default_schedule_windows_valid() {
        let rules = default_schedule();
        assert!(rules.iter().all(|r| r.window.is_valid()));
        assert!(rules
            .iter()
            .any(|r| r.kind == TenantKind::Office && r.action == ScheduleAction::Arrive));
    }
}
