//! Simulation configuration.
//!
//! Every section has a `Default` reproducing the built-in ruleset, and every
//! field is `#[serde(default)]`, so a JSON file only needs to name the values
//! it overrides.

use serde::{Deserialize, Serialize};

use crate::clock::{default_schedule, ScheduleRule};
use crate::error::ConfigError;
use crate::tenants::TenantTable;

/// Top-level configuration for a `TowerEngine`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub grid: GridConfig,
    pub elevator: ElevatorConfig,
    pub passenger: PassengerConfig,
    pub clock: ClockConfig,
    pub costs: CostConfig,
    pub tenants: TenantTable,
    pub schedule: Vec<ScheduleRule>,
    /// Seed for every independent trial drawn by the engine
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            elevator: ElevatorConfig::default(),
            passenger: PassengerConfig::default(),
            clock: ClockConfig::default(),
            costs: CostConfig::default(),
            tenants: TenantTable::default(),
            schedule: default_schedule(),
            seed: 0x5eed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Tiles per floor row
    pub width: i32,
    pub tile_px: f32,
    pub floor_height_px: f32,
    /// Highest buildable floor
    pub max_floor: i32,
    /// Number of basement floors allowed below the lobby
    pub basement_floors: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 48,
            tile_px: 16.0,
            floor_height_px: 48.0,
            max_floor: 30,
            basement_floors: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevatorConfig {
    /// Vertical car speed in pixels per second
    pub car_speed_px: f32,
    pub capacity: usize,
    pub max_cars_per_shaft: usize,
}

impl Default for ElevatorConfig {
    fn default() -> Self {
        Self {
            car_speed_px: 120.0,
            capacity: 8,
            max_cars_per_shaft: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PassengerConfig {
    /// Walking speed in pixels per second
    pub walk_speed_px: f32,
    /// Gap between queue slots
    pub queue_spacing_px: f32,
    /// Horizontal gap between riders in a car
    pub rider_spacing_px: f32,
    pub max_stress: f32,
    /// Stress accrued per second of waiting
    pub stress_rate: f32,
    /// Accrual multiplier near a security office
    pub security_multiplier: f32,
    /// Floors within which a security office calms waiting people
    pub security_radius: i32,
    /// Accrual multiplier for parents while a daycare has children
    pub childcare_multiplier: f32,
    /// Distance past the left boundary where exiting people are removed
    pub exit_margin_px: f32,
}

impl Default for PassengerConfig {
    fn default() -> Self {
        Self {
            walk_speed_px: 48.0,
            queue_spacing_px: 6.0,
            rider_spacing_px: 4.0,
            max_stress: 100.0,
            stress_rate: 2.0,
            security_multiplier: 0.5,
            security_radius: 2,
            childcare_multiplier: 0.75,
            exit_margin_px: 32.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Game minutes that pass per real second
    pub minutes_per_second: f64,
    /// Hour of day when the simulation starts
    pub start_hour: f64,
    /// Fixed simulation step in real seconds
    pub tick_seconds: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            minutes_per_second: 1.0,
            start_hour: 6.0,
            tick_seconds: 1.0 / 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub floor: i64,
    pub basement_floor: i64,
    pub shaft: i64,
    pub service_shaft: i64,
    pub car: i64,
    /// Per newly covered floor when a shaft is extended
    pub extension_per_floor: i64,
    /// Fraction of money invested in a shaft returned on demolish
    pub refund_ratio: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            floor: 5_000,
            basement_floor: 10_000,
            shaft: 20_000,
            service_shaft: 15_000,
            car: 8_000,
            extension_per_floor: 2_000,
            refund_ratio: 0.5,
        }
    }
}

impl SimConfig {
    /// Parse a JSON config and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.grid.width < 4 {
            return invalid("grid.width must be at least 4");
        }
        if self.grid.tile_px <= 0.0 || self.grid.floor_height_px <= 0.0 {
            return invalid("grid pixel sizes must be positive");
        }
        if self.grid.max_floor < 0 || self.grid.basement_floors < 0 {
            return invalid("grid floor bounds must not be negative");
        }
        if self.elevator.car_speed_px <= 0.0 {
            return invalid("elevator.car_speed_px must be positive");
        }
        if self.elevator.capacity == 0 || self.elevator.max_cars_per_shaft == 0 {
            return invalid("elevator capacity and max cars must be at least 1");
        }
        if self.passenger.walk_speed_px <= 0.0 {
            return invalid("passenger.walk_speed_px must be positive");
        }
        if self.passenger.max_stress <= 0.0 || self.passenger.stress_rate < 0.0 {
            return invalid("passenger stress settings out of range");
        }
        if self.clock.tick_seconds <= 0.0 || self.clock.minutes_per_second < 0.0 {
            return invalid("clock rates out of range");
        }
        if !(0.0..=1.0).contains(&self.costs.refund_ratio) {
            return invalid("costs.refund_ratio must be within 0..=1");
        }
        for rule in self.tenants.rules() {
            if rule.width < 1 || rule.width > self.grid.width {
                return Err(ConfigError::Invalid(format!(
                    "tenant {} width {} does not fit the grid",
                    rule.kind, rule.width
                )));
            }
        }
        for rule in &self.schedule {
            if !rule.window.is_valid() || !(0.0..=1.0).contains(&rule.probability) {
                return Err(ConfigError::Invalid(format!(
                    "schedule rule for {} has an invalid window or probability",
                    rule.kind
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides_defaults() {
        let config = SimConfig::from_json(r#"{ "elevator": { "capacity": 3 }, "seed": 7 }"#)
            .expect("config should parse");
        assert_eq!(config.elevator.capacity, 3);
        assert_eq!(config.seed, 7);
        assert_eq!(config.grid.width, GridConfig::default().width);
        assert!(!config.schedule.is_empty());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SimConfig::from_json(r#"{ "elevator": { "capacity": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SimConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_round_trips_through_json() {
        let json = SimConfig::default().to_json().unwrap();
        let parsed = SimConfig::from_json(&json).unwrap();
        assert_eq!(parsed.tenants.rules().count(), 9);
    }
}
