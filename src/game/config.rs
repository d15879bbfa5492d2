//! Simulation Configuration
//!
//! Tunables for the step loop. Everything has a default; JSON input only
//! needs to name the fields it overrides.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::TIME_STEP;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Time step is zero, negative or not finite.
    #[error("invalid time step: {0}")]
    InvalidTimeStep(f64),
    /// A distance or duration is negative or not finite.
    #[error("invalid value for {field}: {value}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// Its value
        value: f32,
    },
    /// JSON parse failure.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Step loop tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds per discrete step
    pub time_step: f64,
    /// Seed for the battle RNG
    pub seed: u64,
    /// Distance to destination beyond which a unit starts moving
    pub moving_threshold: f32,
    /// Distance at which the path cursor snaps to a waypoint
    pub waypoint_tolerance: f32,
    /// Recovery time after surviving a strike
    pub stunned_duration: f32,
    /// Radius around the weapon tip searched for an opponent
    pub opponent_search_radius: f32,
    /// Fighters closer than this push each other apart
    pub fighter_separation: f32,
    /// Enemy weapon tips closer than this push a fighter away
    pub weapon_avoidance: f32,
    /// Scale of the separation nudge
    pub avoidance_nudge: f32,
    /// Radius around a unit center counted for influence
    pub influence_radius: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: TIME_STEP,
            seed: 0,
            moving_threshold: 8.0,
            waypoint_tolerance: 0.5,
            stunned_duration: 0.6,
            opponent_search_radius: 1.1,
            fighter_separation: 0.9,
            weapon_avoidance: 0.8,
            avoidance_nudge: 0.1,
            influence_radius: 30.0,
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(ConfigError::InvalidTimeStep(self.time_step));
        }

        let fields = [
            ("moving_threshold", self.moving_threshold),
            ("waypoint_tolerance", self.waypoint_tolerance),
            ("stunned_duration", self.stunned_duration),
            ("opponent_search_radius", self.opponent_search_radius),
            ("fighter_separation", self.fighter_separation),
            ("weapon_avoidance", self.weapon_avoidance),
            ("avoidance_nudge", self.avoidance_nudge),
            ("influence_radius", self.influence_radius),
        ];
        for (field, value) in fields {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }

        Ok(())
    }

    /// Step length as used by per-step arithmetic.
    #[inline]
    pub fn dt(&self) -> f32 {
        self.time_step as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.time_step - 1.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_json() {
        let config = SimulationConfig::from_json_str(r#"{ "seed": 42, "moving_threshold": 4.0 }"#)
            .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.moving_threshold, 4.0);
        assert_eq!(config.stunned_duration, 0.6);
    }

    #[test]
    fn test_rejects_bad_time_step() {
        let err = SimulationConfig::from_json_str(r#"{ "time_step": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeStep(_)));
    }

    #[test]
    fn test_rejects_negative_radius() {
        let config = SimulationConfig {
            fighter_separation: -1.0,
            ..SimulationConfig::default()
        };
        match config.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "fighter_separation"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = SimulationConfig::from_json_str("{ seed: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
