//! Battle Scenarios
//!
//! JSON description of a starting setup: field, configuration and units
//! with their opening commands.
//!
//! ```json
//! {
//!   "seed": 7,
//!   "battle_radius": 300.0,
//!   "units": [
//!     { "player": 0, "platform": "Infantry", "weapon": "Spear", "fighters": 40, "ranks": 4,
//!       "position": { "x": -60.0, "y": 0.0 }, "facing": 0.0,
//!       "destination": { "x": -20.0, "y": 0.0 } }
//!   ]
//! }
//! ```

use std::f32::consts::PI;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::vec2::Vec2;
use crate::game::command::Command;
use crate::game::config::{ConfigError, SimulationConfig};
use crate::game::simulator::BattleSimulator;
use crate::game::terrain::{FlatTerrain, Patch};
use crate::game::unit::{Platform, PlayerId, UnitId, UnitStats, Weapon};

/// Scenario errors.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// JSON parse failure.
    #[error("scenario parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Embedded configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Battle radius is not a positive finite number.
    #[error("invalid battle radius: {0}")]
    InvalidRadius(f32),
    /// A unit has no fighters.
    #[error("unit {0} has no fighters")]
    EmptyUnit(usize),
    /// A unit asks for zero ranks.
    #[error("unit {0} has no ranks")]
    NoRanks(usize),
    /// A unit has a non-finite position, facing or destination.
    #[error("unit {0} has non-finite coordinates")]
    NonFinite(usize),
    /// A unit charges a unit index that does not exist.
    #[error("unit {unit} charges unknown unit {target}")]
    UnknownTarget {
        /// Index of the charging unit
        unit: usize,
        /// Index it names
        target: usize,
    },
}

fn default_radius() -> f32 {
    512.0
}

/// One unit of a scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Controlling side
    pub player: u8,
    /// Foot or mounted
    #[serde(default)]
    pub platform: Platform,
    /// Weapon preset
    #[serde(default)]
    pub weapon: Weapon,
    /// Fighter count (at least 1)
    pub fighters: usize,
    /// Requested ranks (at least 1)
    pub ranks: u32,
    /// Starting center
    pub position: Vec2,
    /// Starting facing in radians
    #[serde(default)]
    pub facing: f32,
    /// Opening move order
    #[serde(default)]
    pub destination: Option<Vec2>,
    /// Move at running speed
    #[serde(default)]
    pub running: bool,
    /// Overrides the preset's training level
    #[serde(default)]
    pub training: Option<f32>,
    /// Index into the scenario's unit list
    #[serde(default)]
    pub charge: Option<usize>,
}

impl UnitSpec {
    fn stats(&self) -> UnitStats {
        let mut stats = UnitStats::preset(self.platform, self.weapon);
        if let Some(training) = self.training {
            stats.training_level = training.clamp(0.0, 1.0);
        }
        stats
    }
}

/// Complete starting setup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Overrides the config's seed
    #[serde(default)]
    pub seed: Option<u64>,
    /// Step loop tunables; defaults when absent
    #[serde(default)]
    pub config: Option<SimulationConfig>,
    /// Radius of the circular field
    #[serde(default = "default_radius")]
    pub battle_radius: f32,
    /// Forest discs
    #[serde(default)]
    pub forests: Vec<Patch>,
    /// Water discs
    #[serde(default)]
    pub water: Vec<Patch>,
    /// Discs no fighter may enter
    #[serde(default)]
    pub impassable: Vec<Patch>,
    /// Units in creation order
    pub units: Vec<UnitSpec>,
}

impl Scenario {
    /// Parse and validate a JSON scenario.
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if let Some(config) = &self.config {
            config.validate()?;
        }
        if !(self.battle_radius.is_finite() && self.battle_radius > 0.0) {
            return Err(ScenarioError::InvalidRadius(self.battle_radius));
        }

        for (i, spec) in self.units.iter().enumerate() {
            if spec.fighters == 0 {
                return Err(ScenarioError::EmptyUnit(i));
            }
            if spec.ranks == 0 {
                return Err(ScenarioError::NoRanks(i));
            }
            let finite = spec.position.is_finite()
                && spec.facing.is_finite()
                && spec.destination.map_or(true, Vec2::is_finite);
            if !finite {
                return Err(ScenarioError::NonFinite(i));
            }
            if let Some(target) = spec.charge {
                if target >= self.units.len() {
                    return Err(ScenarioError::UnknownTarget { unit: i, target });
                }
            }
        }

        Ok(())
    }

    /// Effective simulation config.
    pub fn simulation_config(&self) -> SimulationConfig {
        let mut config = self.config.clone().unwrap_or_default();
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }

    /// Field described by the scenario.
    pub fn terrain(&self) -> FlatTerrain {
        let mut terrain = FlatTerrain::new(self.battle_radius);
        terrain.forests = self.forests.clone();
        terrain.water = self.water.clone();
        terrain.impassable = self.impassable.clone();
        terrain
    }

    /// Create a simulator with every unit placed and commanded.
    pub fn build(&self) -> Result<BattleSimulator, ScenarioError> {
        self.validate()?;
        let mut sim = BattleSimulator::new(self.simulation_config(), self.terrain())?;

        let ids: Vec<UnitId> = self
            .units
            .iter()
            .map(|spec| {
                sim.add_unit(
                    PlayerId(spec.player),
                    spec.stats(),
                    spec.fighters,
                    spec.ranks,
                    spec.position,
                    spec.facing,
                )
            })
            .collect();

        for (spec, &id) in self.units.iter().zip(&ids) {
            let mut command = Command::stand(spec.position, spec.facing).running(spec.running);
            if let Some(destination) = spec.destination {
                command = command.move_to(destination);
            }
            if let Some(target) = spec.charge.and_then(|t| ids.get(t)) {
                command = command.charge(*target);
            }
            sim.set_command(id, command);
        }

        Ok(sim)
    }

    /// Two-sided skirmish: spears and archers against a sword line with
    /// cavalry support.
    pub fn skirmish(seed: u64) -> Self {
        let unit = |player, platform, weapon, fighters, ranks, x: f32, y: f32, facing| UnitSpec {
            player,
            platform,
            weapon,
            fighters,
            ranks,
            position: Vec2::new(x, y),
            facing,
            destination: None,
            running: false,
            training: None,
            charge: None,
        };

        let mut units = vec![
            unit(0, Platform::Infantry, Weapon::Spear, 48, 4, -60.0, 0.0, 0.0),
            unit(0, Platform::Infantry, Weapon::Bow, 24, 2, -75.0, 25.0, 0.0),
            unit(1, Platform::Infantry, Weapon::Sword, 48, 4, 60.0, 0.0, PI),
            unit(1, Platform::Cavalry, Weapon::Sword, 16, 2, 70.0, -30.0, PI),
        ];
        units[0].destination = Some(Vec2::new(-10.0, 0.0));
        units[2].destination = Some(Vec2::new(10.0, 0.0));
        units[3].charge = Some(1);
        units[3].running = true;

        Self {
            seed: Some(seed),
            config: None,
            battle_radius: 300.0,
            forests: vec![Patch { center: Vec2::new(0.0, 60.0), radius: 20.0 }],
            water: Vec::new(),
            impassable: Vec::new(),
            units,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "seed": 7,
        "battle_radius": 200.0,
        "units": [
            { "player": 0, "weapon": "Spear", "fighters": 20, "ranks": 4,
              "position": { "x": -40.0, "y": 0.0 },
              "destination": { "x": -10.0, "y": 0.0 }, "charge": 1 },
            { "player": 1, "platform": "Cavalry", "fighters": 8, "ranks": 2,
              "position": { "x": 40.0, "y": 0.0 }, "facing": 3.14159, "training": 0.9 }
        ]
    }"#;

    #[test]
    fn test_parse_and_build() {
        let scenario = Scenario::from_json_str(SAMPLE).unwrap();
        assert_eq!(scenario.units.len(), 2);
        assert_eq!(scenario.simulation_config().seed, 7);

        let sim = scenario.build().unwrap();
        assert_eq!(sim.units().len(), 2);
        let spears = &sim.units()[0];
        assert_eq!(spears.stats.weapon, Weapon::Spear);
        assert_eq!(spears.command.melee_target, Some(sim.units()[1].id));
        assert_eq!(spears.command.destination(), Some(Vec2::new(-10.0, 0.0)));
        assert_eq!(sim.units()[1].stats.training_level, 0.9);
        assert_eq!(sim.terrain().bounds().radius, 200.0);
    }

    #[test]
    fn test_rejects_empty_unit() {
        let json = r#"{ "units": [ { "player": 0, "fighters": 0, "ranks": 1,
            "position": { "x": 0.0, "y": 0.0 } } ] }"#;
        assert!(matches!(Scenario::from_json_str(json), Err(ScenarioError::EmptyUnit(0))));
    }

    #[test]
    fn test_rejects_zero_ranks_and_bad_target() {
        let mut scenario = Scenario::skirmish(1);
        scenario.units[1].ranks = 0;
        assert!(matches!(scenario.validate(), Err(ScenarioError::NoRanks(1))));

        let mut scenario = Scenario::skirmish(1);
        scenario.units[0].charge = Some(10);
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::UnknownTarget { unit: 0, target: 10 })
        ));
    }

    #[test]
    fn test_rejects_bad_config() {
        let json = r#"{ "config": { "time_step": -1.0 }, "units": [] }"#;
        assert!(matches!(Scenario::from_json_str(json), Err(ScenarioError::Config(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(Scenario::from_json_str("[1, 2"), Err(ScenarioError::Parse(_))));
    }

    #[test]
    fn test_skirmish_round_trips_through_json() {
        let scenario = Scenario::skirmish(99);
        let json = serde_json::to_string(&scenario).unwrap();
        let parsed = Scenario::from_json_str(&json).unwrap();
        assert_eq!(parsed, scenario);
    }
}
