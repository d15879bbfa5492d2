//! Battle Logic Module
//!
//! Units, fighters and the step loop. Deterministic for a given seed.
//!
//! ## Module Structure
//!
//! - `unit`, `fighter`, `formation`: entity model
//! - `command`: externally supplied unit intent
//! - `movement`: path following, fighter destinations, position swaps
//! - `rules`: read-only compute pass (next unit and fighter states)
//! - `combat`: melee strikes and missile volleys
//! - `simulator`: fixed-step loop, commit and removal
//! - `state`: battle state and hashing
//! - `events`: step reports, casualties, listeners
//! - `terrain`: terrain query trait and a flat field
//! - `config`, `scenario`: tunables and JSON setups

pub mod unit;
pub mod fighter;
pub mod formation;
pub mod command;
pub mod movement;
pub mod terrain;
pub mod events;
pub mod config;
pub mod state;
pub mod rules;
pub mod combat;
pub mod simulator;
pub mod scenario;

// Re-export key types
pub use command::Command;
pub use config::{ConfigError, SimulationConfig};
pub use events::{BattleListener, BattleOutcome, Casualty, MeleeOutcome, Shooting, StepReport};
pub use fighter::{Fighter, FighterId, ReadyState};
pub use formation::Formation;
pub use scenario::{Scenario, ScenarioError};
pub use simulator::{AdvanceResult, BattleSimulator};
pub use state::BattleState;
pub use terrain::{BattleBounds, FlatTerrain, TerrainSurface};
pub use unit::{Platform, PlayerId, Unit, UnitId, UnitMode, UnitStats, Weapon};
