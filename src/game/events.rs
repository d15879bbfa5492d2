//! Battle Events
//!
//! Records produced by a step for rendering, audio and scripting.
//! None of these are read back by the simulation except [`Shooting`],
//! which also tracks in-flight volleys.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::fighter::FighterId;
use crate::game::unit::{Platform, PlayerId, UnitId, Weapon};

/// One missile in a volley.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Launch point
    pub origin: Vec2,
    /// Impact point
    pub target: Vec2,
    /// Seconds after the volley before this missile leaves
    pub delay: f32,
    /// Impact already applied
    pub resolved: bool,
}

/// A volley fired by one load cycle of one unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shooting {
    /// Firing unit
    pub unit: UnitId,
    /// Side of the firing unit
    pub player: PlayerId,
    /// Weapon that fired
    pub weapon: Weapon,
    /// One entry per firing fighter
    pub projectiles: Vec<Projectile>,
    /// Seconds until the undelayed projectiles land
    pub time_to_impact: f32,
}

impl Shooting {
    /// Whether every projectile has landed.
    pub fn is_spent(&self) -> bool {
        self.projectiles.iter().all(|p| p.resolved)
    }
}

/// A fighter died.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Casualty {
    /// The fallen fighter
    pub fighter: FighterId,
    /// Unit it belonged to
    pub unit: UnitId,
    /// Where it fell
    pub position: Vec2,
    /// Terrain height at `position`
    pub elevation: f32,
    /// Side it fought for
    pub player: PlayerId,
    /// Foot or mounted
    pub platform: Platform,
}

/// Result of one landed melee strike.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeleeOutcome {
    /// Striking fighter
    pub attacker: FighterId,
    /// Fighter struck
    pub target: FighterId,
    /// Killed if true, stunned otherwise
    pub killed: bool,
}

/// Everything that happened in one discrete step.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Step number (1-based, counted over the whole battle)
    pub step: u64,
    /// Volleys fired this step
    pub shootings: Vec<Shooting>,
    /// Fighters removed as dead this step
    pub casualties: Vec<Casualty>,
    /// Strikes that landed this step
    pub melee: Vec<MeleeOutcome>,
    /// Units destroyed this step
    pub removed_units: Vec<UnitId>,
}

impl StepReport {
    /// Empty report for `step`.
    pub fn new(step: u64) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    /// Nothing happened.
    pub fn is_empty(&self) -> bool {
        self.shootings.is_empty()
            && self.casualties.is_empty()
            && self.melee.is_empty()
            && self.removed_units.is_empty()
    }
}

/// How the battle stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// Both sides still stand
    #[default]
    Undecided,
    /// Only this side has non-routing units left
    Winner(PlayerId),
    /// No side has non-routing units left
    Draw,
}

impl BattleOutcome {
    /// Winner or draw.
    pub fn is_decided(&self) -> bool {
        !matches!(self, BattleOutcome::Undecided)
    }
}

/// Push notifications from the simulator.
pub trait BattleListener {
    /// Called once per discrete step, after removal.
    fn on_step(&mut self, report: &StepReport);

    /// Called once when the outcome becomes decided.
    fn on_outcome(&mut self, _outcome: BattleOutcome) {}
}
