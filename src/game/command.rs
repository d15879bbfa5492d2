//! Unit Commands
//!
//! Externally supplied intent for a unit. The simulation only reads
//! commands; the one exception is a routing unit, whose command is
//! overwritten at commit time so it cannot re-engage.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::unit::UnitId;

/// What a unit has been told to do.
///
/// Target ids that no longer resolve (the unit was destroyed, or never
/// existed) are treated as "no target" rather than as an error.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Command {
    /// Waypoints to follow; the last one is the destination.
    /// An empty path means "stay where you are".
    pub path: Vec<Vec2>,

    /// Facing angle (radians) the unit adopts
    pub facing: f32,

    /// Move at running speed instead of walking speed
    pub running: bool,

    /// Unit to charge; overrides `path` while it resolves
    pub melee_target: Option<UnitId>,

    /// Preferred unit to shoot at
    pub missile_target: Option<UnitId>,

    /// Suppress missile fire entirely
    pub hold_fire: bool,
}

impl Command {
    /// Stand at `position` facing `facing`.
    pub fn stand(position: Vec2, facing: f32) -> Self {
        Self {
            path: vec![position],
            facing,
            ..Self::default()
        }
    }

    /// Replace the path with a single destination.
    pub fn move_to(mut self, destination: Vec2) -> Self {
        self.path = vec![destination];
        self
    }

    /// Replace the path with a list of waypoints.
    pub fn along_path(mut self, path: Vec<Vec2>) -> Self {
        self.path = path;
        self
    }

    /// Set the facing angle.
    pub fn facing(mut self, facing: f32) -> Self {
        self.facing = facing;
        self
    }

    /// Set running.
    pub fn running(mut self, running: bool) -> Self {
        self.running = running;
        self
    }

    /// Charge a unit.
    pub fn charge(mut self, target: UnitId) -> Self {
        self.melee_target = Some(target);
        self
    }

    /// Prefer a unit as missile target.
    pub fn shoot_at(mut self, target: UnitId) -> Self {
        self.missile_target = Some(target);
        self
    }

    /// Set hold fire.
    pub fn hold_fire(mut self, hold_fire: bool) -> Self {
        self.hold_fire = hold_fire;
        self
    }

    /// Final waypoint, if any.
    #[inline]
    pub fn destination(&self) -> Option<Vec2> {
        self.path.last().copied()
    }

    /// Override applied to routing units: stay put, stop charging.
    pub(crate) fn clear_for_rout(&mut self, center: Vec2) {
        self.path.clear();
        self.path.push(center);
        self.melee_target = None;
    }

    /// Drop references to a destroyed unit.
    pub(crate) fn forget_unit(&mut self, unit: UnitId) {
        if self.melee_target == Some(unit) {
            self.melee_target = None;
        }
        if self.missile_target == Some(unit) {
            self.missile_target = None;
        }
    }
}
