//! Fighters
//!
//! Individual combatants. A fighter lives in exactly one unit's fighter
//! array for its whole life and is referenced elsewhere only by its
//! stable [`FighterId`].

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::vec2::Vec2;
use crate::game::unit::{Unit, UnitId};

/// Stable fighter identifier. Never reused within a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FighterId(pub u32);

/// Melee readiness sub-state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReadyState {
    /// Not ready to fight
    #[default]
    Unready = 0,
    /// Raising weapon; becomes Prepared when the timer runs out
    Readying = 1,
    /// Ready to strike the next opponent in reach
    Prepared = 2,
    /// Swinging; the blow lands when the timer runs out
    Striking = 3,
    /// Struck but not killed
    Stunned = 4,
}

/// Authoritative per-step fighter snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FighterState {
    /// World position
    pub position: Vec2,
    /// Velocity used for the last move
    pub velocity: Vec2,
    /// Facing angle in radians
    pub direction: f32,
    /// Point the fighter steered toward this step
    pub destination: Vec2,
    /// Melee readiness
    pub ready_state: ReadyState,
    /// Seconds until Prepared
    pub readying_timer: f32,
    /// Seconds until the strike lands
    pub striking_timer: f32,
    /// Seconds until the stun wears off
    pub stunned_timer: f32,
    /// Nearest enemy in weapon reach, found by the opponent scan
    pub opponent: Option<FighterId>,
    /// Fighter the last completed strike lands on
    pub melee_target: Option<FighterId>,
    /// Marked dead this step; removed at the end of the step
    pub casualty: bool,
}

impl FighterState {
    /// Fresh state standing at `position`.
    pub fn new(position: Vec2, direction: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            direction,
            destination: position,
            ready_state: ReadyState::Unready,
            readying_timer: 0.0,
            striking_timer: 0.0,
            stunned_timer: 0.0,
            opponent: None,
            melee_target: None,
            casualty: false,
        }
    }

    /// Unit facing vector.
    #[inline]
    pub fn facing(&self) -> Vec2 {
        Vec2::from_angle(self.direction)
    }

    /// Point `reach` ahead of the fighter along its facing.
    #[inline]
    pub fn weapon_tip(&self, reach: f32) -> Vec2 {
        self.position + self.facing() * reach
    }
}

/// A combatant.
#[derive(Clone, Debug, Serialize)]
pub struct Fighter {
    /// Stable id
    pub id: FighterId,
    /// Owning unit
    pub unit: UnitId,
    /// Committed state
    pub state: FighterState,
    /// Staging area between compute and commit
    #[serde(skip)]
    pub next_state: Option<FighterState>,
}

impl Fighter {
    pub(crate) fn new(id: FighterId, unit: UnitId, position: Vec2, direction: f32) -> Self {
        Self {
            id,
            unit,
            state: FighterState::new(position, direction),
            next_state: None,
        }
    }

    /// Marked dead this step.
    #[inline]
    pub fn is_casualty(&self) -> bool {
        self.state.casualty
    }

    /// Replace state with the staged one, if any.
    #[inline]
    pub(crate) fn commit(&mut self) {
        if let Some(next) = self.next_state.take() {
            self.state = next;
        }
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        let s = &self.state;
        hasher.update_u32(self.id.0);
        hasher.update_vec2(s.position);
        hasher.update_vec2(s.velocity);
        hasher.update_f32(s.direction);
        hasher.update_u8(s.ready_state as u8);
        hasher.update_f32(s.readying_timer);
        hasher.update_f32(s.striking_timer);
        hasher.update_f32(s.stunned_timer);
        hasher.update_option_u32(s.opponent.map(|f| f.0));
        hasher.update_option_u32(s.melee_target.map(|f| f.0));
        hasher.update_bool(s.casualty);
    }
}

// =============================================================================
// DIRECTORY
// =============================================================================

/// Location of a fighter in the unit arena: unit index and slot index.
///
/// Only meaningful until the next compaction; the spatial indices carry
/// these and are rebuilt every step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FighterRef {
    /// Index into the unit array
    pub unit: u32,
    /// Index into the unit's fighter array
    pub slot: u32,
}

/// Maps stable fighter ids to their current [`FighterRef`].
///
/// Rebuilt whenever the arena layout changes. An id whose fighter was
/// removed resolves to `None`.
#[derive(Clone, Debug, Default)]
pub struct FighterDirectory {
    slots: Vec<Option<FighterRef>>,
}

impl FighterDirectory {
    /// Empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-index every fighter in `units`.
    pub fn rebuild(&mut self, units: &[Unit]) {
        self.slots.iter_mut().for_each(|s| *s = None);

        for (u, unit) in units.iter().enumerate() {
            for (f, fighter) in unit.fighters.iter().enumerate() {
                let id = fighter.id.0 as usize;
                if id >= self.slots.len() {
                    self.slots.resize(id + 1, None);
                }
                self.slots[id] = Some(FighterRef {
                    unit: u as u32,
                    slot: f as u32,
                });
            }
        }
    }

    /// Current location of `id`.
    #[inline]
    pub fn locate(&self, id: FighterId) -> Option<FighterRef> {
        self.slots.get(id.0 as usize).copied().flatten()
    }

    /// Resolve `id` to the fighter itself.
    pub fn resolve<'a>(&self, units: &'a [Unit], id: FighterId) -> Option<&'a Fighter> {
        let loc = self.locate(id)?;
        let fighter = units.get(loc.unit as usize)?.fighters.get(loc.slot as usize)?;
        (fighter.id == id).then_some(fighter)
    }

    /// Mutable variant of [`resolve`](Self::resolve).
    pub fn resolve_mut<'a>(&self, units: &'a mut [Unit], id: FighterId) -> Option<&'a mut Fighter> {
        let loc = self.locate(id)?;
        let fighter = units.get_mut(loc.unit as usize)?.fighters.get_mut(loc.slot as usize)?;
        (fighter.id == id).then_some(fighter)
    }
}
