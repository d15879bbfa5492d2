//! Units
//!
//! A unit is a group of fighters sharing stats, formation and command.
//! Units own their fighters in a contiguous array; the array only ever
//! shrinks, through the end-of-step compaction.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::vec2::Vec2;
use crate::game::command::Command;
use crate::game::fighter::{Fighter, FighterId};
use crate::game::formation::Formation;

/// Morale at or below which a unit routs.
pub const ROUTING_MORALE: f32 = 0.0;

/// Look up a unit in an id-sorted slice.
#[inline]
pub fn find_unit(units: &[Unit], id: UnitId) -> Option<&Unit> {
    units
        .binary_search_by_key(&id, |u| u.id)
        .ok()
        .map(|i| &units[i])
}

/// Controlling side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

/// Stable unit identifier. Never reused within a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// How fighters move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Platform {
    /// On foot
    #[default]
    Infantry = 0,
    /// Mounted
    Cavalry = 1,
}

/// What fighters carry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Weapon {
    /// Short reach melee
    #[default]
    Sword = 0,
    /// Long reach melee
    Spear = 1,
    /// Slow, long-ranged missiles
    Bow = 2,
    /// Fast, shorter-ranged missiles
    Arquebus = 3,
}

impl Weapon {
    /// Whether the weapon fires volleys.
    pub const fn is_missile(self) -> bool {
        matches!(self, Weapon::Bow | Weapon::Arquebus)
    }

    /// Projectile speed in world units per second (0 for melee weapons).
    pub const fn projectile_speed(self) -> f32 {
        match self {
            Weapon::Bow => 75.0,
            Weapon::Arquebus => 750.0,
            Weapon::Sword | Weapon::Spear => 0.0,
        }
    }

    /// Radius around an impact point in which fighters are hit.
    pub const fn hit_radius(self) -> f32 {
        match self {
            Weapon::Bow => 0.45,
            Weapon::Arquebus => 0.3,
            Weapon::Sword | Weapon::Spear => 0.0,
        }
    }
}

/// Per-battle constant unit configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Foot or mounted
    pub platform: Platform,
    /// Carried weapon
    pub weapon: Weapon,
    /// Distance from a fighter to its weapon tip
    pub weapon_reach: f32,
    /// 0 (levy) to 1 (veteran)
    pub training_level: f32,
    /// Speed when walking
    pub walking_speed: f32,
    /// Speed when running
    pub running_speed: f32,
    /// Speed when fleeing
    pub routing_speed: f32,
    /// Seconds from Readying to Prepared
    pub readying_duration: f32,
    /// Seconds a strike takes to land
    pub striking_duration: f32,
    /// Seconds per load cycle
    pub loading_time: f32,
    /// Closest target distance for volleys
    pub minimum_range: f32,
    /// Farthest target distance; 0 for melee units
    pub maximum_range: f32,
    /// Spacing between files
    pub file_distance: f32,
    /// Spacing between ranks
    pub rank_distance: f32,
}

impl UnitStats {
    /// Standard stats for a platform/weapon combination.
    pub fn preset(platform: Platform, weapon: Weapon) -> Self {
        let mut stats = Self {
            platform,
            weapon,
            weapon_reach: 1.0,
            training_level: 0.5,
            walking_speed: 7.0,
            running_speed: 14.0,
            routing_speed: 14.0,
            readying_duration: 0.75,
            striking_duration: 0.5,
            loading_time: 0.0,
            minimum_range: 0.0,
            maximum_range: 0.0,
            file_distance: 1.1,
            rank_distance: 1.7,
        };

        match weapon {
            Weapon::Sword => {}
            Weapon::Spear => stats.weapon_reach = 5.0,
            Weapon::Bow => {
                stats.maximum_range = 150.0;
                stats.loading_time = 5.0;
            }
            Weapon::Arquebus => {
                stats.maximum_range = 110.0;
                stats.loading_time = 12.0;
            }
        }

        if platform == Platform::Cavalry {
            stats.weapon_reach = stats.weapon_reach.max(2.0);
            stats.walking_speed = 9.0;
            stats.running_speed = 24.0;
            stats.routing_speed = 24.0;
            stats.file_distance = 2.0;
            stats.rank_distance = 3.0;
        }

        stats
    }

    /// Whether the unit fires volleys at all.
    #[inline]
    pub fn is_missile(&self) -> bool {
        self.maximum_range > 0.0
    }
}

/// Movement mode of a unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum UnitMode {
    /// First step only: fighters are placed into their slots
    #[default]
    Initializing = 0,
    /// Holding or forming up at the destination
    Standing = 1,
    /// Following the path cursor
    Moving = 2,
}

/// Authoritative per-step unit snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitState {
    /// Current movement mode
    pub mode: UnitMode,
    /// Mean fighter position
    pub center: Vec2,
    /// Facing angle in radians
    pub direction: f32,
    /// -1 (broken) to 1 (steady)
    pub morale: f32,
    /// Local enemy superiority, -1 to 1
    pub influence: f32,
    /// Seconds into the current load cycle
    pub loading_timer: f32,
    /// Completed load cycles
    pub shooting_counter: u32,
    /// Fighters lost in the last compaction
    pub recent_casualties: u32,
    /// Unit currently shot at
    pub missile_target: Option<UnitId>,
}

impl UnitState {
    /// Fresh state at full morale.
    pub fn new(center: Vec2, direction: f32) -> Self {
        Self {
            mode: UnitMode::Initializing,
            center,
            direction,
            morale: 1.0,
            influence: 0.0,
            loading_timer: 0.0,
            shooting_counter: 0,
            recent_casualties: 0,
            missile_target: None,
        }
    }

    /// Morale broken.
    #[inline]
    pub fn is_routing(&self) -> bool {
        self.morale <= ROUTING_MORALE
    }
}

/// Point the unit's file leaders are walking toward, and the path waypoint
/// it is heading for.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathCursor {
    /// Cursor position
    pub position: Vec2,
    /// Index of the waypoint being approached
    pub waypoint: usize,
}

/// A group of fighters.
#[derive(Clone, Debug, Serialize)]
pub struct Unit {
    /// Stable id
    pub id: UnitId,
    /// Controlling side
    pub player: PlayerId,
    /// Constant stats
    pub stats: UnitStats,
    /// Committed state
    pub state: UnitState,
    /// Staging area between compute and commit
    #[serde(skip)]
    pub next_state: Option<UnitState>,
    /// Current rank/file layout
    pub formation: Formation,
    /// Live fighters in slot order
    pub fighters: Vec<Fighter>,
    /// Fighter count at creation; the array never grows past it
    pub capacity: usize,
    /// Current orders
    pub command: Command,
    /// Path following point for file leaders
    pub cursor: PathCursor,
    /// Shooting counter value the volley trigger last acted on
    pub(crate) observed_shooting_counter: u32,
    /// Casualties removed by the last compaction, read by the next step
    pub(crate) casualties_last_step: u32,
}

impl Unit {
    /// Create a unit with `count` fighters laid out around `center`.
    ///
    /// Fighters receive consecutive ids starting at `first_fighter`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: UnitId,
        player: PlayerId,
        stats: UnitStats,
        count: usize,
        ranks: u32,
        center: Vec2,
        facing: f32,
        first_fighter: u32,
    ) -> Self {
        let formation = Formation::new(ranks, stats.rank_distance, stats.file_distance, count, facing);
        let fighters = (0..count)
            .map(|i| {
                let position = formation.slot_position(center, i);
                Fighter::new(FighterId(first_fighter + i as u32), id, position, facing)
            })
            .collect();

        Self {
            id,
            player,
            stats,
            state: UnitState::new(center, facing),
            next_state: None,
            formation,
            fighters,
            capacity: count,
            command: Command::stand(center, facing),
            cursor: PathCursor { position: center, waypoint: 0 },
            observed_shooting_counter: 0,
            casualties_last_step: 0,
        }
    }

    /// Live fighters.
    #[inline]
    pub fn fighters_count(&self) -> usize {
        self.fighters.len()
    }

    /// Morale broken.
    #[inline]
    pub fn is_routing(&self) -> bool {
        self.state.is_routing()
    }

    /// Current movement speed ignoring terrain.
    pub fn speed(&self) -> f32 {
        if self.state.is_routing() {
            self.stats.routing_speed
        } else if self.command.running {
            self.stats.running_speed
        } else {
            self.stats.walking_speed
        }
    }

    /// Mean of fighter positions, or `None` for an empty unit.
    pub fn mean_position(&self) -> Option<Vec2> {
        if self.fighters.is_empty() {
            return None;
        }
        let sum = self
            .fighters
            .iter()
            .fold(Vec2::ZERO, |acc, f| acc + f.state.position);
        Some(sum * (1.0 / self.fighters.len() as f32))
    }

    /// Replace the command and restart path following from the center.
    pub fn set_command(&mut self, command: Command) {
        self.command = command;
        self.cursor = PathCursor {
            position: self.state.center,
            waypoint: 0,
        };
    }

    /// Re-derive the formation from fighter count and facing.
    pub(crate) fn update_formation(&mut self) {
        self.formation.update(self.fighters.len());
        self.formation.set_direction(self.state.direction);
    }

    /// Replace state with the staged one, if any.
    pub(crate) fn commit(&mut self) {
        if let Some(next) = self.next_state.take() {
            self.state = next;
        }
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        let s = &self.state;
        hasher.update_u32(self.id.0);
        hasher.update_u8(self.player.0);
        hasher.update_u8(s.mode as u8);
        hasher.update_vec2(s.center);
        hasher.update_f32(s.direction);
        hasher.update_f32(s.morale);
        hasher.update_f32(s.influence);
        hasher.update_f32(s.loading_timer);
        hasher.update_u32(s.shooting_counter);
        hasher.update_u32(s.recent_casualties);
        hasher.update_option_u32(s.missile_target.map(|u| u.0));
        hasher.update_vec2(self.cursor.position);
        hasher.update_u32(self.cursor.waypoint as u32);
        hasher.update_u32(self.fighters.len() as u32);
        for fighter in &self.fighters {
            fighter.hash_into(hasher);
        }
    }
}
