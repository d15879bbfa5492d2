//! Compute Pass
//!
//! Derives every unit's and every fighter's next state from the committed
//! state plus the spatial indices built at the start of the step.
//!
//! Nothing here writes to the world or draws random numbers, so the pass
//! gives the same result in any iteration order. With the `parallel`
//! feature it runs across units on the rayon pool.

use std::f32::consts::FRAC_PI_4;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::quadtree::QuadTree;
use crate::core::vec2::Vec2;
use crate::game::config::SimulationConfig;
use crate::game::fighter::{Fighter, FighterId, FighterRef, FighterState, ReadyState};
use crate::game::movement::{next_fighter_destination, terrain_speed_factor, unit_destination};
use crate::game::terrain::TerrainSurface;
use crate::game::unit::{find_unit, Unit, UnitId, UnitMode, UnitState};

/// Fighters closer than this to their steering point stand still.
const MIN_STEER_DISTANCE: f32 = 0.01;

/// Speed above which a moving fighter faces along its velocity.
const FACE_VELOCITY_SPEED: f32 = 0.1;

/// Read-only view of the world for one step.
pub struct StepContext<'a> {
    /// Committed units, sorted by id
    pub units: &'a [Unit],
    /// Fighter bodies
    pub fighter_index: &'a QuadTree<FighterRef>,
    /// Weapon tips of fighters with nonzero reach
    pub weapon_index: &'a QuadTree<FighterRef>,
    /// Ground queries
    pub terrain: &'a dyn TerrainSurface,
    /// Tunables
    pub config: &'a SimulationConfig,
    /// Step length in seconds
    pub dt: f32,
}

impl<'a> StepContext<'a> {
    #[inline]
    fn fighter(&self, r: FighterRef) -> Option<(&'a Unit, &'a Fighter)> {
        let unit = self.units.get(r.unit as usize)?;
        let fighter = unit.fighters.get(r.slot as usize)?;
        Some((unit, fighter))
    }
}

/// Values shared by every fighter of one unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitPlan {
    /// Center of the charged enemy unit, if the charge resolves
    pub charge_center: Option<Vec2>,
    /// Where the unit is heading
    pub destination: Vec2,
    /// Flight direction for routing fighters
    pub flee: Vec2,
}

/// Staged result for one unit and its fighters, in arena order.
pub type StagedUnit = (UnitState, Vec<FighterState>);

// =============================================================================
// UNIT-LEVEL HELPERS
// =============================================================================

/// Center of the unit's charge target, if it resolves to a live enemy.
pub fn charge_center(units: &[Unit], unit: &Unit) -> Option<Vec2> {
    if unit.is_routing() {
        return None;
    }
    let target = find_unit(units, unit.command.melee_target?)?;
    (target.player != unit.player && !target.fighters.is_empty()).then_some(target.state.center)
}

/// Direction away from every enemy unit, weighted by inverse squared
/// distance. Zero when there are no enemies.
pub fn flee_direction(units: &[Unit], unit: &Unit) -> Vec2 {
    let mut away = Vec2::ZERO;
    for enemy in units
        .iter()
        .filter(|u| u.player != unit.player && !u.fighters.is_empty())
    {
        let delta = unit.state.center - enemy.state.center;
        let distance_sq = delta.length_squared();
        if distance_sq > 1e-6 {
            away += delta * (1.0 / distance_sq);
        }
    }
    away.normalize()
}

/// Per-unit values shared by its fighters this step.
pub fn plan_unit(units: &[Unit], unit: &Unit) -> UnitPlan {
    let charge_center = charge_center(units, unit);
    let flee = if unit.is_routing() {
        flee_direction(units, unit)
    } else {
        Vec2::ZERO
    };
    UnitPlan {
        charge_center,
        destination: unit_destination(unit, charge_center),
        flee,
    }
}

/// `(enemies - friends) / (enemies + friends)` around `center`; 0 without
/// enemies.
pub fn influence_at(ctx: &StepContext<'_>, unit: &Unit, center: Vec2) -> f32 {
    let mut friends = 0u32;
    let mut enemies = 0u32;
    for r in ctx.fighter_index.find(center.x, center.y, ctx.config.influence_radius) {
        let Some((other_unit, _)) = ctx.fighter(*r) else { continue };
        if other_unit.player == unit.player {
            friends += 1;
        } else {
            enemies += 1;
        }
    }

    if enemies == 0 {
        0.0
    } else {
        (enemies as f32 - friends as f32) / (enemies + friends) as f32
    }
}

/// Morale after one step.
pub fn next_morale(morale: f32, training: f32, recent_casualties: u32, influence: f32, dt: f32) -> f32 {
    let mut m = morale;
    if recent_casualties > 0 {
        m -= recent_casualties as f32 * (2.0 - training) / 50.0;
    } else if m > -0.2 && m < 1.0 {
        m += (0.1 + training) * dt / 15.0;
    }
    m -= influence.max(0.0) * (1.0 - 0.5 * training) * dt / 10.0;
    m.clamp(-1.0, 1.0)
}

/// Unit to shoot at this step.
///
/// The commanded target wins if it is an enemy in range; otherwise the
/// closest enemy in range inside the firing cone.
pub fn missile_target(units: &[Unit], unit: &Unit, next: &UnitState) -> Option<UnitId> {
    let stats = &unit.stats;
    if unit.command.hold_fire || next.is_routing() || !stats.is_missile() {
        return None;
    }

    let center = next.center;
    let in_range = |target: &Unit| {
        let d = target.state.center.distance(center);
        target.player != unit.player
            && !target.fighters.is_empty()
            && d >= stats.minimum_range
            && d <= stats.maximum_range
    };

    if let Some(target) = unit.command.missile_target.and_then(|id| find_unit(units, id)) {
        if in_range(target) {
            return Some(target.id);
        }
    }

    let facing = Vec2::from_angle(next.direction);
    let cone = FRAC_PI_4.cos();
    units
        .iter()
        .filter(|t| in_range(t))
        .filter(|t| facing.dot((t.state.center - center).normalize()) >= cone)
        .map(|t| (t.state.center.distance_squared(center), t.id))
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, id)| id)
}

// =============================================================================
// UNIT STATE
// =============================================================================

/// Next committed state of `unit`.
pub fn next_unit_state(ctx: &StepContext<'_>, unit: &Unit, plan: &UnitPlan) -> UnitState {
    let current = &unit.state;
    let mut next = current.clone();
    let dt = ctx.dt;

    // Facing always follows the command.
    next.direction = unit.command.facing;

    if current.mode != UnitMode::Initializing {
        if let Some(center) = unit.mean_position() {
            next.center = center;
        }
    }

    next.mode = match current.mode {
        UnitMode::Initializing => UnitMode::Standing,
        UnitMode::Standing | UnitMode::Moving => {
            if next.center.distance(plan.destination) > ctx.config.moving_threshold {
                UnitMode::Moving
            } else {
                UnitMode::Standing
            }
        }
    };

    let training = unit.stats.training_level;
    next.influence = influence_at(ctx, unit, next.center);
    next.recent_casualties = unit.casualties_last_step;
    next.morale = next_morale(current.morale, training, next.recent_casualties, next.influence, dt);

    next.missile_target = missile_target(ctx.units, unit, &next);
    if unit.stats.is_missile() && !next.is_routing() {
        let loading_time = unit.stats.loading_time;
        next.loading_timer = (next.loading_timer + dt).min(loading_time);
        if next.loading_timer >= loading_time
            && next.missile_target.is_some()
            && next.mode == UnitMode::Standing
        {
            next.shooting_counter += 1;
            next.loading_timer = 0.0;
        }
    }

    next
}

// =============================================================================
// FIGHTER STATE
// =============================================================================

/// Nearest enemy fighter within the search radius of this fighter's weapon
/// tip, with its position.
pub fn find_opponent(ctx: &StepContext<'_>, unit: &Unit, fighter: &Fighter) -> Option<(FighterId, Vec2)> {
    let tip = fighter.state.weapon_tip(unit.stats.weapon_reach);
    let mut best: Option<(f32, FighterId, Vec2)> = None;

    for r in ctx.fighter_index.find(tip.x, tip.y, ctx.config.opponent_search_radius) {
        let Some((other_unit, other)) = ctx.fighter(*r) else { continue };
        if other_unit.player == unit.player || other.is_casualty() {
            continue;
        }
        let d = other.state.position.distance_squared(tip);
        let closer = match best {
            None => true,
            Some((best_d, best_id, _)) => d < best_d || (d == best_d && other.id < best_id),
        };
        if closer {
            best = Some((d, other.id, other.state.position));
        }
    }

    best.map(|(_, id, position)| (id, position))
}

/// Mean unit push away from crowding fighters and enemy weapon tips,
/// scaled by the nudge factor.
pub fn avoidance_nudge(ctx: &StepContext<'_>, unit: &Unit, fighter: &Fighter) -> Vec2 {
    let position = fighter.state.position;
    let mut push = Vec2::ZERO;
    let mut count = 0u32;

    for r in ctx.fighter_index.find(position.x, position.y, ctx.config.fighter_separation) {
        let Some((_, other)) = ctx.fighter(*r) else { continue };
        if other.id == fighter.id {
            continue;
        }
        push += (position - other.state.position).normalize();
        count += 1;
    }

    for r in ctx.weapon_index.find(position.x, position.y, ctx.config.weapon_avoidance) {
        let Some((other_unit, other)) = ctx.fighter(*r) else { continue };
        if other_unit.player == unit.player {
            continue;
        }
        push += (position - other.state.weapon_tip(other_unit.stats.weapon_reach)).normalize();
        count += 1;
    }

    if count == 0 {
        Vec2::ZERO
    } else {
        push * (ctx.config.avoidance_nudge / count as f32)
    }
}

/// Advance the readiness state machine by one step.
pub fn advance_readiness(next: &mut FighterState, unit: &Unit, has_opponent: bool, dt: f32) {
    let countdown = |timer: f32| (timer - dt).max(0.0);
    let stats = &unit.stats;

    if unit.is_routing() {
        next.ready_state = ReadyState::Unready;
        next.opponent = None;
        return;
    }

    match next.ready_state {
        ReadyState::Unready => {
            if unit.state.mode == UnitMode::Standing || has_opponent {
                next.ready_state = ReadyState::Readying;
                next.readying_timer = stats.readying_duration;
            }
        }
        ReadyState::Readying => {
            next.readying_timer = countdown(next.readying_timer);
            if next.readying_timer <= 0.0 {
                next.ready_state = ReadyState::Prepared;
            }
        }
        ReadyState::Prepared => {
            if has_opponent {
                next.ready_state = ReadyState::Striking;
                next.striking_timer = stats.striking_duration;
            } else if unit.state.mode == UnitMode::Moving {
                next.ready_state = ReadyState::Unready;
            }
        }
        ReadyState::Striking => {
            next.striking_timer = countdown(next.striking_timer);
            if next.striking_timer <= 0.0 {
                next.melee_target = next.opponent;
                next.ready_state = ReadyState::Readying;
                next.readying_timer = stats.readying_duration;
            }
        }
        ReadyState::Stunned => {
            next.stunned_timer = countdown(next.stunned_timer);
            if next.stunned_timer <= 0.0 {
                next.ready_state = ReadyState::Readying;
                next.readying_timer = stats.readying_duration;
            }
        }
    }
}

/// Next committed state of fighter `index` of `unit`.
pub fn next_fighter_state(ctx: &StepContext<'_>, unit: &Unit, index: usize, plan: &UnitPlan) -> FighterState {
    let fighter = &unit.fighters[index];
    let current = &fighter.state;
    let mut next = current.clone();
    next.melee_target = None;
    let dt = ctx.dt;

    if unit.state.mode == UnitMode::Initializing {
        let slot = unit.formation.slot_position(unit.state.center, index);
        next.position = slot;
        next.destination = slot;
        next.velocity = Vec2::ZERO;
        next.direction = unit.state.direction;
        return next;
    }

    // Movement
    let destination = next_fighter_destination(unit, index, plan.destination, plan.flee);
    let speed = unit.speed() * terrain_speed_factor(ctx.terrain, unit.stats.platform, current.position);
    let delta = destination - current.position;
    let distance = delta.length();
    let mut velocity = if distance < MIN_STEER_DISTANCE {
        Vec2::ZERO
    } else {
        delta * (speed.min(distance / dt) / distance)
    };

    let mut position = current.position + velocity * dt + avoidance_nudge(ctx, unit, fighter);
    if ctx.terrain.is_impassable(position) {
        position = current.position;
        velocity = Vec2::ZERO;
    }
    next.position = position;
    next.velocity = velocity;
    next.destination = destination;

    // Engagement
    let opponent = if unit.is_routing() {
        None
    } else {
        find_opponent(ctx, unit, fighter)
    };
    next.opponent = opponent.map(|(id, _)| id);

    next.direction = match opponent {
        Some((_, target)) if target.distance_squared(position) > 1e-6 => (target - position).angle(),
        _ if unit.state.mode == UnitMode::Moving && velocity.length() > FACE_VELOCITY_SPEED => velocity.angle(),
        _ => unit.state.direction,
    };

    advance_readiness(&mut next, unit, opponent.is_some(), dt);
    next
}

// =============================================================================
// WHOLE PASS
// =============================================================================

fn compute_unit(ctx: &StepContext<'_>, unit: &Unit) -> StagedUnit {
    let plan = plan_unit(ctx.units, unit);
    let state = next_unit_state(ctx, unit, &plan);
    let fighters = (0..unit.fighters.len())
        .map(|i| next_fighter_state(ctx, unit, i, &plan))
        .collect();
    (state, fighters)
}

/// Compute next states for every unit, in arena order.
#[cfg(not(feature = "parallel"))]
pub fn compute_next_states(ctx: &StepContext<'_>) -> Vec<StagedUnit> {
    ctx.units.iter().map(|unit| compute_unit(ctx, unit)).collect()
}

/// Compute next states for every unit, in arena order.
#[cfg(feature = "parallel")]
pub fn compute_next_states(ctx: &StepContext<'_>) -> Vec<StagedUnit> {
    ctx.units.par_iter().map(|unit| compute_unit(ctx, unit)).collect()
}
