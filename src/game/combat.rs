//! Combat Resolution
//!
//! Melee strikes and missile volleys. These run after commit and are the
//! only parts of a step that draw from the battle RNG. Draw order is arena
//! order, so the same state always consumes the same random sequence.

use std::collections::BTreeSet;

use tracing::trace;

use crate::core::quadtree::QuadTree;
use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::config::SimulationConfig;
use crate::game::events::{MeleeOutcome, Projectile, Shooting};
use crate::game::fighter::{FighterDirectory, FighterId, FighterRef, ReadyState};
use crate::game::unit::{find_unit, Unit};

/// Kill chance multiplier for fighters of missile units.
pub const MISSILE_MELEE_PENALTY: f32 = 0.15;

/// Aim error per unit of distance, before training.
pub const AIM_ERROR: f32 = 0.05;

/// Longest random launch delay within a volley.
pub const MAX_LAUNCH_DELAY: f32 = 0.15;

/// Chance that a landed strike kills.
///
/// `0.5 × (1 + t_att/2) × (1 − t_def/2)`, scaled down for missile troops and
/// up with the attacker's speed.
pub fn kill_probability(attacker_training: f32, defender_training: f32, missile_unit: bool, attacker_speed: f32) -> f32 {
    let mut p = 0.5 * (1.0 + 0.5 * attacker_training) * (1.0 - 0.5 * defender_training);
    if missile_unit {
        p *= MISSILE_MELEE_PENALTY;
    }
    p * (0.9 + attacker_speed / 10.0)
}

// =============================================================================
// MELEE
// =============================================================================

struct Strike {
    attacker: FighterId,
    target: FighterId,
    probability: f32,
}

/// Resolve every committed strike.
///
/// All strikes of the step are gathered before any is applied, so blows
/// are simultaneous. A target receives at most one outcome per step.
pub fn resolve_melee(
    units: &mut [Unit],
    directory: &FighterDirectory,
    rng: &mut DeterministicRng,
    config: &SimulationConfig,
) -> Vec<MeleeOutcome> {
    let mut strikes = Vec::new();
    for unit in units.iter() {
        for fighter in &unit.fighters {
            let Some(target_id) = fighter.state.melee_target else { continue };
            let Some(target) = directory.resolve(units, target_id) else { continue };
            let Some(target_unit) = find_unit(units, target.unit) else { continue };
            strikes.push(Strike {
                attacker: fighter.id,
                target: target_id,
                probability: kill_probability(
                    unit.stats.training_level,
                    target_unit.stats.training_level,
                    unit.stats.is_missile(),
                    fighter.state.velocity.length(),
                ),
            });
        }
    }

    let mut struck = BTreeSet::new();
    let mut outcomes = Vec::with_capacity(strikes.len());
    for strike in strikes {
        let Some(target) = directory.resolve_mut(units, strike.target) else { continue };
        if target.state.casualty || !struck.insert(strike.target) {
            continue;
        }

        let killed = rng.next_bool(strike.probability);
        if killed {
            target.state.casualty = true;
        } else {
            target.state.ready_state = ReadyState::Stunned;
            target.state.stunned_timer = config.stunned_duration;
            target.state.striking_timer = 0.0;
        }
        outcomes.push(MeleeOutcome {
            attacker: strike.attacker,
            target: strike.target,
            killed,
        });
    }

    outcomes
}

// =============================================================================
// MISSILES
// =============================================================================

/// Fire a volley for every unit whose load cycle completed since the last
/// call.
///
/// One projectile per `Prepared` fighter, aimed at a random fighter of the
/// target unit with distance-scaled error.
pub fn trigger_volleys(units: &mut [Unit], rng: &mut DeterministicRng) -> Vec<Shooting> {
    let mut triggered = Vec::new();
    for (i, unit) in units.iter_mut().enumerate() {
        if unit.state.shooting_counter > unit.observed_shooting_counter {
            unit.observed_shooting_counter = unit.state.shooting_counter;
            triggered.push(i);
        }
    }

    let mut volleys = Vec::new();
    for i in triggered {
        let shooter = &units[i];
        let Some(target) = shooter.state.missile_target.and_then(|id| find_unit(units, id)) else {
            continue;
        };
        if target.fighters.is_empty() {
            continue;
        }

        let weapon = shooter.stats.weapon;
        let speed = weapon.projectile_speed();
        if speed <= 0.0 {
            continue;
        }
        let spread = AIM_ERROR * (1.5 - shooter.stats.training_level);

        let mut projectiles = Vec::new();
        let mut total_distance = 0.0;
        for fighter in shooter
            .fighters
            .iter()
            .filter(|f| f.state.ready_state == ReadyState::Prepared)
        {
            let origin = fighter.state.position;
            let Some(aimed) = rng.choose(&target.fighters) else { break };
            let aim = aimed.state.position;
            let distance = origin.distance(aim);

            let error = rng.next_f32() * distance * spread;
            let impact: Vec2 = aim + rng.random_direction() * error;
            let delay = rng.next_f32() * MAX_LAUNCH_DELAY;

            total_distance += distance;
            projectiles.push(Projectile {
                origin,
                target: impact,
                delay,
                resolved: false,
            });
        }

        if projectiles.is_empty() {
            continue;
        }

        let time_to_impact = total_distance / projectiles.len() as f32 / speed;
        trace!(
            unit = shooter.id.0,
            target = target.id.0,
            projectiles = projectiles.len(),
            time_to_impact,
            "volley fired"
        );
        volleys.push(Shooting {
            unit: shooter.id,
            player: shooter.player,
            weapon,
            projectiles,
            time_to_impact,
        });
    }

    volleys
}

/// Age in-flight volleys by `dt` and land every projectile whose time has
/// come. Spent volleys are dropped. Returns the number of fighters hit.
///
/// Hits are found in the fighter index built at the start of the step;
/// friend and foe alike are hit.
pub fn resolve_volleys(
    shootings: &mut Vec<Shooting>,
    units: &mut [Unit],
    fighter_index: &QuadTree<FighterRef>,
    dt: f32,
) -> usize {
    let mut hits = 0;

    for shooting in shootings.iter_mut() {
        shooting.time_to_impact -= dt;
        let time_to_impact = shooting.time_to_impact;
        let radius = shooting.weapon.hit_radius();

        for projectile in shooting.projectiles.iter_mut().filter(|p| !p.resolved) {
            if time_to_impact + projectile.delay > 0.0 {
                continue;
            }
            projectile.resolved = true;

            let at = projectile.target;
            for r in fighter_index.find(at.x, at.y, radius) {
                let Some(fighter) = units
                    .get_mut(r.unit as usize)
                    .and_then(|u| u.fighters.get_mut(r.slot as usize))
                else {
                    continue;
                };
                if !fighter.state.casualty {
                    fighter.state.casualty = true;
                    hits += 1;
                }
            }
        }
    }

    shootings.retain(|s| !s.is_spent());
    hits
}
