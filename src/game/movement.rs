//! Movement Rules
//!
//! Pure functions steering units along their path and fighters toward
//! their place in the formation. Nothing here touches another unit or
//! consumes randomness.

use crate::core::vec2::Vec2;
use crate::game::config::SimulationConfig;
use crate::game::terrain::TerrainSurface;
use crate::game::unit::{Platform, Unit, UnitMode};

/// Extra distance the path cursor may lead the unit center by.
pub const CURSOR_LEAD_SLACK: f32 = 4.0;

/// Summed slot-distance gain a swap must exceed.
pub const SWAP_THRESHOLD: f32 = 0.5;

/// How far ahead a routing fighter aims along its flight direction.
pub const FLEE_DISTANCE: f32 = 10.0;

/// Where the unit is heading: the charge target's center, else the last
/// waypoint, else where it already stands.
pub fn unit_destination(unit: &Unit, charge_center: Option<Vec2>) -> Vec2 {
    charge_center
        .or_else(|| unit.command.destination())
        .unwrap_or(unit.state.center)
}

/// Advance the unit's path cursor by one step of travel.
///
/// The cursor holds still while it is more than half the formation depth
/// (plus slack) ahead of the center, so the fighters can catch up.
pub fn advance_time(unit: &mut Unit, charge_center: Option<Vec2>, config: &SimulationConfig, dt: f32) {
    let charge_path;
    let path: &[Vec2] = match charge_center {
        Some(center) => {
            charge_path = [center];
            &charge_path
        }
        None => &unit.command.path,
    };

    let Some(last) = path.len().checked_sub(1) else {
        unit.cursor.position = unit.state.center;
        unit.cursor.waypoint = 0;
        return;
    };

    let lead_limit = unit.formation.depth() / 2.0 + CURSOR_LEAD_SLACK;
    if unit.cursor.position.distance(unit.state.center) > lead_limit {
        return;
    }

    let mut budget = unit.speed() * dt;
    let mut waypoint = unit.cursor.waypoint.min(last);
    let mut position = unit.cursor.position;

    loop {
        let target = path[waypoint];
        let distance = position.distance(target);

        if distance <= config.waypoint_tolerance || distance <= budget {
            budget = (budget - distance).max(0.0);
            position = target;
            if waypoint < last {
                waypoint += 1;
                continue;
            }
            break;
        }

        position += (target - position) * (budget / distance);
        break;
    }

    unit.cursor.position = position;
    unit.cursor.waypoint = waypoint;
}

/// Unit vector from the unit center toward its cursor, or the unit's
/// facing when the cursor sits on the center.
pub fn travel_bearing(unit: &Unit) -> Vec2 {
    let delta = unit.cursor.position - unit.state.center;
    if delta.length_squared() > 1e-4 {
        delta.normalize()
    } else {
        Vec2::from_angle(unit.state.direction)
    }
}

/// Point fighter `index` of `unit` should steer toward this step.
///
/// File leaders follow the path cursor; everyone behind them follows the
/// fighter one rank ahead, so only the front rank paths.
pub fn next_fighter_destination(unit: &Unit, index: usize, destination: Vec2, flee: Vec2) -> Vec2 {
    let Some(fighter) = unit.fighters.get(index) else {
        return destination;
    };
    let formation = &unit.formation;

    if unit.state.mode == UnitMode::Initializing {
        return formation.slot_position(unit.state.center, index);
    }

    if unit.is_routing() {
        return fighter.state.position + flee * FLEE_DISTANCE;
    }

    match unit.state.mode {
        UnitMode::Moving => {
            let bearing = travel_bearing(unit);
            let (rank, file) = formation.slot(index);
            match index.checked_sub(1) {
                Some(ahead) if rank > 0 => {
                    unit.fighters[ahead].state.position - bearing * formation.rank_distance
                }
                _ => {
                    let right = -bearing.perpendicular();
                    unit.cursor.position + right * (formation.file_offset(file) * formation.file_distance)
                }
            }
        }
        UnitMode::Standing | UnitMode::Initializing => formation.slot_position(destination, index),
    }
}

/// Swap adjacent same-file fighters when that brings both noticeably
/// closer to their slots. Returns the number of swaps.
pub fn swap_fighters(unit: &mut Unit, anchor: Vec2) -> usize {
    let ranks = unit.formation.number_of_ranks.max(1) as usize;
    let mut swaps = 0;

    for i in 0..unit.fighters.len().saturating_sub(1) {
        let j = i + 1;
        if j % ranks == 0 {
            continue;
        }

        let slot_i = unit.formation.slot_position(anchor, i);
        let slot_j = unit.formation.slot_position(anchor, j);
        let pos_i = unit.fighters[i].state.position;
        let pos_j = unit.fighters[j].state.position;

        let current = pos_i.distance(slot_i) + pos_j.distance(slot_j);
        let swapped = pos_j.distance(slot_i) + pos_i.distance(slot_j);
        if current - swapped > SWAP_THRESHOLD {
            unit.fighters.swap(i, j);
            swaps += 1;
        }
    }

    swaps
}

/// Speed multiplier for the ground at `position`.
pub fn terrain_speed_factor(terrain: &dyn TerrainSurface, platform: Platform, position: Vec2) -> f32 {
    let mut factor = 1.0;
    if terrain.is_forest(position) {
        factor *= match platform {
            Platform::Cavalry => 0.5,
            Platform::Infantry => 0.8,
        };
    }
    if terrain.is_water(position) {
        factor *= 0.5;
    }
    factor
}
