//! Battle State
//!
//! Everything the step loop reads and writes between steps.
//! Units are kept sorted by id so iteration order is deterministic and
//! id lookup is a binary search.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::events::{BattleOutcome, Shooting};
use crate::game::fighter::FighterId;
use crate::game::unit::{PlayerId, Unit, UnitId, UnitStats};

/// Complete battle state.
#[derive(Clone, Debug, Serialize)]
pub struct BattleState {
    /// Discrete steps run so far
    pub step: u64,
    /// Simulated seconds (steps × time step)
    pub time: f64,
    /// Seed the RNG started from
    pub rng_seed: u64,
    /// The only randomness source of the battle
    #[serde(skip)]
    pub rng: DeterministicRng,
    /// Live units, sorted by id
    pub units: Vec<Unit>,
    /// In-flight volleys
    pub shootings: Vec<Shooting>,
    /// Every side that fielded a unit
    pub players: BTreeSet<PlayerId>,
    /// Latched outcome
    pub outcome: BattleOutcome,
    next_unit_id: u32,
    next_fighter_id: u32,
}

impl BattleState {
    /// Create an empty battle.
    pub fn new(rng_seed: u64) -> Self {
        Self {
            step: 0,
            time: 0.0,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            units: Vec::new(),
            shootings: Vec::new(),
            players: BTreeSet::new(),
            outcome: BattleOutcome::Undecided,
            next_unit_id: 0,
            next_fighter_id: 0,
        }
    }

    // =========================================================================
    // UNITS
    // =========================================================================

    /// Add a unit of `count` fighters in `ranks` ranks at `center`.
    pub fn add_unit(
        &mut self,
        player: PlayerId,
        stats: UnitStats,
        count: usize,
        ranks: u32,
        center: Vec2,
        facing: f32,
    ) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;

        let unit = Unit::new(id, player, stats, count, ranks, center, facing, self.next_fighter_id);
        self.next_fighter_id += count as u32;

        // Ids are handed out in increasing order, so pushing keeps the sort.
        self.units.push(unit);
        self.players.insert(player);
        id
    }

    /// Arena index of unit `id`.
    #[inline]
    pub fn unit_index(&self, id: UnitId) -> Option<usize> {
        self.units.binary_search_by_key(&id, |u| u.id).ok()
    }

    /// Unit by id.
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.unit_index(id).map(|i| &self.units[i])
    }

    /// Mutable unit by id.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.unit_index(id).map(move |i| &mut self.units[i])
    }

    /// One past the largest fighter id handed out.
    pub fn fighter_id_bound(&self) -> FighterId {
        FighterId(self.next_fighter_id)
    }

    /// Fighters across every unit.
    pub fn fighters_count(&self) -> usize {
        self.units.iter().map(|u| u.fighters.len()).sum()
    }

    // =========================================================================
    // OUTCOME
    // =========================================================================

    /// Non-routing unit count per side still on the field.
    pub fn standing_units(&self) -> BTreeMap<PlayerId, usize> {
        let mut counts = BTreeMap::new();
        for unit in self.units.iter().filter(|u| !u.is_routing()) {
            *counts.entry(unit.player).or_insert(0) += 1;
        }
        counts
    }

    /// Outcome implied by the current state.
    ///
    /// Battles with fewer than two sides never end.
    pub fn evaluate_outcome(&self) -> BattleOutcome {
        if self.players.len() < 2 {
            return BattleOutcome::Undecided;
        }

        let standing = self.standing_units();
        let mut sides = standing.keys();
        match (sides.next(), sides.next()) {
            (None, _) => BattleOutcome::Draw,
            (Some(&player), None) => BattleOutcome::Winner(player),
            _ => BattleOutcome::Undecided,
        }
    }

    // =========================================================================
    // HASHING
    // =========================================================================

    /// Compute hash of current state for verification.
    ///
    /// The outcome is left out: it is sampled per `advance_time` call, so it
    /// may latch at different moments for different call splits.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.step, self.rng_seed, |hasher| {
            hasher.update_f64(self.time);
            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);

            hasher.update_u32(self.units.len() as u32);
            for unit in &self.units {
                unit.hash_into(hasher);
            }

            hasher.update_u32(self.shootings.len() as u32);
            for shooting in &self.shootings {
                hasher.update_u32(shooting.unit.0);
                hasher.update_f32(shooting.time_to_impact);
                for projectile in &shooting.projectiles {
                    hasher.update_vec2(projectile.target);
                    hasher.update_f32(projectile.delay);
                    hasher.update_bool(projectile.resolved);
                }
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::unit::{Platform, Weapon};

    fn sword() -> UnitStats {
        UnitStats::preset(Platform::Infantry, Weapon::Sword)
    }

    #[test]
    fn test_add_unit_assigns_stable_ids() {
        let mut state = BattleState::new(1);
        let a = state.add_unit(PlayerId(0), sword(), 6, 2, Vec2::ZERO, 0.0);
        let b = state.add_unit(PlayerId(1), sword(), 4, 2, Vec2::new(30.0, 0.0), 0.0);

        assert_eq!(a, UnitId(0));
        assert_eq!(b, UnitId(1));
        assert_eq!(state.unit(b).map(|u| u.fighters[0].id), Some(FighterId(6)));
        assert_eq!(state.fighter_id_bound(), FighterId(10));
        assert_eq!(state.fighters_count(), 10);
        assert!(state.unit(UnitId(9)).is_none());
    }

    #[test]
    fn test_lookup_after_removal() {
        let mut state = BattleState::new(1);
        for i in 0..4 {
            state.add_unit(PlayerId(0), sword(), 2, 1, Vec2::new(i as f32 * 10.0, 0.0), 0.0);
        }
        state.units.retain(|u| u.id != UnitId(1));

        assert!(state.unit(UnitId(1)).is_none());
        assert_eq!(state.unit_index(UnitId(2)), Some(1));
        assert_eq!(state.unit(UnitId(3)).map(|u| u.id), Some(UnitId(3)));
    }

    #[test]
    fn test_outcome_needs_two_sides() {
        let mut state = BattleState::new(1);
        state.add_unit(PlayerId(0), sword(), 2, 1, Vec2::ZERO, 0.0);
        assert_eq!(state.evaluate_outcome(), BattleOutcome::Undecided);

        state.units.clear();
        assert_eq!(state.evaluate_outcome(), BattleOutcome::Undecided);
    }

    #[test]
    fn test_outcome_winner_and_draw() {
        let mut state = BattleState::new(1);
        state.add_unit(PlayerId(0), sword(), 2, 1, Vec2::ZERO, 0.0);
        let b = state.add_unit(PlayerId(1), sword(), 2, 1, Vec2::new(50.0, 0.0), 0.0);
        assert_eq!(state.evaluate_outcome(), BattleOutcome::Undecided);

        if let Some(unit) = state.unit_mut(b) {
            unit.state.morale = -0.5;
        }
        assert_eq!(state.evaluate_outcome(), BattleOutcome::Winner(PlayerId(0)));

        state.units.clear();
        assert_eq!(state.evaluate_outcome(), BattleOutcome::Draw);
    }

    #[test]
    fn test_hash_determinism() {
        let build = || {
            let mut state = BattleState::new(777);
            state.add_unit(PlayerId(0), sword(), 8, 2, Vec2::ZERO, 0.5);
            state.add_unit(PlayerId(1), sword(), 8, 2, Vec2::new(20.0, 0.0), 3.0);
            state
        };

        let a = build();
        let mut b = build();
        assert_eq!(a.compute_hash(), b.compute_hash());

        b.units[0].fighters[3].state.position.x += 0.001;
        assert_ne!(a.compute_hash(), b.compute_hash());
    }
}
