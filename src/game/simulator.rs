//! Battle Simulator
//!
//! Owns the battle state, both spatial indices and the fixed-step loop.
//! `advance_time` is the only driving entry point; everything else is
//! setup, commands and read access.
//!
//! Each discrete step:
//!
//! 1. Rebuild the fighter and weapon-tip indices from committed positions
//! 2. Advance every unit's path cursor
//! 3. Compute next states (read-only pass)
//! 4. Commit; routing units lose their command
//! 5. Resolve melee strikes
//! 6. Fire new volleys and land in-flight projectiles
//! 7. Compact fighters, scrub references to removed fighters
//! 8. Remove empty units, scrub references to them
//!
//! The outcome is checked once per `advance_time` call.

use std::collections::BTreeSet;

use tracing::{debug, info};
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::core::hash::StateHash;
use crate::core::quadtree::{Bounds, QuadTree};
use crate::core::vec2::Vec2;
use crate::game::combat::{resolve_melee, resolve_volleys, trigger_volleys};
use crate::game::command::Command;
use crate::game::config::{ConfigError, SimulationConfig};
use crate::game::events::{BattleListener, BattleOutcome, Casualty, Shooting, StepReport};
use crate::game::fighter::{Fighter, FighterDirectory, FighterId, FighterRef};
use crate::game::movement::{self, swap_fighters};
use crate::game::rules::{charge_center, compute_next_states, StepContext};
use crate::game::state::BattleState;
use crate::game::terrain::TerrainSurface;
use crate::game::unit::{PlayerId, Unit, UnitId, UnitMode, UnitStats};

/// Margin added around the battle circle for the index root.
const INDEX_MARGIN: f32 = 16.0;

/// Slack when comparing the residual against the step length.
const RESIDUAL_EPSILON: f64 = 1e-9;

/// Result of one `advance_time` call.
#[derive(Debug, Default)]
pub struct AdvanceResult {
    /// Discrete steps run
    pub steps: u32,
    /// One report per step, in order
    pub reports: Vec<StepReport>,
    /// Outcome after the call
    pub outcome: BattleOutcome,
}

impl AdvanceResult {
    /// Casualties over every step of the call.
    pub fn casualties(&self) -> usize {
        self.reports.iter().map(|r| r.casualties.len()).sum()
    }

    /// Volleys fired over every step of the call.
    pub fn shootings(&self) -> impl Iterator<Item = &Shooting> {
        self.reports.iter().flat_map(|r| r.shootings.iter())
    }
}

/// Deterministic battle simulator.
pub struct BattleSimulator {
    state: BattleState,
    config: SimulationConfig,
    terrain: Box<dyn TerrainSurface>,
    fighter_index: QuadTree<FighterRef>,
    weapon_index: QuadTree<FighterRef>,
    directory: FighterDirectory,
    residual: f64,
    listeners: Vec<Box<dyn BattleListener>>,
}

impl BattleSimulator {
    /// Create an empty battle on `terrain`.
    pub fn new(config: SimulationConfig, terrain: impl TerrainSurface + 'static) -> Result<Self, ConfigError> {
        config.validate()?;

        let area = terrain.bounds();
        let root = Bounds::around(area.center, area.radius + INDEX_MARGIN);

        Ok(Self {
            state: BattleState::new(config.seed),
            config,
            terrain: Box::new(terrain),
            fighter_index: QuadTree::new(root),
            weapon_index: QuadTree::new(root),
            directory: FighterDirectory::new(),
            residual: 0.0,
            listeners: Vec::new(),
        })
    }

    // =========================================================================
    // SETUP AND COMMANDS
    // =========================================================================

    /// Add a unit of `count` fighters in `ranks` ranks, standing at `center`.
    pub fn add_unit(
        &mut self,
        player: PlayerId,
        stats: UnitStats,
        count: usize,
        ranks: u32,
        center: Vec2,
        facing: f32,
    ) -> UnitId {
        let id = self.state.add_unit(player, stats, count, ranks, center, facing);
        self.directory.rebuild(&self.state.units);
        debug!(unit = id.0, player = player.0, fighters = count, "unit added");
        id
    }

    /// Replace a unit's command. Unknown ids are ignored.
    pub fn set_command(&mut self, unit: UnitId, command: Command) -> bool {
        match self.state.unit_mut(unit) {
            Some(u) => {
                u.set_command(command);
                true
            }
            None => false,
        }
    }

    /// Register a listener for step reports and the outcome.
    pub fn add_listener(&mut self, listener: Box<dyn BattleListener>) {
        self.listeners.push(listener);
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    /// Full battle state.
    pub fn state(&self) -> &BattleState {
        &self.state
    }

    /// Active configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Terrain service.
    pub fn terrain(&self) -> &dyn TerrainSurface {
        self.terrain.as_ref()
    }

    /// Live units, sorted by id.
    pub fn units(&self) -> &[Unit] {
        &self.state.units
    }

    /// Unit by id, if still on the field.
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.state.unit(id)
    }

    /// Fighter by id, if still alive.
    pub fn fighter(&self, id: FighterId) -> Option<&Fighter> {
        self.directory.resolve(&self.state.units, id)
    }

    /// In-flight volleys.
    pub fn shootings(&self) -> &[Shooting] {
        &self.state.shootings
    }

    /// Simulated seconds.
    pub fn time(&self) -> f64 {
        self.state.time
    }

    /// Outcome as of the last `advance_time` call.
    pub fn outcome(&self) -> BattleOutcome {
        self.state.outcome
    }

    /// Hash of the battle state.
    pub fn compute_hash(&self) -> StateHash {
        self.state.compute_hash()
    }

    // =========================================================================
    // STEP LOOP
    // =========================================================================

    /// Advance the battle by `seconds`, running as many whole steps as fit.
    ///
    /// The remainder carries over to the next call, so results depend only
    /// on the total time, not on how it is split into calls.
    pub fn advance_time(&mut self, seconds: f64) -> AdvanceResult {
        let mut result = AdvanceResult::default();

        if seconds.is_finite() && seconds > 0.0 {
            self.residual += seconds;
        }

        let step_length = self.config.time_step;
        while self.residual + RESIDUAL_EPSILON >= step_length {
            self.residual = (self.residual - step_length).max(0.0);
            result.reports.push(self.step());
            result.steps += 1;
        }

        self.update_outcome();
        result.outcome = self.state.outcome;
        result
    }

    /// Run one discrete step.
    pub fn step(&mut self) -> StepReport {
        self.state.step += 1;
        self.state.time += self.config.time_step;
        let dt = self.config.dt();
        let mut report = StepReport::new(self.state.step);

        // 1. Spatial indices
        self.rebuild_indices();
        self.directory.rebuild(&self.state.units);

        // 2. Path cursors
        let charges: Vec<Option<Vec2>> = self
            .state
            .units
            .iter()
            .map(|u| charge_center(&self.state.units, u))
            .collect();
        for (unit, charge) in self.state.units.iter_mut().zip(charges) {
            movement::advance_time(unit, charge, &self.config, dt);
        }

        // 3. Compute
        let staged = {
            let ctx = StepContext {
                units: &self.state.units,
                fighter_index: &self.fighter_index,
                weapon_index: &self.weapon_index,
                terrain: self.terrain.as_ref(),
                config: &self.config,
                dt,
            };
            compute_next_states(&ctx)
        };
        for (unit, (unit_state, fighter_states)) in self.state.units.iter_mut().zip(staged) {
            unit.next_state = Some(unit_state);
            for (fighter, fighter_state) in unit.fighters.iter_mut().zip(fighter_states) {
                fighter.next_state = Some(fighter_state);
            }
        }

        // 4. Commit
        for unit in &mut self.state.units {
            unit.commit();
            for fighter in &mut unit.fighters {
                fighter.commit();
            }
            unit.update_formation();
            if unit.is_routing() {
                let center = unit.state.center;
                unit.command.clear_for_rout(center);
                unit.cursor.position = center;
                unit.cursor.waypoint = 0;
            }
        }

        // 5. Melee
        report.melee = resolve_melee(
            &mut self.state.units,
            &self.directory,
            &mut self.state.rng,
            &self.config,
        );

        // 6. Missiles
        let volleys = trigger_volleys(&mut self.state.units, &mut self.state.rng);
        self.state.shootings.extend(volleys.iter().cloned());
        report.shootings = volleys;
        resolve_volleys(&mut self.state.shootings, &mut self.state.units, &self.fighter_index, dt);

        // 7-8. Removal
        self.remove_casualties(&mut report);
        self.directory.rebuild(&self.state.units);

        debug!(
            step = self.state.step,
            units = self.state.units.len(),
            fighters = self.state.fighters_count(),
            casualties = report.casualties.len(),
            volleys = report.shootings.len(),
            "step complete"
        );
        #[cfg(feature = "debug-tracing")]
        trace!(step = self.state.step, hash = %hex::encode(self.state.compute_hash()), "state hash");

        for listener in &mut self.listeners {
            listener.on_step(&report);
        }
        report
    }

    fn rebuild_indices(&mut self) {
        self.fighter_index.clear();
        self.weapon_index.clear();

        for (u, unit) in self.state.units.iter().enumerate() {
            if unit.state.mode == UnitMode::Initializing {
                continue;
            }
            let reach = unit.stats.weapon_reach;
            for (f, fighter) in unit.fighters.iter().enumerate() {
                let r = FighterRef {
                    unit: u as u32,
                    slot: f as u32,
                };
                let p = fighter.state.position;
                self.fighter_index.insert(p.x, p.y, r);
                if reach > 0.0 {
                    let tip = fighter.state.weapon_tip(reach);
                    self.weapon_index.insert(tip.x, tip.y, r);
                }
            }
        }
    }

    /// Compact fighter arrays, then drop empty units, scrubbing every
    /// reference to what was removed.
    fn remove_casualties(&mut self, report: &mut StepReport) {
        let bounds = self.terrain.bounds();
        let terrain = self.terrain.as_ref();
        let mut removed: BTreeSet<FighterId> = BTreeSet::new();

        for unit in &mut self.state.units {
            let (unit_id, player, platform) = (unit.id, unit.player, unit.stats.platform);
            let before = unit.fighters.len();
            let mut dead = 0u32;

            unit.fighters.retain(|fighter| {
                let position = fighter.state.position;
                if fighter.state.casualty {
                    report.casualties.push(Casualty {
                        fighter: fighter.id,
                        unit: unit_id,
                        position,
                        elevation: terrain.height(position),
                        player,
                        platform,
                    });
                    removed.insert(fighter.id);
                    dead += 1;
                    false
                } else if !bounds.contains(position) {
                    removed.insert(fighter.id);
                    false
                } else {
                    true
                }
            });

            unit.casualties_last_step = dead;
            if unit.fighters.len() != before {
                unit.update_formation();
            }
        }

        if !removed.is_empty() {
            for fighter in self.state.units.iter_mut().flat_map(|u| u.fighters.iter_mut()) {
                if fighter.state.opponent.is_some_and(|id| removed.contains(&id)) {
                    fighter.state.opponent = None;
                }
                if fighter.state.melee_target.is_some_and(|id| removed.contains(&id)) {
                    fighter.state.melee_target = None;
                }
            }
        }

        for unit in &mut self.state.units {
            if unit.state.mode == UnitMode::Standing && !unit.is_routing() {
                let anchor = unit.command.destination().unwrap_or(unit.state.center);
                swap_fighters(unit, anchor);
            }
        }

        let mut gone = Vec::new();
        self.state.units.retain(|unit| {
            if unit.fighters.is_empty() {
                gone.push(unit.id);
                false
            } else {
                true
            }
        });

        for &id in &gone {
            debug!(unit = id.0, step = self.state.step, "unit destroyed");
            for unit in &mut self.state.units {
                unit.command.forget_unit(id);
                if unit.state.missile_target == Some(id) {
                    unit.state.missile_target = None;
                }
            }
        }
        report.removed_units = gone;
    }

    fn update_outcome(&mut self) {
        if self.state.outcome.is_decided() {
            return;
        }

        let outcome = self.state.evaluate_outcome();
        if outcome.is_decided() {
            info!(?outcome, time = self.state.time, "battle decided");
            self.state.outcome = outcome;
            for listener in &mut self.listeners {
                listener.on_outcome(outcome);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::f32::consts::PI;
    use std::rc::Rc;

    use crate::game::fighter::ReadyState;
    use crate::game::terrain::FlatTerrain;
    use crate::game::unit::{Platform, Weapon};
    use crate::TIME_STEP;

    fn simulator(seed: u64, radius: f32) -> BattleSimulator {
        let config = SimulationConfig {
            seed,
            ..SimulationConfig::default()
        };
        BattleSimulator::new(config, FlatTerrain::new(radius)).unwrap()
    }

    fn sword() -> UnitStats {
        UnitStats::preset(Platform::Infantry, Weapon::Sword)
    }

    #[derive(Default)]
    struct Recorder {
        steps: Vec<u64>,
        volleys: Vec<usize>,
        outcomes: Vec<BattleOutcome>,
    }

    struct SharedRecorder(Rc<RefCell<Recorder>>);

    impl BattleListener for SharedRecorder {
        fn on_step(&mut self, report: &StepReport) {
            let mut rec = self.0.borrow_mut();
            rec.steps.push(report.step);
            rec.volleys.extend(report.shootings.iter().map(|s| s.projectiles.len()));
        }

        fn on_outcome(&mut self, outcome: BattleOutcome) {
            self.0.borrow_mut().outcomes.push(outcome);
        }
    }

    #[test]
    fn test_fixed_step_accumulates_residual() {
        let mut sim = simulator(1, 100.0);
        sim.add_unit(PlayerId(0), sword(), 4, 2, Vec2::ZERO, 0.0);

        assert_eq!(sim.advance_time(TIME_STEP * 0.5).steps, 0);
        assert_eq!(sim.advance_time(TIME_STEP * 0.5).steps, 1);
        assert_eq!(sim.advance_time(1.0).steps, 15);
        assert_eq!(sim.advance_time(-3.0).steps, 0);
        assert_eq!(sim.advance_time(f64::NAN).steps, 0);
        assert_eq!(sim.state().step, 16);
    }

    #[test]
    fn test_single_unit_marches_to_destination() {
        let mut sim = simulator(1, 500.0);
        let mut stats = sword();
        stats.walking_speed = 4.0;
        let id = sim.add_unit(PlayerId(0), stats, 8, 2, Vec2::ZERO, 0.0);
        let destination = Vec2::new(100.0, 0.0);
        assert!(sim.set_command(id, Command::stand(Vec2::ZERO, 0.0).move_to(destination)));

        let mut modes = Vec::new();
        for _ in 0..(45 * 15) {
            sim.advance_time(TIME_STEP);
            let mode = sim.unit(id).map(|u| u.state.mode);
            if modes.last() != Some(&mode) {
                modes.push(mode);
            }
        }

        assert_eq!(
            modes,
            vec![
                Some(UnitMode::Standing),
                Some(UnitMode::Moving),
                Some(UnitMode::Standing),
            ]
        );
        let center = sim.unit(id).map(|u| u.state.center).unwrap();
        assert!(center.distance(destination) <= 8.0, "center {center} too far");
        assert_eq!(sim.outcome(), BattleOutcome::Undecided);
    }

    #[test]
    fn test_melee_engagement_one_outcome_per_target() {
        let mut sim = simulator(5, 100.0);
        let a = sim.add_unit(PlayerId(0), sword(), 1, 1, Vec2::ZERO, 0.0);
        let b = sim.add_unit(PlayerId(1), sword(), 1, 1, Vec2::new(1.5, 0.0), PI);
        sim.set_command(a, Command::stand(Vec2::ZERO, 0.0));
        sim.set_command(b, Command::stand(Vec2::new(1.5, 0.0), PI));

        let mut saw_striking = false;
        let mut outcome_step = None;
        for _ in 0..60 {
            let report = sim.step();
            saw_striking |= sim
                .units()
                .iter()
                .flat_map(|u| u.fighters.iter())
                .any(|f| f.state.ready_state == ReadyState::Striking && f.state.opponent.is_some());

            if !report.melee.is_empty() {
                let targets: BTreeSet<_> = report.melee.iter().map(|m| m.target).collect();
                assert_eq!(targets.len(), report.melee.len(), "one outcome per target");
                for outcome in &report.melee {
                    let dead = report.casualties.iter().any(|c| c.fighter == outcome.target);
                    assert_eq!(dead, outcome.killed);
                }
                outcome_step = Some(report.step);
                break;
            }
        }

        assert!(saw_striking);
        let step = outcome_step.expect("strikes landed");
        // Readying then striking takes at least 1.25 s
        assert!(step as f64 * TIME_STEP >= 1.25);
    }

    #[test]
    fn test_volley_per_load_cycle() {
        let mut sim = simulator(9, 300.0);
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        sim.add_listener(Box::new(SharedRecorder(recorder.clone())));

        let archers = sim.add_unit(
            PlayerId(0),
            UnitStats::preset(Platform::Infantry, Weapon::Bow),
            6,
            2,
            Vec2::ZERO,
            0.0,
        );
        sim.add_unit(PlayerId(1), sword(), 12, 3, Vec2::new(60.0, 0.0), PI);

        let mut prepared_at_volley = Vec::new();
        for _ in 0..(12 * 15) {
            let report = sim.step();
            if !report.shootings.is_empty() {
                let prepared = sim
                    .unit(archers)
                    .map(|u| {
                        u.fighters
                            .iter()
                            .filter(|f| f.state.ready_state == ReadyState::Prepared)
                            .count()
                    })
                    .unwrap_or(0);
                prepared_at_volley.push((report.shootings[0].projectiles.len(), prepared));
            }
        }

        assert_eq!(prepared_at_volley.len(), 2, "one volley per 5 s load cycle");
        for (projectiles, prepared) in &prepared_at_volley {
            assert_eq!(projectiles, prepared);
            assert!(*projectiles > 0);
        }

        let rec = recorder.borrow();
        assert_eq!(rec.steps.len(), 12 * 15);
        assert_eq!(rec.volleys.len(), 2);
    }

    #[test]
    fn test_removed_unit_is_scrubbed() {
        let mut sim = simulator(2, 100.0);
        let a = sim.add_unit(PlayerId(0), sword(), 1, 1, Vec2::new(-20.0, 0.0), 0.0);
        let b = sim.add_unit(PlayerId(1), sword(), 3, 1, Vec2::new(20.0, 0.0), PI);
        sim.set_command(b, Command::stand(Vec2::new(20.0, 0.0), PI).charge(a).shoot_at(a));
        sim.advance_time(TIME_STEP);

        let victim = sim.state.units[0].fighters[0].id;
        sim.state.units[0].fighters[0].state.casualty = true;
        let result = sim.advance_time(TIME_STEP);

        assert!(sim.unit(a).is_none());
        assert!(sim.fighter(victim).is_none());
        assert_eq!(result.reports[0].removed_units, vec![a]);
        assert_eq!(result.casualties(), 1);

        let charger = sim.unit(b).unwrap();
        assert_eq!(charger.command.melee_target, None);
        assert_eq!(charger.command.missile_target, None);
        assert_eq!(charger.state.missile_target, None);
        assert_eq!(result.outcome, BattleOutcome::Winner(PlayerId(1)));
    }

    #[test]
    fn test_routing_unit_drops_charge() {
        let mut sim = simulator(4, 100.0);
        let a = sim.add_unit(PlayerId(0), sword(), 6, 2, Vec2::new(-20.0, 0.0), 0.0);
        let b = sim.add_unit(PlayerId(1), sword(), 6, 2, Vec2::new(20.0, 0.0), PI);
        sim.set_command(a, Command::stand(Vec2::new(-20.0, 0.0), 0.0).charge(b));
        sim.step();
        assert_eq!(sim.unit(a).and_then(|u| u.command.melee_target), Some(b));

        sim.state.units[0].state.morale = -0.5;
        sim.step();

        let unit = sim.unit(a).unwrap();
        assert!(unit.is_routing());
        assert_eq!(unit.command.melee_target, None);
        assert_eq!(unit.command.path, vec![unit.state.center]);
        assert_eq!(unit.cursor.position, unit.state.center);
        for fighter in &unit.fighters {
            assert_eq!(fighter.state.ready_state, ReadyState::Unready);
            assert_eq!(fighter.state.opponent, None);
        }
    }

    #[test]
    fn test_fled_fighters_removed_without_casualty() {
        let mut sim = simulator(2, 50.0);
        let a = sim.add_unit(PlayerId(0), sword(), 2, 1, Vec2::new(45.0, 0.0), 0.0);
        sim.set_command(a, Command::stand(Vec2::new(45.0, 0.0), 0.0).move_to(Vec2::new(200.0, 0.0)).running(true));

        let mut casualties = 0;
        for _ in 0..(10 * 15) {
            casualties += sim.step().casualties.len();
        }
        assert!(sim.unit(a).is_none());
        assert_eq!(casualties, 0);
    }

    #[test]
    fn test_no_dangling_opponents_after_removal() {
        let mut sim = simulator(13, 100.0);
        let a = sim.add_unit(PlayerId(0), sword(), 12, 3, Vec2::new(-3.0, 0.0), 0.0);
        let b = sim.add_unit(PlayerId(1), sword(), 12, 3, Vec2::new(3.0, 0.0), PI);
        sim.set_command(a, Command::stand(Vec2::new(-3.0, 0.0), 0.0).charge(b));
        sim.set_command(b, Command::stand(Vec2::new(3.0, 0.0), PI).charge(a));

        for _ in 0..(20 * 15) {
            let report = sim.step();
            let dead: BTreeSet<_> = report.casualties.iter().map(|c| c.fighter).collect();
            for fighter in sim.units().iter().flat_map(|u| u.fighters.iter()) {
                assert!(fighter.state.opponent.map_or(true, |id| !dead.contains(&id)));
                assert!(fighter.state.opponent.map_or(true, |id| sim.fighter(id).is_some()));
            }
        }
    }

    #[test]
    fn test_fighter_counts_never_grow() {
        let mut sim = simulator(21, 200.0);
        let a = sim.add_unit(PlayerId(0), sword(), 16, 4, Vec2::new(-10.0, 0.0), 0.0);
        let b = sim.add_unit(
            PlayerId(1),
            UnitStats::preset(Platform::Cavalry, Weapon::Sword),
            10,
            2,
            Vec2::new(10.0, 0.0),
            PI,
        );
        sim.set_command(b, Command::stand(Vec2::new(10.0, 0.0), PI).charge(a).running(true));

        let mut last: Vec<(UnitId, usize)> = sim.units().iter().map(|u| (u.id, u.fighters_count())).collect();
        for _ in 0..(30 * 15) {
            sim.step();
            for unit in sim.units() {
                assert!(unit.fighters_count() <= unit.capacity);
                if let Some((_, before)) = last.iter().find(|(id, _)| *id == unit.id) {
                    assert!(unit.fighters_count() <= *before);
                }
            }
            last = sim.units().iter().map(|u| (u.id, u.fighters_count())).collect();
        }
    }

    #[test]
    fn test_determinism_independent_of_call_split() {
        let build = || {
            let mut sim = simulator(4242, 200.0);
            let a = sim.add_unit(PlayerId(0), sword(), 12, 3, Vec2::new(-15.0, 0.0), 0.0);
            let b = sim.add_unit(
                PlayerId(1),
                UnitStats::preset(Platform::Infantry, Weapon::Bow),
                12,
                3,
                Vec2::new(40.0, 0.0),
                PI,
            );
            sim.set_command(a, Command::stand(Vec2::new(-15.0, 0.0), 0.0).charge(b).running(true));
            sim
        };

        let mut whole = build();
        let mut split = build();
        for _ in 0..10 {
            whole.advance_time(1.0);
            for _ in 0..10 {
                split.advance_time(0.1);
            }
        }

        assert_eq!(whole.state().step, split.state().step);
        assert_eq!(whole.compute_hash(), split.compute_hash());

        let mut other_seed = simulator(1, 200.0);
        other_seed.add_unit(PlayerId(0), sword(), 12, 3, Vec2::new(-15.0, 0.0), 0.0);
        assert_ne!(whole.compute_hash(), other_seed.compute_hash());
    }

    #[test]
    fn test_set_command_unknown_unit() {
        let mut sim = simulator(1, 100.0);
        assert!(!sim.set_command(UnitId(99), Command::default()));
    }

    #[test]
    fn test_outcome_reported_once() {
        let mut sim = simulator(3, 100.0);
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        sim.add_listener(Box::new(SharedRecorder(recorder.clone())));
        sim.add_unit(PlayerId(0), sword(), 2, 1, Vec2::new(-30.0, 0.0), 0.0);
        sim.add_unit(PlayerId(1), sword(), 1, 1, Vec2::new(30.0, 0.0), PI);
        sim.advance_time(TIME_STEP);
        assert_eq!(sim.outcome(), BattleOutcome::Undecided);

        sim.state.units[1].fighters[0].state.casualty = true;
        sim.advance_time(TIME_STEP);
        sim.advance_time(TIME_STEP);

        assert_eq!(sim.outcome(), BattleOutcome::Winner(PlayerId(0)));
        assert_eq!(recorder.borrow().outcomes, vec![BattleOutcome::Winner(PlayerId(0))]);
    }
}
