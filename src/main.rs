//! Battle Sim Runner
//!
//! Runs a scenario to completion (or a time limit) and checks that a replay
//! with a different time split lands on the same state hash.
//!
//! Usage: `battle-sim [scenario.json]`. Without an argument a built-in
//! skirmish is played.

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use battle_sim::{
    TICK_RATE, VERSION,
    game::{BattleOutcome, BattleSimulator, Scenario},
};

/// Seconds of battle time before the runner gives up on a decision.
const TIME_LIMIT: f64 = 300.0;

/// Wall-clock chunk passed to each `advance_time` call.
const FRAME: f64 = 0.25;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Battle Sim v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let scenario = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading scenario {}", path))?;
            Scenario::from_json_str(&json).with_context(|| format!("loading scenario {}", path))?
        }
        None => Scenario::skirmish(12345),
    };

    let (steps, hash) = run_battle(&scenario)?;
    verify_replay(&scenario, steps, hash)?;
    Ok(())
}

/// Play the scenario and return the step count and final state hash.
fn run_battle(scenario: &Scenario) -> Result<(u64, [u8; 32])> {
    info!("=== Starting Battle ===");

    let mut sim = scenario.build()?;
    info!("Seed: {}", sim.config().seed);
    for unit in sim.units() {
        info!(
            "Unit {} (player {}) {:?}/{:?}: {} fighters at ({:.1}, {:.1})",
            unit.id.0,
            unit.player.0,
            unit.stats.platform,
            unit.stats.weapon,
            unit.fighters_count(),
            unit.state.center.x,
            unit.state.center.y,
        );
    }

    let mut casualties = 0;
    let mut volleys = 0;
    let mut next_report = 10.0;

    while sim.time() < TIME_LIMIT && !sim.outcome().is_decided() {
        let result = sim.advance_time(FRAME);
        casualties += result.casualties();
        volleys += result.shootings().count();

        if sim.time() >= next_report {
            next_report += 10.0;
            info!(
                "t={:.1}s step={} units={} fighters={} casualties={} volleys={}",
                sim.time(),
                sim.state().step,
                sim.units().len(),
                sim.state().fighters_count(),
                casualties,
                volleys,
            );
        }
    }

    report_outcome(&sim);

    let hash = sim.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    Ok((sim.state().step, hash))
}

fn report_outcome(sim: &BattleSimulator) {
    match sim.outcome() {
        BattleOutcome::Winner(player) => {
            info!("=== Battle Won by player {} at t={:.1}s ===", player.0, sim.time())
        }
        BattleOutcome::Draw => info!("=== Battle Drawn at t={:.1}s ===", sim.time()),
        BattleOutcome::Undecided => warn!("Battle undecided after {:.0}s", TIME_LIMIT),
    }

    for unit in sim.units() {
        info!(
            "  unit {} (player {}): {} fighters, morale {:.2}{}",
            unit.id.0,
            unit.player.0,
            unit.fighters_count(),
            unit.state.morale,
            if unit.is_routing() { " (routing)" } else { "" },
        );
    }
}

/// Replay the same number of steps with uneven frame sizes and compare hashes.
fn verify_replay(scenario: &Scenario, steps: u64, expected: [u8; 32]) -> Result<()> {
    info!("=== Verifying Replay ===");

    let mut sim = scenario.build()?;
    let frames: [f64; 4] = [0.1, 0.7, 0.05, 1.15];
    let mut i = 0;
    while sim.state().step < steps {
        let remaining = (steps - sim.state().step) as f64 * sim.config().time_step;
        sim.advance_time(frames[i % frames.len()].min(remaining));
        i += 1;
    }

    let replay_hash = sim.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if expected == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        warn!("DETERMINISM FAILURE: Hashes differ!");
    }
    Ok(())
}
