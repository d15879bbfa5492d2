//! # Battle Simulation Core
//!
//! Deterministic fixed-step simulation of formation-based battles: units of
//! fighters marching, engaging in melee and exchanging missile volleys.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      BATTLE SIM                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── vec2.rs     - 2D vector math                            │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  ├── hash.rs     - State hashing for verification            │
//! │  └── quadtree.rs - Spatial index for radius queries          │
//! │                                                              │
//! │  game/           - Battle logic                              │
//! │  ├── unit.rs     - Units, stats, modes                       │
//! │  ├── fighter.rs  - Fighters, readiness, id directory         │
//! │  ├── formation.rs- Rank/file geometry                        │
//! │  ├── movement.rs - Path cursor, destinations, swaps          │
//! │  ├── rules.rs    - Read-only compute pass                    │
//! │  ├── combat.rs   - Melee and missile resolution              │
//! │  └── simulator.rs- Fixed-step loop, commit, removal          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given the same seed, the same setup and the same total time passed to
//! `advance_time`, two battles end in bit-identical states:
//! - Units and fighters are iterated in arena order (units sorted by id)
//! - No HashMap; BTreeMap/BTreeSet where ordering matters
//! - All randomness from one seeded Xorshift128+ owned by the battle
//! - The compute pass reads a frozen snapshot, so its order is irrelevant
//!
//! ## Example
//!
//! ```
//! use battle_sim::core::vec2::Vec2;
//! use battle_sim::game::{BattleSimulator, Command, FlatTerrain, PlayerId, SimulationConfig};
//! use battle_sim::game::unit::{Platform, UnitStats, Weapon};
//!
//! let mut sim = BattleSimulator::new(SimulationConfig::default(), FlatTerrain::new(200.0)).unwrap();
//! let stats = UnitStats::preset(Platform::Infantry, Weapon::Sword);
//! let unit = sim.add_unit(PlayerId(0), stats, 20, 4, Vec2::ZERO, 0.0);
//! sim.set_command(unit, Command::stand(Vec2::ZERO, 0.0).move_to(Vec2::new(30.0, 0.0)));
//!
//! let result = sim.advance_time(1.0);
//! assert_eq!(result.steps, 15);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use crate::core::vec2::Vec2;
pub use crate::core::rng::DeterministicRng;
pub use crate::core::quadtree::QuadTree;
pub use crate::game::simulator::{AdvanceResult, BattleSimulator};
pub use crate::game::state::BattleState;
pub use crate::game::config::SimulationConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation step rate (Hz)
pub const TICK_RATE: u32 = 15;

/// Seconds per discrete step
pub const TIME_STEP: f64 = 1.0 / TICK_RATE as f64;
