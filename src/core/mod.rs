//! Core deterministic primitives.
//!
//! Building blocks with no knowledge of units or fighters: vector math,
//! the seeded RNG, state hashing and the quadtree spatial index.

pub mod vec2;
pub mod rng;
pub mod hash;
pub mod quadtree;

// Re-export core types
pub use vec2::Vec2;
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
pub use quadtree::{Bounds, Find, QuadTree};
