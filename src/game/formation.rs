//! Formation Geometry
//!
//! Ranks × files layout of a unit's fighters. Purely derived data: it is
//! recomputed from the fighter count, spacing and facing whenever any of
//! those change, and never stored on its own.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;

/// Rank/file layout and basis vectors for one unit.
///
/// Fighter `i` stands in `file = i / number_of_ranks` and
/// `rank = i % number_of_ranks`, so consecutive fighters fill a file front
/// to back before the next file starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    /// Ranks asked for at creation; the effective count never exceeds it.
    pub requested_ranks: u32,
    /// Effective number of ranks (always >= 1)
    pub number_of_ranks: u32,
    /// Number of files needed to hold every fighter (always >= 1)
    pub number_of_files: u32,
    /// Distance between consecutive ranks
    pub rank_distance: f32,
    /// Distance between consecutive files
    pub file_distance: f32,
    /// Facing angle in radians
    pub direction: f32,
    /// One file step to the right of the facing, scaled by file distance
    pub toward_right: Vec2,
    /// One rank step behind the facing, scaled by rank distance
    pub toward_back: Vec2,
}

impl Formation {
    /// Create a formation for `fighters_count` fighters facing `direction`.
    pub fn new(
        requested_ranks: u32,
        rank_distance: f32,
        file_distance: f32,
        fighters_count: usize,
        direction: f32,
    ) -> Self {
        let mut formation = Self {
            requested_ranks: requested_ranks.max(1),
            number_of_ranks: 1,
            number_of_files: 1,
            rank_distance,
            file_distance,
            direction: 0.0,
            toward_right: Vec2::ZERO,
            toward_back: Vec2::ZERO,
        };
        formation.update(fighters_count);
        formation.set_direction(direction);
        formation
    }

    /// Recompute rank and file counts after the fighter count changed.
    pub fn update(&mut self, fighters_count: usize) {
        let count = fighters_count.max(1) as u32;
        self.number_of_ranks = self.requested_ranks.clamp(1, count);
        self.number_of_files = count.div_ceil(self.number_of_ranks).max(1);
    }

    /// Recompute basis vectors for a new facing.
    pub fn set_direction(&mut self, direction: f32) {
        self.direction = direction;
        let (sin, cos) = direction.sin_cos();
        self.toward_right = Vec2::new(sin, -cos) * self.file_distance;
        self.toward_back = Vec2::new(-cos, -sin) * self.rank_distance;
    }

    /// `(rank, file)` of the fighter at `index`.
    #[inline]
    pub fn slot(&self, index: usize) -> (u32, u32) {
        let ranks = self.number_of_ranks.max(1) as usize;
        ((index % ranks) as u32, (index / ranks) as u32)
    }

    /// Signed file offset from the formation's center line.
    #[inline]
    pub fn file_offset(&self, file: u32) -> f32 {
        file as f32 - (self.number_of_files as f32 - 1.0) / 2.0
    }

    /// Signed rank offset from the formation's middle rank.
    #[inline]
    pub fn rank_offset(&self, rank: u32) -> f32 {
        rank as f32 - (self.number_of_ranks as f32 - 1.0) / 2.0
    }

    /// Position of slot `index` in a formation centered on `center`.
    pub fn slot_position(&self, center: Vec2, index: usize) -> Vec2 {
        let (rank, file) = self.slot(index);
        center + self.toward_right * self.file_offset(file) + self.toward_back * self.rank_offset(rank)
    }

    /// Front-to-back depth of the formation.
    pub fn depth(&self) -> f32 {
        self.number_of_ranks as f32 * self.rank_distance
    }
}
