//! Terrain Queries
//!
//! The simulation reads terrain through [`TerrainSurface`] and never
//! modifies it. [`FlatTerrain`] is a simple implementation: a level,
//! circular field with optional forest, water and impassable discs.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;

/// Circular battle area. Fighters leaving it are removed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleBounds {
    /// Center of the field
    pub center: Vec2,
    /// Fighters beyond this distance have fled
    pub radius: f32,
}

impl BattleBounds {
    /// Create from center and radius.
    pub const fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Inside or on the boundary.
    #[inline]
    pub fn contains(&self, position: Vec2) -> bool {
        position.distance_squared(self.center) <= self.radius * self.radius
    }
}

/// Read-only terrain service.
pub trait TerrainSurface: Send + Sync {
    /// Ground height at `position`.
    fn height(&self, position: Vec2) -> f32;

    /// Forest slows movement.
    fn is_forest(&self, position: Vec2) -> bool;

    /// Water slows movement.
    fn is_water(&self, position: Vec2) -> bool;

    /// Whether fighters may not stand at `position`.
    fn is_impassable(&self, position: Vec2) -> bool;

    /// Battle area.
    fn bounds(&self) -> BattleBounds;
}

/// A disc of special terrain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Disc center
    pub center: Vec2,
    /// Disc radius
    pub radius: f32,
}

impl Patch {
    #[inline]
    fn contains(&self, position: Vec2) -> bool {
        position.distance_squared(self.center) <= self.radius * self.radius
    }
}

/// Level field of constant height.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlatTerrain {
    /// Battle area
    pub bounds: BattleBounds,
    /// Ground height everywhere
    #[serde(default)]
    pub height: f32,
    /// Forest discs
    #[serde(default)]
    pub forests: Vec<Patch>,
    /// Water discs
    #[serde(default)]
    pub water: Vec<Patch>,
    /// Blocked discs
    #[serde(default)]
    pub impassable: Vec<Patch>,
}

impl FlatTerrain {
    /// Open field of `radius` around the origin.
    pub fn new(radius: f32) -> Self {
        Self {
            bounds: BattleBounds::new(Vec2::ZERO, radius),
            height: 0.0,
            forests: Vec::new(),
            water: Vec::new(),
            impassable: Vec::new(),
        }
    }

    /// Add a forest disc.
    pub fn with_forest(mut self, center: Vec2, radius: f32) -> Self {
        self.forests.push(Patch { center, radius });
        self
    }

    /// Add a water disc.
    pub fn with_water(mut self, center: Vec2, radius: f32) -> Self {
        self.water.push(Patch { center, radius });
        self
    }

    /// Add a blocked disc.
    pub fn with_impassable(mut self, center: Vec2, radius: f32) -> Self {
        self.impassable.push(Patch { center, radius });
        self
    }
}

impl Default for FlatTerrain {
    fn default() -> Self {
        Self::new(1024.0)
    }
}

impl TerrainSurface for FlatTerrain {
    fn height(&self, _position: Vec2) -> f32 {
        self.height
    }

    fn is_forest(&self, position: Vec2) -> bool {
        self.forests.iter().any(|p| p.contains(position))
    }

    fn is_water(&self, position: Vec2) -> bool {
        self.water.iter().any(|p| p.contains(position))
    }

    fn is_impassable(&self, position: Vec2) -> bool {
        self.impassable.iter().any(|p| p.contains(position))
    }

    fn bounds(&self) -> BattleBounds {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_contains() {
        let bounds = BattleBounds::new(Vec2::new(10.0, 10.0), 5.0);
        assert!(bounds.contains(Vec2::new(10.0, 10.0)));
        assert!(bounds.contains(Vec2::new(15.0, 10.0)));
        assert!(!bounds.contains(Vec2::new(15.1, 10.0)));
    }

    #[test]
    fn test_flat_terrain_patches() {
        let terrain = FlatTerrain::new(100.0)
            .with_forest(Vec2::new(20.0, 0.0), 5.0)
            .with_water(Vec2::new(-20.0, 0.0), 5.0)
            .with_impassable(Vec2::new(0.0, 20.0), 2.0);

        assert!(terrain.is_forest(Vec2::new(21.0, 1.0)));
        assert!(!terrain.is_forest(Vec2::ZERO));
        assert!(terrain.is_water(Vec2::new(-18.0, 0.0)));
        assert!(terrain.is_impassable(Vec2::new(0.0, 21.0)));
        assert!(!terrain.is_impassable(Vec2::new(0.0, 23.0)));
        assert_eq!(terrain.height(Vec2::ZERO), 0.0);
        assert_eq!(terrain.bounds().radius, 100.0);
    }
}
