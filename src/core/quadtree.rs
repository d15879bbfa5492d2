//! Quadtree Spatial Index
//!
//! Bucket-splitting 2D point index used to answer "who is within `r` of
//! this point" for every fighter, every step.
//!
//! ```text
//! ┌───────────┬───────────┐
//! │ q2 (-x+y) │ q3 (+x+y) │   Leaves hold up to NODE_CAPACITY items.
//! ├───────────┼───────────┤   A full leaf splits into four equal quadrants
//! │ q0 (-x-y) │ q1 (+x-y) │   and hands its items down; internal nodes
//! └───────────┴───────────┘   never hold items.
//! ```
//!
//! The tree is rebuilt every step. `clear()` only empties the buckets, so the
//! node arena and each bucket's allocation are reused by the next rebuild.
//!
//! Pruning uses integer bounds scaled to 1/100 unit and padded by the query
//! radius; only the final per-item test uses the exact Euclidean distance.

use std::iter::FusedIterator;

use super::vec2::Vec2;

/// Items a leaf holds before it splits.
pub const NODE_CAPACITY: usize = 8;

/// Deepest level a split may create. Leaves at this depth accept any number
/// of items, which bounds descent for stacks of coincident points.
pub const MAX_DEPTH: u32 = 12;

/// Fixed-point scale for pruning bounds (1/100 unit).
pub const COORD_SCALE: f64 = 100.0;

const NO_PARENT: u32 = u32::MAX;

/// Axis-aligned region covered by a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Bounds {
    /// Create from corners.
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Square region centered on `center` with half-extent `half`.
    pub fn around(center: Vec2, half: f32) -> Self {
        Self {
            min: Vec2::new(center.x - half, center.y - half),
            max: Vec2::new(center.x + half, center.y + half),
        }
    }

    /// Inclusive containment test (false for NaN).
    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min.x && x <= self.max.x && y >= self.min.y && y <= self.max.y
    }

    #[inline]
    fn mid(&self) -> Vec2 {
        self.min.lerp(self.max, 0.5)
    }

    #[inline]
    fn quadrant_of(&self, x: f32, y: f32) -> usize {
        let mid = self.mid();
        (x >= mid.x) as usize | (((y >= mid.y) as usize) << 1)
    }

    fn quadrant(&self, q: usize) -> Bounds {
        let mid = self.mid();
        let (min_x, max_x) = if q & 1 == 0 { (self.min.x, mid.x) } else { (mid.x, self.max.x) };
        let (min_y, max_y) = if q & 2 == 0 { (self.min.y, mid.y) } else { (mid.y, self.max.y) };
        Bounds::new(Vec2::new(min_x, min_y), Vec2::new(max_x, max_y))
    }
}

#[inline]
fn scale_floor(v: f32) -> i64 {
    (v as f64 * COORD_SCALE).floor() as i64
}

#[inline]
fn scale_ceil(v: f32) -> i64 {
    (v as f64 * COORD_SCALE).ceil() as i64
}

/// Node bounds in scaled integer coordinates (floor of min, ceil of max).
#[derive(Clone, Copy, Debug)]
struct ScaledBounds {
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

impl ScaledBounds {
    fn from_bounds(bounds: &Bounds) -> Self {
        Self {
            min_x: scale_floor(bounds.min.x),
            min_y: scale_floor(bounds.min.y),
            max_x: scale_ceil(bounds.max.x),
            max_y: scale_ceil(bounds.max.y),
        }
    }

    /// Does the query point fall inside these bounds grown by `pad`?
    #[inline]
    fn padded_contains(&self, qx: i64, qy: i64, pad: i64) -> bool {
        qx >= self.min_x.saturating_sub(pad)
            && qx <= self.max_x.saturating_add(pad)
            && qy >= self.min_y.saturating_sub(pad)
            && qy <= self.max_y.saturating_add(pad)
    }
}

#[derive(Clone, Debug)]
struct Item<T> {
    x: f32,
    y: f32,
    payload: T,
}

#[derive(Clone, Debug)]
struct Node<T> {
    bounds: Bounds,
    scaled: ScaledBounds,
    parent: u32,
    depth: u32,
    /// Index of the first of four consecutive children.
    children: Option<u32>,
    items: Vec<Item<T>>,
}

impl<T> Node<T> {
    fn new(bounds: Bounds, parent: u32, depth: u32) -> Self {
        Self {
            scaled: ScaledBounds::from_bounds(&bounds),
            bounds,
            parent,
            depth,
            children: None,
            items: Vec::new(),
        }
    }
}

/// Rebuildable point quadtree carrying an opaque payload per point.
#[derive(Clone, Debug)]
pub struct QuadTree<T> {
    nodes: Vec<Node<T>>,
    /// Points outside the root region (scanned linearly by `find`).
    overflow: Vec<Item<T>>,
    len: usize,
}

impl<T> QuadTree<T> {
    /// Create an empty tree over `bounds`.
    pub fn new(bounds: Bounds) -> Self {
        Self {
            nodes: vec![Node::new(bounds, NO_PARENT, 0)],
            overflow: Vec::new(),
            len: 0,
        }
    }

    /// Root region.
    pub fn bounds(&self) -> Bounds {
        self.nodes[0].bounds
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no points are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated nodes (structure survives `clear`).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Remove every point, keeping the node structure for reuse.
    pub fn clear(&mut self) {
        for node in &mut self.nodes {
            node.items.clear();
        }
        self.overflow.clear();
        self.len = 0;
    }

    /// Insert a point with its payload.
    pub fn insert(&mut self, x: f32, y: f32, payload: T) {
        self.len += 1;

        if !self.nodes[0].bounds.contains(x, y) {
            self.overflow.push(Item { x, y, payload });
            return;
        }

        let mut index = 0usize;
        loop {
            let node = &self.nodes[index];
            if let Some(first) = node.children {
                index = first as usize + node.bounds.quadrant_of(x, y);
                continue;
            }
            if node.items.len() < NODE_CAPACITY || node.depth >= MAX_DEPTH {
                self.nodes[index].items.push(Item { x, y, payload });
                return;
            }
            self.split(index);
        }
    }

    /// Split a full leaf into four children and redistribute its items.
    fn split(&mut self, index: usize) {
        let first = self.nodes.len() as u32;
        let bounds = self.nodes[index].bounds;
        let depth = self.nodes[index].depth + 1;

        for q in 0..4 {
            self.nodes.push(Node::new(bounds.quadrant(q), index as u32, depth));
        }

        let items = std::mem::take(&mut self.nodes[index].items);
        self.nodes[index].children = Some(first);
        for item in items {
            let child = first as usize + bounds.quadrant_of(item.x, item.y);
            self.nodes[child].items.push(item);
        }
    }

    /// Lazily iterate payloads whose point lies within `radius` of `(x, y)`.
    ///
    /// The returned iterator is single-pass; call `find` again to re-query.
    /// A non-positive radius only matches exactly coincident points.
    pub fn find(&self, x: f32, y: f32, radius: f32) -> Find<'_, T> {
        let radius = if radius > 0.0 { radius } else { 0.0 };
        let qx = scale_floor(x);
        let qy = scale_floor(y);
        let pad = scale_ceil(radius).saturating_add(1);

        let cursor = if self.nodes[0].scaled.padded_contains(qx, qy, pad) {
            Cursor::Node { node: 0, item: 0 }
        } else {
            Cursor::Overflow { item: 0 }
        };

        Find {
            tree: self,
            x,
            y,
            radius_sq: radius * radius,
            qx,
            qy,
            pad,
            cursor,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Cursor {
    Node { node: u32, item: usize },
    Overflow { item: usize },
    Done,
}

/// Single-pass radius query over a [`QuadTree`].
pub struct Find<'a, T> {
    tree: &'a QuadTree<T>,
    x: f32,
    y: f32,
    radius_sq: f32,
    qx: i64,
    qy: i64,
    pad: i64,
    cursor: Cursor,
}

impl<'a, T> Find<'a, T> {
    #[inline]
    fn matches(&self, item: &Item<T>) -> bool {
        let dx = item.x - self.x;
        let dy = item.y - self.y;
        dx * dx + dy * dy <= self.radius_sq
    }

    /// First child at or after `start` whose padded bounds hold the query.
    fn overlapping_child(&self, first: u32, start: usize) -> Option<u32> {
        (start..4)
            .map(|i| first + i as u32)
            .find(|&c| self.tree.nodes[c as usize].scaled.padded_contains(self.qx, self.qy, self.pad))
    }

    /// Next node in depth-first order, climbing back through ancestors
    /// when a subtree is exhausted. `None` once the root is passed.
    fn next_node(&self, node: u32) -> Option<u32> {
        let nodes = &self.tree.nodes;

        if let Some(first) = nodes[node as usize].children {
            if let Some(child) = self.overlapping_child(first, 0) {
                return Some(child);
            }
        }

        let mut current = node;
        loop {
            let parent = nodes[current as usize].parent;
            if parent == NO_PARENT {
                return None;
            }
            // Parent of any node is internal, so children is set.
            let first = nodes[parent as usize].children?;
            let sibling = (current - first) as usize;
            if let Some(next) = self.overlapping_child(first, sibling + 1) {
                return Some(next);
            }
            current = parent;
        }
    }
}

impl<'a, T> Iterator for Find<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let tree = self.tree;
        loop {
            match self.cursor {
                Cursor::Node { node, item } => {
                    let items = &tree.nodes[node as usize].items;
                    if let Some(candidate) = items.get(item) {
                        self.cursor = Cursor::Node { node, item: item + 1 };
                        if self.matches(candidate) {
                            return Some(&candidate.payload);
                        }
                        continue;
                    }
                    self.cursor = match self.next_node(node) {
                        Some(next) => Cursor::Node { node: next, item: 0 },
                        None => Cursor::Overflow { item: 0 },
                    };
                }
                Cursor::Overflow { item } => {
                    let Some(candidate) = tree.overflow.get(item) else {
                        self.cursor = Cursor::Done;
                        return None;
                    };
                    self.cursor = Cursor::Overflow { item: item + 1 };
                    if self.matches(candidate) {
                        return Some(&candidate.payload);
                    }
                }
                Cursor::Done => return None,
            }
        }
    }
}

impl<T> FusedIterator for Find<'_, T> {}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn tree() -> QuadTree<usize> {
        QuadTree::new(Bounds::around(Vec2::ZERO, 100.0))
    }

    fn sorted(iter: impl Iterator<Item = usize>) -> Vec<usize> {
        let mut v: Vec<usize> = iter.collect();
        v.sort_unstable();
        v
    }

    fn brute_force(points: &[(f32, f32)], x: f32, y: f32, r: f32) -> Vec<usize> {
        let r = if r > 0.0 { r } else { 0.0 };
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                let dx = p.0 - x;
                let dy = p.1 - y;
                dx * dx + dy * dy <= r * r
            })
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_find_in_small_tree() {
        let mut qt = tree();
        qt.insert(0.0, 0.0, 0);
        qt.insert(3.0, 4.0, 1);
        qt.insert(50.0, 50.0, 2);

        assert_eq!(sorted(qt.find(0.0, 0.0, 5.0).copied()), vec![0, 1]);
        assert_eq!(sorted(qt.find(0.0, 0.0, 4.99).copied()), vec![0]);
        assert_eq!(sorted(qt.find(50.0, 50.0, 0.1).copied()), vec![2]);
    }

    #[test]
    fn test_split_redistributes_items() {
        let mut qt = tree();
        for i in 0..=NODE_CAPACITY {
            qt.insert(i as f32 * 10.0 - 40.0, 5.0, i);
        }
        assert!(qt.node_count() > 1, "full leaf should split");
        // Root is internal now and holds nothing itself.
        assert!(qt.nodes[0].items.is_empty());
        assert_eq!(sorted(qt.find(0.0, 0.0, 200.0).copied()), (0..=NODE_CAPACITY).collect::<Vec<_>>());
    }

    #[test]
    fn test_coincident_points_stop_at_max_depth() {
        let mut qt = tree();
        for i in 0..200 {
            qt.insert(1.25, -7.5, i);
        }
        assert!(qt.nodes.iter().all(|n| n.depth <= MAX_DEPTH));
        assert_eq!(qt.find(1.25, -7.5, 0.0).count(), 200);
    }

    #[test]
    fn test_points_outside_root_are_found() {
        let mut qt = tree();
        qt.insert(500.0, 0.0, 7);
        qt.insert(0.0, 0.0, 8);
        assert_eq!(qt.len(), 2);
        assert_eq!(sorted(qt.find(499.0, 0.0, 2.0).copied()), vec![7]);
        assert_eq!(sorted(qt.find(0.0, 0.0, 1000.0).copied()), vec![7, 8]);
    }

    #[test]
    fn test_zero_and_negative_radius_match_exact_points_only() {
        let mut qt = tree();
        qt.insert(2.0, 2.0, 0);
        qt.insert(2.0, 2.001, 1);
        assert_eq!(sorted(qt.find(2.0, 2.0, 0.0).copied()), vec![0]);
        assert_eq!(sorted(qt.find(2.0, 2.0, -3.0).copied()), vec![0]);
    }

    #[test]
    fn test_clear_reuses_structure() {
        let mut qt = tree();
        let mut rng = StdRng::seed_from_u64(42);
        let points: Vec<(f32, f32)> = (0..500)
            .map(|_| (rng.gen_range(-100.0..100.0), rng.gen_range(-100.0..100.0)))
            .collect();

        for (i, &(x, y)) in points.iter().enumerate() {
            qt.insert(x, y, i);
        }
        let nodes = qt.node_count();

        qt.clear();
        assert!(qt.is_empty());
        assert_eq!(qt.node_count(), nodes);

        for (i, &(x, y)) in points.iter().enumerate() {
            qt.insert(x, y, i);
        }
        assert_eq!(qt.node_count(), nodes, "same points must not allocate new nodes");
        assert_eq!(sorted(qt.find(10.0, -20.0, 30.0).copied()), brute_force(&points, 10.0, -20.0, 30.0));
    }

    #[test]
    fn test_find_is_single_pass() {
        let mut qt = tree();
        qt.insert(1.0, 1.0, 0);
        let mut found = qt.find(1.0, 1.0, 1.0);
        assert_eq!(found.next(), Some(&0));
        assert_eq!(found.next(), None);
        assert_eq!(found.next(), None);
    }

    fn coord() -> impl Strategy<Value = f32> {
        // Mostly inside the root, sometimes outside it, with deliberate
        // duplicates from a coarse grid.
        prop_oneof![
            -100.0f32..100.0,
            -150.0f32..150.0,
            (-4i32..4).prop_map(|v| v as f32 * 12.5),
        ]
    }

    proptest! {
        #[test]
        fn prop_find_matches_brute_force(
            points in prop::collection::vec((coord(), coord()), 0..300),
            qx in coord(),
            qy in coord(),
            r in -1.0f32..80.0,
        ) {
            let mut qt = tree();
            for (i, &(x, y)) in points.iter().enumerate() {
                qt.insert(x, y, i);
            }
            prop_assert_eq!(sorted(qt.find(qx, qy, r).copied()), brute_force(&points, qx, qy, r));
        }

        #[test]
        fn prop_find_ignores_insertion_order(
            points in prop::collection::vec((coord(), coord()), 0..200),
            qx in coord(),
            qy in coord(),
            r in 0.0f32..60.0,
        ) {
            let mut forward = tree();
            let mut backward = tree();
            for (i, &(x, y)) in points.iter().enumerate() {
                forward.insert(x, y, i);
            }
            for (i, &(x, y)) in points.iter().enumerate().rev() {
                backward.insert(x, y, i);
            }
            prop_assert_eq!(sorted(forward.find(qx, qy, r).copied()), sorted(backward.find(qx, qy, r).copied()));
        }

        #[test]
        fn prop_clear_empties_every_query(
            points in prop::collection::vec((coord(), coord()), 0..200),
            qx in coord(),
            qy in coord(),
            clears in 1usize..4,
        ) {
            let mut qt = tree();
            for (i, &(x, y)) in points.iter().enumerate() {
                qt.insert(x, y, i);
            }
            let nodes = qt.node_count();
            for _ in 0..clears {
                qt.clear();
            }
            prop_assert_eq!(qt.node_count(), nodes);
            prop_assert!(qt.is_empty());
            prop_assert_eq!(qt.find(qx, qy, 1000.0).count(), 0);
        }
    }
}
