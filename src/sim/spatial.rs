//! Uniform-grid spatial index for collision candidate pruning.
//!
//! Entities register the full set of cells their AABB overlaps, so any two
//! overlapping AABBs share at least one cell and `query_candidates` can never
//! miss a true pair. Results are a conservative superset: callers must still
//! run the precise shape test.
//!
//! Cell size ([`crate::consts::GRID_CELL_SIZE`]) must exceed the largest
//! hitbox extent; with that invariant an entity spans at most 2x2 cells and
//! queries stay O(1) in cell count.

use std::collections::HashMap;

use glam::Vec2;

use super::registry::EntityId;

/// Inclusive cell-coordinate rectangle an entity currently occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellSpan {
    min: (i32, i32),
    max: (i32, i32),
}

/// The spatial index. Owned by the world, rebuilt incrementally.
#[derive(Debug, Default)]
pub struct SpatialGrid {
    cells: HashMap<(i32, i32), Vec<EntityId>>,
    /// Where each live id was inserted, so remove/update need no caller-side
    /// position bookkeeping.
    spans: HashMap<EntityId, CellSpan>,
}

impl SpatialGrid {
    pub fn new() -> Self {
        Self::default()
    }

    fn world_to_cell(pos: Vec2) -> (i32, i32) {
        let size = crate::consts::GRID_CELL_SIZE;
        ((pos.x / size).floor() as i32, (pos.y / size).floor() as i32)
    }

    fn span_of(center: Vec2, half: Vec2) -> CellSpan {
        CellSpan {
            min: Self::world_to_cell(center - half),
            max: Self::world_to_cell(center + half),
        }
    }

    /// Register an entity's AABB. Re-inserting a live id re-buckets it.
    pub fn insert(&mut self, id: EntityId, center: Vec2, half: Vec2) {
        if self.spans.contains_key(&id) {
            self.remove(id);
        }
        let span = Self::span_of(center, half);
        for cx in span.min.0..=span.max.0 {
            for cy in span.min.1..=span.max.1 {
                self.cells.entry((cx, cy)).or_default().push(id);
            }
        }
        self.spans.insert(id, span);
    }

    /// Drop an entity from the index. Unknown ids are a no-op.
    pub fn remove(&mut self, id: EntityId) {
        let Some(span) = self.spans.remove(&id) else {
            return;
        };
        for cx in span.min.0..=span.max.0 {
            for cy in span.min.1..=span.max.1 {
                if let Some(bucket) = self.cells.get_mut(&(cx, cy)) {
                    bucket.retain(|&other| other != id);
                    if bucket.is_empty() {
                        self.cells.remove(&(cx, cy));
                    }
                }
            }
        }
    }

    /// Re-bucket a moved entity. Cheap no-op while it stays within its cells.
    pub fn update(&mut self, id: EntityId, center: Vec2, half: Vec2) {
        let span = Self::span_of(center, half);
        if self.spans.get(&id) == Some(&span) {
            return;
        }
        self.remove(id);
        for cx in span.min.0..=span.max.0 {
            for cy in span.min.1..=span.max.1 {
                self.cells.entry((cx, cy)).or_default().push(id);
            }
        }
        self.spans.insert(id, span);
    }

    /// All ids sharing a cell with `id`, sorted and deduplicated, excluding
    /// `id` itself. Superset of true overlaps; no false negatives.
    pub fn query_candidates(&self, id: EntityId) -> Vec<EntityId> {
        let Some(span) = self.spans.get(&id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for cx in span.min.0..=span.max.0 {
            for cy in span.min.1..=span.max.1 {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    out.extend(bucket.iter().copied().filter(|&other| other != id));
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Drop everything (level reload).
    pub fn clear(&mut self) {
        self.cells.clear();
        self.spans.clear();
    }
}
