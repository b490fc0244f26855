//! Uniform spatial hash grid
//!
//! Intrusive singly-linked lists over the enemy index space: `heads[cell]`
//! holds the first enemy in a cell, `next[enemy]` its successor, `-1` ends a
//! chain. Rebuilt from scratch once per frame; only cells touched by the
//! previous build are cleared. Positions outside the grid are not indexed.

use super::store::EnemyStore;

const EMPTY: i32 = -1;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    dim: usize,
    /// Shifts world coordinates so the grid is centered on the origin
    world_offset: f32,
    heads: Vec<i32>,
    next: Vec<i32>,
    occupied: Vec<u32>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32, dim: usize, capacity: usize) -> Self {
        Self {
            cell_size,
            dim,
            world_offset: dim as f32 * cell_size / 2.0,
            heads: vec![EMPTY; dim * dim],
            next: vec![EMPTY; capacity],
            occupied: Vec::with_capacity(capacity.min(dim * dim)),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Unclipped cell coordinates for a world position
    #[inline]
    pub fn cell_coords(&self, x: f32, y: f32) -> (i32, i32) {
        (
            ((x + self.world_offset) / self.cell_size).floor() as i32,
            ((y + self.world_offset) / self.cell_size).floor() as i32,
        )
    }

    /// Flat cell index, `None` outside the grid
    #[inline]
    pub fn cell_index(&self, x: f32, y: f32) -> Option<usize> {
        let (gx, gy) = self.cell_coords(x, y);
        let dim = self.dim as i32;
        if gx >= 0 && gx < dim && gy >= 0 && gy < dim {
            Some(gy as usize * self.dim + gx as usize)
        } else {
            None
        }
    }

    /// Empty every occupied cell
    pub fn clear(&mut self) {
        for &cell in &self.occupied {
            self.heads[cell as usize] = EMPTY;
        }
        self.occupied.clear();
    }

    /// Re-index enemies `0..count` that are alive or dying
    pub fn rebuild(&mut self, store: &EnemyStore, count: usize) {
        self.clear();
        let count = count.min(self.next.len());
        for i in 0..count {
            if !store.is_live(i) {
                continue;
            }
            let (x, y) = store.position(i);
            let Some(cell) = self.cell_index(x, y) else {
                continue;
            };
            if self.heads[cell] == EMPTY {
                self.occupied.push(cell as u32);
            }
            self.next[i] = self.heads[cell];
            self.heads[cell] = i as i32;
        }
    }

    /// Number of non-empty cells after the last rebuild
    pub fn occupied_count(&self) -> usize {
        self.occupied.len()
    }

    /// Enemies in one cell
    #[inline]
    pub fn chain(&self, cell: usize) -> Chain<'_> {
        Chain {
            next: &self.next,
            cursor: self.heads[cell],
        }
    }

    /// Cells covering the square `[x-r, x+r] x [y-r, y+r]`, clipped to the grid.
    ///
    /// The square is measured in whole cells around the cell containing the
    /// center, matching `ceil(r / cell_size)` rings.
    pub fn cells_around(&self, x: f32, y: f32, radius: f32) -> CellRange {
        let (cx, cy) = self.cell_coords(x, y);
        let rings = (radius / self.cell_size).ceil().max(0.0) as i32;
        let max = self.dim as i32 - 1;
        let x0 = cx.saturating_sub(rings).max(0);
        let x1 = cx.saturating_add(rings).min(max);
        let y0 = cy.saturating_sub(rings).max(0);
        let y1 = cy.saturating_add(rings).min(max);
        CellRange {
            dim: self.dim,
            x0,
            x1,
            y1,
            gx: x0,
            gy: y0,
        }
    }

    /// Candidate enemies near a point. Callers filter by exact distance.
    pub fn query_radius(&self, x: f32, y: f32, radius: f32) -> impl Iterator<Item = usize> + '_ {
        self.cells_around(x, y, radius)
            .flat_map(move |cell| self.chain(cell))
    }
}

/// Iterator over one cell's linked list
pub struct Chain<'a> {
    next: &'a [i32],
    cursor: i32,
}

impl Iterator for Chain<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.cursor < 0 {
            return None;
        }
        let index = self.cursor as usize;
        self.cursor = self.next[index];
        Some(index)
    }
}

/// Row-major iterator over a clipped block of cells
pub struct CellRange {
    dim: usize,
    x0: i32,
    x1: i32,
    y1: i32,
    gx: i32,
    gy: i32,
}

impl Iterator for CellRange {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.x0 > self.x1 || self.gy > self.y1 {
            return None;
        }
        let cell = self.gy as usize * self.dim + self.gx as usize;
        self.gx += 1;
        if self.gx > self.x1 {
            self.gx = self.x0;
            self.gy += 1;
        }
        Some(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::store::field;
    use proptest::prelude::*;

    fn store_with(points: &[(f32, f32, f32)]) -> EnemyStore {
        let mut store = EnemyStore::new(points.len());
        for (i, &(x, y, health)) in points.iter().enumerate() {
            store.set(i, field::X, x);
            store.set(i, field::Y, y);
            store.set(i, field::HEALTH, health);
        }
        store
    }

    #[test]
    fn test_cell_index_centered() {
        let grid = SpatialGrid::new(4800.0, 400, 1);
        assert_eq!(grid.cell_index(0.0, 0.0), Some(200 * 400 + 200));
        assert_eq!(grid.cell_index(-1.0, -1.0), Some(199 * 400 + 199));
        assert_eq!(grid.cell_index(960_000.0, 0.0), None);
        assert_eq!(grid.cell_index(-960_001.0, 0.0), None);
    }

    #[test]
    fn test_rebuild_skips_dead_and_out_of_bounds() {
        let store = store_with(&[
            (0.0, 0.0, 10.0),
            (10.0, 10.0, 0.0),
            (5e7, 0.0, 10.0),
            (20.0, 20.0, 10.0),
        ]);
        let mut grid = SpatialGrid::new(4800.0, 400, 4);
        grid.rebuild(&store, 4);
        let cell = grid.cell_index(0.0, 0.0).unwrap();
        let mut members: Vec<usize> = grid.chain(cell).collect();
        members.sort();
        assert_eq!(members, vec![0, 3]);
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn test_dying_entities_stay_indexed() {
        let mut store = store_with(&[(0.0, 0.0, 0.0)]);
        store.set(0, field::DEATH, 3.0);
        let mut grid = SpatialGrid::new(4800.0, 400, 1);
        grid.rebuild(&store, 1);
        assert_eq!(grid.query_radius(0.0, 0.0, 10.0).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_rebuild_clears_previous_cells() {
        let mut store = store_with(&[(0.0, 0.0, 10.0)]);
        let mut grid = SpatialGrid::new(4800.0, 400, 1);
        grid.rebuild(&store, 1);
        store.set(0, field::X, 50_000.0);
        grid.rebuild(&store, 1);
        let old = grid.cell_index(0.0, 0.0).unwrap();
        assert_eq!(grid.chain(old).count(), 0);
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn test_cells_around_clips_to_grid() {
        let grid = SpatialGrid::new(100.0, 4, 1);
        // Corner cell with one ring: 2x2 block survives clipping
        assert_eq!(grid.cells_around(-199.0, -199.0, 50.0).count(), 4);
        assert_eq!(grid.cells_around(0.0, 0.0, 50.0).count(), 9);
        assert_eq!(grid.cells_around(1e6, 1e6, 50.0).count(), 0);
    }

    #[test]
    fn test_query_radius_finds_neighbors() {
        let store = store_with(&[(0.0, 0.0, 1.0), (5000.0, 0.0, 1.0), (20000.0, 0.0, 1.0)]);
        let mut grid = SpatialGrid::new(4800.0, 400, 3);
        grid.rebuild(&store, 3);
        let mut found: Vec<usize> = grid.query_radius(0.0, 0.0, 900.0).collect();
        found.sort();
        assert_eq!(found, vec![0, 1]);
    }

    proptest! {
        #[test]
        fn prop_every_live_entity_is_in_its_cell(
            points in proptest::collection::vec((-900_000.0f32..900_000.0, -900_000.0f32..900_000.0, -5.0f32..5.0), 1..64)
        ) {
            let store = store_with(&points);
            let mut grid = SpatialGrid::new(4800.0, 400, points.len());
            grid.rebuild(&store, points.len());
            for (i, &(x, y, health)) in points.iter().enumerate() {
                let cell = grid.cell_index(x, y);
                let indexed = cell.map(|c| grid.chain(c).any(|e| e == i)).unwrap_or(false);
                prop_assert_eq!(indexed, health > 0.0 && cell.is_some());
            }
        }
    }
}
