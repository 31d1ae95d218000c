//! Ring-structured arena grid and cell placement queries.

use laser_arena_core::{CellKind, GridBounds, GridCoord};
use rand::Rng;

use crate::Error;

/// Dense cell-kind map covering the arena bounds.
///
/// The outermost ring of cells hosts hazard units, the ring just inside it is
/// solid wall, and every remaining cell is open interior. The map is built
/// once per world and never resized.
#[derive(Clone, Debug, PartialEq)]
pub struct ArenaGrid {
    bounds: GridBounds,
    cells: Vec<CellKind>,
}

impl ArenaGrid {
    /// Builds the ring-structured grid for the provided bounds.
    ///
    /// Fails with [`Error::GridTooSmall`] when either axis spans fewer than
    /// five cells, since the perimeter and wall rings alone consume four.
    pub fn generate(bounds: GridBounds) -> Result<Self, Error> {
        if bounds.cells_x() < 5 || bounds.cells_y() < 5 {
            return Err(Error::GridTooSmall { bounds });
        }

        let capacity = usize::try_from(bounds.cells_x() * bounds.cells_y()).unwrap_or(0);
        let mut cells = Vec::with_capacity(capacity);
        for y in bounds.min_y()..=bounds.max_y() {
            for x in bounds.min_x()..=bounds.max_x() {
                cells.push(classify(bounds, GridCoord::new(x, y)));
            }
        }

        Ok(Self { bounds, cells })
    }

    /// Inclusive coordinate bounds covered by the grid.
    #[must_use]
    pub const fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// Kind of the provided cell, or `None` outside the bounds.
    #[must_use]
    pub fn kind(&self, cell: GridCoord) -> Option<CellKind> {
        self.index(cell).map(|index| self.cells[index])
    }

    /// Reports whether the player may occupy the provided cell.
    #[must_use]
    pub fn can_enter(&self, cell: GridCoord) -> bool {
        self.kind(cell)
            .is_some_and(|kind| !kind.is_obstructed())
    }

    /// Iterator over every open interior cell in row-major order.
    pub fn open_cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.iter_cells()
            .filter(|(_, kind)| *kind == CellKind::Open)
            .map(|(cell, _)| cell)
    }

    /// Perimeter cells hosting hazard units, in row-major order.
    #[must_use]
    pub fn perimeter_cells(&self) -> Vec<GridCoord> {
        self.iter_cells()
            .filter(|(_, kind)| *kind == CellKind::HazardPerimeter)
            .map(|(cell, _)| cell)
            .collect()
    }

    /// Selects uniformly at random among open cells other than `excluding`.
    ///
    /// Fails with [`Error::NoOpenCell`] when no candidate remains.
    pub fn random_open_cell<R: Rng>(
        &self,
        rng: &mut R,
        excluding: GridCoord,
    ) -> Result<GridCoord, Error> {
        let candidates: Vec<GridCoord> = self
            .open_cells()
            .filter(|cell| *cell != excluding)
            .collect();
        if candidates.is_empty() {
            return Err(Error::NoOpenCell);
        }
        Ok(candidates[rng.gen_range(0..candidates.len())])
    }

    fn iter_cells(&self) -> impl Iterator<Item = (GridCoord, CellKind)> + '_ {
        let bounds = self.bounds;
        let width = bounds.cells_x();
        self.cells.iter().enumerate().map(move |(index, kind)| {
            let index = index as i64;
            let x = bounds.min_x() as i64 + index % width;
            let y = bounds.min_y() as i64 + index / width;
            (GridCoord::new(x as i32, y as i32), *kind)
        })
    }

    fn index(&self, cell: GridCoord) -> Option<usize> {
        if !self.bounds.contains(cell) {
            return None;
        }
        let column = i64::from(cell.x()) - i64::from(self.bounds.min_x());
        let row = i64::from(cell.y()) - i64::from(self.bounds.min_y());
        usize::try_from(row * self.bounds.cells_x() + column).ok()
    }
}

fn classify(bounds: GridBounds, cell: GridCoord) -> CellKind {
    let from_edge_x = (cell.x() - bounds.min_x()).min(bounds.max_x() - cell.x());
    let from_edge_y = (cell.y() - bounds.min_y()).min(bounds.max_y() - cell.y());
    match from_edge_x.min(from_edge_y) {
        0 => CellKind::HazardPerimeter,
        1 => CellKind::Wall,
        _ => CellKind::Open,
    }
}
