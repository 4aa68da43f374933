//! Toroidal grid of cell states.
//!
//! Cells are stored row-major as bytes: `0` is inactive, any other value is
//! active (embedding runs use one byte per class label). Every read through
//! a signed coordinate goes through [`wrap`], so lookups cannot leave the
//! grid.

use serde::{Deserialize, Serialize};

use super::NeighborhoodTemplate;

/// State byte of an inactive cell.
pub const INACTIVE: u8 = 0;

/// Default state byte of an active cell.
pub const ACTIVE: u8 = 255;

/// Wrap a signed coordinate onto a torus of the given size.
#[inline]
pub fn wrap(coord: i64, size: usize) -> usize {
    coord.rem_euclid(size as i64) as usize
}

/// A normalized grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    #[inline]
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Translate by `(dx, dy)` with wraparound.
    #[inline]
    pub fn offset(self, dx: i64, dy: i64, size: usize) -> Self {
        Self {
            x: wrap(self.x as i64 + dx, size),
            y: wrap(self.y as i64 + dy, size),
        }
    }
}

/// Fixed-size `size × size` toroidal grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    cells: Vec<u8>,
}

impl Grid {
    /// Create an all-inactive grid.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![INACTIVE; size * size],
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Row-major cell data.
    #[inline]
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    #[inline]
    fn idx(&self, at: Coord) -> usize {
        at.y * self.size + at.x
    }

    /// Cell state at a normalized position.
    #[inline]
    pub fn get(&self, at: Coord) -> u8 {
        self.cells[self.idx(at)]
    }

    /// Cell state at a signed position, wrapped onto the torus.
    #[inline]
    pub fn get_wrapped(&self, x: i64, y: i64) -> u8 {
        self.cells[wrap(y, self.size) * self.size + wrap(x, self.size)]
    }

    #[inline]
    pub fn set(&mut self, at: Coord, value: u8) {
        let idx = self.idx(at);
        self.cells[idx] = value;
    }

    #[inline]
    pub fn is_active(&self, at: Coord) -> bool {
        self.get(at) != INACTIVE
    }

    /// Exchange two cell states in place.
    #[inline]
    pub fn swap(&mut self, a: Coord, b: Coord) {
        let (ia, ib) = (self.idx(a), self.idx(b));
        self.cells.swap(ia, ib);
    }

    /// Copy of this grid with `a` and `b` exchanged.
    pub fn with_swap(&self, a: Coord, b: Coord) -> Self {
        let mut next = self.clone();
        next.swap(a, b);
        next
    }

    /// Sample the trace around `center`, in template order.
    pub fn sample_trace(&self, center: Coord, template: &NeighborhoodTemplate) -> Vec<u8> {
        let (cx, cy) = (center.x as i64, center.y as i64);
        template
            .offsets()
            .iter()
            .map(|o| self.get_wrapped(cx + o.dx, cy + o.dy))
            .collect()
    }

    /// All positions, row-major.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        let size = self.size;
        (0..size * size).map(move |i| Coord::new(i % size, i / size))
    }

    /// Positions of active cells, row-major.
    pub fn active_cells(&self) -> Vec<Coord> {
        self.coords().filter(|&c| self.is_active(c)).collect()
    }

    /// Positions of inactive cells, row-major.
    pub fn inactive_cells(&self) -> Vec<Coord> {
        self.coords().filter(|&c| !self.is_active(c)).collect()
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != INACTIVE).count()
    }
}
