//! Rectangular grid storage and sub-cell geometry.

use crate::error::BuildError;
use crate::types::{Cell, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.col >= 0
            && cell.row >= 0
            && (cell.col as u32) < self.width
            && (cell.row as u32) < self.height
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        self.contains(cell)
            .then(|| cell.row as usize * self.width as usize + cell.col as usize)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        let (width, height) = (self.width as i32, self.height as i32);
        (0..height).flat_map(move |row| (0..width).map(move |col| Cell::new(col, row)))
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// One value per cell, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer<T> {
    dims: Dimensions,
    cells: Vec<T>,
}

impl<T: Clone> Layer<T> {
    pub fn filled(dims: Dimensions, value: T) -> Self {
        Self {
            dims,
            cells: vec![value; dims.area()],
        }
    }

    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }
}

impl<T> Layer<T> {
    /// Builds a layer from rows of equal length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, BuildError> {
        let expected = rows.first().map(Vec::len).unwrap_or(0);
        if rows.is_empty() || expected == 0 {
            return Err(BuildError::EmptyLevel);
        }
        if let Some((row, found)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != expected)
        {
            return Err(BuildError::RaggedRows {
                row,
                found,
                expected,
            });
        }

        let dims = Dimensions::new(expected as u32, rows.len() as u32);
        Ok(Self {
            dims,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn get(&self, cell: Cell) -> Option<&T> {
        self.dims.index(cell).map(|index| &self.cells[index])
    }

    /// Writes `value` at `cell`; returns false when the cell is outside the grid.
    pub fn set(&mut self, cell: Cell, value: T) -> bool {
        match self.dims.index(cell) {
            Some(index) => {
                self.cells[index] = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, &T)> + '_ {
        self.dims.cells().zip(self.cells.iter())
    }

    /// Same-shaped layer built from this one, cell by cell.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Layer<U> {
        Layer {
            dims: self.dims,
            cells: self.cells.iter().map(f).collect(),
        }
    }
}

/// Conversion between continuous sub-cell coordinates and cell indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    tile_bits: u8,
}

impl Geometry {
    pub const fn new(tile_bits: u8) -> Self {
        Self { tile_bits }
    }

    pub const fn cell_size(self) -> i32 {
        1 << self.tile_bits
    }

    /// Index of the cell containing `coord`. Floors for negative coordinates.
    pub const fn cell_index(self, coord: i32) -> i32 {
        coord >> self.tile_bits
    }

    pub const fn centre(self, index: i32) -> i32 {
        (index << self.tile_bits) + (self.cell_size() >> 1)
    }

    /// Centre of the cell containing `coord`, i.e. the nearest cell centre.
    pub const fn centre_of(self, coord: i32) -> i32 {
        self.centre(self.cell_index(coord))
    }

    pub const fn is_centred(self, coord: i32) -> bool {
        self.centre_of(coord) == coord
    }

    /// Nearest cell centre at or beyond `coord` when travelling with `sign`.
    pub const fn centre_ahead(self, coord: i32, sign: i32) -> i32 {
        let here = self.centre_of(coord);
        if sign > 0 && here < coord {
            here + self.cell_size()
        } else if sign < 0 && here > coord {
            here - self.cell_size()
        } else {
            here
        }
    }

    pub const fn cell_of(self, point: Point) -> Cell {
        Cell::new(self.cell_index(point.x), self.cell_index(point.y))
    }

    pub const fn point_of(self, cell: Cell) -> Point {
        Point::new(self.centre(cell.col), self.centre(cell.row))
    }
}
