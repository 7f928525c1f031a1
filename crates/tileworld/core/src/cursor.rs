//! Relative addressing: offsets from an origin cell.

use arrayvec::ArrayVec;

use crate::config::EngineConfig;
use crate::types::{Cell, Direction};

type Steps = ArrayVec<Direction, { EngineConfig::MAX_OFFSETS }>;

/// Up to two cardinal steps away from an origin. `Direction::None` steps are dropped.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offset {
    steps: Steps,
}

impl Offset {
    /// The origin cell itself.
    pub fn here() -> Self {
        Self::default()
    }

    pub fn toward(direction: Direction) -> Self {
        Self::pair(direction, Direction::None)
    }

    /// Two steps applied in order, e.g. `Left` then `Up` for the upper-left diagonal.
    pub fn pair(first: Direction, second: Direction) -> Self {
        let steps = [first, second]
            .into_iter()
            .filter(|dir| *dir != Direction::None)
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[Direction] {
        &self.steps
    }

    pub fn is_here(&self) -> bool {
        self.steps.is_empty()
    }

    /// Direction under which a query result is remembered: `None` for the origin
    /// itself, the single step for a neighbour, nothing for two-step probes.
    pub fn target_key(&self) -> Option<Direction> {
        match self.steps.as_slice() {
            [] => Some(Direction::None),
            [single] => Some(*single),
            _ => None,
        }
    }
}

impl From<Direction> for Offset {
    fn from(direction: Direction) -> Self {
        Self::toward(direction)
    }
}

/// Immutable grid coordinate derived from an origin plus an [`Offset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cursor {
    cell: Cell,
}

impl Cursor {
    pub fn new(origin: Cell, offset: &Offset) -> Self {
        let cell = offset
            .steps()
            .iter()
            .fold(origin, |cell, dir| cell.step(*dir));
        Self { cell }
    }

    pub const fn at(cell: Cell) -> Self {
        Self { cell }
    }

    pub const fn cell(&self) -> Cell {
        self.cell
    }

    pub const fn column(&self) -> i32 {
        self.cell.col
    }

    pub const fn row(&self) -> i32 {
        self.cell.row
    }
}

impl From<Cell> for Cursor {
    fn from(cell: Cell) -> Self {
        Self::at(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_apply_in_order() {
        let origin = Cell::new(5, 5);
        let diagonal = Cursor::new(origin, &Offset::pair(Direction::Left, Direction::Up));
        assert_eq!(diagonal.cell(), Cell::new(4, 4));

        let back = Cursor::new(origin, &Offset::pair(Direction::Left, Direction::Right));
        assert_eq!(back.cell(), origin);
    }

    #[test]
    fn none_steps_are_dropped() {
        let offset = Offset::pair(Direction::None, Direction::Down);
        assert_eq!(offset.steps(), &[Direction::Down]);
        assert_eq!(offset.target_key(), Some(Direction::Down));
        assert!(Offset::toward(Direction::None).is_here());
    }

    #[test]
    fn only_single_step_probes_have_target_keys() {
        assert_eq!(Offset::here().target_key(), Some(Direction::None));
        assert_eq!(
            Offset::pair(Direction::Left, Direction::Down).target_key(),
            None
        );
    }

    #[test]
    fn here_is_the_origin() {
        let origin = Cell::new(2, 9);
        let cursor = Cursor::new(origin, &Offset::here());
        assert_eq!((cursor.column(), cursor.row()), (2, 9));
    }
}
