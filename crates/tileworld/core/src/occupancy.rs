//! Layered spatial model: terrain, per-frame occupancy, per-frame multiplicity.
//!
//! The terrain layer is authoritative and persists across frames. The other two
//! are rebuilt from the roster at the start of every frame:
//!
//! - occupancy holds the terrain code of unclaimed cells, or the first actor
//!   found on the cell during the roster scan;
//! - multiplicity marks cells where a second actor was found.
//!
//! Queries on a cell without multiplicity are answered from the layers alone.
//! Cells with multiplicity answer [`Count::Ambiguous`] and callers fall back to
//! an exact roster scan.

use crate::actor::Actor;
use crate::error::EngineError;
use crate::grid::{Dimensions, Layer};
use crate::registry::CodeTable;
use crate::types::{ActorId, ActorKind, Cell, TerrainCode};

/// What the occupancy layer holds for one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Occupant {
    Terrain(TerrainCode),
    Actor {
        id: ActorId,
        code: TerrainCode,
        kind: ActorKind,
    },
}

impl Occupant {
    pub fn code(&self) -> TerrainCode {
        match self {
            Self::Terrain(code) | Self::Actor { code, .. } => *code,
        }
    }

    pub fn actor(&self) -> Option<ActorId> {
        match self {
            Self::Actor { id, .. } => Some(*id),
            Self::Terrain(_) => None,
        }
    }
}

/// Result of a layer-level count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Count {
    Exact(usize),
    /// Several actors share the cell; the layers cannot tell how many match.
    Ambiguous,
}

impl Count {
    pub fn exact(self) -> Option<usize> {
        match self {
            Self::Exact(n) => Some(n),
            Self::Ambiguous => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OccupancyModel {
    terrain: Layer<TerrainCode>,
    occupancy: Layer<Occupant>,
    multiple: Layer<bool>,
}

impl OccupancyModel {
    pub fn new(terrain: Layer<TerrainCode>) -> Self {
        let occupancy = terrain.map(|code| Occupant::Terrain(*code));
        let multiple = Layer::filled(terrain.dimensions(), false);
        Self {
            terrain,
            occupancy,
            multiple,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.terrain.dimensions()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.dimensions().contains(cell)
    }

    pub fn terrain(&self) -> &Layer<TerrainCode> {
        &self.terrain
    }

    pub fn terrain_at(&self, cell: Cell) -> Option<TerrainCode> {
        self.terrain.get(cell).copied()
    }

    /// Writes the terrain layer. Occupancy picks the change up at the next recompute.
    pub(crate) fn set_terrain(&mut self, cell: Cell, code: TerrainCode) -> bool {
        self.terrain.set(cell, code)
    }

    /// Rebuilds occupancy and multiplicity from `actors`, scanned in order.
    ///
    /// The first actor found on a cell claims it; later ones only set the
    /// multiplicity bit. Actors outside the grid are skipped.
    pub fn recompute<'a>(&mut self, actors: impl IntoIterator<Item = &'a Actor>) {
        for (cell, code) in self.terrain.iter() {
            self.occupancy.set(cell, Occupant::Terrain(*code));
        }
        self.multiple.fill(false);

        for actor in actors {
            let cell = actor.cell();
            match self.occupancy.get(cell) {
                None => {}
                Some(Occupant::Actor { .. }) => {
                    self.multiple.set(cell, true);
                }
                Some(Occupant::Terrain(_)) => {
                    self.occupancy.set(
                        cell,
                        Occupant::Actor {
                            id: actor.id(),
                            code: actor.code(),
                            kind: actor.kind(),
                        },
                    );
                }
            }
        }
    }

    pub fn occupant(&self, cell: Cell) -> Option<Occupant> {
        self.occupancy.get(cell).copied()
    }

    pub fn is_multiple(&self, cell: Cell) -> bool {
        self.multiple.get(cell).copied().unwrap_or(false)
    }

    pub fn has_actor(&self, cell: Cell) -> bool {
        matches!(self.occupant(cell), Some(Occupant::Actor { .. }))
    }

    /// Terrain-only check; actors standing on the cell are ignored.
    pub fn tile_is(&self, code: TerrainCode, cell: Cell) -> bool {
        self.terrain_at(cell) == Some(code)
    }

    /// How many things with `code` are at `cell`.
    ///
    /// Codes that are not movable live only in the terrain layer and are never
    /// ambiguous. Movable codes are looked up in the occupancy layer.
    pub fn count_code_at(&self, codes: &CodeTable, code: TerrainCode, cell: Cell) -> Count {
        if !codes.is_movable(code) {
            return Count::Exact(usize::from(self.tile_is(code, cell)));
        }
        self.count_actors(cell, |occupant| occupant.code() == code)
    }

    pub fn count_kind_at(&self, kind: ActorKind, cell: Cell) -> Count {
        self.count_actors(cell, |occupant| {
            matches!(occupant, Occupant::Actor { kind: k, .. } if *k == kind)
        })
    }

    fn count_actors(&self, cell: Cell, matches: impl Fn(&Occupant) -> bool) -> Count {
        if self.is_multiple(cell) {
            return Count::Ambiguous;
        }
        match self.occupant(cell) {
            Some(occupant @ Occupant::Actor { .. }) => Count::Exact(usize::from(matches(&occupant))),
            _ => Count::Exact(0),
        }
    }

    /// Cross-checks the derived layers against the actors they were built from.
    pub fn verify<'a>(&self, actors: impl IntoIterator<Item = &'a Actor>) -> Result<(), EngineError> {
        let mut counts = Layer::filled(self.dimensions(), 0u32);
        for actor in actors {
            let cell = actor.cell();
            if let Some(n) = counts.get(cell).copied() {
                counts.set(cell, n + 1);
            }
        }

        for (cell, n) in counts.iter() {
            let claimed = self.has_actor(cell);
            let detail = match (*n, claimed, self.is_multiple(cell)) {
                (0, true, _) => "cell claimed by an actor that is not there",
                (0, false, true) | (1, _, true) => "multiplicity set with fewer than two actors",
                (1.., false, _) => "occupied cell left unclaimed",
                (2.., _, false) => "several actors without multiplicity",
                _ => continue,
            };
            return Err(EngineError::OccupancyDesync { cell, detail });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Geometry;
    use crate::registry::{CodeSpec, Mobility};
    use crate::types::ArtHandle;

    const FLOOR: TerrainCode = TerrainCode(0);
    const WALL: TerrainCode = TerrainCode(1);
    const ROCK: TerrainCode = TerrainCode(2);
    const GEM: TerrainCode = TerrainCode(3);
    const FALLING: ActorKind = ActorKind(1);

    fn codes() -> CodeTable {
        let mut table = CodeTable::new();
        let fixed = |art| CodeSpec {
            art: ArtHandle(art),
            mobility: Mobility::Fixed,
        };
        let movable = |art| CodeSpec {
            art: ArtHandle(art),
            mobility: Mobility::Movable { kind: FALLING },
        };
        table.register(FLOOR, fixed(0)).unwrap();
        table.register(WALL, fixed(1)).unwrap();
        table.register(ROCK, movable(2)).unwrap();
        table.register(GEM, movable(3)).unwrap();
        table
    }

    fn model() -> OccupancyModel {
        let mut terrain = Layer::filled(Dimensions::new(8, 8), FLOOR);
        terrain.set(Cell::new(6, 5), WALL);
        OccupancyModel::new(terrain)
    }

    fn actor(id: u32, code: TerrainCode, col: i32, row: i32) -> Actor {
        Actor::new(
            ActorId(id),
            code,
            FALLING,
            Cell::new(col, row),
            Geometry::new(4),
        )
    }

    #[test]
    fn single_actor_claims_its_cell() {
        let mut model = model();
        let rock = actor(1, ROCK, 2, 2);
        model.recompute([&rock]);

        let cell = Cell::new(2, 2);
        assert!(model.has_actor(cell));
        assert_eq!(model.occupant(cell).and_then(|o| o.actor()), Some(ActorId(1)));
        assert_eq!(model.count_code_at(&codes(), ROCK, cell), Count::Exact(1));
        assert_eq!(model.count_code_at(&codes(), GEM, cell), Count::Exact(0));
        assert_eq!(model.count_kind_at(FALLING, cell), Count::Exact(1));
        // the terrain beneath is still visible to terrain queries
        assert!(model.tile_is(FLOOR, cell));
        assert!(model.verify([&rock]).is_ok());
    }

    #[test]
    fn second_actor_sets_multiplicity_without_overwriting() {
        let mut model = model();
        let first = actor(1, ROCK, 3, 3);
        let second = actor(2, GEM, 3, 3);
        model.recompute([&first, &second]);

        let cell = Cell::new(3, 3);
        assert!(model.is_multiple(cell));
        assert_eq!(model.occupant(cell).map(|o| o.code()), Some(ROCK));
        assert_eq!(model.count_code_at(&codes(), ROCK, cell), Count::Ambiguous);
        assert_eq!(model.count_kind_at(FALLING, cell), Count::Ambiguous);
        assert!(model.verify([&first, &second]).is_ok());
    }

    #[test]
    fn fixed_codes_answer_from_terrain() {
        let mut model = model();
        let wall_cell = Cell::new(6, 5);
        let a = actor(1, ROCK, 6, 5);
        let b = actor(2, ROCK, 6, 5);
        model.recompute([&a, &b]);

        assert_eq!(model.count_code_at(&codes(), WALL, wall_cell), Count::Exact(1));
        assert!(model.tile_is(WALL, wall_cell));
        assert!(!model.tile_is(ROCK, wall_cell));
    }

    #[test]
    fn out_of_bounds_holds_nothing() {
        let mut model = model();
        let stray = actor(1, ROCK, -1, 0);
        model.recompute([&stray]);

        let outside = Cell::new(-1, 0);
        assert_eq!(model.occupant(outside), None);
        assert!(!model.is_multiple(outside));
        assert!(!model.tile_is(FLOOR, outside));
        assert_eq!(model.count_code_at(&codes(), ROCK, outside), Count::Exact(0));
        assert_eq!(model.count_code_at(&codes(), FLOOR, outside), Count::Exact(0));
        assert!(model.verify([&stray]).is_ok());
    }

    #[test]
    fn recompute_forgets_last_frame() {
        let mut model = model();
        let rock = actor(1, ROCK, 1, 1);
        let other = actor(2, ROCK, 1, 1);
        model.recompute([&rock, &other]);
        assert!(model.is_multiple(Cell::new(1, 1)));

        let moved = actor(1, ROCK, 2, 1);
        model.recompute([&moved, &other]);
        assert!(!model.is_multiple(Cell::new(1, 1)));
        assert!(model.has_actor(Cell::new(2, 1)));
        assert!(model.has_actor(Cell::new(1, 1)));
    }

    #[test]
    fn set_terrain_is_seen_after_recompute() {
        let mut model = model();
        let cell = Cell::new(4, 4);
        assert!(model.set_terrain(cell, WALL));
        assert!(model.tile_is(WALL, cell));
        assert_eq!(model.occupant(cell), Some(Occupant::Terrain(FLOOR)));

        model.recompute(std::iter::empty());
        assert_eq!(model.occupant(cell), Some(Occupant::Terrain(WALL)));
        assert!(!model.set_terrain(Cell::new(8, 0), WALL));
    }

    #[test]
    fn verify_catches_stale_layers() {
        let mut model = model();
        let a = actor(1, ROCK, 5, 5);
        let b = actor(2, ROCK, 5, 5);
        model.recompute([&a]);

        let err = model.verify([&a, &b]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::OccupancyDesync { cell, .. } if cell == Cell::new(5, 5)
        ));
    }
}
