//! Text levels: one glyph per cell, one line per row.
//!
//! | glyph | tile    | becomes an actor |
//! |-------|---------|------------------|
//! | `.`   | empty   | no               |
//! | `#`   | wall    | no               |
//! | `:`   | dirt    | no               |
//! | `P`   | player  | yes, [`HERO`]    |
//! | `o`   | rock    | yes, [`FALLING`] |
//! | `*`   | diamond | yes, [`FALLING`] |

use tileworld_core::{ActorKind, ArtHandle, Cell, Layer, TerrainCode, World};

use crate::error::{BoulderError, Result};

pub const EMPTY: TerrainCode = TerrainCode(0);
pub const WALL: TerrainCode = TerrainCode(1);
pub const DIRT: TerrainCode = TerrainCode(2);
pub const PLAYER: TerrainCode = TerrainCode(3);
pub const ROCK: TerrainCode = TerrainCode(4);
pub const DIAMOND: TerrainCode = TerrainCode(5);

pub const HERO: ActorKind = ActorKind(1);
/// Rocks and diamonds: anything gravity pulls on.
pub const FALLING: ActorKind = ActorKind(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub glyph: char,
    pub code: TerrainCode,
    /// Set for codes that are lifted out of the level as actors.
    pub kind: Option<ActorKind>,
}

impl Tile {
    const fn fixed(glyph: char, code: TerrainCode) -> Self {
        Self {
            glyph,
            code,
            kind: None,
        }
    }

    const fn movable(glyph: char, code: TerrainCode, kind: ActorKind) -> Self {
        Self {
            glyph,
            code,
            kind: Some(kind),
        }
    }

    pub fn art(&self) -> ArtHandle {
        ArtHandle(u32::from(self.code.0))
    }
}

pub const TILES: [Tile; 6] = [
    Tile::fixed('.', EMPTY),
    Tile::fixed('#', WALL),
    Tile::fixed(':', DIRT),
    Tile::movable('P', PLAYER, HERO),
    Tile::movable('o', ROCK, FALLING),
    Tile::movable('*', DIAMOND, FALLING),
];

pub const DEFAULT_LEVEL: &str = "\
##########
#P.:o:*..#
#.::.o:..#
#:*.:::o.#
#..o..:*.#
##########";

pub fn tile_for_glyph(glyph: char) -> Option<&'static Tile> {
    TILES.iter().find(|tile| tile.glyph == glyph)
}

pub fn glyph_of(code: TerrainCode) -> char {
    TILES
        .iter()
        .find(|tile| tile.code == code)
        .map_or('?', |tile| tile.glyph)
}

/// Parses a level. Blank lines are skipped and trailing whitespace trimmed.
pub fn parse_level(text: &str) -> Result<Layer<TerrainCode>> {
    let rows = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(row, line)| {
            line.chars()
                .enumerate()
                .map(|(col, glyph)| {
                    tile_for_glyph(glyph)
                        .map(|tile| tile.code)
                        .ok_or(BoulderError::UnknownGlyph { glyph, row, col })
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Layer::from_rows(rows)?)
}

/// Draws the world the way a level is written: an actor's glyph where one
/// stands, otherwise the terrain's.
pub fn render(world: &World) -> String {
    let dims = world.dimensions();
    let mut out = String::with_capacity(dims.area() + dims.height as usize);
    for row in 0..dims.height as i32 {
        if row > 0 {
            out.push('\n');
        }
        for col in 0..dims.width as i32 {
            let cell = Cell::new(col, row);
            let code = world
                .actors_at(cell)
                .next()
                .map(|actor| actor.code())
                .or_else(|| world.terrain(cell));
            out.push(code.map_or(' ', glyph_of));
        }
    }
    out
}
