use thiserror::Error;

use tileworld_core::{BuildError, EngineError};

/// Failures while loading or running a boulders level.
#[derive(Debug, Error)]
pub enum BoulderError {
    #[error("unknown glyph {glyph:?} at row {row}, column {col}")]
    UnknownGlyph { glyph: char, row: usize, col: usize },

    #[error("level has no player")]
    NoPlayer,

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, BoulderError>;
