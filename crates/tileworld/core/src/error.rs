//! Error taxonomy for the engine.
//!
//! Three families, mirroring who is at fault:
//! - [`RuleError`]: returned by rule handlers and the query/action API. Caught
//!   and logged at the dispatch site; never stops the frame.
//! - [`EngineError`]: structural invariant violations surfaced by
//!   [`World::tick`](crate::World::tick). These mean the engine itself is broken.
//! - [`BuildError`]: rejected registrations or level data at construction time.
//!
//! Every family implements [`Severity`] so callers and the dispatcher can pick a
//! log level without matching on individual variants.

use crate::types::{ActorId, Cell, TerrainCode};

/// Severity level of an error, used for categorization and logging.
///
/// - **Expected**: a rule's expectation about the world was not met
/// - **Recoverable**: a rule asked for something the world cannot do right now
/// - **Validation**: invalid input that should be fixed by the caller
/// - **Internal**: engine state inconsistency, indicates a bug
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Normal control flow for rules (assertion-style checks).
    Expected,

    /// Request rejected by the current world state.
    Recoverable,

    /// Request that can never succeed as written.
    Validation,

    /// Unexpected state inconsistency. Fatal to the frame.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Expected => "expected",
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    /// Returns true if this error indicates an engine bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Common classification for all engine errors.
pub trait Severity: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Static identifier for the variant, for logs and tests.
    fn error_code(&self) -> &'static str;
}

/// Outcome of rule code: handlers, queries, and action requests.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// An assertion-style query did not hold. Ends the handler quietly.
    #[error("expectation not met")]
    CheckFailed,

    #[error("cell {cell} is outside the grid")]
    OutOfBounds { cell: Cell },

    #[error("{0} is not a registered movable code")]
    NotMovable(TerrainCode),

    #[error("{0} is not a registered code")]
    UnknownCode(TerrainCode),

    #[error("{0} is movable and cannot be painted as terrain")]
    NotTerrain(TerrainCode),

    #[error("acting actor {0} is no longer in the roster")]
    MissingActor(ActorId),

    /// Free-form fault raised by rule code.
    #[error("rule fault: {0}")]
    Fault(String),

    /// The handler panicked. Holds the panic message when it was a string.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl RuleError {
    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault(message.into())
    }

    pub fn is_check_failure(&self) -> bool {
        matches!(self, Self::CheckFailed)
    }
}

impl Severity for RuleError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CheckFailed => ErrorSeverity::Expected,
            Self::OutOfBounds { .. } => ErrorSeverity::Recoverable,
            Self::NotMovable(_) | Self::UnknownCode(_) | Self::NotTerrain(_) | Self::Fault(_) => {
                ErrorSeverity::Validation
            }
            Self::MissingActor(_) | Self::Panicked(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::CheckFailed => "check_failed",
            Self::OutOfBounds { .. } => "out_of_bounds",
            Self::NotMovable(_) => "not_movable",
            Self::UnknownCode(_) => "unknown_code",
            Self::NotTerrain(_) => "not_terrain",
            Self::MissingActor(_) => "missing_actor",
            Self::Fault(_) => "fault",
            Self::Panicked(_) => "panicked",
        }
    }
}

/// Result type returned by rule handlers.
pub type RuleResult = Result<(), RuleError>;

/// Structural failures of the engine. Fatal to the frame in which they occur.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("{action} references actor {actor} which is not in the roster")]
    MissingActor { actor: ActorId, action: &'static str },

    #[error("queued create names {0}, which is not a movable code")]
    NotMovable(TerrainCode),

    #[error("queued {action} targets {cell} outside the grid")]
    OutOfBounds { cell: Cell, action: &'static str },

    #[error("occupancy desync at {cell}: {detail}")]
    OccupancyDesync { cell: Cell, detail: &'static str },

    #[error("actor id space exhausted")]
    IdsExhausted,
}

impl Severity for EngineError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingActor { .. } => "missing_actor",
            Self::NotMovable(_) => "not_movable",
            Self::OutOfBounds { .. } => "out_of_bounds",
            Self::OccupancyDesync { .. } => "occupancy_desync",
            Self::IdsExhausted => "ids_exhausted",
        }
    }
}

/// Errors raised while assembling a [`World`](crate::World).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("{0} registered twice")]
    DuplicateCode(TerrainCode),

    #[error("level cell {cell} uses unregistered {code}")]
    UnknownCode { code: TerrainCode, cell: Cell },

    #[error("background {0} must be a registered fixed code")]
    InvalidBackground(TerrainCode),

    #[error("level rows have unequal lengths (row {row} has {found}, expected {expected})")]
    RaggedRows {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("level is empty")]
    EmptyLevel,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl Severity for BuildError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Engine(inner) => inner.severity(),
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "invalid_config",
            Self::DuplicateCode(_) => "duplicate_code",
            Self::UnknownCode { .. } => "unknown_code",
            Self::InvalidBackground(_) => "invalid_background",
            Self::RaggedRows { .. } => "ragged_rows",
            Self::EmptyLevel => "empty_level",
            Self::Engine(inner) => inner.error_code(),
        }
    }
}
