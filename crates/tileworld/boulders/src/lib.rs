//! A small boulder-dash rule set running on `tileworld-core`.
//!
//! Levels are plain text (see [`level`]), the rules are ordinary engine
//! handlers (see [`rules`]), and [`Game`] feeds a scripted player through
//! the world one cell at a time.
pub mod config;
pub mod error;
pub mod game;
pub mod level;
pub mod rules;

pub use config::{BoulderConfig, Command};
pub use error::{BoulderError, Result};
pub use game::{Game, Summary};
pub use level::{parse_level, render};
pub use rules::{SharedStats, Stats};
