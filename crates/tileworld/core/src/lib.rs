//! Grid-aligned, frame-synchronized actor simulation.
//!
//! `tileworld-core` runs a rectangular grid of static terrain codes overlaid
//! with actors that travel one cell at a time along the four cardinal
//! directions. Game rules live outside the engine: they register codes and
//! per-kind handlers on a [`WorldBuilder`], react to transition, arrival and
//! stationary events through an [`EventContext`], and change the world only by
//! queueing actions that [`World::tick`] applies at the end of the frame.
//!
//! The crate is pure: no I/O, no clocks, no threads. Hosts call
//! [`World::tick`] once per frame and read the result back through the
//! read-only views on [`World`].
pub mod action;
pub mod actor;
pub mod config;
pub mod cursor;
pub mod dispatch;
pub mod error;
pub mod grid;
mod input;
pub mod occupancy;
pub mod registry;
pub mod roster;
pub mod types;
pub mod world;

pub use action::{ActionOrigin, ActionQueue, PendingAction};
pub use actor::{Actor, MotionFlags};
pub use config::EngineConfig;
pub use cursor::{Cursor, Offset};
pub use dispatch::{
    ArrivalHandler, Event, EventContext, Expect, Handler, HandlerRegistry, Membership,
};
pub use error::{BuildError, EngineError, ErrorSeverity, RuleError, RuleResult, Severity};
pub use grid::{Dimensions, Geometry, Layer};
pub use occupancy::{Count, OccupancyModel, Occupant};
pub use registry::{CodeSpec, CodeTable, Mobility};
pub use roster::Roster;
pub use types::{ActorId, ActorKind, ArtHandle, Axis, Cell, Direction, Point, TerrainCode};
pub use world::{FrameReport, World, WorldBuilder};
