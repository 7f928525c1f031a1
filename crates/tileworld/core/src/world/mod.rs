//! The world driver: owns every layer, the roster, the queue and the handlers,
//! and runs one frame per [`World::tick`].
//!
//! Frame order:
//!
//! 1. rebuild occupancy and multiplicity from the roster;
//! 2. advance moving actors in roster order, dispatching transitions and
//!    arrivals as they happen;
//! 3. dispatch stationary to actors that were idle for the whole frame;
//! 4. flush the action queue.

mod builder;

pub use builder::WorldBuilder;

use std::collections::BTreeSet;

use tracing::debug;

use crate::action::{ActionQueue, PendingAction};
use crate::actor::Actor;
use crate::config::EngineConfig;
use crate::dispatch::{Event, EventContext, HandlerRegistry, dispatch};
use crate::error::{EngineError, RuleResult};
use crate::grid::{Dimensions, Geometry, Layer};
use crate::occupancy::{Count, OccupancyModel, Occupant};
use crate::registry::CodeTable;
use crate::roster::Roster;
use crate::types::{ActorId, ActorKind, ArtHandle, Cell, Direction, TerrainCode};

/// Counters for one frame, returned by [`World::tick`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameReport {
    pub frame: u64,
    pub transitions: usize,
    pub arrivals: usize,
    pub stationary: usize,
    pub actions_applied: usize,
    /// Moves the actor refused (perpendicular to its motion).
    pub actions_rejected: usize,
    /// Actions aimed at actors removed earlier in the same flush.
    pub actions_skipped: usize,
    pub handler_faults: usize,
    pub checks_failed: usize,
    pub dispatches_refused: usize,
}

impl FrameReport {
    fn starting(frame: u64) -> Self {
        Self {
            frame,
            ..Self::default()
        }
    }

    /// Adds every counter of `other` except the frame number.
    pub(crate) fn absorb(&mut self, other: &FrameReport) {
        self.transitions += other.transitions;
        self.arrivals += other.arrivals;
        self.stationary += other.stationary;
        self.actions_applied += other.actions_applied;
        self.actions_rejected += other.actions_rejected;
        self.actions_skipped += other.actions_skipped;
        self.handler_faults += other.handler_faults;
        self.checks_failed += other.checks_failed;
        self.dispatches_refused += other.dispatches_refused;
    }

    pub(crate) fn record(&mut self, event: Event) {
        match event {
            Event::Stationary => self.stationary += 1,
            Event::Transition => self.transitions += 1,
            Event::Arrival(_) => self.arrivals += 1,
        }
    }
}

/// Everything a handler may read or mutate. Kept apart from the handlers so a
/// running handler can borrow the state mutably.
#[derive(Debug)]
pub(crate) struct WorldState {
    pub(crate) config: EngineConfig,
    pub(crate) geometry: Geometry,
    pub(crate) codes: CodeTable,
    pub(crate) background: Option<TerrainCode>,
    pub(crate) layers: OccupancyModel,
    pub(crate) roster: Roster,
    pub(crate) queue: ActionQueue,
    pub(crate) frame: u64,
    pub(crate) report: FrameReport,
    /// Counts from input dispatched between frames, folded into the next frame.
    pub(crate) input_report: FrameReport,
}

impl WorldState {
    /// Exact count; multiplicity falls back to a scan of live positions.
    pub(crate) fn count_code_at(&self, code: TerrainCode, cell: Cell) -> usize {
        match self.layers.count_code_at(&self.codes, code, cell) {
            Count::Exact(n) => n,
            Count::Ambiguous => self.roster.at(cell).filter(|a| a.code() == code).count(),
        }
    }

    pub(crate) fn count_kind_at(&self, kind: ActorKind, cell: Cell) -> usize {
        match self.layers.count_kind_at(kind, cell) {
            Count::Exact(n) => n,
            Count::Ambiguous => self.roster.at(cell).filter(|a| a.kind() == kind).count(),
        }
    }
}

#[derive(Debug)]
pub struct World {
    pub(crate) state: WorldState,
    pub(crate) handlers: HandlerRegistry,
}

impl World {
    pub fn builder(config: EngineConfig) -> WorldBuilder {
        WorldBuilder::new(config)
    }

    // ===== handler registration =====

    pub fn on_stationary<F>(&mut self, kind: ActorKind, handler: F)
    where
        F: Fn(&mut EventContext<'_>) -> RuleResult + 'static,
    {
        self.handlers.on_stationary(kind, handler);
    }

    pub fn on_transition<F>(&mut self, kind: ActorKind, handler: F)
    where
        F: Fn(&mut EventContext<'_>) -> RuleResult + 'static,
    {
        self.handlers.on_transition(kind, handler);
    }

    pub fn on_arrival<F>(&mut self, kind: ActorKind, handler: F)
    where
        F: Fn(&mut EventContext<'_>, Direction) -> RuleResult + 'static,
    {
        self.handlers.on_arrival(kind, handler);
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    // ===== frame loop =====

    /// Runs one frame.
    ///
    /// The report also counts events dispatched by [`World::press`] since the
    /// previous frame. Handler faults never surface here; an error means the engine's own
    /// bookkeeping is inconsistent and the frame was abandoned.
    pub fn tick(&mut self) -> Result<FrameReport, EngineError> {
        let state = &mut self.state;
        state.frame += 1;
        state.report = FrameReport::starting(state.frame);
        state.report.absorb(&std::mem::take(&mut state.input_report));
        state.roster.begin_frame();
        state.layers.recompute(state.roster.iter());
        if cfg!(debug_assertions) {
            if let Err(err) = state.layers.verify(state.roster.iter()) {
                state.queue.take();
                return Err(err);
            }
        }

        self.advance_actors();
        self.stationary_pass();
        self.flush()?;

        let report = self.state.report.clone();
        debug!(
            target: "tileworld::world",
            frame = report.frame,
            transitions = report.transitions,
            arrivals = report.arrivals,
            stationary = report.stationary,
            applied = report.actions_applied,
            rejected = report.actions_rejected,
            skipped = report.actions_skipped,
            faults = report.handler_faults,
            "frame complete"
        );
        Ok(report)
    }

    fn advance_actors(&mut self) {
        let speed = self.state.config.speed;
        for id in self.state.roster.ids() {
            let crossed = match self.state.roster.get_mut(id) {
                Some(actor) if actor.is_moving() => actor.integrate(speed),
                _ => continue,
            };
            if crossed {
                dispatch(&self.handlers, &mut self.state, id, Event::Transition, 0);
            }

            let arrived = self.state.roster.get_mut(id).and_then(|actor| {
                actor.mark_cell();
                actor.resolve_target()
            });
            if let Some(direction) = arrived {
                dispatch(&self.handlers, &mut self.state, id, Event::Arrival(direction), 0);
            }
        }
    }

    fn stationary_pass(&mut self) {
        for id in self.state.roster.ids() {
            let idle = self
                .state
                .roster
                .get(id)
                .is_some_and(|actor| !actor.is_moving() && !actor.settled_this_frame());
            if idle {
                dispatch(&self.handlers, &mut self.state, id, Event::Stationary, 0);
            }
        }
    }

    /// Applies queued actions in order. The queue is empty afterwards whatever
    /// the outcome.
    fn flush(&mut self) -> Result<(), EngineError> {
        let state = &mut self.state;
        let mut removed = BTreeSet::new();

        for action in state.queue.take() {
            if let Some(actor) = action.actor() {
                if removed.contains(&actor) {
                    debug!(
                        target: "tileworld::action",
                        actor = %actor,
                        action = action.name(),
                        "skipped; actor removed earlier this flush"
                    );
                    state.report.actions_skipped += 1;
                    continue;
                }
                if !state.roster.contains(actor) {
                    return Err(EngineError::MissingActor {
                        actor,
                        action: action.name(),
                    });
                }
            }

            match action {
                PendingAction::Move {
                    actor,
                    direction,
                    origin,
                } => {
                    let accepted = state
                        .roster
                        .get_mut(actor)
                        .is_some_and(|a| a.request_move(direction));
                    if accepted {
                        state.report.actions_applied += 1;
                    } else {
                        debug!(
                            target: "tileworld::action",
                            actor = %actor,
                            direction = %direction,
                            origin = %origin,
                            "move rejected"
                        );
                        state.report.actions_rejected += 1;
                    }
                }
                PendingAction::Remove { actor, .. } => {
                    state.roster.remove(actor);
                    removed.insert(actor);
                    state.report.actions_applied += 1;
                }
                PendingAction::Create { code, cursor } => {
                    let kind = state
                        .codes
                        .kind_of(code)
                        .ok_or(EngineError::NotMovable(code))?;
                    let cell = cursor.cell();
                    if !state.layers.contains(cell) {
                        return Err(EngineError::OutOfBounds {
                            cell,
                            action: "create",
                        });
                    }
                    state.roster.spawn(code, kind, cell, state.geometry)?;
                    state.report.actions_applied += 1;
                }
                PendingAction::SetTerrain { cursor, code } => {
                    let cell = cursor.cell();
                    if !state.layers.set_terrain(cell, code) {
                        return Err(EngineError::OutOfBounds {
                            cell,
                            action: "set_terrain",
                        });
                    }
                    state.report.actions_applied += 1;
                }
            }
        }
        Ok(())
    }

    // ===== read-only views =====

    pub fn frame(&self) -> u64 {
        self.state.frame
    }

    pub fn config(&self) -> &EngineConfig {
        &self.state.config
    }

    pub fn geometry(&self) -> Geometry {
        self.state.geometry
    }

    pub fn dimensions(&self) -> Dimensions {
        self.state.layers.dimensions()
    }

    pub fn codes(&self) -> &CodeTable {
        &self.state.codes
    }

    pub fn background(&self) -> Option<TerrainCode> {
        self.state.background
    }

    pub fn art(&self, code: TerrainCode) -> Option<ArtHandle> {
        self.state.codes.art(code)
    }

    /// Actors in roster order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> + '_ {
        self.state.roster.iter()
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.state.roster.get(id)
    }

    pub fn actor_count(&self) -> usize {
        self.state.roster.len()
    }

    /// Actors whose live position is in `cell`.
    pub fn actors_at(&self, cell: Cell) -> impl Iterator<Item = &Actor> + '_ {
        self.state.roster.at(cell)
    }

    pub fn terrain(&self, cell: Cell) -> Option<TerrainCode> {
        self.state.layers.terrain_at(cell)
    }

    pub fn terrain_layer(&self) -> &Layer<TerrainCode> {
        self.state.layers.terrain()
    }

    pub fn tile_is(&self, code: TerrainCode, cell: Cell) -> bool {
        self.state.layers.tile_is(code, cell)
    }

    pub fn count_code_at(&self, code: TerrainCode, cell: Cell) -> usize {
        self.state.count_code_at(code, cell)
    }

    pub fn count_kind_at(&self, kind: ActorKind, cell: Cell) -> usize {
        self.state.count_kind_at(kind, cell)
    }

    /// Occupancy as of the start of the last frame.
    pub fn occupant(&self, cell: Cell) -> Option<Occupant> {
        self.state.layers.occupant(cell)
    }

    pub fn is_multiple(&self, cell: Cell) -> bool {
        self.state.layers.is_multiple(cell)
    }

    /// Actions queued since the last flush.
    pub fn pending_actions(&self) -> &[PendingAction] {
        self.state.queue.pending()
    }

    pub fn last_report(&self) -> &FrameReport {
        &self.state.report
    }
}
