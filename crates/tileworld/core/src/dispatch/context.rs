//! Per-invocation context handed to rule handlers.

use tracing::debug;

use super::{dispatch, Event, HandlerRegistry};
use crate::action::{ActionOrigin, PendingAction};
use crate::actor::Actor;
use crate::cursor::{Cursor, Offset};
use crate::error::{RuleError, RuleResult};
use crate::occupancy::Occupant;
use crate::types::{ActorId, ActorKind, Cell, Direction, TerrainCode};
use crate::world::WorldState;

/// Expected population of a probed cell, not counting the acting actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expect {
    /// Nothing matching is there.
    Zero,
    /// At least one matching thing is there. The first matching actor is
    /// remembered as the target for the probe's direction.
    One,
    /// The matching thing is there and nothing else is: no other actor stands
    /// on the cell.
    Only,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Membership {
    OneOf,
    NotOneOf,
}

#[derive(Clone, Copy, Debug)]
enum Probe {
    Code(TerrainCode),
    Kind(ActorKind),
}

impl Probe {
    fn matches(self, found: &Found) -> bool {
        match self {
            Probe::Code(code) => found.code == code,
            Probe::Kind(kind) => found.kind == kind,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Found {
    id: ActorId,
    code: TerrainCode,
    kind: ActorKind,
}

impl From<&Actor> for Found {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.id(),
            code: actor.code(),
            kind: actor.kind(),
        }
    }
}

/// What a handler can see and do while it runs.
///
/// Queries are relative to the acting actor's cell. Directional assertions
/// remember the actor they found, so a later `move_other`/`remove_other` in the
/// same handler acts on exactly that actor.
pub struct EventContext<'a> {
    handlers: &'a HandlerRegistry,
    state: &'a mut WorldState,
    actor: ActorId,
    depth: usize,
    targets: [Option<ActorId>; 5],
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(
        handlers: &'a HandlerRegistry,
        state: &'a mut WorldState,
        actor: ActorId,
        depth: usize,
    ) -> Self {
        Self {
            handlers,
            state,
            actor,
            depth,
            targets: [None; 5],
        }
    }

    // ===== the acting actor =====

    pub fn actor_id(&self) -> ActorId {
        self.actor
    }

    pub fn actor(&self) -> Result<&Actor, RuleError> {
        self.state
            .roster
            .get(self.actor)
            .ok_or(RuleError::MissingActor(self.actor))
    }

    pub fn cell(&self) -> Result<Cell, RuleError> {
        self.actor().map(Actor::cell)
    }

    pub fn direction(&self) -> Result<Direction, RuleError> {
        self.actor().map(Actor::direction)
    }

    pub fn frame(&self) -> u64 {
        self.state.frame
    }

    /// Nesting level of this invocation; 0 for events raised by the frame loop.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn cursor(&self, offset: impl Into<Offset>) -> Result<Cursor, RuleError> {
        Ok(Cursor::new(self.cell()?, &offset.into()))
    }

    // ===== queries =====

    /// Things with `code` at the offset cell, the acting actor included.
    pub fn count_code_at(&self, code: TerrainCode, offset: impl Into<Offset>) -> Result<usize, RuleError> {
        let cell = self.cursor(offset)?.cell();
        Ok(self.state.count_code_at(code, cell))
    }

    /// Actors of `kind` at the offset cell, the acting actor included.
    pub fn count_kind_at(&self, kind: ActorKind, offset: impl Into<Offset>) -> Result<usize, RuleError> {
        let cell = self.cursor(offset)?.cell();
        Ok(self.state.count_kind_at(kind, cell))
    }

    /// Terrain at the offset cell is `code`, whoever stands on it.
    pub fn tile_is(&self, code: TerrainCode, offset: impl Into<Offset>) -> Result<bool, RuleError> {
        let cell = self.cursor(offset)?.cell();
        Ok(self.state.layers.tile_is(code, cell))
    }

    /// Ids of actors whose live position is in the offset cell, in roster order.
    pub fn actors_at(&self, offset: impl Into<Offset>) -> Result<Vec<ActorId>, RuleError> {
        let cell = self.cursor(offset)?.cell();
        Ok(self.state.roster.at(cell).map(Actor::id).collect())
    }

    /// Asserts how many things with `code` occupy the offset cell.
    ///
    /// Fails with [`RuleError::CheckFailed`] when the expectation does not hold,
    /// so rules can bail out with `?`.
    pub fn has_code(&mut self, code: TerrainCode, offset: impl Into<Offset>, expect: Expect) -> RuleResult {
        self.check_probe(Probe::Code(code), offset.into(), expect)
    }

    /// Asserts how many actors of `kind` occupy the offset cell.
    pub fn has_kind(&mut self, kind: ActorKind, offset: impl Into<Offset>, expect: Expect) -> RuleResult {
        self.check_probe(Probe::Kind(kind), offset.into(), expect)
    }

    /// Asserts that `direction` is (or is not) one of `choices`.
    pub fn expect_direction(
        &self,
        direction: Direction,
        membership: Membership,
        choices: &[Direction],
    ) -> RuleResult {
        let member = choices.contains(&direction);
        let holds = match membership {
            Membership::OneOf => member,
            Membership::NotOneOf => !member,
        };
        holds.then_some(()).ok_or(RuleError::CheckFailed)
    }

    /// Actor remembered by the last successful directional assertion for `direction`.
    pub fn target(&self, direction: Direction) -> Option<ActorId> {
        self.targets[direction.index()]
    }

    fn check_probe(&mut self, probe: Probe, offset: Offset, expect: Expect) -> RuleResult {
        let cell = self.cursor(offset.clone())?.cell();
        let fixed = match probe {
            Probe::Code(code) => !self.state.codes.is_movable(code),
            Probe::Kind(_) => false,
        };

        let holds = match (expect, fixed) {
            (Expect::Zero | Expect::One, true) => {
                let present = matches!(probe, Probe::Code(code) if self.state.layers.tile_is(code, cell));
                present == (expect == Expect::One)
            }
            (Expect::Only, true) => {
                matches!(probe, Probe::Code(code) if self.state.layers.tile_is(code, cell))
                    && self.others_at(cell).next().is_none()
            }
            (Expect::Zero, false) => !self.others_at(cell).any(|found| probe.matches(&found)),
            (Expect::One, false) => {
                let first = self.others_at(cell).find(|found| probe.matches(found));
                if let (Some(found), Some(key)) = (first, offset.target_key()) {
                    self.targets[key.index()] = Some(found.id);
                }
                first.is_some()
            }
            (Expect::Only, false) => {
                let mut others = self.others_at(cell);
                matches!(others.next(), Some(found) if probe.matches(&found)) && others.next().is_none()
            }
        };
        holds.then_some(()).ok_or(RuleError::CheckFailed)
    }

    /// Actors at `cell` other than the acting one.
    ///
    /// Single-occupant cells are answered from the occupancy layer; cells with
    /// multiplicity fall back to a scan of live positions.
    fn others_at(&self, cell: Cell) -> impl Iterator<Item = Found> + '_ {
        let layers = &self.state.layers;
        let multiple = layers.is_multiple(cell);
        let single = (!multiple)
            .then(|| layers.occupant(cell))
            .flatten()
            .and_then(|occupant| match occupant {
                Occupant::Actor { id, code, kind } => Some(Found { id, code, kind }),
                Occupant::Terrain(_) => None,
            });
        let scanned = multiple
            .then(|| self.state.roster.at(cell).map(Found::from))
            .into_iter()
            .flatten();
        let me = self.actor;
        single.into_iter().chain(scanned).filter(move |found| found.id != me)
    }

    // ===== immediate control of the acting actor =====

    /// Finishes the current cell, then stops. Returns false when idle.
    pub fn request_stop(&mut self) -> bool {
        self.state
            .roster
            .get_mut(self.actor)
            .is_some_and(Actor::request_stop)
    }

    /// Stops on the spot, centred, and fires arrival with [`Direction::None`].
    pub fn dead_stop(&mut self) -> bool {
        let stopped = self
            .state
            .roster
            .get_mut(self.actor)
            .is_some_and(Actor::dead_stop);
        if stopped {
            self.nested(Event::Arrival(Direction::None));
        }
        stopped
    }

    /// Undoes a boundary crossing not yet confirmed this frame, then dead-stops.
    pub fn knock_back(&mut self) -> bool {
        let stopped = self
            .state
            .roster
            .get_mut(self.actor)
            .is_some_and(Actor::knock_back);
        if stopped {
            self.nested(Event::Arrival(Direction::None));
        }
        stopped
    }

    fn nested(&mut self, event: Event) {
        dispatch(self.handlers, self.state, self.actor, event, self.depth + 1);
    }

    // ===== deferred actions =====

    pub fn move_self(&mut self, direction: Direction) -> bool {
        self.state.queue.push(PendingAction::Move {
            actor: self.actor,
            direction,
            origin: ActionOrigin::SelfInitiated,
        })
    }

    /// Moves the actor remembered for `target`. False when nothing was remembered.
    pub fn move_other(&mut self, target: Direction, direction: Direction) -> bool {
        let Some(actor) = self.remembered(target, "move_other") else {
            return false;
        };
        self.state.queue.push(PendingAction::Move {
            actor,
            direction,
            origin: ActionOrigin::Other,
        })
    }

    pub fn remove_self(&mut self) -> bool {
        self.state.queue.push(PendingAction::Remove {
            actor: self.actor,
            origin: ActionOrigin::SelfInitiated,
        })
    }

    pub fn remove_other(&mut self, target: Direction) -> bool {
        let Some(actor) = self.remembered(target, "remove_other") else {
            return false;
        };
        self.state.queue.push(PendingAction::Remove {
            actor,
            origin: ActionOrigin::Other,
        })
    }

    /// Queues a terrain write at the offset cell. `code` must be a registered fixed code.
    pub fn set_terrain(&mut self, code: TerrainCode, offset: impl Into<Offset>) -> RuleResult {
        let cursor = self.in_bounds(offset.into())?;
        if !self.state.codes.contains(code) {
            return Err(RuleError::UnknownCode(code));
        }
        if self.state.codes.is_movable(code) {
            return Err(RuleError::NotTerrain(code));
        }
        self.state.queue.push(PendingAction::SetTerrain { cursor, code });
        Ok(())
    }

    /// Queues creation of an actor with a movable `code` at the offset cell.
    pub fn create_actor(&mut self, code: TerrainCode, offset: impl Into<Offset>) -> RuleResult {
        let cursor = self.in_bounds(offset.into())?;
        if !self.state.codes.is_movable(code) {
            return Err(RuleError::NotMovable(code));
        }
        self.state.queue.push(PendingAction::Create { code, cursor });
        Ok(())
    }

    fn in_bounds(&self, offset: Offset) -> Result<Cursor, RuleError> {
        let cursor = self.cursor(offset)?;
        if self.state.layers.contains(cursor.cell()) {
            Ok(cursor)
        } else {
            Err(RuleError::OutOfBounds {
                cell: cursor.cell(),
            })
        }
    }

    fn remembered(&self, target: Direction, action: &'static str) -> Option<ActorId> {
        let found = self.target(target);
        if found.is_none() {
            debug!(
                target: "tileworld::action",
                actor = %self.actor,
                direction = %target,
                action,
                "no target remembered for direction"
            );
        }
        found
    }
}
