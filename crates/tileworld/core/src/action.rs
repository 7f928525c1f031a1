//! Deferred world mutations.
//!
//! Rules never mutate the world directly while a frame is running. They queue
//! [`PendingAction`]s, which the world applies in order at the end of the frame.

use crate::cursor::Cursor;
use crate::types::{ActorId, Direction, TerrainCode};

/// Who asked for an actor-targeted action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionOrigin {
    /// The actor's own handler acted on it.
    SelfInitiated,
    /// Another actor's handler acted on it.
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PendingAction {
    Move {
        actor: ActorId,
        direction: Direction,
        origin: ActionOrigin,
    },
    Remove {
        actor: ActorId,
        origin: ActionOrigin,
    },
    Create {
        code: TerrainCode,
        cursor: Cursor,
    },
    SetTerrain {
        cursor: Cursor,
        code: TerrainCode,
    },
}

impl PendingAction {
    /// Actor the action applies to, if any.
    pub fn actor(&self) -> Option<ActorId> {
        match self {
            Self::Move { actor, .. } | Self::Remove { actor, .. } => Some(*actor),
            Self::Create { .. } | Self::SetTerrain { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Remove { .. } => "remove",
            Self::Create { .. } => "create",
            Self::SetTerrain { .. } => "set_terrain",
        }
    }

    fn is_move_for(&self, id: ActorId, wanted: ActionOrigin) -> bool {
        matches!(self, Self::Move { actor, origin, .. } if *actor == id && *origin == wanted)
    }
}

/// Frame-local queue with move conflict resolution.
#[derive(Clone, Debug, Default)]
pub struct ActionQueue {
    pending: Vec<PendingAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `action`; returns false when the conflict rules drop it.
    ///
    /// - a self move for an actor discards every other-move already queued for it;
    /// - an other-move is dropped while a self move for the same actor is queued;
    /// - a second remove for the same actor is dropped.
    pub fn push(&mut self, action: PendingAction) -> bool {
        match &action {
            PendingAction::Move {
                actor,
                origin: ActionOrigin::SelfInitiated,
                ..
            } => {
                let before = self.pending.len();
                self.pending
                    .retain(|queued| !queued.is_move_for(*actor, ActionOrigin::Other));
                let discarded = before - self.pending.len();
                if discarded > 0 {
                    tracing::debug!(
                        target: "tileworld::action",
                        actor = %actor,
                        discarded,
                        "self move overrides queued moves from other actors"
                    );
                }
            }
            PendingAction::Move {
                actor,
                origin: ActionOrigin::Other,
                ..
            } => {
                if self
                    .pending
                    .iter()
                    .any(|queued| queued.is_move_for(*actor, ActionOrigin::SelfInitiated))
                {
                    tracing::debug!(
                        target: "tileworld::action",
                        actor = %actor,
                        "move from another actor dropped; self move already queued"
                    );
                    return false;
                }
            }
            PendingAction::Remove { actor, .. } => {
                let already = self.pending.iter().any(|queued| {
                    matches!(queued, PendingAction::Remove { actor: other, .. } if other == actor)
                });
                if already {
                    tracing::debug!(
                        target: "tileworld::action",
                        actor = %actor,
                        "duplicate remove dropped"
                    );
                    return false;
                }
            }
            PendingAction::Create { .. } | PendingAction::SetTerrain { .. } => {}
        }
        self.pending.push(action);
        true
    }

    pub fn pending(&self) -> &[PendingAction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drains the queue, leaving it empty.
    pub fn take(&mut self) -> Vec<PendingAction> {
        std::mem::take(&mut self.pending)
    }
}
