//! Grid-aligned actor and its motion state machine.
//!
//! An actor is either idle (centred on a cell, `direction == None`) or moving
//! along one axis toward `next`. While moving, `final` marks the end of the
//! committed run: reaching `next` before `final` extends `next` by one cell
//! without stopping, which gives smooth motion across repeated move requests.
//!
//! The actor never calls back into the world. Methods report what happened
//! (crossed a boundary, arrived, stopped) and the driver dispatches events.

use bitflags::bitflags;

use crate::grid::Geometry;
use crate::types::{ActorId, ActorKind, Axis, Cell, Direction, Point, TerrainCode};

bitflags! {
    /// Per-actor motion bookkeeping bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct MotionFlags: u8 {
        /// Arrival reports `Direction::None` instead of the travelled direction.
        const STOP_REQUESTED = 1 << 0;
        /// Became idle during the current frame.
        const SETTLED        = 1 << 1;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    id: ActorId,
    code: TerrainCode,
    kind: ActorKind,
    position: Point,
    direction: Direction,
    /// Axis coordinate of the next cell centre to reach. Meaningful while moving.
    next: i32,
    /// End of the committed run. `Some` exactly while moving.
    final_target: Option<i32>,
    /// Cell index on the axis of travel at the last boundary check.
    previous: i32,
    flags: MotionFlags,
    geometry: Geometry,
}

impl Actor {
    /// Creates an idle actor centred on `cell`.
    pub fn new(
        id: ActorId,
        code: TerrainCode,
        kind: ActorKind,
        cell: Cell,
        geometry: Geometry,
    ) -> Self {
        Self {
            id,
            code,
            kind,
            position: geometry.point_of(cell),
            direction: Direction::None,
            next: 0,
            final_target: None,
            previous: 0,
            flags: MotionFlags::empty(),
            geometry,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn code(&self) -> TerrainCode {
        self.code
    }

    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Cell currently containing the actor's position.
    pub fn cell(&self) -> Cell {
        self.geometry.cell_of(self.position)
    }

    pub fn is_moving(&self) -> bool {
        self.direction != Direction::None
    }

    pub fn next_target(&self) -> Option<i32> {
        self.is_moving().then_some(self.next)
    }

    pub fn final_target(&self) -> Option<i32> {
        self.final_target
    }

    pub fn stop_requested(&self) -> bool {
        self.flags.contains(MotionFlags::STOP_REQUESTED)
    }

    pub fn flags(&self) -> MotionFlags {
        self.flags
    }

    pub fn is_centred(&self) -> bool {
        self.geometry.is_centred(self.position.x) && self.geometry.is_centred(self.position.y)
    }

    pub(crate) fn settled_this_frame(&self) -> bool {
        self.flags.contains(MotionFlags::SETTLED)
    }

    pub(crate) fn begin_frame(&mut self) {
        self.flags.remove(MotionFlags::SETTLED);
    }

    fn axis(&self) -> Option<Axis> {
        self.direction.axis()
    }

    /// Asks the actor to travel one more cell in `direction`.
    ///
    /// Idle: starts toward the adjacent cell. Same direction: extends the run by
    /// one cell. Opposite direction: reverses in place toward the nearest cell
    /// centre behind it. Perpendicular while moving: rejected, nothing changes.
    pub fn request_move(&mut self, direction: Direction) -> bool {
        let Some(axis) = direction.axis() else {
            return false;
        };
        let size = self.geometry.cell_size();
        let sign = direction.sign();

        match self.axis() {
            None => {
                let coord = self.position.along(axis);
                self.direction = direction;
                self.next = coord + sign * size;
                self.final_target = Some(self.next);
                self.previous = self.geometry.cell_index(coord);
            }
            Some(current) if current != axis => return false,
            Some(_) if direction == self.direction => {
                let end = self.final_target.unwrap_or(self.next);
                self.final_target = Some(end + sign * size);
            }
            Some(_) => {
                let coord = self.position.along(axis);
                self.direction = direction;
                self.next = self.geometry.centre_ahead(coord, sign);
                self.final_target = Some(self.next);
            }
        }
        self.flags.remove(MotionFlags::STOP_REQUESTED);
        true
    }

    /// Finish the current cell, then stop. Arrival reports `Direction::None`.
    pub fn request_stop(&mut self) -> bool {
        if !self.is_moving() {
            return false;
        }
        self.final_target = Some(self.next);
        self.flags.insert(MotionFlags::STOP_REQUESTED);
        true
    }

    /// Stops immediately, snapping to the centre of the containing cell.
    ///
    /// Returns true if the actor was moving; the caller owes an arrival with
    /// `Direction::None`.
    pub fn dead_stop(&mut self) -> bool {
        let Some(axis) = self.axis() else {
            return false;
        };
        let centred = self.geometry.centre_of(self.position.along(axis));
        self.position.set_along(axis, centred);
        self.settle();
        true
    }

    /// Undoes an unconfirmed boundary crossing, then dead-stops.
    pub fn knock_back(&mut self) -> bool {
        let Some(axis) = self.axis() else {
            return false;
        };
        let coord = self.position.along(axis);
        if self.geometry.cell_index(coord) != self.previous {
            self.position
                .set_along(axis, self.geometry.centre(self.previous));
        }
        self.dead_stop()
    }

    /// Moves `speed` units along the direction of travel. Returns true if the
    /// actor is now in a different cell than at the last [`Actor::mark_cell`].
    pub(crate) fn integrate(&mut self, speed: i32) -> bool {
        let Some(axis) = self.axis() else {
            return false;
        };
        let coord = self.position.along(axis) + self.direction.sign() * speed;
        self.position.set_along(axis, coord);
        self.geometry.cell_index(coord) != self.previous
    }

    /// Confirms the current cell as the reference for boundary detection.
    pub(crate) fn mark_cell(&mut self) {
        if let Some(axis) = self.axis() {
            self.previous = self.geometry.cell_index(self.position.along(axis));
        }
    }

    /// Handles reaching `next`: continue the run, or settle and report arrival.
    pub(crate) fn resolve_target(&mut self) -> Option<Direction> {
        let axis = self.axis()?;
        let sign = self.direction.sign();
        let coord = self.position.along(axis);
        let reached = if sign > 0 {
            coord >= self.next
        } else {
            coord <= self.next
        };
        if !reached {
            return None;
        }

        if self.final_target != Some(self.next) {
            self.next += sign * self.geometry.cell_size();
            return None;
        }

        self.position.set_along(axis, self.next);
        let reported = if self.stop_requested() {
            Direction::None
        } else {
            self.direction
        };
        self.settle();
        Some(reported)
    }

    fn settle(&mut self) {
        self.direction = Direction::None;
        self.final_target = None;
        self.flags.remove(MotionFlags::STOP_REQUESTED);
        self.flags.insert(MotionFlags::SETTLED);
    }
}
