//! Direction-pad style control of one actor.
//!
//! The engine knows nothing about physical controls. A host maps its own
//! input events onto [`World::press`] and [`World::release`]; the actor's
//! arrival handlers then decide whether the requested move is legal, exactly
//! as they would after settling on a cell.
//!
//! Input arrives between frames, so its events are counted apart from the
//! last frame's report and show up in the report of the next [`World::tick`].

use std::mem;

use crate::dispatch::{Event, dispatch};
use crate::error::EngineError;
use crate::types::{ActorId, Direction};
use crate::world::World;

impl World {
    /// A direction was pressed for `actor`.
    ///
    /// An actor moving on the other axis is dead-stopped first (firing its
    /// arrival with [`Direction::None`]); then its arrival handlers run with
    /// `direction`.
    pub fn press(&mut self, actor: ActorId, direction: Direction) -> Result<(), EngineError> {
        let current = self
            .state
            .roster
            .get_mut(actor)
            .ok_or(EngineError::MissingActor {
                actor,
                action: "press",
            })?;

        let turning = match (current.direction().axis(), direction.axis()) {
            (Some(moving), Some(wanted)) => moving != wanted,
            _ => false,
        };
        if turning && current.dead_stop() {
            self.dispatch_input(actor, Event::Arrival(Direction::None));
        }

        self.dispatch_input(actor, Event::Arrival(direction));
        Ok(())
    }

    fn dispatch_input(&mut self, actor: ActorId, event: Event) {
        let frame_report = mem::take(&mut self.state.report);
        dispatch(&self.handlers, &mut self.state, actor, event, 0);
        let counted = mem::replace(&mut self.state.report, frame_report);
        self.state.input_report.absorb(&counted);
    }

    /// A direction was released. Returns true if this asked the actor to stop
    /// at the end of its current cell.
    pub fn release(&mut self, actor: ActorId, direction: Direction) -> Result<bool, EngineError> {
        let current = self
            .state
            .roster
            .get_mut(actor)
            .ok_or(EngineError::MissingActor {
                actor,
                action: "release",
            })?;

        if direction != Direction::None && current.direction() == direction {
            Ok(current.request_stop())
        } else {
            Ok(false)
        }
    }
}
