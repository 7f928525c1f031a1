//! Event dispatch.
//!
//! Three event kinds reach rule code, routed by the acting actor's
//! [`ActorKind`](crate::ActorKind):
//!
//! - **transition**: the actor crossed into a new cell mid-flight;
//! - **arrival**: the actor settled on a cell centre;
//! - **stationary**: the actor is idle (once per frame).
//!
//! Each handler call gets its own [`EventContext`]. Handlers may trigger
//! further events (a dead stop fires arrival), which are dispatched
//! immediately with a fresh context, one level deeper. Handler errors and
//! panics are logged and counted here and never escape into the frame.

mod context;
mod handlers;

pub use context::{EventContext, Expect, Membership};
pub use handlers::{ArrivalHandler, Handler, HandlerRegistry};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{error, trace, warn};

use crate::error::{ErrorSeverity, RuleError, RuleResult, Severity};
use crate::types::{ActorId, Direction};
use crate::world::WorldState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    Stationary,
    Transition,
    Arrival(Direction),
}

impl Event {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Stationary => "stationary",
            Self::Transition => "transition",
            Self::Arrival(_) => "arrival",
        }
    }
}

/// Runs every handler registered for `actor`'s kind and `event`.
pub(crate) fn dispatch(
    handlers: &HandlerRegistry,
    state: &mut WorldState,
    actor: ActorId,
    event: Event,
    depth: usize,
) {
    if depth > state.config.max_dispatch_depth {
        warn!(
            target: "tileworld::dispatch",
            actor = %actor,
            event = event.name(),
            depth,
            "dispatch nested too deeply, event dropped"
        );
        state.report.dispatches_refused += 1;
        return;
    }
    let Some(kind) = state.roster.get(actor).map(|a| a.kind()) else {
        return;
    };
    state.report.record(event);

    let Some(entry) = handlers.get(kind) else {
        return;
    };

    match event {
        Event::Stationary | Event::Transition => {
            let list = if event == Event::Stationary {
                &entry.stationary
            } else {
                &entry.transition
            };
            for handler in list {
                let mut ctx = EventContext::new(handlers, state, actor, depth);
                let result = contain(|| handler(&mut ctx));
                settle(state, actor, event, result);
            }
        }
        Event::Arrival(direction) => {
            for handler in &entry.arrival {
                let mut ctx = EventContext::new(handlers, state, actor, depth);
                let result = contain(|| handler(&mut ctx, direction));
                settle(state, actor, event, result);
            }
        }
    }
}

/// Runs one handler, turning a panic into [`RuleError::Panicked`].
fn contain(call: impl FnOnce() -> RuleResult) -> RuleResult {
    panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        Err(RuleError::Panicked(panic_message(payload.as_ref())))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| (*msg).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

/// Classifies a handler's outcome. Nothing here stops the frame.
fn settle(state: &mut WorldState, actor: ActorId, event: Event, result: Result<(), RuleError>) {
    let Err(err) = result else {
        return;
    };

    if err.is_check_failure() {
        trace!(
            target: "tileworld::dispatch",
            actor = %actor,
            event = event.name(),
            "expectation not met"
        );
        state.report.checks_failed += 1;
        return;
    }

    state.report.handler_faults += 1;
    match err.severity() {
        ErrorSeverity::Internal => error!(
            target: "tileworld::dispatch",
            actor = %actor,
            event = event.name(),
            code = err.error_code(),
            severity = err.severity().as_str(),
            error = %err,
            "handler fault"
        ),
        _ => warn!(
            target: "tileworld::dispatch",
            actor = %actor,
            event = event.name(),
            code = err.error_code(),
            severity = err.severity().as_str(),
            error = %err,
            "handler fault"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::EngineConfig;
    use crate::grid::Layer;
    use crate::types::{ActorKind, ArtHandle, TerrainCode};
    use crate::world::{World, WorldBuilder};

    const EMPTY: TerrainCode = TerrainCode(0);
    const PLAYER: TerrainCode = TerrainCode(1);
    const ROCK: TerrainCode = TerrainCode(2);
    const HERO: ActorKind = ActorKind(1);
    const STONE: ActorKind = ActorKind(2);

    type Log = Rc<RefCell<Vec<String>>>;

    fn builder(config: EngineConfig) -> WorldBuilder {
        World::builder(config)
            .fixed(EMPTY, ArtHandle(0))
            .movable(PLAYER, ArtHandle(1), HERO)
            .movable(ROCK, ArtHandle(2), STONE)
            .background(EMPTY)
    }

    fn level() -> Layer<TerrainCode> {
        let rows = [[0, 0, 0, 0, 0], [0, 1, 0, 2, 0], [0, 0, 0, 0, 0]];
        Layer::from_rows(
            rows.iter()
                .map(|row| row.iter().map(|c| TerrainCode(*c)).collect::<Vec<_>>())
                .collect(),
        )
        .unwrap()
    }

    fn find(world: &World, code: TerrainCode) -> ActorId {
        world.actors().find(|a| a.code() == code).unwrap().id()
    }

    #[test]
    fn faults_are_isolated_per_handler() {
        let log: Log = Rc::default();
        let (third, hero) = (log.clone(), log.clone());

        let mut world = builder(EngineConfig::default())
            .on_stationary(STONE, |_| Err(RuleError::fault("boom")))
            .on_stationary(STONE, |ctx| Err(RuleError::MissingActor(ctx.actor_id())))
            .on_stationary(STONE, move |ctx| {
                third.borrow_mut().push("third".into());
                ctx.move_self(Direction::Down);
                Ok(())
            })
            .on_stationary(HERO, move |_| {
                hero.borrow_mut().push("hero".into());
                Ok(())
            })
            .build(level())
            .unwrap();

        let report = world.tick().unwrap();
        assert_eq!(report.handler_faults, 2);
        assert_eq!(report.stationary, 2);
        assert_eq!(report.actions_applied, 1);
        assert_eq!(*log.borrow(), vec!["hero", "third"]);

        let rock = find(&world, ROCK);
        assert_eq!(world.actor(rock).unwrap().direction(), Direction::Down);
    }

    #[test]
    fn check_failures_are_not_faults() {
        let mut world = builder(EngineConfig::default())
            .on_stationary(HERO, |ctx| {
                ctx.has_kind(STONE, Direction::Right, Expect::One)?;
                Err(RuleError::fault("unreachable: no stone to the right"))
            })
            .build(level())
            .unwrap();

        let report = world.tick().unwrap();
        assert_eq!(report.checks_failed, 1);
        assert_eq!(report.handler_faults, 0);
    }

    #[test]
    fn a_panicking_handler_does_not_abandon_the_frame() {
        let mut world = builder(EngineConfig::default())
            .on_stationary(STONE, |ctx| {
                ctx.move_self(Direction::Down);
                Ok(())
            })
            .on_stationary(STONE, |ctx| {
                let empty: Vec<u8> = Vec::new();
                let _ = empty[ctx.depth() + 3];
                Ok(())
            })
            .build(level())
            .unwrap();

        let report = world.tick().unwrap();
        assert_eq!(report.handler_faults, 1);
        assert_eq!(report.actions_applied, 1);
        assert!(world.pending_actions().is_empty());

        let rock = find(&world, ROCK);
        assert_eq!(world.actor(rock).unwrap().direction(), Direction::Down);

        // the next frame runs normally
        assert_eq!(world.tick().unwrap().frame, 2);
    }

    #[test]
    fn expect_direction_checks_membership() {
        let log: Log = Rc::default();
        let seen = log.clone();

        let mut world = builder(EngineConfig::default())
            .on_stationary(HERO, move |ctx| {
                let horizontal = [Direction::Left, Direction::Right];
                let cases = [
                    (Direction::Left, Membership::OneOf),
                    (Direction::Up, Membership::OneOf),
                    (Direction::Up, Membership::NotOneOf),
                    (Direction::Right, Membership::NotOneOf),
                    (Direction::None, Membership::OneOf),
                ];
                for (direction, membership) in cases {
                    let outcome = ctx.expect_direction(direction, membership, &horizontal);
                    seen.borrow_mut().push(format!("{direction} {outcome:?}"));
                }
                ctx.expect_direction(Direction::Down, Membership::OneOf, &horizontal)?;
                seen.borrow_mut().push("unreachable".into());
                Ok(())
            })
            .build(level())
            .unwrap();

        let report = world.tick().unwrap();
        assert_eq!(report.checks_failed, 1);
        assert_eq!(report.handler_faults, 0);
        assert_eq!(
            *log.borrow(),
            vec![
                "left Ok(())",
                "up Err(CheckFailed)",
                "up Ok(())",
                "right Err(CheckFailed)",
                "none Err(CheckFailed)",
            ]
        );
    }

    fn nested_world(config: EngineConfig, log: &Log) -> World {
        let on_arrival = log.clone();
        let on_transition = log.clone();
        builder(config)
            .on_arrival(HERO, move |ctx, direction| {
                on_arrival.borrow_mut().push(format!(
                    "arrival {direction} depth {} target {:?}",
                    ctx.depth(),
                    ctx.target(Direction::Right)
                ));
                if direction != Direction::None {
                    ctx.move_self(direction);
                }
                Ok(())
            })
            .on_transition(HERO, move |ctx| {
                ctx.has_kind(STONE, Direction::Right, Expect::One)?;
                ctx.dead_stop();
                on_transition
                    .borrow_mut()
                    .push(format!("after stop target {:?}", ctx.target(Direction::Right)));
                Ok(())
            })
            .build(level())
            .unwrap()
    }

    #[test]
    fn nested_dispatch_gets_a_fresh_context() {
        let log: Log = Rc::default();
        let mut world = nested_world(EngineConfig::default(), &log);
        let player = find(&world, PLAYER);
        let rock = find(&world, ROCK);

        world.press(player, Direction::Right).unwrap();
        let mut stopped_on = None;
        for _ in 0..16 {
            let report = world.tick().unwrap();
            if report.transitions > 0 {
                stopped_on = Some(report);
                break;
            }
        }
        let report = stopped_on.expect("player never crossed a boundary");
        assert_eq!(report.arrivals, 1);
        // settled by the dead stop, so no stationary event this frame
        assert_eq!(report.stationary, 1);

        let actor = world.actor(player).unwrap();
        assert!(!actor.is_moving());
        assert!(actor.is_centred());
        assert_eq!(actor.cell(), crate::types::Cell::new(2, 1));

        assert_eq!(
            *log.borrow(),
            vec![
                "arrival right depth 0 target None".to_string(),
                "arrival none depth 1 target None".to_string(),
                format!("after stop target Some({rock:?})"),
            ]
        );
    }

    #[test]
    fn nesting_beyond_the_limit_is_refused() {
        let log: Log = Rc::default();
        let mut world = nested_world(EngineConfig::new().with_max_dispatch_depth(0), &log);
        let player = find(&world, PLAYER);

        world.press(player, Direction::Right).unwrap();
        let report = (0..16)
            .map(|_| world.tick().unwrap())
            .find(|report| report.transitions > 0)
            .unwrap();

        assert_eq!(report.dispatches_refused, 1);
        assert_eq!(report.arrivals, 0);
        // the stop itself still happened
        assert!(!world.actor(player).unwrap().is_moving());
        assert_eq!(log.borrow().len(), 2);
    }
}
