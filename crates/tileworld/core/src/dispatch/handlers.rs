//! Per-kind handler registry.

use std::collections::HashMap;

use super::context::EventContext;
use super::Event;
use crate::error::RuleResult;
use crate::types::{ActorKind, Direction};

/// Handler for stationary and transition events.
pub type Handler = Box<dyn Fn(&mut EventContext<'_>) -> RuleResult>;

/// Handler for arrival events; receives the direction the actor settled from,
/// or [`Direction::None`] after a stop.
pub type ArrivalHandler = Box<dyn Fn(&mut EventContext<'_>, Direction) -> RuleResult>;

#[derive(Default)]
pub(crate) struct KindHandlers {
    pub(crate) stationary: Vec<Handler>,
    pub(crate) transition: Vec<Handler>,
    pub(crate) arrival: Vec<ArrivalHandler>,
}

impl KindHandlers {
    fn count(&self, event: Event) -> usize {
        match event {
            Event::Stationary => self.stationary.len(),
            Event::Transition => self.transition.len(),
            Event::Arrival(_) => self.arrival.len(),
        }
    }
}

/// Handlers keyed by [`ActorKind`], run in registration order.
#[derive(Default)]
pub struct HandlerRegistry {
    kinds: HashMap<ActorKind, KindHandlers>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_stationary<F>(&mut self, kind: ActorKind, handler: F)
    where
        F: Fn(&mut EventContext<'_>) -> RuleResult + 'static,
    {
        self.entry(kind).stationary.push(Box::new(handler));
    }

    pub fn on_transition<F>(&mut self, kind: ActorKind, handler: F)
    where
        F: Fn(&mut EventContext<'_>) -> RuleResult + 'static,
    {
        self.entry(kind).transition.push(Box::new(handler));
    }

    pub fn on_arrival<F>(&mut self, kind: ActorKind, handler: F)
    where
        F: Fn(&mut EventContext<'_>, Direction) -> RuleResult + 'static,
    {
        self.entry(kind).arrival.push(Box::new(handler));
    }

    /// Number of handlers that `event` would run for `kind`.
    pub fn handler_count(&self, kind: ActorKind, event: Event) -> usize {
        self.kinds.get(&kind).map_or(0, |entry| entry.count(event))
    }

    pub(crate) fn get(&self, kind: ActorKind) -> Option<&KindHandlers> {
        self.kinds.get(&kind)
    }

    fn entry(&mut self, kind: ActorKind) -> &mut KindHandlers {
        self.kinds.entry(kind).or_default()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.kinds.keys().copied().collect();
        kinds.sort();
        f.debug_struct("HandlerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}
