//! Live actors, grouped by code.
//!
//! Iteration order is the engine's canonical order: ascending code, then
//! creation order within a code.

use std::collections::BTreeMap;

use crate::actor::Actor;
use crate::error::EngineError;
use crate::grid::Geometry;
use crate::types::{ActorId, ActorKind, Cell, TerrainCode};

#[derive(Clone, Debug, Default)]
pub struct Roster {
    actors: BTreeMap<ActorId, Actor>,
    groups: BTreeMap<TerrainCode, Vec<ActorId>>,
    next_id: u32,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an idle actor centred on `cell` and appends it to its code group.
    pub fn spawn(
        &mut self,
        code: TerrainCode,
        kind: ActorKind,
        cell: Cell,
        geometry: Geometry,
    ) -> Result<ActorId, EngineError> {
        let id = ActorId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(EngineError::IdsExhausted)?;

        self.actors
            .insert(id, Actor::new(id, code, kind, cell, geometry));
        self.groups.entry(code).or_default().push(id);
        Ok(id)
    }

    /// Destroys the actor and excises it from its group in one step.
    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        let actor = self.actors.remove(&id)?;
        if let Some(group) = self.groups.get_mut(&actor.code()) {
            group.retain(|member| *member != id);
            if group.is_empty() {
                self.groups.remove(&actor.code());
            }
        }
        Some(actor)
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Ids in roster order, detached from the roster so it can be mutated
    /// while walking them.
    pub fn ids(&self) -> Vec<ActorId> {
        self.groups.values().flatten().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> + '_ {
        self.groups
            .values()
            .flatten()
            .filter_map(|id| self.actors.get(id))
    }

    pub fn with_code(&self, code: TerrainCode) -> impl Iterator<Item = &Actor> + '_ {
        self.groups
            .get(&code)
            .into_iter()
            .flatten()
            .filter_map(|id| self.actors.get(id))
    }

    /// Actors whose live position lies in `cell`, in roster order.
    pub fn at(&self, cell: Cell) -> impl Iterator<Item = &Actor> + '_ {
        self.iter().filter(move |actor| actor.cell() == cell)
    }

    pub(crate) fn begin_frame(&mut self) {
        self.actors.values_mut().for_each(Actor::begin_frame);
    }
}
