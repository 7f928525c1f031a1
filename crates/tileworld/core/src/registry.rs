//! Code table: what each terrain code looks like and whether it moves.

use std::collections::BTreeMap;

use crate::error::BuildError;
use crate::types::{ActorKind, ArtHandle, TerrainCode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mobility {
    /// Painted into the terrain layer and never moves.
    Fixed,
    /// Lifted out of the level into an actor routed under `kind`.
    Movable { kind: ActorKind },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodeSpec {
    pub art: ArtHandle,
    pub mobility: Mobility,
}

/// Registered codes, keyed by [`TerrainCode`].
#[derive(Clone, Debug, Default)]
pub struct CodeTable {
    specs: BTreeMap<TerrainCode, CodeSpec>,
}

impl CodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, code: TerrainCode, spec: CodeSpec) -> Result<(), BuildError> {
        if self.specs.contains_key(&code) {
            return Err(BuildError::DuplicateCode(code));
        }
        self.specs.insert(code, spec);
        Ok(())
    }

    pub fn get(&self, code: TerrainCode) -> Option<&CodeSpec> {
        self.specs.get(&code)
    }

    pub fn contains(&self, code: TerrainCode) -> bool {
        self.specs.contains_key(&code)
    }

    /// Routing kind for a movable code.
    pub fn kind_of(&self, code: TerrainCode) -> Option<ActorKind> {
        match self.get(code)?.mobility {
            Mobility::Movable { kind } => Some(kind),
            Mobility::Fixed => None,
        }
    }

    pub fn is_movable(&self, code: TerrainCode) -> bool {
        self.kind_of(code).is_some()
    }

    pub fn is_fixed(&self, code: TerrainCode) -> bool {
        matches!(
            self.get(code),
            Some(CodeSpec {
                mobility: Mobility::Fixed,
                ..
            })
        )
    }

    pub fn art(&self, code: TerrainCode) -> Option<ArtHandle> {
        self.get(code).map(|spec| spec.art)
    }
}
