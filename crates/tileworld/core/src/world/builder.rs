//! Assembles a [`World`] from registrations and a level.

use tracing::info;

use super::{FrameReport, World, WorldState};
use crate::action::ActionQueue;
use crate::config::EngineConfig;
use crate::dispatch::{EventContext, HandlerRegistry};
use crate::error::{BuildError, RuleResult};
use crate::grid::{Geometry, Layer};
use crate::occupancy::OccupancyModel;
use crate::registry::{CodeSpec, CodeTable, Mobility};
use crate::roster::Roster;
use crate::types::{ActorKind, ArtHandle, Direction, TerrainCode};

/// Consuming builder for [`World`].
///
/// Registration mistakes are remembered and reported by [`WorldBuilder::build`],
/// so a chain of registrations reads straight through.
pub struct WorldBuilder {
    config: EngineConfig,
    codes: CodeTable,
    background: Option<TerrainCode>,
    handlers: HandlerRegistry,
    error: Option<BuildError>,
}

impl WorldBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            codes: CodeTable::new(),
            background: None,
            handlers: HandlerRegistry::new(),
            error: None,
        }
    }

    /// Registers a code that stays in the terrain layer.
    pub fn fixed(self, code: TerrainCode, art: ArtHandle) -> Self {
        self.register(
            code,
            CodeSpec {
                art,
                mobility: Mobility::Fixed,
            },
        )
    }

    /// Registers a code that becomes an actor routed under `kind`.
    pub fn movable(self, code: TerrainCode, art: ArtHandle, kind: ActorKind) -> Self {
        self.register(
            code,
            CodeSpec {
                art,
                mobility: Mobility::Movable { kind },
            },
        )
    }

    /// Fixed code painted under actors lifted out of the level. Without one,
    /// those cells keep the actor's code in the terrain layer.
    pub fn background(mut self, code: TerrainCode) -> Self {
        self.background = Some(code);
        self
    }

    pub fn on_stationary<F>(mut self, kind: ActorKind, handler: F) -> Self
    where
        F: Fn(&mut EventContext<'_>) -> RuleResult + 'static,
    {
        self.handlers.on_stationary(kind, handler);
        self
    }

    pub fn on_transition<F>(mut self, kind: ActorKind, handler: F) -> Self
    where
        F: Fn(&mut EventContext<'_>) -> RuleResult + 'static,
    {
        self.handlers.on_transition(kind, handler);
        self
    }

    pub fn on_arrival<F>(mut self, kind: ActorKind, handler: F) -> Self
    where
        F: Fn(&mut EventContext<'_>, Direction) -> RuleResult + 'static,
    {
        self.handlers.on_arrival(kind, handler);
        self
    }

    fn register(mut self, code: TerrainCode, spec: CodeSpec) -> Self {
        if let Err(err) = self.codes.register(code, spec) {
            self.error.get_or_insert(err);
        }
        self
    }

    /// Scans `level` row-major: fixed codes stay as terrain, movable codes
    /// become idle actors centred on their cell.
    pub fn build(self, level: Layer<TerrainCode>) -> Result<World, BuildError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.config.validate()?;
        if let Some(code) = self.background {
            if !self.codes.is_fixed(code) {
                return Err(BuildError::InvalidBackground(code));
            }
        }

        let geometry = Geometry::new(self.config.tile_bits);
        let mut terrain = level;
        let mut roster = Roster::new();

        for cell in terrain.dimensions().cells() {
            let Some(code) = terrain.get(cell).copied() else {
                continue;
            };
            match self.codes.get(code).map(|spec| spec.mobility) {
                None => return Err(BuildError::UnknownCode { code, cell }),
                Some(Mobility::Fixed) => {}
                Some(Mobility::Movable { kind }) => {
                    roster.spawn(code, kind, cell, geometry)?;
                    if let Some(background) = self.background {
                        terrain.set(cell, background);
                    }
                }
            }
        }

        let dims = terrain.dimensions();
        let mut layers = OccupancyModel::new(terrain);
        layers.recompute(roster.iter());

        info!(
            target: "tileworld::world",
            width = dims.width,
            height = dims.height,
            actors = roster.len(),
            tile_bits = self.config.tile_bits,
            speed = self.config.speed,
            "world built"
        );

        Ok(World {
            state: WorldState {
                config: self.config,
                geometry,
                codes: self.codes,
                background: self.background,
                layers,
                roster,
                queue: ActionQueue::new(),
                frame: 0,
                report: FrameReport::default(),
                input_report: FrameReport::default(),
            },
            handlers: self.handlers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;

    const EMPTY: TerrainCode = TerrainCode(0);
    const WALL: TerrainCode = TerrainCode(1);
    const ROCK: TerrainCode = TerrainCode(2);
    const FALLING: ActorKind = ActorKind(1);

    fn builder() -> WorldBuilder {
        WorldBuilder::new(EngineConfig::default())
            .fixed(EMPTY, ArtHandle(0))
            .fixed(WALL, ArtHandle(1))
            .movable(ROCK, ArtHandle(2), FALLING)
    }

    fn level(rows: &[[u8; 3]]) -> Layer<TerrainCode> {
        Layer::from_rows(
            rows.iter()
                .map(|row| row.iter().map(|c| TerrainCode(*c)).collect::<Vec<_>>())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn movable_codes_become_actors_in_scan_order() {
        let world = builder()
            .background(EMPTY)
            .build(level(&[[1, 2, 0], [2, 0, 2]]))
            .unwrap();

        let cells: Vec<_> = world.actors().map(|a| a.cell()).collect();
        assert_eq!(cells, vec![Cell::new(1, 0), Cell::new(0, 1), Cell::new(2, 1)]);
        assert!(world.tile_is(EMPTY, Cell::new(1, 0)));
        assert!(world.tile_is(WALL, Cell::new(0, 0)));
        assert_eq!(world.count_code_at(ROCK, Cell::new(1, 0)), 1);
        assert_eq!(world.frame(), 0);
    }

    #[test]
    fn without_background_lifted_cells_keep_their_code() {
        let world = builder().build(level(&[[2, 0, 0]])).unwrap();
        assert!(world.tile_is(ROCK, Cell::new(0, 0)));
        assert_eq!(world.actor_count(), 1);
    }

    #[test]
    fn unknown_level_code_is_rejected() {
        let err = builder().build(level(&[[0, 9, 0]])).unwrap_err();
        assert_eq!(
            err,
            BuildError::UnknownCode {
                code: TerrainCode(9),
                cell: Cell::new(1, 0)
            }
        );
    }

    #[test]
    fn first_registration_error_wins() {
        let err = builder()
            .fixed(WALL, ArtHandle(9))
            .movable(ROCK, ArtHandle(9), FALLING)
            .build(level(&[[0, 0, 0]]))
            .unwrap_err();
        assert_eq!(err, BuildError::DuplicateCode(WALL));
    }

    #[test]
    fn background_must_be_fixed() {
        let err = builder()
            .background(ROCK)
            .build(level(&[[0, 0, 0]]))
            .unwrap_err();
        assert_eq!(err, BuildError::InvalidBackground(ROCK));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = WorldBuilder::new(EngineConfig::new().with_speed(0))
            .build(level(&[[0, 0, 0]]))
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidConfig(_)));
    }
}
