//! Drives a boulders world from a scripted list of player inputs.

use tracing::{debug, info};

use tileworld_core::{ActorId, Direction, FrameReport, Layer, TerrainCode, World};

use crate::config::{BoulderConfig, Command};
use crate::error::{BoulderError, Result};
use crate::level::{DIAMOND, PLAYER};
use crate::rules::{self, SharedStats, Stats};

/// End-of-run numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary {
    pub frames: u64,
    pub stats: Stats,
    pub diamonds_left: usize,
    pub player_alive: bool,
    pub handler_faults: usize,
}

pub struct Game {
    world: World,
    player: ActorId,
    stats: SharedStats,
    frame_limit: u64,
    handler_faults: usize,
    last: FrameReport,
}

impl Game {
    pub fn new(config: &BoulderConfig, level: Layer<TerrainCode>) -> Result<Self> {
        let stats = SharedStats::default();
        let world = rules::builder(config.engine_config(), config.seed, &stats).build(level)?;
        let player = world
            .actors()
            .find(|actor| actor.code() == PLAYER)
            .map(|actor| actor.id())
            .ok_or(BoulderError::NoPlayer)?;

        Ok(Self {
            world,
            player,
            stats,
            frame_limit: config.frames,
            handler_faults: 0,
            last: FrameReport::default(),
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn stats(&self) -> Stats {
        *self.stats.borrow()
    }

    pub fn player_alive(&self) -> bool {
        self.world.actor(self.player).is_some()
    }

    fn player_moving(&self) -> bool {
        self.world
            .actor(self.player)
            .is_some_and(|actor| actor.is_moving())
    }

    /// Runs one frame. False once the frame limit is reached.
    pub fn tick(&mut self) -> Result<bool> {
        if self.world.frame() >= self.frame_limit {
            return Ok(false);
        }
        let report = self.world.tick()?;
        self.handler_faults += report.handler_faults;
        self.last = report;
        Ok(true)
    }

    pub fn press(&mut self, direction: Direction) -> Result<()> {
        if self.player_alive() {
            self.world.press(self.player, direction)?;
        }
        Ok(())
    }

    /// Applies one command: a move walks exactly one cell (if the rules allow
    /// it), a wait idles for as long as a move would take.
    pub fn step(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Go(direction) => {
                self.press(direction)?;
                if !self.tick()? {
                    return Ok(());
                }
                if self.player_alive() {
                    self.world.release(self.player, direction)?;
                }
                while self.player_moving() {
                    if !self.tick()? {
                        break;
                    }
                }
            }
            Command::Wait => {
                let config = self.world.config();
                let frames = (config.cell_size() / config.speed).max(1);
                for _ in 0..frames {
                    if !self.tick()? {
                        break;
                    }
                }
            }
        }
        debug!(
            target: "boulders::game",
            ?command,
            frame = self.world.frame(),
            alive = self.player_alive(),
            "step done"
        );
        Ok(())
    }

    /// At least one frame ran, nothing is moving and the last frame changed nothing.
    pub fn is_quiet(&self) -> bool {
        self.world.frame() > 0
            && self.last.actions_applied == 0
            && self.world.actors().all(|actor| !actor.is_moving())
    }

    /// Plays `script`, then lets the world run on until it is quiet or the
    /// frame limit is hit.
    pub fn run(&mut self, script: &[Command]) -> Result<Summary> {
        for &command in script {
            if !self.player_alive() || self.world.frame() >= self.frame_limit {
                break;
            }
            self.step(command)?;
        }
        while !self.is_quiet() {
            if !self.tick()? {
                break;
            }
        }

        let summary = self.summary();
        info!(
            target: "boulders::game",
            frames = summary.frames,
            diamonds = summary.stats.diamonds,
            diamonds_left = summary.diamonds_left,
            alive = summary.player_alive,
            faults = summary.handler_faults,
            "run finished"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> Summary {
        Summary {
            frames: self.world.frame(),
            stats: self.stats(),
            diamonds_left: self
                .world
                .actors()
                .filter(|actor| actor.code() == DIAMOND)
                .count(),
            player_alive: self.player_alive(),
            handler_faults: self.handler_faults,
        }
    }
}
