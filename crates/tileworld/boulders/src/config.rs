//! Run configuration for the boulders binary.
use std::env;
use std::path::PathBuf;

use tileworld_core::{Direction, EngineConfig};

/// One scripted player input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Go(Direction),
    Wait,
}

impl Command {
    /// `L`/`R`/`U`/`D` (either case) move, anything else waits one turn.
    pub fn parse_script(script: &str) -> Vec<Command> {
        script
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .map(|ch| match ch.to_ascii_uppercase() {
                'L' => Command::Go(Direction::Left),
                'R' => Command::Go(Direction::Right),
                'U' => Command::Go(Direction::Up),
                'D' => Command::Go(Direction::Down),
                _ => Command::Wait,
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct BoulderConfig {
    /// Upper bound on simulated frames.
    pub frames: u64,
    pub speed: i32,
    pub script: Vec<Command>,
    /// Seeds the rock-rolling tie breaker.
    pub seed: u64,
    /// Level file; the built-in level when unset.
    pub level_path: Option<PathBuf>,
}

impl BoulderConfig {
    pub const DEFAULT_FRAMES: u64 = 600;
    pub const DEFAULT_SCRIPT: &'static str = "RRRDDLLRRRRUU";
    pub const DEFAULT_SEED: u64 = 0x7117_3E0D;

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `TILEWORLD_FRAMES` - Frames to simulate (default: 600)
    /// - `TILEWORLD_SPEED` - Sub-cell units per frame (default: engine default)
    /// - `TILEWORLD_SCRIPT` - Player moves, e.g. `RRD.L` (default: built-in script)
    /// - `TILEWORLD_SEED` - Seed for rolling decisions
    /// - `TILEWORLD_LEVEL` - Path to a level file
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(frames) = read_env::<u64>("TILEWORLD_FRAMES") {
            config.frames = frames.max(1);
        }
        if let Some(speed) = read_env::<i32>("TILEWORLD_SPEED") {
            config.speed = speed;
        }
        if let Ok(script) = env::var("TILEWORLD_SCRIPT") {
            config.script = Command::parse_script(&script);
        }
        if let Some(seed) = read_env::<u64>("TILEWORLD_SEED") {
            config.seed = seed;
        }
        config.level_path = env::var("TILEWORLD_LEVEL").ok().map(PathBuf::from);

        config
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new().with_speed(self.speed)
    }
}

impl Default for BoulderConfig {
    fn default() -> Self {
        Self {
            frames: Self::DEFAULT_FRAMES,
            speed: EngineConfig::DEFAULT_SPEED,
            script: Command::parse_script(Self::DEFAULT_SCRIPT),
            seed: Self::DEFAULT_SEED,
            level_path: None,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
