//! Headless boulders runner.
use anyhow::{Context, Result};
use tileworld_boulders::level::{self, DEFAULT_LEVEL};
use tileworld_boulders::{BoulderConfig, Game};

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = BoulderConfig::from_env();

    let text = match &config.level_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading level {}", path.display()))?,
        None => DEFAULT_LEVEL.to_owned(),
    };
    let layer = level::parse_level(&text).context("parsing level")?;

    let mut game = Game::new(&config, layer)?;
    println!("{}\n", level::render(game.world()));

    let summary = game.run(&config.script)?;
    println!("{}\n", level::render(game.world()));
    println!(
        "frames {} | diamonds {} collected, {} left | digs {} | pushes {} | {}",
        summary.frames,
        summary.stats.diamonds,
        summary.diamonds_left,
        summary.stats.digs,
        summary.stats.pushes,
        if summary.player_alive { "alive" } else { "crushed" },
    );
    Ok(())
}
