//! Rule scenarios played through [`Game`].

use tileworld_boulders::level::{DEFAULT_LEVEL, DIAMOND, EMPTY, PLAYER, ROCK};
use tileworld_boulders::{BoulderConfig, BoulderError, Command, Game, parse_level, render};
use tileworld_core::{Cell, Direction, TerrainCode};

fn game(rows: &[&str]) -> Game {
    let config = BoulderConfig {
        frames: 400,
        ..BoulderConfig::default()
    };
    Game::new(&config, parse_level(&rows.join("\n")).unwrap()).unwrap()
}

fn cells_of(game: &Game, code: TerrainCode) -> Vec<Cell> {
    game.world()
        .actors()
        .filter(|actor| actor.code() == code)
        .map(|actor| actor.cell())
        .collect()
}

fn player_cell(game: &Game) -> Cell {
    cells_of(game, PLAYER)[0]
}

#[test]
fn level_without_player_is_rejected() {
    let err = Game::new(&BoulderConfig::default(), parse_level("..o\n###").unwrap()).err();
    assert!(matches!(err, Some(BoulderError::NoPlayer)));
}

#[test]
fn walls_stop_the_player() {
    let mut game = game(&["P#", "##"]);
    game.step(Command::Go(Direction::Right)).unwrap();
    assert_eq!(player_cell(&game), Cell::new(0, 0));
}

#[test]
fn one_step_walks_exactly_one_cell() {
    let mut game = game(&["P...", "####"]);
    game.step(Command::Go(Direction::Right)).unwrap();
    game.step(Command::Go(Direction::Right)).unwrap();

    let player = game.world().actors().find(|a| a.code() == PLAYER).unwrap();
    assert_eq!(player.cell(), Cell::new(2, 0));
    assert!(player.is_centred());
    assert!(!player.is_moving());
}

#[test]
fn digging_and_collecting() {
    let mut game = game(&["P:*.", "####"]);

    game.step(Command::Go(Direction::Right)).unwrap();
    assert_eq!(game.world().terrain(Cell::new(1, 0)), Some(EMPTY));
    assert_eq!(game.stats().digs, 1);

    game.step(Command::Go(Direction::Right)).unwrap();
    assert_eq!(player_cell(&game), Cell::new(2, 0));
    assert_eq!(game.stats().diamonds, 1);
    assert!(cells_of(&game, DIAMOND).is_empty());
    assert_eq!(render(game.world()), "..P.\n####");
}

#[test]
fn rocks_are_pushed_sideways_only() {
    let mut game = game(&[".Po..", "#####"]);
    game.step(Command::Go(Direction::Right)).unwrap();
    assert_eq!(player_cell(&game), Cell::new(2, 0));
    assert_eq!(cells_of(&game, ROCK), vec![Cell::new(3, 0)]);
    assert_eq!(game.stats().pushes, 1);

    // nothing behind the rock but the edge of the level
    game.step(Command::Go(Direction::Right)).unwrap();
    game.step(Command::Go(Direction::Right)).unwrap();
    assert_eq!(cells_of(&game, ROCK), vec![Cell::new(4, 0)]);
    assert_eq!(player_cell(&game), Cell::new(3, 0));

    let mut game = self::game(&[".o.", ".P.", "###"]);
    game.step(Command::Go(Direction::Up)).unwrap();
    assert_eq!(player_cell(&game), Cell::new(1, 1));
    assert_eq!(cells_of(&game, ROCK), vec![Cell::new(1, 0)]);
}

#[test]
fn rocks_fall_until_they_land() {
    let mut game = game(&["P.o.", "....", "....", "####"]);
    let summary = game.run(&[]).unwrap();

    assert_eq!(cells_of(&game, ROCK), vec![Cell::new(2, 2)]);
    // start, one cell, second cell, landing check
    assert_eq!(summary.frames, 17);
    assert_eq!(summary.handler_faults, 0);
    assert!(summary.player_alive);
}

#[test]
fn a_rock_on_a_rock_rolls_off_the_same_way_for_the_same_seed() {
    let rows = ["P....", "..o..", "..o..", "#####"];
    let mut first = game(&rows);
    let mut second = game(&rows);
    first.run(&[]).unwrap();
    second.run(&[]).unwrap();

    let rocks = cells_of(&first, ROCK);
    assert_eq!(rocks.len(), 2);
    assert!(rocks.contains(&Cell::new(2, 2)));
    assert!(rocks.contains(&Cell::new(1, 2)) || rocks.contains(&Cell::new(3, 2)));
    assert_eq!(render(first.world()), render(second.world()));
}

#[test]
fn a_falling_rock_crushes_the_player() {
    let mut game = game(&[".o.", "...", "P..", "###"]);
    for _ in 0..5 {
        game.tick().unwrap();
    }
    // the player walks under the rock after it has checked the cell below
    game.press(Direction::Right).unwrap();
    let summary = game.run(&[]).unwrap();

    assert!(!summary.player_alive);
    assert_eq!(summary.stats.crushed, 1);
    assert_eq!(cells_of(&game, ROCK), vec![Cell::new(1, 2)]);
}

#[test]
fn standing_under_a_resting_rock_is_safe() {
    let mut game = game(&[".o.", ".P.", "###"]);
    let summary = game.run(&[Command::Wait, Command::Wait]).unwrap();
    assert!(summary.player_alive);
    assert_eq!(cells_of(&game, ROCK), vec![Cell::new(1, 0)]);
}

#[test]
fn default_level_runs_cleanly() {
    let config = BoulderConfig::default();
    let mut game = Game::new(&config, parse_level(DEFAULT_LEVEL).unwrap()).unwrap();
    let summary = game.run(&config.script).unwrap();

    assert_eq!(summary.handler_faults, 0);
    assert!(summary.frames <= config.frames);
    let rendered = render(game.world());
    assert_eq!(rendered.lines().count(), 6);
    assert!(rendered.lines().all(|line| line.len() == 10));
}
