//! Boulder-dash style rules expressed as engine handlers.
//!
//! The player digs dirt, collects diamonds and pushes rocks sideways. Rocks
//! and diamonds fall into empty cells, roll off anything that falls, and crush
//! a player they land on while in flight.

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use tileworld_core::{
    Axis, Direction, EngineConfig, EventContext, Expect, Offset, RuleError, RuleResult,
    World, WorldBuilder,
};

use crate::level::{DIAMOND, DIRT, EMPTY, FALLING, HERO, ROCK, TILES, WALL};

/// What the rules did so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub diamonds: u32,
    pub digs: u32,
    pub pushes: u32,
    pub crushed: u32,
}

pub type SharedStats = Rc<RefCell<Stats>>;

/// A builder with every tile registered and the boulders handlers installed.
///
/// `seed` drives which side a rock tries first when it can roll both ways.
pub fn builder(config: EngineConfig, seed: u64, stats: &SharedStats) -> WorldBuilder {
    let rng = RefCell::new(SmallRng::seed_from_u64(seed));

    TILES
        .iter()
        .fold(World::builder(config).background(EMPTY), |builder, tile| {
            match tile.kind {
                Some(kind) => builder.movable(tile.code, tile.art(), kind),
                None => builder.fixed(tile.code, tile.art()),
            }
        })
        .on_arrival(HERO, hero_arrival(stats.clone()))
        .on_transition(HERO, hero_transition(stats.clone()))
        .on_stationary(FALLING, move |ctx| fall_or_roll(ctx, &rng))
        .on_arrival(FALLING, keep_falling)
        .on_transition(FALLING, falling_transition(stats.clone()))
}

/// A held direction keeps the player walking; rocks ahead are pushed when the
/// cell behind them is clear.
fn hero_arrival(stats: SharedStats) -> impl Fn(&mut EventContext<'_>, Direction) -> RuleResult {
    move |ctx, direction| {
        if direction == Direction::None {
            return Ok(());
        }
        ctx.has_code(WALL, direction, Expect::Zero)?;

        if ctx.count_code_at(ROCK, direction)? > 0 {
            if direction.axis() != Some(Axis::Horizontal) {
                return Err(RuleError::CheckFailed);
            }
            ctx.has_code(EMPTY, Offset::pair(direction, direction), Expect::Only)?;
            ctx.has_code(ROCK, direction, Expect::One)?;
            if !ctx.move_other(direction, direction) {
                return Err(RuleError::CheckFailed);
            }
            stats.borrow_mut().pushes += 1;
        }

        ctx.move_self(direction);
        Ok(())
    }
}

/// Entering a cell digs out its dirt and picks up any diamond lying there.
fn hero_transition(stats: SharedStats) -> impl Fn(&mut EventContext<'_>) -> RuleResult {
    move |ctx| {
        if ctx.tile_is(DIRT, Offset::here())? {
            ctx.set_terrain(EMPTY, Offset::here())?;
            stats.borrow_mut().digs += 1;
        }
        if ctx.has_code(DIAMOND, Offset::here(), Expect::One).is_ok()
            && ctx.remove_other(Direction::None)
        {
            debug!(
                target: "boulders::rules",
                frame = ctx.frame(),
                cell = %ctx.cell()?,
                "diamond collected"
            );
            stats.borrow_mut().diamonds += 1;
        }
        Ok(())
    }
}

fn fall_or_roll(ctx: &mut EventContext<'_>, rng: &RefCell<SmallRng>) -> RuleResult {
    if ctx.has_code(EMPTY, Direction::Down, Expect::Only).is_ok() {
        ctx.move_self(Direction::Down);
        return Ok(());
    }

    // only round things resting on other falling things roll
    ctx.has_kind(FALLING, Direction::Down, Expect::One)?;
    let sides = if rng.borrow_mut().gen_bool(0.5) {
        [Direction::Left, Direction::Right]
    } else {
        [Direction::Right, Direction::Left]
    };
    for side in sides {
        let clear = ctx.has_code(EMPTY, side, Expect::Only).is_ok()
            && ctx
                .has_code(EMPTY, Offset::pair(side, Direction::Down), Expect::Only)
                .is_ok();
        if clear {
            ctx.move_self(side);
            return Ok(());
        }
    }
    Err(RuleError::CheckFailed)
}

fn keep_falling(ctx: &mut EventContext<'_>, direction: Direction) -> RuleResult {
    if direction != Direction::None {
        ctx.has_code(EMPTY, Direction::Down, Expect::Only)?;
        ctx.move_self(Direction::Down);
    }
    Ok(())
}

/// Landing on the player while falling crushes it. Anything else already in
/// the cell bounces the faller back.
fn falling_transition(stats: SharedStats) -> impl Fn(&mut EventContext<'_>) -> RuleResult {
    move |ctx| {
        if ctx.direction()? == Direction::Down
            && ctx.has_kind(HERO, Offset::here(), Expect::One).is_ok()
            && ctx.remove_other(Direction::None)
        {
            debug!(
                target: "boulders::rules",
                frame = ctx.frame(),
                cell = %ctx.cell()?,
                "player crushed"
            );
            stats.borrow_mut().crushed += 1;
            return Ok(());
        }
        if ctx.has_code(EMPTY, Offset::here(), Expect::Only).is_err() {
            ctx.knock_back();
        }
        Ok(())
    }
}
