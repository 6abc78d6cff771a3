//! Idle/demo mode - the computer plays
//!
//! Produces the same intents a player would, so demo runs go through the
//! normal input path and stay deterministic.

use super::collision::{hits_body, in_grid};
use super::flappy::FlappyWorld;
use super::snake::{Direction, SnakeWorld};
use super::state::{Phase, SimulationContext, World};
use crate::input::Intent;

/// Intent the autopilot would issue this frame, if any
pub fn suggest(ctx: &SimulationContext) -> Option<Intent> {
    match ctx.phase {
        Phase::Menu => Some(Intent::Start),
        Phase::Dead => Some(Intent::Restart),
        Phase::Dying => None,
        Phase::Playing => match &ctx.world {
            World::Flappy(w) => flappy_move(w),
            World::Snake(w) => snake_move(w).map(Intent::SetDirection),
        },
    }
}

/// Flap when falling below the middle of the next gap
fn flappy_move(world: &FlappyWorld) -> Option<Intent> {
    let bird = &world.bird;
    let target = world
        .pipes
        .iter()
        .find(|p| p.right() >= bird.pos.x - bird.half())
        .map(|p| p.gap_top + world.metrics.pipe_gap * 0.6)
        .unwrap_or(world.metrics.floor_y * 0.5);

    (bird.vel >= 0.0 && bird.pos.y > target).then_some(Intent::Flap)
}

/// Greedy: the safe direction that gets closest to the food
fn snake_move(world: &SnakeWorld) -> Option<Direction> {
    let head = world.body.head();
    let current = world.body.direction;
    let cells = world.body.cells();
    let food = world.food;

    let mut options: Vec<(i32, Direction)> = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ]
    .into_iter()
    .filter(|d| *d != current.opposite())
    .filter_map(|d| {
        let next = head.offset(d);
        if !in_grid(next, world.tuning.cols, world.tuning.rows) {
            return None;
        }
        // The tail moves out of the way unless this step eats
        let skip = usize::from(next != food);
        if hits_body(next, cells.iter().skip(skip)) {
            return None;
        }
        Some(((next.x - food.x).abs() + (next.y - food.y).abs(), d))
    })
    .collect();

    // Prefer not turning on ties to keep the path stable
    options.sort_by_key(|(dist, d)| (*dist, *d != current));
    options.first().map(|(_, d)| *d).filter(|d| *d != current)
}
