//! Discrete grid crawler
//!
//! Moves exactly one cell per grid step. Steps are driven by the context's
//! clock accumulator, not by render frames.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{hits_body, in_grid};
use super::phase;
use super::spawn::place_food;
use super::state::{GameEvent, GameKind, Phase, SimError, SimulationContext, World};
use crate::consts::MAX_GRID_STEPS;
use crate::tuning::SnakeTuning;
use crate::viewport::Viewport;

/// Integer grid coordinate, origin top-left
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Dominant axis of a drag, if it travelled at least `threshold`
    pub fn from_swipe(dx: f32, dy: f32, threshold: f32) -> Option<Self> {
        if !(dx.is_finite() && dy.is_finite()) {
            return None;
        }
        if dx.abs().max(dy.abs()) < threshold {
            return None;
        }
        Some(if dx.abs() >= dy.abs() {
            if dx > 0.0 { Direction::Right } else { Direction::Left }
        } else if dy > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        })
    }
}

/// Ordered body cells, tail first, head last
#[derive(Debug, Clone, PartialEq)]
pub struct SnakeBody {
    cells: VecDeque<Cell>,
    pub direction: Direction,
    /// Latest requested direction, applied at the next grid step
    pub pending_direction: Direction,
}

impl SnakeBody {
    /// Straight body of `length` cells ending at `head`, facing `direction`
    pub fn new(head: Cell, length: usize, direction: Direction) -> Self {
        let back = direction.opposite();
        let mut cells = VecDeque::with_capacity(length.max(1));
        let mut cell = head;
        cells.push_front(cell);
        for _ in 1..length {
            cell = cell.offset(back);
            cells.push_front(cell);
        }
        Self {
            cells,
            direction,
            pending_direction: direction,
        }
    }

    pub fn head(&self) -> Cell {
        self.cells.back().copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &VecDeque<Cell> {
        &self.cells
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Record a requested direction; later calls overwrite earlier ones
    pub fn queue_direction(&mut self, dir: Direction) {
        self.pending_direction = dir;
    }

    /// Apply the pending direction unless it reverses onto the neck
    pub fn resolve_direction(&mut self) -> Direction {
        if self.pending_direction == self.direction.opposite() && self.len() > 1 {
            log::debug!("Ignoring reversal {:?}", self.pending_direction);
            self.pending_direction = self.direction;
        } else {
            self.direction = self.pending_direction;
        }
        self.direction
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    Wall,
    SelfHit,
}

/// Result of one grid step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridOutcome {
    Moved,
    Ate,
    Died(DeathCause),
}

#[derive(Debug, Clone)]
pub struct SnakeWorld {
    pub tuning: SnakeTuning,
    pub body: SnakeBody,
    pub food: Cell,
    /// Cell edge in CSS pixels at the current scale
    pub cell_px: f32,
}

impl SnakeWorld {
    pub fn new<R: Rng>(tuning: SnakeTuning, viewport: &Viewport, rng: &mut R) -> Self {
        let body = Self::initial_body(&tuning);
        let food = place_food(rng, tuning.cols, tuning.rows, body.cells(), tuning.food_attempts);
        let cell_px = viewport.px(tuning.cell_size);
        Self {
            tuning,
            body,
            food,
            cell_px,
        }
    }

    fn initial_body(tuning: &SnakeTuning) -> SnakeBody {
        let length = tuning.initial_length.max(1);
        let head = Cell::new(length as i32 + 2, tuning.rows / 2);
        SnakeBody::new(head, length, Direction::Right)
    }

    /// Fresh run layout
    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        self.body = Self::initial_body(&self.tuning);
        self.food = self.place_food(rng);
    }

    pub fn relayout(&mut self, viewport: &Viewport) {
        self.cell_px = viewport.px(self.tuning.cell_size);
    }

    fn place_food<R: Rng>(&self, rng: &mut R) -> Cell {
        place_food(
            rng,
            self.tuning.cols,
            self.tuning.rows,
            self.body.cells(),
            self.tuning.food_attempts,
        )
    }

    /// Advance one cell
    ///
    /// The candidate head is checked against the bounds, then against the body
    /// as it will be after the move. The tail cell is vacated on a plain move,
    /// so the head may enter it; it still counts when growing.
    pub fn grid_step<R: Rng>(&mut self, rng: &mut R) -> GridOutcome {
        let dir = self.body.resolve_direction();
        let next = self.body.head().offset(dir);

        if !in_grid(next, self.tuning.cols, self.tuning.rows) {
            return GridOutcome::Died(DeathCause::Wall);
        }

        let grows = next == self.food;
        let blocking = self.body.cells.iter().skip(usize::from(!grows));
        if hits_body(next, blocking) {
            return GridOutcome::Died(DeathCause::SelfHit);
        }

        self.body.cells.push_back(next);
        if grows {
            self.food = self.place_food(rng);
            GridOutcome::Ate
        } else {
            self.body.cells.pop_front();
            GridOutcome::Moved
        }
    }

    /// Top-left pixel of a cell
    pub fn cell_origin(&self, cell: Cell) -> (f32, f32) {
        (cell.x as f32 * self.cell_px, cell.y as f32 * self.cell_px)
    }
}

/// Consume whole grid intervals from the clock accumulator
pub fn step(ctx: &mut SimulationContext, _dt: f32) -> Result<(), SimError> {
    if ctx.phase != Phase::Playing {
        return Ok(());
    }
    let found = ctx.kind();
    let interval = match &ctx.world {
        World::Snake(w) => w.tuning.tick_ms,
        World::Flappy(_) => {
            return Err(SimError::WrongWorld {
                expected: GameKind::Snake,
                found,
            });
        }
    };

    let mut steps = 0;
    while ctx.clock_accumulator_ms >= interval && steps < MAX_GRID_STEPS {
        ctx.clock_accumulator_ms -= interval;
        steps += 1;

        let outcome = match &mut ctx.world {
            World::Snake(world) => world.grid_step(&mut ctx.rng),
            World::Flappy(_) => break,
        };
        match outcome {
            GridOutcome::Moved => {}
            GridOutcome::Ate => {
                let score = ctx.score.increment();
                ctx.emit(GameEvent::Ate { score });
            }
            GridOutcome::Died(cause) => {
                log::debug!("Snake died: {:?}", cause);
                ctx.emit(GameEvent::Hit);
                phase::enter_dead(ctx)?;
                ctx.clock_accumulator_ms = 0.0;
                return Ok(());
            }
        }
    }

    if ctx.clock_accumulator_ms >= interval {
        log::debug!(
            "Dropping {:.0} ms grid backlog after {} steps",
            ctx.clock_accumulator_ms,
            steps
        );
        ctx.clock_accumulator_ms %= interval;
    }
    Ok(())
}
