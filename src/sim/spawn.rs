//! Obstacle and food generation
//!
//! Pipes are time-based, counted in ticks rather than wall-clock; food is
//! event-based and only respawns when eaten.

use rand::Rng;

use super::collision::hits_body;
use super::flappy::{FlappyMetrics, Pipe};
use super::snake::Cell;

/// Pipes spawn just past the right edge
const SPAWN_OFFSET_PX: f32 = 8.0;
/// Vertical range the gap may use, at minimum
const MIN_USABLE_PX: f32 = 8.0;

/// Tick-unit spawn accumulator for pipes
#[derive(Debug, Clone, PartialEq)]
pub struct PipeSpawner {
    pub timer: f32,
    pub interval: f32,
}

impl PipeSpawner {
    pub fn new(interval: f32) -> Self {
        Self {
            timer: 0.0,
            interval,
        }
    }

    pub fn reset(&mut self) {
        self.timer = 0.0;
    }

    /// Advance by `dt` ticks; true when a pipe is due
    pub fn advance(&mut self, dt: f32) -> bool {
        self.timer += dt;
        if self.timer >= self.interval {
            self.timer = 0.0;
            true
        } else {
            false
        }
    }
}

/// Random gap top that always leaves the margins clear of ceiling and floor
pub fn pipe_gap_top<R: Rng>(metrics: &FlappyMetrics, rng: &mut R) -> f32 {
    let margin = metrics.gap_margin;
    let lowest = (metrics.floor_y - margin - metrics.pipe_gap - metrics.cap_reserve).floor();
    let max_top = margin.max(lowest);
    let usable = MIN_USABLE_PX.max(max_top - margin);
    margin + (rng.random::<f32>() * usable).floor()
}

/// New pipe entering from the right edge
pub fn spawn_pipe<R: Rng>(metrics: &FlappyMetrics, rng: &mut R) -> Pipe {
    Pipe {
        x: metrics.width + SPAWN_OFFSET_PX,
        gap_top: pipe_gap_top(metrics, rng),
        width: metrics.pipe_width,
        passed: false,
    }
}

/// Pick a free cell by rejection sampling
///
/// Falls back to the first free cell in row-major order once `attempts` run
/// out, and to the origin if the grid is full, so placement never fails.
pub fn place_food<'a, R, I>(rng: &mut R, cols: i32, rows: i32, occupied: I, attempts: u32) -> Cell
where
    R: Rng,
    I: IntoIterator<Item = &'a Cell> + Clone,
{
    for _ in 0..attempts {
        let candidate = Cell::new(rng.random_range(0..cols), rng.random_range(0..rows));
        if !hits_body(candidate, occupied.clone()) {
            return candidate;
        }
    }
    log::debug!("Food sampling exhausted {} attempts, scanning", attempts);
    (0..rows)
        .flat_map(|y| (0..cols).map(move |x| Cell::new(x, y)))
        .find(|c| !hits_body(*c, occupied.clone()))
        .unwrap_or_default()
}
