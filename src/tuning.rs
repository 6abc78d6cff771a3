//! Data-driven game balance
//!
//! Distances are in design units and get multiplied by the viewport scale on
//! resize. Gravity and flap impulse are px/tick physics constants and are never
//! rescaled.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::viewport::DesignSize;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tuning: {0}")]
    Invalid(&'static str),
}

/// Side-scroller balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlappyTuning {
    pub design: DesignSize,
    /// Downward acceleration (px/tick²)
    pub gravity: f32,
    /// Velocity set by a flap (px/tick, negative is up)
    pub flap_impulse: f32,
    pub bird_size: f32,
    pub bird_x: f32,
    pub pipe_width: f32,
    pub pipe_gap: f32,
    /// Horizontal scroll speed (design units/tick)
    pub pipe_speed: f32,
    /// Ticks between pipe spawns
    pub spawn_interval: f32,
    /// Minimum distance kept between a gap and the ceiling or floor
    pub gap_margin: f32,
    /// Extra room reserved below the gap for the pipe cap
    pub cap_reserve: f32,
    /// Height of the ground band above the bottom edge
    pub floor_inset: f32,
    /// Pipes this far past the left edge (px) are dropped
    pub despawn_margin_px: f32,
    /// Delay between landing and the Dead phase
    pub death_delay_ms: f64,
    /// Playability floors for small screens, in px after scaling
    pub min_pipe_width: f32,
    pub min_pipe_gap: f32,
    pub min_pipe_speed: f32,
    pub min_bird_size: f32,
    /// Floor for the bird column, in design units (scaled)
    pub min_bird_x: f32,
}

impl Default for FlappyTuning {
    fn default() -> Self {
        Self {
            design: DesignSize::new(360.0, 700.0),
            gravity: 0.28,
            flap_impulse: -6.6,
            bird_size: 28.0,
            bird_x: 68.0,
            pipe_width: 56.0,
            pipe_gap: 150.0,
            pipe_speed: 2.6,
            spawn_interval: 94.0,
            gap_margin: 28.0,
            cap_reserve: 20.0,
            floor_inset: 44.0,
            despawn_margin_px: 300.0,
            death_delay_ms: 700.0,
            min_pipe_width: 40.0,
            min_pipe_gap: 110.0,
            min_pipe_speed: 1.2,
            min_bird_size: 20.0,
            min_bird_x: 48.0,
        }
    }
}

/// Grid crawler balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeTuning {
    pub cols: i32,
    pub rows: i32,
    /// Design units per cell
    pub cell_size: f32,
    /// Grid step interval
    pub tick_ms: f64,
    pub initial_length: usize,
    /// Rejection sampling budget for food placement
    pub food_attempts: u32,
}

impl Default for SnakeTuning {
    fn default() -> Self {
        Self {
            cols: 20,
            rows: 20,
            cell_size: 18.0,
            tick_ms: 150.0,
            initial_length: 3,
            food_attempts: 200,
        }
    }
}

impl SnakeTuning {
    pub fn design(&self) -> DesignSize {
        DesignSize::new(
            self.cols as f32 * self.cell_size,
            self.rows as f32 * self.cell_size,
        )
    }
}

/// All tunables for both games
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub flappy: FlappyTuning,
    pub snake: SnakeTuning,
}

impl Tuning {
    /// Parse a (possibly partial) JSON override; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let f = &self.flappy;
        if f.design.width <= 0.0 || f.design.height <= 0.0 {
            return Err(TuningError::Invalid("flappy design size must be positive"));
        }
        if f.spawn_interval <= 0.0 {
            return Err(TuningError::Invalid("spawn interval must be positive"));
        }
        if f.pipe_gap + 2.0 * f.gap_margin + f.cap_reserve + f.floor_inset >= f.design.height {
            return Err(TuningError::Invalid("pipe gap leaves no room for the margins"));
        }
        let s = &self.snake;
        if s.cols < 2 || s.rows < 2 {
            return Err(TuningError::Invalid("grid must be at least 2x2"));
        }
        if s.tick_ms <= 0.0 {
            return Err(TuningError::Invalid("grid tick must be positive"));
        }
        if s.initial_length == 0 || s.initial_length as i32 > s.cols / 2 {
            return Err(TuningError::Invalid("initial length must fit in half a row"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let tuning = Tuning::from_json(r#"{ "snake": { "tick_ms": 90.0 } }"#).unwrap();
        assert_eq!(tuning.snake.tick_ms, 90.0);
        assert_eq!(tuning.snake.cols, 20);
        assert_eq!(tuning.flappy, FlappyTuning::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Tuning::from_json(r#"{ "snake": { "cols": 1 } }"#),
            Err(TuningError::Invalid(_))
        ));
        assert!(matches!(
            Tuning::from_json("not json"),
            Err(TuningError::Parse(_))
        ));
    }
}
