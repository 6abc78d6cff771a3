//! Workout Arcade - simulation core for the hidden mini-games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement models, collisions, phases)
//! - `scheduler`: Frame-driven tick loop that owns the simulation context
//! - `viewport`: Design-space to device-pixel scaling
//! - `input`: Raw input to intent mapping and the per-tick intent queue
//! - `renderer`: Draw primitives handed to the host renderer
//! - `persistence`: Best-score store
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod input;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod scheduler;
pub mod score;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod viewport;

pub use scheduler::FrameScheduler;
pub use settings::{DyingMotion, Settings};
pub use tuning::Tuning;

/// Engine-wide constants
pub mod consts {
    /// Reference frame the continuous dt is normalised against (60 Hz)
    pub const TARGET_FRAME_MS: f64 = 1000.0 / 60.0;
    /// dt clamp, in reference frames
    pub const MIN_DT: f32 = 0.5;
    pub const MAX_DT: f32 = 4.0;
    /// Maximum grid steps per frame to prevent spiral of death
    pub const MAX_GRID_STEPS: u32 = 8;
    /// Intent queue capacity
    pub const INTENT_QUEUE_CAPACITY: usize = 16;
    /// Pointer presses closer together than this are dropped
    pub const POINTER_DEBOUNCE_MS: f64 = 60.0;
    /// Minimum drag distance (px) that counts as a swipe
    pub const SWIPE_THRESHOLD_PX: f32 = 24.0;
}

/// Convert elapsed wall time into a clamped tick delta
#[inline]
pub fn clamp_dt(elapsed_ms: f64, target_frame_ms: f64) -> f32 {
    let frames = (elapsed_ms / target_frame_ms) as f32;
    if !frames.is_finite() {
        return consts::MIN_DT;
    }
    frames.clamp(consts::MIN_DT, consts::MAX_DT)
}
