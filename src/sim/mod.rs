//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Tick-scaled continuous motion, fixed-interval grid motion
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod flappy;
pub mod phase;
pub mod snake;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::Rect;
pub use flappy::{Bird, FlappyWorld, Pipe};
pub use phase::PhaseError;
pub use snake::{Cell, Direction, SnakeBody, SnakeWorld};
pub use state::{GameEvent, GameKind, Phase, SimError, SimulationContext, World};
pub use tick::tick;
