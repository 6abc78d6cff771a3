//! Draw primitives handed to the host renderer
//!
//! The core builds one [`Frame`] per rendered frame from a context snapshot and
//! never reads anything back. Coordinates are canvas CSS pixels.

pub mod shapes;

use glam::Vec2;
use serde::Serialize;

use crate::sim::{GameKind, Phase};

pub use shapes::build_frame;

/// What a primitive depicts; hosts pick the styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sprite {
    Background,
    Pipe,
    PipeCap,
    Ground,
    GroundStripe,
    Bird,
    BirdWing,
    BirdBeak,
    BirdEye,
    Board,
    SnakeBody,
    SnakeHead,
    Food,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Rect {
        sprite: Sprite,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// Angles in radians, clockwise from +x
    Arc {
        sprite: Sprite,
        center: Vec2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
    },
    Path {
        sprite: Sprite,
        points: Vec<Vec2>,
        closed: bool,
    },
}

impl DrawCommand {
    pub fn rect(sprite: Sprite, x: f32, y: f32, width: f32, height: f32) -> Self {
        DrawCommand::Rect {
            sprite,
            x,
            y,
            width,
            height,
        }
    }

    pub fn circle(sprite: Sprite, center: Vec2, radius: f32) -> Self {
        DrawCommand::Arc {
            sprite,
            center,
            radius,
            start_angle: 0.0,
            end_angle: std::f32::consts::TAU,
        }
    }

    pub fn sprite(&self) -> Sprite {
        match self {
            DrawCommand::Rect { sprite, .. }
            | DrawCommand::Arc { sprite, .. }
            | DrawCommand::Path { sprite, .. } => *sprite,
        }
    }
}

/// Everything the host needs to paint one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub game: GameKind,
    pub phase: Phase,
    pub score: u32,
    pub best: u32,
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Host-side consumer of frames
pub trait Renderer {
    fn present(&mut self, frame: &Frame);
}
