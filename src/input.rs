//! Input handling
//!
//! Host events are mapped to intents on arrival and queued; the tick drains
//! the queue at its start, so input never mutates the simulation directly.

use std::collections::VecDeque;

use crate::consts::{INTENT_QUEUE_CAPACITY, POINTER_DEBOUNCE_MS, SWIPE_THRESHOLD_PX};
use crate::sim::snake::Direction;
use crate::sim::state::{GameKind, Phase};
use crate::viewport::Viewport;

/// Discrete player command consumed by the tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Start,
    Flap,
    SetDirection(Direction),
    Restart,
}

/// Bounded FIFO of intents awaiting the next tick
///
/// Within one tick, repeated Start/Flap/Restart intents collapse to the first
/// and repeated direction changes collapse to the latest.
#[derive(Debug, Clone)]
pub struct IntentQueue {
    queue: VecDeque<Intent>,
    capacity: usize,
}

impl Default for IntentQueue {
    fn default() -> Self {
        Self::with_capacity(INTENT_QUEUE_CAPACITY)
    }
}

impl IntentQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Enqueue an intent; returns false if it was collapsed or dropped
    pub fn push(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::SetDirection(_) => {
                if let Some(slot) = self
                    .queue
                    .iter_mut()
                    .find(|i| matches!(i, Intent::SetDirection(_)))
                {
                    *slot = intent;
                    return false;
                }
            }
            _ => {
                if self.queue.contains(&intent) {
                    return false;
                }
            }
        }
        if self.queue.len() >= self.capacity {
            log::warn!("Intent queue full, dropping {:?}", intent);
            return false;
        }
        self.queue.push_back(intent);
        true
    }

    /// Take every queued intent in arrival order
    pub fn drain(&mut self) -> impl Iterator<Item = Intent> + '_ {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

/// Raw event as delivered by the host, coordinates in canvas CSS pixels
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    PointerDown { x: f32, y: f32, time_ms: f64 },
    PointerUp { x: f32, y: f32, time_ms: f64 },
    /// Pre-classified swipe from hosts that do their own gesture detection
    Swipe(Direction),
    /// `KeyboardEvent.code` value
    Key(String),
}

/// Per-game raw input to intent mapping
#[derive(Debug, Clone)]
pub struct IntentMapper {
    game: GameKind,
    last_pointer_ms: Option<f64>,
    drag_origin: Option<(f32, f32)>,
}

impl IntentMapper {
    pub fn new(game: GameKind) -> Self {
        Self {
            game,
            last_pointer_ms: None,
            drag_origin: None,
        }
    }

    /// Map a raw event given the phase at arrival; `None` means ignore
    pub fn map(&mut self, raw: &RawInput, phase: Phase, viewport: &Viewport) -> Option<Intent> {
        match raw {
            RawInput::PointerDown { x, y, time_ms } => {
                if !viewport.contains(*x, *y) {
                    log::debug!("Pointer outside canvas at ({}, {})", x, y);
                    return None;
                }
                if self.debounced(*time_ms) {
                    return None;
                }
                self.drag_origin = Some((*x, *y));
                match self.game {
                    GameKind::Flappy => Self::flappy_action(phase),
                    GameKind::Snake => Self::snake_start(phase),
                }
            }
            RawInput::PointerUp { x, y, .. } => {
                let (ox, oy) = self.drag_origin.take()?;
                if self.game != GameKind::Snake || phase != Phase::Playing {
                    return None;
                }
                Direction::from_swipe(x - ox, y - oy, SWIPE_THRESHOLD_PX).map(Intent::SetDirection)
            }
            RawInput::Swipe(dir) => match self.game {
                GameKind::Snake => self.snake_direction(*dir, phase),
                GameKind::Flappy => None,
            },
            RawInput::Key(code) => self.map_key(code, phase),
        }
    }

    /// True if a press arrives too soon after the previous accepted one
    fn debounced(&mut self, time_ms: f64) -> bool {
        if !time_ms.is_finite() {
            return true;
        }
        if let Some(last) = self.last_pointer_ms {
            if time_ms - last < POINTER_DEBOUNCE_MS {
                return true;
            }
        }
        self.last_pointer_ms = Some(time_ms);
        false
    }

    fn map_key(&mut self, code: &str, phase: Phase) -> Option<Intent> {
        match self.game {
            GameKind::Flappy => match code {
                "Space" | "ArrowUp" => Self::flappy_action(phase),
                _ => None,
            },
            GameKind::Snake => {
                let dir = match code {
                    "ArrowUp" | "KeyW" => Some(Direction::Up),
                    "ArrowDown" | "KeyS" => Some(Direction::Down),
                    "ArrowLeft" | "KeyA" => Some(Direction::Left),
                    "ArrowRight" | "KeyD" => Some(Direction::Right),
                    _ => None,
                };
                match (dir, code) {
                    (Some(dir), _) => self.snake_direction(dir, phase),
                    (None, "Space" | "Enter") => Self::snake_start(phase),
                    _ => None,
                }
            }
        }
    }

    /// The one-button game: same press starts, flaps or restarts
    fn flappy_action(phase: Phase) -> Option<Intent> {
        match phase {
            Phase::Menu => Some(Intent::Start),
            Phase::Playing => Some(Intent::Flap),
            Phase::Dead => Some(Intent::Restart),
            Phase::Dying => None,
        }
    }

    fn snake_start(phase: Phase) -> Option<Intent> {
        match phase {
            Phase::Menu => Some(Intent::Start),
            Phase::Dead => Some(Intent::Restart),
            Phase::Playing | Phase::Dying => None,
        }
    }

    fn snake_direction(&self, dir: Direction, phase: Phase) -> Option<Intent> {
        match phase {
            Phase::Playing => Some(Intent::SetDirection(dir)),
            _ => Self::snake_start(phase),
        }
    }
}
