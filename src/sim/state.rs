//! Simulation context and core types
//!
//! One `SimulationContext` per mounted game. The tick handler is its only
//! writer; input reaches it through the intent queue.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::flappy::FlappyWorld;
use super::phase::PhaseError;
use super::snake::SnakeWorld;
use crate::platform::{TimerHandle, Timers};
use crate::score::ScoreTracker;
use crate::settings::DyingMotion;
use crate::tuning::{FlappyTuning, SnakeTuning};
use crate::viewport::{DesignSize, Viewport, ViewportNotice};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the first start intent
    Menu,
    /// Active gameplay
    Playing,
    /// Hit something, falling to the floor (continuous game only)
    Dying,
    /// Run ended
    Dead,
}

impl Phase {
    /// Transitions the state machine allows for `game`
    pub fn can_transition_to(self, next: Phase, game: GameKind) -> bool {
        match (self, next) {
            (Phase::Menu, Phase::Playing) | (Phase::Dead, Phase::Playing) => true,
            (Phase::Playing, Phase::Dying) | (Phase::Dying, Phase::Dead) => {
                game == GameKind::Flappy
            }
            (Phase::Playing, Phase::Dead) => game == GameKind::Snake,
            _ => false,
        }
    }
}

/// Which mini-game a context runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    Flappy,
    Snake,
}

impl GameKind {
    /// Stable id used for persistence keys
    pub fn id(&self) -> &'static str {
        match self {
            GameKind::Flappy => "flappy",
            GameKind::Snake => "snake",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "flappy" => Some(GameKind::Flappy),
            "snake" => Some(GameKind::Snake),
            _ => None,
        }
    }
}

/// Things that happened during a tick, consumed by audio and persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameEvent {
    Started,
    Flapped,
    /// Passed a pipe
    Scored { score: u32 },
    /// Ate food
    Ate { score: u32 },
    /// Fatal collision
    Hit,
    /// Bird reached the floor
    Landed,
    Died { score: u32, best: u32, improved: bool },
}

/// Work scheduled on the context's one-shot timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// Dying -> Dead once the bird has been on the floor long enough
    ConfirmDeath,
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error("{expected:?} step run against a {found:?} world")]
    WrongWorld { expected: GameKind, found: GameKind },

    #[error("non-finite entity state after step: {0}")]
    NonFinite(String),
}

/// Per-game entities, obstacles and balance
#[derive(Debug, Clone)]
pub enum World {
    Flappy(FlappyWorld),
    Snake(SnakeWorld),
}

impl World {
    pub fn kind(&self) -> GameKind {
        match self {
            World::Flappy(_) => GameKind::Flappy,
            World::Snake(_) => GameKind::Snake,
        }
    }

    pub fn design(&self) -> DesignSize {
        match self {
            World::Flappy(w) => w.tuning.design,
            World::Snake(w) => w.tuning.design(),
        }
    }
}

/// Complete state of one mounted game
#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub phase: Phase,
    /// Elapsed time not yet consumed by fixed grid steps
    pub clock_accumulator_ms: f64,
    /// Host monotonic time of the current frame
    pub now_ms: f64,
    /// Total simulated reference frames
    pub ticks: f64,
    pub viewport: Viewport,
    pub world: World,
    pub score: ScoreTracker,
    /// Pending Dying -> Dead confirmation, if armed
    pub death_timer: Option<TimerHandle>,
    pub timers: Timers<TimerTask>,
    pub dying_motion: DyingMotion,
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub(crate) events: Vec<GameEvent>,
}

impl SimulationContext {
    /// Side-scroller context in the Menu phase
    pub fn flappy(tuning: FlappyTuning, seed: u64, score: ScoreTracker) -> Self {
        let viewport = Viewport::unscaled(tuning.design);
        let world = World::Flappy(FlappyWorld::new(tuning, &viewport));
        Self::with_world(world, viewport, seed, Pcg32::seed_from_u64(seed), score)
    }

    /// Grid crawler context in the Menu phase
    pub fn snake(tuning: SnakeTuning, seed: u64, score: ScoreTracker) -> Self {
        let viewport = Viewport::unscaled(tuning.design());
        let mut rng = Pcg32::seed_from_u64(seed);
        let world = World::Snake(SnakeWorld::new(tuning, &viewport, &mut rng));
        Self::with_world(world, viewport, seed, rng, score)
    }

    fn with_world(
        world: World,
        viewport: Viewport,
        seed: u64,
        rng: Pcg32,
        score: ScoreTracker,
    ) -> Self {
        Self {
            phase: Phase::Menu,
            clock_accumulator_ms: 0.0,
            now_ms: 0.0,
            ticks: 0.0,
            viewport,
            world,
            score,
            death_timer: None,
            timers: Timers::new(),
            dying_motion: DyingMotion::default(),
            seed,
            rng,
            events: Vec::new(),
        }
    }

    pub fn kind(&self) -> GameKind {
        self.world.kind()
    }

    pub fn game_id(&self) -> &'static str {
        self.kind().id()
    }

    /// Refit to a new available area; returns false if the notice was rejected
    pub fn resize(&mut self, notice: &ViewportNotice) -> bool {
        let Some(viewport) = Viewport::fit(self.world.design(), notice) else {
            return false;
        };
        log::debug!(
            "{} viewport: scale {:.3}, {}x{} px buffer",
            self.game_id(),
            viewport.scale,
            viewport.buffer_width,
            viewport.buffer_height
        );
        self.viewport = viewport;
        let phase = self.phase;
        match &mut self.world {
            World::Flappy(w) => w.relayout(&viewport, phase),
            World::Snake(w) => w.relayout(&viewport),
        }
        true
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events produced since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Disarm the Dying -> Dead confirmation if one is pending
    pub fn cancel_death_timer(&mut self) {
        if let Some(handle) = self.death_timer.take() {
            if self.timers.cancel(handle) {
                log::debug!("Cancelled pending death timer");
            }
        }
    }

    /// Unmount: nothing may fire after this
    pub fn teardown(&mut self) {
        self.cancel_death_timer();
        self.timers.clear();
        self.events.clear();
        log::info!("{} context torn down", self.game_id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use GameKind::*;
        use Phase::*;
        assert!(Menu.can_transition_to(Playing, Flappy));
        assert!(Dead.can_transition_to(Playing, Snake));
        assert!(Playing.can_transition_to(Dying, Flappy));
        assert!(!Playing.can_transition_to(Dying, Snake));
        assert!(Playing.can_transition_to(Dead, Snake));
        assert!(!Playing.can_transition_to(Dead, Flappy));
        assert!(Dying.can_transition_to(Dead, Flappy));
        assert!(!Menu.can_transition_to(Dead, Flappy));
        assert!(!Dying.can_transition_to(Playing, Flappy));
    }

    #[test]
    fn test_new_contexts_start_in_menu() {
        let ctx = SimulationContext::flappy(FlappyTuning::default(), 1, ScoreTracker::new(4));
        assert_eq!(ctx.phase, Phase::Menu);
        assert_eq!(ctx.kind(), GameKind::Flappy);
        assert_eq!(ctx.score.best(), 4);

        let ctx = SimulationContext::snake(SnakeTuning::default(), 1, ScoreTracker::default());
        assert_eq!(ctx.phase, Phase::Menu);
        assert_eq!(ctx.game_id(), "snake");
    }

    #[test]
    fn test_resize_rescales_world() {
        let mut ctx = SimulationContext::flappy(
            FlappyTuning::default(),
            1,
            ScoreTracker::default(),
        );
        let notice = ViewportNotice {
            available_width: 720.0,
            available_height: 1400.0,
            pixel_ratio: 1.0,
            fullscreen_active: true,
        };
        assert!(ctx.resize(&notice));
        assert!((ctx.viewport.scale - 2.0).abs() < 1e-6);
        let World::Flappy(world) = &ctx.world else {
            panic!("expected flappy world");
        };
        assert!((world.metrics.pipe_speed - 5.2).abs() < 1e-5);
    }

    #[test]
    fn test_snake_resize_keeps_the_grid() {
        let mut ctx = SimulationContext::snake(SnakeTuning::default(), 5, ScoreTracker::default());
        let (body, food) = match &ctx.world {
            World::Snake(w) => (w.body.clone(), w.food),
            World::Flappy(_) => panic!("expected snake world"),
        };
        let notice = |side: f32| ViewportNotice {
            available_width: side,
            available_height: side,
            pixel_ratio: 2.0,
            fullscreen_active: true,
        };

        assert!(ctx.resize(&notice(720.0)));
        let World::Snake(w) = &ctx.world else {
            panic!("expected snake world");
        };
        let base_cell = w.cell_px;
        assert!((base_cell - 36.0).abs() < 1e-4);

        assert!(ctx.resize(&notice(1440.0)));
        let World::Snake(w) = &ctx.world else {
            panic!("expected snake world");
        };
        assert!((w.cell_px - 2.0 * base_cell).abs() < 1e-4);
        assert_eq!(ctx.viewport.buffer_width, 2880);
        // Layout changes never move the simulation
        assert_eq!(w.body, body);
        assert_eq!(w.food, food);
    }

    #[test]
    fn test_game_ids() {
        assert_eq!(GameKind::from_id("Snake"), Some(GameKind::Snake));
        assert_eq!(GameKind::from_id("stack"), None);
    }
}
