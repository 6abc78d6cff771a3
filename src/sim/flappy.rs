//! Continuous kinematics for the side-scroller
//!
//! Runs in CSS pixels. Sizes, gaps and scroll speed come from the tuning in
//! design units and are rescaled only on resize; gravity and the flap impulse
//! are per-tick physics constants.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, hits_any};
use super::phase;
use super::spawn::{PipeSpawner, spawn_pipe};
use super::state::{GameEvent, GameKind, Phase, SimError, SimulationContext, World};
use crate::score::ScoreTracker;
use crate::settings::DyingMotion;
use crate::tuning::FlappyTuning;
use crate::viewport::Viewport;

/// Ceiling clamp leaves the bird this far below the top edge
const CEILING_NUDGE_PX: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bird {
    /// Center of the bird's box
    pub pos: Vec2,
    /// Vertical velocity (px/tick, negative is up)
    pub vel: f32,
    pub size: f32,
}

impl Bird {
    #[inline]
    pub fn half(&self) -> f32 {
        self.size / 2.0
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.pos, self.size)
    }

    /// Set velocity to the impulse; deliberately not dt-scaled
    pub fn flap(&mut self, impulse: f32) {
        self.vel = impulse;
    }

    pub fn integrate(&mut self, gravity: f32, dt: f32) {
        self.vel += gravity * dt;
        self.pos.y += self.vel * dt;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    /// Left edge
    pub x: f32,
    /// Height of the top pipe (where the gap starts)
    pub gap_top: f32,
    pub width: f32,
    /// Already scored
    pub passed: bool,
}

impl Pipe {
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top_rect(&self) -> Rect {
        Rect::new(self.x, 0.0, self.right(), self.gap_top)
    }

    pub fn bottom_rect(&self, gap: f32, canvas_height: f32) -> Rect {
        Rect::new(self.x, self.gap_top + gap, self.right(), canvas_height)
    }
}

/// Pixel sizes derived from the tuning at the current scale
#[derive(Debug, Clone, PartialEq)]
pub struct FlappyMetrics {
    pub width: f32,
    pub height: f32,
    pub bird_x: f32,
    pub bird_size: f32,
    pub pipe_width: f32,
    pub pipe_gap: f32,
    pub pipe_speed: f32,
    pub gap_margin: f32,
    pub cap_reserve: f32,
    /// Y of the floor boundary
    pub floor_y: f32,
    pub despawn_x: f32,
}

impl FlappyMetrics {
    pub fn new(tuning: &FlappyTuning, viewport: &Viewport) -> Self {
        Self {
            width: viewport.width_px,
            height: viewport.height_px,
            bird_x: viewport.px(tuning.bird_x).max(viewport.px(tuning.min_bird_x)),
            bird_size: viewport.px(tuning.bird_size).max(tuning.min_bird_size),
            pipe_width: viewport.px(tuning.pipe_width).max(tuning.min_pipe_width),
            pipe_gap: viewport.px(tuning.pipe_gap).max(tuning.min_pipe_gap),
            pipe_speed: viewport.px(tuning.pipe_speed).max(tuning.min_pipe_speed),
            gap_margin: viewport.px(tuning.gap_margin),
            cap_reserve: viewport.px(tuning.cap_reserve),
            floor_y: viewport.height_px - viewport.px(tuning.floor_inset),
            despawn_x: -tuning.despawn_margin_px,
        }
    }
}

/// What a tick of motion ran into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlappyOutcome {
    /// Touched a pipe or the floor while playing
    pub hit: bool,
    /// Bird is resting on the floor
    pub landed: bool,
}

#[derive(Debug, Clone)]
pub struct FlappyWorld {
    pub tuning: FlappyTuning,
    pub metrics: FlappyMetrics,
    pub bird: Bird,
    pub pipes: Vec<Pipe>,
    pub spawner: PipeSpawner,
    /// Horizontal distance scrolled this run (ground stripes follow it)
    pub scroll_x: f32,
}

impl FlappyWorld {
    pub fn new(tuning: FlappyTuning, viewport: &Viewport) -> Self {
        let metrics = FlappyMetrics::new(&tuning, viewport);
        let bird = Bird {
            pos: Vec2::new(metrics.bird_x, (metrics.height / 2.0).round()),
            vel: 0.0,
            size: metrics.bird_size,
        };
        let spawner = PipeSpawner::new(tuning.spawn_interval);
        Self {
            tuning,
            metrics,
            bird,
            pipes: Vec::new(),
            spawner,
            scroll_x: 0.0,
        }
    }

    /// Recompute pixel sizes after a resize
    pub fn relayout(&mut self, viewport: &Viewport, phase: Phase) {
        self.metrics = FlappyMetrics::new(&self.tuning, viewport);
        self.bird.size = self.metrics.bird_size;
        self.bird.pos.x = self.metrics.bird_x;
        if phase == Phase::Menu {
            self.bird.pos.y = (self.metrics.height / 2.0).round();
        }
    }

    /// Fresh run layout
    pub fn reset(&mut self) {
        self.bird.pos = Vec2::new(self.metrics.bird_x, (self.metrics.height / 2.0).round());
        self.bird.vel = 0.0;
        self.pipes.clear();
        self.spawner.reset();
        self.scroll_x = 0.0;
    }

    pub fn flap(&mut self) {
        self.bird.flap(self.tuning.flap_impulse);
    }

    fn on_floor(&self) -> bool {
        self.bird.pos.y + self.bird.half() >= self.metrics.floor_y
    }

    fn clamp_to_floor(&mut self) {
        self.bird.pos.y = self.metrics.floor_y - self.bird.half();
        self.bird.vel = 0.0;
    }

    fn scroll(&mut self, dt: f32) {
        let dx = self.metrics.pipe_speed * dt;
        self.scroll_x += dx;
        for pipe in &mut self.pipes {
            pipe.x -= dx;
        }
    }

    fn hits_pipe(&self) -> bool {
        let bird = self.bird.bounds();
        self.pipes.iter().any(|p| {
            let rects = [
                p.top_rect(),
                p.bottom_rect(self.metrics.pipe_gap, self.metrics.height),
            ];
            hits_any(&bird, &rects)
        })
    }

    /// One Playing tick: spawn, fall, scroll, score, collide
    pub fn advance_playing<R: Rng>(
        &mut self,
        dt: f32,
        rng: &mut R,
        score: &mut ScoreTracker,
        events: &mut Vec<GameEvent>,
    ) -> FlappyOutcome {
        let mut outcome = FlappyOutcome::default();

        if self.spawner.advance(dt) {
            let pipe = spawn_pipe(&self.metrics, rng);
            log::debug!("Pipe spawned, gap top {}", pipe.gap_top);
            self.pipes.push(pipe);
        }

        self.bird.integrate(self.tuning.gravity, dt);
        self.scroll(dt);

        let bird_x = self.bird.pos.x;
        for pipe in &mut self.pipes {
            if !pipe.passed && pipe.right() < bird_x {
                pipe.passed = true;
                events.push(GameEvent::Scored {
                    score: score.increment(),
                });
            }
        }
        let despawn_x = self.metrics.despawn_x;
        self.pipes.retain(|p| p.right() >= despawn_x);

        let half = self.bird.half();
        if self.bird.pos.y - half <= 0.0 {
            self.bird.pos.y = half + CEILING_NUDGE_PX;
            self.bird.vel = 0.0;
        }

        if self.hits_pipe() {
            self.bird.vel = self.bird.vel.max(0.0);
            outcome.hit = true;
        }

        if self.on_floor() {
            self.clamp_to_floor();
            outcome.hit = true;
            outcome.landed = true;
        }

        outcome
    }

    /// One Dying tick: fall until the floor, world frozen unless configured
    pub fn advance_dying(&mut self, dt: f32, motion: DyingMotion) -> FlappyOutcome {
        if self.on_floor() {
            self.clamp_to_floor();
            return FlappyOutcome {
                hit: false,
                landed: true,
            };
        }

        if motion == DyingMotion::ScrollUntilFloor {
            self.scroll(dt);
        }

        self.bird.integrate(self.tuning.gravity, dt);
        let landed = self.on_floor();
        if landed {
            self.clamp_to_floor();
        }
        FlappyOutcome { hit: false, landed }
    }
}

/// Continuous movement step for the current phase
pub fn step(ctx: &mut SimulationContext, dt: f32) -> Result<(), SimError> {
    let found = ctx.kind();
    let World::Flappy(world) = &mut ctx.world else {
        return Err(SimError::WrongWorld {
            expected: GameKind::Flappy,
            found,
        });
    };

    let outcome = match ctx.phase {
        Phase::Playing => world.advance_playing(dt, &mut ctx.rng, &mut ctx.score, &mut ctx.events),
        Phase::Dying => world.advance_dying(dt, ctx.dying_motion),
        Phase::Menu | Phase::Dead => return Ok(()),
    };

    if !(world.bird.pos.is_finite() && world.bird.vel.is_finite()) {
        return Err(SimError::NonFinite(format!(
            "bird at {:?} moving {}",
            world.bird.pos, world.bird.vel
        )));
    }

    if outcome.hit && ctx.phase == Phase::Playing {
        phase::transition(ctx, Phase::Dying)?;
        ctx.emit(GameEvent::Hit);
    }
    if outcome.landed && ctx.death_timer.is_none() {
        ctx.emit(GameEvent::Landed);
        phase::begin_death_countdown(ctx);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Intent, IntentQueue};
    use crate::consts::TARGET_FRAME_MS;
    use crate::sim::tick::tick;

    fn playing_context() -> SimulationContext {
        let mut ctx = SimulationContext::flappy(
            FlappyTuning::default(),
            42,
            ScoreTracker::default(),
        );
        phase::begin_session(&mut ctx).unwrap();
        ctx
    }

    fn world(ctx: &SimulationContext) -> &FlappyWorld {
        match &ctx.world {
            World::Flappy(w) => w,
            World::Snake(_) => panic!("expected flappy world"),
        }
    }

    fn world_mut(ctx: &mut SimulationContext) -> &mut FlappyWorld {
        match &mut ctx.world {
            World::Flappy(w) => w,
            World::Snake(_) => panic!("expected flappy world"),
        }
    }

    #[test]
    fn test_small_screen_keeps_playable_sizes() {
        use crate::viewport::{DesignSize, ViewportNotice};
        let tuning = FlappyTuning::default();
        let notice = ViewportNotice {
            available_width: 320.0,
            available_height: 480.0,
            pixel_ratio: 1.0,
            fullscreen_active: true,
        };
        let vp = Viewport::fit(DesignSize::new(360.0, 700.0), &notice).unwrap();
        assert!(vp.scale < 0.7);
        let m = FlappyMetrics::new(&tuning, &vp);
        assert_eq!(m.pipe_gap, 110.0);
        assert_eq!(m.pipe_width, 40.0);
        assert_eq!(m.bird_size, 20.0);
        assert!((m.pipe_speed - 2.6 * vp.scale).abs() < 1e-5);
        assert!((m.bird_x - 68.0 * vp.scale).abs() < 1e-4);

        // Floors never shrink a full-size layout
        let full = FlappyMetrics::new(&tuning, &Viewport::unscaled(tuning.design));
        assert_eq!(full.pipe_gap, 150.0);
        assert_eq!(full.bird_size, 28.0);
    }

    #[test]
    fn test_flap_then_free_fall_velocities() {
        let tuning = FlappyTuning::default();
        let mut bird = Bird {
            pos: Vec2::new(68.0, 350.0),
            vel: 0.0,
            size: 28.0,
        };
        bird.flap(tuning.flap_impulse);
        let mut seen = vec![bird.vel];
        for _ in 0..3 {
            bird.integrate(tuning.gravity, 1.0);
            seen.push(bird.vel);
        }
        let expected = [-6.6, -6.32, -6.04, -5.76];
        for (v, e) in seen.iter().zip(expected) {
            assert!((v - e).abs() < 1e-4, "{:?}", seen);
        }
    }

    #[test]
    fn test_flap_ignores_dt_and_velocity() {
        let mut bird = Bird {
            pos: Vec2::ZERO,
            vel: 12.0,
            size: 28.0,
        };
        bird.flap(-6.6);
        assert_eq!(bird.vel, -6.6);
    }

    #[test]
    fn test_flaps_in_one_tick_collapse() {
        let mut ctx = playing_context();
        world_mut(&mut ctx).bird.vel = 3.0;
        let mut intents = IntentQueue::default();
        intents.push(Intent::Flap);
        intents.push(Intent::Flap);
        intents.push(Intent::Flap);
        tick(&mut ctx, &mut intents, 1.0, TARGET_FRAME_MS).unwrap();
        // One impulse plus one tick of gravity
        assert!((world(&ctx).bird.vel - (-6.6 + 0.28)).abs() < 1e-4);
    }

    #[test]
    fn test_ceiling_clamps_without_death() {
        let mut ctx = playing_context();
        {
            let w = world_mut(&mut ctx);
            w.bird.pos.y = 15.0;
            w.bird.vel = -6.6;
        }
        step(&mut ctx, 1.0).unwrap();
        let w = world(&ctx);
        assert_eq!(w.bird.vel, 0.0);
        assert!((w.bird.pos.y - (14.0 + 0.5)).abs() < 1e-4);
        assert_eq!(ctx.phase, Phase::Playing);
    }

    #[test]
    fn test_pipe_collision_enters_dying() {
        let mut ctx = playing_context();
        {
            let w = world_mut(&mut ctx);
            w.bird.pos.y = 100.0;
            w.bird.vel = -2.0;
            w.pipes.push(Pipe {
                x: 60.0,
                gap_top: 200.0,
                width: 56.0,
                passed: false,
            });
        }
        step(&mut ctx, 1.0).unwrap();
        assert_eq!(ctx.phase, Phase::Dying);
        assert!(world(&ctx).bird.vel >= 0.0);
        assert!(ctx.events().contains(&GameEvent::Hit));
        // Still in the air, no countdown yet
        assert!(ctx.death_timer.is_none());
    }

    #[test]
    fn test_dying_freezes_world_until_floor() {
        let mut ctx = playing_context();
        ctx.phase = Phase::Dying;
        {
            let w = world_mut(&mut ctx);
            w.pipes.push(Pipe {
                x: 200.0,
                gap_top: 200.0,
                width: 56.0,
                passed: false,
            });
            w.spawner.timer = 93.5;
            w.bird.vel = 0.0;
        }
        let y_before = world(&ctx).bird.pos.y;
        for _ in 0..5 {
            step(&mut ctx, 1.0).unwrap();
        }
        let w = world(&ctx);
        assert_eq!(w.pipes.len(), 1);
        assert_eq!(w.pipes[0].x, 200.0);
        assert_eq!(w.spawner.timer, 93.5);
        assert!(w.bird.pos.y > y_before);
    }

    #[test]
    fn test_scroll_until_floor_option() {
        let mut ctx = playing_context();
        ctx.phase = Phase::Dying;
        ctx.dying_motion = DyingMotion::ScrollUntilFloor;
        world_mut(&mut ctx).pipes.push(Pipe {
            x: 200.0,
            gap_top: 200.0,
            width: 56.0,
            passed: false,
        });
        step(&mut ctx, 1.0).unwrap();
        assert!((world(&ctx).pipes[0].x - (200.0 - 2.6)).abs() < 1e-4);
        // No scoring while dying
        assert_eq!(ctx.score.score(), 0);
    }

    #[test]
    fn test_landing_starts_countdown_once() {
        let mut ctx = playing_context();
        ctx.now_ms = 1000.0;
        {
            let w = world_mut(&mut ctx);
            w.bird.pos.y = w.metrics.floor_y - 15.0;
            w.bird.vel = 4.0;
        }
        step(&mut ctx, 1.0).unwrap();
        assert_eq!(ctx.phase, Phase::Dying);
        let handle = ctx.death_timer.expect("countdown armed");
        let w = world(&ctx);
        assert_eq!(w.bird.pos.y + w.bird.half(), w.metrics.floor_y);

        step(&mut ctx, 1.0).unwrap();
        assert_eq!(ctx.death_timer, Some(handle));
        assert_eq!(ctx.timers.len(), 1);
    }

    #[test]
    fn test_passing_a_pipe_scores_once() {
        let mut ctx = playing_context();
        {
            let w = world_mut(&mut ctx);
            w.bird.pos.y = 300.0;
            w.bird.vel = -3.0;
            // Gap spans the bird, right edge about to pass bird_x
            w.pipes.push(Pipe {
                x: 68.0 - 56.0 + 1.0,
                gap_top: 200.0,
                width: 56.0,
                passed: false,
            });
        }
        step(&mut ctx, 1.0).unwrap();
        step(&mut ctx, 1.0).unwrap();
        assert_eq!(ctx.score.score(), 1);
        assert!(world(&ctx).pipes[0].passed);
        assert_eq!(
            ctx.events()
                .iter()
                .filter(|e| matches!(e, GameEvent::Scored { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_far_offscreen_pipes_are_dropped() {
        let mut ctx = playing_context();
        {
            let w = world_mut(&mut ctx);
            w.bird.vel = -3.0;
            w.pipes.push(Pipe {
                x: -355.0,
                gap_top: 200.0,
                width: 56.0,
                passed: true,
            });
        }
        step(&mut ctx, 1.0).unwrap();
        assert!(world(&ctx).pipes.is_empty());
    }

    #[test]
    fn test_spawn_after_interval() {
        let mut ctx = playing_context();
        for _ in 0..94 {
            // Keep the bird airborne
            world_mut(&mut ctx).bird.pos.y = 300.0;
            world_mut(&mut ctx).bird.vel = 0.0;
            step(&mut ctx, 1.0).unwrap();
        }
        assert_eq!(world(&ctx).pipes.len(), 1);
    }

    #[test]
    fn test_non_finite_state_is_an_error() {
        let mut ctx = playing_context();
        world_mut(&mut ctx).bird.vel = f32::NAN;
        assert!(matches!(step(&mut ctx, 1.0), Err(SimError::NonFinite(_))));
    }
}
