//! Frame-driven game loop
//!
//! Owns one simulation context and runs exactly one tick per host frame
//! callback. Everything the tick produces (events, frames) is flushed to the
//! collaborators after the tick returns.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::audio::{ToneSink, play_feedback};
use crate::consts::TARGET_FRAME_MS;
use crate::input::{Intent, IntentMapper, IntentQueue, RawInput};
use crate::persistence::{BestStore, record_best};
use crate::platform::{FrameHost, FrameRequest};
use crate::renderer::{Frame, Renderer, build_frame};
use crate::score::ScoreTracker;
use crate::settings::Settings;
use crate::sim::state::TimerTask;
use crate::sim::{GameEvent, GameKind, SimulationContext, autopilot, phase, tick};
use crate::tuning::Tuning;
use crate::viewport::ViewportNotice;
use crate::clamp_dt;

pub struct FrameScheduler<H: FrameHost> {
    ctx: SimulationContext,
    intents: IntentQueue,
    mapper: IntentMapper,
    host: H,
    store: Box<dyn BestStore>,
    tones: Box<dyn ToneSink>,
    renderer: Option<Box<dyn Renderer>>,
    settings: Settings,
    running: bool,
    exited: bool,
    pending_frame: Option<FrameRequest>,
    last_timestamp: Option<f64>,
    autopilot: bool,
}

impl<H: FrameHost> FrameScheduler<H> {
    /// Mount a game: read its best once and build the Menu-phase context
    pub fn new(
        game: GameKind,
        tuning: &Tuning,
        settings: Settings,
        seed: u64,
        host: H,
        store: Box<dyn BestStore>,
        tones: Box<dyn ToneSink>,
    ) -> Self {
        let score = ScoreTracker::load(store.as_ref(), game.id());
        let mut ctx = match game {
            GameKind::Flappy => SimulationContext::flappy(tuning.flappy.clone(), seed, score),
            GameKind::Snake => SimulationContext::snake(tuning.snake.clone(), seed, score),
        };
        ctx.dying_motion = settings.dying_motion;
        log::info!(
            "Mounted {} (seed {}, dying motion {})",
            game.id(),
            seed,
            settings.dying_motion.id()
        );

        Self {
            ctx,
            intents: IntentQueue::default(),
            mapper: IntentMapper::new(game),
            host,
            store,
            tones,
            renderer: None,
            settings,
            running: false,
            exited: false,
            pending_frame: None,
            last_timestamp: None,
            autopilot: false,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SimulationContext {
        &mut self.ctx
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        if settings.dying_motion != self.ctx.dying_motion {
            log::info!("Dying motion: {}", settings.dying_motion.id());
        }
        self.ctx.dying_motion = settings.dying_motion;
        self.settings = settings;
    }

    pub fn autopilot(&self) -> bool {
        self.autopilot
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        if self.autopilot != enabled {
            log::info!("Idle mode: {}", enabled);
        }
        self.autopilot = enabled;
    }

    /// Begin requesting frames; no-op if already running or exited
    pub fn start(&mut self) {
        if self.running || self.exited {
            return;
        }
        self.running = true;
        // Time spent stopped must not count as elapsed
        self.last_timestamp = None;
        self.pending_frame = Some(self.host.request_frame());
        log::debug!("{} scheduler started", self.ctx.game_id());
    }

    /// Stop requesting frames and disarm the death timer; idempotent
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        if let Some(request) = self.pending_frame.take() {
            self.host.cancel_frame(request);
        }
        self.ctx.cancel_death_timer();
        log::debug!("{} scheduler stopped", self.ctx.game_id());
    }

    /// Unmount: stop and drop everything pending
    pub fn exit(&mut self) {
        if self.exited {
            return;
        }
        self.stop();
        self.intents.clear();
        self.ctx.teardown();
        self.exited = true;
    }

    /// Map a host input event and queue the resulting intent
    pub fn push_input(&mut self, raw: &RawInput) {
        if self.exited {
            return;
        }
        if let Some(intent) = self.mapper.map(raw, self.ctx.phase, &self.ctx.viewport) {
            self.intents.push(intent);
        }
    }

    pub fn push_intent(&mut self, intent: Intent) {
        if !self.exited {
            self.intents.push(intent);
        }
    }

    /// Forward a viewport notice; false if it was rejected
    pub fn resize(&mut self, notice: &ViewportNotice) -> bool {
        self.ctx.resize(notice)
    }

    /// Frame for the current state, for hosts that pull
    pub fn frame(&self) -> Frame {
        build_frame(&self.ctx)
    }

    /// Host frame callback with a monotonic timestamp
    pub fn on_frame(&mut self, now_ms: f64) {
        if !self.running {
            return;
        }
        self.pending_frame = None;

        let elapsed = self.last_timestamp.map_or(0.0, |last| now_ms - last);
        self.last_timestamp = Some(now_ms);
        let dt = clamp_dt(elapsed, TARGET_FRAME_MS);
        self.ctx.now_ms = now_ms;

        self.fire_timers(now_ms);

        if self.autopilot {
            if let Some(intent) = autopilot::suggest(&self.ctx) {
                self.intents.push(intent);
            }
        }

        self.run_tick(dt, elapsed);
        self.flush_events();

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.present(&build_frame(&self.ctx));
        }

        self.pending_frame = Some(self.host.request_frame());
    }

    fn fire_timers(&mut self, now_ms: f64) {
        for (handle, task) in self.ctx.timers.expire(now_ms) {
            let result = match task {
                TimerTask::ConfirmDeath => phase::confirm_death(&mut self.ctx, handle),
            };
            if let Err(e) = result {
                log::error!("Timer {:?} failed: {}", task, e);
                phase::force_dead(&mut self.ctx);
            }
        }
    }

    /// One isolated tick; failures end the run instead of the loop
    fn run_tick(&mut self, dt: f32, elapsed_ms: f64) {
        let ctx = &mut self.ctx;
        let intents = &mut self.intents;
        match catch_unwind(AssertUnwindSafe(|| tick(ctx, intents, dt, elapsed_ms))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::error!("{} tick failed: {}", self.ctx.game_id(), e);
                phase::force_dead(&mut self.ctx);
            }
            Err(_) => {
                log::error!("{} tick panicked", self.ctx.game_id());
                self.intents.clear();
                phase::force_dead(&mut self.ctx);
            }
        }
    }

    fn flush_events(&mut self) {
        let gain = self.settings.tone_gain();
        let game_id = self.ctx.game_id();
        for event in self.ctx.drain_events() {
            play_feedback(self.tones.as_mut(), &event, gain);
            if let GameEvent::Died {
                score,
                improved: true,
                ..
            } = event
            {
                record_best(self.store.as_mut(), game_id, score);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioError, Tone};
    use crate::persistence::{MemoryStore, StoreError};
    use crate::platform::ManualHost;
    use crate::sim::{Cell, Phase, World};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl BestStore for SharedStore {
        fn get(&self, game_id: &str) -> Result<u32, StoreError> {
            self.0.borrow().get(game_id)
        }

        fn set(&mut self, game_id: &str, value: u32) -> Result<(), StoreError> {
            self.0.borrow_mut().set(game_id, value)
        }
    }

    #[derive(Clone, Default)]
    struct SharedTones(Rc<RefCell<Vec<Tone>>>);

    impl ToneSink for SharedTones {
        fn play(&mut self, tone: &Tone, _gain: f32) -> Result<(), AudioError> {
            self.0.borrow_mut().push(*tone);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct SharedFrames(Rc<RefCell<Vec<Frame>>>);

    impl Renderer for SharedFrames {
        fn present(&mut self, frame: &Frame) {
            self.0.borrow_mut().push(frame.clone());
        }
    }

    struct Harness {
        sched: FrameScheduler<ManualHost>,
        store: SharedStore,
        tones: SharedTones,
        now: f64,
    }

    impl Harness {
        fn new(game: GameKind) -> Self {
            let store = SharedStore::default();
            let tones = SharedTones::default();
            let sched = FrameScheduler::new(
                game,
                &Tuning::default(),
                Settings::default(),
                7,
                ManualHost::new(),
                Box::new(store.clone()),
                Box::new(tones.clone()),
            );
            Self {
                sched,
                store,
                tones,
                now: 1000.0,
            }
        }

        /// Pump one 60 Hz frame, as the browser would
        fn frame(&mut self) {
            self.frame_after(TARGET_FRAME_MS);
        }

        fn frame_after(&mut self, interval_ms: f64) {
            self.now += interval_ms;
            if self.sched.host_mut().take_pending().is_some() {
                self.sched.on_frame(self.now);
            }
        }

        fn run_until(&mut self, max_frames: usize, done: impl Fn(&SimulationContext) -> bool) {
            for _ in 0..max_frames {
                if done(self.sched.context()) {
                    return;
                }
                self.frame();
            }
        }
    }

    #[test]
    fn test_start_stop_idempotent() {
        let mut h = Harness::new(GameKind::Flappy);
        h.sched.start();
        h.sched.start();
        assert_eq!(h.sched.host().requested, 1);
        h.sched.stop();
        h.sched.stop();
        assert_eq!(h.sched.host().cancelled, 1);
        assert!(h.sched.host().pending.is_none());
    }

    #[test]
    fn test_first_frame_uses_min_dt() {
        let mut h = Harness::new(GameKind::Flappy);
        h.sched.start();
        h.frame();
        assert!((h.sched.context().ticks - 0.5).abs() < 1e-9);
        h.frame();
        assert!((h.sched.context().ticks - 1.5).abs() < 1e-4);
        assert_eq!(h.sched.host().requested, 3);
    }

    #[test]
    fn test_pointer_starts_and_flaps() {
        let mut h = Harness::new(GameKind::Flappy);
        h.sched.start();
        h.sched.push_input(&RawInput::PointerDown {
            x: 100.0,
            y: 100.0,
            time_ms: 0.0,
        });
        h.frame();
        assert_eq!(h.sched.context().phase, Phase::Playing);
        assert!(h.tones.0.borrow().contains(&Tone::FLAP));
    }

    #[test]
    fn test_run_ends_and_records_best() {
        let mut h = Harness::new(GameKind::Flappy);
        h.sched.start();
        h.sched.push_intent(Intent::Start);
        h.frame();
        h.sched.context_mut().score.increment();
        h.sched.context_mut().score.increment();

        h.run_until(600, |ctx| ctx.phase == Phase::Dead);
        assert_eq!(h.sched.context().phase, Phase::Dead);
        assert_eq!(h.sched.context().score.best(), 2);
        assert_eq!(h.store.get("flappy").unwrap(), 2);
        assert!(h.tones.0.borrow().contains(&Tone::THUD));
    }

    #[test]
    fn test_no_write_without_improvement() {
        let mut h = Harness::new(GameKind::Flappy);
        h.store.0.borrow_mut().insert_raw("flappy", "5");
        // Re-mount to pick up the stored best
        h.sched = FrameScheduler::new(
            GameKind::Flappy,
            &Tuning::default(),
            Settings::default(),
            7,
            ManualHost::new(),
            Box::new(h.store.clone()),
            Box::new(h.tones.clone()),
        );
        assert_eq!(h.sched.context().score.best(), 5);
        h.sched.start();
        h.sched.push_intent(Intent::Start);
        h.run_until(600, |ctx| ctx.phase == Phase::Dead);
        assert_eq!(h.store.get("flappy").unwrap(), 5);
    }

    #[test]
    fn test_stop_cancels_death_timer() {
        let mut h = Harness::new(GameKind::Flappy);
        h.sched.start();
        h.sched.push_intent(Intent::Start);
        h.run_until(600, |ctx| ctx.death_timer.is_some());
        assert_eq!(h.sched.context().phase, Phase::Dying);

        h.sched.stop();
        assert!(h.sched.context().death_timer.is_none());
        assert!(h.sched.context().timers.is_empty());

        // Resuming re-arms the countdown and the run still ends
        h.sched.start();
        h.run_until(120, |ctx| ctx.phase == Phase::Dead);
        assert_eq!(h.sched.context().phase, Phase::Dead);
    }

    #[test]
    fn test_failed_tick_forces_dead() {
        let mut h = Harness::new(GameKind::Flappy);
        h.sched.start();
        h.sched.push_intent(Intent::Start);
        h.frame();
        if let World::Flappy(w) = &mut h.sched.context_mut().world {
            w.bird.vel = f32::NAN;
        }
        h.frame();
        assert_eq!(h.sched.context().phase, Phase::Dead);
        // The loop keeps going
        assert!(h.sched.host().pending.is_some());
    }

    #[test]
    fn test_exit_stops_everything() {
        let mut h = Harness::new(GameKind::Snake);
        h.sched.start();
        h.frame();
        h.sched.exit();
        let ticks = h.sched.context().ticks;
        h.sched.on_frame(h.now + 100.0);
        h.sched.start();
        h.sched.push_intent(Intent::Start);
        assert_eq!(h.sched.context().ticks, ticks);
        assert!(!h.sched.is_running());
        assert_eq!(h.sched.context().phase, Phase::Menu);
    }

    /// Grid steps taken in one second of frames spaced `interval_ms` apart
    fn snake_steps_in_one_second(interval_ms: f64) -> i32 {
        let mut h = Harness::new(GameKind::Snake);
        h.sched.start();
        h.sched.push_intent(Intent::Start);
        h.frame_after(interval_ms);
        if let World::Snake(w) = &mut h.sched.context_mut().world {
            w.food = Cell::new(0, 0);
        }
        let start = head_of(h.sched.context());
        let frames = (1000.0 / interval_ms).round() as usize;
        for _ in 0..frames {
            h.frame_after(interval_ms);
        }
        assert_eq!(h.sched.context().phase, Phase::Playing);
        head_of(h.sched.context()).x - start.x
    }

    fn head_of(ctx: &SimulationContext) -> Cell {
        match &ctx.world {
            World::Snake(w) => w.body.head(),
            World::Flappy(_) => panic!("expected snake world"),
        }
    }

    #[test]
    fn test_grid_pace_ignores_refresh_rate() {
        // 150 ms steps: one second is six steps at any frame rate
        assert_eq!(snake_steps_in_one_second(1000.0 / 60.0), 6);
        assert_eq!(snake_steps_in_one_second(1000.0 / 240.0), 6);
        assert_eq!(snake_steps_in_one_second(500.0), 6);
    }

    #[test]
    fn test_slow_frames_take_several_grid_steps() {
        let mut h = Harness::new(GameKind::Snake);
        h.sched.start();
        h.sched.push_intent(Intent::Start);
        h.frame_after(500.0);
        if let World::Snake(w) = &mut h.sched.context_mut().world {
            w.food = Cell::new(0, 0);
        }
        let start = head_of(h.sched.context());
        h.frame_after(500.0);
        assert_eq!(head_of(h.sched.context()).x - start.x, 3);
    }

    #[test]
    fn test_one_frame_presented_per_callback() {
        let mut h = Harness::new(GameKind::Flappy);
        let frames = SharedFrames::default();
        h.sched = FrameScheduler::new(
            GameKind::Flappy,
            &Tuning::default(),
            Settings::default(),
            7,
            ManualHost::new(),
            Box::new(h.store.clone()),
            Box::new(h.tones.clone()),
        )
        .with_renderer(Box::new(frames.clone()));
        h.sched.start();
        h.frame();
        h.sched.push_intent(Intent::Start);
        h.frame();

        let seen = frames.0.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].phase, Phase::Menu);
        assert_eq!(seen[1].phase, Phase::Playing);
        assert_eq!(seen[1], h.sched.frame());
    }

    #[test]
    fn test_snake_autopilot_plays() {
        let mut h = Harness::new(GameKind::Snake);
        h.sched.set_autopilot(true);
        h.sched.start();
        for _ in 0..600 {
            h.frame();
        }
        let ctx = h.sched.context();
        assert_ne!(ctx.phase, Phase::Menu);
        // The greedy pilot reaches at least one food in ten seconds
        assert!(ctx.score.score() > 0 || ctx.score.best() > 0);
    }
}
