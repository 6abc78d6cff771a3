//! Workout Arcade entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use workout_arcade::audio::WebAudioTones;
    use workout_arcade::input::RawInput;
    use workout_arcade::persistence::LocalStorageStore;
    use workout_arcade::platform::{FrameHost, FrameRequest};
    use workout_arcade::renderer::{DrawCommand, Frame, Renderer, Sprite};
    use workout_arcade::sim::{GameKind, Phase};
    use workout_arcade::viewport::ViewportNotice;
    use workout_arcade::{DyingMotion, FrameScheduler, Settings, Tuning};

    type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;
    type Game = Rc<RefCell<FrameScheduler<BrowserHost>>>;

    /// requestAnimationFrame-backed host
    struct BrowserHost {
        window: web_sys::Window,
        callback: FrameCallback,
    }

    impl FrameHost for BrowserHost {
        fn request_frame(&mut self) -> FrameRequest {
            let callback = self.callback.borrow();
            let Some(cb) = callback.as_ref() else {
                log::warn!("Frame requested before the loop was wired");
                return FrameRequest(0);
            };
            match self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                Ok(id) => FrameRequest(id as u32),
                Err(e) => {
                    log::error!("requestAnimationFrame failed: {:?}", e);
                    FrameRequest(0)
                }
            }
        }

        fn cancel_frame(&mut self, request: FrameRequest) {
            let _ = self.window.cancel_animation_frame(request.0 as i32);
        }
    }

    /// Canvas 2D painter for draw commands
    struct CanvasRenderer {
        ctx: CanvasRenderingContext2d,
    }

    impl CanvasRenderer {
        fn fill_for(sprite: Sprite) -> &'static str {
            match sprite {
                Sprite::Background => "#70c5ce",
                Sprite::Pipe => "#5cb85c",
                Sprite::PipeCap => "#4cae4c",
                Sprite::Ground => "#ded895",
                Sprite::GroundStripe => "#c8bf6a",
                Sprite::Bird => "#f7d038",
                Sprite::BirdWing => "#f0a830",
                Sprite::BirdBeak => "#f26b38",
                Sprite::BirdEye => "#222222",
                Sprite::Board => "#1d2330",
                Sprite::SnakeBody => "#3fbf6f",
                Sprite::SnakeHead => "#7be495",
                Sprite::Food => "#ef4f4f",
            }
        }

        fn draw(&self, command: &DrawCommand) {
            let color = Self::fill_for(command.sprite());
            match command {
                DrawCommand::Rect {
                    x,
                    y,
                    width,
                    height,
                    ..
                } => {
                    self.ctx.set_fill_style_str(color);
                    self.ctx.fill_rect(*x as f64, *y as f64, *width as f64, *height as f64);
                }
                DrawCommand::Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                    ..
                } => {
                    self.ctx.set_fill_style_str(color);
                    self.ctx.begin_path();
                    let _ = self.ctx.arc(
                        center.x as f64,
                        center.y as f64,
                        *radius as f64,
                        *start_angle as f64,
                        *end_angle as f64,
                    );
                    self.ctx.fill();
                }
                DrawCommand::Path { points, closed, .. } => {
                    let Some((first, rest)) = points.split_first() else {
                        return;
                    };
                    self.ctx.begin_path();
                    self.ctx.move_to(first.x as f64, first.y as f64);
                    for p in rest {
                        self.ctx.line_to(p.x as f64, p.y as f64);
                    }
                    if *closed {
                        self.ctx.close_path();
                        self.ctx.set_fill_style_str(color);
                        self.ctx.fill();
                    } else {
                        self.ctx.set_stroke_style_str(color);
                        self.ctx.set_line_width(2.0);
                        self.ctx.stroke();
                    }
                }
            }
        }

        fn draw_hud(&self, frame: &Frame) {
            self.ctx.set_fill_style_str("#ffffff");
            self.ctx.set_font("bold 28px sans-serif");
            let _ = self.ctx.fill_text(&frame.score.to_string(), 16.0, 40.0);
            let prompt = match frame.phase {
                Phase::Menu => Some("Tap to start"),
                Phase::Dead => Some("Tap to retry"),
                Phase::Playing | Phase::Dying => None,
            };
            if let Some(text) = prompt {
                self.ctx.set_font("20px sans-serif");
                let _ = self.ctx.fill_text(
                    &format!("{} - best {}", text, frame.best),
                    16.0,
                    frame.height as f64 / 2.0,
                );
            }
        }
    }

    impl Renderer for CanvasRenderer {
        fn present(&mut self, frame: &Frame) {
            let pr = frame.pixel_ratio as f64;
            let _ = self.ctx.set_transform(pr, 0.0, 0.0, pr, 0.0, 0.0);
            self.ctx.clear_rect(0.0, 0.0, frame.width as f64, frame.height as f64);
            for command in &frame.commands {
                self.draw(command);
            }
            self.draw_hud(frame);
        }
    }

    fn viewport_notice(window: &web_sys::Window) -> Option<ViewportNotice> {
        let width = window.inner_width().ok()?.as_f64()?;
        let height = window.inner_height().ok()?.as_f64()?;
        let fullscreen_active = window
            .document()
            .and_then(|d| d.fullscreen_element())
            .is_some();
        Some(ViewportNotice {
            available_width: width as f32,
            available_height: height as f32,
            pixel_ratio: window.device_pixel_ratio() as f32,
            fullscreen_active,
        })
    }

    /// Refit the simulation and size the canvas to match
    fn apply_resize(window: &web_sys::Window, canvas: &HtmlCanvasElement, game: &Game) {
        let Some(notice) = viewport_notice(window) else {
            return;
        };
        let Ok(mut g) = game.try_borrow_mut() else {
            return;
        };
        if !g.resize(&notice) {
            return;
        }
        let vp = g.context().viewport;
        canvas.set_width(vp.buffer_width);
        canvas.set_height(vp.buffer_height);
        let style = canvas.style();
        let _ = style.set_property("width", &format!("{}px", vp.width_px));
        let _ = style.set_property("height", &format!("{}px", vp.height_px));
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {}", e).into());
        }

        log::info!("Workout Arcade starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("No document");
            return;
        };
        let Some(canvas) = document
            .get_element_by_id("arcade")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #arcade canvas");
            return;
        };

        let game_kind = canvas
            .get_attribute("data-game")
            .and_then(|id| GameKind::from_id(&id))
            .unwrap_or(GameKind::Flappy);
        let tuning = match canvas.get_attribute("data-tuning") {
            Some(json) => Tuning::from_json(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring tuning override: {}", e);
                Tuning::default()
            }),
            None => Tuning::default(),
        };

        let mut settings = Settings::load();
        if let Some(id) = canvas.get_attribute("data-dying-motion") {
            match DyingMotion::from_id(&id) {
                Some(motion) => settings.dying_motion = motion,
                None => log::warn!("Unknown dying motion {:?}", id),
            }
        }

        let ctx2d = match canvas.get_context("2d") {
            Ok(Some(obj)) => obj.dyn_into::<CanvasRenderingContext2d>().ok(),
            _ => None,
        };

        let callback: FrameCallback = Rc::new(RefCell::new(None));
        let host = BrowserHost {
            window: window.clone(),
            callback: callback.clone(),
        };
        let seed = js_sys::Date::now() as u64;
        let mut scheduler = FrameScheduler::new(
            game_kind,
            &tuning,
            settings,
            seed,
            host,
            Box::new(LocalStorageStore::new()),
            Box::new(WebAudioTones::new()),
        );
        match ctx2d {
            Some(ctx) => scheduler = scheduler.with_renderer(Box::new(CanvasRenderer { ctx })),
            None => log::warn!("Canvas 2D unavailable - running without drawing"),
        }
        let game: Game = Rc::new(RefCell::new(scheduler));

        log::info!("{} initialized with seed: {}", game_kind.id(), seed);

        {
            let game = game.clone();
            *callback.borrow_mut() = Some(Closure::new(move |time: f64| {
                if let Ok(mut g) = game.try_borrow_mut() {
                    g.on_frame(time);
                }
            }));
        }

        apply_resize(&window, &canvas, &game);
        setup_input_handlers(&window, &canvas, game.clone());
        setup_lifecycle(&window, &canvas, game.clone());

        game.borrow_mut().start();
        log::info!("Workout Arcade running!");
    }

    fn push(game: &Game, raw: RawInput) {
        if let Ok(mut g) = game.try_borrow_mut() {
            g.push_input(&raw);
        }
    }

    fn setup_input_handlers(window: &web_sys::Window, canvas: &HtmlCanvasElement, game: Game) {
        // Pointer (mouse, touch, pen)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                push(
                    &game,
                    RawInput::PointerDown {
                        x: event.offset_x() as f32,
                        y: event.offset_y() as f32,
                        time_ms: event.time_stamp(),
                    },
                );
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                push(
                    &game,
                    RawInput::PointerUp {
                        x: event.offset_x() as f32,
                        y: event.offset_y() as f32,
                        time_ms: event.time_stamp(),
                    },
                );
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let code = event.code();
                if code == "KeyI" {
                    if let Ok(mut g) = game.try_borrow_mut() {
                        let enabled = !g.autopilot();
                        g.set_autopilot(enabled);
                    }
                    return;
                }
                if matches!(
                    code.as_str(),
                    "Space" | "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight"
                ) {
                    event.prevent_default();
                }
                push(&game, RawInput::Key(code));
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_lifecycle(window: &web_sys::Window, canvas: &HtmlCanvasElement, game: Game) {
        // Resize and fullscreen changes refit the canvas
        {
            let game = game.clone();
            let win = window.clone();
            let canvas = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                apply_resize(&win, &canvas, &game);
            });
            let _ = window
                .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            if let Some(document) = window.document() {
                let _ = document.add_event_listener_with_callback(
                    "fullscreenchange",
                    closure.as_ref().unchecked_ref(),
                );
            }
            closure.forget();
        }

        // Unmount on navigation away
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if let Ok(mut g) = game.try_borrow_mut() {
                    g.settings().save();
                    g.exit();
                }
            });
            let _ = window
                .add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Workout Arcade (native) starting...");
    log::info!("Native mode runs a headless demo - serve the wasm build for the playable version");

    for game in [
        workout_arcade::sim::GameKind::Flappy,
        workout_arcade::sim::GameKind::Snake,
    ] {
        run_demo(game, 3600);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Let the autopilot play `frames` 60 Hz frames and report the result
#[cfg(not(target_arch = "wasm32"))]
fn run_demo(game: workout_arcade::sim::GameKind, frames: u32) {
    use workout_arcade::audio::NullTones;
    use workout_arcade::consts::TARGET_FRAME_MS;
    use workout_arcade::persistence::MemoryStore;
    use workout_arcade::platform::ManualHost;
    use workout_arcade::sim::Phase;
    use workout_arcade::{FrameScheduler, Settings, Tuning};

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut sched = FrameScheduler::new(
        game,
        &Tuning::default(),
        Settings::default(),
        seed,
        ManualHost::new(),
        Box::new(MemoryStore::new()),
        Box::new(NullTones),
    );
    sched.set_autopilot(true);
    sched.start();

    let mut now = 0.0;
    let mut runs = 0;
    let mut last_phase = sched.context().phase;
    for _ in 0..frames {
        now += TARGET_FRAME_MS;
        if sched.host_mut().take_pending().is_none() {
            break;
        }
        sched.on_frame(now);
        let phase = sched.context().phase;
        if phase == Phase::Playing && last_phase != Phase::Playing {
            runs += 1;
        }
        last_phase = phase;
    }
    sched.exit();

    let best = sched.context().score.best();
    println!(
        "{}: {} runs in {:.0}s of play, best {}",
        game.id(),
        runs,
        now / 1000.0,
        best
    );
}
