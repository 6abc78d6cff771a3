//! Shape generation for both games

use glam::Vec2;
use std::f32::consts::PI;

use super::{DrawCommand, Frame, Sprite};
use crate::sim::flappy::FlappyWorld;
use crate::sim::snake::SnakeWorld;
use crate::sim::{SimulationContext, World};

/// Cap overhang on each side of a pipe, as a fraction of pipe width
const CAP_OVERHANG: f32 = 0.08;
/// Cap height, as a fraction of pipe width
const CAP_HEIGHT: f32 = 0.36;
/// Ground stripe spacing in px at scale 1
const STRIPE_SPACING: f32 = 24.0;
/// Inset between snake cells, as a fraction of the cell
const CELL_INSET: f32 = 0.08;

/// Build the frame for the current context
pub fn build_frame(ctx: &SimulationContext) -> Frame {
    let vp = &ctx.viewport;
    let mut commands = vec![DrawCommand::rect(
        Sprite::Background,
        0.0,
        0.0,
        vp.width_px,
        vp.height_px,
    )];
    match &ctx.world {
        World::Flappy(w) => flappy_shapes(w, ctx.viewport.scale, &mut commands),
        World::Snake(w) => snake_shapes(w, &mut commands),
    }
    Frame {
        game: ctx.kind(),
        phase: ctx.phase,
        score: ctx.score.score(),
        best: ctx.score.best(),
        width: vp.width_px,
        height: vp.height_px,
        pixel_ratio: vp.pixel_ratio,
        commands,
    }
}

fn flappy_shapes(world: &FlappyWorld, scale: f32, out: &mut Vec<DrawCommand>) {
    let m = &world.metrics;

    for pipe in &world.pipes {
        let bottom_top = pipe.gap_top + m.pipe_gap;
        out.push(DrawCommand::rect(Sprite::Pipe, pipe.x, 0.0, pipe.width, pipe.gap_top));
        out.push(DrawCommand::rect(
            Sprite::Pipe,
            pipe.x,
            bottom_top,
            pipe.width,
            (m.floor_y - bottom_top).max(0.0),
        ));

        let overhang = pipe.width * CAP_OVERHANG;
        let cap_h = pipe.width * CAP_HEIGHT;
        let cap_w = pipe.width + overhang * 2.0;
        out.push(DrawCommand::rect(
            Sprite::PipeCap,
            pipe.x - overhang,
            pipe.gap_top - cap_h,
            cap_w,
            cap_h,
        ));
        out.push(DrawCommand::rect(
            Sprite::PipeCap,
            pipe.x - overhang,
            bottom_top,
            cap_w,
            cap_h,
        ));
    }

    // Ground band with stripes that follow the scroll
    out.push(DrawCommand::rect(
        Sprite::Ground,
        0.0,
        m.floor_y,
        m.width,
        m.height - m.floor_y,
    ));
    let spacing = STRIPE_SPACING * scale;
    if spacing > 0.0 {
        let phase = world.scroll_x % spacing;
        let mut x = -phase;
        while x < m.width {
            out.push(DrawCommand::Path {
                sprite: Sprite::GroundStripe,
                points: vec![
                    Vec2::new(x, m.floor_y + spacing * 0.5),
                    Vec2::new(x + spacing * 0.5, m.floor_y),
                ],
                closed: false,
            });
            x += spacing;
        }
    }

    bird_shapes(world, out);
}

fn bird_shapes(world: &FlappyWorld, out: &mut Vec<DrawCommand>) {
    let bird = &world.bird;
    let r = bird.half();
    let c = bird.pos;
    out.push(DrawCommand::circle(Sprite::Bird, c, r));

    // Wing flips up while rising
    let lift = if bird.vel < 0.0 { -0.35 } else { 0.25 };
    out.push(DrawCommand::Path {
        sprite: Sprite::BirdWing,
        points: vec![
            c + Vec2::new(-r * 0.7, 0.0),
            c + Vec2::new(-r * 0.1, r * lift),
            c + Vec2::new(-r * 0.1, r * 0.2),
        ],
        closed: true,
    });
    out.push(DrawCommand::Path {
        sprite: Sprite::BirdBeak,
        points: vec![
            c + Vec2::new(r * 0.8, -r * 0.15),
            c + Vec2::new(r * 1.35, r * 0.05),
            c + Vec2::new(r * 0.8, r * 0.25),
        ],
        closed: true,
    });
    out.push(DrawCommand::Arc {
        sprite: Sprite::BirdEye,
        center: c + Vec2::new(r * 0.35, -r * 0.3),
        radius: r * 0.18,
        start_angle: 0.0,
        end_angle: 2.0 * PI,
    });
}

fn snake_shapes(world: &SnakeWorld, out: &mut Vec<DrawCommand>) {
    let cell = world.cell_px;
    out.push(DrawCommand::rect(
        Sprite::Board,
        0.0,
        0.0,
        world.tuning.cols as f32 * cell,
        world.tuning.rows as f32 * cell,
    ));

    let cells = world.body.cells();
    // Spine through the cell centers, tail to head
    if cells.len() > 1 {
        out.push(DrawCommand::Path {
            sprite: Sprite::SnakeBody,
            points: cells
                .iter()
                .map(|c| {
                    let (x, y) = world.cell_origin(*c);
                    Vec2::new(x + cell / 2.0, y + cell / 2.0)
                })
                .collect(),
            closed: false,
        });
    }

    let inset = cell * CELL_INSET;
    let head = world.body.head();
    for c in cells {
        let (x, y) = world.cell_origin(*c);
        let sprite = if *c == head {
            Sprite::SnakeHead
        } else {
            Sprite::SnakeBody
        };
        out.push(DrawCommand::rect(
            sprite,
            x + inset,
            y + inset,
            cell - inset * 2.0,
            cell - inset * 2.0,
        ));
    }

    let (fx, fy) = world.cell_origin(world.food);
    out.push(DrawCommand::circle(
        Sprite::Food,
        Vec2::new(fx + cell / 2.0, fy + cell / 2.0),
        cell * 0.4,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::ScoreTracker;
    use crate::sim::flappy::Pipe;
    use crate::tuning::{FlappyTuning, SnakeTuning};

    fn count(frame: &Frame, sprite: Sprite) -> usize {
        frame.commands.iter().filter(|c| c.sprite() == sprite).count()
    }

    #[test]
    fn test_flappy_frame() {
        let mut ctx = SimulationContext::flappy(FlappyTuning::default(), 1, ScoreTracker::new(7));
        if let World::Flappy(w) = &mut ctx.world {
            w.pipes.push(Pipe {
                x: 200.0,
                gap_top: 120.0,
                width: 56.0,
                passed: false,
            });
        }
        let frame = build_frame(&ctx);
        assert_eq!(frame.best, 7);
        assert_eq!(frame.width, 360.0);
        assert_eq!(count(&frame, Sprite::Pipe), 2);
        assert_eq!(count(&frame, Sprite::PipeCap), 2);
        assert_eq!(count(&frame, Sprite::Bird), 1);
        assert_eq!(frame.commands[0].sprite(), Sprite::Background);
    }

    #[test]
    fn test_snake_frame() {
        let ctx = SimulationContext::snake(SnakeTuning::default(), 1, ScoreTracker::default());
        let frame = build_frame(&ctx);
        assert_eq!(count(&frame, Sprite::SnakeHead), 1);
        // Spine path plus two body cells
        assert_eq!(count(&frame, Sprite::SnakeBody), 3);
        assert_eq!(count(&frame, Sprite::Food), 1);
    }

    #[test]
    fn test_frame_serializes_for_js_hosts() {
        let ctx = SimulationContext::snake(SnakeTuning::default(), 1, ScoreTracker::default());
        let json = build_frame(&ctx).to_json().unwrap();
        assert!(json.contains(r#""kind":"rect""#));
        assert!(json.contains(r#""phase":"Menu""#));
    }
}
