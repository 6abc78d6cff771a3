//! Per-frame simulation tick
//!
//! Advances the context deterministically: same seed, same intents, same frame
//! timings gives the same state.

use super::flappy;
use super::phase::apply_intent;
use super::snake;
use super::state::{GameKind, Phase, SimError, SimulationContext};
use crate::input::IntentQueue;

/// Advance the context by one frame
///
/// `dt` is the clamped delta in reference ticks and drives the continuous
/// game. `elapsed_ms` is the raw wall time since the previous frame and feeds
/// the grid clock, so grid steps follow real time whatever the refresh rate.
/// Queued intents are applied first, in arrival order.
pub fn tick(
    ctx: &mut SimulationContext,
    intents: &mut IntentQueue,
    dt: f32,
    elapsed_ms: f64,
) -> Result<(), SimError> {
    ctx.ticks += f64::from(dt);

    for intent in intents.drain() {
        apply_intent(ctx, intent)?;
    }

    if matches!(ctx.phase, Phase::Playing | Phase::Dying)
        && elapsed_ms.is_finite()
        && elapsed_ms > 0.0
    {
        ctx.clock_accumulator_ms += elapsed_ms;
    }

    match ctx.kind() {
        GameKind::Flappy => flappy::step(ctx, dt),
        GameKind::Snake => snake::step(ctx, dt),
    }
}
