//! Lifecycle state machine
//!
//! Menu -> Playing -> (Dying ->) Dead -> Playing. Every phase change goes
//! through [`transition`], which rejects edges the game does not have.

use thiserror::Error;

use super::state::{GameEvent, GameKind, Phase, SimError, SimulationContext, TimerTask, World};
use crate::input::Intent;
use crate::platform::TimerHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PhaseError {
    #[error("{game:?} cannot go from {from:?} to {to:?}")]
    InvalidTransition {
        from: Phase,
        to: Phase,
        game: GameKind,
    },
}

/// Move to `to` if the state machine allows it
pub fn transition(ctx: &mut SimulationContext, to: Phase) -> Result<(), PhaseError> {
    let from = ctx.phase;
    let game = ctx.kind();
    if !from.can_transition_to(to, game) {
        return Err(PhaseError::InvalidTransition { from, to, game });
    }
    log::debug!("{}: {:?} -> {:?}", game.id(), from, to);
    ctx.phase = to;
    Ok(())
}

/// Apply one player intent against the current phase
///
/// Intents the phase has no use for are dropped.
pub fn apply_intent(ctx: &mut SimulationContext, intent: Intent) -> Result<(), SimError> {
    match (intent, ctx.phase) {
        (Intent::Start | Intent::Restart, Phase::Menu | Phase::Dead) => begin_session(ctx),
        (Intent::Flap, Phase::Playing) => {
            if let World::Flappy(world) = &mut ctx.world {
                world.flap();
                ctx.emit(GameEvent::Flapped);
            }
            Ok(())
        }
        (Intent::SetDirection(dir), Phase::Playing) => {
            if let World::Snake(world) = &mut ctx.world {
                world.body.queue_direction(dir);
            }
            Ok(())
        }
        (intent, phase) => {
            log::debug!("Ignoring {:?} during {:?}", intent, phase);
            Ok(())
        }
    }
}

/// Fresh run: reset score, clock and world, then enter Playing
pub fn begin_session(ctx: &mut SimulationContext) -> Result<(), SimError> {
    ctx.cancel_death_timer();
    transition(ctx, Phase::Playing)?;
    ctx.score.reset();
    ctx.clock_accumulator_ms = 0.0;
    ctx.emit(GameEvent::Started);
    match &mut ctx.world {
        World::Flappy(world) => {
            world.reset();
            // The start tap is also the first flap
            world.flap();
            ctx.events.push(GameEvent::Flapped);
        }
        World::Snake(world) => world.reset(&mut ctx.rng),
    }
    log::info!("{} run started (best {})", ctx.game_id(), ctx.score.best());
    Ok(())
}

/// Arm the Dying -> Dead confirmation; no-op if already armed
pub fn begin_death_countdown(ctx: &mut SimulationContext) {
    if ctx.death_timer.is_some() {
        return;
    }
    let delay = match &ctx.world {
        World::Flappy(w) => w.tuning.death_delay_ms,
        World::Snake(_) => 0.0,
    };
    let handle = ctx.timers.schedule(ctx.now_ms, delay, TimerTask::ConfirmDeath);
    ctx.death_timer = Some(handle);
    log::debug!("Death countdown armed for {} ms", delay);
}

/// Death timer fired; stale handles and wrong phases are ignored
pub fn confirm_death(ctx: &mut SimulationContext, handle: TimerHandle) -> Result<(), SimError> {
    if ctx.death_timer != Some(handle) || ctx.phase != Phase::Dying {
        log::debug!("Ignoring stale death timer {:?}", handle);
        return Ok(());
    }
    ctx.death_timer = None;
    enter_dead(ctx)
}

/// Enter Dead from the game's terminal phase and close out the run
pub fn enter_dead(ctx: &mut SimulationContext) -> Result<(), SimError> {
    transition(ctx, Phase::Dead)?;
    finish_session(ctx);
    Ok(())
}

fn finish_session(ctx: &mut SimulationContext) {
    let score = ctx.score.score();
    let improved = ctx.score.finalize();
    let best = ctx.score.best();
    log::info!(
        "{} run over: score {}, best {}{}",
        ctx.game_id(),
        score,
        best,
        if improved { " (new)" } else { "" }
    );
    ctx.emit(GameEvent::Died {
        score,
        best,
        improved,
    });
}

/// Recover from a failed tick by ending the run outright
pub fn force_dead(ctx: &mut SimulationContext) {
    ctx.cancel_death_timer();
    match ctx.phase {
        Phase::Menu | Phase::Dead => {}
        Phase::Playing | Phase::Dying => {
            ctx.phase = Phase::Dead;
            finish_session(ctx);
        }
    }
}
