//! Audio feedback using the Web Audio API
//!
//! Procedurally generated tones - no external files. The simulation never
//! talks to audio directly; the scheduler maps drained events to tones and
//! hands them to a [`ToneSink`]. Failures are swallowed.

use thiserror::Error;

use crate::sim::GameEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// One oscillator burst with an exponential decay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency: f32,
    pub duration_ms: f32,
    /// Peak gain before settings are applied
    pub volume: f32,
    pub waveform: Waveform,
    /// Exponential pitch sweep target over the tone's life
    pub sweep_to: Option<f32>,
}

impl Default for Tone {
    fn default() -> Self {
        Self {
            frequency: 440.0,
            duration_ms: 300.0,
            volume: 0.3,
            waveform: Waveform::Sine,
            sweep_to: None,
        }
    }
}

impl Tone {
    pub const FLAP: Tone = Tone {
        frequency: 720.0,
        duration_ms: 160.0,
        volume: 0.5,
        waveform: Waveform::Triangle,
        sweep_to: Some(1250.0),
    };
    pub const COIN: Tone = Tone {
        frequency: 650.0,
        duration_ms: 280.0,
        volume: 0.7,
        waveform: Waveform::Sine,
        sweep_to: Some(1200.0),
    };
    pub const THUD: Tone = Tone {
        frequency: 140.0,
        duration_ms: 600.0,
        volume: 1.1,
        waveform: Waveform::Sine,
        sweep_to: Some(32.0),
    };
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio unavailable: {0}")]
    Unavailable(String),

    #[error("tone scheduling failed: {0}")]
    Schedule(String),
}

/// Something that can play a tone
pub trait ToneSink {
    /// Play `tone` scaled by `gain`
    fn play(&mut self, tone: &Tone, gain: f32) -> Result<(), AudioError>;
}

/// Sink that plays nothing (native builds, tests)
#[derive(Debug, Default)]
pub struct NullTones;

impl ToneSink for NullTones {
    fn play(&mut self, _tone: &Tone, _gain: f32) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Tone for a simulation event, if it has one
pub fn feedback(event: &GameEvent) -> Option<Tone> {
    match event {
        GameEvent::Flapped => Some(Tone::FLAP),
        GameEvent::Scored { .. } | GameEvent::Ate { .. } => Some(Tone::COIN),
        GameEvent::Hit => Some(Tone::THUD),
        GameEvent::Died { improved: true, .. } => Some(Tone::default()),
        GameEvent::Started | GameEvent::Landed | GameEvent::Died { .. } => None,
    }
}

/// Play the tone for `event`; errors are logged and dropped
pub fn play_feedback(sink: &mut dyn ToneSink, event: &GameEvent, gain: f32) {
    if gain <= 0.0 {
        return;
    }
    if let Some(tone) = feedback(event) {
        if let Err(e) = sink.play(&tone, gain) {
            log::debug!("Dropped {:?} tone: {}", event, e);
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudioTones;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioError, Tone, ToneSink, Waveform};

    /// Lowest value an exponential ramp may target
    const RAMP_FLOOR: f32 = 0.0001;

    fn js_err(e: wasm_bindgen::JsValue) -> AudioError {
        AudioError::Schedule(format!("{:?}", e))
    }

    /// Web Audio backed sink; created lazily on the first tone
    #[derive(Default)]
    pub struct WebAudioTones {
        ctx: Option<AudioContext>,
        failed: bool,
    }

    impl WebAudioTones {
        pub fn new() -> Self {
            Self::default()
        }

        fn context(&mut self) -> Result<&AudioContext, AudioError> {
            if self.ctx.is_none() && !self.failed {
                match AudioContext::new() {
                    Ok(ctx) => self.ctx = Some(ctx),
                    Err(e) => {
                        log::warn!("Failed to create AudioContext - audio disabled");
                        self.failed = true;
                        return Err(AudioError::Unavailable(format!("{:?}", e)));
                    }
                }
            }
            let ctx = self
                .ctx
                .as_ref()
                .ok_or_else(|| AudioError::Unavailable("no AudioContext".into()))?;
            // Browsers keep the context suspended until a user gesture
            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }
            Ok(ctx)
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Result<(OscillatorNode, GainNode), AudioError> {
            let osc = ctx.create_oscillator().map_err(js_err)?;
            let gain = ctx.create_gain().map_err(js_err)?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).map_err(js_err)?;
            gain.connect_with_audio_node(&ctx.destination())
                .map_err(js_err)?;

            Ok((osc, gain))
        }
    }

    impl ToneSink for WebAudioTones {
        fn play(&mut self, tone: &Tone, gain: f32) -> Result<(), AudioError> {
            let ctx = self.context()?;
            let osc_type = match tone.waveform {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Square => OscillatorType::Square,
                Waveform::Triangle => OscillatorType::Triangle,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
            };
            let (osc, env) = Self::create_osc(ctx, tone.frequency, osc_type)?;
            let t = ctx.current_time();
            let end = t + f64::from(tone.duration_ms) / 1000.0;

            env.gain()
                .set_value_at_time((tone.volume * gain).max(RAMP_FLOOR), t)
                .map_err(js_err)?;
            env.gain()
                .exponential_ramp_to_value_at_time(RAMP_FLOOR, end)
                .map_err(js_err)?;
            if let Some(target) = tone.sweep_to {
                osc.frequency()
                    .exponential_ramp_to_value_at_time(target.max(RAMP_FLOOR), end)
                    .map_err(js_err)?;
            }

            osc.start().map_err(js_err)?;
            osc.stop_with_when(end + 0.02).map_err(js_err)?;
            Ok(())
        }
    }
}
