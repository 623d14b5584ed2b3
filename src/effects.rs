//! Effect port: short named audio cues.
//!
//! Callers never branch on the outcome of `play`; a missing or broken audio
//! device simply means silence.

use std::cell::RefCell;

use wasm_bindgen::JsValue;
use web_sys::{AudioContext, AudioParam, AudioScheduledSourceNode, OscillatorType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Effect {
    Jump,
    Collect,
    Win,
    Lose,
    Click,
    Powerup,
}

/// Fire-and-forget audio capability injected into the session and variants.
pub trait EffectPort {
    /// Idempotent lazy setup of the output device (first user gesture).
    fn init_output(&self);
    fn play(&self, effect: Effect);
}

// --- Tone table --------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// How an automation point is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ramp {
    Set,
    Linear,
    Exponential,
}

/// (ramp, value, seconds after cue start)
pub type Point = (Ramp, f32, f64);

/// Oscillator envelope for one cue.
#[derive(Clone, Copy, Debug)]
pub struct Tone {
    pub wave: Waveform,
    pub pitch: &'static [Point],
    pub volume: &'static [Point],
    pub duration: f64,
}

pub fn tone_for(effect: Effect) -> Tone {
    use Ramp::*;
    match effect {
        Effect::Jump => Tone {
            wave: Waveform::Square,
            pitch: &[(Set, 150.0, 0.0), (Exponential, 600.0, 0.1)],
            volume: &[(Set, 0.1, 0.0), (Exponential, 0.01, 0.1)],
            duration: 0.1,
        },
        Effect::Collect => Tone {
            wave: Waveform::Sine,
            pitch: &[(Set, 400.0, 0.0), (Set, 600.0, 0.05)],
            volume: &[(Set, 0.1, 0.0), (Linear, 0.0, 0.1)],
            duration: 0.1,
        },
        Effect::Click => Tone {
            wave: Waveform::Triangle,
            pitch: &[(Set, 800.0, 0.0)],
            volume: &[(Set, 0.05, 0.0), (Linear, 0.0, 0.05)],
            duration: 0.05,
        },
        Effect::Lose => Tone {
            wave: Waveform::Sawtooth,
            pitch: &[(Set, 300.0, 0.0), (Linear, 100.0, 0.3)],
            volume: &[(Set, 0.2, 0.0), (Linear, 0.0, 0.3)],
            duration: 0.3,
        },
        Effect::Win => Tone {
            wave: Waveform::Square,
            pitch: &[(Set, 400.0, 0.0), (Set, 600.0, 0.1), (Set, 1000.0, 0.2)],
            volume: &[(Set, 0.1, 0.0), (Linear, 0.0, 0.4)],
            duration: 0.4,
        },
        Effect::Powerup => Tone {
            wave: Waveform::Sine,
            pitch: &[(Set, 200.0, 0.0), (Linear, 800.0, 0.5)],
            volume: &[(Set, 0.1, 0.0), (Linear, 0.0, 0.5)],
            duration: 0.5,
        },
    }
}

// --- Web Audio backend -------------------------------------------------------

thread_local! {
    static AUDIO: RefCell<Option<AudioContext>> = const { RefCell::new(None) };
}

/// Handle to the process-wide `AudioContext`, created on first use.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebAudio;

impl EffectPort for WebAudio {
    fn init_output(&self) {
        AUDIO.with(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.is_some() {
                return;
            }
            match AudioContext::new() {
                Ok(ctx) => *slot = Some(ctx),
                Err(err) => tracing::warn!(?err, "audio output unavailable"),
            }
        });
    }

    fn play(&self, effect: Effect) {
        self.init_output();
        AUDIO.with(|cell| {
            if let Some(ctx) = cell.borrow().as_ref()
                && let Err(err) = schedule_tone(ctx, tone_for(effect))
            {
                tracing::debug!(?effect, ?err, "failed to schedule cue");
            }
        });
    }
}

fn schedule_tone(ctx: &AudioContext, tone: Tone) -> Result<(), JsValue> {
    let osc = ctx.create_oscillator()?;
    let gain = ctx.create_gain()?;
    osc.connect_with_audio_node(&gain)?;
    gain.connect_with_audio_node(&ctx.destination())?;

    osc.set_type(match tone.wave {
        Waveform::Sine => OscillatorType::Sine,
        Waveform::Square => OscillatorType::Square,
        Waveform::Triangle => OscillatorType::Triangle,
        Waveform::Sawtooth => OscillatorType::Sawtooth,
    });

    let now = ctx.current_time();
    automate(&osc.frequency(), tone.pitch, now)?;
    automate(&gain.gain(), tone.volume, now)?;

    let source: &AudioScheduledSourceNode = &osc;
    source.start_with_when(now)?;
    source.stop_with_when(now + tone.duration)?;
    Ok(())
}

fn automate(param: &AudioParam, points: &[Point], now: f64) -> Result<(), JsValue> {
    for &(ramp, value, at) in points {
        match ramp {
            Ramp::Set => param.set_value_at_time(value, now + at)?,
            Ramp::Linear => param.linear_ramp_to_value_at_time(value, now + at)?,
            Ramp::Exponential => param.exponential_ramp_to_value_at_time(value, now + at)?,
        };
    }
    Ok(())
}

// --- Test double -------------------------------------------------------------

/// Records cues instead of playing them.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingEffects {
    pub played: RefCell<Vec<Effect>>,
    pub inits: std::cell::Cell<u32>,
}

#[cfg(test)]
impl RecordingEffects {
    pub fn take(&self) -> Vec<Effect> {
        std::mem::take(&mut *self.played.borrow_mut())
    }
}

#[cfg(test)]
impl EffectPort for RecordingEffects {
    fn init_output(&self) {
        self.inits.set(self.inits.get() + 1);
    }

    fn play(&self, effect: Effect) {
        self.played.borrow_mut().push(effect);
    }
}
