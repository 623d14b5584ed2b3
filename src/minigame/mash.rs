// Mash-to-Fill: every press pumps the heart gauge, idle time drains it.
use web_sys::CanvasRenderingContext2d;

use super::{Completion, Input, Key, MiniGame};
use crate::clock::{Interval, Timeout};
use crate::effects::{Effect, EffectPort};
use crate::levels::GameKind;
use crate::paint;

const PER_PRESS: f64 = 7.0;
const DECAY: f64 = 0.5;
const DECAY_EVERY_MS: f64 = 50.0;
const PULSE_MS: f64 = 100.0;

pub struct Mash {
    done: Completion,
    gauge: f64,
    decay: Interval,
    pulse: Timeout,
}

impl Mash {
    pub fn new(done: Completion) -> Self {
        Self {
            done,
            gauge: 0.0,
            decay: Interval::new(DECAY_EVERY_MS),
            pulse: Timeout::default(),
        }
    }

    pub fn gauge(&self) -> f64 {
        self.gauge
    }

    fn pump(&mut self, fx: &dyn EffectPort) {
        if self.done.is_spent() {
            return;
        }
        fx.play(Effect::Click);
        self.pulse.arm(PULSE_MS);
        self.gauge += PER_PRESS;
        if self.gauge >= 100.0 {
            self.gauge = 100.0;
            self.decay.cancel();
            self.done.signal();
            tracing::debug!("mash complete");
        }
    }
}

impl MiniGame for Mash {
    fn kind(&self) -> GameKind {
        GameKind::MashToFill
    }

    fn handle_input(&mut self, input: &Input, fx: &dyn EffectPort) {
        if self.done.is_closed() {
            return;
        }
        match input {
            Input::Press
            | Input::Key {
                key: Key::Space | Key::Enter,
                pressed: true,
            } => self.pump(fx),
            _ => {}
        }
    }

    fn advance(&mut self, dt_ms: f64, _fx: &dyn EffectPort) {
        if self.done.is_closed() {
            return;
        }
        let ticks = self.decay.advance(dt_ms);
        self.gauge = (self.gauge - DECAY * f64::from(ticks)).max(0.0);
        self.pulse.advance(dt_ms);
    }

    fn status(&self) -> String {
        format!("{:.0}%", self.gauge)
    }

    fn draw(&self, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
        paint::clear(ctx, width, height);
        paint::centered_text(ctx, "¡LLENA EL CORAZÓN!", width / 2.0, height * 0.2, "bold 14px sans-serif", paint::TEXT);
        let size = if self.pulse.is_pending() { 48.0 } else { 40.0 };
        let cy = height * 0.5;
        paint::heart(ctx, width / 2.0, cy, size, paint::TRACK);
        // Fill the heart from the bottom by clipping to the gauge height.
        ctx.save();
        let top = cy + size - (2.0 * size) * self.gauge / 100.0;
        ctx.begin_path();
        ctx.rect(0.0, top, width, height);
        ctx.clip();
        paint::heart(ctx, width / 2.0, cy, size, "#ec4899");
        ctx.restore();
        paint::centered_text(ctx, "CLICK AQUÍ", width / 2.0, height * 0.82, "bold 16px sans-serif", paint::TEXT);
    }

    fn teardown(&mut self) {
        self.decay.cancel();
        self.pulse.cancel();
        self.done.close();
    }

    fn is_complete(&self) -> bool {
        self.done.is_spent()
    }
}
