// Charge (final boss): hold to fill, letting go costs a chunk.
use web_sys::CanvasRenderingContext2d;

use super::{Completion, Input, Key, MiniGame};
use crate::clock::Interval;
use crate::effects::{Effect, EffectPort};
use crate::levels::GameKind;
use crate::paint;

const FILL_EVERY_MS: f64 = 30.0;
const FILL: f64 = 2.0;
const RELEASE_DRAIN: f64 = 20.0;

pub struct Charge {
    done: Completion,
    gauge: f64,
    fill: Interval,
}

impl Charge {
    pub fn new(done: Completion) -> Self {
        Self {
            done,
            gauge: 0.0,
            fill: Interval::stopped(FILL_EVERY_MS),
        }
    }

    pub fn gauge(&self) -> f64 {
        self.gauge
    }

    pub fn is_holding(&self) -> bool {
        self.fill.is_running()
    }

    fn hold(&mut self, fx: &dyn EffectPort) {
        if self.done.is_spent() || self.fill.is_running() {
            return;
        }
        fx.play(Effect::Powerup);
        self.fill.start();
    }

    fn release(&mut self) {
        if !self.fill.is_running() {
            return;
        }
        self.fill.cancel();
        self.gauge = (self.gauge - RELEASE_DRAIN).max(0.0);
    }
}

impl MiniGame for Charge {
    fn kind(&self) -> GameKind {
        GameKind::Charge
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
            } => self.hold(fx),
            Input::Release
            | Input::Key {
                key: Key::Space | Key::Enter,
                pressed: false,
            } => self.release(),
            _ => {}
        }
    }

    fn advance(&mut self, dt_ms: f64, _fx: &dyn EffectPort) {
        if self.done.is_closed() {
            return;
        }
        for _ in 0..self.fill.advance(dt_ms) {
            self.gauge = (self.gauge + FILL).min(100.0);
            if self.gauge >= 100.0 {
                self.fill.cancel();
                self.done.signal();
                tracing::debug!("charge complete");
                break;
            }
        }
    }

    fn status(&self) -> String {
        format!("CARGA: {:.0}%", self.gauge)
    }

    fn draw(&self, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
        paint::clear(ctx, width, height);
        paint::centered_text(ctx, "MANTÉN EL AMOR CARGANDO...", width / 2.0, height * 0.2, "bold 13px sans-serif", paint::TEXT);
        paint::gauge(ctx, width * 0.15, height * 0.32, width * 0.7, 22.0, self.gauge, paint::ACCENT);
        ctx.set_fill_style_str(paint::ACCENT);
        ctx.begin_path();
        ctx.arc(width / 2.0, height * 0.62, 52.0, 0.0, std::f64::consts::TAU).ok();
        ctx.fill();
        let beat = if self.is_holding() { 24.0 } else { 20.0 };
        paint::heart(ctx, width / 2.0, height * 0.62, beat, "#ffffff");
    }

    fn teardown(&mut self) {
        self.fill.cancel();
        self.done.close();
    }

    fn is_complete(&self) -> bool {
        self.done.is_spent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::RecordingEffects;

    #[test]
    fn test_hold_fills_two_per_tick() {
        let (done, _rx) = Completion::channel();
        let mut g = Charge::new(done);
        let fx = RecordingEffects::default();
        g.advance(300.0, &fx);
        assert_eq!(g.gauge(), 0.0, "nothing fills before a hold");
        g.handle_input(&Input::Press, &fx);
        g.advance(300.0, &fx);
        assert_eq!(g.gauge(), 20.0);
        assert_eq!(fx.take(), vec![Effect::Powerup]);
    }

    #[test]
    fn test_release_drains_twenty_once() {
        let (done, _rx) = Completion::channel();
        let mut g = Charge::new(done);
        let fx = RecordingEffects::default();
        g.handle_input(&Input::Press, &fx);
        g.advance(FILL_EVERY_MS * 15.0, &fx);
        g.handle_input(&Input::Release, &fx);
        assert_eq!(g.gauge(), 10.0);
        g.handle_input(&Input::Release, &fx);
        assert_eq!(g.gauge(), 10.0, "release without a hold is a no-op");
        g.advance(1_000.0, &fx);
        assert_eq!(g.gauge(), 10.0);

        g.handle_input(&Input::Press, &fx);
        g.handle_input(&Input::Release, &fx);
        assert_eq!(g.gauge(), 0.0);
    }

    #[test]
    fn test_full_gauge_completes_once() {
        let (done, mut rx) = Completion::channel();
        let mut g = Charge::new(done);
        let fx = RecordingEffects::default();
        g.handle_input(&Input::Press, &fx);
        g.advance(FILL_EVERY_MS * 49.0, &fx);
        assert_eq!(g.gauge(), 98.0);
        assert!(!rx.try_take());
        g.advance(FILL_EVERY_MS * 10.0, &fx);
        assert_eq!(g.gauge(), 100.0);
        assert!(rx.try_take());
        assert!(!g.is_holding());

        g.handle_input(&Input::Press, &fx);
        g.advance(1_000.0, &fx);
        assert!(!rx.try_take());
    }

    #[test]
    fn test_hold_after_teardown_never_fills() {
        let (done, mut rx) = Completion::channel();
        let mut g = Charge::new(done);
        let fx = RecordingEffects::default();
        g.handle_input(&Input::Press, &fx);
        g.advance(FILL_EVERY_MS * 10.0, &fx);
        assert_eq!(g.gauge(), 20.0);
        fx.take();

        g.teardown();
        assert!(!g.is_holding());
        g.handle_input(&Input::Press, &fx);
        g.advance(10_000.0, &fx);
        assert_eq!(g.gauge(), 20.0);
        assert!(!g.is_holding());
        assert!(fx.take().is_empty());
        assert!(!rx.try_take());
    }
}
