// Timing-Stop: a marker sweeps a track; stop it inside the zone.
use web_sys::CanvasRenderingContext2d;

use super::{Completion, Input, Key, MiniGame};
use crate::clock::{Interval, Timeout};
use crate::effects::{Effect, EffectPort};
use crate::levels::GameKind;
use crate::paint;

const STEP_EVERY_MS: f64 = 16.0;
const STEP: f64 = 2.0;
const BOUNDS: (f64, f64) = (2.0, 98.0);
const ZONE: (f64, f64) = (40.0, 60.0);
const FINISH_DELAY_MS: f64 = 1_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopStatus {
    Idle,
    Won,
    Lost,
}

pub struct TimingStop {
    done: Completion,
    pos: f64,
    dir: f64,
    status: StopStatus,
    sweep: Interval,
    finish: Timeout,
}

impl TimingStop {
    pub fn new(done: Completion) -> Self {
        Self {
            done,
            pos: 0.0,
            dir: 1.0,
            status: StopStatus::Idle,
            sweep: Interval::new(STEP_EVERY_MS),
            finish: Timeout::default(),
        }
    }

    pub fn position(&self) -> f64 {
        self.pos
    }

    pub fn stop_status(&self) -> StopStatus {
        self.status
    }

    fn step(&mut self) {
        if self.pos >= BOUNDS.1 {
            self.dir = -1.0;
        }
        if self.pos <= BOUNDS.0 {
            self.dir = 1.0;
        }
        self.pos += self.dir * STEP;
    }

    fn press(&mut self, fx: &dyn EffectPort) {
        match self.status {
            StopStatus::Won => {}
            StopStatus::Lost => {
                self.status = StopStatus::Idle;
                self.pos = 0.0;
                self.dir = 1.0;
                self.sweep.start();
            }
            StopStatus::Idle => {
                self.sweep.cancel();
                if self.pos > ZONE.0 && self.pos < ZONE.1 {
                    fx.play(Effect::Win);
                    self.status = StopStatus::Won;
                    self.finish.arm(FINISH_DELAY_MS);
                } else {
                    fx.play(Effect::Lose);
                    self.status = StopStatus::Lost;
                    tracing::debug!(pos = self.pos, "timing stop missed");
                }
            }
        }
    }
}

impl MiniGame for TimingStop {
    fn kind(&self) -> GameKind {
        GameKind::TimingStop
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
            } => self.press(fx),
            _ => {}
        }
    }

    fn advance(&mut self, dt_ms: f64, _fx: &dyn EffectPort) {
        if self.done.is_closed() {
            return;
        }
        for _ in 0..self.sweep.advance(dt_ms) {
            self.step();
        }
        if self.finish.advance(dt_ms) && self.done.signal() {
            tracing::debug!("timing stop complete");
        }
    }

    fn status(&self) -> String {
        match self.status {
            StopStatus::Won => "¡PERFECTO!",
            StopStatus::Lost => "INTENTA DE NUEVO",
            StopStatus::Idle => "DETÉN EN EL CENTRO",
        }
        .to_string()
    }

    fn draw(&self, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
        paint::clear(ctx, width, height);
        let (x, y, w, h) = (width * 0.05, height * 0.4, width * 0.9, 40.0);
        ctx.set_fill_style_str(paint::TRACK);
        ctx.fill_rect(x, y, w, h);
        ctx.set_fill_style_str("#f472b6");
        ctx.fill_rect(x + w * ZONE.0 / 100.0, y, w * (ZONE.1 - ZONE.0) / 100.0, h);
        ctx.set_fill_style_str(paint::TEXT);
        ctx.fill_rect(x + w * self.pos.clamp(0.0, 100.0) / 100.0 - 6.0, y, 12.0, h);
        paint::centered_text(ctx, "OK", width / 2.0, height * 0.75, "bold 22px sans-serif", paint::TEXT);
    }

    fn teardown(&mut self) {
        self.sweep.cancel();
        self.finish.cancel();
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
    use crate::minigame::CompletionReceiver;

    fn game() -> (TimingStop, CompletionReceiver) {
        let (done, rx) = Completion::channel();
        (TimingStop::new(done), rx)
    }

    #[test]
    fn test_marker_bounces_between_bounds() {
        let (mut g, _rx) = game();
        let fx = RecordingEffects::default();
        g.advance(STEP_EVERY_MS * 49.0, &fx);
        assert_eq!(g.position(), 98.0);
        g.advance(STEP_EVERY_MS, &fx);
        assert_eq!(g.position(), 96.0);
        g.advance(STEP_EVERY_MS * 47.0, &fx);
        assert_eq!(g.position(), 2.0);
        g.advance(STEP_EVERY_MS, &fx);
        assert_eq!(g.position(), 4.0);
    }

    #[test]
    fn test_stop_outside_zone_is_recoverable() {
        let (mut g, mut rx) = game();
        let fx = RecordingEffects::default();
        g.advance(STEP_EVERY_MS * 20.0, &fx); // pos 40, boundary excluded
        g.handle_input(&Input::Press, &fx);
        assert_eq!(g.stop_status(), StopStatus::Lost);
        assert_eq!(fx.take(), vec![Effect::Lose]);
        g.advance(5_000.0, &fx);
        assert_eq!(g.position(), 40.0, "marker frozen while stopped");
        assert!(!rx.try_take());

        g.handle_input(&Input::Press, &fx);
        assert_eq!(g.stop_status(), StopStatus::Idle);
        assert_eq!(g.position(), 0.0);
    }

    #[test]
    fn test_stop_inside_zone_completes_after_delay() {
        let (mut g, mut rx) = game();
        let fx = RecordingEffects::default();
        g.advance(STEP_EVERY_MS * 25.0, &fx);
        assert_eq!(g.position(), 50.0);
        g.handle_input(&Input::Press, &fx);
        assert_eq!(g.stop_status(), StopStatus::Won);
        assert_eq!(fx.take(), vec![Effect::Win]);
        g.handle_input(&Input::Press, &fx);
        assert_eq!(g.stop_status(), StopStatus::Won);
        g.advance(999.0, &fx);
        assert!(!rx.try_take());
        g.advance(1.0, &fx);
        assert!(rx.try_take());
    }

    #[test]
    fn test_restart_press_after_teardown_is_ignored() {
        let (mut g, mut rx) = game();
        let fx = RecordingEffects::default();
        g.advance(STEP_EVERY_MS * 5.0, &fx);
        g.handle_input(&Input::Press, &fx);
        assert_eq!(g.stop_status(), StopStatus::Lost);

        g.teardown();
        g.handle_input(&Input::Press, &fx);
        g.advance(STEP_EVERY_MS * 25.0, &fx);
        g.handle_input(&Input::Press, &fx);
        g.advance(FINISH_DELAY_MS * 2.0, &fx);
        assert_eq!(g.stop_status(), StopStatus::Lost);
        assert_eq!(g.position(), 10.0);
        assert!(!rx.try_take());
    }
}
