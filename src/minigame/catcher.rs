// Catcher: hearts fall, a basket follows the pointer. Ten catches win.
use rand::Rng;
use rand::rngs::SmallRng;
use web_sys::CanvasRenderingContext2d;

use super::{Completion, Input, Key, MiniGame};
use crate::clock::FrameLoop;
use crate::effects::{Effect, EffectPort};
use crate::levels::GameKind;
use crate::paint;

const TARGET: u32 = 10;
const SPAWN_EVERY: u64 = 50;
const KEY_STEP: f64 = 2.0;
const CATCH_BAND: (f64, f64) = (82.0, 95.0);
const CATCH_REACH: f64 = 15.0;
const OFFSCREEN_Y: f64 = 105.0;

/// Falling object in 0..100 play-area units.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Faller {
    x: f64,
    y: f64,
    speed: f64,
}

pub struct Catcher {
    done: Completion,
    rng: SmallRng,
    frames: FrameLoop,
    paddle_x: f64,
    left_held: bool,
    right_held: bool,
    hearts: Vec<Faller>,
    score: u32,
}

impl Catcher {
    pub fn new(done: Completion, rng: SmallRng) -> Self {
        Self {
            done,
            rng,
            frames: FrameLoop::default(),
            paddle_x: 50.0,
            left_held: false,
            right_held: false,
            hearts: Vec::new(),
            score: 0,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn paddle_x(&self) -> f64 {
        self.paddle_x
    }

    fn set_paddle(&mut self, x: f64) {
        self.paddle_x = x.clamp(10.0, 90.0);
    }
}

fn caught(h: &Faller, paddle_x: f64) -> bool {
    h.y > CATCH_BAND.0 && h.y < CATCH_BAND.1 && (h.x - paddle_x).abs() < CATCH_REACH
}

impl MiniGame for Catcher {
    fn kind(&self) -> GameKind {
        GameKind::Catcher
    }

    fn handle_input(&mut self, input: &Input, _fx: &dyn EffectPort) {
        if self.done.is_closed() {
            return;
        }
        match *input {
            Input::Pointer { x_pct, .. } => self.set_paddle(x_pct),
            Input::Key { key: Key::Left, pressed } => self.left_held = pressed,
            Input::Key { key: Key::Right, pressed } => self.right_held = pressed,
            _ => {}
        }
    }

    fn on_frame(&mut self, fx: &dyn EffectPort) {
        if self.done.is_closed() {
            return;
        }
        let Some(frame) = self.frames.tick() else {
            return;
        };

        if self.left_held {
            self.set_paddle(self.paddle_x - KEY_STEP);
        }
        if self.right_held {
            self.set_paddle(self.paddle_x + KEY_STEP);
        }

        if frame % SPAWN_EVERY == 0 {
            let heart = Faller {
                x: self.rng.gen_range(10.0..90.0),
                y: -10.0,
                speed: self.rng.gen_range(0.5..0.9),
            };
            self.hearts.push(heart);
        }

        for h in &mut self.hearts {
            h.y += h.speed;
        }

        let paddle_x = self.paddle_x;
        let before = self.hearts.len();
        self.hearts.retain(|h| !caught(h, paddle_x));
        for _ in self.hearts.len()..before {
            fx.play(Effect::Collect);
            self.score += 1;
        }
        self.hearts.retain(|h| h.y < OFFSCREEN_Y);

        if self.score >= TARGET && self.done.signal() {
            tracing::debug!(frame, "catcher complete");
            self.frames.cancel();
        }
    }

    fn status(&self) -> String {
        format!("SCORE: {}/{}", self.score.min(TARGET), TARGET)
    }

    fn draw(&self, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
        paint::clear(ctx, width, height);

        let px = self.paddle_x / 100.0 * width;
        let py = height * 0.85;
        ctx.set_fill_style_str(paint::TEXT);
        ctx.fill_rect(px - 25.0, py, 50.0, 25.0);
        ctx.set_fill_style_str("#fbcfe8");
        ctx.fill_rect(px - 20.0, py + 3.0, 40.0, 10.0);

        for h in &self.hearts {
            paint::heart(ctx, h.x / 100.0 * width, h.y / 100.0 * height, 6.0, paint::ACCENT);
        }
    }

    fn teardown(&mut self) {
        self.frames.cancel();
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
    use rand::SeedableRng;

    fn game() -> (Catcher, CompletionReceiver) {
        let (done, rx) = Completion::channel();
        (Catcher::new(done, SmallRng::seed_from_u64(3)), rx)
    }

    #[test]
    fn test_paddle_is_clamped() {
        let (mut g, _rx) = game();
        let fx = RecordingEffects::default();
        g.handle_input(&Input::Pointer { x_pct: -40.0, y_pct: 0.0 }, &fx);
        assert_eq!(g.paddle_x(), 10.0);
        g.handle_input(&Input::Pointer { x_pct: 140.0, y_pct: 0.0 }, &fx);
        assert_eq!(g.paddle_x(), 90.0);
    }

    #[test]
    fn test_held_key_moves_two_units_per_frame() {
        let (mut g, _rx) = game();
        let fx = RecordingEffects::default();
        g.handle_input(&Input::Key { key: Key::Left, pressed: true }, &fx);
        g.on_frame(&fx);
        g.on_frame(&fx);
        assert_eq!(g.paddle_x(), 46.0);
        g.handle_input(&Input::Key { key: Key::Left, pressed: false }, &fx);
        g.on_frame(&fx);
        assert_eq!(g.paddle_x(), 46.0);
    }

    #[test]
    fn test_spawns_every_fifty_frames() {
        let (mut g, _rx) = game();
        let fx = RecordingEffects::default();
        for _ in 0..49 {
            g.on_frame(&fx);
        }
        assert!(g.hearts.is_empty());
        g.on_frame(&fx);
        assert_eq!(g.hearts.len(), 1);
        let h = g.hearts[0];
        assert!((10.0..90.0).contains(&h.x));
        assert!((0.5..0.9).contains(&h.speed));
    }

    #[test]
    fn test_catch_band_is_exclusive() {
        assert!(caught(&Faller { x: 50.0, y: 83.0, speed: 0.5 }, 50.0));
        assert!(!caught(&Faller { x: 50.0, y: 82.0, speed: 0.5 }, 50.0));
        assert!(!caught(&Faller { x: 50.0, y: 95.0, speed: 0.5 }, 50.0));
        assert!(!caught(&Faller { x: 65.0, y: 90.0, speed: 0.5 }, 50.0));
        assert!(caught(&Faller { x: 64.9, y: 90.0, speed: 0.5 }, 50.0));
    }

    #[test]
    fn test_ten_catches_complete_once() {
        let (mut g, mut rx) = game();
        let fx = RecordingEffects::default();
        for i in 0..TARGET {
            g.hearts.push(Faller { x: 50.0, y: 85.0, speed: 0.5 });
            g.on_frame(&fx);
            assert_eq!(g.score(), i + 1);
            if i + 1 < TARGET {
                assert!(!rx.try_take());
            }
        }
        assert!(rx.try_take());
        assert!(g.is_complete());
        assert_eq!(fx.take(), vec![Effect::Collect; TARGET as usize]);

        // Late frames after completion do nothing.
        g.hearts.push(Faller { x: 50.0, y: 85.0, speed: 0.5 });
        g.on_frame(&fx);
        assert_eq!(g.score(), TARGET);
        assert!(!rx.try_take());
    }

    #[test]
    fn test_no_frames_run_after_teardown() {
        let (mut g, _rx) = game();
        let fx = RecordingEffects::default();
        g.on_frame(&fx);
        g.teardown();
        for _ in 0..200 {
            g.on_frame(&fx);
        }
        assert_eq!(g.frames.frame(), 1);
        assert!(g.hearts.is_empty());
    }
}
