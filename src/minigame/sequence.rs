// Sequence-Repeat: watch a short left/right pattern, then play it back.
use rand::Rng;
use rand::rngs::SmallRng;
use web_sys::CanvasRenderingContext2d;

use super::{Completion, Input, Key, MiniGame};
use crate::clock::{Interval, Timeout};
use crate::effects::{Effect, EffectPort};
use crate::levels::GameKind;
use crate::paint;

const BUTTONS: [&str; 2] = ["IZQ", "DER"];
const LENGTH: usize = 3;
const CADENCE_MS: f64 = 800.0;
const SHOW_MS: f64 = 300.0;
const FLASH_MS: f64 = 150.0;
const RETRY_PAUSE_MS: f64 = 200.0;
const FINISH_DELAY_MS: f64 = 800.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Revealing steps; `shown` steps revealed so far.
    Playback { shown: usize },
    /// Short silence before replaying after a mistake.
    Pause,
    PlayerTurn,
    Won,
}

pub struct SequenceRepeat {
    done: Completion,
    sequence: Vec<usize>,
    cursor: usize,
    phase: Phase,
    lit: Option<usize>,
    cadence: Interval,
    unlight: Timeout,
    pause: Timeout,
    finish: Timeout,
}

impl SequenceRepeat {
    pub fn new(done: Completion, mut rng: SmallRng) -> Self {
        let sequence = (0..LENGTH).map(|_| rng.gen_range(0..BUTTONS.len())).collect();
        Self {
            done,
            sequence,
            cursor: 0,
            phase: Phase::Playback { shown: 0 },
            lit: None,
            cadence: Interval::new(CADENCE_MS),
            unlight: Timeout::default(),
            pause: Timeout::default(),
            finish: Timeout::default(),
        }
    }

    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    pub fn is_player_turn(&self) -> bool {
        self.phase == Phase::PlayerTurn
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn light(&mut self, button: usize, ms: f64) {
        self.lit = Some(button);
        self.unlight.arm(ms);
    }

    fn reveal_next(&mut self, fx: &dyn EffectPort) {
        let Phase::Playback { shown } = self.phase else {
            return;
        };
        match self.sequence.get(shown).copied() {
            Some(button) => {
                fx.play(Effect::Click);
                self.light(button, SHOW_MS);
                self.phase = Phase::Playback { shown: shown + 1 };
            }
            None => {
                self.cadence.cancel();
                self.lit = None;
                self.phase = Phase::PlayerTurn;
            }
        }
    }

    fn choose(&mut self, button: usize, fx: &dyn EffectPort) {
        if self.phase != Phase::PlayerTurn || button >= BUTTONS.len() {
            return;
        }
        fx.play(Effect::Collect);
        self.light(button, FLASH_MS);

        if button == self.sequence[self.cursor] {
            if self.cursor == self.sequence.len() - 1 {
                fx.play(Effect::Win);
                self.phase = Phase::Won;
                self.finish.arm(FINISH_DELAY_MS);
            } else {
                self.cursor += 1;
            }
        } else {
            fx.play(Effect::Lose);
            tracing::debug!(step = self.cursor, "sequence replay failed");
            self.cursor = 0;
            self.phase = Phase::Pause;
            self.pause.arm(RETRY_PAUSE_MS);
        }
    }
}

impl MiniGame for SequenceRepeat {
    fn kind(&self) -> GameKind {
        GameKind::SequenceRepeat
    }

    fn handle_input(&mut self, input: &Input, fx: &dyn EffectPort) {
        if self.done.is_closed() {
            return;
        }
        match *input {
            Input::Pick(button) => self.choose(button, fx),
            Input::Key { key: Key::Left, pressed: true } => self.choose(0, fx),
            Input::Key { key: Key::Right, pressed: true } => self.choose(1, fx),
            _ => {}
        }
    }

    fn advance(&mut self, dt_ms: f64, fx: &dyn EffectPort) {
        if self.done.is_closed() {
            return;
        }
        if self.unlight.advance(dt_ms) {
            self.lit = None;
        }
        for _ in 0..self.cadence.advance(dt_ms) {
            self.reveal_next(fx);
        }
        if self.pause.advance(dt_ms) {
            self.phase = Phase::Playback { shown: 0 };
            self.cadence.start();
        }
        if self.finish.advance(dt_ms) && self.done.signal() {
            tracing::debug!("sequence repeat complete");
        }
    }

    fn hit_test(&self, x_pct: f64, _y_pct: f64) -> Input {
        Input::Pick(if x_pct < 50.0 { 0 } else { 1 })
    }

    fn status(&self) -> String {
        if self.is_player_turn() {
            "¡TU TURNO!".to_string()
        } else {
            "MEMORIZA LA SECUENCIA".to_string()
        }
    }

    fn draw(&self, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
        paint::clear(ctx, width, height);
        let size = width * 0.32;
        for (i, label) in BUTTONS.iter().enumerate() {
            let x = if i == 0 { width * 0.25 } else { width * 0.75 } - size / 2.0;
            let y = height * 0.45 - size / 2.0;
            let lit = self.lit == Some(i);
            ctx.set_fill_style_str(if lit { "#ffffff" } else { "#ec4899" });
            ctx.fill_rect(x, y, size, size);
            let color = if lit { "#db2777" } else { "#ffffff" };
            paint::centered_text(ctx, label, x + size / 2.0, y + size / 2.0 + 8.0, "bold 20px sans-serif", color);
        }
    }

    fn teardown(&mut self) {
        self.cadence.cancel();
        self.unlight.cancel();
        self.pause.cancel();
        self.finish.cancel();
        self.done.close();
    }

    fn is_complete(&self) -> bool {
        self.done.is_spent()
    }
}
