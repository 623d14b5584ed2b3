// Arithmetic: type the sum, submit, exact match after trimming.
use web_sys::CanvasRenderingContext2d;

use super::{Completion, Input, Key, MiniGame};
use crate::effects::{Effect, EffectPort};
use crate::levels::GameKind;
use crate::paint;

const LHS: u32 = 4;
const RHS: u32 = 4;
const MAX_LEN: usize = 8;

pub struct Arithmetic {
    done: Completion,
    answer: String,
    expected: String,
}

impl Arithmetic {
    pub fn new(done: Completion) -> Self {
        Self {
            done,
            answer: String::new(),
            expected: (LHS + RHS).to_string(),
        }
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn problem(&self) -> String {
        format!("{LHS} + {RHS} = ?")
    }

    /// The acceptance rule: surrounding whitespace is ignored, nothing else is.
    pub fn accepts(&self, text: &str) -> bool {
        text.trim() == self.expected
    }

    fn submit(&mut self, fx: &dyn EffectPort) {
        if self.accepts(&self.answer) {
            fx.play(Effect::Win);
            self.done.signal();
            tracing::debug!("arithmetic complete");
        } else {
            fx.play(Effect::Lose);
            self.answer.clear();
        }
    }
}

impl MiniGame for Arithmetic {
    fn kind(&self) -> GameKind {
        GameKind::Arithmetic
    }

    fn handle_input(&mut self, input: &Input, fx: &dyn EffectPort) {
        if self.done.is_closed() {
            return;
        }
        if self.done.is_spent() {
            return;
        }
        match input {
            Input::Text(text) => self.answer = text.clone(),
            Input::Submit
            | Input::Key {
                key: Key::Enter,
                pressed: true,
            } => self.submit(fx),
            Input::Key {
                key: Key::Backspace,
                pressed: true,
            } => {
                self.answer.pop();
            }
            Input::Key {
                key: Key::Char(c),
                pressed: true,
            } if self.answer.chars().count() < MAX_LEN => self.answer.push(*c),
            Input::Key {
                key: Key::Space,
                pressed: true,
            } if self.answer.chars().count() < MAX_LEN => self.answer.push(' '),
            _ => {}
        }
    }

    fn status(&self) -> String {
        self.problem()
    }

    fn draw(&self, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
        paint::clear(ctx, width, height);
        paint::centered_text(ctx, &self.problem(), width / 2.0, height * 0.3, "900 30px sans-serif", paint::TEXT);
        ctx.set_fill_style_str("#fdf2f8");
        ctx.fill_rect(width * 0.3, height * 0.42, width * 0.4, 60.0);
        paint::centered_text(ctx, &self.answer, width / 2.0, height * 0.42 + 42.0, "bold 34px sans-serif", paint::TEXT);
        paint::centered_text(ctx, "CONFIRMAR (Enter)", width / 2.0, height * 0.75, "bold 13px sans-serif", paint::TEXT);
    }

    fn teardown(&mut self) {
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
    use pretty_assertions::assert_eq;

    #[test]
    fn test_trim_then_exact_match() {
        let (done, _rx) = Completion::channel();
        let g = Arithmetic::new(done);
        for ok in ["8", " 8 ", "\t8\n"] {
            assert!(g.accepts(ok), "{ok:?} should be accepted");
        }
        for bad in ["8.0", "08", "+8", "8 8", "ocho", "", " ", "9"] {
            assert!(!g.accepts(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_wrong_answer_clears_without_penalty() {
        let (done, mut rx) = Completion::channel();
        let mut g = Arithmetic::new(done);
        let fx = RecordingEffects::default();
        g.handle_input(&Input::Key { key: Key::Char('0'), pressed: true }, &fx);
        g.handle_input(&Input::Key { key: Key::Char('8'), pressed: true }, &fx);
        assert_eq!(g.answer(), "08");
        g.handle_input(&Input::Key { key: Key::Enter, pressed: true }, &fx);
        assert_eq!(g.answer(), "");
        assert_eq!(fx.take(), vec![Effect::Lose]);
        assert!(!rx.try_take());

        g.handle_input(&Input::Text(" 8 ".into()), &fx);
        g.handle_input(&Input::Submit, &fx);
        assert_eq!(fx.take(), vec![Effect::Win]);
        assert!(rx.try_take());

        g.handle_input(&Input::Submit, &fx);
        assert!(fx.take().is_empty());
    }

    #[test]
    fn test_backspace_edits() {
        let (done, _rx) = Completion::channel();
        let mut g = Arithmetic::new(done);
        let fx = RecordingEffects::default();
        g.handle_input(&Input::Key { key: Key::Char('9'), pressed: true }, &fx);
        g.handle_input(&Input::Key { key: Key::Backspace, pressed: true }, &fx);
        g.handle_input(&Input::Key { key: Key::Char('8'), pressed: true }, &fx);
        assert_eq!(g.answer(), "8");
    }
}
