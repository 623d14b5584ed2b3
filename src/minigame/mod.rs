//! Mini-game contract and the factory that mounts a variant for a level.
//!
//! A variant owns all of its progress state. The only thing it reports
//! outward is the single completion signal, carried by a one-shot channel so a
//! second signal is impossible by construction.

use futures::channel::oneshot;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use web_sys::CanvasRenderingContext2d;

use crate::effects::EffectPort;
use crate::levels::GameKind;

mod arithmetic;
mod catcher;
mod charge;
mod dodge;
mod mash;
mod memory;
mod sequence;
mod timing;

pub use arithmetic::Arithmetic;
pub use catcher::Catcher;
pub use charge::Charge;
pub use dodge::{Dodge, DodgeState};
pub use mash::Mash;
pub use memory::MemoryMatch;
pub use sequence::SequenceRepeat;
pub use timing::{StopStatus, TimingStop};

/// Keys the variants understand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Enter,
    Backspace,
    Space,
    Char(char),
}

/// Player input, already translated from browser events.
#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    /// Pointer position as a percentage of the play area.
    Pointer { x_pct: f64, y_pct: f64 },
    Key { key: Key, pressed: bool },
    /// Primary button / touch went down.
    Press,
    /// Primary button / touch went up (or left the play area).
    Release,
    /// Select a card or button by index.
    Pick(usize),
    /// Replace the text field content.
    Text(String),
    Submit,
}

/// Sending half of the completion signal, owned by the variant.
///
/// Also marks the variant's lifetime: once `close()`d on teardown the variant
/// ignores input, frames and timers, and can never signal.
#[derive(Debug)]
pub struct Completion {
    tx: Option<oneshot::Sender<()>>,
    sent: bool,
    closed: bool,
}

/// Receiving half, owned by the session.
#[derive(Debug)]
pub struct CompletionReceiver(oneshot::Receiver<()>);

impl Completion {
    pub fn channel() -> (Completion, CompletionReceiver) {
        let (tx, rx) = oneshot::channel();
        let done = Completion {
            tx: Some(tx),
            sent: false,
            closed: false,
        };
        (done, CompletionReceiver(rx))
    }

    /// Fire the signal. Returns false (and sends nothing) if already spent or closed.
    pub fn signal(&mut self) -> bool {
        match self.tx.take() {
            Some(tx) => {
                // Receiver may already be gone if the session tore us down.
                let _ = tx.send(());
                self.sent = true;
                true
            }
            None => false,
        }
    }

    /// True once the signal has been sent.
    pub fn is_spent(&self) -> bool {
        self.sent
    }

    /// Tear down: no signal can follow.
    pub fn close(&mut self) {
        self.tx = None;
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl CompletionReceiver {
    /// True once the variant has signalled; consumes the signal.
    pub fn try_take(&mut self) -> bool {
        matches!(self.0.try_recv(), Ok(Some(())))
    }
}

/// The uniform interface every variant implements.
pub trait MiniGame {
    fn kind(&self) -> GameKind;

    fn handle_input(&mut self, input: &Input, fx: &dyn EffectPort);

    /// One display refresh. Only frame-driven variants do work here.
    fn on_frame(&mut self, _fx: &dyn EffectPort) {}

    /// Advance timers by `dt_ms`.
    fn advance(&mut self, _dt_ms: f64, _fx: &dyn EffectPort) {}

    /// Translate a pointer press at a play-area position into an input.
    fn hit_test(&self, _x_pct: f64, _y_pct: f64) -> Input {
        Input::Press
    }

    /// Short HUD line, e.g. `SCORE: 3/10`.
    fn status(&self) -> String;

    fn draw(&self, ctx: &CanvasRenderingContext2d, width: f64, height: f64);

    /// Cancel every outstanding frame task and timer, and close the
    /// completion signal. Later input, frames and timer ticks are ignored.
    fn teardown(&mut self);

    /// True once the completion signal has been sent.
    fn is_complete(&self) -> bool;
}

/// Build a fresh variant for `kind`.
pub fn mount(kind: GameKind, done: Completion, seed: u64) -> Box<dyn MiniGame> {
    let rng = SmallRng::seed_from_u64(seed);
    match kind {
        GameKind::Catcher => Box::new(Catcher::new(done, rng)),
        GameKind::MemoryMatch => Box::new(MemoryMatch::new(done, rng)),
        GameKind::MashToFill => Box::new(Mash::new(done)),
        GameKind::TimingStop => Box::new(TimingStop::new(done)),
        GameKind::SequenceRepeat => Box::new(SequenceRepeat::new(done, rng)),
        GameKind::Arithmetic => Box::new(Arithmetic::new(done)),
        GameKind::Dodge => Box::new(Dodge::new(done, rng)),
        GameKind::Charge => Box::new(Charge::new(done)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_signals_once() {
        let (mut done, mut rx) = Completion::channel();
        assert!(!rx.try_take());
        assert!(done.signal());
        assert!(!done.signal());
        assert!(done.is_spent());
        assert!(rx.try_take());
        assert!(!rx.try_take());
    }

    #[test]
    fn test_signal_after_receiver_dropped_is_harmless() {
        let (mut done, rx) = Completion::channel();
        drop(rx);
        assert!(done.signal());
        assert!(!done.signal());
    }

    #[test]
    fn test_closed_completion_never_signals() {
        let (mut done, mut rx) = Completion::channel();
        done.close();
        assert!(done.is_closed());
        assert!(!done.signal());
        assert!(!done.is_spent());
        assert!(!rx.try_take());
    }

    #[test]
    fn test_mount_matches_kind() {
        for level in crate::levels::LEVELS.iter() {
            let (done, _rx) = Completion::channel();
            let game = mount(level.kind, done, 7);
            assert_eq!(game.kind(), level.kind);
            assert!(!game.is_complete());
        }
    }
}
