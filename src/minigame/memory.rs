// Memory-Match: four symbol pairs on eight shuffled cards.
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use web_sys::CanvasRenderingContext2d;

use super::{Completion, Input, MiniGame};
use crate::clock::Timeout;
use crate::effects::{Effect, EffectPort};
use crate::levels::GameKind;
use crate::paint;

const SYMBOLS: [&str; 4] = ["💗", "💌", "🎁", "🌹"];
const COLUMNS: usize = 4;
const MATCH_LOCK_MS: f64 = 500.0;
const MISMATCH_REVERT_MS: f64 = 1_000.0;
const FINISH_DELAY_MS: f64 = 800.0;

// Card grid placement in play-area percent.
const GRID_LEFT: f64 = 5.0;
const GRID_TOP: f64 = 30.0;
const CELL_W: f64 = 22.5;
const CELL_H: f64 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Card {
    symbol: usize,
    flipped: bool,
    matched: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resolution {
    Lock,
    Revert,
}

pub struct MemoryMatch {
    done: Completion,
    cards: Vec<Card>,
    face_up: Vec<usize>,
    pending: Option<Resolution>,
    resolve: Timeout,
    finish: Timeout,
}

impl MemoryMatch {
    pub fn new(done: Completion, mut rng: SmallRng) -> Self {
        let mut symbols: Vec<usize> = (0..SYMBOLS.len()).chain(0..SYMBOLS.len()).collect();
        symbols.shuffle(&mut rng);
        let cards = symbols
            .into_iter()
            .map(|symbol| Card {
                symbol,
                flipped: false,
                matched: false,
            })
            .collect();
        Self {
            done,
            cards,
            face_up: Vec::with_capacity(2),
            pending: None,
            resolve: Timeout::default(),
            finish: Timeout::default(),
        }
    }

    pub fn matched_pairs(&self) -> usize {
        self.cards.iter().filter(|c| c.matched).count() / 2
    }

    fn all_matched(&self) -> bool {
        self.cards.iter().all(|c| c.matched)
    }

    fn pick(&mut self, idx: usize, fx: &dyn EffectPort) {
        let blocked = self.face_up.len() == 2
            || self.face_up.contains(&idx)
            || self.cards.get(idx).is_none_or(|c| c.matched);
        if blocked || self.finish.is_pending() {
            return;
        }

        fx.play(Effect::Click);
        self.cards[idx].flipped = true;
        self.face_up.push(idx);

        if let [a, b] = self.face_up[..] {
            if self.cards[a].symbol == self.cards[b].symbol {
                fx.play(Effect::Powerup);
                self.pending = Some(Resolution::Lock);
                self.resolve.arm(MATCH_LOCK_MS);
            } else {
                self.pending = Some(Resolution::Revert);
                self.resolve.arm(MISMATCH_REVERT_MS);
            }
        }
    }

    fn apply_resolution(&mut self) {
        let Some(resolution) = self.pending.take() else {
            return;
        };
        for idx in self.face_up.drain(..) {
            let card = &mut self.cards[idx];
            match resolution {
                Resolution::Lock => card.matched = true,
                Resolution::Revert => card.flipped = false,
            }
        }
        if self.all_matched() {
            self.finish.arm(FINISH_DELAY_MS);
        }
    }
}

/// Card rectangle (x, y, w, h) in play-area percent.
fn card_rect(idx: usize) -> (f64, f64, f64, f64) {
    let col = (idx % COLUMNS) as f64;
    let row = (idx / COLUMNS) as f64;
    (GRID_LEFT + col * CELL_W, GRID_TOP + row * CELL_H, CELL_W, CELL_H)
}

impl MiniGame for MemoryMatch {
    fn kind(&self) -> GameKind {
        GameKind::MemoryMatch
    }

    fn handle_input(&mut self, input: &Input, fx: &dyn EffectPort) {
        if self.done.is_closed() {
            return;
        }
        if let Input::Pick(idx) = *input {
            self.pick(idx, fx);
        }
    }

    fn advance(&mut self, dt_ms: f64, _fx: &dyn EffectPort) {
        if self.done.is_closed() {
            return;
        }
        // Finish first so a delay armed by this resolution starts counting next tick.
        if self.finish.advance(dt_ms) && self.done.signal() {
            tracing::debug!("memory match complete");
        }
        if self.resolve.advance(dt_ms) {
            self.apply_resolution();
        }
    }

    fn hit_test(&self, x_pct: f64, y_pct: f64) -> Input {
        (0..self.cards.len())
            .find(|&i| {
                let (x, y, w, h) = card_rect(i);
                x_pct >= x && x_pct < x + w && y_pct >= y && y_pct < y + h
            })
            .map_or(Input::Press, Input::Pick)
    }

    fn status(&self) -> String {
        format!("PAREJAS: {}/{}", self.matched_pairs(), SYMBOLS.len())
    }

    fn draw(&self, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
        paint::clear(ctx, width, height);
        for (i, card) in self.cards.iter().enumerate() {
            let (x, y, w, h) = card_rect(i);
            let (px, py) = (x / 100.0 * width + 3.0, y / 100.0 * height + 3.0);
            let (pw, ph) = (w / 100.0 * width - 6.0, h / 100.0 * height - 6.0);
            let shown = card.flipped || card.matched;
            ctx.set_fill_style_str(if shown { "#ffffff" } else { "#ec4899" });
            ctx.fill_rect(px, py, pw, ph);
            if shown {
                paint::centered_text(ctx, SYMBOLS[card.symbol], px + pw / 2.0, py + ph / 2.0 + 10.0, "28px sans-serif", paint::TEXT);
            }
        }
    }

    fn teardown(&mut self) {
        self.resolve.cancel();
        self.finish.cancel();
        self.done.close();
    }

    fn is_complete(&self) -> bool {
        self.done.is_spent()
    }
}
