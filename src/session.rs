//! Session controller: intro, then per level a transition card and the
//! mounted mini-game, then the reward screen.
//!
//! ```text
//! Intro --start--> Transitioning(0) --confirm--> Playing(0) --complete--> Transitioning(1) ...
//! Playing(last) --complete--> Reward          any --restart--> Intro
//! ```
//!
//! The controller never runs async work itself. Completing the last level
//! hands back a `RewardTicket`; the host runs [`run_reward`] with it. Tickets
//! carry the session generation, bumped on every restart, so a letter that
//! resolves after a restart is dropped instead of leaking into the new run.

use std::cell::RefCell;
use std::rc::Rc;

use rand::RngCore;
use rand::rngs::SmallRng;
use thiserror::Error;

use crate::effects::{Effect, EffectPort};
use crate::levels::{self, LevelDescriptor};
use crate::minigame::{self, Completion, CompletionReceiver, Input, MiniGame};
use crate::narrative::NarrativeGenerator;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Intro,
    Transitioning(usize),
    Playing(usize),
    Reward,
    /// Reserved; no level can fail permanently, so nothing enters it.
    GameOver,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub current_level_index: usize,
    pub reward_text: String,
    pub reward_loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Intro,
            current_level_index: 0,
            reward_text: String::new(),
            reward_loading: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("{op} is not valid in phase {phase:?}")]
    WrongPhase { op: &'static str, phase: SessionPhase },
}

/// Claim on the reward text for one session generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardTicket {
    generation: u64,
}

/// What a completed level led to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelOutcome {
    Advanced { next: usize },
    /// Last level done; generate the letter with this ticket.
    Finished(RewardTicket),
}

struct ActiveLevel {
    game: Box<dyn MiniGame>,
    done: CompletionReceiver,
}

pub struct Session {
    state: SessionState,
    effects: Rc<dyn EffectPort>,
    rng: SmallRng,
    active: Option<ActiveLevel>,
    generation: u64,
}

impl Session {
    pub fn new(effects: Rc<dyn EffectPort>, rng: SmallRng) -> Self {
        Self {
            state: SessionState::default(),
            effects,
            rng,
            active: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn current_level(&self) -> &'static LevelDescriptor {
        &levels::LEVELS[self.state.current_level_index]
    }

    /// The mounted variant, only while `Playing`.
    pub fn active_game(&self) -> Option<&dyn MiniGame> {
        self.active.as_ref().map(|a| a.game.as_ref())
    }

    fn wrong_phase(&self, op: &'static str) -> SessionError {
        tracing::warn!(op, phase = ?self.state.phase, "operation ignored");
        SessionError::WrongPhase {
            op,
            phase: self.state.phase,
        }
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state.phase != SessionPhase::Intro {
            return Err(self.wrong_phase("start"));
        }
        self.effects.init_output();
        self.effects.play(Effect::Click);
        self.state.current_level_index = 0;
        self.state.phase = SessionPhase::Transitioning(0);
        tracing::info!("session started");
        Ok(())
    }

    pub fn confirm_transition(&mut self) -> Result<(), SessionError> {
        let SessionPhase::Transitioning(index) = self.state.phase else {
            return Err(self.wrong_phase("confirm_transition"));
        };
        let level = &levels::LEVELS[index];
        let (done, rx) = Completion::channel();
        let game = minigame::mount(level.kind, done, self.rng.next_u64());
        self.active = Some(ActiveLevel { game, done: rx });
        self.state.phase = SessionPhase::Playing(index);
        tracing::info!(level = level.id, kind = ?level.kind, "level mounted");
        Ok(())
    }

    /// Completion callback for the mounted level.
    pub fn complete_level(&mut self) -> Result<LevelOutcome, SessionError> {
        let SessionPhase::Playing(index) = self.state.phase else {
            return Err(self.wrong_phase("complete_level"));
        };
        self.unmount();
        self.effects.play(Effect::Win);

        if index < levels::last_index() {
            let next = index + 1;
            self.state.current_level_index = next;
            self.state.phase = SessionPhase::Transitioning(next);
            tracing::info!(completed = index + 1, "level complete");
            Ok(LevelOutcome::Advanced { next })
        } else {
            self.state.reward_loading = true;
            self.state.phase = SessionPhase::Reward;
            tracing::info!(generation = self.generation, "all levels complete");
            Ok(LevelOutcome::Finished(RewardTicket {
                generation: self.generation,
            }))
        }
    }

    /// Back to the intro from anywhere. An in-flight letter is left to finish
    /// and is discarded on arrival.
    pub fn restart(&mut self) {
        self.unmount();
        self.effects.play(Effect::Click);
        self.generation += 1;
        self.state = SessionState::default();
        tracing::info!(generation = self.generation, "session restarted");
    }

    /// Store the letter if `ticket` still belongs to this session's reward screen.
    pub fn deliver_reward(&mut self, ticket: RewardTicket, text: String) -> bool {
        if ticket.generation != self.generation || self.state.phase != SessionPhase::Reward {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale reward text"
            );
            return false;
        }
        self.state.reward_text = text;
        self.state.reward_loading = false;
        true
    }

    pub fn input(&mut self, input: &Input) -> Option<LevelOutcome> {
        let active = self.active.as_mut()?;
        active.game.handle_input(input, self.effects.as_ref());
        self.poll_completion()
    }

    /// Pointer press at a play-area position, routed through the variant's hit test.
    pub fn pointer_down(&mut self, x_pct: f64, y_pct: f64) -> Option<LevelOutcome> {
        let input = self.active.as_ref()?.game.hit_test(x_pct, y_pct);
        self.input(&input)
    }

    /// One display refresh covering `dt_ms` of timer time.
    pub fn frame(&mut self, dt_ms: f64) -> Option<LevelOutcome> {
        let active = self.active.as_mut()?;
        active.game.on_frame(self.effects.as_ref());
        active.game.advance(dt_ms, self.effects.as_ref());
        self.poll_completion()
    }

    fn poll_completion(&mut self) -> Option<LevelOutcome> {
        let signalled = self.active.as_mut()?.done.try_take();
        if signalled {
            self.complete_level().ok()
        } else {
            None
        }
    }

    fn unmount(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.game.teardown();
        }
    }
}

/// Generate the letter and hand it to the session if the ticket is still current.
pub async fn run_reward(session: Rc<RefCell<Session>>, generator: Rc<NarrativeGenerator>, ticket: RewardTicket) {
    let text = generator.generate_reward().await;
    if session.borrow_mut().deliver_reward(ticket, text) {
        tracing::info!("reward letter ready");
    }
}
