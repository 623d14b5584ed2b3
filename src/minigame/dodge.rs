// Dodge: survive 600 frames of falling clouds. A hit pauses the run until the
// player retries, which rewinds only this game's own clock.
use rand::Rng;
use rand::rngs::SmallRng;
use web_sys::CanvasRenderingContext2d;

use super::{Completion, Input, Key, MiniGame};
use crate::clock::FrameLoop;
use crate::effects::{Effect, EffectPort};
use crate::levels::GameKind;
use crate::paint;

const SURVIVE_FRAMES: u64 = 600;
const FPS: u64 = 60;
const SPAWN_EVERY: u64 = 20;
const HIT_BAND: (f64, f64) = (80.0, 95.0);
const HIT_REACH: f64 = 10.0;
const OFFSCREEN_Y: f64 = 120.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DodgeState {
    Running,
    Collided,
    Survived,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Obstacle {
    x: f64,
    y: f64,
    speed: f64,
}

pub struct Dodge {
    done: Completion,
    rng: SmallRng,
    frames: FrameLoop,
    state: DodgeState,
    player_x: f64,
    obstacles: Vec<Obstacle>,
    seconds_left: u64,
    spawn_every: Option<u64>,
}

impl Dodge {
    pub fn new(done: Completion, rng: SmallRng) -> Self {
        Self {
            done,
            rng,
            frames: FrameLoop::default(),
            state: DodgeState::Running,
            player_x: 50.0,
            obstacles: Vec::new(),
            seconds_left: SURVIVE_FRAMES / FPS,
            spawn_every: Some(SPAWN_EVERY),
        }
    }

    pub fn state(&self) -> DodgeState {
        self.state
    }

    pub fn frame(&self) -> u64 {
        self.frames.frame()
    }

    pub fn seconds_left(&self) -> u64 {
        self.seconds_left
    }

    /// Collided -> Running, with a fresh clock and an empty sky.
    fn retry(&mut self) {
        if self.state != DodgeState::Collided {
            return;
        }
        self.obstacles.clear();
        self.frames.rewind();
        self.seconds_left = SURVIVE_FRAMES / FPS;
        self.state = DodgeState::Running;
        tracing::debug!("dodge retry");
    }

    fn hits(&self, o: &Obstacle) -> bool {
        o.y > HIT_BAND.0 && o.y < HIT_BAND.1 && (o.x - self.player_x).abs() < HIT_REACH
    }
}

impl MiniGame for Dodge {
    fn kind(&self) -> GameKind {
        GameKind::Dodge
    }

    fn handle_input(&mut self, input: &Input, _fx: &dyn EffectPort) {
        if self.done.is_closed() {
            return;
        }
        match *input {
            Input::Pointer { x_pct, .. } => self.player_x = x_pct.clamp(8.0, 92.0),
            Input::Press
            | Input::Key {
                key: Key::Enter | Key::Space,
                pressed: true,
            } => self.retry(),
            _ => {}
        }
    }

    fn on_frame(&mut self, fx: &dyn EffectPort) {
        if self.done.is_closed() {
            return;
        }
        if self.state != DodgeState::Running {
            return;
        }
        let Some(frame) = self.frames.tick() else {
            return;
        };

        if frame % FPS == 0 {
            self.seconds_left = (SURVIVE_FRAMES.saturating_sub(frame)).div_ceil(FPS);
        }

        if frame >= SURVIVE_FRAMES {
            self.state = DodgeState::Survived;
            self.frames.cancel();
            self.done.signal();
            tracing::debug!("dodge complete");
            return;
        }

        if let Some(every) = self.spawn_every
            && frame % every == 0
        {
            let obstacle = Obstacle {
                x: self.rng.gen_range(5.0..95.0),
                y: -10.0,
                speed: self.rng.gen_range(1.0..2.0),
            };
            self.obstacles.push(obstacle);
        }

        for o in &mut self.obstacles {
            o.y += o.speed;
        }
        self.obstacles.retain(|o| o.y < OFFSCREEN_Y);

        if self.obstacles.iter().any(|o| self.hits(o)) {
            fx.play(Effect::Lose);
            self.state = DodgeState::Collided;
            tracing::debug!(frame, "dodge collision");
        }
    }

    fn status(&self) -> String {
        format!("TIEMPO: {}s", self.seconds_left)
    }

    fn draw(&self, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
        paint::clear(ctx, width, height);
        paint::heart(ctx, self.player_x / 100.0 * width, height * 0.85, 6.0, paint::ACCENT);

        ctx.set_fill_style_str("#94a3b8");
        for o in &self.obstacles {
            let (ex, ey) = (o.x / 100.0 * width, o.y / 100.0 * height);
            ctx.begin_path();
            for (dx, dy, r) in [(0.0, 0.0, 8.0), (-6.0, 4.0, 6.0), (6.0, 4.0, 6.0)] {
                ctx.move_to(ex + dx + r, ey + dy);
                ctx.arc(ex + dx, ey + dy, r, 0.0, std::f64::consts::TAU).ok();
            }
            ctx.fill();
        }

        if self.state == DodgeState::Collided {
            ctx.set_fill_style_str("rgba(255,255,255,0.8)");
            ctx.fill_rect(0.0, 0.0, width, height);
            paint::centered_text(ctx, "INTENTAR DE NUEVO", width / 2.0, height / 2.0, "bold 16px sans-serif", paint::TEXT);
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

    fn game() -> (Dodge, CompletionReceiver) {
        let (done, rx) = Completion::channel();
        (Dodge::new(done, SmallRng::seed_from_u64(12)), rx)
    }

    #[test]
    fn test_empty_sky_survives_at_frame_600() {
        let (mut g, mut rx) = game();
        g.spawn_every = None;
        let fx = RecordingEffects::default();
        for _ in 0..SURVIVE_FRAMES - 1 {
            g.on_frame(&fx);
        }
        assert_eq!(g.state(), DodgeState::Running);
        assert!(!rx.try_take());
        g.on_frame(&fx);
        assert_eq!(g.state(), DodgeState::Survived);
        assert!(rx.try_take());
        for _ in 0..100 {
            g.on_frame(&fx);
        }
        assert_eq!(g.frame(), SURVIVE_FRAMES);
        assert!(!rx.try_take());
    }

    #[test]
    fn test_countdown_refreshes_every_second() {
        let (mut g, _rx) = game();
        g.spawn_every = None;
        let fx = RecordingEffects::default();
        assert_eq!(g.seconds_left(), 10);
        for _ in 0..59 {
            g.on_frame(&fx);
        }
        assert_eq!(g.seconds_left(), 10);
        g.on_frame(&fx);
        assert_eq!(g.seconds_left(), 9);
    }

    #[test]
    fn test_collision_enters_recoverable_state() {
        let (mut g, mut rx) = game();
        g.spawn_every = None;
        let fx = RecordingEffects::default();
        for _ in 0..300 {
            g.on_frame(&fx);
        }
        g.obstacles.push(Obstacle { x: 55.0, y: 84.0, speed: 1.0 });
        g.on_frame(&fx);
        assert_eq!(g.state(), DodgeState::Collided);
        assert_eq!(fx.take(), vec![Effect::Lose]);

        // Frozen until retry; time never runs out while collided.
        for _ in 0..1_000 {
            g.on_frame(&fx);
        }
        assert_eq!(g.frame(), 301);
        assert!(!rx.try_take());

        g.handle_input(&Input::Press, &fx);
        assert_eq!(g.state(), DodgeState::Running);
        assert_eq!(g.frame(), 0);
        assert_eq!(g.seconds_left(), 10);
        assert!(g.obstacles.is_empty());
    }

    #[test]
    fn test_hit_band_is_exclusive() {
        let (g, _rx) = game();
        assert!(!g.hits(&Obstacle { x: 50.0, y: 80.0, speed: 1.0 }));
        assert!(!g.hits(&Obstacle { x: 50.0, y: 95.0, speed: 1.0 }));
        assert!(!g.hits(&Obstacle { x: 60.0, y: 90.0, speed: 1.0 }));
        assert!(g.hits(&Obstacle { x: 59.0, y: 90.0, speed: 1.0 }));
    }

    #[test]
    fn test_spawned_obstacles_follow_ranges() {
        let (mut g, _rx) = game();
        g.player_x = 8.0;
        let fx = RecordingEffects::default();
        for _ in 0..SPAWN_EVERY {
            g.on_frame(&fx);
        }
        assert_eq!(g.obstacles.len(), 1);
        let o = g.obstacles[0];
        assert!((5.0..95.0).contains(&o.x));
        assert!((1.0..2.0).contains(&o.speed));
    }

    #[test]
    fn test_press_while_running_is_not_a_retry() {
        let (mut g, _rx) = game();
        g.spawn_every = None;
        let fx = RecordingEffects::default();
        g.on_frame(&fx);
        g.handle_input(&Input::Press, &fx);
        assert_eq!(g.frame(), 1);
    }

    #[test]
    fn test_retry_after_teardown_stays_dead() {
        let (mut g, mut rx) = game();
        g.spawn_every = None;
        let fx = RecordingEffects::default();
        g.obstacles.push(Obstacle { x: 50.0, y: 84.0, speed: 1.0 });
        g.on_frame(&fx);
        assert_eq!(g.state(), DodgeState::Collided);

        g.teardown();
        g.handle_input(&Input::Press, &fx);
        for _ in 0..SURVIVE_FRAMES {
            g.on_frame(&fx);
        }
        assert_eq!(g.state(), DodgeState::Collided);
        assert_eq!(g.frame(), 1);
        assert!(!g.is_complete());
        assert!(!rx.try_take());
    }
}
