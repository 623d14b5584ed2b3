//! Anniversary Quest core crate.
//!
//! Eight small canvas mini-games played in order, each unlocking the next,
//! ending on a reward letter. `start_game()` mounts everything on a canvas;
//! the session logic itself is plain Rust and runs natively in tests.

use wasm_bindgen::prelude::*;

mod app;
pub mod clock;
pub mod config;
pub mod effects;
pub mod levels;
pub mod logging;
pub mod minigame;
pub mod narrative;
mod paint;
pub mod session;

pub use config::{AppConfig, ConfigError, RewardConfig};
pub use effects::{Effect, EffectPort};
pub use levels::{GameKind, LEVELS, LevelDescriptor};
pub use narrative::{Delay, NarrativeError, NarrativeGenerator, TextService};
pub use session::{LevelOutcome, RewardTicket, Session, SessionError, SessionPhase, SessionState};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Mount the game. `config_json` is an optional JSON `AppConfig`; missing keys
/// take their defaults.
#[wasm_bindgen]
pub fn start_game(config_json: Option<String>) -> Result<(), JsValue> {
    let config = match config_json.as_deref() {
        Some(json) if !json.trim().is_empty() => AppConfig::from_json(json),
        _ => Ok(AppConfig::default()),
    }
    .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let level = config.level().map_err(|e| JsValue::from_str(&e.to_string()))?;
    logging::init(level);
    app::start(config)
}

#[wasm_bindgen]
pub fn stop_game() {
    app::stop();
}
