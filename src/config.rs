//! Runtime configuration, passed to `start_game` as an optional JSON document.

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_LETTER: &str = "
Feliz aniversario 💗
Gracias por hacerme muy feliz durante estos 8 meses.
Nivel desbloqueado: para siempre.
";

const DEFAULT_PROMPT: &str = "Escribe un poema corto, romántico y divertido (máximo 6 líneas) en español \
para celebrar 8 meses de novios, usando referencias a videojuegos y amor eterno.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("the reward letter must not be empty")]
    EmptyLetter,
    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub canvas_id: String,
    pub width: u32,
    pub height: u32,
    pub log_level: String,
    /// Fixed RNG seed; entropy when absent.
    pub seed: Option<u64>,
    pub reward: RewardConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            canvas_id: "aq-canvas".to_string(),
            width: 300,
            height: 400,
            log_level: "info".to_string(),
            seed: None,
            reward: RewardConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RewardConfig {
    /// Always answer with `letter` after `letter_delay_ms`.
    pub use_fixed_letter: bool,
    pub letter: String,
    pub api_key: Option<String>,
    pub model: String,
    pub prompt: String,
    pub letter_delay_ms: u32,
    pub endpoint: String,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            use_fixed_letter: true,
            letter: DEFAULT_LETTER.to_string(),
            api_key: None,
            model: "gemini-3-flash-preview".to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            letter_delay_ms: 1_500,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

impl RewardConfig {
    /// The letter as shown: trimmed.
    pub fn fallback_text(&self) -> String {
        self.letter.trim().to_string()
    }

    /// Credential, treating blank as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reward.letter.trim().is_empty() {
            return Err(ConfigError::EmptyLetter);
        }
        self.level()?;
        Ok(())
    }

    pub fn level(&self) -> Result<tracing::Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}
