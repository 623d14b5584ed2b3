//! Narrative generator: produces the final letter.
//!
//! `generate_reward` never fails. A fixed letter, a missing credential and any
//! live-call failure all resolve to the configured letter.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use crate::config::RewardConfig;

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("no browser window")]
    NoWindow,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service responded with status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response contained no text")]
    Empty,
}

impl From<JsValue> for NarrativeError {
    fn from(value: JsValue) -> Self {
        NarrativeError::Transport(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

/// One live generation call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub prompt: String,
}

/// Remote text generation.
pub trait TextService {
    fn generate(&self, request: GenerationRequest) -> LocalBoxFuture<'static, Result<String, NarrativeError>>;
}

/// Async sleep.
pub trait Delay {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()>;
}

pub struct NarrativeGenerator {
    config: RewardConfig,
    service: Rc<dyn TextService>,
    delay: Rc<dyn Delay>,
}

impl NarrativeGenerator {
    pub fn new(config: RewardConfig, service: Rc<dyn TextService>, delay: Rc<dyn Delay>) -> Self {
        Self { config, service, delay }
    }

    /// Generator wired to the browser: Gemini over fetch, setTimeout delays.
    pub fn browser(config: RewardConfig) -> Self {
        Self::new(config, Rc::new(GeminiService), Rc::new(BrowserDelay))
    }

    pub async fn generate_reward(&self) -> String {
        let fallback = self.config.fallback_text();

        if self.config.use_fixed_letter {
            self.delay.sleep(self.config.letter_delay_ms).await;
            return fallback;
        }

        let Some(api_key) = self.config.api_key() else {
            tracing::info!("no API key configured, using the fixed letter");
            return fallback;
        };

        let request = GenerationRequest {
            endpoint: self.config.endpoint.clone(),
            api_key: api_key.to_string(),
            model: self.config.model.clone(),
            prompt: self.config.prompt.clone(),
        };
        match self.service.generate(request).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                tracing::warn!("generation returned empty text, using the fixed letter");
                fallback
            }
            Err(err) => {
                tracing::warn!(%err, "generation failed, using the fixed letter");
                fallback
            }
        }
    }
}

// --- Gemini over fetch -------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

pub fn request_url(request: &GenerationRequest) -> String {
    format!(
        "{}/models/{}:generateContent",
        request.endpoint.trim_end_matches('/'),
        request.model
    )
}

pub fn request_body(request: &GenerationRequest) -> String {
    json!({
        "contents": [{ "parts": [{ "text": request.prompt }] }]
    })
    .to_string()
}

/// Text of the first candidate, parts concatenated.
pub fn extract_text(body: &str) -> Result<String, NarrativeError> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(NarrativeError::Empty);
    }
    Ok(text)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GeminiService;

impl TextService for GeminiService {
    fn generate(&self, request: GenerationRequest) -> LocalBoxFuture<'static, Result<String, NarrativeError>> {
        Box::pin(async move {
            let window = web_sys::window().ok_or(NarrativeError::NoWindow)?;

            let init = RequestInit::new();
            init.set_method("POST");
            init.set_body(&JsValue::from_str(&request_body(&request)));
            let req = Request::new_with_str_and_init(&request_url(&request), &init)?;
            req.headers().set("Content-Type", "application/json")?;
            req.headers().set("x-goog-api-key", &request.api_key)?;

            let resp: Response = JsFuture::from(window.fetch_with_request(&req)).await?.dyn_into()?;
            if !resp.ok() {
                return Err(NarrativeError::Status(resp.status()));
            }
            let body = JsFuture::from(resp.text()?).await?.as_string().unwrap_or_default();
            extract_text(&body)
        })
    }
}

/// `setTimeout` takes a signed delay; longer waits saturate.
fn timeout_ms(ms: u32) -> i32 {
    i32::try_from(ms).unwrap_or(i32::MAX)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserDelay;

impl Delay for BrowserDelay {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().map(|w| {
                w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout_ms(ms))
            });
            if !matches!(scheduled, Some(Ok(_))) {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        Box::pin(async move {
            let _ = JsFuture::from(promise).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request() -> GenerationRequest {
        GenerationRequest {
            endpoint: "https://example.test/v1beta/".into(),
            api_key: "k".into(),
            model: "gemini-x".into(),
            prompt: "poema".into(),
        }
    }

    #[test]
    fn test_request_shape() {
        let req = request();
        assert_eq!(request_url(&req), "https://example.test/v1beta/models/gemini-x:generateContent");
        let body: serde_json::Value = serde_json::from_str(&request_body(&req)).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "poema");
    }

    #[test]
    fn test_extract_text_joins_parts_of_first_candidate() {
        let body = r#"{"candidates":[
            {"content":{"parts":[{"text":"Hola "},{"text":"amor"}]}},
            {"content":{"parts":[{"text":"ignored"}]}}
        ]}"#;
        assert_eq!(extract_text(body).unwrap(), "Hola amor");
    }

    #[test]
    fn test_extract_text_rejects_empty_and_garbage() {
        assert!(matches!(extract_text(r#"{"candidates":[]}"#), Err(NarrativeError::Empty)));
        assert!(matches!(extract_text(r#"{}"#), Err(NarrativeError::Empty)));
        assert!(matches!(
            extract_text(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#),
            Err(NarrativeError::Empty)
        ));
        assert!(matches!(extract_text("<html>"), Err(NarrativeError::Decode(_))));
    }

    #[test]
    fn test_timeout_saturates_instead_of_wrapping() {
        assert_eq!(timeout_ms(1_500), 1_500);
        assert_eq!(timeout_ms(i32::MAX as u32), i32::MAX);
        assert_eq!(timeout_ms(u32::MAX), i32::MAX);
    }
}
