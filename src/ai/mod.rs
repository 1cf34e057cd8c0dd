pub mod gemini;
pub mod prompts;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::AiConfig;

// ── Types ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiResponse {
    pub text: String,
    pub model: String,
}

#[derive(Debug)]
pub struct AiError(pub String);

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Public API ────────────────────────────────────────

/// Story generation needs a Gemini key.
pub fn is_enabled(config: &AiConfig) -> bool {
    !config.gemini_api_key.trim().is_empty()
}

pub fn complete(config: &AiConfig, req: &AiRequest) -> Result<AiResponse, AiError> {
    if !is_enabled(config) {
        return Err(AiError(
            "Story generation is not available: no Gemini API key configured".into(),
        ));
    }
    gemini::call(config, req)
}

/// Write a short narrative about an item. Background from Wikipedia is
/// added to the prompt when it can be fetched.
pub fn generate_story(config: &AiConfig, title: &str, category: &str) -> Result<String, AiError> {
    if !is_enabled(config) {
        return Err(AiError(
            "Story generation is not available: no Gemini API key configured".into(),
        ));
    }

    let background = match wikipedia_summary(title) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Wikipedia lookup for '{}' failed: {}", title, e.0);
            String::new()
        }
    };

    let req = AiRequest {
        system: prompts::story_system(),
        prompt: prompts::story(title, category, &background),
        max_tokens: Some(config.max_tokens),
        temperature: Some(0.8),
    };

    let resp = complete(config, &req)?;
    let text = resp.text.trim();
    if text.is_empty() {
        return Err(AiError("The model returned an empty story".into()));
    }
    Ok(text.to_string())
}

/// Lead paragraph of the English Wikipedia article named `title`.
pub fn wikipedia_summary(title: &str) -> Result<String, AiError> {
    let page = title.trim().replace(' ', "_");
    if page.is_empty() {
        return Err(AiError("empty title".into()));
    }
    let mut url = url::Url::parse("https://en.wikipedia.org/api/rest_v1/page/summary/")
        .map_err(|e| AiError(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| AiError("bad Wikipedia URL".into()))?
        .pop_if_empty()
        .push(&page);

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent("artcat/0.1")
        .build()
        .map_err(|e| AiError(format!("HTTP client error: {}", e)))?;

    let resp = client
        .get(url)
        .send()
        .map_err(|e| AiError(format!("Wikipedia request failed: {}", e)))?;
    if !resp.status().is_success() {
        return Err(AiError(format!("Wikipedia returned {}", resp.status())));
    }

    let json: Value = resp
        .json()
        .map_err(|e| AiError(format!("Wikipedia JSON parse error: {}", e)))?;
    let extract = json
        .get("extract")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();
    if extract.is_empty() {
        return Err(AiError(format!("No Wikipedia page found for {}", title)));
    }
    Ok(extract)
}
