use serde_json::{json, Value};
use std::time::Duration;

use super::{AiError, AiRequest, AiResponse};
use crate::config::AiConfig;

const ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const FALLBACK_MODEL: &str = "gemini-2.0-flash-exp";

/// One `generateContent` round trip. Blocks; call from a blocking context.
pub fn call(config: &AiConfig, req: &AiRequest) -> Result<AiResponse, AiError> {
    let api_key = config.gemini_api_key.trim();
    if api_key.is_empty() {
        return Err(AiError("Gemini API key not configured".into()));
    }

    let model = match config.gemini_model.trim() {
        "" => FALLBACK_MODEL.to_string(),
        m => m.to_string(),
    };
    let endpoint = format!("{}/{}:generateContent", ENDPOINT, model);

    let http = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| AiError(format!("HTTP client error: {}", e)))?;

    let resp = http
        .post(&endpoint)
        .header("x-goog-api-key", api_key)
        .json(&request_body(req))
        .send()
        .map_err(|e| AiError(format!("Gemini unreachable: {}", e)))?;

    let status = resp.status();
    if !status.is_success() {
        let detail = resp.text().unwrap_or_default();
        log::warn!("[ai] Gemini {} for model {}: {}", status, model, detail);
        return Err(AiError(format!("Gemini returned {}", status)));
    }

    let payload: Value = resp
        .json()
        .map_err(|e| AiError(format!("Unreadable Gemini response: {}", e)))?;

    if let Some(reason) = block_reason(&payload) {
        return Err(AiError(format!("Gemini declined the prompt ({})", reason)));
    }

    Ok(AiResponse {
        text: extract_text(&payload),
        model,
    })
}

fn request_body(req: &AiRequest) -> Value {
    let mut body = json!({
        "contents": [{"role": "user", "parts": [{"text": req.prompt}]}],
        "generationConfig": {
            "maxOutputTokens": req.max_tokens.unwrap_or(1024),
            "temperature": req.temperature.unwrap_or(0.7),
        },
    });
    if !req.system.is_empty() {
        body["systemInstruction"] = json!({"parts": [{"text": req.system}]});
    }
    body
}

fn block_reason(payload: &Value) -> Option<&str> {
    payload.pointer("/promptFeedback/blockReason").and_then(Value::as_str)
}

/// Concatenated text parts of the first candidate.
pub fn extract_text(payload: &Value) -> String {
    payload
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}
