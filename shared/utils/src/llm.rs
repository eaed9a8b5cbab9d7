//! Text-completion client
//!
//! Thin adapter over an OpenAI-compatible chat-completions endpoint.
//! Every call is bounded by the configured timeout; a timeout surfaces
//! as an ordinary `ExternalService` error that callers treat as a
//! recoverable tier failure, never pipeline-fatal.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ModelConfig;
use crate::error::{EngineError, EngineResult};

/// Completion response with token accounting
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Client for model-assisted structuring, classification and
/// re-analysis calls
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_url: String,
    api_key: String,
    pub model: String,
    temperature: f32,
    input_cost_per_1k: f64,
    output_cost_per_1k: f64,
}

impl CompletionClient {
    pub fn new(config: &ModelConfig) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| EngineError::configuration(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            input_cost_per_1k: config.input_cost_per_1k,
            output_cost_per_1k: config.output_cost_per_1k,
        })
    }

    /// Submit a structuring request: a system prompt carrying the
    /// instruction template and the assembled document context as the
    /// user message.
    pub async fn structure(
        &self,
        system_prompt: &str,
        text_content: &str,
        max_tokens: u32,
    ) -> EngineResult<CompletionResponse> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                CompletionMessage { role: "system".to_string(), content: system_prompt.to_string() },
                CompletionMessage { role: "user".to_string(), content: text_content.to_string() },
            ],
            max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::external_service("completion", e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EngineError::external_service(
                "completion",
                format!("status {}: {}", status, error_text),
            ));
        }

        let result: CompletionApiResponse = response
            .json()
            .await
            .map_err(|e| EngineError::external_service("completion", e.to_string()))?;

        let text = result
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| EngineError::external_service("completion", "no response content"))?;

        let usage = result.usage.unwrap_or_default();
        Ok(CompletionResponse {
            text,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
    }

    /// Document-capable classification variant: submits the raw
    /// document payload directly, expecting a compact
    /// `{docType, year, details}` object back.
    pub async fn classify_document(&self, payload: &str) -> EngineResult<CompletionResponse> {
        self.structure(CLASSIFICATION_PROMPT, payload, 512).await
    }

    pub fn cost_usd(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 / 1000.0) * self.input_cost_per_1k
            + (output_tokens as f64 / 1000.0) * self.output_cost_per_1k
    }
}

const CLASSIFICATION_PROMPT: &str = r#"You are a financial document classifier for loan underwriting. Identify the document type from the provided document content.

Return ONLY a JSON object of this exact shape:
{"docType": "...", "year": 2023, "details": "one sentence"}

docType must be one of: form_1040, form_1120, form_1120_s, form_1065, w2, form_1099, bank_statement, profit_and_loss, balance_sheet, rent_roll, other.
Use null for year if no tax or statement year is visible."#;

// ===== Wire types =====

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<CompletionMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct CompletionMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionApiResponse {
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionChoiceMessage {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

// ===== Response recovery =====

/// Extract a JSON object from model output that may be wrapped in
/// prose or code fences. Tries a direct parse after fence-stripping,
/// then falls back to the first balanced object span. Returns `None`
/// for anything unrecoverable; callers record a validation error and
/// continue.
pub fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    let stripped = strip_code_fences(text);
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(stripped.trim()) {
        if value.is_object() {
            return Some(value);
        }
    }

    first_balanced_object(text).and_then(|span| serde_json::from_str(span).ok())
}

/// Remove a surrounding markdown code fence, if any.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the first newline
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").map(str::trim_end).unwrap_or(body)
}

/// Locate the first balanced `{...}` span, honoring string literals
/// and escapes.
fn first_balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
