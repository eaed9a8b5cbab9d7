//! Extraction records
//!
//! One live extraction per document. Prior records are replaced, never
//! accumulated; every extraction carries the prompt/schema version and
//! usage metrics so a re-extraction audit is reproducible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the structured data was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Static field-token dictionary over richly-typed OCR output
    Deterministic,
    /// Model-assisted structuring chosen up front for the type
    ModelPrimary,
    /// Model-assisted structuring after a deterministic miss
    ModelFallback,
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deterministic => write!(f, "deterministic"),
            Self::ModelPrimary => write!(f, "model_primary"),
            Self::ModelFallback => write!(f, "model_fallback"),
        }
    }
}

/// Path-level schema validation error. Data is never discarded on
/// validation failure; errors ride alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

/// Token and cost accounting for model-backed calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageMetrics {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
}

impl UsageMetrics {
    pub fn add(&mut self, other: &UsageMetrics) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cost_usd += other.cost_usd;
    }
}

/// The per-document extraction output contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub id: Uuid,
    pub document_id: Uuid,
    pub method: ExtractionMethod,
    /// Canonical structured tree; every schema key present, null if
    /// unknown
    pub structured_data: serde_json::Value,
    pub validation_errors: Vec<ValidationError>,
    /// Raw model response, absent for deterministic extractions
    pub raw_response: Option<String>,
    pub prompt_version: String,
    pub model: Option<String>,
    pub usage: UsageMetrics,
    pub created_at: DateTime<Utc>,
}

impl ExtractionRecord {
    pub fn new(
        document_id: Uuid,
        method: ExtractionMethod,
        structured_data: serde_json::Value,
        prompt_version: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            method,
            structured_data,
            validation_errors: Vec::new(),
            raw_response: None,
            prompt_version: prompt_version.into(),
            model: None,
            usage: UsageMetrics::default(),
            created_at: Utc::now(),
        }
    }

    pub fn is_usable(&self) -> bool {
        self.structured_data.as_object().map(|o| !o.is_empty()).unwrap_or(false)
    }
}
