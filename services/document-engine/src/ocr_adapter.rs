//! OCR adapter client
//!
//! The OCR engine is an external collaborator; this client fetches its
//! analysis output for a stored document reference. The richer variant
//! adds typed fields for the standardized-form subset.

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crestline_models::OcrAnalysis;
use crestline_utils::config::OcrConfig;
use crestline_utils::{EngineError, EngineResult};

#[derive(Clone)]
pub struct OcrClient {
    client: Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    document_ref: &'a str,
}

impl OcrClient {
    pub fn new(config: &OcrConfig) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| EngineError::configuration(e.to_string()))?;

        Ok(Self { client, api_url: config.api_url.clone(), api_key: config.api_key.clone() })
    }

    /// Fetch raw text, key-value pairs and tables for a document.
    pub async fn analyze(&self, document_ref: &str) -> EngineResult<OcrAnalysis> {
        self.post("analyze", document_ref).await
    }

    /// Richer variant: includes per-page typed fields when the
    /// document belongs to a known standardized-form family.
    pub async fn analyze_typed(&self, document_ref: &str) -> EngineResult<OcrAnalysis> {
        self.post("analyze-typed", document_ref).await
    }

    async fn post(&self, endpoint: &str, document_ref: &str) -> EngineResult<OcrAnalysis> {
        let response = self
            .client
            .post(format!("{}/{}", self.api_url, endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&AnalyzeRequest { document_ref })
            .send()
            .await
            .map_err(|e| EngineError::external_service("ocr", e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EngineError::external_service(
                "ocr",
                format!("status {}: {}", status, error_text),
            ));
        }

        response.json().await.map_err(|e| EngineError::external_service("ocr", e.to_string()))
    }
}
