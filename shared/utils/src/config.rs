use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub model: ModelConfig,
    pub verification: VerificationConfig,
    pub resolver: ResolverConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size: usize,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    pub api_url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
    /// Stamped onto every extraction so re-extraction audits are
    /// reproducible
    pub prompt_version: String,
    pub input_cost_per_1k: f64,
    pub output_cost_per_1k: f64,
}

/// Tolerances for the verification suite and resolver. These were
/// fixed constants in earlier revisions; they are configuration now so
/// deployments can tighten or loosen them without a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Absolute tolerance, in currency units, for math identities and
    /// rounding resolution
    pub rounding_tolerance: f64,
    /// Relative tolerance for rate/margin/percentage-named fields
    pub rate_relative_tolerance: f64,
    /// More OCR disagreements than this fail the deal outright
    pub ocr_disagreement_fail_threshold: usize,
    /// Relative difference under which a cross-document mismatch is a
    /// warning instead of a failure
    pub cross_document_warning_ratio: f64,
    /// Warnings accepted before the review gate stops the deal
    pub max_accepted_warnings: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Minimum OCR confidence for an alternative-label match
    pub min_alternative_label_confidence: f64,
    /// Discount applied to an alternative-label match for indirection
    pub indirection_discount: f64,
    /// Minimum model-reported confidence to accept a re-analysis value
    pub reanalysis_min_confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Start with default values
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with CRESTLINE prefix
            .add_source(Environment::with_prefix("CRESTLINE").separator("__"));

        config.build()?.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                max_request_size: 16 * 1024 * 1024, // 16MB
                timeout_seconds: 30,
            },
            ocr: OcrConfig {
                api_url: "http://localhost:9090".to_string(),
                api_key: "your-api-key".to_string(),
                timeout_seconds: 60,
            },
            model: ModelConfig {
                api_url: "https://api.openai.com/v1".to_string(),
                api_key: "your-api-key".to_string(),
                model: "gpt-4o".to_string(),
                max_tokens: 4096,
                temperature: 0.1,
                timeout_seconds: 120,
                prompt_version: "underwriting-extraction-v3".to_string(),
                input_cost_per_1k: 0.0025,
                output_cost_per_1k: 0.01,
            },
            verification: VerificationConfig {
                rounding_tolerance: 1.0,
                rate_relative_tolerance: 0.005,
                ocr_disagreement_fail_threshold: 2,
                cross_document_warning_ratio: 0.02,
                max_accepted_warnings: 3,
            },
            resolver: ResolverConfig {
                min_alternative_label_confidence: 0.8,
                indirection_discount: 0.9,
                reanalysis_min_confidence: 0.7,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
                file_path: None,
            },
        }
    }
}
