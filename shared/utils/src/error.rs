use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum EngineError {
    #[error("Classification error: {message}")]
    Classification { message: String },

    #[error("Extraction error: {message}")]
    Extraction { message: String },

    #[error("Schema validation error: {path} - {message}")]
    SchemaValidation { path: String, message: String },

    #[error("Verification error: {message}")]
    Verification { message: String },

    #[error("Resolution error: {message}")]
    Resolution { message: String },

    #[error("No schema or prompt template registered for document type: {doc_type}")]
    UnsupportedDocumentType { doc_type: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EngineError {
    pub fn classification(message: impl Into<String>) -> Self {
        Self::Classification { message: message.into() }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction { message: message.into() }
    }

    pub fn schema_validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaValidation { path: path.into(), message: message.into() }
    }

    pub fn verification(message: impl Into<String>) -> Self {
        Self::Verification { message: message.into() }
    }

    pub fn resolution(message: impl Into<String>) -> Self {
        Self::Resolution { message: message.into() }
    }

    pub fn unsupported_document_type(doc_type: impl Into<String>) -> Self {
        Self::UnsupportedDocumentType { doc_type: doc_type.into() }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalService { service: service.into(), message: message.into() }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Classification { .. } => "CLASSIFICATION_ERROR",
            Self::Extraction { .. } => "EXTRACTION_ERROR",
            Self::SchemaValidation { .. } => "SCHEMA_VALIDATION_ERROR",
            Self::Verification { .. } => "VERIFICATION_ERROR",
            Self::Resolution { .. } => "RESOLUTION_ERROR",
            Self::UnsupportedDocumentType { .. } => "UNSUPPORTED_DOCUMENT_TYPE",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Classification { .. } => 422,
            Self::Extraction { .. } => 422,
            Self::SchemaValidation { .. } => 422,
            Self::Verification { .. } => 422,
            Self::Resolution { .. } => 422,
            Self::UnsupportedDocumentType { .. } => 400,
            Self::Validation { .. } => 400,
            Self::Configuration { .. } => 500,
            Self::ExternalService { .. } => 502,
            Self::NotFound { .. } => 404,
            Self::Internal { .. } => 500,
        }
    }

    /// Transient failures are recoverable by falling through to the
    /// next tier or strategy; they never abort a pipeline run.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ExternalService { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
}

impl From<EngineError> for ErrorResponse {
    fn from(error: EngineError) -> Self {
        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

// Conversion from common error types
impl From<reqwest::Error> for EngineError {
    fn from(error: reqwest::Error) -> Self {
        Self::external_service("HTTP Client", error.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(error: serde_json::Error) -> Self {
        Self::validation("JSON", error.to_string())
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}
