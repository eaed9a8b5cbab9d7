//! Discrepancies and resolution results
//!
//! A discrepancy is the expected steady state of disagreement between
//! an extracted value and an independently derived reference, modeled
//! as a first-class record rather than an error. Resolution produces
//! exactly one terminal `ResolutionResult` per attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which check family flagged the discrepancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Intra-document arithmetic identity
    Math,
    /// Agreement across related documents in the same deal
    CrossDocument,
    /// Structured value vs what the OCR actually printed
    OcrComparison,
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Math => write!(f, "math"),
            Self::CrossDocument => write!(f, "cross_document"),
            Self::OcrComparison => write!(f, "ocr_comparison"),
        }
    }
}

/// A flagged disagreement on one field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discrepancy {
    pub id: Uuid,
    pub document_id: Uuid,
    pub page: Option<u32>,
    pub field_path: String,
    pub extracted_value: String,
    pub expected_value: Option<String>,
    pub check: CheckKind,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Discrepancy {
    pub fn new(
        document_id: Uuid,
        field_path: impl Into<String>,
        extracted_value: impl Into<String>,
        expected_value: Option<String>,
        check: CheckKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            page: None,
            field_path: field_path.into(),
            extracted_value: extracted_value.into(),
            expected_value,
            check,
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    pub fn on_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// Resolution strategies in strictly increasing cost order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    FormatNormalization,
    RoundingTolerance,
    OcrReRead,
    OcrAlternativeLabel,
    ModelReAnalysis,
    BatchedModelReAnalysis,
}

impl ResolutionMethod {
    /// Tier index; lower tiers must always be attempted first.
    pub fn tier(&self) -> u8 {
        match self {
            Self::FormatNormalization => 1,
            Self::RoundingTolerance => 2,
            Self::OcrReRead => 3,
            Self::OcrAlternativeLabel => 4,
            Self::ModelReAnalysis => 5,
            Self::BatchedModelReAnalysis => 6,
        }
    }
}

impl std::fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FormatNormalization => write!(f, "format_normalization"),
            Self::RoundingTolerance => write!(f, "rounding_tolerance"),
            Self::OcrReRead => write!(f, "ocr_re_read"),
            Self::OcrAlternativeLabel => write!(f, "ocr_alternative_label"),
            Self::ModelReAnalysis => write!(f, "model_re_analysis"),
            Self::BatchedModelReAnalysis => write!(f, "batched_model_re_analysis"),
        }
    }
}

/// Terminal outcome of one resolution attempt. Callers must handle
/// both branches explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolutionResult {
    Resolved {
        value: String,
        confidence: f64,
        method: ResolutionMethod,
        explanation: String,
    },
    Unresolved {
        reason: String,
        attempted_methods: Vec<ResolutionMethod>,
    },
}

impl ResolutionResult {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionResult::Resolved { .. })
    }

    pub fn method(&self) -> Option<ResolutionMethod> {
        match self {
            ResolutionResult::Resolved { method, .. } => Some(*method),
            ResolutionResult::Unresolved { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering_is_strict() {
        let methods = [
            ResolutionMethod::FormatNormalization,
            ResolutionMethod::RoundingTolerance,
            ResolutionMethod::OcrReRead,
            ResolutionMethod::OcrAlternativeLabel,
            ResolutionMethod::ModelReAnalysis,
            ResolutionMethod::BatchedModelReAnalysis,
        ];
        for pair in methods.windows(2) {
            assert!(pair[0].tier() < pair[1].tier());
        }
    }

    #[test]
    fn test_resolution_result_tags() {
        let resolved = ResolutionResult::Resolved {
            value: "85000".to_string(),
            confidence: 0.99,
            method: ResolutionMethod::FormatNormalization,
            explanation: "values match after stripping formatting".to_string(),
        };
        assert!(resolved.is_resolved());
        assert_eq!(resolved.method(), Some(ResolutionMethod::FormatNormalization));

        let unresolved = ResolutionResult::Unresolved {
            reason: "all strategies exhausted".to_string(),
            attempted_methods: vec![ResolutionMethod::FormatNormalization],
        };
        assert!(!unresolved.is_resolved());
        assert_eq!(unresolved.method(), None);
    }
}
