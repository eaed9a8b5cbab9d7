//! Verification reports
//!
//! Aggregated results of the three independent check families for a
//! deal. The overall status is the sole input to the review gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::discrepancy::CheckKind;

/// Outcome of a single check or of the whole report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Warning => write!(f, "warning"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// One executed check, tagged by originating document and field path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub check: CheckKind,
    pub status: CheckStatus,
    pub document_id: Option<Uuid>,
    pub page: Option<u32>,
    pub field_path: String,
    pub expected: Option<f64>,
    pub actual: Option<f64>,
    pub message: String,
}

impl CheckResult {
    pub fn pass(
        name: impl Into<String>,
        check: CheckKind,
        field_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            check,
            status: CheckStatus::Pass,
            document_id: None,
            page: None,
            field_path: field_path.into(),
            expected: None,
            actual: None,
            message: String::new(),
        }
    }

    pub fn with_status(mut self, status: CheckStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_values(mut self, expected: f64, actual: f64) -> Self {
        self.expected = Some(expected);
        self.actual = Some(actual);
        self
    }

    pub fn with_document(mut self, document_id: Uuid) -> Self {
        self.document_id = Some(document_id);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Aggregated verification results for one deal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub deal_id: Uuid,
    pub math_checks: Vec<CheckResult>,
    pub cross_document_checks: Vec<CheckResult>,
    pub ocr_comparisons: Vec<CheckResult>,
    pub overall_status: CheckStatus,
    pub generated_at: DateTime<Utc>,
}

impl VerificationReport {
    pub fn failing_checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.math_checks
            .iter()
            .chain(self.cross_document_checks.iter())
            .chain(self.ocr_comparisons.iter())
            .filter(|c| c.status != CheckStatus::Pass)
    }

    pub fn ocr_disagreement_count(&self) -> usize {
        self.ocr_comparisons.iter().filter(|c| c.status != CheckStatus::Pass).count()
    }
}
