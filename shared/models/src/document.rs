//! Document records and the processing-stage state machine
//!
//! A document moves through a monotonic sequence of stages. Every stage
//! transition is validated; re-applying the current stage is a no-op so
//! an at-least-once external executor can safely retry any stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::doc_type::DocType;

/// Processing stages for an uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    /// Document registered with its OCR output attached
    Uploaded,
    /// Document type and year determined
    Classified,
    /// Structured data extracted and schema-validated
    Extracted,
    /// Verification suite completed for the enclosing deal
    Verified,
    /// Unrecoverable failure; no usable extraction exists
    Error,
}

impl ProcessingStage {
    /// Check if advancing to `target` is valid. Re-applying the current
    /// stage is allowed (idempotent retry), moving backwards is not.
    pub fn can_advance_to(&self, target: ProcessingStage) -> bool {
        use ProcessingStage::*;

        if *self == target {
            return !self.is_terminal();
        }

        match (self, target) {
            (Uploaded, Classified) => true,
            (Uploaded, Error) => true,

            (Classified, Extracted) => true,
            (Classified, Error) => true,

            (Extracted, Verified) => true,
            (Extracted, Error) => true,

            // Terminal stages cannot transition
            (Verified, _) => false,
            (Error, _) => false,

            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStage::Verified | ProcessingStage::Error)
    }

    /// Position in the monotonic stage order. `Error` sits outside the
    /// happy path and has no rank.
    fn rank(&self) -> Option<u8> {
        match self {
            ProcessingStage::Uploaded => Some(0),
            ProcessingStage::Classified => Some(1),
            ProcessingStage::Extracted => Some(2),
            ProcessingStage::Verified => Some(3),
            ProcessingStage::Error => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "uploaded" => Some(Self::Uploaded),
            "classified" => Some(Self::Classified),
            "extracted" => Some(Self::Extracted),
            "verified" => Some(Self::Verified),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uploaded => write!(f, "uploaded"),
            Self::Classified => write!(f, "classified"),
            Self::Extracted => write!(f, "extracted"),
            Self::Verified => write!(f, "verified"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One uploaded document inside a deal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub file_name: String,
    /// Reference into the OCR adapter's store
    pub ocr_ref: String,
    pub doc_type: Option<DocType>,
    pub detected_year: Option<i32>,
    pub stage: ProcessingStage,
    pub stage_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn new(deal_id: Uuid, file_name: impl Into<String>, ocr_ref: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            deal_id,
            file_name: file_name.into(),
            ocr_ref: ocr_ref.into(),
            doc_type: None,
            detected_year: None,
            stage: ProcessingStage::Uploaded,
            stage_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance the stage, enforcing monotonicity. Advancing to the
    /// current stage, or to a stage already passed, leaves the record
    /// untouched so a retried stage write is a no-op.
    pub fn advance_to(&mut self, target: ProcessingStage) -> Result<(), String> {
        if self.stage == target {
            return Ok(());
        }
        if let (Some(current), Some(next)) = (self.stage.rank(), target.rank()) {
            if current >= next {
                return Ok(());
            }
        }
        if !self.stage.can_advance_to(target) {
            return Err(format!(
                "invalid stage transition from {} to {}",
                self.stage, target
            ));
        }
        self.stage = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// A document with no successful extraction blocks downstream
    /// analysis.
    pub fn blocks_analysis(&self) -> bool {
        matches!(self.stage, ProcessingStage::Uploaded | ProcessingStage::Classified)
            || self.stage == ProcessingStage::Error
    }
}
