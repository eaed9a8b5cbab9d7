//! Human-review items
//!
//! A review item is created only after the resolver has exhausted every
//! strategy; it carries the full attempted-method trail so a reviewer
//! sees exactly what the system already tried.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::discrepancy::{CheckKind, Discrepancy, ResolutionMethod};

/// Review item lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    /// Reviewer confirmed the extracted value as printed
    Confirmed,
    /// Reviewer supplied a corrected value
    Corrected,
}

impl ReviewStatus {
    pub fn can_transition_to(&self, target: ReviewStatus) -> bool {
        matches!(
            (self, target),
            (ReviewStatus::Pending, ReviewStatus::Confirmed)
                | (ReviewStatus::Pending, ReviewStatus::Corrected)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReviewStatus::Confirmed | ReviewStatus::Corrected)
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Corrected => write!(f, "corrected"),
        }
    }
}

/// Persisted, human-actionable record of an unresolved discrepancy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewItem {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub document_id: Uuid,
    pub page: Option<u32>,
    pub field_path: String,
    pub extracted_value: String,
    pub expected_value: Option<String>,
    pub check: CheckKind,
    pub reason: String,
    pub attempted_methods: Vec<ResolutionMethod>,
    pub status: ReviewStatus,
    pub corrected_value: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ReviewItem {
    pub fn from_discrepancy(
        deal_id: Uuid,
        discrepancy: &Discrepancy,
        reason: impl Into<String>,
        attempted_methods: Vec<ResolutionMethod>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            deal_id,
            document_id: discrepancy.document_id,
            page: discrepancy.page,
            field_path: discrepancy.field_path.clone(),
            extracted_value: discrepancy.extracted_value.clone(),
            expected_value: discrepancy.expected_value.clone(),
            check: discrepancy.check,
            reason: reason.into(),
            attempted_methods,
            status: ReviewStatus::Pending,
            corrected_value: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn confirm(&mut self) -> Result<(), String> {
        self.transition(ReviewStatus::Confirmed)?;
        Ok(())
    }

    pub fn correct(&mut self, value: impl Into<String>) -> Result<(), String> {
        self.transition(ReviewStatus::Corrected)?;
        self.corrected_value = Some(value.into());
        Ok(())
    }

    fn transition(&mut self, target: ReviewStatus) -> Result<(), String> {
        if !self.status.can_transition_to(target) {
            return Err(format!("invalid review transition from {} to {}", self.status, target));
        }
        self.status = target;
        self.resolved_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> ReviewItem {
        let discrepancy = Discrepancy::new(
            Uuid::new_v4(),
            "assets.total_assets",
            "510000",
            Some("512000".to_string()),
            CheckKind::Math,
            "total assets do not equal liabilities plus equity",
        );
        ReviewItem::from_discrepancy(
            Uuid::new_v4(),
            &discrepancy,
            "all resolution strategies exhausted",
            vec![ResolutionMethod::FormatNormalization, ResolutionMethod::RoundingTolerance],
        )
    }

    #[test]
    fn test_pending_to_confirmed() {
        let mut item = sample_item();
        assert_eq!(item.status, ReviewStatus::Pending);
        item.confirm().unwrap();
        assert_eq!(item.status, ReviewStatus::Confirmed);
        assert!(item.resolved_at.is_some());
    }

    #[test]
    fn test_pending_to_corrected_stores_value() {
        let mut item = sample_item();
        item.correct("512000").unwrap();
        assert_eq!(item.status, ReviewStatus::Corrected);
        assert_eq!(item.corrected_value.as_deref(), Some("512000"));
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let mut item = sample_item();
        item.confirm().unwrap();
        assert!(item.correct("1").is_err());
    }
}
