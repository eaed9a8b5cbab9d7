//! Verification service
//!
//! Holds the per-deal state: submitted documents, the latest report,
//! resolution outcomes, review items and the audit log. Reports and
//! review items follow delete-then-recreate semantics so a retried
//! pass never duplicates records.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crestline_models::{
    CheckStatus, Discrepancy, DocType, OcrAnalysis, ResolutionResult, ReviewItem, ReviewStatus,
    VerificationReport,
};
use crestline_utils::config::VerificationConfig;
use crestline_utils::currency::parse_money;
use crestline_utils::llm::CompletionClient;
use crestline_utils::paths::set_path;
use crestline_utils::{AppConfig, EngineError, EngineResult};

use crate::audit::{AuditAction, AuditLog};
use crate::resolver::Resolver;
use crate::review_gate;
use crate::suite;

/// One document of a deal as submitted for verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealDocument {
    pub document_id: Uuid,
    pub doc_type: DocType,
    pub structured_data: serde_json::Value,
    #[serde(default)]
    pub ocr: OcrAnalysis,
}

/// A deal's documents, jointly verified for cross-document consistency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealSubmission {
    pub deal_id: Uuid,
    pub documents: Vec<DealDocument>,
}

/// Summary of one resolution attempt in a pass
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionSummary {
    pub discrepancy_id: Uuid,
    pub document_id: Uuid,
    pub field_path: String,
    pub result: ResolutionResult,
}

/// Outcome of a full resolution pass over a deal
#[derive(Debug, Serialize)]
pub struct ResolvePassOutcome {
    pub deal_id: Uuid,
    pub report: VerificationReport,
    pub resolutions: Vec<ResolutionSummary>,
    pub review_items: Vec<ReviewItem>,
    pub can_proceed: bool,
}

#[derive(Clone)]
pub struct VerificationService {
    deals: Arc<RwLock<HashMap<Uuid, DealSubmission>>>,
    reports: Arc<RwLock<HashMap<Uuid, VerificationReport>>>,
    review_items: Arc<RwLock<HashMap<Uuid, ReviewItem>>>,
    /// Paths a reviewer confirmed as printed; excluded from gate
    /// re-evaluation
    accepted_paths: Arc<RwLock<HashMap<Uuid, HashSet<(Uuid, String)>>>>,
    audit: AuditLog,
    resolver: Arc<Resolver>,
    config: VerificationConfig,
}

impl VerificationService {
    pub fn new(config: &AppConfig) -> EngineResult<Self> {
        let client = Arc::new(CompletionClient::new(&config.model)?);
        Ok(Self {
            deals: Arc::new(RwLock::new(HashMap::new())),
            reports: Arc::new(RwLock::new(HashMap::new())),
            review_items: Arc::new(RwLock::new(HashMap::new())),
            accepted_paths: Arc::new(RwLock::new(HashMap::new())),
            audit: AuditLog::new(),
            resolver: Arc::new(Resolver::new(
                client,
                config.resolver.clone(),
                config.verification.clone(),
            )),
            config: config.verification.clone(),
        })
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Store a deal submission and run the suite. Replaces any prior
    /// report for the deal.
    pub async fn submit_and_verify(&self, submission: DealSubmission) -> VerificationReport {
        let deal_id = submission.deal_id;
        let report = suite::run_suite(deal_id, &submission.documents, &self.config);

        self.deals.write().await.insert(deal_id, submission);
        self.reports.write().await.insert(deal_id, report.clone());

        self.audit
            .record(
                AuditAction::Verify,
                "deal",
                deal_id,
                json!({
                    "overall_status": report.overall_status.to_string(),
                    "math_checks": report.math_checks.len(),
                    "cross_document_checks": report.cross_document_checks.len(),
                    "ocr_comparisons": report.ocr_comparisons.len(),
                }),
            )
            .await;

        info!(deal_id = %deal_id, status = %report.overall_status, "deal verified");
        report
    }

    pub async fn report_for(&self, deal_id: Uuid) -> Option<VerificationReport> {
        self.reports.read().await.get(&deal_id).cloned()
    }

    /// Run the resolver over every open discrepancy, apply resolved
    /// values, re-run the suite and evaluate the gate. Unresolved
    /// discrepancies become pending review items.
    pub async fn resolve_pass(&self, deal_id: Uuid) -> EngineResult<ResolvePassOutcome> {
        let submission = self
            .deals
            .read()
            .await
            .get(&deal_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(format!("deal {}", deal_id)))?;

        let report = suite::run_suite(deal_id, &submission.documents, &self.config);
        let discrepancies = suite::discrepancies_from(&report);

        for discrepancy in &discrepancies {
            self.audit
                .record(
                    AuditAction::Flag,
                    "discrepancy",
                    discrepancy.id,
                    json!({
                        "document_id": discrepancy.document_id,
                        "field_path": discrepancy.field_path,
                        "check": discrepancy.check.to_string(),
                        "extracted": discrepancy.extracted_value,
                        "expected": discrepancy.expected_value,
                    }),
                )
                .await;
        }

        // Group discrepancies by document; distinct discrepancies need
        // no coordination.
        let mut by_document: HashMap<Uuid, Vec<Discrepancy>> = HashMap::new();
        for discrepancy in discrepancies {
            by_document.entry(discrepancy.document_id).or_default().push(discrepancy);
        }

        let mut updated = submission.clone();
        let mut summaries = Vec::new();
        let mut unresolved: Vec<(Discrepancy, String, Vec<crestline_models::ResolutionMethod>)> =
            Vec::new();

        for (document_id, document_discrepancies) in by_document {
            let Some(document) = updated.documents.iter_mut().find(|d| d.document_id == document_id)
            else {
                continue;
            };

            let results = self
                .resolver
                .resolve_all(document.doc_type, &document.ocr, &document_discrepancies)
                .await;

            for (discrepancy_id, result) in results {
                let Some(discrepancy) =
                    document_discrepancies.iter().find(|d| d.id == discrepancy_id)
                else {
                    continue;
                };

                match &result {
                    ResolutionResult::Resolved { value, confidence, method, explanation } => {
                        // Write the resolved value back so the re-run
                        // suite sees the closed discrepancy.
                        let leaf = match parse_money(value) {
                            Some(v) if v.fract() == 0.0 => json!(v as i64),
                            Some(v) => json!(v),
                            None => json!(value),
                        };
                        set_path(&mut document.structured_data, &discrepancy.field_path, leaf);

                        self.audit
                            .record(
                                AuditAction::Resolve,
                                "discrepancy",
                                discrepancy.id,
                                json!({
                                    "field_path": discrepancy.field_path,
                                    "method": method.to_string(),
                                    "value": value,
                                    "confidence": confidence,
                                    "explanation": explanation,
                                }),
                            )
                            .await;
                    }
                    ResolutionResult::Unresolved { reason, attempted_methods } => {
                        self.audit
                            .record(
                                AuditAction::Escalate,
                                "discrepancy",
                                discrepancy.id,
                                json!({
                                    "field_path": discrepancy.field_path,
                                    "reason": reason,
                                    "attempted_methods": attempted_methods
                                        .iter()
                                        .map(|m| m.to_string())
                                        .collect::<Vec<_>>(),
                                }),
                            )
                            .await;
                        unresolved.push((
                            discrepancy.clone(),
                            reason.clone(),
                            attempted_methods.clone(),
                        ));
                    }
                }

                summaries.push(ResolutionSummary {
                    discrepancy_id,
                    document_id,
                    field_path: discrepancy.field_path.clone(),
                    result,
                });
            }
        }

        // Persist the updated data and the post-resolution report.
        self.deals.write().await.insert(deal_id, updated.clone());
        let final_report = self.gated_report(deal_id, &updated).await;
        self.reports.write().await.insert(deal_id, final_report.clone());

        // Delete-then-recreate pending review items for this deal;
        // human-actioned items survive.
        {
            let mut items = self.review_items.write().await;
            items.retain(|_, item| item.deal_id != deal_id || item.status != ReviewStatus::Pending);
        }
        let mut created_items = Vec::new();
        for (discrepancy, reason, attempted) in unresolved {
            let item = ReviewItem::from_discrepancy(deal_id, &discrepancy, reason, attempted);
            self.review_items.write().await.insert(item.id, item.clone());
            created_items.push(item);
        }

        let decision = review_gate::evaluate(&final_report, &self.config);
        self.audit
            .record(
                AuditAction::GateDecision,
                "deal",
                deal_id,
                json!({
                    "can_proceed": decision.can_proceed,
                    "overall_status": final_report.overall_status.to_string(),
                    "offending_checks": decision.offending_checks.len(),
                }),
            )
            .await;

        info!(
            deal_id = %deal_id,
            resolutions = summaries.len(),
            review_items = created_items.len(),
            can_proceed = decision.can_proceed,
            "resolution pass complete"
        );

        Ok(ResolvePassOutcome {
            deal_id,
            can_proceed: decision.can_proceed,
            report: final_report,
            resolutions: summaries,
            review_items: created_items,
        })
    }

    pub async fn review_items_for(&self, deal_id: Uuid) -> Vec<ReviewItem> {
        self.review_items
            .read()
            .await
            .values()
            .filter(|item| item.deal_id == deal_id)
            .cloned()
            .collect()
    }

    /// Reviewer confirms the extracted value as printed; the check is
    /// accepted and the gate re-evaluated.
    pub async fn confirm_review_item(&self, item_id: Uuid) -> EngineResult<(ReviewItem, bool)> {
        let item = {
            let mut items = self.review_items.write().await;
            let item = items
                .get_mut(&item_id)
                .ok_or_else(|| EngineError::not_found(format!("review item {}", item_id)))?;
            item.confirm().map_err(EngineError::internal)?;
            item.clone()
        };

        self.accepted_paths
            .write()
            .await
            .entry(item.deal_id)
            .or_default()
            .insert((item.document_id, item.field_path.clone()));

        self.audit
            .record(
                AuditAction::ReviewConfirmed,
                "review_item",
                item.id,
                json!({"field_path": item.field_path, "value": item.extracted_value}),
            )
            .await;

        let can_proceed = self.reevaluate(item.deal_id).await?;
        Ok((item, can_proceed))
    }

    /// Reviewer supplies a corrected value; the data is updated and
    /// the gate re-evaluated with the same policy.
    pub async fn correct_review_item(
        &self,
        item_id: Uuid,
        value: &str,
    ) -> EngineResult<(ReviewItem, bool)> {
        let item = {
            let mut items = self.review_items.write().await;
            let item = items
                .get_mut(&item_id)
                .ok_or_else(|| EngineError::not_found(format!("review item {}", item_id)))?;
            item.correct(value).map_err(EngineError::internal)?;
            item.clone()
        };

        {
            let mut deals = self.deals.write().await;
            if let Some(submission) = deals.get_mut(&item.deal_id) {
                if let Some(document) =
                    submission.documents.iter_mut().find(|d| d.document_id == item.document_id)
                {
                    let leaf = match parse_money(value) {
                        Some(v) if v.fract() == 0.0 => json!(v as i64),
                        Some(v) => json!(v),
                        None => json!(value),
                    };
                    set_path(&mut document.structured_data, &item.field_path, leaf);
                }
            }
        }

        self.audit
            .record(
                AuditAction::ReviewCorrected,
                "review_item",
                item.id,
                json!({"field_path": item.field_path, "corrected_value": value}),
            )
            .await;

        let can_proceed = self.reevaluate(item.deal_id).await?;
        Ok((item, can_proceed))
    }

    async fn reevaluate(&self, deal_id: Uuid) -> EngineResult<bool> {
        let submission = self
            .deals
            .read()
            .await
            .get(&deal_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(format!("deal {}", deal_id)))?;

        let report = self.gated_report(deal_id, &submission).await;
        let can_proceed = review_gate::evaluate(&report, &self.config).can_proceed;
        self.reports.write().await.insert(deal_id, report);

        self.audit
            .record(
                AuditAction::GateDecision,
                "deal",
                deal_id,
                json!({"can_proceed": can_proceed, "after": "human_review"}),
            )
            .await;

        Ok(can_proceed)
    }

    /// Re-run the suite, then drop checks a reviewer has explicitly
    /// accepted and re-aggregate.
    async fn gated_report(&self, deal_id: Uuid, submission: &DealSubmission) -> VerificationReport {
        let mut report = suite::run_suite(deal_id, &submission.documents, &self.config);

        let accepted = self.accepted_paths.read().await.get(&deal_id).cloned();
        if let Some(accepted) = accepted {
            let keep = |check: &crestline_models::CheckResult| {
                !check
                    .document_id
                    .map(|doc| accepted.contains(&(doc, check.field_path.clone())))
                    .unwrap_or(false)
                    || check.status == CheckStatus::Pass
            };
            report.math_checks.retain(&keep);
            report.cross_document_checks.retain(&keep);
            report.ocr_comparisons.retain(&keep);
            report.overall_status = suite::aggregate_status(
                &report.math_checks,
                &report.cross_document_checks,
                &report.ocr_comparisons,
                &self.config,
            );
        }
        report
    }
}
