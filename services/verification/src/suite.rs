//! Verification suite
//!
//! Runs the three independent check families over a deal and
//! aggregates them into one overall status, the sole input to the
//! review gate.

use chrono::Utc;
use uuid::Uuid;

use crestline_models::{CheckResult, CheckStatus, Discrepancy, VerificationReport};
use crestline_utils::config::VerificationConfig;

use crate::cross_checks::run_cross_checks;
use crate::math_checks::run_math_checks;
use crate::ocr_compare::run_ocr_comparisons;
use crate::service::DealDocument;

/// Run the full suite for one deal.
pub fn run_suite(
    deal_id: Uuid,
    documents: &[DealDocument],
    config: &VerificationConfig,
) -> VerificationReport {
    let mut math_checks = Vec::new();
    let mut ocr_comparisons = Vec::new();

    for document in documents {
        math_checks.extend(run_math_checks(
            document.document_id,
            document.doc_type,
            &document.structured_data,
            config,
        ));
        ocr_comparisons.extend(run_ocr_comparisons(
            document.document_id,
            document.doc_type,
            &document.structured_data,
            &document.ocr,
            config,
        ));
    }

    let cross_document_checks = run_cross_checks(documents, config);

    let overall_status =
        aggregate_status(&math_checks, &cross_document_checks, &ocr_comparisons, config);

    VerificationReport {
        deal_id,
        math_checks,
        cross_document_checks,
        ocr_comparisons,
        overall_status,
        generated_at: Utc::now(),
    }
}

/// Aggregation rule: any math or cross-document failure, or more OCR
/// disagreements than the threshold, fails the deal; any
/// cross-document warning or OCR disagreement below the threshold is a
/// warning; otherwise pass.
pub fn aggregate_status(
    math: &[CheckResult],
    cross: &[CheckResult],
    ocr: &[CheckResult],
    config: &VerificationConfig,
) -> CheckStatus {
    let hard_failure = math.iter().chain(cross.iter()).any(|c| c.status == CheckStatus::Fail);
    let ocr_disagreements = ocr.iter().filter(|c| c.status != CheckStatus::Pass).count();

    if hard_failure || ocr_disagreements > config.ocr_disagreement_fail_threshold {
        return CheckStatus::Fail;
    }

    let has_warning = math
        .iter()
        .chain(cross.iter())
        .any(|c| c.status == CheckStatus::Warning)
        || ocr_disagreements > 0;

    if has_warning {
        CheckStatus::Warning
    } else {
        CheckStatus::Pass
    }
}

/// Turn every non-passing check into a discrepancy record for the
/// resolver. The check's independently derived value is the reference.
pub fn discrepancies_from(report: &VerificationReport) -> Vec<Discrepancy> {
    report
        .failing_checks()
        .filter_map(|check| {
            let document_id = check.document_id?;
            let mut discrepancy = Discrepancy::new(
                document_id,
                check.field_path.clone(),
                check.actual.map(format_amount).unwrap_or_default(),
                check.expected.map(format_amount),
                check.check,
                if check.message.is_empty() {
                    check.name.clone()
                } else {
                    check.message.clone()
                },
            );
            if let Some(page) = check.page {
                discrepancy = discrepancy.on_page(page);
            }
            Some(discrepancy)
        })
        .collect()
}

fn format_amount(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
