//! Cross-document consistency checks
//!
//! Values that must agree across related documents in the same deal.
//! Exact agreement (within the rounding tolerance) passes; a small
//! relative drift is a warning; anything larger fails.

use uuid::Uuid;

use crestline_models::{CheckKind, CheckResult, CheckStatus, DocType};
use crestline_utils::config::VerificationConfig;
use crestline_utils::paths::get_number;

use crate::service::DealDocument;

/// Run the cross-document reconciliations over a deal's documents.
pub fn run_cross_checks(
    documents: &[DealDocument],
    config: &VerificationConfig,
) -> Vec<CheckResult> {
    let mut results = Vec::new();

    reconcile_wages(documents, config, &mut results);
    reconcile_partnership_income(documents, config, &mut results);

    results
}

/// The 1040 wage line must reconcile against the payroll-source total:
/// the sum of box 1 across every W-2 in the deal.
fn reconcile_wages(
    documents: &[DealDocument],
    config: &VerificationConfig,
    results: &mut Vec<CheckResult>,
) {
    let Some(individual) = documents.iter().find(|d| d.doc_type == DocType::Form1040) else {
        return;
    };
    let Some(reported_wages) = get_number(&individual.structured_data, "income.wages") else {
        return;
    };

    let wage_values: Vec<f64> = documents
        .iter()
        .filter(|d| d.doc_type == DocType::W2)
        .filter_map(|d| get_number(&d.structured_data, "wages.wages_tips_other_comp"))
        .collect();
    if wage_values.is_empty() {
        return;
    }
    let w2_total: f64 = wage_values.iter().sum();

    results.push(build_result(
        "wages_vs_w2_total",
        "income.wages",
        individual.document_id,
        w2_total,
        reported_wages,
        config,
    ));
}

/// Partnership distributions (1065 Schedule K) reconciled against the
/// personal return's Schedule E income.
fn reconcile_partnership_income(
    documents: &[DealDocument],
    config: &VerificationConfig,
    results: &mut Vec<CheckResult>,
) {
    let Some(individual) = documents.iter().find(|d| d.doc_type == DocType::Form1040) else {
        return;
    };
    let Some(schedule_e) = get_number(&individual.structured_data, "income.schedule_e_income")
    else {
        return;
    };

    let distribution_values: Vec<f64> = documents
        .iter()
        .filter(|d| d.doc_type == DocType::Form1065)
        .filter_map(|d| get_number(&d.structured_data, "schedule_k.ordinary_business_income"))
        .collect();
    if distribution_values.is_empty() {
        return;
    }
    let partnership_total: f64 = distribution_values.iter().sum();

    results.push(build_result(
        "schedule_e_vs_partnership_income",
        "income.schedule_e_income",
        individual.document_id,
        partnership_total,
        schedule_e,
        config,
    ));
}

fn build_result(
    name: &str,
    field_path: &str,
    document_id: Uuid,
    expected: f64,
    actual: f64,
    config: &VerificationConfig,
) -> CheckResult {
    let difference = (actual - expected).abs();
    let denominator = expected.abs().max(1.0);

    let status = if difference <= config.rounding_tolerance {
        CheckStatus::Pass
    } else if difference / denominator <= config.cross_document_warning_ratio {
        CheckStatus::Warning
    } else {
        CheckStatus::Fail
    };

    let message = match status {
        CheckStatus::Pass => String::new(),
        _ => format!(
            "{} reports {} but related documents total {}",
            field_path, actual, expected
        ),
    };

    CheckResult::pass(name, CheckKind::CrossDocument, field_path)
        .with_status(status)
        .with_values(expected, actual)
        .with_document(document_id)
        .with_message(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> VerificationConfig {
        crestline_utils::AppConfig::default().verification
    }

    fn doc(doc_type: DocType, data: serde_json::Value) -> DealDocument {
        DealDocument {
            document_id: Uuid::new_v4(),
            doc_type,
            structured_data: data,
            ocr: Default::default(),
        }
    }

    #[test]
    fn test_wages_reconcile_across_multiple_w2s() {
        let documents = vec![
            doc(DocType::Form1040, json!({"income": {"wages": 145000.0}})),
            doc(DocType::W2, json!({"wages": {"wages_tips_other_comp": 85000.0}})),
            doc(DocType::W2, json!({"wages": {"wages_tips_other_comp": 60000.0}})),
        ];
        let results = run_cross_checks(&documents, &config());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CheckStatus::Pass);
    }

    #[test]
    fn test_small_drift_is_warning_large_is_fail() {
        let warning_docs = vec![
            doc(DocType::Form1040, json!({"income": {"wages": 100500.0}})),
            doc(DocType::W2, json!({"wages": {"wages_tips_other_comp": 100000.0}})),
        ];
        let results = run_cross_checks(&warning_docs, &config());
        assert_eq!(results[0].status, CheckStatus::Warning);

        let failing_docs = vec![
            doc(DocType::Form1040, json!({"income": {"wages": 130000.0}})),
            doc(DocType::W2, json!({"wages": {"wages_tips_other_comp": 100000.0}})),
        ];
        let results = run_cross_checks(&failing_docs, &config());
        assert_eq!(results[0].status, CheckStatus::Fail);
    }

    #[test]
    fn test_partnership_income_reconciliation() {
        let documents = vec![
            doc(DocType::Form1040, json!({"income": {"schedule_e_income": 75000.0}})),
            doc(
                DocType::Form1065,
                json!({"schedule_k": {"ordinary_business_income": 75000.0}}),
            ),
        ];
        let results = run_cross_checks(&documents, &config());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CheckStatus::Pass);
        assert_eq!(results[0].name, "schedule_e_vs_partnership_income");
    }

    #[test]
    fn test_no_counterpart_documents_no_checks() {
        let documents = vec![doc(DocType::W2, json!({"wages": {"wages_tips_other_comp": 85000.0}}))];
        assert!(run_cross_checks(&documents, &config()).is_empty());
    }
}
