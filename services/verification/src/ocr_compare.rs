//! OCR-vs-structured comparison checks
//!
//! Re-derives each mapped numeric field from the OCR key-value pairs
//! via the same line-label mapping extraction uses, and flags
//! disagreement beyond tolerance. This catches model-introduced drift
//! from what the document actually printed.

use crestline_models::{
    line_labels_for, CheckKind, CheckResult, CheckStatus, DocType, KeyValuePair, OcrAnalysis,
};
use crestline_utils::config::VerificationConfig;
use crestline_utils::currency::parse_money;
use crestline_utils::paths::get_number;
use serde_json::Value;
use uuid::Uuid;

/// Find the OCR key-value pair carrying a labeled field, most specific
/// label first. Shared with the resolver's re-read strategy.
pub fn find_labeled_pair<'a>(
    ocr: &'a OcrAnalysis,
    labels: &[&str],
    page: Option<u32>,
) -> Option<&'a KeyValuePair> {
    for label in labels {
        let hit = ocr
            .key_value_pairs
            .iter()
            .filter(|kv| page.map_or(true, |p| kv.page == p))
            .find(|kv| kv.key.to_lowercase().contains(label));
        if hit.is_some() {
            return hit;
        }
    }
    None
}

/// Compare every labeled numeric field of a document against its OCR
/// source value.
pub fn run_ocr_comparisons(
    document_id: Uuid,
    doc_type: DocType,
    data: &Value,
    ocr: &OcrAnalysis,
    config: &VerificationConfig,
) -> Vec<CheckResult> {
    let mut results = Vec::new();

    for entry in line_labels_for(doc_type) {
        let Some(structured) = get_number(data, entry.path) else {
            continue;
        };
        let Some(pair) = find_labeled_pair(ocr, entry.labels, None) else {
            continue;
        };
        let Some(printed) = parse_money(&pair.value) else {
            continue;
        };

        let status = if (structured - printed).abs() <= config.rounding_tolerance {
            CheckStatus::Pass
        } else {
            // A single disagreement is a warning; the aggregate decides
            // when the count turns the deal into a failure.
            CheckStatus::Warning
        };

        let message = match status {
            CheckStatus::Pass => String::new(),
            _ => format!(
                "structured value {} disagrees with printed value {} ({})",
                structured, printed, pair.key
            ),
        };

        results.push(
            CheckResult::pass(format!("ocr_agreement:{}", entry.path), CheckKind::OcrComparison, entry.path)
                .with_status(status)
                .with_values(printed, structured)
                .with_document(document_id)
                .with_page(pair.page)
                .with_message(message),
        );
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> VerificationConfig {
        crestline_utils::AppConfig::default().verification
    }

    fn kv(key: &str, value: &str, page: u32) -> KeyValuePair {
        KeyValuePair { key: key.to_string(), value: value.to_string(), confidence: 0.95, page }
    }

    fn w2_ocr() -> OcrAnalysis {
        OcrAnalysis {
            raw_text: String::new(),
            page_count: 1,
            key_value_pairs: vec![
                kv("Wages, tips, other compensation", "85,000.00", 1),
                kv("Federal income tax withheld", "12,400.00", 1),
            ],
            tables: Vec::new(),
            typed_pages: Vec::new(),
        }
    }

    #[test]
    fn test_agreement_passes() {
        let data = json!({
            "wages": {"wages_tips_other_comp": 85000.0},
            "withholding": {"federal_income_tax": 12400.0}
        });
        let results = run_ocr_comparisons(Uuid::new_v4(), DocType::W2, &data, &w2_ocr(), &config());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.status == CheckStatus::Pass));
    }

    #[test]
    fn test_drift_is_flagged_with_page() {
        // The model transposed a digit that the OCR printed correctly.
        let data = json!({
            "wages": {"wages_tips_other_comp": 58000.0},
            "withholding": {"federal_income_tax": 12400.0}
        });
        let results = run_ocr_comparisons(Uuid::new_v4(), DocType::W2, &data, &w2_ocr(), &config());
        let flagged: Vec<_> = results.iter().filter(|r| r.status != CheckStatus::Pass).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].field_path, "wages.wages_tips_other_comp");
        assert_eq!(flagged[0].page, Some(1));
        assert_eq!(flagged[0].expected, Some(85000.0));
    }

    #[test]
    fn test_unlabeled_or_missing_fields_skipped() {
        let data = json!({"wages": {"social_security_tips": 1000.0}});
        let results = run_ocr_comparisons(Uuid::new_v4(), DocType::W2, &data, &w2_ocr(), &config());
        assert!(results.is_empty());
    }

    #[test]
    fn test_most_specific_label_wins() {
        let ocr = OcrAnalysis {
            key_value_pairs: vec![
                kv("Box 1 notes", "ignored", 1),
                kv("Wages, tips, other compensation", "85,000.00", 1),
            ],
            page_count: 1,
            ..Default::default()
        };
        let pair =
            find_labeled_pair(&ocr, &["wages, tips, other compensation", "box 1"], None).unwrap();
        assert_eq!(pair.value, "85,000.00");
    }
}
