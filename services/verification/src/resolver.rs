//! Discrepancy resolver
//!
//! Six strategies in strictly increasing cost order, stopping at the
//! first success and recording every attempted method regardless of
//! outcome. The four cheap tiers are synchronous and side-effect-free;
//! only the model-backed tiers suspend, and a timeout there is an
//! ordinary failure, never pipeline-fatal. No strategy invents a
//! value.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crestline_models::{
    labels_for_path, Discrepancy, DocType, OcrAnalysis, ResolutionMethod, ResolutionResult,
};
use crestline_utils::config::{ResolverConfig, VerificationConfig};
use crestline_utils::currency::{parse_money, values_match};
use crestline_utils::llm::{extract_json_object, CompletionClient};

use crate::ocr_compare::find_labeled_pair;

pub struct Resolver {
    client: Arc<CompletionClient>,
    config: ResolverConfig,
    verification: VerificationConfig,
}

impl Resolver {
    pub fn new(
        client: Arc<CompletionClient>,
        config: ResolverConfig,
        verification: VerificationConfig,
    ) -> Self {
        Self { client, config, verification }
    }

    /// Resolve a document's discrepancies. Cheap tiers run per item;
    /// what survives them is grouped by page so that several
    /// discrepancies on one page cost a single model round-trip.
    pub async fn resolve_all(
        &self,
        doc_type: DocType,
        ocr: &OcrAnalysis,
        discrepancies: &[Discrepancy],
    ) -> Vec<(Uuid, ResolutionResult)> {
        let mut results: Vec<(Uuid, ResolutionResult)> = Vec::new();
        let mut pending: Vec<(&Discrepancy, Vec<ResolutionMethod>)> = Vec::new();

        for discrepancy in discrepancies {
            let mut attempted = Vec::new();
            match self.cheap_pass(doc_type, ocr, discrepancy, &mut attempted) {
                Some(resolution) => results.push((discrepancy.id, resolution)),
                None => pending.push((discrepancy, attempted)),
            }
        }

        // Group the survivors by page; singletons get a targeted
        // re-analysis, groups share one batched request.
        let mut by_page: BTreeMap<Option<u32>, Vec<(&Discrepancy, Vec<ResolutionMethod>)>> =
            BTreeMap::new();
        for (discrepancy, attempted) in pending {
            by_page.entry(discrepancy.page).or_default().push((discrepancy, attempted));
        }

        for (page, mut group) in by_page {
            if group.len() == 1 {
                let (discrepancy, mut attempted) = group.remove(0);
                attempted.push(ResolutionMethod::ModelReAnalysis);
                let resolution = match self.targeted_reanalysis(ocr, discrepancy).await {
                    Some(resolution) => resolution,
                    None => unresolved(&attempted),
                };
                results.push((discrepancy.id, resolution));
            } else {
                let resolved = self.batched_reanalysis(ocr, page, &group).await;
                for (index, (discrepancy, mut attempted)) in group.into_iter().enumerate() {
                    attempted.push(ResolutionMethod::BatchedModelReAnalysis);
                    let resolution = match resolved.get(&index) {
                        Some(resolution) => resolution.clone(),
                        None => unresolved(&attempted),
                    };
                    results.push((discrepancy.id, resolution));
                }
            }
        }

        results
    }

    /// Tiers 1-4: synchronous, pure, safe under arbitrary concurrency.
    pub fn cheap_pass(
        &self,
        doc_type: DocType,
        ocr: &OcrAnalysis,
        discrepancy: &Discrepancy,
        attempted: &mut Vec<ResolutionMethod>,
    ) -> Option<ResolutionResult> {
        // Tier 1: numeric equality once formatting is stripped.
        attempted.push(ResolutionMethod::FormatNormalization);
        if let Some(resolution) = try_format_normalization(discrepancy) {
            return Some(resolution);
        }

        // Tier 2: rounding tolerance, relative for rate-named paths.
        attempted.push(ResolutionMethod::RoundingTolerance);
        if let Some(resolution) = try_rounding_tolerance(discrepancy, &self.verification) {
            return Some(resolution);
        }

        // Tier 3: re-read the printed line the field came from.
        attempted.push(ResolutionMethod::OcrReRead);
        if let Some(resolution) = try_ocr_re_read(doc_type, ocr, discrepancy) {
            return Some(resolution);
        }

        // Tier 4: any label on the page carrying the reference value.
        attempted.push(ResolutionMethod::OcrAlternativeLabel);
        if let Some(resolution) = try_alternative_label(ocr, discrepancy, &self.config) {
            return Some(resolution);
        }

        None
    }

    /// Tier 5: one narrowly scoped model request for one field.
    async fn targeted_reanalysis(
        &self,
        ocr: &OcrAnalysis,
        discrepancy: &Discrepancy,
    ) -> Option<ResolutionResult> {
        let context = page_context(ocr, discrepancy.page);
        let request = format!(
            "{}\n\nField path: {}\nExtracted value: {}\nExpected value: {}\nDiscrepancy: {}",
            context,
            discrepancy.field_path,
            discrepancy.extracted_value,
            discrepancy.expected_value.as_deref().unwrap_or("(none)"),
            discrepancy.description,
        );

        let response = match self.client.structure(REANALYSIS_PROMPT, &request, 512).await {
            Ok(response) => response,
            Err(error) => {
                warn!(%error, "targeted re-analysis call failed");
                return None;
            }
        };

        let value = extract_json_object(&response.text)?;
        accept_reanalysis(&value, self.config.reanalysis_min_confidence, ResolutionMethod::ModelReAnalysis)
    }

    /// Tier 6: one combined request for all discrepancies on a page,
    /// matched back by index. Missing or low-confidence items stay
    /// unresolved.
    async fn batched_reanalysis(
        &self,
        ocr: &OcrAnalysis,
        page: Option<u32>,
        group: &[(&Discrepancy, Vec<ResolutionMethod>)],
    ) -> BTreeMap<usize, ResolutionResult> {
        let mut request = page_context(ocr, page);
        request.push_str("\n\nDiscrepancies to re-check:\n");
        for (index, (discrepancy, _)) in group.iter().enumerate() {
            request.push_str(&format!(
                "Item {}: field path {}, extracted {}, expected {}, issue: {}\n",
                index,
                discrepancy.field_path,
                discrepancy.extracted_value,
                discrepancy.expected_value.as_deref().unwrap_or("(none)"),
                discrepancy.description,
            ));
        }

        let mut resolved = BTreeMap::new();
        let response = match self.client.structure(BATCH_REANALYSIS_PROMPT, &request, 2048).await {
            Ok(response) => response,
            Err(error) => {
                warn!(%error, "batched re-analysis call failed");
                return resolved;
            }
        };

        let Some(parsed) = extract_json_object(&response.text) else {
            return resolved;
        };
        let Some(items) = parsed.get("results").and_then(|r| r.as_array()) else {
            return resolved;
        };

        for item in items {
            let Some(index) = item.get("index").and_then(|i| i.as_u64()).map(|i| i as usize)
            else {
                continue;
            };
            if index >= group.len() {
                continue;
            }
            if let Some(resolution) = accept_reanalysis(
                item,
                self.config.reanalysis_min_confidence,
                ResolutionMethod::BatchedModelReAnalysis,
            ) {
                resolved.insert(index, resolution);
            }
        }
        resolved
    }
}

/// Tier 1 implementation.
fn try_format_normalization(discrepancy: &Discrepancy) -> Option<ResolutionResult> {
    let expected = discrepancy.expected_value.as_deref()?;
    let extracted = parse_money(&discrepancy.extracted_value)?;
    let reference = parse_money(expected)?;

    if values_match(extracted, reference, 1e-3) {
        return Some(ResolutionResult::Resolved {
            value: canonical_number(reference),
            confidence: 0.99,
            method: ResolutionMethod::FormatNormalization,
            explanation: format!(
                "'{}' and '{}' are numerically equal after stripping formatting",
                discrepancy.extracted_value, expected
            ),
        });
    }
    None
}

/// Tier 2 implementation.
fn try_rounding_tolerance(
    discrepancy: &Discrepancy,
    verification: &VerificationConfig,
) -> Option<ResolutionResult> {
    let expected = discrepancy.expected_value.as_deref()?;
    let extracted = parse_money(&discrepancy.extracted_value)?;
    let reference = parse_money(expected)?;

    let difference = (extracted - reference).abs();
    let within = if is_rate_path(&discrepancy.field_path) {
        difference / reference.abs().max(1e-9) <= verification.rate_relative_tolerance
    } else {
        difference <= verification.rounding_tolerance
    };

    if within {
        return Some(ResolutionResult::Resolved {
            value: canonical_number(reference),
            confidence: 0.95,
            method: ResolutionMethod::RoundingTolerance,
            explanation: format!(
                "difference of {} between {} and {} is within rounding tolerance",
                difference, extracted, reference
            ),
        });
    }
    None
}

/// Tier 3 implementation. A confident re-read that contradicts the
/// reference is deliberately not auto-accepted: a confident OCR read
/// can still be attached to the wrong field, so it is logged and left
/// for escalation.
fn try_ocr_re_read(
    doc_type: DocType,
    ocr: &OcrAnalysis,
    discrepancy: &Discrepancy,
) -> Option<ResolutionResult> {
    let expected = discrepancy.expected_value.as_deref()?;
    let reference = parse_money(expected)?;
    let labels = labels_for_path(doc_type, &discrepancy.field_path)?;
    let pair = find_labeled_pair(ocr, labels, discrepancy.page)?;
    let re_read = parse_money(&pair.value)?;

    if values_match(re_read, reference, 1e-3) {
        return Some(ResolutionResult::Resolved {
            value: canonical_number(reference),
            confidence: pair.confidence,
            method: ResolutionMethod::OcrReRead,
            explanation: format!(
                "re-read of '{}' on page {} matches the reference value",
                pair.key, pair.page
            ),
        });
    }

    warn!(
        field_path = %discrepancy.field_path,
        re_read,
        reference,
        ocr_confidence = pair.confidence,
        "OCR re-read contradicts reference; escalating instead of accepting"
    );
    None
}

/// Tier 4 implementation.
fn try_alternative_label(
    ocr: &OcrAnalysis,
    discrepancy: &Discrepancy,
    config: &ResolverConfig,
) -> Option<ResolutionResult> {
    let expected = discrepancy.expected_value.as_deref()?;
    let reference = parse_money(expected)?;

    let best = ocr
        .key_value_pairs
        .iter()
        .filter(|kv| discrepancy.page.map_or(true, |page| kv.page == page))
        .filter(|kv| kv.confidence > config.min_alternative_label_confidence)
        .filter(|kv| {
            parse_money(&kv.value).map(|v| values_match(v, reference, 1e-3)).unwrap_or(false)
        })
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))?;

    debug!(label = %best.key, "reference value found under alternative label");
    Some(ResolutionResult::Resolved {
        value: canonical_number(reference),
        confidence: best.confidence * config.indirection_discount,
        method: ResolutionMethod::OcrAlternativeLabel,
        explanation: format!(
            "value matching the reference found under label '{}' on page {}",
            best.key, best.page
        ),
    })
}

/// Shared acceptance rule for model re-analysis responses.
fn accept_reanalysis(
    item: &serde_json::Value,
    min_confidence: f64,
    method: ResolutionMethod,
) -> Option<ResolutionResult> {
    let confidence = item.get("confidence").and_then(|c| c.as_f64())?;
    if confidence < min_confidence {
        return None;
    }
    let value = item.get("value")?;
    let value = match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let explanation = item
        .get("explanation")
        .and_then(|e| e.as_str())
        .unwrap_or("model re-analysis of the implicated page")
        .to_string();

    Some(ResolutionResult::Resolved { value, confidence, method, explanation })
}

fn unresolved(attempted: &[ResolutionMethod]) -> ResolutionResult {
    let methods: Vec<String> = attempted.iter().map(|m| m.to_string()).collect();
    ResolutionResult::Unresolved {
        reason: format!(
            "could not close the discrepancy automatically; attempted: {}",
            methods.join(", ")
        ),
        attempted_methods: attempted.to_vec(),
    }
}

fn is_rate_path(path: &str) -> bool {
    let lowered = path.to_lowercase();
    ["rate", "margin", "percent", "ratio"].iter().any(|token| lowered.contains(token))
}

fn canonical_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// Context for re-analysis: only the implicated page's key-value pairs
/// and table rows, or a bounded slice of the document when no page is
/// cited.
fn page_context(ocr: &OcrAnalysis, page: Option<u32>) -> String {
    let mut context = String::new();
    match page {
        Some(page) => {
            context.push_str(&format!("Fields printed on page {}:\n", page));
            for kv in ocr.pairs_on_page(page) {
                context.push_str(&format!(
                    "{}: {} (confidence {:.2})\n",
                    kv.key, kv.value, kv.confidence
                ));
            }
            for table in ocr.tables.iter().filter(|t| t.page == page) {
                for row in &table.rows {
                    context.push_str(&row.join(" | "));
                    context.push('\n');
                }
            }
        }
        None => {
            context.push_str("Document text:\n");
            context.push_str(&ocr.raw_text.chars().take(8_000).collect::<String>());
            context.push('\n');
            for kv in &ocr.key_value_pairs {
                context.push_str(&format!("{}: {}\n", kv.key, kv.value));
            }
        }
    }
    context
}

const REANALYSIS_PROMPT: &str = r#"You are re-checking a single extracted field from a scanned financial document against the page it came from. Read the page content and report the value actually printed for the named field.

Return ONLY a JSON object: {"value": "...", "confidence": 0.0-1.0, "explanation": "one sentence"}

Report only what is printed. If the field is not legible on this page, use confidence 0.0."#;

const BATCH_REANALYSIS_PROMPT: &str = r#"You are re-checking several extracted fields from one page of a scanned financial document. For each numbered item, read the page content and report the value actually printed for that field.

Return ONLY a JSON object: {"results": [{"index": 0, "value": "...", "confidence": 0.0-1.0, "explanation": "one sentence"}]}

Include every item by its index. Report only what is printed; use confidence 0.0 for anything illegible."#;

#[cfg(test)]
mod tests {
    use super::*;
    use crestline_models::{CheckKind, KeyValuePair};
    use crestline_utils::AppConfig;
    use serde_json::json;

    fn resolver() -> Resolver {
        let config = AppConfig::default();
        Resolver::new(
            Arc::new(CompletionClient::new(&config.model).unwrap()),
            config.resolver,
            config.verification,
        )
    }

    fn discrepancy(extracted: &str, expected: &str, path: &str) -> Discrepancy {
        Discrepancy::new(
            Uuid::new_v4(),
            path,
            extracted,
            Some(expected.to_string()),
            CheckKind::OcrComparison,
            "test discrepancy",
        )
    }

    fn kv(key: &str, value: &str, confidence: f64, page: u32) -> KeyValuePair {
        KeyValuePair { key: key.to_string(), value: value.to_string(), confidence, page }
    }

    #[test]
    fn test_format_normalization_scenario() {
        // "$85,000.00" vs "85000" differs only in formatting.
        let resolver = resolver();
        let d = discrepancy("$85,000.00", "85000", "wages.wages_tips_other_comp");
        let mut attempted = Vec::new();
        let result = resolver
            .cheap_pass(DocType::W2, &OcrAnalysis::default(), &d, &mut attempted)
            .expect("should resolve");

        let ResolutionResult::Resolved { confidence, method, .. } = result else {
            panic!("expected resolved");
        };
        assert_eq!(method, ResolutionMethod::FormatNormalization);
        assert_eq!(confidence, 0.99);
        assert_eq!(attempted, vec![ResolutionMethod::FormatNormalization]);
    }

    #[test]
    fn test_rounding_tolerance_on_rate_path() {
        // 41,999 vs 42,000 on a rate-named field: 0.002% relative.
        let resolver = resolver();
        let d = discrepancy("41,999", "42,000", "totals.vacancy_rate_basis");
        let mut attempted = Vec::new();
        let result = resolver
            .cheap_pass(DocType::RentRoll, &OcrAnalysis::default(), &d, &mut attempted)
            .expect("should resolve");

        assert_eq!(result.method(), Some(ResolutionMethod::RoundingTolerance));
        assert_eq!(
            attempted,
            vec![ResolutionMethod::FormatNormalization, ResolutionMethod::RoundingTolerance]
        );
    }

    #[test]
    fn test_cheapest_tier_wins() {
        // A discrepancy resolvable by tier 1 must never report a
        // costlier method, even though later tiers would also succeed.
        let resolver = resolver();
        let ocr = OcrAnalysis {
            key_value_pairs: vec![kv("Wages, tips, other compensation", "85,000.00", 0.99, 1)],
            page_count: 1,
            ..Default::default()
        };
        let d = discrepancy("85000.00", "85,000", "wages.wages_tips_other_comp").on_page(1);
        let mut attempted = Vec::new();
        let result = resolver.cheap_pass(DocType::W2, &ocr, &d, &mut attempted).unwrap();
        assert_eq!(result.method(), Some(ResolutionMethod::FormatNormalization));
    }

    #[test]
    fn test_ocr_re_read_resolves_on_reference_match() {
        let resolver = resolver();
        let ocr = OcrAnalysis {
            key_value_pairs: vec![kv("Wages, tips, other compensation", "85,000.00", 0.97, 1)],
            page_count: 1,
            ..Default::default()
        };
        // Extracted drifted; the printed line agrees with the reference.
        let d = discrepancy("58,000", "85,000.00", "wages.wages_tips_other_comp").on_page(1);
        let mut attempted = Vec::new();
        let result = resolver.cheap_pass(DocType::W2, &ocr, &d, &mut attempted).unwrap();

        let ResolutionResult::Resolved { method, confidence, .. } = result else {
            panic!("expected resolved");
        };
        assert_eq!(method, ResolutionMethod::OcrReRead);
        assert_eq!(confidence, 0.97);
    }

    #[test]
    fn test_contradicting_re_read_never_auto_accepted() {
        // The OCR re-read is highly confident but disagrees with the
        // reference; it must escalate, not resolve.
        let ocr = OcrAnalysis {
            key_value_pairs: vec![kv("Wages, tips, other compensation", "99,999.00", 0.99, 1)],
            page_count: 1,
            ..Default::default()
        };
        let d = discrepancy("58,000", "85,000.00", "wages.wages_tips_other_comp").on_page(1);
        assert!(try_ocr_re_read(DocType::W2, &ocr, &d).is_none());
    }

    #[test]
    fn test_alternative_label_search() {
        let resolver = resolver();
        let ocr = OcrAnalysis {
            key_value_pairs: vec![
                kv("Compensation total", "85,000.00", 0.92, 1),
                kv("Some other figure", "85,000.00", 0.70, 1),
            ],
            page_count: 1,
            ..Default::default()
        };
        // No canonical label present, but an alternative label on the
        // page carries the reference value.
        let d = discrepancy("58,000", "85,000.00", "wages.wages_tips_other_comp").on_page(1);
        let mut attempted = Vec::new();
        let result = resolver.cheap_pass(DocType::W2, &ocr, &d, &mut attempted).unwrap();

        let ResolutionResult::Resolved { method, confidence, explanation, .. } = result else {
            panic!("expected resolved");
        };
        assert_eq!(method, ResolutionMethod::OcrAlternativeLabel);
        // Highest-confidence match, discounted for indirection
        assert!((confidence - 0.92 * 0.9).abs() < 1e-9);
        assert!(explanation.contains("Compensation total"));
    }

    #[test]
    fn test_low_confidence_alternative_rejected() {
        let config = AppConfig::default();
        let ocr = OcrAnalysis {
            key_value_pairs: vec![kv("Maybe this", "85,000.00", 0.75, 1)],
            page_count: 1,
            ..Default::default()
        };
        let d = discrepancy("58,000", "85,000.00", "wages.wages_tips_other_comp").on_page(1);
        assert!(try_alternative_label(&ocr, &d, &config.resolver).is_none());
    }

    #[test]
    fn test_no_reference_skips_reference_tiers() {
        let resolver = resolver();
        let mut d = discrepancy("58,000", "85,000", "wages.wages_tips_other_comp");
        d.expected_value = None;
        let mut attempted = Vec::new();
        let result = resolver.cheap_pass(DocType::W2, &OcrAnalysis::default(), &d, &mut attempted);
        assert!(result.is_none());
        // Every cheap tier was still attempted and recorded.
        assert_eq!(attempted.len(), 4);
    }

    #[test]
    fn test_unresolved_reason_lists_attempts() {
        let attempted = vec![
            ResolutionMethod::FormatNormalization,
            ResolutionMethod::RoundingTolerance,
            ResolutionMethod::ModelReAnalysis,
        ];
        let ResolutionResult::Unresolved { reason, attempted_methods } = unresolved(&attempted)
        else {
            panic!("expected unresolved");
        };
        assert!(reason.contains("format_normalization"));
        assert!(reason.contains("model_re_analysis"));
        assert_eq!(attempted_methods.len(), 3);
    }

    #[test]
    fn test_reanalysis_acceptance_threshold() {
        let accepted = accept_reanalysis(
            &json!({"value": "85000", "confidence": 0.85, "explanation": "printed in box 1"}),
            0.7,
            ResolutionMethod::ModelReAnalysis,
        );
        assert!(accepted.is_some());

        let rejected = accept_reanalysis(
            &json!({"value": "85000", "confidence": 0.5}),
            0.7,
            ResolutionMethod::ModelReAnalysis,
        );
        assert!(rejected.is_none());

        let no_value = accept_reanalysis(
            &json!({"confidence": 0.9}),
            0.7,
            ResolutionMethod::ModelReAnalysis,
        );
        assert!(no_value.is_none());
    }

    #[tokio::test]
    async fn test_resolve_all_cheap_tiers_only() {
        let resolver = resolver();
        let ocr = OcrAnalysis::default();
        let discrepancies = vec![
            discrepancy("$1,000.00", "1000", "net_income"),
            discrepancy("2,500", "2500.00", "gross_profit"),
        ];
        let results = resolver.resolve_all(DocType::ProfitAndLoss, &ocr, &discrepancies).await;
        assert_eq!(results.len(), 2);
        for (_, result) in &results {
            assert!(result.is_resolved());
            assert_eq!(result.method(), Some(ResolutionMethod::FormatNormalization));
        }
    }
}
