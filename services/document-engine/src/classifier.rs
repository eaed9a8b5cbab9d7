//! Document classifier
//!
//! Three deterministic tiers with no network I/O, escalating to the
//! model-based classifier only when all three return nothing. Literal
//! patterns are ordered most-specific first so a sub-variant form is
//! never shadowed by its generic parent.

use regex::Regex;
use tracing::debug;

use crestline_models::{ClassificationConfidence, DocType, KeyValuePair, OcrAnalysis};
use crestline_utils::llm::{extract_json_object, CompletionClient};

/// Classification outcome
#[derive(Debug, Clone)]
pub struct Classification {
    pub doc_type: Option<DocType>,
    pub confidence: ClassificationConfidence,
    pub method: &'static str,
    /// The pattern or label set that matched, kept for the audit trail
    pub matched: Option<String>,
}

impl Classification {
    fn none() -> Self {
        Self {
            doc_type: None,
            confidence: ClassificationConfidence::None,
            method: "none",
            matched: None,
        }
    }
}

/// Tier 1: literal phrase patterns over normalized text, most specific
/// before generic parents.
const TIER1_PATTERNS: &[(DocType, &[&str])] = &[
    (DocType::Form1120S, &["form 1120-s", "form 1120s", "income tax return for an s corporation"]),
    (DocType::Form1120, &["form 1120", "u.s. corporation income tax return"]),
    (DocType::Form1065, &["form 1065", "return of partnership income"]),
    (DocType::Form1040, &["form 1040", "u.s. individual income tax return"]),
    (DocType::W2, &["form w-2", "wage and tax statement"]),
    (DocType::Form1099, &["form 1099", "nonemployee compensation", "miscellaneous information"]),
    (DocType::ProfitAndLoss, &["profit and loss statement", "profit & loss", "income statement", "statement of operations"]),
    (DocType::BalanceSheet, &["balance sheet", "statement of financial position"]),
    (DocType::RentRoll, &["rent roll"]),
];

/// Tier 2: distinctive OCR label sets; a type matches when at least
/// `min` of its labels co-occur among the reported keys.
const TIER2_LABEL_SETS: &[(DocType, &[&str], usize)] = &[
    (DocType::W2, &["wages, tips", "social security wages", "medicare wages", "federal income tax withheld"], 2),
    (DocType::Form1040, &["filing status", "adjusted gross income", "taxable income"], 2),
    (DocType::BankStatement, &["beginning balance", "ending balance", "account number"], 2),
    (DocType::BalanceSheet, &["total assets", "total liabilities", "total equity"], 2),
    (DocType::ProfitAndLoss, &["total revenue", "gross profit", "net income", "operating expenses"], 2),
    (DocType::RentRoll, &["unit", "tenant", "monthly rent"], 3),
];

/// Known depository institutions for tier-3 bank statement detection.
const KNOWN_INSTITUTIONS: &[&str] = &[
    "chase",
    "wells fargo",
    "bank of america",
    "citibank",
    "u.s. bank",
    "us bank",
    "pnc",
    "truist",
    "capital one",
    "td bank",
    "fifth third",
    "regions bank",
];

/// Classify one document from its OCR text and key-value pairs.
/// Deterministic: identical input always yields the same result.
pub fn classify(raw_text: &str, key_value_pairs: &[KeyValuePair]) -> Classification {
    let text = normalize_text(raw_text);

    // Tier 1: literal patterns
    for (doc_type, patterns) in TIER1_PATTERNS {
        for pattern in *patterns {
            if text.contains(pattern) {
                debug!(doc_type = %doc_type, pattern, "tier-1 pattern match");
                return Classification {
                    doc_type: Some(*doc_type),
                    confidence: ClassificationConfidence::High,
                    method: "tier1_pattern",
                    matched: Some((*pattern).to_string()),
                };
            }
        }
    }

    // Tier 2: label co-occurrence
    let keys: Vec<String> = key_value_pairs.iter().map(|kv| kv.key.to_lowercase()).collect();
    for (doc_type, labels, min) in TIER2_LABEL_SETS {
        let hits: Vec<&str> = labels
            .iter()
            .filter(|label| keys.iter().any(|k| k.contains(*label)))
            .copied()
            .collect();
        if hits.len() >= *min {
            debug!(doc_type = %doc_type, ?hits, "tier-2 label match");
            return Classification {
                doc_type: Some(*doc_type),
                confidence: ClassificationConfidence::Medium,
                method: "tier2_labels",
                matched: Some(hits.join(" + ")),
            };
        }
    }

    // Tier 3: contextual term combinations
    if let Some(classification) = classify_contextual(&text) {
        return classification;
    }

    Classification::none()
}

fn classify_contextual(text: &str) -> Option<Classification> {
    let contextual = |doc_type: DocType, matched: String| Classification {
        doc_type: Some(doc_type),
        confidence: ClassificationConfidence::Medium,
        method: "tier3_context",
        matched: Some(matched),
    };

    if text.contains("assets") && text.contains("liabilities") && text.contains("equity") {
        return Some(contextual(DocType::BalanceSheet, "assets + liabilities + equity".to_string()));
    }

    if text.contains("statement") && text.contains("account") {
        if let Some(institution) = KNOWN_INSTITUTIONS.iter().find(|name| text.contains(*name)) {
            return Some(contextual(
                DocType::BankStatement,
                format!("{} + statement + account", institution),
            ));
        }
    }

    if (text.contains("revenue") || text.contains("sales"))
        && text.contains("expenses")
        && text.contains("net income")
    {
        return Some(contextual(DocType::ProfitAndLoss, "revenue + expenses + net income".to_string()));
    }

    if text.contains("tenant") && (text.contains("monthly rent") || text.contains("lease")) {
        return Some(contextual(DocType::RentRoll, "tenant + rent/lease".to_string()));
    }

    None
}

fn normalize_text(raw: &str) -> String {
    raw.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Detect the tax or statement year printed on the document.
pub fn detect_year(raw_text: &str) -> Option<i32> {
    let year_pattern = Regex::new(r"\b(20[0-3][0-9])\b").expect("static pattern");
    let mut counts: std::collections::HashMap<i32, usize> = std::collections::HashMap::new();
    for capture in year_pattern.captures_iter(raw_text) {
        if let Ok(year) = capture[1].parse::<i32>() {
            *counts.entry(year).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .max_by_key(|(year, count)| (*count, *year))
        .map(|(year, _)| year)
}

/// Result of the model-based fallback classifier
#[derive(Debug, Clone)]
pub struct ModelClassification {
    pub doc_type: DocType,
    pub year: Option<i32>,
    pub details: Option<String>,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Escalate to the model classifier with the original document
/// payload. Malformed responses and transport failures coerce to the
/// catch-all type; nothing here aborts the pipeline.
pub async fn classify_with_model(
    client: &CompletionClient,
    ocr: &OcrAnalysis,
) -> ModelClassification {
    let payload = build_classification_payload(ocr);

    let response = match client.classify_document(&payload).await {
        Ok(response) => response,
        Err(error) => {
            debug!(%error, "model classification call failed; coercing to other");
            return ModelClassification {
                doc_type: DocType::Other,
                year: None,
                details: Some(format!("classification call failed: {}", error)),
                input_tokens: 0,
                output_tokens: 0,
            };
        }
    };

    let parsed = extract_json_object(&response.text);
    let (doc_type, year, details) = match parsed {
        Some(value) => {
            let doc_type = value
                .get("docType")
                .and_then(|v| v.as_str())
                .map(DocType::normalize)
                .unwrap_or(DocType::Other);
            let year = value.get("year").and_then(|v| v.as_i64()).map(|y| y as i32);
            let details = value.get("details").and_then(|v| v.as_str()).map(str::to_string);
            (doc_type, year, details)
        }
        None => (
            DocType::Other,
            None,
            Some("unparseable classification response".to_string()),
        ),
    };

    ModelClassification {
        doc_type,
        year,
        details,
        input_tokens: response.input_tokens,
        output_tokens: response.output_tokens,
    }
}

fn build_classification_payload(ocr: &OcrAnalysis) -> String {
    let mut payload = String::new();
    payload.push_str(&ocr.raw_text);
    if !ocr.key_value_pairs.is_empty() {
        payload.push_str("\n\nDetected fields:\n");
        for kv in ocr.key_value_pairs.iter().take(40) {
            payload.push_str(&format!("{}: {}\n", kv.key, kv.value));
        }
    }
    // Bound the payload; classification does not need the whole text
    payload.chars().take(12_000).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv(key: &str, value: &str, page: u32) -> KeyValuePair {
        KeyValuePair { key: key.to_string(), value: value.to_string(), confidence: 0.95, page }
    }

    #[test]
    fn test_tier1_individual_return() {
        let text = "Form 1040  U.S. Individual Income Tax Return  2023";
        let result = classify(text, &[]);
        assert_eq!(result.doc_type, Some(DocType::Form1040));
        assert_eq!(result.confidence, ClassificationConfidence::High);
        assert_eq!(result.method, "tier1_pattern");
    }

    #[test]
    fn test_tier1_sub_variant_checked_before_parent() {
        let text = "Form 1120-S  U.S. Income Tax Return for an S Corporation";
        let result = classify(text, &[]);
        assert_eq!(result.doc_type, Some(DocType::Form1120S));

        let parent = classify("Form 1120  U.S. Corporation Income Tax Return", &[]);
        assert_eq!(parent.doc_type, Some(DocType::Form1120));
    }

    #[test]
    fn test_tier2_label_co_occurrence() {
        let pairs = vec![
            kv("Wages, tips, other compensation", "85,000.00", 1),
            kv("Federal income tax withheld", "12,400.00", 1),
        ];
        let result = classify("scanned page with no recognizable header", &pairs);
        assert_eq!(result.doc_type, Some(DocType::W2));
        assert_eq!(result.confidence, ClassificationConfidence::Medium);
        assert_eq!(result.method, "tier2_labels");
    }

    #[test]
    fn test_tier3_balance_sheet_context() {
        let text = "Summary of assets and liabilities with owner equity as of December 31";
        let result = classify(text, &[]);
        assert_eq!(result.doc_type, Some(DocType::BalanceSheet));
        assert_eq!(result.method, "tier3_context");
    }

    #[test]
    fn test_tier3_bank_statement_needs_institution() {
        let with_bank = classify("Wells Fargo combined statement of account", &[]);
        assert_eq!(with_bank.doc_type, Some(DocType::BankStatement));

        let without_bank = classify("statement of account from somewhere", &[]);
        assert_eq!(without_bank.doc_type, None);
    }

    #[test]
    fn test_unrecognized_returns_none() {
        let result = classify("completely unrelated text", &[]);
        assert_eq!(result.doc_type, None);
        assert_eq!(result.confidence, ClassificationConfidence::None);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let text = "Form 1040 U.S. Individual Income Tax Return";
        let pairs = vec![kv("Filing Status", "Single", 1)];
        let first = classify(text, &pairs);
        let second = classify(text, &pairs);
        assert_eq!(first.doc_type, second.doc_type);
        assert_eq!(first.confidence, second.confidence);
        assert_eq!(first.method, second.method);
    }

    #[test]
    fn test_detect_year() {
        assert_eq!(detect_year("Tax year 2023. For calendar year 2023."), Some(2023));
        assert_eq!(detect_year("no year here"), None);
        // The repeated year wins over a stray one
        assert_eq!(detect_year("2022 2023 2023 statement"), Some(2023));
    }
}
