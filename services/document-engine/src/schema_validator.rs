//! Schema validator
//!
//! Validates a structured tree against the canonical per-type schema.
//! Validation never raises: success returns the coerced and defaulted
//! tree with every schema key present; failure returns the original
//! data untouched plus a flat path/message error list. Information is
//! never discarded in favor of strict rejection.

use serde_json::Value;

use crestline_models::{
    BalanceSheetDoc, BankStatementDoc, BusinessReturn, DocType, Form1099, IndividualReturn,
    ProfitAndLossDoc, RentRollDoc, StructuredDocument, ValidationError, WageStatement,
};
use crestline_utils::currency::parse_money;
use crestline_utils::{EngineError, EngineResult};

/// Validation output: data plus errors, never an exception
#[derive(Debug, Clone)]
pub struct ValidatedExtraction {
    pub data: Value,
    pub errors: Vec<ValidationError>,
}

/// Validate against the canonical schema for `doc_type`. Only the
/// catch-all type, which has no schema, is a typed error.
pub fn validate(doc_type: DocType, data: &Value) -> EngineResult<ValidatedExtraction> {
    if StructuredDocument::empty_for(doc_type).is_none() {
        return Err(EngineError::unsupported_document_type(doc_type.to_string()));
    }

    let coerced = coerce_tree(data);

    let result = match doc_type {
        DocType::Form1040 => validate_as::<IndividualReturn>(doc_type, data, &coerced),
        DocType::Form1120 | DocType::Form1120S | DocType::Form1065 => {
            validate_as::<BusinessReturn>(doc_type, data, &coerced)
        }
        DocType::W2 => validate_as::<WageStatement>(doc_type, data, &coerced),
        DocType::Form1099 => validate_as::<Form1099>(doc_type, data, &coerced),
        DocType::BankStatement => validate_as::<BankStatementDoc>(doc_type, data, &coerced),
        DocType::ProfitAndLoss => validate_as::<ProfitAndLossDoc>(doc_type, data, &coerced),
        DocType::BalanceSheet => validate_as::<BalanceSheetDoc>(doc_type, data, &coerced),
        DocType::RentRoll => validate_as::<RentRollDoc>(doc_type, data, &coerced),
        DocType::Other => unreachable!("checked above"),
    };

    Ok(result)
}

fn validate_as<T>(doc_type: DocType, original: &Value, coerced: &Value) -> ValidatedExtraction
where
    T: serde::de::DeserializeOwned + serde::Serialize,
{
    if let Ok(typed) = serde_json::from_value::<T>(coerced.clone()) {
        return ValidatedExtraction {
            data: serde_json::to_value(typed).unwrap_or_else(|_| coerced.clone()),
            errors: Vec::new(),
        };
    }

    // Whole-document parse failed. Probe each section in isolation,
    // preferring the coerced rendering but falling back to the
    // original (an account number is a numeric-looking string that
    // must stay a string). A section fails only when neither rendering
    // deserializes.
    if !original.is_object() {
        let message = serde_json::from_value::<T>(coerced.clone())
            .err()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "expected object".to_string());
        return ValidatedExtraction {
            data: original.clone(),
            errors: vec![ValidationError::new("$", message)],
        };
    }

    let mut assembled = serde_json::Map::new();
    let mut errors = Vec::new();

    for section in StructuredDocument::section_keys(doc_type) {
        let candidates = [coerced.get(*section), original.get(*section)];
        let mut placed = false;
        let mut last_error = None;

        for candidate in candidates.into_iter().flatten() {
            let mut probe = serde_json::Map::new();
            probe.insert((*section).to_string(), candidate.clone());
            match serde_json::from_value::<T>(Value::Object(probe)) {
                Ok(_) => {
                    assembled.insert((*section).to_string(), candidate.clone());
                    placed = true;
                    break;
                }
                Err(error) => last_error = Some(error.to_string()),
            }
        }

        if !placed {
            if let Some(message) = last_error {
                errors.push(ValidationError::new(*section, message));
            }
        }
    }

    if errors.is_empty() {
        // Every section parses in isolation under some rendering;
        // assemble them into the coerced, fully-keyed tree.
        match serde_json::from_value::<T>(Value::Object(assembled)) {
            Ok(typed) => {
                return ValidatedExtraction {
                    data: serde_json::to_value(typed).unwrap_or_else(|_| original.clone()),
                    errors: Vec::new(),
                }
            }
            Err(error) => {
                return ValidatedExtraction {
                    data: original.clone(),
                    errors: vec![ValidationError::new("$", error.to_string())],
                }
            }
        }
    }

    ValidatedExtraction { data: original.clone(), errors }
}

/// Leaf coercion ahead of typed deserialization: numeric strings
/// become numbers (integers when whole, so integer-typed leaves
/// deserialize), whole floats become integers. String leaves that do
/// not parse as money stay strings.
pub fn coerce_tree(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter().map(|(k, v)| (k.clone(), coerce_tree(v))).collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(coerce_tree).collect()),
        Value::String(s) => {
            // Identifier-like strings (SSN/EIN, dates, descriptions)
            // must survive untouched; only cleanly numeric strings
            // coerce.
            if looks_numeric(s) {
                match parse_money(s) {
                    Some(v) => number_value(v),
                    None => value.clone(),
                }
            } else {
                value.clone()
            }
        }
        Value::Number(n) => match n.as_f64() {
            Some(v) => number_value(v),
            None => value.clone(),
        },
        other => other.clone(),
    }
}

fn number_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9e15 {
        serde_json::json!(v as i64)
    } else {
        serde_json::json!(v)
    }
}

fn looks_numeric(s: &str) -> bool {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return false;
    }
    trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '$' | ',' | '.' | '(' | ')' | '-' | ' '))
        && trimmed.chars().any(|c| c.is_ascii_digit())
        // Internal dashes mean an identifier (SSN, EIN, date), not a
        // negative amount
        && trimmed.trim_start_matches(['(', '-', '$', ' ']).find('-').is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_data_is_coerced_and_completed() {
        let data = json!({
            "wages": {"wages_tips_other_comp": "85,000.00"},
            "employer": {"name": "Acme Corp", "ein": "12-3456789"}
        });
        let result = validate(DocType::W2, &data).unwrap();
        assert!(result.errors.is_empty());
        assert_eq!(result.data["wages"]["wages_tips_other_comp"].as_f64(), Some(85000.0));
        // EIN keeps its identifier shape
        assert_eq!(result.data["employer"]["ein"], json!("12-3456789"));
        // Schema completeness: untouched keys are present as nulls
        assert!(result.data["withholding"]["federal_income_tax"].is_null());
        assert!(result.data.get("tax_year").is_some());
    }

    #[test]
    fn test_invalid_section_reports_path_and_preserves_data() {
        let data = json!({
            "wages": "not an object",
            "employer": {"name": "Acme Corp"}
        });
        let result = validate(DocType::W2, &data).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "wages");
        // Original data untouched on failure
        assert_eq!(result.data, data);
    }

    #[test]
    fn test_non_object_root() {
        let data = json!([1, 2, 3]);
        let result = validate(DocType::BalanceSheet, &data).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "$");
        assert_eq!(result.data, data);
    }

    #[test]
    fn test_other_type_is_typed_error() {
        let error = validate(DocType::Other, &json!({})).unwrap_err();
        assert_eq!(error.error_code(), "UNSUPPORTED_DOCUMENT_TYPE");
    }

    #[test]
    fn test_numeric_string_in_text_field_recovers_via_original() {
        // The account number looks numeric, so the coercion pass turns
        // it into a number and the fast path fails; section recovery
        // keeps the original string while still coercing the money
        // leaves.
        let data = json!({
            "account": {"account_number": "12345678", "institution_name": "Chase"},
            "balances": {"beginning_balance": "10,000.00", "ending_balance": "12,500.00"}
        });
        let result = validate(DocType::BankStatement, &data).unwrap();
        assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
        assert_eq!(result.data["account"]["account_number"], json!("12345678"));
        assert_eq!(result.data["balances"]["beginning_balance"].as_f64(), Some(10000.0));
    }

    #[test]
    fn test_coercion_preserves_identifiers_and_dates() {
        let tree = coerce_tree(&json!({
            "ssn": "123-45-6789",
            "date": "2023-01-31",
            "amount": "(1,250.75)",
            "count": 3.0
        }));
        assert_eq!(tree["ssn"], json!("123-45-6789"));
        assert_eq!(tree["date"], json!("2023-01-31"));
        assert_eq!(tree["amount"], json!(-1250.75));
        assert_eq!(tree["count"], json!(3));
    }

    #[test]
    fn test_empty_object_validates_to_full_null_schema() {
        let result = validate(DocType::BalanceSheet, &json!({})).unwrap();
        assert!(result.errors.is_empty());
        assert!(result.data["assets"]["total_assets"].is_null());
        assert!(result.data["equity"]["total_equity"].is_null());
    }
}
