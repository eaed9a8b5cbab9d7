//! OCR adapter output types
//!
//! The engine never runs OCR itself; it consumes the adapter's output:
//! raw text, key-value pairs and tables per page, optionally augmented
//! with richly-typed fields for a known subset of standardized forms.

use serde::{Deserialize, Serialize};

/// Key-value pair reported by the OCR adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
    pub confidence: f64,
    pub page: u32,
}

/// Table reported by the OCR adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrTable {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
}

/// A single richly-typed field on a standardized form page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedField {
    /// Field vocabulary token, e.g. `WagesTipsOtherCompensation`
    #[serde(rename = "type")]
    pub field_type: String,
    pub value: String,
    pub confidence: f64,
}

/// Richly-typed page output, available only for a known subset of
/// standardized forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedFormPage {
    pub page_type: String,
    pub page_type_confidence: f64,
    #[serde(default)]
    pub fields: Vec<TypedField>,
}

/// Complete OCR output for one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrAnalysis {
    pub raw_text: String,
    pub page_count: u32,
    pub key_value_pairs: Vec<KeyValuePair>,
    pub tables: Vec<OcrTable>,
    /// Present only when the richer adapter variant recognized a
    /// standardized form family
    pub typed_pages: Vec<TypedFormPage>,
}

impl OcrAnalysis {
    /// Key-value pairs restricted to one page.
    pub fn pairs_on_page(&self, page: u32) -> impl Iterator<Item = &KeyValuePair> {
        self.key_value_pairs.iter().filter(move |kv| kv.page == page)
    }

    /// All distinct key labels, used by label-based classification.
    pub fn key_labels(&self) -> Vec<&str> {
        self.key_value_pairs.iter().map(|kv| kv.key.as_str()).collect()
    }

    pub fn has_typed_fields(&self) -> bool {
        self.typed_pages.iter().any(|p| !p.fields.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OcrAnalysis {
        OcrAnalysis {
            raw_text: "Form W-2 Wage and Tax Statement".to_string(),
            page_count: 2,
            key_value_pairs: vec![
                KeyValuePair {
                    key: "Wages, tips, other compensation".to_string(),
                    value: "85,000.00".to_string(),
                    confidence: 0.98,
                    page: 1,
                },
                KeyValuePair {
                    key: "Federal income tax withheld".to_string(),
                    value: "12,400.00".to_string(),
                    confidence: 0.97,
                    page: 2,
                },
            ],
            tables: Vec::new(),
            typed_pages: Vec::new(),
        }
    }

    #[test]
    fn test_pairs_on_page_filters() {
        let ocr = sample();
        let page1: Vec<_> = ocr.pairs_on_page(1).collect();
        assert_eq!(page1.len(), 1);
        assert_eq!(page1[0].value, "85,000.00");
    }

    #[test]
    fn test_deserializes_with_missing_sections() {
        let ocr: OcrAnalysis =
            serde_json::from_str(r#"{"raw_text":"x","page_count":1}"#).unwrap();
        assert!(ocr.key_value_pairs.is_empty());
        assert!(ocr.typed_pages.is_empty());
    }
}
