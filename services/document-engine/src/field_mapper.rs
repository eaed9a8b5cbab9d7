//! Deterministic field mapper
//!
//! Translates the OCR adapter's richly-typed field vocabulary into the
//! canonical schema tree for standardized forms. String leaves pass
//! through trimmed; everything else goes through the currency parser,
//! which yields null for non-numeric input instead of failing.

use serde_json::{json, Value};
use tracing::debug;

use crestline_models::{is_entirely_empty, OcrAnalysis, StructuredDocument};
use crestline_models::DocType;
use crestline_utils::currency::parse_money;
use crestline_utils::paths::set_path;

use crate::registry::{FieldKind, FieldMapping};

/// Result of a deterministic mapping pass
#[derive(Debug)]
pub enum MappingOutcome {
    /// Mapping produced at least one populated section
    Mapped(Value),
    /// Every top-level section came out empty; the caller falls back
    /// to model-assisted structuring instead of persisting this
    Miss,
}

/// Apply the static field map to every typed page of the document.
pub fn map_typed_fields(
    doc_type: DocType,
    field_map: &[FieldMapping],
    ocr: &OcrAnalysis,
) -> MappingOutcome {
    let mut tree = json!({});
    let mut mapped = 0usize;

    for page in &ocr.typed_pages {
        for field in &page.fields {
            let Some(mapping) = field_map.iter().find(|m| m.token == field.field_type) else {
                continue;
            };
            let leaf = convert_leaf(mapping.kind, &field.value);
            if !leaf.is_null() {
                mapped += 1;
            }
            set_path(&mut tree, mapping.path, leaf);
        }
    }

    debug!(doc_type = %doc_type, mapped, "deterministic mapping pass complete");

    // The same standardized form sometimes arrives as plain scanned
    // text with no typed fields at all; an all-empty tree is a miss,
    // not a result.
    if is_entirely_empty(&tree) {
        return MappingOutcome::Miss;
    }

    // Overlay onto the canonical skeleton so unmapped keys are present
    // as nulls before validation.
    if let Some(schema) = StructuredDocument::empty_for(doc_type) {
        let mut canonical = schema.canonical_value();
        merge_into(&mut canonical, &tree);
        return MappingOutcome::Mapped(canonical);
    }
    MappingOutcome::Mapped(tree)
}

fn convert_leaf(kind: FieldKind, raw: &str) -> Value {
    match kind {
        FieldKind::Text => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::String(trimmed.to_string())
            }
        }
        FieldKind::Money => match parse_money(raw) {
            Some(v) => number_value(v),
            None => Value::Null,
        },
        FieldKind::Year => match parse_money(raw) {
            Some(v) if v.fract() == 0.0 && (1900.0..3000.0).contains(&v) => json!(v as i64),
            _ => Value::Null,
        },
    }
}

/// Render a parsed amount as an integer when it has no fractional
/// part, so integer-typed schema leaves deserialize cleanly.
fn number_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9e15 {
        json!(v as i64)
    } else {
        json!(v)
    }
}

/// Deep-merge non-null leaves of `overlay` into `base`.
fn merge_into(base: &mut Value, overlay: &Value) {
    match overlay {
        Value::Object(map) => {
            for (key, value) in map {
                match base.get_mut(key) {
                    Some(slot) => merge_into(slot, value),
                    None => {
                        if let Some(obj) = base.as_object_mut() {
                            obj.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
        }
        Value::Null => {}
        other => *base = other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;
    use crestline_models::{TypedField, TypedFormPage};

    fn typed_page(fields: Vec<(&str, &str)>) -> TypedFormPage {
        TypedFormPage {
            page_type: "w2".to_string(),
            page_type_confidence: 0.99,
            fields: fields
                .into_iter()
                .map(|(field_type, value)| TypedField {
                    field_type: field_type.to_string(),
                    value: value.to_string(),
                    confidence: 0.97,
                })
                .collect(),
        }
    }

    fn ocr_with_pages(pages: Vec<TypedFormPage>) -> OcrAnalysis {
        OcrAnalysis { typed_pages: pages, page_count: 1, ..Default::default() }
    }

    #[test]
    fn test_maps_tokens_to_schema_paths() {
        let registry = TypeRegistry::new("test-v1").unwrap();
        let map = registry.field_map(DocType::W2).unwrap();
        let ocr = ocr_with_pages(vec![typed_page(vec![
            ("EmployerName", "  Acme Manufacturing LLC "),
            ("WagesTipsOtherCompensation", "$85,000.00"),
            ("FederalIncomeTaxWithheld", "(1,200.00)"),
            ("TaxYear", "2023"),
        ])]);

        let MappingOutcome::Mapped(tree) = map_typed_fields(DocType::W2, map, &ocr) else {
            panic!("expected a mapped tree");
        };
        assert_eq!(tree["employer"]["name"], json!("Acme Manufacturing LLC"));
        assert_eq!(tree["wages"]["wages_tips_other_comp"], json!(85000));
        assert_eq!(tree["withholding"]["federal_income_tax"], json!(-1200));
        assert_eq!(tree["tax_year"], json!(2023));
        // Unmapped schema keys are still present as nulls
        assert!(tree["wages"]["allocated_tips"].is_null());
    }

    #[test]
    fn test_non_numeric_money_becomes_null() {
        let registry = TypeRegistry::new("test-v1").unwrap();
        let map = registry.field_map(DocType::W2).unwrap();
        let ocr = ocr_with_pages(vec![typed_page(vec![
            ("WagesTipsOtherCompensation", "illegible"),
            ("EmployerName", "Acme"),
        ])]);

        let MappingOutcome::Mapped(tree) = map_typed_fields(DocType::W2, map, &ocr) else {
            panic!("expected a mapped tree");
        };
        assert!(tree["wages"]["wages_tips_other_comp"].is_null());
    }

    #[test]
    fn test_all_empty_pass_is_a_miss() {
        let registry = TypeRegistry::new("test-v1").unwrap();
        let map = registry.field_map(DocType::W2).unwrap();

        // No typed pages at all
        let no_pages = ocr_with_pages(vec![]);
        assert!(matches!(map_typed_fields(DocType::W2, map, &no_pages), MappingOutcome::Miss));

        // Typed pages whose values are all unusable
        let empty_values = ocr_with_pages(vec![typed_page(vec![
            ("WagesTipsOtherCompensation", ""),
            ("EmployerName", "   "),
        ])]);
        assert!(matches!(
            map_typed_fields(DocType::W2, map, &empty_values),
            MappingOutcome::Miss
        ));
    }

    #[test]
    fn test_unknown_tokens_are_ignored() {
        let registry = TypeRegistry::new("test-v1").unwrap();
        let map = registry.field_map(DocType::W2).unwrap();
        let ocr = ocr_with_pages(vec![typed_page(vec![
            ("SomethingUnmapped", "42"),
            ("EmployerName", "Acme"),
        ])]);

        let MappingOutcome::Mapped(tree) = map_typed_fields(DocType::W2, map, &ocr) else {
            panic!("expected a mapped tree");
        };
        assert_eq!(tree["employer"]["name"], json!("Acme"));
        assert!(tree.get("SomethingUnmapped").is_none());
    }
}
