//! Property-based tests for the core domain models
//!
//! Serialization round-trip consistency, schema completeness, and
//! normalization totality over generated inputs.

use proptest::option;
use proptest::prelude::*;
use uuid::Uuid;

use crate::{
    CheckKind, Discrepancy, DocType, KeyValuePair, OcrAnalysis, OcrTable, ResolutionMethod,
    ResolutionResult, StructuredDocument,
};

prop_compose! {
    fn arb_uuid()(bytes in prop::array::uniform16(0u8..)) -> Uuid {
        Uuid::from_bytes(bytes)
    }
}

fn arb_doc_type() -> impl Strategy<Value = DocType> {
    prop_oneof![
        Just(DocType::Form1040),
        Just(DocType::Form1120),
        Just(DocType::Form1120S),
        Just(DocType::Form1065),
        Just(DocType::W2),
        Just(DocType::Form1099),
        Just(DocType::BankStatement),
        Just(DocType::ProfitAndLoss),
        Just(DocType::BalanceSheet),
        Just(DocType::RentRoll),
        Just(DocType::Other),
    ]
}

fn arb_resolution_method() -> impl Strategy<Value = ResolutionMethod> {
    prop_oneof![
        Just(ResolutionMethod::FormatNormalization),
        Just(ResolutionMethod::RoundingTolerance),
        Just(ResolutionMethod::OcrReRead),
        Just(ResolutionMethod::OcrAlternativeLabel),
        Just(ResolutionMethod::ModelReAnalysis),
        Just(ResolutionMethod::BatchedModelReAnalysis),
    ]
}

prop_compose! {
    fn arb_key_value_pair()(
        key in "[A-Za-z ,]{3,40}",
        value in "[A-Za-z0-9.,$() -]{1,20}",
        confidence in 0.0..1.0f64,
        page in 1..50u32
    ) -> KeyValuePair {
        KeyValuePair { key, value, confidence, page }
    }
}

prop_compose! {
    fn arb_ocr_analysis()(
        raw_text in "[A-Za-z0-9 \n]{0,500}",
        page_count in 1..50u32,
        key_value_pairs in prop::collection::vec(arb_key_value_pair(), 0..20),
        tables in prop::collection::vec(
            (1..50u32, prop::collection::vec(
                prop::collection::vec("[A-Za-z0-9.,$ ]{0,15}", 0..5), 0..5))
                .prop_map(|(page, rows)| OcrTable { page, rows }),
            0..3),
    ) -> OcrAnalysis {
        OcrAnalysis { raw_text, page_count, key_value_pairs, tables, typed_pages: Vec::new() }
    }
}

prop_compose! {
    fn arb_discrepancy()(
        document_id in arb_uuid(),
        field_path in "[a-z_.]{3,40}",
        extracted in "[0-9,.$()-]{1,12}",
        expected in option::of("[0-9,.$()-]{1,12}"),
        check in prop_oneof![
            Just(CheckKind::Math),
            Just(CheckKind::CrossDocument),
            Just(CheckKind::OcrComparison),
        ],
        page in option::of(1..50u32)
    ) -> Discrepancy {
        let mut d = Discrepancy::new(
            document_id,
            field_path,
            extracted,
            expected,
            check,
            "generated discrepancy",
        );
        d.page = page;
        d
    }
}

proptest! {
    /// Serialization round-trip consistency for OCR analysis payloads.
    #[test]
    fn property_ocr_analysis_round_trip(ocr in arb_ocr_analysis()) {
        let json = serde_json::to_string(&ocr).expect("serialization should succeed");
        let back: OcrAnalysis = serde_json::from_str(&json).expect("deserialization should succeed");
        prop_assert_eq!(ocr.page_count, back.page_count);
        prop_assert_eq!(ocr.key_value_pairs.len(), back.key_value_pairs.len());
        for (orig, deser) in ocr.key_value_pairs.iter().zip(back.key_value_pairs.iter()) {
            prop_assert_eq!(&orig.key, &deser.key);
            prop_assert!((orig.confidence - deser.confidence).abs() < 1e-10);
        }
    }

    /// Discrepancies survive a JSON round trip with check kinds intact.
    #[test]
    fn property_discrepancy_round_trip(discrepancy in arb_discrepancy()) {
        let json = serde_json::to_string(&discrepancy).unwrap();
        let back: Discrepancy = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(discrepancy.check, back.check);
        prop_assert_eq!(&discrepancy.field_path, &back.field_path);
        prop_assert_eq!(&discrepancy.expected_value, &back.expected_value);
    }

    /// Normalizing any printable label yields a defined variant, and
    /// normalizing a canonical label round-trips to itself.
    #[test]
    fn property_doc_type_normalization_total(label in "[ -~]{0,60}") {
        let _ = DocType::normalize(&label);
    }

    #[test]
    fn property_doc_type_canonical_round_trip(doc_type in arb_doc_type()) {
        prop_assert_eq!(DocType::normalize(doc_type.as_str()), doc_type);
    }

    /// Schema completeness invariant: the canonical empty tree for any
    /// type contains every section key and only null/empty leaves.
    #[test]
    fn property_canonical_schema_complete(doc_type in arb_doc_type()) {
        if let Some(schema) = StructuredDocument::empty_for(doc_type) {
            let value = schema.canonical_value();
            for key in StructuredDocument::section_keys(doc_type) {
                prop_assert!(value.get(key).is_some());
            }
            prop_assert!(crate::schema::is_entirely_empty(&value));
        }
    }

    /// Resolution results keep their tagged representation.
    #[test]
    fn property_resolution_result_round_trip(
        method in arb_resolution_method(),
        confidence in 0.0..1.0f64,
        value in "[0-9.]{1,10}"
    ) {
        let result = ResolutionResult::Resolved {
            value,
            confidence,
            method,
            explanation: "generated".to_string(),
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: ResolutionResult = serde_json::from_str(&json).unwrap();
        prop_assert!(back.is_resolved());
        prop_assert_eq!(back.method(), Some(method));
    }
}
