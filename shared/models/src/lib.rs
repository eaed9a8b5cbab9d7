//! # Crestline Core Domain Models
//!
//! Domain models for the Crestline document understanding and
//! verification engine. Everything a loan-underwriting deal produces on
//! its way from OCR output to verified structured data lives here:
//! document records with their processing-stage state machine,
//! extraction records, the canonical per-type document schemas,
//! discrepancies with their resolution results, verification reports
//! and human-review items.
//!
//! All models serialize with serde; canonical document schemas are
//! struct-of-optionals so a serialized tree always contains every
//! defined key (null when unknown).

pub mod discrepancy;
pub mod doc_type;
pub mod document;
pub mod extraction;
pub mod forms;
pub mod line_map;
pub mod ocr;
pub mod review;
pub mod schema;
pub mod statements;
pub mod verification;

#[cfg(test)]
pub mod property_tests;

pub use discrepancy::{CheckKind, Discrepancy, ResolutionMethod, ResolutionResult};
pub use doc_type::{ClassificationConfidence, DocType};
pub use document::{DocumentRecord, ProcessingStage};
pub use extraction::{ExtractionMethod, ExtractionRecord, UsageMetrics, ValidationError};
pub use forms::{
    BusinessReturn, Form1099, IndividualReturn, WageStatement,
};
pub use line_map::{labels_for_path, line_labels_for, LineLabel};
pub use ocr::{KeyValuePair, OcrAnalysis, OcrTable, TypedField, TypedFormPage};
pub use review::{ReviewItem, ReviewStatus};
pub use schema::{is_entirely_empty, StructuredDocument};
pub use statements::{
    BalanceSheetDoc, BankStatementDoc, ProfitAndLossDoc, RentRollDoc,
};
pub use verification::{CheckResult, CheckStatus, VerificationReport};
