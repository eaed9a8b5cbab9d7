//! Canonical schema dispatch
//!
//! Ties each `DocType` to its struct-of-optionals schema. The generic
//! "value at path" representation exists only at the mapping boundary;
//! everything past validation speaks these types.

use serde::{Deserialize, Serialize};

use crate::doc_type::DocType;
use crate::forms::{BusinessReturn, Form1099, IndividualReturn, WageStatement};
use crate::statements::{BalanceSheetDoc, BankStatementDoc, ProfitAndLossDoc, RentRollDoc};

/// A structured document in its canonical per-type shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum StructuredDocument {
    IndividualReturn(IndividualReturn),
    BusinessReturn(BusinessReturn),
    WageStatement(WageStatement),
    Form1099(Form1099),
    BankStatement(BankStatementDoc),
    ProfitAndLoss(ProfitAndLossDoc),
    BalanceSheet(BalanceSheetDoc),
    RentRoll(RentRollDoc),
}

impl StructuredDocument {
    /// The empty (all-null) canonical instance for a type. `Other` has
    /// no canonical schema and returns `None`.
    pub fn empty_for(doc_type: DocType) -> Option<StructuredDocument> {
        match doc_type {
            DocType::Form1040 => Some(Self::IndividualReturn(IndividualReturn::default())),
            DocType::Form1120 | DocType::Form1120S | DocType::Form1065 => {
                Some(Self::BusinessReturn(BusinessReturn::default()))
            }
            DocType::W2 => Some(Self::WageStatement(WageStatement::default())),
            DocType::Form1099 => Some(Self::Form1099(Form1099::default())),
            DocType::BankStatement => Some(Self::BankStatement(BankStatementDoc::default())),
            DocType::ProfitAndLoss => Some(Self::ProfitAndLoss(ProfitAndLossDoc::default())),
            DocType::BalanceSheet => Some(Self::BalanceSheet(BalanceSheetDoc::default())),
            DocType::RentRoll => Some(Self::RentRoll(RentRollDoc::default())),
            DocType::Other => None,
        }
    }

    /// Serialize the inner schema struct only (no enum tag); this is
    /// the canonical tree stored on an `ExtractionRecord`, with every
    /// defined key present.
    pub fn canonical_value(&self) -> serde_json::Value {
        let value = match self {
            Self::IndividualReturn(d) => serde_json::to_value(d),
            Self::BusinessReturn(d) => serde_json::to_value(d),
            Self::WageStatement(d) => serde_json::to_value(d),
            Self::Form1099(d) => serde_json::to_value(d),
            Self::BankStatement(d) => serde_json::to_value(d),
            Self::ProfitAndLoss(d) => serde_json::to_value(d),
            Self::BalanceSheet(d) => serde_json::to_value(d),
            Self::RentRoll(d) => serde_json::to_value(d),
        };
        value.unwrap_or(serde_json::Value::Null)
    }

    /// Top-level section keys of the canonical schema, in declaration
    /// order. Used for section-by-section validation and for detecting
    /// an entirely empty deterministic mapping pass.
    pub fn section_keys(doc_type: DocType) -> &'static [&'static str] {
        match doc_type {
            DocType::Form1040 => {
                &["taxpayer", "filing_status", "tax_year", "income", "tax_and_payments"]
            }
            DocType::Form1120 | DocType::Form1120S | DocType::Form1065 => {
                &["entity", "tax_year", "income", "deductions", "schedule_k"]
            }
            DocType::W2 => &["employee", "employer", "tax_year", "wages", "withholding"],
            DocType::Form1099 => &["payer", "recipient", "tax_year", "amounts"],
            DocType::BankStatement => {
                &["account", "period", "balances", "activity", "transactions"]
            }
            DocType::ProfitAndLoss => &[
                "business_name",
                "period",
                "revenue",
                "cost_of_goods_sold",
                "gross_profit",
                "expenses",
                "net_income",
            ],
            DocType::BalanceSheet => {
                &["business_name", "as_of_date", "assets", "liabilities", "equity"]
            }
            DocType::RentRoll => &["property", "as_of_date", "units", "totals"],
            DocType::Other => &[],
        }
    }
}

/// True when a structured tree holds no real data: every leaf is null,
/// every array empty. Used to detect a deterministic-mapping miss.
pub fn is_entirely_empty(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Array(items) => items.iter().all(is_entirely_empty),
        serde_json::Value::Object(map) => map.values().all(is_entirely_empty),
        _ => false,
    }
}
