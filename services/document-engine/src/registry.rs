//! Type registry
//!
//! Explicit registry of per-type instruction templates and canonical
//! schemas, constructed once at startup and passed by reference into
//! the classifier, extractor and validator. Replaces any module-level
//! lookup table so nothing depends on hidden global state.

use handlebars::Handlebars;
use serde_json::json;

use crestline_models::{DocType, StructuredDocument};
use crestline_utils::{EngineError, EngineResult};

/// Kind of leaf a deterministic field token maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Pass through trimmed
    Text,
    /// Through the currency parser
    Money,
    /// Integer year
    Year,
}

/// One deterministic mapping entry: OCR field token -> schema dot-path
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub token: &'static str,
    pub path: &'static str,
    pub kind: FieldKind,
}

/// W-2 is the standardized-form family the OCR adapter reports
/// richly-typed fields for.
const W2_FIELD_MAP: &[FieldMapping] = &[
    FieldMapping { token: "EmployeeName", path: "employee.name", kind: FieldKind::Text },
    FieldMapping { token: "EmployeeSsn", path: "employee.ssn", kind: FieldKind::Text },
    FieldMapping { token: "EmployeeAddress", path: "employee.address", kind: FieldKind::Text },
    FieldMapping { token: "EmployerName", path: "employer.name", kind: FieldKind::Text },
    FieldMapping { token: "EmployerEin", path: "employer.ein", kind: FieldKind::Text },
    FieldMapping { token: "EmployerAddress", path: "employer.address", kind: FieldKind::Text },
    FieldMapping { token: "TaxYear", path: "tax_year", kind: FieldKind::Year },
    FieldMapping {
        token: "WagesTipsOtherCompensation",
        path: "wages.wages_tips_other_comp",
        kind: FieldKind::Money,
    },
    FieldMapping {
        token: "SocialSecurityWages",
        path: "wages.social_security_wages",
        kind: FieldKind::Money,
    },
    FieldMapping {
        token: "MedicareWagesAndTips",
        path: "wages.medicare_wages",
        kind: FieldKind::Money,
    },
    FieldMapping {
        token: "SocialSecurityTips",
        path: "wages.social_security_tips",
        kind: FieldKind::Money,
    },
    FieldMapping { token: "AllocatedTips", path: "wages.allocated_tips", kind: FieldKind::Money },
    FieldMapping {
        token: "DependentCareBenefits",
        path: "wages.dependent_care_benefits",
        kind: FieldKind::Money,
    },
    FieldMapping {
        token: "FederalIncomeTaxWithheld",
        path: "withholding.federal_income_tax",
        kind: FieldKind::Money,
    },
    FieldMapping {
        token: "SocialSecurityTaxWithheld",
        path: "withholding.social_security_tax",
        kind: FieldKind::Money,
    },
    FieldMapping {
        token: "MedicareTaxWithheld",
        path: "withholding.medicare_tax",
        kind: FieldKind::Money,
    },
    FieldMapping {
        token: "StateIncomeTax",
        path: "withholding.state_income_tax",
        kind: FieldKind::Money,
    },
    FieldMapping {
        token: "LocalIncomeTax",
        path: "withholding.local_income_tax",
        kind: FieldKind::Money,
    },
];

const EXTRACTION_TEMPLATE: &str = r#"You are a financial data extraction specialist working on loan-underwriting documents. Extract structured data from the {{{type_name}}} provided in the user message.

{{{guidance}}}

Return ONLY a JSON object with exactly this structure, no surrounding prose:

{{{skeleton}}}

Rules:
- Every field shown above must be present in your response. Use null for anything not visible in the document.
- Monetary values are plain unrounded numbers with no currency symbols or thousands separators. Render values in parentheses or with a leading minus sign as negative numbers.
- Years are four-digit integers.
- Do not invent values; null is always acceptable."#;

/// Registry of prompt templates, canonical schemas and deterministic
/// field maps, keyed by document type
pub struct TypeRegistry {
    templates: Handlebars<'static>,
    prompt_version: String,
}

impl TypeRegistry {
    pub fn new(prompt_version: impl Into<String>) -> EngineResult<Self> {
        let mut templates = Handlebars::new();
        templates
            .register_template_string("extraction", EXTRACTION_TEMPLATE)
            .map_err(|e| EngineError::configuration(e.to_string()))?;

        Ok(Self { templates, prompt_version: prompt_version.into() })
    }

    pub fn prompt_version(&self) -> &str {
        &self.prompt_version
    }

    /// The canonical empty schema for a type, `None` for the catch-all.
    pub fn schema_for(&self, doc_type: DocType) -> Option<StructuredDocument> {
        StructuredDocument::empty_for(doc_type)
    }

    /// Deterministic field map, present only for the standardized-form
    /// family with richly-typed OCR output.
    pub fn field_map(&self, doc_type: DocType) -> Option<&'static [FieldMapping]> {
        match doc_type {
            DocType::W2 => Some(W2_FIELD_MAP),
            _ => None,
        }
    }

    /// Render the type-specific extraction instruction. Types without
    /// a registered schema are an explicit error, not a panic.
    pub fn instruction_for(&self, doc_type: DocType) -> EngineResult<String> {
        let schema = self
            .schema_for(doc_type)
            .ok_or_else(|| EngineError::unsupported_document_type(doc_type.to_string()))?;
        let skeleton = serde_json::to_string_pretty(&schema.canonical_value())
            .map_err(|e| EngineError::internal(e.to_string()))?;

        let rendered = self
            .templates
            .render(
                "extraction",
                &json!({
                    "type_name": type_display_name(doc_type),
                    "guidance": type_guidance(doc_type),
                    "skeleton": skeleton,
                }),
            )
            .map_err(|e| EngineError::internal(e.to_string()))?;
        Ok(rendered)
    }
}

fn type_display_name(doc_type: DocType) -> &'static str {
    match doc_type {
        DocType::Form1040 => "Form 1040 individual income tax return",
        DocType::Form1120 => "Form 1120 corporate income tax return",
        DocType::Form1120S => "Form 1120-S S-corporation income tax return",
        DocType::Form1065 => "Form 1065 partnership income tax return",
        DocType::W2 => "Form W-2 wage and tax statement",
        DocType::Form1099 => "Form 1099 information return",
        DocType::BankStatement => "bank statement",
        DocType::ProfitAndLoss => "profit and loss statement",
        DocType::BalanceSheet => "balance sheet",
        DocType::RentRoll => "rent roll",
        DocType::Other => "document",
    }
}

fn type_guidance(doc_type: DocType) -> &'static str {
    match doc_type {
        DocType::Form1040 => {
            "Line numbers follow the current Form 1040 layout: wages on line 1, \
             total income on line 9, adjusted gross income on line 11."
        }
        DocType::Form1120 | DocType::Form1120S | DocType::Form1065 => {
            "Income lines: gross receipts 1a, cost of goods sold 2, gross profit 3. \
             Schedule K carries distributions to shareholders or partners."
        }
        DocType::W2 => {
            "Use the numbered boxes: box 1 wages, box 2 federal withholding, \
             box 3 social security wages, box 5 medicare wages."
        }
        DocType::Form1099 => "Use the numbered boxes on the form.",
        DocType::BankStatement => {
            "Summary section carries beginning/ending balances and totals for \
             deposits, withdrawals and fees. List individual transactions when printed."
        }
        DocType::ProfitAndLoss => {
            "Capture the revenue section, cost of goods sold, gross profit, \
             operating expenses and net income exactly as printed."
        }
        DocType::BalanceSheet => {
            "Capture the assets, liabilities and equity sections with their \
             printed subtotals and totals."
        }
        DocType::RentRoll => {
            "List every unit row with tenant, rent and lease dates, plus the \
             printed totals."
        }
        DocType::Other => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_contains_every_schema_key() {
        let registry = TypeRegistry::new("test-v1").unwrap();
        let instruction = registry.instruction_for(DocType::W2).unwrap();
        for key in ["wages_tips_other_comp", "federal_income_tax", "employer"] {
            assert!(instruction.contains(key), "instruction missing {}", key);
        }
        assert!(instruction.contains("null"));
    }

    #[test]
    fn test_catch_all_type_is_explicit_error() {
        let registry = TypeRegistry::new("test-v1").unwrap();
        let error = registry.instruction_for(DocType::Other).unwrap_err();
        assert_eq!(error.error_code(), "UNSUPPORTED_DOCUMENT_TYPE");
    }

    #[test]
    fn test_field_map_only_for_standardized_family() {
        let registry = TypeRegistry::new("test-v1").unwrap();
        assert!(registry.field_map(DocType::W2).is_some());
        assert!(registry.field_map(DocType::BankStatement).is_none());
        assert!(registry.field_map(DocType::Form1040).is_none());
    }

    #[test]
    fn test_w2_map_paths_exist_in_schema() {
        let registry = TypeRegistry::new("test-v1").unwrap();
        let schema = registry.schema_for(DocType::W2).unwrap().canonical_value();
        for mapping in registry.field_map(DocType::W2).unwrap() {
            assert!(
                crestline_utils::paths::get_path(&schema, mapping.path).is_some(),
                "unknown schema path {}",
                mapping.path
            );
        }
    }
}
