//! Canonical document-type enumeration
//!
//! Every supported financial document category, plus the normalization
//! rules that map model-returned labels onto the enumeration.

use serde::{Deserialize, Serialize};

/// Supported financial document categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    /// U.S. Individual Income Tax Return (Form 1040)
    #[serde(rename = "form_1040")]
    Form1040,
    /// U.S. Corporation Income Tax Return (Form 1120)
    #[serde(rename = "form_1120")]
    Form1120,
    /// U.S. Income Tax Return for an S Corporation (Form 1120-S)
    #[serde(rename = "form_1120_s")]
    Form1120S,
    /// U.S. Return of Partnership Income (Form 1065)
    #[serde(rename = "form_1065")]
    Form1065,
    /// Wage and Tax Statement (Form W-2)
    W2,
    /// Miscellaneous Income (Form 1099)
    #[serde(rename = "form_1099")]
    Form1099,
    /// Monthly or quarterly bank statement
    BankStatement,
    /// Profit and loss statement / income statement
    ProfitAndLoss,
    /// Balance sheet / statement of financial position
    BalanceSheet,
    /// Rent roll for an income property
    RentRoll,
    /// Catch-all for anything the classifier cannot place
    Other,
}

impl DocType {
    /// All types in classification priority order. Sub-variant forms
    /// precede their generic parents (1120-S before 1120) so pattern
    /// matching never shadows the more specific form.
    pub fn all() -> &'static [DocType] {
        &[
            DocType::Form1120S,
            DocType::Form1120,
            DocType::Form1065,
            DocType::Form1040,
            DocType::W2,
            DocType::Form1099,
            DocType::BankStatement,
            DocType::ProfitAndLoss,
            DocType::BalanceSheet,
            DocType::RentRoll,
            DocType::Other,
        ]
    }

    /// Business entity returns share one canonical schema.
    pub fn is_business_return(&self) -> bool {
        matches!(self, DocType::Form1120 | DocType::Form1120S | DocType::Form1065)
    }

    /// Normalize a free-form label (typically returned by the model
    /// classifier) onto the enumeration. Unknown labels coerce to
    /// `Other` rather than failing.
    pub fn normalize(label: &str) -> DocType {
        let token = normalize_token(label);

        match token.as_str() {
            "form_1040" | "individual_tax_return" | "personal_tax_return"
            | "individual_income_tax_return" | "form_1040_sr" => DocType::Form1040,
            "form_1120s" | "form_1120_s" | "s_corporation_return"
            | "s_corp_return" | "s_corporation_tax_return" => DocType::Form1120S,
            "form_1120" | "corporate_tax_return" | "corporation_tax_return"
            | "c_corporation_return" => DocType::Form1120,
            "form_1065" | "partnership_return" | "partnership_tax_return"
            | "partnership_income_return" => DocType::Form1065,
            "w2" | "w_2" | "form_w2" | "form_w_2" | "wage_statement"
            | "wage_and_tax_statement" => DocType::W2,
            "form_1099" | "form_1099_misc" | "form_1099_nec"
            | "miscellaneous_income" | "nonemployee_compensation" => DocType::Form1099,
            "bank_statement" | "checking_statement" | "savings_statement"
            | "account_statement" | "deposit_account_statement" => DocType::BankStatement,
            "profit_and_loss" | "profit_loss" | "profit_loss_statement" | "p_l" | "p_and_l"
            | "income_statement" | "statement_of_operations" => DocType::ProfitAndLoss,
            "balance_sheet" | "statement_of_financial_position"
            | "statement_of_financial_condition" => DocType::BalanceSheet,
            "rent_roll" | "rental_schedule" | "rent_schedule" => DocType::RentRoll,
            "other" | "unknown" | "unclassified" => DocType::Other,
            _ => DocType::Other,
        }
    }

    /// Stable wire label, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Form1040 => "form_1040",
            DocType::Form1120 => "form_1120",
            DocType::Form1120S => "form_1120_s",
            DocType::Form1065 => "form_1065",
            DocType::W2 => "w2",
            DocType::Form1099 => "form_1099",
            DocType::BankStatement => "bank_statement",
            DocType::ProfitAndLoss => "profit_and_loss",
            DocType::BalanceSheet => "balance_sheet",
            DocType::RentRoll => "rent_roll",
            DocType::Other => "other",
        }
    }
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Generic token normalization: lowercase, hyphens/spaces/dots to
/// underscores, collapsed runs, and a `form_` category prefix for labels
/// that start with a bare form number ("1120s" -> "form_1120s").
fn normalize_token(label: &str) -> String {
    let mut token = String::with_capacity(label.len());
    let mut last_was_sep = false;

    for c in label.trim().chars() {
        let mapped = match c {
            '-' | ' ' | '.' | '/' | '&' => '_',
            c => c.to_ascii_lowercase(),
        };
        if mapped == '_' {
            if !last_was_sep && !token.is_empty() {
                token.push('_');
            }
            last_was_sep = true;
        } else {
            token.push(mapped);
            last_was_sep = false;
        }
    }
    while token.ends_with('_') {
        token.pop();
    }

    // Category prefix insertion: a bare form number ("1120s", "1040")
    // becomes "form_1120s" so the alias table sees a uniform shape.
    if token.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        return format!("form_{}", token);
    }
    token
}

/// Classifier confidence levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationConfidence {
    High,
    Medium,
    None,
}

impl std::fmt::Display for ClassificationConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::None => write!(f, "none"),
        }
    }
}
