//! Form line-label mapping
//!
//! Maps canonical schema paths to the key labels the OCR adapter
//! reports for them on each form family. Extraction's OCR-comparison
//! checks and the resolver's re-read strategy both go through this
//! table, so a structured value is always re-derived from the same
//! printed line it came from.

use crate::doc_type::DocType;

/// One schema path with the OCR key labels that carry its value
#[derive(Debug, Clone, Copy)]
pub struct LineLabel {
    pub path: &'static str,
    /// Lowercased label fragments, most specific first; form line
    /// numbers ("line 11") count as labels
    pub labels: &'static [&'static str],
}

/// Numeric schema paths with their printed source labels, per type.
/// Only paths listed here participate in OCR-vs-structured checks.
pub fn line_labels_for(doc_type: DocType) -> &'static [LineLabel] {
    match doc_type {
        DocType::Form1040 => &[
            LineLabel {
                path: "income.wages",
                labels: &["wages, salaries, tips", "line 1a", "line 1"],
            },
            LineLabel {
                path: "income.total_income",
                labels: &["total income", "line 9"],
            },
            LineLabel {
                path: "income.adjusted_gross_income",
                labels: &["adjusted gross income", "line 11"],
            },
            LineLabel {
                path: "tax_and_payments.taxable_income",
                labels: &["taxable income", "line 15"],
            },
            LineLabel {
                path: "tax_and_payments.total_tax",
                labels: &["total tax", "line 24"],
            },
            LineLabel {
                path: "tax_and_payments.federal_withholding",
                labels: &["federal income tax withheld", "line 25"],
            },
        ],
        DocType::Form1120 | DocType::Form1120S | DocType::Form1065 => &[
            LineLabel {
                path: "income.gross_receipts",
                labels: &["gross receipts or sales", "line 1a"],
            },
            LineLabel {
                path: "income.cost_of_goods_sold",
                labels: &["cost of goods sold", "line 2"],
            },
            LineLabel {
                path: "income.gross_profit",
                labels: &["gross profit", "line 3"],
            },
            LineLabel {
                path: "income.total_income",
                labels: &["total income", "line 11", "line 6"],
            },
            LineLabel {
                path: "deductions.total_deductions",
                labels: &["total deductions", "line 27", "line 20"],
            },
            LineLabel {
                path: "schedule_k.distributions",
                labels: &["distributions", "line 19a", "line 16d"],
            },
        ],
        DocType::W2 => &[
            LineLabel {
                path: "wages.wages_tips_other_comp",
                labels: &["wages, tips, other compensation", "box 1"],
            },
            LineLabel {
                path: "withholding.federal_income_tax",
                labels: &["federal income tax withheld", "box 2"],
            },
            LineLabel {
                path: "wages.social_security_wages",
                labels: &["social security wages", "box 3"],
            },
            LineLabel {
                path: "withholding.social_security_tax",
                labels: &["social security tax withheld", "box 4"],
            },
            LineLabel {
                path: "wages.medicare_wages",
                labels: &["medicare wages and tips", "box 5"],
            },
            LineLabel {
                path: "withholding.medicare_tax",
                labels: &["medicare tax withheld", "box 6"],
            },
        ],
        DocType::Form1099 => &[
            LineLabel {
                path: "amounts.nonemployee_compensation",
                labels: &["nonemployee compensation", "box 1"],
            },
            LineLabel {
                path: "amounts.rents",
                labels: &["rents", "box 1"],
            },
            LineLabel {
                path: "amounts.federal_tax_withheld",
                labels: &["federal income tax withheld", "box 4"],
            },
        ],
        DocType::BankStatement => &[
            LineLabel {
                path: "balances.beginning_balance",
                labels: &["beginning balance", "previous balance", "opening balance"],
            },
            LineLabel {
                path: "balances.ending_balance",
                labels: &["ending balance", "new balance", "closing balance"],
            },
            LineLabel {
                path: "activity.total_deposits",
                labels: &["deposits and additions", "total deposits"],
            },
            LineLabel {
                path: "activity.total_withdrawals",
                labels: &["withdrawals and subtractions", "total withdrawals"],
            },
            LineLabel {
                path: "activity.total_fees",
                labels: &["service fees", "total fees", "fees"],
            },
        ],
        DocType::ProfitAndLoss => &[
            LineLabel {
                path: "revenue.total_revenue",
                labels: &["total revenue", "total income", "total sales"],
            },
            LineLabel {
                path: "cost_of_goods_sold",
                labels: &["cost of goods sold", "total cogs"],
            },
            LineLabel {
                path: "gross_profit",
                labels: &["gross profit"],
            },
            LineLabel {
                path: "expenses.total_operating_expenses",
                labels: &["total operating expenses", "total expenses"],
            },
            LineLabel {
                path: "net_income",
                labels: &["net income", "net profit", "net operating income"],
            },
        ],
        DocType::BalanceSheet => &[
            LineLabel {
                path: "assets.total_assets",
                labels: &["total assets"],
            },
            LineLabel {
                path: "liabilities.total_liabilities",
                labels: &["total liabilities"],
            },
            LineLabel {
                path: "equity.total_equity",
                labels: &["total equity", "total shareholders' equity", "total owner's equity"],
            },
        ],
        DocType::RentRoll => &[
            LineLabel {
                path: "totals.total_monthly_rent",
                labels: &["total monthly rent", "total rent"],
            },
        ],
        DocType::Other => &[],
    }
}

/// Find the line labels for one schema path on a form.
pub fn labels_for_path(doc_type: DocType, path: &str) -> Option<&'static [&'static str]> {
    line_labels_for(doc_type)
        .iter()
        .find(|entry| entry.path == path)
        .map(|entry| entry.labels)
}
