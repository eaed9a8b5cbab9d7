//! Intra-document math checks
//!
//! Arithmetic identities a single document must satisfy internally. A
//! check runs only when every operand it needs is present; missing
//! leaves are not failures, they simply leave nothing to verify.

use serde_json::Value;
use uuid::Uuid;

use crestline_models::{CheckKind, CheckResult, CheckStatus, DocType};
use crestline_utils::config::VerificationConfig;
use crestline_utils::paths::get_number;

/// Run every applicable identity for one document's structured data.
pub fn run_math_checks(
    document_id: Uuid,
    doc_type: DocType,
    data: &Value,
    config: &VerificationConfig,
) -> Vec<CheckResult> {
    let mut results = Vec::new();

    match doc_type {
        DocType::ProfitAndLoss => {
            check_identity(
                &mut results,
                document_id,
                "gross_profit_equation",
                "gross_profit",
                get_number(data, "gross_profit"),
                get_number(data, "revenue.total_revenue")
                    .zip(get_number(data, "cost_of_goods_sold"))
                    .map(|(revenue, cogs)| revenue - cogs),
                config,
            );
            check_identity(
                &mut results,
                document_id,
                "net_income_equation",
                "net_income",
                get_number(data, "net_income"),
                get_number(data, "gross_profit")
                    .zip(get_number(data, "expenses.total_operating_expenses"))
                    .map(|(gross, expenses)| gross - expenses),
                config,
            );
        }
        DocType::Form1120 | DocType::Form1120S | DocType::Form1065 => {
            let receipts = get_number(data, "income.gross_receipts");
            let returns = get_number(data, "income.returns_and_allowances").unwrap_or(0.0);
            check_identity(
                &mut results,
                document_id,
                "gross_profit_equation",
                "income.gross_profit",
                get_number(data, "income.gross_profit"),
                receipts
                    .zip(get_number(data, "income.cost_of_goods_sold"))
                    .map(|(gross, cogs)| gross - returns - cogs),
                config,
            );
        }
        DocType::BalanceSheet => {
            check_identity(
                &mut results,
                document_id,
                "balance_sheet_equation",
                "assets.total_assets",
                get_number(data, "assets.total_assets"),
                get_number(data, "liabilities.total_liabilities")
                    .zip(get_number(data, "equity.total_equity"))
                    .map(|(liabilities, equity)| liabilities + equity),
                config,
            );
        }
        DocType::BankStatement => {
            let beginning = get_number(data, "balances.beginning_balance");
            let deposits = get_number(data, "activity.total_deposits").unwrap_or(0.0);
            let withdrawals = get_number(data, "activity.total_withdrawals").unwrap_or(0.0);
            let fees = get_number(data, "activity.total_fees").unwrap_or(0.0);
            check_identity(
                &mut results,
                document_id,
                "ending_balance_equation",
                "balances.ending_balance",
                get_number(data, "balances.ending_balance"),
                beginning.map(|b| b + deposits - withdrawals - fees),
                config,
            );
        }
        _ => {}
    }

    results
}

#[allow(clippy::too_many_arguments)]
fn check_identity(
    results: &mut Vec<CheckResult>,
    document_id: Uuid,
    name: &str,
    field_path: &str,
    actual: Option<f64>,
    expected: Option<f64>,
    config: &VerificationConfig,
) {
    let (Some(actual), Some(expected)) = (actual, expected) else {
        return;
    };

    let status = if (actual - expected).abs() <= config.rounding_tolerance {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };

    let message = match status {
        CheckStatus::Pass => String::new(),
        _ => format!("{} is {} but its components compute to {}", field_path, actual, expected),
    };

    results.push(
        CheckResult::pass(name, CheckKind::Math, field_path)
            .with_status(status)
            .with_values(expected, actual)
            .with_document(document_id)
            .with_message(message),
    );
}
