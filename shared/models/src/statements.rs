//! Canonical schemas for financial statements and property documents
//!
//! Same conventions as the tax-form schemas: every field optional and
//! null by default, arrays default empty, monetary leaves unrounded.

use serde::{Deserialize, Serialize};

/// Deposit account statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankStatementDoc {
    pub account: BankAccountInfo,
    pub period: StatementPeriod,
    pub balances: BalanceSummary,
    pub activity: ActivitySummary,
    pub transactions: Vec<BankTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankAccountInfo {
    pub institution_name: Option<String>,
    pub account_number: Option<String>,
    pub account_type: Option<String>,
    pub holder_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementPeriod {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceSummary {
    pub beginning_balance: Option<f64>,
    pub ending_balance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivitySummary {
    pub total_deposits: Option<f64>,
    pub total_withdrawals: Option<f64>,
    pub total_fees: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankTransaction {
    pub date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
}

/// Profit and loss statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfitAndLossDoc {
    pub business_name: Option<String>,
    pub period: StatementPeriod,
    pub revenue: RevenueSection,
    pub cost_of_goods_sold: Option<f64>,
    pub gross_profit: Option<f64>,
    pub expenses: ExpenseSection,
    pub net_income: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueSection {
    pub gross_sales: Option<f64>,
    pub returns_and_allowances: Option<f64>,
    pub total_revenue: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseSection {
    pub payroll: Option<f64>,
    pub rent: Option<f64>,
    pub utilities: Option<f64>,
    pub insurance: Option<f64>,
    pub depreciation: Option<f64>,
    pub interest: Option<f64>,
    pub other_expenses: Option<f64>,
    pub total_operating_expenses: Option<f64>,
}

/// Balance sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceSheetDoc {
    pub business_name: Option<String>,
    pub as_of_date: Option<String>,
    pub assets: AssetSection,
    pub liabilities: LiabilitySection,
    pub equity: EquitySection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSection {
    pub cash: Option<f64>,
    pub accounts_receivable: Option<f64>,
    pub inventory: Option<f64>,
    pub other_current_assets: Option<f64>,
    pub total_current_assets: Option<f64>,
    pub fixed_assets: Option<f64>,
    pub accumulated_depreciation: Option<f64>,
    pub other_assets: Option<f64>,
    pub total_assets: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiabilitySection {
    pub accounts_payable: Option<f64>,
    pub credit_lines: Option<f64>,
    pub current_portion_long_term_debt: Option<f64>,
    pub other_current_liabilities: Option<f64>,
    pub total_current_liabilities: Option<f64>,
    pub long_term_debt: Option<f64>,
    pub other_liabilities: Option<f64>,
    pub total_liabilities: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquitySection {
    pub capital_stock: Option<f64>,
    pub retained_earnings: Option<f64>,
    pub owner_draws: Option<f64>,
    pub total_equity: Option<f64>,
}

/// Rent roll
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentRollDoc {
    pub property: PropertyInfo,
    pub as_of_date: Option<String>,
    pub units: Vec<RentRollUnit>,
    pub totals: RentRollTotals,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyInfo {
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentRollUnit {
    pub unit: Option<String>,
    pub tenant: Option<String>,
    pub square_feet: Option<f64>,
    pub monthly_rent: Option<f64>,
    pub lease_start: Option<String>,
    pub lease_end: Option<String>,
    pub occupied: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentRollTotals {
    pub total_units: Option<f64>,
    pub occupied_units: Option<f64>,
    pub total_monthly_rent: Option<f64>,
    pub vacancy_rate: Option<f64>,
}
