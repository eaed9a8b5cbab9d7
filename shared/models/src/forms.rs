//! Canonical schemas for standardized tax forms
//!
//! Every field is optional and defaults to null; serializing one of
//! these structs always emits every defined key, which is the schema
//! completeness invariant the extraction pipeline relies on. Monetary
//! leaves are unrounded `f64` values, negatives already normalized from
//! parenthetical or minus-sign notation by the currency parser.

use serde::{Deserialize, Serialize};

/// U.S. Individual Income Tax Return (Form 1040)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndividualReturn {
    pub taxpayer: TaxpayerInfo,
    pub filing_status: Option<String>,
    pub tax_year: Option<i32>,
    pub income: IndividualIncome,
    pub tax_and_payments: TaxAndPayments,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxpayerInfo {
    pub name: Option<String>,
    pub ssn: Option<String>,
    pub spouse_name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndividualIncome {
    pub wages: Option<f64>,
    pub interest_income: Option<f64>,
    pub dividend_income: Option<f64>,
    pub business_income: Option<f64>,
    pub capital_gain: Option<f64>,
    /// Rental real estate, royalties, partnerships, S corporations
    pub schedule_e_income: Option<f64>,
    pub other_income: Option<f64>,
    pub total_income: Option<f64>,
    pub adjusted_gross_income: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxAndPayments {
    pub taxable_income: Option<f64>,
    pub total_tax: Option<f64>,
    pub federal_withholding: Option<f64>,
    pub refund_amount: Option<f64>,
    pub amount_owed: Option<f64>,
}

/// Business entity return (Forms 1120, 1120-S and 1065 share this shape)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessReturn {
    pub entity: EntityInfo,
    pub tax_year: Option<i32>,
    pub income: BusinessIncome,
    pub deductions: BusinessDeductions,
    pub schedule_k: ScheduleK,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityInfo {
    pub name: Option<String>,
    pub ein: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessIncome {
    pub gross_receipts: Option<f64>,
    pub returns_and_allowances: Option<f64>,
    pub cost_of_goods_sold: Option<f64>,
    pub gross_profit: Option<f64>,
    pub other_income: Option<f64>,
    pub total_income: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessDeductions {
    pub officer_compensation: Option<f64>,
    pub salaries_and_wages: Option<f64>,
    pub rents: Option<f64>,
    pub taxes_and_licenses: Option<f64>,
    pub interest_expense: Option<f64>,
    pub depreciation: Option<f64>,
    pub other_deductions: Option<f64>,
    pub total_deductions: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleK {
    pub ordinary_business_income: Option<f64>,
    pub net_rental_income: Option<f64>,
    pub guaranteed_payments: Option<f64>,
    /// Cash and property distributions to partners/shareholders
    pub distributions: Option<f64>,
}

/// Wage and Tax Statement (Form W-2)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WageStatement {
    pub employee: EmployeeInfo,
    pub employer: EmployerInfo,
    pub tax_year: Option<i32>,
    pub wages: WageBoxes,
    pub withholding: WithholdingBoxes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeInfo {
    pub name: Option<String>,
    pub ssn: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployerInfo {
    pub name: Option<String>,
    pub ein: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WageBoxes {
    pub wages_tips_other_comp: Option<f64>,
    pub social_security_wages: Option<f64>,
    pub medicare_wages: Option<f64>,
    pub social_security_tips: Option<f64>,
    pub allocated_tips: Option<f64>,
    pub dependent_care_benefits: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WithholdingBoxes {
    pub federal_income_tax: Option<f64>,
    pub social_security_tax: Option<f64>,
    pub medicare_tax: Option<f64>,
    pub state_income_tax: Option<f64>,
    pub local_income_tax: Option<f64>,
}

/// Miscellaneous Income (Form 1099-MISC / 1099-NEC)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1099 {
    pub payer: PayerInfo,
    pub recipient: RecipientInfo,
    pub tax_year: Option<i32>,
    pub amounts: Form1099Amounts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayerInfo {
    pub name: Option<String>,
    pub tin: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipientInfo {
    pub name: Option<String>,
    pub tin: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1099Amounts {
    pub nonemployee_compensation: Option<f64>,
    pub rents: Option<f64>,
    pub royalties: Option<f64>,
    pub other_income: Option<f64>,
    pub federal_tax_withheld: Option<f64>,
}
