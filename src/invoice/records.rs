//! Invoice input records.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    #[serde(default)]
    pub invoice_number: Option<String>,
    pub invoice_date: NaiveDate,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub owners: Option<String>,
    /// Short name of the billed property.
    #[serde(default, alias = "realEstateAka")]
    pub property_label: Option<String>,
    pub total: Decimal,
    #[serde(default, alias = "poses")]
    pub line_items: Vec<LineItem>,
}

/// One billed utility over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, alias = "utilityAka")]
    pub label: Option<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub amount: Decimal,
}

/// Reads a JSON array of records.
pub fn records_from_json(json: &str) -> Result<Vec<InvoiceRecord>, serde_json::Error> {
    serde_json::from_str(json)
}

/// `symbol` followed by the amount with two decimals, midpoints rounded away
/// from zero.
pub fn format_amount(symbol: &str, amount: &Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{symbol}{rounded:.2}")
}
