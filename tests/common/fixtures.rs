use chrono::NaiveDate;
use quire::{InvoiceRecord, LineItem};
use rust_decimal::Decimal;

pub fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).expect("valid date")
}

pub fn line_item(label: &str, amount: Decimal) -> LineItem {
    LineItem {
        label: Some(label.to_string()),
        date_from: day(2, 1),
        date_to: day(3, 1),
        amount,
    }
}

/// The three-utility invoice used across tests.
pub fn invoice(number: &str) -> InvoiceRecord {
    InvoiceRecord {
        invoice_number: Some(number.to_string()),
        invoice_date: day(3, 1),
        address: Some("123 Main Street, Springfield".to_string()),
        owners: Some("John Doe, Jane Doe".to_string()),
        property_label: Some("Apartment A-12".to_string()),
        total: Decimal::new(25075, 2),
        line_items: vec![
            line_item("Electricity", Decimal::new(12050, 2)),
            line_item("Water", Decimal::new(8025, 2)),
            line_item("Gas", Decimal::new(5000, 2)),
        ],
    }
}

pub fn empty_invoice(number: &str) -> InvoiceRecord {
    InvoiceRecord {
        total: Decimal::ZERO,
        line_items: Vec::new(),
        ..invoice(number)
    }
}

/// An invoice with enough line items to run over several pages.
pub fn long_invoice(number: &str, items: usize) -> InvoiceRecord {
    InvoiceRecord {
        line_items: (1..=items)
            .map(|i| line_item(&format!("Meter {i}"), Decimal::new(1000 + i as i64, 2)))
            .collect(),
        ..invoice(number)
    }
}

pub fn batch(count: usize) -> Vec<InvoiceRecord> {
    (1..=count).map(|i| invoice(&format!("INV-{i:03}"))).collect()
}
