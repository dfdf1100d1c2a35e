//! Invoice records and the documents composed from them.

mod builder;
mod records;
mod styles;

pub use builder::InvoiceComposer;
pub use records::{InvoiceRecord, LineItem, format_amount, records_from_json};
pub use styles::InvoiceStyles;
