//! Composition of invoice records into documents.
//!
//! A batch document opens with a summary page followed by one section per
//! record; the single-invoice document is just the record's section. Every
//! section carries the same footer with the generation time and `Page N of M`.

use super::records::{InvoiceRecord, LineItem, format_amount};
use super::styles::InvoiceStyles;
use crate::config::{ConfigError, EngineConfig, format_day};
use chrono::NaiveDate;
use quire_idf::{
    BlockBuilder, Document, DocumentBuilder, DynamicField, PageSetup, SectionBuilder,
};
use quire_style::{Border, Margins, StyleAttributes, StyleRegistry, TextAlign};
use quire_types::Color;
use quire_types::units::cm;
use std::sync::Arc;

const ALTERNATE_ROW_SHADING: Color = Color::rgb(245, 245, 245);
const NO_CHARGES: &str = "No utility charges found";

/// Builds invoice documents against one style registry and configuration.
#[derive(Debug, Clone)]
pub struct InvoiceComposer<'a> {
    config: &'a EngineConfig,
    registry: Arc<StyleRegistry>,
    styles: InvoiceStyles,
}

impl<'a> InvoiceComposer<'a> {
    pub fn new(config: &'a EngineConfig, registry: Arc<StyleRegistry>, styles: InvoiceStyles) -> Self {
        Self {
            config,
            registry,
            styles,
        }
    }

    /// The summary page followed by each record, headed `INVOICE (i of n)`.
    pub fn batch_document(&self, records: &[InvoiceRecord]) -> Result<Document, crate::PipelineError> {
        let mut doc = self.document_builder().with_title(self.config.title.clone());
        self.add_title_page(&mut doc, records.len());
        for (index, record) in records.iter().enumerate() {
            let heading = format!("INVOICE ({} of {})", index + 1, records.len());
            self.add_invoice(&mut doc, record, &heading)?;
        }
        Ok(doc.build()?)
    }

    /// One record without a summary page, headed `INVOICE`.
    pub fn single_document(&self, record: &InvoiceRecord) -> Result<Document, crate::PipelineError> {
        let title = match record.invoice_number.as_deref().map(str::trim) {
            Some(number) if !number.is_empty() => format!("Invoice {number}"),
            _ => "Invoice".to_string(),
        };
        let mut doc = self.document_builder().with_title(title);
        self.add_invoice(&mut doc, record, "INVOICE")?;
        Ok(doc.build()?)
    }

    fn document_builder(&self) -> DocumentBuilder {
        DocumentBuilder::new(self.registry.clone()).with_placeholder(self.config.placeholder.clone())
    }

    fn page_setup(&self, top_margin: f32) -> PageSetup {
        PageSetup::default()
            .with_size(self.config.page_size)
            .with_margins(Margins::new(top_margin, cm(2.0), cm(2.5), cm(2.0)))
    }

    fn date(&self, date: &NaiveDate) -> Result<String, ConfigError> {
        format_day(date, &self.config.date_format).map_err(|_| ConfigError::InvalidDateFormat {
            field: "dateFormat",
            pattern: self.config.date_format.clone(),
        })
    }

    fn add_title_page(&self, doc: &mut DocumentBuilder, invoice_count: usize) {
        let s = self.styles;
        let mut section = doc.add_section(self.page_setup(cm(4.0)));
        section
            .paragraph(s.header)
            .text("INVOICE BATCH REPORT")
            .align(TextAlign::Center)
            .space_after(24.0);

        let mut table = section.table();
        table.column(cm(6.0), TextAlign::Left).column(cm(6.0), TextAlign::Left);
        let mut row = table.row();
        row.cell(0)
            .paragraph(s.normal)
            .formatted("Report Information", s.subheader)
            .line_break()
            .line_break()
            .formatted("Total Invoices: ", s.label)
            .text(invoice_count.to_string())
            .line_break()
            .formatted("Generated On: ", s.label)
            .field(DynamicField::date(self.config.date_time_format.clone()))
            .line_break();
        row.cell(1)
            .paragraph(s.normal)
            .formatted("Document Structure", s.subheader)
            .line_break()
            .line_break()
            .text("\u{2022} Title Page (this page)")
            .line_break()
            .text(format!("\u{2022} {invoice_count} Individual Invoice Pages"))
            .line_break()
            .text("\u{2022} Each invoice on separate page");

        self.add_footer(&mut section);
    }

    fn add_invoice(
        &self,
        doc: &mut DocumentBuilder,
        record: &InvoiceRecord,
        heading: &str,
    ) -> Result<(), ConfigError> {
        let mut section = doc.add_section(self.page_setup(cm(2.0)));
        section
            .paragraph(self.styles.header)
            .text(heading)
            .align(TextAlign::Center);
        section.empty_paragraph(12.0);

        self.add_details(&mut section, record)?;
        self.add_line_items(&mut section, &record.line_items)?;
        self.add_total(&mut section, record);
        self.add_footer(&mut section);
        Ok(())
    }

    fn add_details(&self, section: &mut SectionBuilder<'_>, record: &InvoiceRecord) -> Result<(), ConfigError> {
        let s = self.styles;
        let invoice_date = self.date(&record.invoice_date)?;
        let mut table = section.table();
        table
            .column(cm(8.0), TextAlign::Left)
            .column(cm(8.0), TextAlign::Left)
            .space_after(12.0);
        let mut row = table.row();
        row.cell(0)
            .paragraph(s.normal)
            .formatted("Invoice Number: ", s.label)
            .text_or_placeholder(record.invoice_number.as_deref())
            .line_break()
            .formatted("Invoice Date: ", s.label)
            .text(invoice_date)
            .line_break();
        row.cell(1)
            .paragraph(s.normal)
            .align(TextAlign::Right)
            .formatted("Bill To:", s.subheader)
            .line_break()
            .formatted("Property: ", s.label)
            .text_or_placeholder(record.property_label.as_deref())
            .line_break()
            .formatted("Address: ", s.label)
            .text_or_placeholder(record.address.as_deref())
            .line_break()
            .formatted("Owners: ", s.label)
            .text_or_placeholder(record.owners.as_deref());
        Ok(())
    }

    fn add_line_items(&self, section: &mut SectionBuilder<'_>, items: &[LineItem]) -> Result<(), ConfigError> {
        let s = self.styles;
        section.paragraph(s.subheader).text("Utility Charges");

        let mut table = section.table();
        table
            .borders(0.25, Color::BLACK)
            .border_left(Border::solid(0.5, Color::BLACK))
            .border_right(Border::solid(0.5, Color::BLACK))
            .outer_edge(1.5, Color::BLACK)
            .column(cm(4.0), TextAlign::Left)
            .column(cm(3.0), TextAlign::Center)
            .column(cm(3.0), TextAlign::Center)
            .column(cm(3.0), TextAlign::Right);

        let mut heading = table.row();
        heading
            .heading()
            .min_height(18.0)
            .shading(Color::DARK_BLUE)
            .font(StyleAttributes::new().color(Color::WHITE).bold());
        for (column, label) in ["Utility", "From Date", "To Date", "Amount"].into_iter().enumerate() {
            heading.cell(column).paragraph(s.table_header).text(label);
        }

        if items.is_empty() {
            let mut row = table.row();
            row.min_height(15.0);
            let mut cell = row.cell(0);
            cell.merge_right(3).align(TextAlign::Center);
            cell.paragraph(s.table_cell)
                .text(NO_CHARGES)
                .font(StyleAttributes::new().italic());
            return Ok(());
        }

        for (index, item) in items.iter().enumerate() {
            let from = self.date(&item.date_from)?;
            let to = self.date(&item.date_to)?;
            let mut row = table.row();
            row.min_height(15.0);
            if (index + 1) % 2 == 0 {
                row.shading(ALTERNATE_ROW_SHADING);
            }
            row.cell(0).paragraph(s.table_cell).text_or_placeholder(item.label.as_deref());
            row.cell(1).paragraph(s.table_cell).text(from);
            row.cell(2).paragraph(s.table_cell).text(to);
            row.cell(3)
                .paragraph(s.table_cell)
                .text(format_amount(&self.config.currency_symbol, &item.amount));
        }
        Ok(())
    }

    fn add_total(&self, section: &mut SectionBuilder<'_>, record: &InvoiceRecord) {
        let s = self.styles;
        section.empty_paragraph(12.0);

        let mut table = section.table();
        table
            .column(cm(10.0), TextAlign::Left)
            .column(cm(3.0), TextAlign::Left)
            .column(cm(3.0), TextAlign::Left);
        let mut row = table.row();
        row.cell(0).paragraph(s.normal);
        let amount = format_amount(&self.config.currency_symbol, &record.total);
        for (column, text) in [(1, "TOTAL:".to_string()), (2, amount)] {
            let mut cell = row.cell(column);
            cell.border_top(Border::solid(1.0, Color::BLACK))
                .border_bottom(Border::solid(2.0, Color::BLACK));
            cell.paragraph(s.total).text(text).align(TextAlign::Right);
        }
    }

    fn add_footer(&self, section: &mut SectionBuilder<'_>) {
        let mut footer = section.footer();
        self.footer_table(&mut footer);
    }

    fn footer_table(&self, footer: &mut BlockBuilder<'_>) {
        let s = self.styles;
        let small = StyleAttributes::new().font_size(8.0);
        let mut table = footer.table();
        table.column(cm(8.0), TextAlign::Left).column(cm(8.0), TextAlign::Left);
        let mut row = table.row();
        row.cell(0)
            .paragraph(s.normal)
            .text("Generated on: ")
            .field(DynamicField::date(self.config.date_time_format.clone()))
            .font(small.clone())
            .align(TextAlign::Left);
        row.cell(1)
            .paragraph(s.normal)
            .text("Page ")
            .field(DynamicField::PageNumber)
            .text(" of ")
            .field(DynamicField::PageCount)
            .font(small)
            .align(TextAlign::Right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_idf::{Block, CellSlot, InlineRun};
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    fn record(items: usize) -> InvoiceRecord {
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        InvoiceRecord {
            invoice_number: Some("INV-001".to_string()),
            invoice_date: day(1),
            address: Some("123 Main Street, Springfield".to_string()),
            owners: None,
            property_label: Some("Apartment A-12".to_string()),
            total: Decimal::new(25075, 2),
            line_items: (0..items)
                .map(|i| LineItem {
                    label: Some(format!("Utility {i}")),
                    date_from: day(1),
                    date_to: day(28),
                    amount: Decimal::new(8025, 2),
                })
                .collect(),
        }
    }

    fn compose<T>(f: impl FnOnce(&InvoiceComposer<'_>) -> T) -> T {
        let config = EngineConfig::default();
        let (registry, styles) = InvoiceStyles::registry(&BTreeMap::new()).unwrap();
        f(&InvoiceComposer::new(&config, registry, styles))
    }

    fn tables(blocks: &[Block]) -> Vec<&quire_idf::Table> {
        blocks
            .iter()
            .filter_map(|b| match b {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn batch_has_a_summary_section_then_one_per_record() {
        let records = vec![record(2), record(1)];
        let doc = compose(|c| c.batch_document(&records)).unwrap();
        assert_eq!(doc.sections().len(), 3);
        assert_eq!(doc.title(), Some("Invoice Batch Report"));
        assert!(doc.has_date_field());

        let heading = match &doc.sections()[2].blocks[0] {
            Block::Paragraph(p) => p.plain_text(),
            other => panic!("expected a paragraph, got {other:?}"),
        };
        assert_eq!(heading, "INVOICE (2 of 2)");
    }

    #[test]
    fn single_invoice_has_no_summary_page() {
        let doc = compose(|c| c.single_document(&record(1))).unwrap();
        assert_eq!(doc.sections().len(), 1);
        assert_eq!(doc.title(), Some("Invoice INV-001"));
        match &doc.sections()[0].blocks[0] {
            Block::Paragraph(p) => assert_eq!(p.plain_text(), "INVOICE"),
            other => panic!("expected a paragraph, got {other:?}"),
        }
    }

    #[test]
    fn missing_values_use_the_placeholder() {
        let doc = compose(|c| c.single_document(&record(0))).unwrap();
        let details = tables(&doc.sections()[0].blocks)[0];
        let CellSlot::Cell(bill_to) = &details.rows[0].slots[1] else {
            panic!("bill-to cell is merged");
        };
        assert!(bill_to.paragraphs[0].plain_text().ends_with("Owners: N/A"));
    }

    #[test]
    fn empty_line_items_show_a_merged_placeholder_row() {
        let doc = compose(|c| c.single_document(&record(0))).unwrap();
        let items = tables(&doc.sections()[0].blocks)[1];
        assert_eq!(items.rows.len(), 2);
        let row = &items.rows[1];
        let CellSlot::Cell(cell) = &row.slots[0] else {
            panic!("first slot must hold the cell");
        };
        assert_eq!(cell.merge_right, 3);
        assert_eq!(cell.paragraphs[0].plain_text(), NO_CHARGES);
        assert!(row.slots[1..].iter().all(|s| matches!(s, CellSlot::Merged)));
    }

    #[test]
    fn line_items_alternate_shading_and_format_amounts() {
        let doc = compose(|c| c.single_document(&record(3))).unwrap();
        let items = tables(&doc.sections()[0].blocks)[1];
        assert!(items.rows[0].heading);
        assert_eq!(items.rows[1].shading, None);
        assert_eq!(items.rows[2].shading, Some(ALTERNATE_ROW_SHADING));
        let CellSlot::Cell(amount) = &items.rows[1].slots[3] else {
            panic!("amount cell is merged");
        };
        assert_eq!(amount.paragraphs[0].plain_text(), "$80.25");
    }

    #[test]
    fn footer_shows_page_n_of_m() {
        let doc = compose(|c| c.single_document(&record(1))).unwrap();
        let footer = tables(&doc.sections()[0].footer)[0];
        let CellSlot::Cell(right) = &footer.rows[0].slots[1] else {
            panic!("page cell is merged");
        };
        let fields: Vec<_> = right.paragraphs[0]
            .runs
            .iter()
            .filter_map(|r| match r {
                InlineRun::Field { field, .. } => Some(field.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(fields, vec![DynamicField::PageNumber, DynamicField::PageCount]);
    }
}
