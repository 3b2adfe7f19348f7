//! Fixed-geometry page description of a billing document.
//!
//! [`DocumentLayout::build`] turns the form model into everything the view
//! needs to draw a page: formatted strings, padded table rows with their
//! stripe, and the page geometry shared by staging and capture.

use chrono::NaiveDate;
use serde::Serialize;

use quoteprint_core::ValueObject;

use crate::document::{DocumentType, InvoiceDocument, LineItem};
use crate::totals::{self, CURRENCY_CODE};

/// Pixels per millimetre at 96 dpi. The single mm→px conversion factor.
pub const PX_PER_MM: f64 = 96.0 / 25.4;

/// Minimum number of rows in the item table (padding rows fill the gap).
pub const MIN_TABLE_ROWS: usize = 12;

/// Printed date format.
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Physical page size plus its pixel equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl ValueObject for PageGeometry {}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width_mm: 210.0,
        height_mm: 297.0,
    };

    pub fn width_px(&self) -> u32 {
        mm_to_px(self.width_mm)
    }

    pub fn height_px(&self) -> u32 {
        mm_to_px(self.height_mm)
    }

    pub fn width_pt(&self) -> f64 {
        mm_to_pt(self.width_mm)
    }

    pub fn height_pt(&self) -> f64 {
        mm_to_pt(self.height_mm)
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

pub fn mm_to_px(mm: f64) -> u32 {
    (mm * PX_PER_MM).round() as u32
}

pub fn mm_to_pt(mm: f64) -> f64 {
    mm * 72.0 / 25.4
}

/// `DD/MM/YYYY`, or empty for an absent date.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Background band of a table row, chosen by absolute row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStripe {
    Even,
    Odd,
}

impl RowStripe {
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            RowStripe::Even
        } else {
            RowStripe::Odd
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Item,
    Padding,
}

/// One row of the item table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub index: usize,
    pub kind: RowKind,
    pub stripe: RowStripe,
    pub date: String,
    pub description: String,
    pub line_total: String,
}

impl TableRow {
    fn item(index: usize, item: &LineItem) -> Self {
        Self {
            index,
            kind: RowKind::Item,
            stripe: RowStripe::for_index(index),
            date: format_date(item.date()),
            description: item.description().to_string(),
            line_total: item.amount().to_string(),
        }
    }

    fn padding(index: usize) -> Self {
        Self {
            index,
            kind: RowKind::Padding,
            stripe: RowStripe::for_index(index),
            date: String::new(),
            description: String::new(),
            line_total: String::new(),
        }
    }

    /// Printed lines in the description cell (descriptions keep their line breaks).
    pub fn line_count(&self) -> usize {
        self.description.lines().count().max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderBlock {
    pub title: String,
    pub company_name: String,
    pub company_slogan: String,
    pub company_contact: String,
    pub date: String,
    pub number_line: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientBlock {
    pub label: String,
    pub name: String,
    pub attention: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobCell {
    pub heading: String,
    pub content: String,
    /// Highlighted cell (the due date box).
    pub accent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankingBlock {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotalsBlock {
    pub label: String,
    pub value: String,
    pub vat_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayableBlock {
    pub heading: String,
    pub payee: String,
    pub closing: String,
}

/// Everything printed on the document, in page order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentLayout {
    pub geometry: PageGeometry,
    pub document_type: DocumentType,
    pub header: HeaderBlock,
    pub client: ClientBlock,
    pub job_grid: Vec<JobCell>,
    pub table_columns: [&'static str; 3],
    pub rows: Vec<TableRow>,
    pub banking: BankingBlock,
    pub totals: TotalsBlock,
    pub stamp_label: String,
    pub payable: PayableBlock,
    pub footer: String,
}

fn or_default(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

impl DocumentLayout {
    /// Lay out `doc` for `document_type` on an A4 page. Never fails: an empty
    /// item list produces a table of padding rows only.
    pub fn build(doc: &InvoiceDocument, document_type: DocumentType) -> Self {
        let header = &doc.header;
        let client = &doc.client;
        let banking = &doc.banking;

        let total = totals::total(doc.items());

        Self {
            geometry: PageGeometry::A4,
            document_type,
            header: HeaderBlock {
                title: document_type.title().to_string(),
                company_name: "Great Escapes Tourism".to_string(),
                company_slogan: "Dreams Come True".to_string(),
                company_contact: "Tel : 00971 4 341 5949".to_string(),
                date: format_date(header.date),
                number_line: format!(
                    "{}: {}",
                    document_type.number_label(),
                    header.document_number
                ),
            },
            client: ClientBlock {
                label: "TO".to_string(),
                name: or_default(&client.company, "CLIENT EXTENSION"),
                attention: client.attention.clone(),
            },
            job_grid: vec![
                JobCell {
                    heading: "Salesperson".to_string(),
                    content: or_default(&header.salesperson, "RAOUF"),
                    accent: false,
                },
                JobCell {
                    heading: "Job".to_string(),
                    content: or_default(&header.job, "ACCOUNTANT"),
                    accent: false,
                },
                JobCell {
                    heading: "Due Date".to_string(),
                    content: format_date(header.due_date),
                    accent: true,
                },
            ],
            table_columns: ["DATE", "Description", "Line Total"],
            rows: table_rows(doc.items()),
            banking: BankingBlock {
                title: "ACCOUNT DETAILS ARE AS FOLLOWS;".to_string(),
                lines: vec![
                    or_default(&banking.bank_name, "MR BIKES DELIVERY SERVICES"),
                    format!(
                        "ACCOUNT NUMBER. {}",
                        or_default(&banking.account_number, "11955 2528 20001")
                    ),
                    format!(
                        "IBAN : {}",
                        or_default(&banking.iban, "AE 1400 300 11955 2528 20001")
                    ),
                    or_default(&banking.branch, "ADCB BANK, AL BUSTAN BRANCH,"),
                    "DUBAI, UAE".to_string(),
                ],
            },
            totals: TotalsBlock {
                label: "Total".to_string(),
                value: total.format_with_code(CURRENCY_CODE),
                vat_label: if doc.vat_enabled { "VAT: ON" } else { "VAT: OFF" }.to_string(),
            },
            stamp_label: "Sign & Stamp".to_string(),
            payable: PayableBlock {
                heading: "MAKE ALL CHECK PAYABLE TO".to_string(),
                payee: doc.payable_to.as_str().to_string(),
                closing: "Thank you for your business!".to_string(),
            },
            footer: "Al Sharafi Building - S 14 , P.O. Box 111113 , Dubai-UAE, \
                     info@getdubai.com, www.getourism.com"
                .to_string(),
        }
    }

    pub fn item_rows(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter().filter(|r| r.kind == RowKind::Item)
    }
}

/// Item rows followed by padding rows up to [`MIN_TABLE_ROWS`].
pub fn table_rows(items: &[LineItem]) -> Vec<TableRow> {
    let count = items.len().max(MIN_TABLE_ROWS);
    (0..count)
        .map(|index| match items.get(index) {
            Some(item) => TableRow::item(index, item),
            None => TableRow::padding(index),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{LineItem, PayableTo};
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
    }

    #[test]
    fn a4_width_is_794_px() {
        assert_eq!(PageGeometry::A4.width_px(), 794);
        assert_eq!(PageGeometry::A4.height_px(), 1123);
    }

    #[test]
    fn empty_document_still_lays_out_a_full_table() {
        let doc = InvoiceDocument::new(today());
        let layout = DocumentLayout::build(&doc, DocumentType::Quotation);
        assert_eq!(layout.rows.len(), MIN_TABLE_ROWS);
        assert!(layout.rows.iter().all(|r| r.kind == RowKind::Padding));
        assert_eq!(layout.totals.value, "AED 0.00");
        assert_eq!(layout.header.title, "Quotation");
        assert_eq!(layout.header.number_line, "QUOTE: ");
    }

    #[test]
    fn dates_render_day_first_and_absent_dates_are_blank() {
        let mut doc = InvoiceDocument::new(today());
        doc.push_item(LineItem::new(None, "undated", "1", "5"));
        let layout = DocumentLayout::build(&doc, DocumentType::Invoice);

        assert_eq!(layout.header.date, "09/03/2025");
        assert_eq!(layout.job_grid[2].content, "");
        assert_eq!(layout.rows[0].date, "");
        assert_eq!(layout.header.number_line, "INVO: ");
    }

    #[test]
    fn placeholders_fill_blank_fields() {
        let doc = InvoiceDocument::new(today());
        let layout = DocumentLayout::build(&doc, DocumentType::Invoice);
        assert_eq!(layout.client.name, "CLIENT EXTENSION");
        assert_eq!(layout.job_grid[0].content, "RAOUF");
        assert_eq!(layout.banking.lines[1], "ACCOUNT NUMBER. 11955 2528 20001");
        assert_eq!(layout.payable.payee, PayableTo::Both.as_str());
    }

    #[test]
    fn vat_flag_only_changes_the_label() {
        let mut doc = InvoiceDocument::new(today());
        doc.push_item(LineItem::new(None, "x", "2", "50.00"));
        let on = DocumentLayout::build(&doc, DocumentType::Invoice);
        doc.toggle_vat();
        let off = DocumentLayout::build(&doc, DocumentType::Invoice);

        assert_eq!(on.totals.vat_label, "VAT: ON");
        assert_eq!(off.totals.vat_label, "VAT: OFF");
        assert_eq!(on.totals.value, "AED 100.00");
        assert_eq!(on.totals.value, off.totals.value);
    }

    #[test]
    fn long_tables_are_not_truncated() {
        let items: Vec<LineItem> = (0..20)
            .map(|i| LineItem::new(Some(today()), format!("line {i}"), "1", "1"))
            .collect();
        let rows = table_rows(&items);
        assert_eq!(rows.len(), 20);
        assert!(rows.iter().all(|r| r.kind == RowKind::Item));
    }

    #[test]
    fn multi_line_descriptions_count_their_lines() {
        let rows = table_rows(&[LineItem::new(None, "a\nb\nc", "1", "1")]);
        assert_eq!(rows[0].line_count(), 3);
        assert_eq!(rows[1].line_count(), 1);
    }

    proptest! {
        /// Property: at least 12 rows, striped strictly by absolute index.
        #[test]
        fn rows_are_padded_and_alternate(n in 0usize..40) {
            let items: Vec<LineItem> = (0..n)
                .map(|i| LineItem::new(None, format!("item {i}"), "1", "2"))
                .collect();
            let rows = table_rows(&items);

            prop_assert!(rows.len() >= MIN_TABLE_ROWS);
            prop_assert_eq!(rows.len(), n.max(MIN_TABLE_ROWS));
            for (i, row) in rows.iter().enumerate() {
                prop_assert_eq!(row.index, i);
                let expected = if i % 2 == 0 { RowStripe::Even } else { RowStripe::Odd };
                prop_assert_eq!(row.stripe, expected);
                prop_assert_eq!(row.kind == RowKind::Item, i < n);
            }
        }
    }
}
