//! Document view: turns a [`DocumentLayout`] into the node tree shown in the
//! preview and handed to staging.

use image::Rgb;

use quoteprint_invoicing::layout::{DocumentLayout, RowStripe, TableRow};

use crate::node::{INK, LINE_HEIGHT_PX, RenderNode, WHITE, Width};

/// Nominal preview width (A4 at 96 dpi).
pub const PREVIEW_TARGET_WIDTH_PX: u32 = 794;

/// Horizontal padding around the preview in the viewport.
pub const VIEWPORT_PADDING_PX: u32 = 32;

/// Scale used when the viewport is wide enough.
pub const DEFAULT_PREVIEW_SCALE: f32 = 0.9;

/// Base height of an item table row.
pub const TABLE_ROW_HEIGHT_PX: u32 = 30;

const BRAND_BLUE: Rgb<u8> = Rgb([0x44, 0x72, 0xc4]);
const HEADER_BLUE: Rgb<u8> = Rgb([0x1f, 0x4e, 0x79]);
const ACCENT_HEADER: Rgb<u8> = Rgb([0x95, 0xb3, 0xd7]);
const ACCENT_CONTENT: Rgb<u8> = Rgb([0xdb, 0xe5, 0xf1]);
const EVEN_ROW: Rgb<u8> = Rgb([0xf2, 0xf2, 0xf2]);
const ODD_ROW: Rgb<u8> = WHITE;
const RULE: Rgb<u8> = Rgb([0xbf, 0xbf, 0xbf]);

/// Scale applied to the live preview so it fits the viewport.
///
/// Staging never uses this; the staged copy is always captured at full page width.
pub fn preview_scale(viewport_width_px: u32) -> f32 {
    let available = viewport_width_px.saturating_sub(VIEWPORT_PADDING_PX);
    if available < PREVIEW_TARGET_WIDTH_PX {
        available as f32 / PREVIEW_TARGET_WIDTH_PX as f32
    } else {
        DEFAULT_PREVIEW_SCALE
    }
}

/// The on-screen preview: heading, rendered document, and its live scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub title: &'static str,
    pub root: RenderNode,
    pub scale: f32,
}

impl Preview {
    pub fn open(layout: &DocumentLayout, viewport_width_px: u32) -> Self {
        Self {
            title: layout.document_type.preview_title(),
            root: render_document(layout),
            scale: preview_scale(viewport_width_px),
        }
    }

    /// Viewport resized: only the scale changes.
    pub fn resize(&mut self, viewport_width_px: u32) {
        self.scale = preview_scale(viewport_width_px);
    }
}

fn stripe_color(stripe: RowStripe) -> Rgb<u8> {
    match stripe {
        RowStripe::Even => EVEN_ROW,
        RowStripe::Odd => ODD_ROW,
    }
}

fn table_row(row: &TableRow) -> RenderNode {
    let extra_lines = row.line_count().saturating_sub(1) as u32;
    RenderNode::row("tr")
        .with_min_height(TABLE_ROW_HEIGHT_PX + extra_lines * LINE_HEIGHT_PX)
        .with_background(stripe_color(row.stripe))
        .with_children([
            RenderNode::text("td", &row.date).with_width(Width::Percent(20)),
            RenderNode::text("td", &row.description),
            RenderNode::text("td", &row.line_total).with_width(Width::Percent(20)),
        ])
}

/// Render the whole document at page width.
pub fn render_document(layout: &DocumentLayout) -> RenderNode {
    let header = &layout.header;

    let title_bar = RenderNode::row("header")
        .with_min_height(90)
        .with_padding(10)
        .with_children([
            RenderNode::block("logo")
                .with_width(Width::Px(200))
                .with_min_height(70)
                .with_background(ACCENT_CONTENT),
            RenderNode::text("title", &header.title).with_ink(BRAND_BLUE),
        ]);

    let blue_line = RenderNode::block("rule")
        .with_min_height(4)
        .with_background(BRAND_BLUE);

    let company = RenderNode::row("company")
        .with_padding(10)
        .with_children([
            RenderNode::text(
                "company-info",
                &format!(
                    "{}\n{}\n{}",
                    header.company_name, header.company_slogan, header.company_contact
                ),
            ),
            RenderNode::text("meta", &format!("{}\n{}", header.date, header.number_line))
                .with_width(Width::Percent(35)),
        ]);

    let client = RenderNode::text(
        "client",
        &format!(
            "{}\n{}\n{}",
            layout.client.label, layout.client.name, layout.client.attention
        ),
    );

    let job_grid = RenderNode::row("job-grid")
        .with_padding(10)
        .with_children(layout.job_grid.iter().map(|cell| {
            let (head, body) = if cell.accent {
                (ACCENT_HEADER, ACCENT_CONTENT)
            } else {
                (HEADER_BLUE, ODD_ROW)
            };
            RenderNode::block("job-cell").with_children([
                RenderNode::text("job-head", &cell.heading)
                    .with_background(head)
                    .with_ink(if cell.accent { INK } else { WHITE }),
                RenderNode::text("job-body", &cell.content)
                    .with_background(body)
                    .with_min_height(TABLE_ROW_HEIGHT_PX)
                    .with_border(RULE),
            ])
        }));

    let [date_col, desc_col, total_col] = layout.table_columns;
    let table_head = RenderNode::row("thead")
        .with_background(HEADER_BLUE)
        .with_min_height(TABLE_ROW_HEIGHT_PX)
        .with_children([
            RenderNode::text("th", date_col)
                .with_width(Width::Percent(20))
                .with_ink(WHITE),
            RenderNode::text("th", desc_col).with_ink(WHITE),
            RenderNode::text("th", total_col)
                .with_width(Width::Percent(20))
                .with_ink(WHITE),
        ]);
    let table = RenderNode::block("table")
        .with_padding(10)
        .with_child(table_head)
        .with_children(layout.rows.iter().map(table_row));

    let banking = RenderNode::text(
        "banking",
        &std::iter::once(layout.banking.title.as_str())
            .chain(layout.banking.lines.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
    )
    .with_width(Width::Percent(60));

    let totals = RenderNode::block("totals").with_children([
        RenderNode::text(
            "total-row",
            &format!("{} {}", layout.totals.label, layout.totals.value),
        )
        .with_border(BRAND_BLUE),
        RenderNode::text("vat", &layout.totals.vat_label),
    ]);

    let money = RenderNode::row("money")
        .with_padding(10)
        .with_children([banking, RenderNode::block("gap"), totals.with_width(Width::Percent(35))]);

    let stamp = RenderNode::block("stamp")
        .with_padding(10)
        .with_children([
            RenderNode::text("stamp-label", &layout.stamp_label),
            RenderNode::block("stamp-placeholder")
                .with_width(Width::Px(160))
                .with_min_height(80)
                .with_border(RULE),
        ]);

    let payable = RenderNode::text(
        "payable",
        &format!(
            "{}\n{}\n{}",
            layout.payable.heading, layout.payable.payee, layout.payable.closing
        ),
    );

    let footer = RenderNode::text("footer", &layout.footer)
        .with_background(BRAND_BLUE)
        .with_ink(WHITE);

    RenderNode::block("document")
        .with_width(Width::Px(layout.geometry.width_px()))
        .with_background(WHITE)
        .with_children([
            title_bar, blue_line, company, client, job_grid, table, money, stamp, payable,
            footer,
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use quoteprint_invoicing::{DocumentType, InvoiceDocument, LineItem, PageGeometry};

    fn doc_with_items(n: usize) -> InvoiceDocument {
        let today = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let mut doc = InvoiceDocument::new(today);
        for i in 0..n {
            doc.push_item(LineItem::new(Some(today), format!("line {i}"), "1", "10"));
        }
        doc
    }

    #[test]
    fn preview_scale_fits_narrow_viewports() {
        assert_eq!(preview_scale(1920), DEFAULT_PREVIEW_SCALE);
        assert_eq!(preview_scale(794 + 32), DEFAULT_PREVIEW_SCALE);
        let narrow = preview_scale(429);
        assert!((narrow - 397.0 / 794.0).abs() < 1e-6);
        assert_eq!(preview_scale(10), 0.0);
    }

    #[test]
    fn rendered_table_has_one_node_per_layout_row() {
        let layout = DocumentLayout::build(&doc_with_items(3), DocumentType::Invoice);
        let root = render_document(&layout);
        let mut rows = Vec::new();
        root.find_all("tr", &mut rows);
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].background, Some(EVEN_ROW));
        assert_eq!(rows[1].background, Some(ODD_ROW));
        assert_eq!(rows[11].background, Some(ODD_ROW));
    }

    #[test]
    fn short_document_fits_one_page() {
        let layout = DocumentLayout::build(&doc_with_items(5), DocumentType::Quotation);
        let root = render_document(&layout);
        let width = PageGeometry::A4.width_px();
        assert_eq!(root.resolve_width(width), width);
        assert!(root.measure_height(width) <= PageGeometry::A4.height_px());
    }

    #[test]
    fn long_document_overflows_the_page() {
        let layout = DocumentLayout::build(&doc_with_items(60), DocumentType::Quotation);
        let root = render_document(&layout);
        let width = PageGeometry::A4.width_px();
        assert!(root.measure_height(width) > PageGeometry::A4.height_px());
    }

    #[test]
    fn preview_title_follows_document_type() {
        let layout = DocumentLayout::build(&doc_with_items(0), DocumentType::Invoice);
        let mut preview = Preview::open(&layout, 500);
        assert_eq!(preview.title, "Invoice Preview");
        assert!(preview.scale < 1.0);
        preview.resize(2000);
        assert_eq!(preview.scale, DEFAULT_PREVIEW_SCALE);
    }
}
