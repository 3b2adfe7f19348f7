//! Rasterization of staged nodes.

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use tracing::debug;

use crate::error::CaptureError;
use crate::node::{Axis, CHAR_WIDTH_PX, LINE_HEIGHT_PX, RenderNode, WHITE};
use crate::staging::StagedNode;

/// One opaque RGB raster of the whole staged document.
pub type Bitmap = RgbImage;

/// Upper bound on captured pixels (keeps a runaway document from exhausting memory).
pub const MAX_CAPTURE_PIXELS: u64 = 400_000_000;

/// Fixed capture parameters passed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureHints {
    /// Capture width in CSS pixels (before scaling).
    pub width_px: u32,
    /// Layout viewport width the engine should assume.
    pub window_width_px: u32,
    /// Explicit height in CSS pixels; `None` captures the full measured height.
    pub height_px: Option<u32>,
    /// Uniform multiplier applied to both dimensions.
    pub scale: u32,
    pub background: Rgb<u8>,
}

impl CaptureHints {
    pub fn for_page_width(width_px: u32, scale: u32) -> Self {
        Self {
            width_px,
            window_width_px: width_px,
            height_px: None,
            scale,
            background: WHITE,
        }
    }

    /// Bitmap width the engine is required to return.
    pub fn expected_bitmap_width(&self) -> u32 {
        self.width_px.saturating_mul(self.scale)
    }
}

/// Rasterization capability.
///
/// Contract: the returned bitmap is exactly `width_px * scale` wide, the scale
/// multiplies both dimensions, and every pixel is opaque.
#[async_trait]
pub trait CaptureEngine: Send + Sync {
    async fn rasterize(
        &self,
        node: &StagedNode,
        hints: &CaptureHints,
    ) -> Result<Bitmap, CaptureError>;
}

/// Block-level rasterizer.
///
/// Paints backgrounds, borders and text runs of the node tree. Text is drawn
/// as solid runs (one bar per line, proportional to its length) rather than
/// shaped glyphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockRasterizer;

impl BlockRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of [`CaptureEngine::rasterize`].
    pub fn paint(&self, root: &RenderNode, hints: &CaptureHints) -> Result<Bitmap, CaptureError> {
        if hints.scale == 0 {
            return Err(CaptureError::InvalidScale);
        }
        let css_width = hints.width_px;
        let css_height = hints
            .height_px
            .unwrap_or_else(|| root.measure_height(css_width))
            .max(1);
        let too_large = CaptureError::TooLarge {
            width: css_width.saturating_mul(hints.scale),
            height: css_height.saturating_mul(hints.scale),
        };
        let (Some(width), Some(height)) = (
            css_width.checked_mul(hints.scale),
            css_height.checked_mul(hints.scale),
        ) else {
            return Err(too_large);
        };
        if u64::from(width) * u64::from(height) > MAX_CAPTURE_PIXELS {
            return Err(too_large);
        }

        let mut canvas = Canvas {
            image: RgbImage::from_pixel(width, height, hints.background),
            scale: hints.scale,
        };
        canvas.paint_node(root, 0, 0, css_width);
        Ok(canvas.image)
    }
}

#[async_trait]
impl CaptureEngine for BlockRasterizer {
    async fn rasterize(
        &self,
        node: &StagedNode,
        hints: &CaptureHints,
    ) -> Result<Bitmap, CaptureError> {
        let bitmap = self.paint(node.node(), hints)?;
        debug!(
            width = bitmap.width(),
            height = bitmap.height(),
            "staged node rasterized"
        );
        Ok(bitmap)
    }
}

struct Canvas {
    image: RgbImage,
    scale: u32,
}

impl Canvas {
    /// Fill a rectangle given in CSS pixels, clipped to the canvas.
    fn fill(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
        let (img_w, img_h) = self.image.dimensions();
        let x0 = (x * self.scale).min(img_w);
        let y0 = (y * self.scale).min(img_h);
        let x1 = ((x + w) * self.scale).min(img_w);
        let y1 = ((y + h) * self.scale).min(img_h);
        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px, py, color);
            }
        }
    }

    fn outline(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
        if w == 0 || h == 0 {
            return;
        }
        self.fill(x, y, w, 1, color);
        self.fill(x, y + h - 1, w, 1, color);
        self.fill(x, y, 1, h, color);
        self.fill(x + w - 1, y, 1, h, color);
    }

    fn paint_node(&mut self, node: &RenderNode, x: u32, y: u32, width: u32) {
        let height = node.measure_height(width);
        if let Some(bg) = node.background {
            self.fill(x, y, width, height, bg);
        }
        if let Some(border) = node.border {
            self.outline(x, y, width, height, border);
        }

        let inner_x = x + node.padding_px;
        let inner_w = node.inner_width(width);
        let mut cursor_y = y + node.padding_px;

        let bar_height = LINE_HEIGHT_PX / 3;
        for line in &node.text {
            let run = (line.trim_end().chars().count() as u32 * CHAR_WIDTH_PX).min(inner_w);
            self.fill(inner_x, cursor_y + bar_height, run, bar_height, node.ink);
            cursor_y += LINE_HEIGHT_PX;
        }

        let widths = node.child_widths(inner_w);
        let mut cursor_x = inner_x;
        for (child, child_w) in node.children.iter().zip(widths) {
            match node.axis {
                Axis::Vertical => {
                    self.paint_node(child, inner_x, cursor_y, child_w);
                    cursor_y += child.measure_height(child_w);
                }
                Axis::Horizontal => {
                    self.paint_node(child, cursor_x, cursor_y, child_w);
                    cursor_x += child_w;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Width;
    use crate::staging::OffscreenRenderHost;
    use quoteprint_invoicing::PageGeometry;

    const RED: Rgb<u8> = Rgb([0xff, 0, 0]);

    fn striped() -> RenderNode {
        RenderNode::block("document").with_children([
            RenderNode::block("a").with_min_height(10).with_background(RED),
            RenderNode::block("b").with_min_height(20),
        ])
    }

    #[test]
    fn scale_multiplies_both_dimensions() {
        let hints = CaptureHints::for_page_width(100, 3);
        let bitmap = BlockRasterizer::new().paint(&striped(), &hints).unwrap();
        assert_eq!(bitmap.width(), 300);
        assert_eq!(bitmap.height(), 90);
        assert_eq!(bitmap.width(), hints.expected_bitmap_width());
    }

    #[test]
    fn backgrounds_land_at_scaled_offsets() {
        let hints = CaptureHints::for_page_width(100, 2);
        let bitmap = BlockRasterizer::new().paint(&striped(), &hints).unwrap();
        assert_eq!(*bitmap.get_pixel(0, 0), RED);
        assert_eq!(*bitmap.get_pixel(199, 19), RED);
        assert_eq!(*bitmap.get_pixel(0, 20), WHITE);
    }

    #[test]
    fn explicit_height_overrides_measurement() {
        let mut hints = CaptureHints::for_page_width(50, 1);
        hints.height_px = Some(500);
        let bitmap = BlockRasterizer::new().paint(&striped(), &hints).unwrap();
        assert_eq!(bitmap.dimensions(), (50, 500));
    }

    #[test]
    fn text_runs_are_inked() {
        let node = RenderNode::text("p", "abc").with_width(Width::Px(100));
        let hints = CaptureHints::for_page_width(100, 1);
        let bitmap = BlockRasterizer::new().paint(&node, &hints).unwrap();
        // padding 6, bar starts a third of a line down.
        let y = 6 + LINE_HEIGHT_PX / 3;
        assert_eq!(*bitmap.get_pixel(6, y), crate::node::INK);
        assert_eq!(*bitmap.get_pixel(6 + 3 * CHAR_WIDTH_PX, y), WHITE);
    }

    #[test]
    fn zero_scale_and_oversized_captures_fail() {
        let mut hints = CaptureHints::for_page_width(100, 0);
        assert_eq!(
            BlockRasterizer::new().paint(&striped(), &hints),
            Err(CaptureError::InvalidScale)
        );
        hints.scale = 1;
        hints.height_px = Some(u32::MAX / 4);
        assert!(matches!(
            BlockRasterizer::new().paint(&striped(), &hints),
            Err(CaptureError::TooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn rasterizes_a_staged_node_at_page_width() {
        let host = OffscreenRenderHost::new();
        let staged = host.stage(&striped(), PageGeometry::A4).unwrap();
        let hints = CaptureHints::for_page_width(staged.width_px(), 1);
        let bitmap = BlockRasterizer::new()
            .rasterize(&staged, &hints)
            .await
            .unwrap();
        assert_eq!(bitmap.width(), 794);
        assert_eq!(bitmap.height(), staged.height_px());
    }
}
