//! Slicing one tall capture into fixed-size pages.
//!
//! The page height is scaled into bitmap pixels with the same ratio as the
//! width, so every page keeps the physical page's aspect ratio. Page `n`
//! covers rows `[n * h, (n + 1) * h)` of the source; whatever is left below the
//! content on the last page is background.

use image::{GenericImageView, Rgb, RgbImage, imageops};
use tracing::debug;

use crate::capture::Bitmap;
use crate::error::PaginationError;
use crate::node::WHITE;

/// One output page. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    index: usize,
    pixels: RgbImage,
}

impl PageImage {
    /// Zero-based position in the output document.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn width_px(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height_px(&self) -> u32 {
        self.pixels.height()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    background: Rgb<u8>,
}

impl Default for Paginator {
    fn default() -> Self {
        Self { background: WHITE }
    }
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background(mut self, background: Rgb<u8>) -> Self {
        self.background = background;
        self
    }

    /// Height of one page in bitmap pixels for a bitmap `bitmap_width` wide.
    pub fn page_height_at_scale(
        bitmap_width: u32,
        page_width_px: u32,
        page_height_px: u32,
    ) -> u32 {
        let w = u64::from(page_width_px);
        let scaled = (u64::from(page_height_px) * u64::from(bitmap_width) + w / 2) / w;
        scaled.clamp(1, u64::from(u32::MAX)) as u32
    }

    /// Number of pages needed for a bitmap `height` pixels tall; never zero.
    pub fn page_count(height: u32, page_height: u32) -> usize {
        height.div_ceil(page_height).max(1) as usize
    }

    /// Slice `bitmap` into pages of `page_width_px` x `page_height_px` proportions.
    ///
    /// The source bitmap is only read; each page owns an independent copy of
    /// its band.
    pub fn paginate(
        &self,
        bitmap: &Bitmap,
        page_width_px: u32,
        page_height_px: u32,
    ) -> Result<Vec<PageImage>, PaginationError> {
        let (width, height) = bitmap.dimensions();
        if width == 0 || height == 0 {
            return Err(PaginationError::EmptyBitmap { width, height });
        }
        if page_width_px == 0 || page_height_px == 0 {
            return Err(PaginationError::InvalidPageSize {
                width: page_width_px,
                height: page_height_px,
            });
        }

        let band = Self::page_height_at_scale(width, page_width_px, page_height_px);
        let count = Self::page_count(height, band);
        debug!(width, height, band, pages = count, "paginating capture");

        let pages = (0..count)
            .map(|index| {
                let top = index as u32 * band;
                let visible = band.min(height - top);
                let slice = bitmap.view(0, top, width, visible).to_image();

                let mut pixels = RgbImage::from_pixel(width, band, self.background);
                imageops::replace(&mut pixels, &slice, 0, 0);
                PageImage { index, pixels }
            })
            .collect();
        Ok(pages)
    }
}
