//! Multi-page PDF assembly.
//!
//! Each page image is JPEG-encoded and placed as a full-page image XObject at
//! the origin, scaled to the page size in points.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::debug;

use quoteprint_invoicing::PageGeometry;

use crate::error::AssemblyError;
use crate::paginate::PageImage;

pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Encoded output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Combines ordered page images into one output document.
#[async_trait]
pub trait DocumentAssembler: Send + Sync {
    async fn assemble(
        &self,
        pages: &[PageImage],
        geometry: PageGeometry,
    ) -> Result<AssembledDocument, AssemblyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfAssembler {
    jpeg_quality: u8,
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl PdfAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quality is clamped to `1..=100`.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    fn encode_jpeg(&self, page: &PageImage) -> Result<Vec<u8>, AssemblyError> {
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality);
        encoder
            .encode_image(page.pixels())
            .map_err(|e| AssemblyError::Encode(e.to_string()))?;
        Ok(buf)
    }

    fn add_page(
        &self,
        doc: &mut Document,
        pages_id: ObjectId,
        page: &PageImage,
        geometry: PageGeometry,
    ) -> Result<ObjectId, AssemblyError> {
        let jpeg = self.encode_jpeg(page)?;
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(page.width_px()),
                "Height" => i64::from(page.height_px()),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false);
        let image_id = doc.add_object(image);

        let name = format!("Im{}", page.index() + 1);
        let (w, h) = (geometry.width_pt() as f32, geometry.height_pt() as f32);
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        w.into(),
                        0.into(),
                        0.into(),
                        h.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| AssemblyError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        Ok(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { name.as_str() => image_id },
            },
        }))
    }

    /// Synchronous core of [`DocumentAssembler::assemble`].
    pub fn build(
        &self,
        pages: &[PageImage],
        geometry: PageGeometry,
    ) -> Result<AssembledDocument, AssemblyError> {
        if pages.is_empty() {
            return Err(AssemblyError::NoPages);
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let kids = pages
            .iter()
            .map(|page| {
                self.add_page(&mut doc, pages_id, page, geometry)
                    .map(Object::from)
            })
            .collect::<Result<Vec<_>, _>>()?;

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| AssemblyError::Pdf(e.to_string()))?;
        Ok(AssembledDocument {
            bytes,
            page_count: pages.len(),
        })
    }
}

#[async_trait]
impl DocumentAssembler for PdfAssembler {
    async fn assemble(
        &self,
        pages: &[PageImage],
        geometry: PageGeometry,
    ) -> Result<AssembledDocument, AssemblyError> {
        let assembled = self.build(pages, geometry)?;
        debug!(
            pages = assembled.page_count,
            bytes = assembled.bytes.len(),
            "pdf assembled"
        );
        Ok(assembled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginate::Paginator;
    use image::{Rgb, RgbImage};

    fn pages(height: u32) -> Vec<PageImage> {
        let bitmap = RgbImage::from_pixel(79, height, Rgb([0x44, 0x72, 0xc4]));
        Paginator::new().paginate(&bitmap, 79, 112).unwrap()
    }

    #[test]
    fn one_pdf_page_per_image_in_order() {
        let assembled = PdfAssembler::new()
            .build(&pages(300), PageGeometry::A4)
            .unwrap();
        assert_eq!(assembled.page_count, 3);
        assert!(assembled.bytes.starts_with(b"%PDF-1.5"));

        let loaded = Document::load_mem(&assembled.bytes).unwrap();
        let ids: Vec<ObjectId> = loaded.get_pages().into_values().collect();
        assert_eq!(ids.len(), 3);

        for (i, id) in ids.iter().enumerate() {
            let page = loaded.get_dictionary(*id).unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            let width = media_box[2].as_float().unwrap();
            assert!((width - 595.28).abs() < 0.1, "page {i} width {width}");
        }
    }

    #[test]
    fn empty_page_list_is_rejected() {
        assert_eq!(
            PdfAssembler::new().build(&[], PageGeometry::A4),
            Err(AssemblyError::NoPages)
        );
    }

    #[test]
    fn jpeg_quality_is_clamped() {
        assert_eq!(PdfAssembler::new().with_jpeg_quality(0).jpeg_quality(), 1);
        assert_eq!(PdfAssembler::new().with_jpeg_quality(250).jpeg_quality(), 100);
    }

    #[tokio::test]
    async fn async_assembly_matches_build() {
        let pages = pages(50);
        let assembled = PdfAssembler::new()
            .assemble(&pages, PageGeometry::A4)
            .await
            .unwrap();
        assert_eq!(assembled.page_count, 1);
    }
}
