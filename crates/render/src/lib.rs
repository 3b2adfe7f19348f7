//! `quoteprint-render` — from document layout to output document.
//!
//! The stages are independent so the export orchestrator can drive them one
//! at a time:
//!
//! - [`view`] renders a [`DocumentLayout`](quoteprint_invoicing::DocumentLayout)
//!   into a [`RenderNode`] tree (and computes the live preview scale)
//! - [`staging`] parks a page-width copy of that tree off-screen
//! - [`capture`] rasterizes the staged copy into one tall bitmap
//! - [`paginate`] slices the bitmap into page-sized images
//! - [`assemble`] writes the pages into a multi-page PDF

pub mod assemble;
pub mod capture;
pub mod error;
pub mod node;
pub mod paginate;
pub mod staging;
pub mod view;

pub use assemble::{AssembledDocument, DEFAULT_JPEG_QUALITY, DocumentAssembler, PdfAssembler};
pub use capture::{Bitmap, BlockRasterizer, CaptureEngine, CaptureHints};
pub use error::{AssemblyError, CaptureError, PaginationError, StagingError};
pub use node::RenderNode;
pub use paginate::{PageImage, Paginator};
pub use staging::{HostStats, OffscreenRenderHost, StagedNode};
pub use view::{Preview, preview_scale, render_document};
