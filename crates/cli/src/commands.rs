use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Local;
use tracing::info;

use quoteprint_export::{
    ExportConfig, ExportNotice, ExportOrchestrator, ExportRequest, FileSink, NoticeSender,
};
use quoteprint_invoicing::{DocumentLayout, DocumentType, InvoiceDocument, PageGeometry};
use quoteprint_render::{BlockRasterizer, Paginator, PdfAssembler, Preview};

use crate::{EditArgs, ExportArgs, edit};

/// Read a document from `path`, or from stdin when `path` is `-`.
pub fn load_document(path: &Path) -> Result<InvoiceDocument> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("reading document from stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn new_document(number: &str) -> Result<()> {
    let mut doc = InvoiceDocument::new(Local::now().date_naive());
    doc.header.document_number = number.to_string();
    print_json(&doc)
}

pub fn edit_document(args: &EditArgs) -> Result<()> {
    let mut doc = load_document(&args.file)?;
    edit::apply(&mut doc, args, Local::now().date_naive())?;

    if args.in_place {
        if args.file == Path::new("-") {
            bail!("--in-place needs a file, not stdin");
        }
        let json = serde_json::to_string_pretty(&doc)?;
        fs::write(&args.file, json + "\n")
            .with_context(|| format!("writing {}", args.file.display()))?;
        info!(file = %args.file.display(), items = doc.items().len(), "document updated");
        Ok(())
    } else {
        print_json(&doc)
    }
}

pub fn print_layout(file: &Path, document_type: DocumentType) -> Result<()> {
    let doc = load_document(file)?;
    print_json(&DocumentLayout::build(&doc, document_type))
}

pub fn print_preview(file: &Path, document_type: DocumentType, viewport: u32) -> Result<()> {
    let doc = load_document(file)?;
    let layout = DocumentLayout::build(&doc, document_type);
    let preview = Preview::open(&layout, viewport);

    let geometry = PageGeometry::A4;
    let height = preview.root.measure_height(geometry.width_px());
    let pages = Paginator::page_count(height, geometry.height_px());
    println!("{}", preview.title);
    println!("scale: {:.3}", preview.scale);
    println!("content height: {height}px ({pages} page(s))");
    Ok(())
}

fn export_config(args: &ExportArgs) -> ExportConfig {
    let mut config = ExportConfig::from_env();
    if let Some(dir) = &args.out {
        config = config.with_output_dir(dir);
    }
    if let Some(scale) = args.scale {
        config = config.with_capture_scale(scale);
    }
    if let Some(ms) = args.timeout_ms {
        config = config.with_capture_timeout(Duration::from_millis(ms));
    }
    if let Some(quality) = args.jpeg_quality {
        config = config.with_jpeg_quality(quality);
    }
    config
}

pub async fn export(args: &ExportArgs) -> Result<()> {
    let doc = load_document(&args.file)?;
    let config = export_config(args);
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    let (notices, mut rx) = NoticeSender::channel();
    let orchestrator = ExportOrchestrator::new(
        BlockRasterizer::new(),
        PdfAssembler::new().with_jpeg_quality(config.jpeg_quality),
        FileSink::new(&config.output_dir),
        config,
    )
    .with_notices(notices);

    let result = orchestrator
        .export(ExportRequest::new(doc, args.document_type))
        .await;

    while let Ok(notice) = rx.try_recv() {
        if let ExportNotice::Failed { message, .. } = notice {
            eprintln!("{message}");
        }
    }

    let outcome = result.context("export failed")?;
    match &outcome.emitted.path {
        Some(path) => println!("{} ({} page(s))", path.display(), outcome.page_count),
        None => println!("{} ({} page(s))", outcome.file_name, outcome.page_count),
    }
    Ok(())
}
