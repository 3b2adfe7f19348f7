mod commands;
mod edit;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use quoteprint_invoicing::{DocumentType, PayableTo};
use quoteprint_observability::LogFormat;

#[derive(Parser, Debug)]
#[command(
    name = "quoteprint",
    version,
    about = "Edit quotation/invoice documents and export them as multi-page PDFs"
)]
struct Cli {
    /// Log output format (json or pretty); logs go to stderr
    #[arg(long, global = true, default_value = "json")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a new document with session defaults as JSON
    New {
        /// Document number
        #[arg(long, default_value = "")]
        number: String,
    },

    /// Apply form edits to a document and print the result
    Edit(EditArgs),

    /// Print the page layout of a document as JSON
    Layout {
        /// Document JSON file, or `-` for stdin
        file: PathBuf,
        #[arg(long = "type", default_value = "quotation")]
        document_type: DocumentType,
    },

    /// Show the preview heading, scale and expected page count
    Preview {
        file: PathBuf,
        #[arg(long = "type", default_value = "quotation")]
        document_type: DocumentType,
        /// Viewport width in CSS pixels
        #[arg(long, default_value_t = 1280)]
        viewport: u32,
    },

    /// Render a document and write `<Invoice|Quotation>_<number>.pdf`
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
pub struct EditArgs {
    /// Document JSON file, or `-` for stdin
    pub file: PathBuf,

    /// Set a document field, e.g. `--set quoteNo=Q-17` or `--set dueDate=2025-04-01`
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub fields: Vec<String>,

    #[arg(long)]
    pub payable_to: Option<PayableTo>,

    /// Flip the VAT label
    #[arg(long)]
    pub toggle_vat: bool,

    /// Append blank line items (dated today, quantity 1)
    #[arg(long, default_value_t = 0)]
    pub add_items: usize,

    /// Edit a line item, e.g. `--item 0:unitPrice=50.00`
    #[arg(long = "item", value_name = "INDEX:FIELD=VALUE")]
    pub items: Vec<String>,

    /// Move a line item, e.g. `--move-item 3:0`
    #[arg(long, value_name = "FROM:TO")]
    pub move_item: Vec<String>,

    /// Remove the line item at this position
    #[arg(long, value_name = "INDEX")]
    pub remove_item: Vec<usize>,

    /// Write the result back to FILE instead of stdout
    #[arg(long)]
    pub in_place: bool,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Document JSON file, or `-` for stdin
    pub file: PathBuf,

    #[arg(long = "type", default_value = "quotation")]
    pub document_type: DocumentType,

    /// Output directory (default: $QUOTEPRINT_OUTPUT_DIR or `.`)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Capture scale (default: $QUOTEPRINT_CAPTURE_SCALE or 3)
    #[arg(long)]
    pub scale: Option<u32>,

    /// Capture timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// JPEG quality of the page images (1-100)
    #[arg(long)]
    pub jpeg_quality: Option<u8>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    quoteprint_observability::init(cli.log_format);

    match cli.command {
        Command::New { number } => commands::new_document(&number),
        Command::Edit(args) => commands::edit_document(&args),
        Command::Layout {
            file,
            document_type,
        } => commands::print_layout(&file, document_type),
        Command::Preview {
            file,
            document_type,
            viewport,
        } => commands::print_preview(&file, document_type, viewport),
        Command::Export(args) => commands::export(&args).await,
    }
}
