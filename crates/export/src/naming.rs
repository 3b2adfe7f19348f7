//! Output file naming.

use quoteprint_invoicing::DocumentType;

/// Number used when the document has none.
pub const DRAFT_NUMBER: &str = "Draft";

/// `<Invoice|Quotation>_<number or Draft>.pdf`.
///
/// The number is trimmed, and path separators in it are replaced with `-` so
/// the result is always a single path component.
pub fn output_file_name(document_type: DocumentType, document_number: &str) -> String {
    let number = document_number.trim();
    let number = if number.is_empty() {
        DRAFT_NUMBER.to_string()
    } else {
        number.replace(['/', '\\'], "-")
    };
    format!("{}_{}.pdf", document_type.title(), number)
}
