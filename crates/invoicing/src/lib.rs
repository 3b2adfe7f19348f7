//! Billing document domain: the editable form model, line amount derivation,
//! totals, and the fixed-geometry layout handed to the renderer.
//!
//! Pure, deterministic logic only (no IO, no rendering).

pub mod amount;
pub mod document;
pub mod layout;
pub mod totals;

pub use amount::{ParseError, compute};
pub use document::{
    BankingFields, ClientFields, DocumentField, DocumentType, HeaderFields, InvoiceDocument,
    ItemField, LineItem, PayableTo,
};
pub use layout::{DocumentLayout, PageGeometry, RowKind, RowStripe, TableRow};
pub use totals::{CURRENCY_CODE, Money, total};
