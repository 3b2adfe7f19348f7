//! `quoteprint-core` — shared domain building blocks.
//!
//! Pure types only: the error model, identifiers, and value-object markers used
//! by the invoicing, rendering and export crates.

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::ExportId;
pub use value_object::ValueObject;
