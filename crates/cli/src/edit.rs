//! Form edits applied from the command line.
//!
//! Edits run in a fixed order: document fields, payee, VAT toggle, new
//! items, item field edits, moves, then removals.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

use quoteprint_invoicing::{DocumentField, InvoiceDocument, ItemField};

use crate::EditArgs;

fn split_assignment(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('=')
        .ok_or_else(|| anyhow!("expected FIELD=VALUE, got {raw:?}"))
}

fn parse_index(raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .with_context(|| format!("invalid item index {raw:?}"))
}

pub fn apply(doc: &mut InvoiceDocument, args: &EditArgs, today: NaiveDate) -> Result<()> {
    for raw in &args.fields {
        let (key, value) = split_assignment(raw)?;
        let field: DocumentField = key.parse()?;
        doc.set_field(field, value);
    }

    if let Some(payee) = args.payable_to {
        doc.set_payable_to(payee);
    }
    if args.toggle_vat {
        doc.toggle_vat();
    }
    for _ in 0..args.add_items {
        doc.add_item(today);
    }

    for raw in &args.items {
        let (index, assignment) = raw
            .split_once(':')
            .ok_or_else(|| anyhow!("expected INDEX:FIELD=VALUE, got {raw:?}"))?;
        let (key, value) = split_assignment(assignment)?;
        let field: ItemField = key.parse()?;
        doc.set_item_field(parse_index(index)?, field, value)
            .with_context(|| format!("editing item {raw:?}"))?;
    }

    for raw in &args.move_item {
        let (from, to) = raw
            .split_once(':')
            .ok_or_else(|| anyhow!("expected FROM:TO, got {raw:?}"))?;
        doc.move_item(parse_index(from)?, parse_index(to)?)
            .with_context(|| format!("moving item {raw:?}"))?;
    }

    for &index in &args.remove_item {
        doc.remove_item(index)
            .with_context(|| format!("removing item {index}"))?;
    }

    Ok(())
}
