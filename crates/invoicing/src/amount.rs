//! Line amount derivation.
//!
//! A line's amount is never typed by the user: it is derived from the raw
//! quantity and unit price text every time either of them changes. An empty
//! amount means "not yet priced", which is different from a priced zero.

use thiserror::Error;

/// Numeric form input that could not be read as a finite number.
///
/// Never surfaced to the user; the calculator turns it into an empty amount.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("not a finite number: {input:?}")]
pub struct ParseError {
    pub input: String,
}

/// Longest leading decimal literal of `s`: sign, digits with an optional
/// fraction, then an exponent only if it has digits. Empty when no digit leads.
fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        digits += frac_end - (end + 1);
        end = frac_end;
    }
    if digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    &s[..end]
}

/// Parse a numeric form field.
///
/// Leading whitespace is skipped and the longest leading number is read, so
/// `"2 pcs"` is `2`. Text that starts with no digit, and numbers that overflow
/// to infinity, are errors.
pub fn parse_number(input: &str) -> Result<f64, ParseError> {
    numeric_prefix(input.trim_start())
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError {
            input: input.to_string(),
        })
}

/// Round half away from zero at the second decimal.
pub fn round_to_cents(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round() / 100.0;
    // Keep `-0.00` out of rendered output.
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Format with exactly two fractional digits after rounding to cents.
pub fn format_fixed2(value: f64) -> String {
    format!("{:.2}", round_to_cents(value))
}

/// Derive a line amount from quantity and unit price.
///
/// Returns an empty string when either input does not parse or the unit price
/// is empty; otherwise the product rounded to two decimals.
pub fn compute(quantity: &str, unit_price: &str) -> String {
    try_compute(quantity, unit_price).unwrap_or_default()
}

fn try_compute(quantity: &str, unit_price: &str) -> Result<String, ParseError> {
    if unit_price.is_empty() {
        return Err(ParseError {
            input: String::new(),
        });
    }
    let qty = parse_number(quantity)?;
    let price = parse_number(unit_price)?;
    let product = qty * price;
    if !product.is_finite() {
        return Err(ParseError {
            input: format!("{quantity} * {unit_price}"),
        });
    }
    Ok(format_fixed2(product))
}
