//! Document totals.

use serde::{Deserialize, Serialize};

use quoteprint_core::ValueObject;

use crate::amount::parse_number;
use crate::document::LineItem;

/// Currency code printed in front of rendered totals.
pub const CURRENCY_CODE: &str = "AED";

/// Money amount in the smallest currency unit (fils/cents).
///
/// Integer minor units keep summation associative, so totals do not depend on
/// line order.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Read a stored line amount; empty or unparsable text counts as zero.
    pub fn from_amount_text(text: &str) -> Self {
        match parse_number(text) {
            Ok(value) => Self::from_f64(value),
            Err(_) => Self::ZERO,
        }
    }

    /// Nearest whole number of cents, half away from zero, saturating.
    pub fn from_f64(value: f64) -> Self {
        // `as` saturates on overflow.
        Self((value * 100.0).round() as i64)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// `<CODE> <amount>` as printed on the document, e.g. `AED 100.00`.
    pub fn format_with_code(&self, code: &str) -> String {
        format!("{code} {self}")
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Sum of every line amount.
///
/// Pure function of the current items: re-invocation and reordering give the
/// same value, and an empty list totals zero.
pub fn total(items: &[LineItem]) -> Money {
    let cents: i128 = items
        .iter()
        .map(|item| Money::from_amount_text(item.amount()).cents() as i128)
        .sum();
    Money(cents.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn item(qty: &str, price: &str) -> LineItem {
        LineItem::new(
            NaiveDate::from_ymd_opt(2025, 1, 15),
            "service",
            qty,
            price,
        )
    }

    #[test]
    fn empty_list_totals_zero() {
        assert_eq!(total(&[]), Money::ZERO);
        assert_eq!(total(&[]).as_f64(), 0.0);
    }

    #[test]
    fn unpriced_lines_count_as_zero() {
        let items = vec![item("2", "50.00"), item("3", ""), item("x", "10")];
        assert_eq!(total(&items), Money::from_cents(10_000));
    }

    #[test]
    fn single_line_round_trip_renders_with_currency() {
        let items = vec![item("2", "50.00")];
        assert_eq!(items[0].amount(), "100.00");

        let sum = total(&items);
        assert_eq!(sum.as_f64(), 100.00);
        assert_eq!(sum.format_with_code(CURRENCY_CODE), "AED 100.00");
    }

    #[test]
    fn negative_totals_keep_their_sign() {
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::from_cents(-12_345).to_string(), "-123.45");
    }

    #[test]
    fn recomputation_is_idempotent() {
        let items = vec![item("1", "0.10"), item("1", "0.20")];
        assert_eq!(total(&items), total(&items));
        assert_eq!(total(&items).to_string(), "0.30");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: the total does not depend on line order.
        #[test]
        fn total_is_permutation_invariant(
            prices in prop::collection::vec(0u32..1_000_000u32, 0..20),
            seed in any::<u64>(),
        ) {
            let items: Vec<LineItem> = prices
                .iter()
                .map(|c| item("1", &format!("{}.{:02}", c / 100, c % 100)))
                .collect();

            let mut shuffled = items.clone();
            // Deterministic Fisher-Yates driven by the seed.
            let mut state = seed;
            for i in (1..shuffled.len()).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }

            prop_assert_eq!(total(&items), total(&shuffled));
            let expected: i64 = prices.iter().map(|c| *c as i64).sum();
            prop_assert_eq!(total(&items).cents(), expected);
        }
    }
}
