//! Import statistics and the aggregator that derives them.

use std::collections::HashSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::record::PriceRecord;

/// Aggregate statistics over a set of price records.
///
/// Derived, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub total_items: u64,
    pub total_categories: u64,
    /// Sum of all prices, truncated toward zero.
    pub total_price: i64,
}

impl ImportStats {
    /// Compute stats over an in-memory record set.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a PriceRecord>,
    {
        let mut acc = StatsAccumulator::new();
        for r in records {
            acc.push(r);
        }
        acc.finish()
    }

    /// Build stats from storage-side aggregate values (sum already truncated).
    pub fn from_parts(total_items: u64, total_categories: u64, total_price: i64) -> Self {
        Self {
            total_items,
            total_categories,
            total_price,
        }
    }
}

/// Incremental aggregator: feed records one at a time.
///
/// Categories are compared case-sensitively by exact string value.
#[derive(Debug, Default, Clone)]
pub struct StatsAccumulator {
    items: u64,
    categories: HashSet<String>,
    price_sum: Decimal,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: &PriceRecord) {
        self.items += 1;
        if !self.categories.contains(&record.category) {
            self.categories.insert(record.category.clone());
        }
        let price = record.price.value();
        self.price_sum = self.price_sum.checked_add(price).unwrap_or(if price.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        });
    }

    pub fn finish(&self) -> ImportStats {
        ImportStats::from_parts(
            self.items,
            self.categories.len() as u64,
            truncate_total(self.price_sum),
        )
    }
}

/// Truncate an exact price sum toward zero.
///
/// Sums beyond the `i64` range saturate.
pub fn truncate_total(sum: Decimal) -> i64 {
    sum.trunc().to_i64().unwrap_or(if sum.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Price;
    use proptest::prelude::*;

    fn rec(category: &str, price: &str) -> PriceRecord {
        PriceRecord::new("1", "item", category, Price::parse(price).unwrap(), "2024-01-01")
    }

    #[test]
    fn empty_set_yields_zero_stats() {
        let stats = ImportStats::from_records(&Vec::<PriceRecord>::new());
        assert_eq!(stats, ImportStats::default());
    }

    #[test]
    fn widget_gadget_example() {
        let records = vec![rec("Tools", "9.99"), rec("Tools", "5")];
        let stats = ImportStats::from_records(&records);
        assert_eq!(
            stats,
            ImportStats {
                total_items: 2,
                total_categories: 1,
                total_price: 14,
            }
        );
    }

    #[test]
    fn categories_are_case_sensitive() {
        let records = vec![rec("Tools", "1"), rec("tools", "1"), rec("Tools", "1")];
        let stats = ImportStats::from_records(&records);
        assert_eq!(stats.total_categories, 2);
        assert_eq!(stats.total_items, 3);
    }

    #[test]
    fn truncation_is_toward_zero() {
        assert_eq!(truncate_total(Decimal::new(1499, 2)), 14);
        assert_eq!(truncate_total(Decimal::new(-1499, 2)), -14);
        assert_eq!(truncate_total(Decimal::new(5, 1)), 0);
        assert_eq!(truncate_total(Decimal::MAX), i64::MAX);
        assert_eq!(truncate_total(Decimal::MIN), i64::MIN);
    }

    #[test]
    fn values_just_below_an_integer_are_not_rounded_up() {
        let stats = ImportStats::from_records(&[rec("c", "13.9999995")]);
        assert_eq!(stats.total_price, 13);

        let stats = ImportStats::from_records(&[rec("c", "-13.9999995")]);
        assert_eq!(stats.total_price, -13);
    }

    #[test]
    fn tenths_sum_exactly() {
        let records: Vec<_> = (0..10).map(|_| rec("c", "0.1")).collect();
        assert_eq!(ImportStats::from_records(&records).total_price, 1);
    }

    #[test]
    fn large_magnitudes_stay_exact() {
        let records = vec![
            rec("c", "12345678901234567.89"),
            rec("c", "0.11"),
            rec("c", "1e3"),
        ];
        assert_eq!(
            ImportStats::from_records(&records).total_price,
            12_345_678_901_235_568
        );
    }

    #[test]
    fn serializes_with_response_field_names() {
        let stats = ImportStats {
            total_items: 2,
            total_categories: 1,
            total_price: 14,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"total_items": 2, "total_categories": 1, "total_price": 14})
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the reported total equals the truncated exact sum of cents.
        #[test]
        fn total_price_matches_integer_cents(
            cents in prop::collection::vec(0u64..1_000_000u64, 0..200)
        ) {
            let records: Vec<_> = cents
                .iter()
                .map(|c| rec("c", &format!("{}.{:02}", c / 100, c % 100)))
                .collect();
            let expected = (cents.iter().sum::<u64>() / 100) as i64;
            prop_assert_eq!(ImportStats::from_records(&records).total_price, expected);
        }

        /// Property: distinct categories and item count match a set-based count.
        #[test]
        fn counts_match_set_semantics(
            categories in prop::collection::vec("[a-cA-C]{1,2}", 0..50)
        ) {
            let records: Vec<_> = categories.iter().map(|c| rec(c, "1")).collect();
            let distinct: HashSet<&String> = categories.iter().collect();
            let stats = ImportStats::from_records(&records);
            prop_assert_eq!(stats.total_items, categories.len() as u64);
            prop_assert_eq!(stats.total_categories, distinct.len() as u64);
        }
    }
}
