//! Price catalog record and its price value object.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Number of positional fields a catalog row must carry.
pub const FIELD_COUNT: usize = 5;

/// Decimal places a `Decimal` can carry.
const MAX_SCALE: i64 = 28;

/// Largest accepted exponent magnitude in `1e3`-style prices.
const MAX_EXPONENT: i64 = 64;

/// A validated price.
///
/// Keeps the text it was parsed from so storage and export reproduce exactly
/// what was imported, while `value()` is the exact decimal used for sums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Price {
    raw: String,
    value: Decimal,
}

impl Price {
    /// Parse a price from text.
    ///
    /// Accepts `[+-]digits[.digits][e[+-]digits]` (either side of the point may
    /// be empty, not both), surrounding whitespace ignored. Negative values are
    /// accepted. Empty, non-numeric, `NaN`/`inf` and values outside the
    /// `Decimal` range are rejected.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        let value = parse_decimal(trimmed).ok_or_else(|| DomainError::invalid_price(raw))?;

        Ok(Self {
            raw: trimmed.to_string(),
            value,
        })
    }

    /// Text form as received (trimmed).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> Decimal {
        self.value
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let (negative, unsigned) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let (number, exponent) = match unsigned.find(['e', 'E']) {
        Some(pos) => (&unsigned[..pos], unsigned[pos + 1..].parse::<i64>().ok()?),
        None => (unsigned, 0),
    };
    if exponent.abs() > MAX_EXPONENT {
        return None;
    }

    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    let digits = format!("{int_part}{frac_part}");
    let digits = digits.trim_start_matches('0');
    if digits.len() > 38 {
        return None;
    }
    let mut mantissa: i128 = if digits.is_empty() { 0 } else { digits.parse().ok()? };

    let mut scale = frac_part.len() as i64 - exponent;
    while scale > MAX_SCALE && mantissa % 10 == 0 {
        mantissa /= 10;
        scale -= 1;
    }
    if scale > MAX_SCALE {
        return None;
    }

    let mut value = Decimal::try_from_i128_with_scale(mantissa, scale.max(0) as u32).ok()?;
    for _ in scale..0 {
        value = value.checked_mul(Decimal::TEN)?;
    }

    Some(if negative { -value } else { value })
}

impl FromStr for Price {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Price {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        price.raw
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One catalog row.
///
/// Records are not deduplicated: several records may share a `product_id`.
/// `created_at` is carried verbatim; no date parsing happens anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub price: Price,
    pub created_at: String,
}

impl PriceRecord {
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        category: impl Into<String>,
        price: Price,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            category: category.into(),
            price,
            created_at: created_at.into(),
        }
    }

    /// Build a record from positional import fields:
    /// `product_id, product_name, category, price, created_at`.
    ///
    /// Fields past the fifth are ignored. Callers decide what to do with rows
    /// that are too short; this returns a validation error for them.
    pub fn from_import_fields<'a, I>(fields: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut it = fields.into_iter();
        let mut next = |name: &str| {
            it.next()
                .ok_or_else(|| DomainError::validation(format!("missing field {name}")))
        };

        let product_id = next("product_id")?;
        let product_name = next("product_name")?;
        let category = next("category")?;
        let price = next("price")?;
        let created_at = next("created_at")?;

        Ok(Self::new(
            product_id,
            product_name,
            category,
            Price::parse(price)?,
            created_at,
        ))
    }

    /// Fields in export column order:
    /// `product_id, created_at, product_name, category, price`.
    pub fn export_fields(&self) -> [&str; FIELD_COUNT] {
        [
            &self.product_id,
            &self.created_at,
            &self.product_name,
            &self.category,
            self.price.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_parses_decimal_and_integer_text() {
        let p = Price::parse("9.99").unwrap();
        assert_eq!(p.as_str(), "9.99");
        assert_eq!(p.value(), Decimal::new(999, 2));

        let p = Price::parse("5").unwrap();
        assert_eq!(p.value(), Decimal::from(5));
    }

    #[test]
    fn price_trims_whitespace_and_keeps_trimmed_text() {
        let p = Price::parse("  12.50 ").unwrap();
        assert_eq!(p.as_str(), "12.50");
        assert_eq!(p.to_string(), "12.50");
    }

    #[test]
    fn price_accepts_negative_values() {
        let p = Price::parse("-3.25").unwrap();
        assert_eq!(p.value(), Decimal::new(-325, 2));
    }

    #[test]
    fn price_keeps_alternate_spellings_verbatim() {
        let cases = [
            ("1e3", Decimal::from(1000)),
            ("2.5E-1", Decimal::new(25, 2)),
            ("+5", Decimal::from(5)),
            (".5", Decimal::new(5, 1)),
            ("5.", Decimal::from(5)),
            ("007.10", Decimal::new(710, 2)),
        ];
        for (raw, value) in cases {
            let p = Price::parse(raw).unwrap();
            assert_eq!(p.as_str(), raw);
            assert_eq!(p.value(), value, "{raw}");
        }
    }

    #[test]
    fn price_keeps_exact_digits() {
        let p = Price::parse("13.9999995").unwrap();
        assert_eq!(p.value(), Decimal::new(139_999_995, 7));
    }

    #[test]
    fn price_rejects_non_numeric_empty_and_non_finite() {
        for raw in [
            "abc", "", "   ", "NaN", "inf", "-infinity", "1,5", ".", "-", "1e", "e5", "1.2.3", "1e999",
            "0x10", "1_000",
        ] {
            match Price::parse(raw) {
                Err(DomainError::InvalidPrice(got)) => assert_eq!(got, raw),
                other => panic!("expected InvalidPrice for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn record_from_import_fields_maps_positions() {
        let rec =
            PriceRecord::from_import_fields(["1", "Widget", "Tools", "9.99", "2024-01-01"]).unwrap();
        assert_eq!(rec.product_id, "1");
        assert_eq!(rec.product_name, "Widget");
        assert_eq!(rec.category, "Tools");
        assert_eq!(rec.price.as_str(), "9.99");
        assert_eq!(rec.created_at, "2024-01-01");
    }

    #[test]
    fn record_from_import_fields_ignores_extra_fields() {
        let rec = PriceRecord::from_import_fields(["1", "A", "B", "1", "2024-01-01", "extra"]).unwrap();
        assert_eq!(rec.created_at, "2024-01-01");
    }

    #[test]
    fn record_from_import_fields_rejects_short_rows() {
        let err = PriceRecord::from_import_fields(["1", "A", "B"]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("price")));
    }

    #[test]
    fn export_fields_use_export_column_order() {
        let rec = PriceRecord::new("7", "Gadget", "Toys", Price::parse("5").unwrap(), "2024-01-02");
        assert_eq!(rec.export_fields(), ["7", "2024-01-02", "Gadget", "Toys", "5"]);
    }

    #[test]
    fn price_serializes_as_its_text() {
        let rec = PriceRecord::new("1", "A", "B", Price::parse("1.50").unwrap(), "d");
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["price"], "1.50");

        let back: PriceRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }
}
