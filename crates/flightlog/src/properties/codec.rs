//! Conversion between raw text and typed property values.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::format::{Fixed, Item, Numeric, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use super::{PropertyCatalog, PropertyData, PropertyDataType, PropertyDefinition, PropertyValue};
use crate::config::ValuesConfig;
use crate::error::{Error, Result};

/// Most significant digits a decimal value can carry without rounding.
const MAX_SIGNIFICANT_DIGITS: usize = 28;

/// Largest scale a decimal value can carry.
const MAX_SCALE: i64 = 28;

/// Optional sign, integer digits, fraction digits, optional exponent.
static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-])?([0-9]*)(?:\.([0-9]*))?(?:[eE]([+-]?[0-9]+))?$")
        .expect("number pattern is a valid regex")
});

/// Converts raw strings to [`PropertyValue`]s and renders them back.
///
/// Dates are parsed with each configured format in turn. A format without a
/// time part yields midnight. Rendering uses the first format only, so
/// anything it omits (seconds, sub-seconds, the time of day) is lost on the
/// way back to text. Numbers and strings round-trip exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyCodec {
    date_formats: Vec<String>,
}

/// Outcome of encoding a whole submission.
#[derive(Debug, Default)]
pub struct EncodedSubmission {
    /// Successfully encoded values, ordered by property id.
    pub values: Vec<PropertyValue>,
    /// Fields that could not be encoded, ordered by property id.
    pub rejected: Vec<FieldError>,
}

impl EncodedSubmission {
    /// Check if every submitted field was accepted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// An error attributed to one submitted property.
#[derive(Debug)]
pub struct FieldError {
    /// The submitted property id.
    pub property_id: i64,
    /// What went wrong.
    pub error: Error,
}

impl Default for PropertyCodec {
    fn default() -> Self {
        Self {
            date_formats: ValuesConfig::default().date_formats,
        }
    }
}

impl PropertyCodec {
    /// Create a codec accepting the given date formats.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no format is given.
    pub fn new(date_formats: Vec<String>) -> Result<Self> {
        if date_formats.is_empty() {
            return Err(Error::ConfigValidation {
                message: "at least one date format is required".to_string(),
            });
        }
        Ok(Self { date_formats })
    }

    /// Create a codec from the values section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no format is configured.
    pub fn from_config(config: &ValuesConfig) -> Result<Self> {
        Self::new(config.date_formats.clone())
    }

    /// The format dates are rendered with.
    #[must_use]
    pub fn display_format(&self) -> &str {
        // new() guarantees at least one format
        self.date_formats.first().map_or("%Y-%m-%d %H:%M:%S", String::as_str)
    }

    /// Parse a date using the configured formats.
    ///
    /// A format with no time-of-day specifier also accepts a bare date and
    /// yields midnight. A format naming a time never falls back that way.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` naming `field` if no format matches.
    pub fn parse_date(&self, field: &str, raw: &str) -> Result<NaiveDateTime> {
        let trimmed = raw.trim();
        for format in &self.date_formats {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(dt);
            }
            if has_time_of_day(format) {
                continue;
            }
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return Ok(date.and_time(NaiveTime::MIN));
            }
        }
        Err(Error::invalid_format(field, raw, "date"))
    }

    /// Parse a decimal number.
    ///
    /// Accepts plain decimals with an optional sign and exponent (`-3.25`,
    /// `1.5e2`). The value is built exactly from its digits and keeps its
    /// scale, so `12.50` renders back as `12.50`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for a well-formed number that a decimal cannot
    /// hold without rounding (more than 28 significant digits, a scale above
    /// 28, or a magnitude beyond 96 bits), and `InvalidFormat` for anything
    /// else, digit separators included.
    pub fn parse_number(&self, field: &str, raw: &str) -> Result<Decimal> {
        let invalid = || Error::invalid_format(field, raw, "number");
        let out_of_range = || Error::OutOfRange {
            field: field.to_string(),
            value: raw.to_string(),
        };

        let captures = NUMBER_PATTERN.captures(raw.trim()).ok_or_else(invalid)?;
        let negative = captures.get(1).is_some_and(|m| m.as_str() == "-");
        let integer = captures.get(2).map_or("", |m| m.as_str());
        let fraction = captures.get(3).map_or("", |m| m.as_str());
        if integer.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        let exponent = match captures.get(4) {
            Some(m) => m.as_str().parse::<i64>().map_err(|_| out_of_range())?,
            None => 0,
        };

        let digits = format!("{integer}{fraction}");
        let significant = digits.trim_start_matches('0');
        if significant.len() > MAX_SIGNIFICANT_DIGITS {
            return Err(out_of_range());
        }

        let mut scale = i64::try_from(fraction.len())
            .ok()
            .and_then(|len| len.checked_sub(exponent))
            .ok_or_else(out_of_range)?;

        if significant.is_empty() {
            let scale = u32::try_from(scale.clamp(0, MAX_SCALE)).unwrap_or(0);
            return Ok(Decimal::new(0, scale));
        }

        // At most 28 digits, so this always fits
        let mut mantissa: i128 = significant.parse().map_err(|_| out_of_range())?;
        if scale < 0 {
            mantissa = u32::try_from(-scale)
                .ok()
                .and_then(|shift| 10_i128.checked_pow(shift))
                .and_then(|factor| mantissa.checked_mul(factor))
                .ok_or_else(out_of_range)?;
            scale = 0;
        }
        if scale > MAX_SCALE {
            return Err(out_of_range());
        }
        if negative {
            mantissa = -mantissa;
        }

        let scale = u32::try_from(scale).map_err(|_| out_of_range())?;
        Decimal::try_from_i128_with_scale(mantissa, scale).map_err(|_| out_of_range())
    }

    /// Encode a raw string as a value of the given property.
    ///
    /// String properties accept any input, including the empty string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` (or `OutOfRange` for oversized numbers) naming
    /// the property when the raw value does not parse as its data type.
    pub fn encode(&self, definition: &PropertyDefinition, raw: &str) -> Result<PropertyValue> {
        let value = match definition.data_type {
            PropertyDataType::Date => PropertyData::Date(self.parse_date(&definition.name, raw)?),
            PropertyDataType::Number => {
                PropertyData::Number(self.parse_number(&definition.name, raw)?)
            }
            PropertyDataType::String => PropertyData::String(raw.to_string()),
        };
        Ok(PropertyValue {
            property_id: definition.id,
            definition: definition.clone(),
            value,
        })
    }

    /// Render a value back to display text.
    #[must_use]
    pub fn decode(&self, value: &PropertyValue) -> String {
        match &value.value {
            PropertyData::Date(dt) => dt.format(self.display_format()).to_string(),
            PropertyData::Number(n) => n.to_string(),
            PropertyData::String(s) => s.clone(),
        }
    }

    /// Encode every entry of a submission against the catalog.
    ///
    /// Failures are collected per property and never stop the remaining
    /// entries from being encoded. Ids missing from the catalog are reported
    /// as `UnknownProperty`.
    #[must_use]
    pub fn encode_submission(
        &self,
        catalog: &PropertyCatalog,
        raw: &HashMap<i64, String>,
    ) -> EncodedSubmission {
        let mut ids: Vec<i64> = raw.keys().copied().collect();
        ids.sort_unstable();

        let mut outcome = EncodedSubmission::default();
        for id in ids {
            let encoded = catalog
                .require(id)
                .and_then(|definition| self.encode(definition, &raw[&id]));
            match encoded {
                Ok(value) => outcome.values.push(value),
                Err(error) => {
                    debug!("Rejected property {}: {}", id, error);
                    outcome.rejected.push(FieldError {
                        property_id: id,
                        error,
                    });
                }
            }
        }
        outcome
    }
}

/// Whether a date format names any part of a time of day.
fn has_time_of_day(format: &str) -> bool {
    StrftimeItems::new(format).any(|item| {
        matches!(
            item,
            Item::Numeric(
                Numeric::Hour
                    | Numeric::Hour12
                    | Numeric::Minute
                    | Numeric::Second
                    | Numeric::Nanosecond
                    | Numeric::Timestamp,
                _
            ) | Item::Fixed(Fixed::LowerAmPm | Fixed::UpperAmPm | Fixed::Nanosecond)
        )
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn definition(id: i64, name: &str, data_type: PropertyDataType) -> PropertyDefinition {
        PropertyDefinition {
            id,
            name: name.to_string(),
            data_type,
        }
    }

    fn catalog() -> PropertyCatalog {
        PropertyCatalog::new(vec![
            definition(1, "Battery Swap", PropertyDataType::Date),
            definition(2, "Wind Speed", PropertyDataType::Number),
            definition(3, "Weather", PropertyDataType::String),
        ])
    }

    #[test]
    fn test_number_round_trip_is_numerically_equal() {
        let codec = PropertyCodec::default();
        let def = definition(2, "Wind Speed", PropertyDataType::Number);

        let value = codec.encode(&def, "12.50").unwrap();
        assert_eq!(value.number_value(), Some(Decimal::new(1250, 2)));

        let rendered = codec.decode(&value);
        assert_eq!(
            Decimal::from_str(&rendered).unwrap(),
            Decimal::from_str("12.5").unwrap()
        );
    }

    #[test]
    fn test_number_accepts_whitespace_and_sign() {
        let codec = PropertyCodec::default();
        let def = definition(2, "Altitude", PropertyDataType::Number);

        let value = codec.encode(&def, "  -3.25 ").unwrap();
        assert_eq!(value.number_value(), Some(Decimal::new(-325, 2)));
    }

    #[test]
    fn test_number_scientific_notation() {
        let codec = PropertyCodec::default();
        assert_eq!(
            codec.parse_number("n", "1.5e2").unwrap(),
            Decimal::new(150, 0)
        );
    }

    #[test]
    fn test_number_invalid_format() {
        let codec = PropertyCodec::default();
        let def = definition(2, "Wind Speed", PropertyDataType::Number);

        let err = codec.encode(&def, "breezy").unwrap_err();
        match err {
            Error::InvalidFormat { field, value, .. } => {
                assert_eq!(field, "Wind Speed");
                assert_eq!(value, "breezy");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(
            codec.encode(&def, ""),
            Err(Error::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_number_out_of_range() {
        let codec = PropertyCodec::default();
        let huge = format!("1{}", "0".repeat(40));

        assert!(matches!(
            codec.parse_number("Distance", &huge),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_string_never_fails() {
        let codec = PropertyCodec::default();
        let def = definition(3, "Weather", PropertyDataType::String);

        for raw in ["", "   ", "Sunny, light wind", "12.5", "\u{1F681} ñ"] {
            let value = codec.encode(&def, raw).unwrap();
            assert_eq!(value.string_value(), Some(raw));
            assert_eq!(codec.decode(&value), raw);
        }
    }

    #[test]
    fn test_date_formats() {
        let codec = PropertyCodec::default();
        let def = definition(1, "Battery Swap", PropertyDataType::Date);

        let with_time = codec.encode(&def, "2023-05-01 14:30:15").unwrap();
        assert_eq!(
            with_time.date_value().unwrap(),
            NaiveDate::from_ymd_opt(2023, 5, 1)
                .unwrap()
                .and_hms_opt(14, 30, 15)
                .unwrap()
        );

        let date_only = codec.encode(&def, "2023-05-01").unwrap();
        assert_eq!(
            date_only.date_value().unwrap(),
            NaiveDate::from_ymd_opt(2023, 5, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );

        let day_first = codec.encode(&def, "01/05/2023").unwrap();
        assert_eq!(day_first.date_value(), date_only.date_value());
    }

    #[test]
    fn test_date_invalid_names_field() {
        let codec = PropertyCodec::default();
        let def = definition(1, "Battery Swap", PropertyDataType::Date);

        let err = codec.encode(&def, "not-a-date").unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { .. }));
        assert!(err.to_string().contains("Battery Swap"));
    }

    #[test]
    fn test_date_render_drops_what_format_omits() {
        let codec = PropertyCodec::new(vec!["%Y-%m-%d".to_string()]).unwrap();
        let def = definition(1, "Inspection", PropertyDataType::Date);

        let value = codec.encode(&def, "2023-05-01").unwrap();
        assert_eq!(codec.decode(&value), "2023-05-01");

        let with_time = PropertyCodec::default()
            .encode(&def, "2023-05-01 14:30:00")
            .unwrap();
        assert_eq!(codec.decode(&with_time), "2023-05-01");
    }

    #[test]
    fn test_date_round_trip_with_default_format() {
        let codec = PropertyCodec::default();
        let def = definition(1, "Inspection", PropertyDataType::Date);

        let value = codec.encode(&def, "2023-05-01 14:30:15").unwrap();
        assert_eq!(codec.decode(&value), "2023-05-01 14:30:15");
    }

    #[test]
    fn test_new_requires_a_format() {
        assert!(PropertyCodec::new(Vec::new()).is_err());
    }

    #[test]
    fn test_encode_carries_definition() {
        let codec = PropertyCodec::default();
        let def = definition(3, "Weather", PropertyDataType::String);

        let value = codec.encode(&def, "overcast").unwrap();
        assert_eq!(value.property_id, 3);
        assert_eq!(value.definition, def);
    }

    #[test]
    fn test_encode_submission_collects_errors() {
        let codec = PropertyCodec::default();
        let raw: HashMap<i64, String> = [
            (2, "12.5".to_string()),
            (1, "yesterday".to_string()),
            (3, String::new()),
            (42, "orphan".to_string()),
        ]
        .into_iter()
        .collect();

        let outcome = codec.encode_submission(&catalog(), &raw);

        let saved: Vec<i64> = outcome.values.iter().map(|v| v.property_id).collect();
        assert_eq!(saved, vec![2, 3]);

        let rejected: Vec<i64> = outcome.rejected.iter().map(|e| e.property_id).collect();
        assert_eq!(rejected, vec![1, 42]);
        assert!(matches!(
            outcome.rejected[0].error,
            Error::InvalidFormat { .. }
        ));
        assert!(matches!(
            outcome.rejected[1].error,
            Error::UnknownProperty { id: 42 }
        ));
        assert!(!outcome.is_clean());
    }

    #[test]
    fn test_encode_submission_empty() {
        let outcome = PropertyCodec::default().encode_submission(&catalog(), &HashMap::new());
        assert!(outcome.values.is_empty());
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_number_too_precise_is_out_of_range() {
        let codec = PropertyCodec::default();
        let def = definition(2, "Wind Speed", PropertyDataType::Number);

        let err = codec
            .encode(&def, "0.123456789012345678901234567890123")
            .unwrap_err();
        assert!(matches!(err, Error::OutOfRange { .. }));

        // 28 significant digits still round-trip exactly
        let exact = "0.1234567890123456789012345678";
        let value = codec.encode(&def, exact).unwrap();
        assert_eq!(codec.decode(&value), exact);
    }

    #[test]
    fn test_number_huge_exponent_is_out_of_range() {
        let codec = PropertyCodec::default();

        for raw in ["1e400", "-2.5E+100", "1e-40", "1e99999999999999999999"] {
            assert!(
                matches!(
                    codec.parse_number("Distance", raw),
                    Err(Error::OutOfRange { .. })
                ),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn test_number_rejects_non_decimal_text() {
        let codec = PropertyCodec::default();

        for raw in ["1_000", "1,000", "0x10", "1e", ".", "-", "+", "1.2.3", "NaN", "1 000"] {
            assert!(
                matches!(
                    codec.parse_number("Distance", raw),
                    Err(Error::InvalidFormat { .. })
                ),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn test_number_keeps_scale() {
        let codec = PropertyCodec::default();

        assert_eq!(codec.parse_number("n", "12.50").unwrap().to_string(), "12.50");
        assert_eq!(codec.parse_number("n", "+.5").unwrap(), Decimal::new(5, 1));
        assert_eq!(codec.parse_number("n", "-0.0").unwrap(), Decimal::ZERO);
        assert_eq!(codec.parse_number("n", "25e-1").unwrap(), Decimal::new(25, 1));
        assert_eq!(
            codec.parse_number("n", "0001.5").unwrap(),
            Decimal::new(15, 1)
        );
    }

    #[test]
    fn test_date_format_with_time_does_not_fall_back_to_midnight() {
        let codec = PropertyCodec::new(vec!["%Y-%m-%d %H".to_string()]).unwrap();
        let def = definition(1, "Battery Swap", PropertyDataType::Date);

        assert!(matches!(
            codec.encode(&def, "2023-05-01 14"),
            Err(Error::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_has_time_of_day() {
        assert!(has_time_of_day("%Y-%m-%d %H:%M:%S"));
        assert!(has_time_of_day("%Y-%m-%d %H"));
        assert!(has_time_of_day("%d/%m/%Y %I%p"));
        assert!(has_time_of_day("%Y-%m-%dT%T"));
        assert!(!has_time_of_day("%Y-%m-%d"));
        assert!(!has_time_of_day("%d/%m/%Y"));
        assert!(!has_time_of_day("%A %e %B %Y"));
    }
}
