//! Form field naming convention for property values.
//!
//! The flight edit form renders one input per property, named
//! [`FIELD_PREFIX`] followed by the property id (`FPV_17`). On submission the
//! extractor reverses that mapping. Both directions share the constant below,
//! so the renderer and the binder cannot drift apart.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Prefix of every form field carrying a property value.
pub const FIELD_PREFIX: &str = "FPV_";

/// Prefix followed by ASCII digits and nothing else.
static FIELD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{}([0-9]+)$", regex::escape(FIELD_PREFIX)))
        .expect("field name pattern is a valid regex")
});

/// The form field name for a property id.
#[must_use]
pub fn field_name(property_id: i64) -> String {
    format!("{FIELD_PREFIX}{property_id}")
}

/// Parse the property id out of a form field name.
///
/// Returns `Ok(None)` for names that do not follow the convention.
///
/// # Errors
///
/// Returns `OutOfRange` if the numeric suffix does not fit in an `i64`.
pub fn parse_field_name(name: &str) -> Result<Option<i64>> {
    let Some(captures) = FIELD_PATTERN.captures(name) else {
        return Ok(None);
    };
    let digits = &captures[1];
    // Only digits can reach this point, so overflow is the only failure
    digits.parse::<i64>().map(Some).map_err(|_| Error::OutOfRange {
        field: name.to_string(),
        value: digits.to_string(),
    })
}

/// Property fields found in a submitted form.
#[derive(Debug, Default)]
pub struct ExtractedFields {
    /// Raw values keyed by property id.
    pub values: HashMap<i64, String>,
    /// Fields named by the convention whose id could not be read, in
    /// submission order.
    pub rejected: Vec<(String, Error)>,
}

impl ExtractedFields {
    /// Check if every property field was readable.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Extract property values from submitted form fields.
///
/// Fields named by the convention are mapped to their property id; all other
/// fields are ignored. A field without a value maps to the empty string. A
/// field whose id overflows is set aside in [`ExtractedFields::rejected`]
/// and the remaining fields are still extracted.
///
/// # Errors
///
/// Returns `DuplicateField` if two fields resolve to the same property
/// (`FPV_7` twice, or `FPV_7` and `FPV_007`).
pub fn extract_property_fields<'a, I>(fields: I) -> Result<ExtractedFields>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut extracted = ExtractedFields::default();
    for (name, value) in fields {
        let id = match parse_field_name(name) {
            Ok(Some(id)) => id,
            Ok(None) => continue,
            Err(error) => {
                extracted.rejected.push((name.to_string(), error));
                continue;
            }
        };
        match extracted.values.entry(id) {
            Entry::Occupied(_) => {
                return Err(Error::DuplicateField {
                    name: name.to_string(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(value.unwrap_or_default().to_string());
            }
        }
    }
    Ok(extracted)
}
