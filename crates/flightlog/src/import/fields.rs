//! Typed access to the cells of one CSV row.

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::properties::{PropertyCodec, PropertyDefinition, PropertyValue};

/// A named column at a fixed position in every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvField {
    /// Header name, used in error messages.
    pub name: String,
    /// Zero-based column index.
    pub index: usize,
}

impl CsvField {
    /// Create a field descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }

    /// The raw cell for this field.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` if the row is too short.
    pub fn raw<'r, S: AsRef<str>>(&self, row: &'r [S]) -> Result<&'r str> {
        row.get(self.index)
            .map(AsRef::as_ref)
            .ok_or_else(|| Error::MissingField {
                field: self.name.clone(),
                index: self.index,
            })
    }

    /// The cell converted with the type's `FromStr` implementation.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` if the row is too short, or `InvalidFormat`
    /// with the raw cell if it does not parse as `T`.
    pub fn value<T: FromStr, S: AsRef<str>>(&self, row: &[S]) -> Result<T> {
        let raw = self.raw(row)?;
        raw.parse()
            .map_err(|_| Error::invalid_format(&self.name, raw, std::any::type_name::<T>()))
    }

    /// The cell converted with a custom parser.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` if the row is too short, or whatever `parse`
    /// returns.
    pub fn parse_with<T, S: AsRef<str>>(
        &self,
        row: &[S],
        parse: impl FnOnce(&str) -> Result<T>,
    ) -> Result<T> {
        parse(self.raw(row)?)
    }
}

/// A column holding values of one flight property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightPropertyField {
    /// Where the value sits in the row.
    pub field: CsvField,
    /// The property the column feeds.
    pub definition: PropertyDefinition,
}

impl FlightPropertyField {
    /// Pair a column with its property definition.
    #[must_use]
    pub fn new(field: CsvField, definition: PropertyDefinition) -> Self {
        Self { field, definition }
    }

    /// Encode the cell as a value of the property.
    ///
    /// Encoding is the same as for a submitted form field, so a CSV cell and
    /// a form value with the same text produce the same value.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` if the row is too short, or the codec's error
    /// naming the property.
    pub fn value<S: AsRef<str>>(&self, row: &[S], codec: &PropertyCodec) -> Result<PropertyValue> {
        self.field
            .parse_with(row, |raw| codec.encode(&self.definition, raw))
    }

    /// Like [`value`](Self::value), but a blank cell means nothing was
    /// recorded.
    ///
    /// # Errors
    ///
    /// Same as [`value`](Self::value).
    pub fn recorded_value<S: AsRef<str>>(
        &self,
        row: &[S],
        codec: &PropertyCodec,
    ) -> Result<Option<PropertyValue>> {
        if self.field.raw(row)?.trim().is_empty() {
            return Ok(None);
        }
        self.value(row, codec).map(Some)
    }
}
