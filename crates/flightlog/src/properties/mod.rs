//! Dynamic flight properties.
//!
//! Operators can attach custom, typed attributes to flights (wind speed,
//! battery cycle count, weather notes, ...). Each attribute is described by a
//! [`PropertyDefinition`]; each recorded value is a [`PropertyValue`] whose
//! variant is dictated by the definition's [`PropertyDataType`].
//!
//! - [`PropertyCodec`] converts raw text to typed values and back.
//! - [`form`] maps submitted HTML form fields onto property ids.
//! - [`PropertyCatalog`] is the read-only set of definitions a request or an
//!   import run works against.

mod codec;
pub mod form;

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use codec::{EncodedSubmission, FieldError, PropertyCodec};
pub use form::{extract_property_fields, field_name, ExtractedFields, FIELD_PREFIX};

/// The type of value a flight property holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyDataType {
    /// A date, optionally with a time of day.
    Date,
    /// A decimal number.
    Number,
    /// Free text.
    String,
}

impl std::fmt::Display for PropertyDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date => write!(f, "date"),
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
        }
    }
}

impl FromStr for PropertyDataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            _ => Err(Error::invalid_format("data_type", s, "property data type")),
        }
    }
}

/// Catalog entry describing one custom flight attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyDefinition {
    /// Identifier assigned by storage.
    pub id: i64,
    /// Display name, unique across the catalog.
    pub name: String,
    /// How raw values for this property are interpreted.
    pub data_type: PropertyDataType,
}

/// Payload for creating or renaming a property definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPropertyDefinition {
    /// Display name.
    pub name: String,
    /// Value type.
    pub data_type: PropertyDataType,
}

impl NewPropertyDefinition {
    /// Create a new definition payload.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: PropertyDataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Check the payload before it reaches storage.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is blank.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("property name must not be empty"));
        }
        Ok(())
    }
}

/// A typed property value.
///
/// Exactly one kind of value is ever present, and which one is decided by the
/// owning definition's data type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PropertyData {
    /// A date/time value.
    Date(NaiveDateTime),
    /// A decimal value.
    Number(Decimal),
    /// A text value.
    String(String),
}

impl PropertyData {
    /// The data type this value belongs to.
    #[must_use]
    pub fn data_type(&self) -> PropertyDataType {
        match self {
            Self::Date(_) => PropertyDataType::Date,
            Self::Number(_) => PropertyDataType::Number,
            Self::String(_) => PropertyDataType::String,
        }
    }
}

/// One value of a property, attached to a flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValue {
    /// The property this value belongs to.
    pub property_id: i64,
    /// Copy of the definition the value was encoded against.
    pub definition: PropertyDefinition,
    /// The value itself.
    pub value: PropertyData,
}

impl PropertyValue {
    /// Pair a value with its definition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the value's kind does not match the
    /// definition's data type.
    pub fn new(definition: PropertyDefinition, value: PropertyData) -> Result<Self> {
        if value.data_type() != definition.data_type {
            return Err(Error::InvalidFormat {
                expected: data_type_label(definition.data_type),
                field: definition.name,
                value: format!("{value:?}"),
            });
        }
        Ok(Self {
            property_id: definition.id,
            definition,
            value,
        })
    }

    /// The date slot, if this is a date property.
    #[must_use]
    pub fn date_value(&self) -> Option<NaiveDateTime> {
        match self.value {
            PropertyData::Date(d) => Some(d),
            _ => None,
        }
    }

    /// The number slot, if this is a number property.
    #[must_use]
    pub fn number_value(&self) -> Option<Decimal> {
        match self.value {
            PropertyData::Number(n) => Some(n),
            _ => None,
        }
    }

    /// The string slot, if this is a string property.
    #[must_use]
    pub fn string_value(&self) -> Option<&str> {
        match &self.value {
            PropertyData::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Human-readable name of the type a raw value must parse as.
pub(crate) fn data_type_label(data_type: PropertyDataType) -> &'static str {
    match data_type {
        PropertyDataType::Date => "date",
        PropertyDataType::Number => "number",
        PropertyDataType::String => "string",
    }
}

/// Read-only snapshot of the property definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyCatalog {
    definitions: HashMap<i64, PropertyDefinition>,
}

impl PropertyCatalog {
    /// Build a catalog from a list of definitions.
    #[must_use]
    pub fn new(definitions: impl IntoIterator<Item = PropertyDefinition>) -> Self {
        Self {
            definitions: definitions.into_iter().map(|d| (d.id, d)).collect(),
        }
    }

    /// Look up a definition by id.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&PropertyDefinition> {
        self.definitions.get(&id)
    }

    /// Look up a definition by id, failing with `UnknownProperty`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProperty` if no definition has the given id.
    pub fn require(&self, id: i64) -> Result<&PropertyDefinition> {
        self.get(id).ok_or(Error::UnknownProperty { id })
    }

    /// Look up a definition by its exact name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&PropertyDefinition> {
        self.definitions.values().find(|d| d.name == name)
    }

    /// Definitions ordered by id.
    #[must_use]
    pub fn definitions(&self) -> Vec<&PropertyDefinition> {
        let mut defs: Vec<_> = self.definitions.values().collect();
        defs.sort_by_key(|d| d.id);
        defs
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
