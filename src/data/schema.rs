//! Canonical Schema Module
//! Field names, numeric constraints and raw-header rename tables for each dataset.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version stamped on every canonical dataset built by this crate.
pub const SCHEMA_VERSION: u32 = 1;

/// Canonical field names.
pub mod fields {
    pub const MINERAL_NAME: &str = "mineralName";
    pub const PRODUCTION: &str = "production";
    pub const REGION: &str = "region";
    pub const ACTUAL: &str = "actual";
    pub const NORMAL: &str = "normal";
    pub const DEPARTURE_PERCENT: &str = "departurePercent";
}

/// A numeric column of a canonical schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericField {
    pub name: String,
    pub non_negative: bool,
}

impl NumericField {
    pub fn new(name: &str, non_negative: bool) -> Self {
        Self {
            name: name.to_string(),
            non_negative,
        }
    }
}

/// Describes the fixed set of typed fields a canonical dataset carries.
///
/// Every schema has exactly one text identity key followed by its numeric
/// fields, in canonical output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    pub name: String,
    pub key: String,
    pub numeric: Vec<NumericField>,
}

impl DatasetSchema {
    pub fn new(name: &str, key: &str, numeric: Vec<NumericField>) -> Self {
        Self {
            name: name.to_string(),
            key: key.to_string(),
            numeric,
        }
    }

    /// Mineral production by category: `[mineralName, production]`.
    pub fn production() -> Self {
        Self::new(
            "production",
            fields::MINERAL_NAME,
            vec![NumericField::new(fields::PRODUCTION, true)],
        )
    }

    /// Regional rainfall statistics: `[region, actual, normal, departurePercent]`.
    pub fn rainfall() -> Self {
        Self::new(
            "rainfall",
            fields::REGION,
            vec![
                NumericField::new(fields::ACTUAL, true),
                NumericField::new(fields::NORMAL, true),
                NumericField::new(fields::DEPARTURE_PERCENT, false),
            ],
        )
    }

    /// All fields that must be present after renaming, key first.
    pub fn required_fields(&self) -> Vec<&str> {
        std::iter::once(self.key.as_str())
            .chain(self.numeric.iter().map(|f| f.name.as_str()))
            .collect()
    }

    pub fn numeric_field(&self, name: &str) -> Option<&NumericField> {
        self.numeric.iter().find(|f| f.name == name)
    }

    /// Position of a numeric field within `numeric`.
    pub fn numeric_index(&self, name: &str) -> Option<usize> {
        self.numeric.iter().position(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.key == name || self.numeric_field(name).is_some()
    }
}

/// Explicit table from raw (trimmed) header names to canonical field names.
///
/// Headers absent from the table keep their trimmed raw name, so an empty
/// map acts as the identity rename.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct RenameMap {
    entries: BTreeMap<String, String>,
}

impl RenameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity() -> Self {
        Self::default()
    }

    /// Raw headers of the mineral production extract.
    pub fn production() -> Self {
        Self::new()
            .with("Name of the Minerals", fields::MINERAL_NAME)
            .with("Production", fields::PRODUCTION)
    }

    /// Raw headers of the rainfall extract.
    pub fn rainfall() -> Self {
        Self::new()
            .with("Region", fields::REGION)
            .with("Rainfall - Actual", fields::ACTUAL)
            .with("Rainfall - Normal", fields::NORMAL)
            .with("Rainfall - % Departure", fields::DEPARTURE_PERCENT)
    }

    pub fn with(mut self, raw: &str, canonical: &str) -> Self {
        self.entries
            .insert(raw.trim().to_string(), canonical.trim().to_string());
        self
    }

    /// Canonical name for a raw header.
    pub fn apply(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        self.entries
            .get(trimmed)
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, String>> for RenameMap {
    fn from(entries: BTreeMap<String, String>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<RenameMap> for BTreeMap<String, String> {
    fn from(map: RenameMap) -> Self {
        map.entries
    }
}

impl<S: Into<String>> FromIterator<(S, S)> for RenameMap {
    fn from_iter<I: IntoIterator<Item = (S, S)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |map, (raw, canonical)| {
                let (raw, canonical): (String, String) = (raw.into(), canonical.into());
                map.with(&raw, &canonical)
            })
    }
}
