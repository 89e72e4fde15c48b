//! Canonical Dataset Module
//! Immutable, schema-validated table produced by the loader.

use super::schema::{DatasetSchema, SCHEMA_VERSION};
use polars::prelude::*;
use std::fmt;

/// A column carried through from the raw source without a canonical meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraColumn {
    pub name: String,
    pub values: Vec<Option<String>>,
}

/// Schema-validated table plus the source identifier used for citations.
///
/// Values are stored column-major: one key vector and one `f64` vector per
/// numeric field of the schema, all of the same length and in insertion
/// order. A polars `DataFrame` with the canonical layout is built once at
/// construction for presentation and persistence.
///
/// There are no mutation methods; share it behind an `Arc` or a reference.
#[derive(Clone)]
pub struct CanonicalDataset {
    source_id: String,
    schema: DatasetSchema,
    schema_version: u32,
    keys: Vec<String>,
    numeric: Vec<Vec<f64>>,
    extras: Vec<ExtraColumn>,
    frame: DataFrame,
}

impl CanonicalDataset {
    /// Assemble a dataset from already-validated columns.
    pub(crate) fn from_columns(
        source_id: &str,
        schema: DatasetSchema,
        keys: Vec<String>,
        numeric: Vec<Vec<f64>>,
        extras: Vec<ExtraColumn>,
    ) -> PolarsResult<Self> {
        debug_assert_eq!(numeric.len(), schema.numeric.len());
        debug_assert!(numeric.iter().all(|col| col.len() == keys.len()));

        let mut columns = Vec::with_capacity(1 + numeric.len() + extras.len());
        columns.push(Column::new(schema.key.as_str().into(), keys.clone()));
        for (field, values) in schema.numeric.iter().zip(&numeric) {
            columns.push(Column::new(field.name.as_str().into(), values.clone()));
        }
        for extra in &extras {
            columns.push(Column::new(extra.name.as_str().into(), extra.values.clone()));
        }
        let frame = DataFrame::new(columns)?;

        Ok(Self {
            source_id: source_id.to_string(),
            schema,
            schema_version: SCHEMA_VERSION,
            keys,
            numeric,
            extras,
            frame,
        })
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Canonical layout as a polars `DataFrame`: key, numeric fields, then extras.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        (0..self.len()).map(move |index| Record {
            dataset: self,
            index,
        })
    }

    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        (index < self.len()).then_some(Record {
            dataset: self,
            index,
        })
    }

    /// Look up a record by its identity key.
    pub fn get(&self, key: &str) -> Option<Record<'_>> {
        self.keys
            .iter()
            .position(|k| k == key)
            .and_then(|index| self.record(index))
    }

    /// Ordered `(record, value)` pairs for a numeric field, or `None` when the
    /// schema has no such numeric field.
    pub fn field_values<'a>(
        &'a self,
        field: &str,
    ) -> Option<impl Iterator<Item = (Record<'a>, f64)> + 'a> {
        let column = &self.numeric[self.schema.numeric_index(field)?];
        Some(column.iter().enumerate().map(move |(index, &value)| {
            (
                Record {
                    dataset: self,
                    index,
                },
                value,
            )
        }))
    }
}

impl PartialEq for CanonicalDataset {
    fn eq(&self, other: &Self) -> bool {
        self.source_id == other.source_id
            && self.schema == other.schema
            && self.schema_version == other.schema_version
            && self.keys == other.keys
            && self.numeric == other.numeric
            && self.extras == other.extras
    }
}

impl fmt::Debug for CanonicalDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanonicalDataset")
            .field("source_id", &self.source_id)
            .field("schema", &self.schema.name)
            .field("schema_version", &self.schema_version)
            .field("rows", &self.len())
            .finish()
    }
}

/// Read-only view of one row of a [`CanonicalDataset`].
#[derive(Clone, Copy)]
pub struct Record<'a> {
    dataset: &'a CanonicalDataset,
    index: usize,
}

impl<'a> Record<'a> {
    /// Position in insertion order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Identity key (`mineralName` or `region`).
    pub fn key(&self) -> &'a str {
        &self.dataset.keys[self.index]
    }

    pub fn value(&self, field: &str) -> Option<f64> {
        let column = self.dataset.schema.numeric_index(field)?;
        Some(self.dataset.numeric[column][self.index])
    }

    /// Text value of a passthrough column.
    pub fn extra(&self, name: &str) -> Option<&'a str> {
        self.dataset
            .extras
            .iter()
            .find(|col| col.name == name)
            .and_then(|col| col.values[self.index].as_deref())
    }

    pub fn source_id(&self) -> &'a str {
        self.dataset.source_id()
    }
}

impl fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("index", &self.index)
            .field("key", &self.key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::fields;

    fn rainfall() -> CanonicalDataset {
        CanonicalDataset::from_columns(
            "rain.csv",
            DatasetSchema::rainfall(),
            vec!["North".into(), "South".into()],
            vec![vec![800.0, 600.0], vec![750.0, 700.0], vec![6.7, -14.3]],
            vec![ExtraColumn {
                name: "S.No".into(),
                values: vec![Some("1".into()), None],
            }],
        )
        .unwrap()
    }

    #[test]
    fn frame_follows_canonical_layout() {
        let ds = rainfall();
        assert_eq!(
            ds.column_names(),
            vec!["region", "actual", "normal", "departurePercent", "S.No"]
        );
        assert_eq!(ds.frame().height(), 2);
        assert_eq!(ds.schema_version(), SCHEMA_VERSION);
    }

    #[test]
    fn field_values_preserve_insertion_order() {
        let ds = rainfall();
        let pairs: Vec<(String, f64)> = ds
            .field_values(fields::DEPARTURE_PERCENT)
            .unwrap()
            .map(|(r, v)| (r.key().to_string(), v))
            .collect();
        assert_eq!(
            pairs,
            vec![("North".to_string(), 6.7), ("South".to_string(), -14.3)]
        );
    }

    #[test]
    fn key_field_is_not_a_numeric_field() {
        let ds = rainfall();
        assert!(ds.field_values(fields::REGION).is_none());
        assert!(ds.field_values("Rainfall - Actual").is_none());
    }

    #[test]
    fn record_lookup_by_key() {
        let ds = rainfall();
        let south = ds.get("South").unwrap();
        assert_eq!(south.index(), 1);
        assert_eq!(south.value(fields::NORMAL), Some(700.0));
        assert_eq!(south.extra("S.No"), None);
        assert_eq!(ds.get("North").unwrap().extra("S.No"), Some("1"));
        assert!(ds.get("East").is_none());
        assert!(ds.record(2).is_none());
    }
}
