//! CSV Data Loader Module
//! Reads raw extracts with Polars and normalizes them into canonical datasets.

use super::dataset::{CanonicalDataset, ExtraColumn};
use super::schema::{DatasetSchema, RenameMap};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Why a single cell could not be coerced to its declared type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercionFailure {
    #[error("value is missing")]
    Missing,
    #[error("not a number")]
    NotNumeric,
    #[error("not a finite number")]
    NonFinite,
    #[error("negative value in a non-negative field")]
    Negative,
}

/// Row-scoped coercion failure. `row` is the zero-based data row index.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("row {row}, field '{field}' ({value:?}): {reason}")]
pub struct FieldCoercionError {
    pub row: usize,
    pub field: String,
    pub value: Option<String>,
    pub reason: CoercionFailure,
}

/// Load failure for a whole dataset. No partial dataset is ever returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("missing required fields after renaming: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("column '{0}' appears more than once after renaming")]
    DuplicateColumn(String),
    #[error("column '{column}' could not be read as text: {reason}")]
    UnreadableColumn { column: String, reason: String },
    #[error("{} cell(s) failed coercion in rows {}", .0.len(), failing_rows(.0))]
    Coercion(Vec<FieldCoercionError>),
    #[error("source has {0} rows but none are valid")]
    NoValidRows(usize),
    #[error("failed to build canonical table: {0}")]
    Build(String),
}

impl SchemaError {
    /// Fields named by this error (missing or malformed).
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::MissingFields(fields) => fields.iter().map(String::as_str).collect(),
            Self::DuplicateColumn(column) | Self::UnreadableColumn { column, .. } => {
                vec![column.as_str()]
            }
            Self::Coercion(errors) => {
                let mut fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                fields.dedup();
                fields
            }
            Self::NoValidRows(_) | Self::Build(_) => Vec::new(),
        }
    }
}

fn failing_rows(errors: &[FieldCoercionError]) -> String {
    let mut rows: Vec<usize> = errors.iter().map(|e| e.row).collect();
    rows.dedup();
    rows.iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Normalizes raw tabular sources into [`CanonicalDataset`]s.
pub struct DataLoader;

impl DataLoader {
    /// Parse comma-separated text with a header row. Every column is read as
    /// text; typing is left to [`DataLoader::load`].
    pub fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame, LoaderError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()?;

        Ok(df)
    }

    pub fn read_csv_path(path: impl AsRef<Path>) -> Result<DataFrame, LoaderError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read_csv_bytes(&bytes)
    }

    /// Read a CSV file and normalize it in one step.
    pub fn load_csv(
        path: impl AsRef<Path>,
        rename: &RenameMap,
        schema: &DatasetSchema,
        source_id: &str,
    ) -> Result<CanonicalDataset, LoaderError> {
        let raw = Self::read_csv_path(path)?;
        Ok(Self::load(&raw, rename, schema, source_id)?)
    }

    /// Normalize a raw table: trim and rename headers, check the schema's
    /// required fields, coerce every row.
    ///
    /// Any coercion failure rejects the whole load; all failures are reported.
    /// Duplicate identity keys keep the first occurrence.
    pub fn load(
        raw: &DataFrame,
        rename: &RenameMap,
        schema: &DatasetSchema,
        source_id: &str,
    ) -> Result<CanonicalDataset, SchemaError> {
        let renamed: Vec<String> = raw
            .get_column_names()
            .iter()
            .map(|name| rename.apply(name.as_str()))
            .collect();

        let mut seen = HashSet::new();
        if let Some(dup) = renamed.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(SchemaError::DuplicateColumn(dup.clone()));
        }

        let missing: Vec<String> = schema
            .required_fields()
            .into_iter()
            .filter(|field| !seen.contains(field))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingFields(missing));
        }

        let mut cells: HashMap<&str, Vec<Option<String>>> = HashMap::new();
        let mut extra_order = Vec::new();
        for (column, name) in raw.get_columns().iter().zip(&renamed) {
            let values = text_cells(column).map_err(|e| SchemaError::UnreadableColumn {
                column: name.clone(),
                reason: e.to_string(),
            })?;
            if !schema.has_field(name) {
                extra_order.push(name.as_str());
            }
            cells.insert(name.as_str(), values);
        }

        let height = raw.height();
        let key_cells = &cells[schema.key.as_str()];
        let numeric_cells: Vec<&Vec<Option<String>>> = schema
            .numeric
            .iter()
            .map(|field| &cells[field.name.as_str()])
            .collect();

        let mut errors = Vec::new();
        let mut kept_rows = Vec::with_capacity(height);
        let mut keys = Vec::with_capacity(height);
        let mut numeric: Vec<Vec<f64>> = vec![Vec::with_capacity(height); schema.numeric.len()];
        let mut seen_keys = HashSet::new();
        let mut duplicates = 0usize;

        for row in 0..height {
            let mut row_ok = true;

            let key = match coerce_key(key_cells[row].as_deref()) {
                Ok(key) => Some(key),
                Err(reason) => {
                    errors.push(FieldCoercionError {
                        row,
                        field: schema.key.clone(),
                        value: key_cells[row].clone(),
                        reason,
                    });
                    row_ok = false;
                    None
                }
            };

            let mut values = Vec::with_capacity(schema.numeric.len());
            for (field, column) in schema.numeric.iter().zip(&numeric_cells) {
                match coerce_number(column[row].as_deref(), field.non_negative) {
                    Ok(value) => values.push(value),
                    Err(reason) => {
                        errors.push(FieldCoercionError {
                            row,
                            field: field.name.clone(),
                            value: column[row].clone(),
                            reason,
                        });
                        row_ok = false;
                    }
                }
            }

            let Some(key) = key.filter(|_| row_ok) else {
                continue;
            };
            if !seen_keys.insert(key.clone()) {
                debug!(source = source_id, row, key = %key, "duplicate key, keeping first occurrence");
                duplicates += 1;
                continue;
            }

            keys.push(key);
            for (column, value) in numeric.iter_mut().zip(values) {
                column.push(value);
            }
            kept_rows.push(row);
        }

        if !errors.is_empty() {
            return Err(SchemaError::Coercion(errors));
        }
        if height > 0 && keys.is_empty() {
            return Err(SchemaError::NoValidRows(height));
        }

        let extras = extra_order
            .into_iter()
            .map(|name| ExtraColumn {
                name: name.to_string(),
                values: kept_rows.iter().map(|&row| cells[name][row].clone()).collect(),
            })
            .collect();

        let dataset =
            CanonicalDataset::from_columns(source_id, schema.clone(), keys, numeric, extras)
                .map_err(|e| SchemaError::Build(e.to_string()))?;

        info!(
            source = source_id,
            schema = %schema.name,
            rows = height,
            kept = dataset.len(),
            duplicates,
            "dataset normalized"
        );
        Ok(dataset)
    }
}

/// Every cell of a column rendered as text, nulls preserved.
fn text_cells(column: &Column) -> PolarsResult<Vec<Option<String>>> {
    let text = column.cast(&DataType::String)?;
    let ca = text.str()?;
    Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
}

fn coerce_key(cell: Option<&str>) -> Result<String, CoercionFailure> {
    match cell.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(CoercionFailure::Missing),
    }
}

/// Parse a numeric cell. Surrounding quotes and thousands separators are
/// stripped before parsing.
fn coerce_number(cell: Option<&str>, non_negative: bool) -> Result<f64, CoercionFailure> {
    let text = cell
        .map(|c| c.trim().trim_matches('"').trim())
        .filter(|c| !c.is_empty())
        .ok_or(CoercionFailure::Missing)?;

    let value: f64 = text
        .replace(',', "")
        .parse()
        .map_err(|_| CoercionFailure::NotNumeric)?;

    if !value.is_finite() {
        return Err(CoercionFailure::NonFinite);
    }
    if non_negative && value < 0.0 {
        return Err(CoercionFailure::Negative);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::fields;

    const PRODUCTION_CSV: &str = "S.No,Name of the Minerals,Production\n\
                                  1,Coal,100\n\
                                  2,Iron,250\n\
                                  3,Copper,90\n";

    fn production(csv: &str) -> Result<CanonicalDataset, SchemaError> {
        let raw = DataLoader::read_csv_bytes(csv.as_bytes()).unwrap();
        DataLoader::load(
            &raw,
            &RenameMap::production(),
            &DatasetSchema::production(),
            "production.csv",
        )
    }

    #[test]
    fn coerce_number_rules() {
        assert_eq!(coerce_number(Some(" 1,234.5 "), true), Ok(1234.5));
        assert_eq!(coerce_number(Some("-14.3"), false), Ok(-14.3));
        assert_eq!(coerce_number(Some("-1"), true), Err(CoercionFailure::Negative));
        assert_eq!(coerce_number(Some("  "), true), Err(CoercionFailure::Missing));
        assert_eq!(coerce_number(None, false), Err(CoercionFailure::Missing));
        assert_eq!(coerce_number(Some("n/a"), false), Err(CoercionFailure::NotNumeric));
        assert_eq!(coerce_number(Some("inf"), false), Err(CoercionFailure::NonFinite));
    }

    #[test]
    fn loads_production_extract() {
        let ds = production(PRODUCTION_CSV).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.source_id(), "production.csv");
        assert_eq!(
            ds.column_names(),
            vec!["mineralName", "production", "S.No"]
        );
        let iron = ds.get("Iron").unwrap();
        assert_eq!(iron.value(fields::PRODUCTION), Some(250.0));
        assert_eq!(iron.extra("S.No"), Some("2"));
    }

    #[test]
    fn headers_are_trimmed_before_renaming() {
        let csv = " Name of the Minerals ,  Production\nCoal,100\n";
        let ds = production(csv).unwrap();
        assert_eq!(ds.column_names(), vec!["mineralName", "production"]);
    }

    #[test]
    fn bom_is_tolerated() {
        let csv = format!("\u{feff}{PRODUCTION_CSV}");
        assert_eq!(production(&csv).unwrap().len(), 3);
    }

    #[test]
    fn missing_required_column_is_schema_error() {
        let err = production("S.No,Name of the Minerals\n1,Coal\n").unwrap_err();
        assert_eq!(err, SchemaError::MissingFields(vec!["production".into()]));
        assert_eq!(err.fields(), vec!["production"]);
    }

    #[test]
    fn two_headers_renamed_to_the_same_field_are_rejected() {
        let err = production("Name of the Minerals,mineralName,Production\nCoal,Coal,1\n")
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateColumn("mineralName".into()));
    }

    #[test]
    fn any_bad_cell_rejects_whole_load_and_reports_every_row() {
        let csv = "Name of the Minerals,Production\n\
                   Coal,100\n\
                   Iron,lots\n\
                   ,90\n\
                   Zinc,-5\n";
        let SchemaError::Coercion(errors) = production(csv).unwrap_err() else {
            panic!("expected coercion error");
        };
        let summary: Vec<(usize, &str, CoercionFailure)> = errors
            .iter()
            .map(|e| (e.row, e.field.as_str(), e.reason.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, "production", CoercionFailure::NotNumeric),
                (2, "mineralName", CoercionFailure::Missing),
                (3, "production", CoercionFailure::Negative),
            ]
        );
        assert_eq!(errors[0].value.as_deref(), Some("lots"));
    }

    #[test]
    fn duplicate_keys_keep_first_occurrence() {
        let csv = "S.No,Name of the Minerals,Production\n\
                   1,Coal,100\n\
                   2,Coal,999\n\
                   3,Iron,5\n";
        let ds = production(csv).unwrap();
        assert_eq!(ds.len(), 2);
        let coal = ds.get("Coal").unwrap();
        assert_eq!(coal.value(fields::PRODUCTION), Some(100.0));
        assert_eq!(coal.extra("S.No"), Some("1"));
        assert_eq!(ds.get("Iron").unwrap().extra("S.No"), Some("3"));
    }

    #[test]
    fn header_only_source_loads_empty() {
        let ds = production("Name of the Minerals,Production\n").unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn typed_raw_columns_are_coerced() {
        let raw = df!(
            "Region" => ["North", "South"],
            "Rainfall - Actual" => [800i64, 600],
            "Rainfall - Normal" => [750.0, 700.0],
            "Rainfall - % Departure" => [6.7, -14.3]
        )
        .unwrap();
        let ds = DataLoader::load(
            &raw,
            &RenameMap::rainfall(),
            &DatasetSchema::rainfall(),
            "rain.csv",
        )
        .unwrap();
        assert_eq!(ds.get("South").unwrap().value(fields::ACTUAL), Some(600.0));
        assert_eq!(
            ds.get("South").unwrap().value(fields::DEPARTURE_PERCENT),
            Some(-14.3)
        );
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let err = DataLoader::read_csv_path("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, LoaderError::Io { .. }));
    }
}
