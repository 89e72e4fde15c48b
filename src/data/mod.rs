//! Data module - raw source loading and canonical datasets

mod catalog;
mod dataset;
mod loader;
pub mod schema;

pub use catalog::{DatasetCatalog, SharedCatalog, PRODUCTION, RAINFALL};
pub use dataset::{CanonicalDataset, ExtraColumn, Record};
pub use loader::{CoercionFailure, DataLoader, FieldCoercionError, LoaderError, SchemaError};
pub use schema::{DatasetSchema, NumericField, RenameMap, SCHEMA_VERSION};
