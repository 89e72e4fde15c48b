//! # samarth
//!
//! Normalizes government open-data extracts (mineral production, regional
//! rainfall) into canonical tables and answers keyword questions against
//! them with cited responses.
//!
//! - [`data`] — raw CSV loading, canonical schemas and datasets, the catalog
//! - [`stats`] — extremum and summary aggregation, quick insights
//! - [`query`] — ordered rule table, resolver, responses
//! - [`config`] — JSON configuration
//! - [`app`] — the shell: parallel loading, artifact persistence, sessions
//!
//! ```no_run
//! use samarth::data::{DataLoader, DatasetCatalog, DatasetSchema, RenameMap, PRODUCTION};
//! use samarth::query::QueryResolver;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = DataLoader::read_csv_bytes(b"Name of the Minerals,Production\nCoal,100\nIron,250\n")?;
//! let production = DataLoader::load(
//!     &raw,
//!     &RenameMap::production(),
//!     &DatasetSchema::production(),
//!     "production.csv",
//! )?;
//! let catalog = DatasetCatalog::new().with(PRODUCTION, production);
//!
//! let answer = QueryResolver::new().resolve("Which mineral has the highest production?", &catalog)?;
//! assert!(answer.text.contains("Iron"));
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod query;
pub mod stats;
