//! Application Shell
//! Loads the configured extracts, persists normalized artifacts and answers questions.

use crate::config::{AppConfig, SourceConfig};
use crate::data::{
    CanonicalDataset, DataLoader, DatasetCatalog, DatasetSchema, LoaderError, RenameMap,
    PRODUCTION, RAINFALL,
};
use crate::query::{QueryExecutionError, QueryResolver, Response};
use crate::stats::{insights, Insight};
use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Outcome of loading one configured source.
#[derive(Debug)]
pub struct LoadReport {
    pub name: &'static str,
    pub result: Result<CanonicalDataset, LoaderError>,
}

fn load_source(
    name: &'static str,
    source: &SourceConfig,
    schema: DatasetSchema,
    default_rename: fn() -> RenameMap,
) -> LoadReport {
    let rename = source.rename_or(default_rename);
    let source_id = source.source_id();
    info!(dataset = name, path = %source.path.display(), "loading source");

    let result = DataLoader::load_csv(&source.path, &rename, &schema, &source_id);
    if let Err(e) = &result {
        error!(dataset = name, path = %source.path.display(), error = %e, "failed to load dataset");
    }
    LoadReport { name, result }
}

/// Load both extracts in parallel. Each load succeeds or fails on its own.
pub fn load_sources(config: &AppConfig) -> [LoadReport; 2] {
    let (production, rainfall) = rayon::join(
        || {
            load_source(
                PRODUCTION,
                &config.production,
                DatasetSchema::production(),
                RenameMap::production,
            )
        },
        || {
            load_source(
                RAINFALL,
                &config.rainfall,
                DatasetSchema::rainfall(),
                RenameMap::rainfall,
            )
        },
    );
    [production, rainfall]
}

/// Catalog of every dataset that loaded. Failed loads are left out, so no
/// question can be answered from them.
pub fn build_catalog(reports: [LoadReport; 2]) -> DatasetCatalog {
    let mut catalog = DatasetCatalog::new();
    for report in reports {
        if let Ok(dataset) = report.result {
            catalog.insert(report.name, dataset);
        }
    }
    catalog
}

/// Write each dataset as `<dir>/<name>_clean.csv`.
pub fn persist_catalog(catalog: &DatasetCatalog, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    catalog
        .iter()
        .map(|(name, dataset)| -> Result<PathBuf> {
            let path = dir.join(format!("{name}_clean.csv"));
            write_csv(dataset, &path)?;
            info!(dataset = name, path = %path.display(), rows = dataset.len(), "artifact written");
            Ok(path)
        })
        .collect()
}

fn write_csv(dataset: &CanonicalDataset, path: &Path) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut frame = dataset.frame().clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut frame)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Loaded catalog plus the resolver used to query it.
pub struct Session {
    catalog: DatasetCatalog,
    resolver: QueryResolver,
}

impl Session {
    pub fn new(catalog: DatasetCatalog, resolver: QueryResolver) -> Self {
        Self { catalog, resolver }
    }

    /// Load, and persist when `output_dir` is set, the configured sources.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let catalog = build_catalog(load_sources(config));
        if let Some(dir) = &config.output_dir {
            persist_catalog(&catalog, dir)?;
        }
        Ok(Self::new(catalog, QueryResolver::new()))
    }

    pub fn catalog(&self) -> &DatasetCatalog {
        &self.catalog
    }

    pub fn ask(&self, question: &str) -> Result<Response, QueryExecutionError> {
        self.resolver.resolve(question, &self.catalog)
    }

    pub fn insights(&self) -> Vec<Insight> {
        insights(&self.catalog)
    }
}
