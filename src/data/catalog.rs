//! Dataset Catalog Module
//! Named collection of canonical datasets shared with the query resolver.

use super::dataset::CanonicalDataset;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Catalog name of the mineral production dataset.
pub const PRODUCTION: &str = "production";
/// Catalog name of the rainfall dataset.
pub const RAINFALL: &str = "rainfall";

/// Datasets available to the resolver, by name.
///
/// A dataset whose load failed is simply absent; rules that need it report
/// it as unavailable.
#[derive(Debug, Clone, Default)]
pub struct DatasetCatalog {
    datasets: BTreeMap<String, Arc<CanonicalDataset>>,
}

impl DatasetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, dataset: CanonicalDataset) -> Self {
        self.insert(name, dataset);
        self
    }

    /// Register a dataset, returning the one it replaced.
    pub fn insert(
        &mut self,
        name: &str,
        dataset: impl Into<Arc<CanonicalDataset>>,
    ) -> Option<Arc<CanonicalDataset>> {
        self.datasets.insert(name.to_string(), dataset.into())
    }

    pub fn get(&self, name: &str) -> Option<&CanonicalDataset> {
        self.datasets.get(name).map(Arc::as_ref)
    }

    pub fn get_shared(&self, name: &str) -> Option<Arc<CanonicalDataset>> {
        self.datasets.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CanonicalDataset)> {
        self.datasets
            .iter()
            .map(|(name, ds)| (name.as_str(), ds.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

/// Build-once, read-many holder for a catalog in a concurrent host.
#[derive(Debug, Default)]
pub struct SharedCatalog {
    cell: OnceLock<DatasetCatalog>,
}

impl SharedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `init` exactly once across all callers; later calls get the same catalog.
    pub fn get_or_init(&self, init: impl FnOnce() -> DatasetCatalog) -> &DatasetCatalog {
        self.cell.get_or_init(init)
    }

    pub fn get(&self) -> Option<&DatasetCatalog> {
        self.cell.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataLoader, DatasetSchema, RenameMap};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn production() -> CanonicalDataset {
        let raw =
            DataLoader::read_csv_bytes(b"Name of the Minerals,Production\nCoal,100\n").unwrap();
        DataLoader::load(
            &raw,
            &RenameMap::production(),
            &DatasetSchema::production(),
            "prod.csv",
        )
        .unwrap()
    }

    #[test]
    fn lookup_by_name() {
        let catalog = DatasetCatalog::new().with(PRODUCTION, production());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(PRODUCTION).unwrap().source_id(), "prod.csv");
        assert!(catalog.get(RAINFALL).is_none());
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec![PRODUCTION]);
    }

    #[test]
    fn shared_catalog_initializes_once_across_threads() {
        let shared = SharedCatalog::new();
        let calls = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let catalog = shared.get_or_init(|| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        DatasetCatalog::new().with(PRODUCTION, production())
                    });
                    assert_eq!(catalog.len(), 1);
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(shared.get().is_some());
    }
}
