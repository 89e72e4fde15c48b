//! Aggregator Module
//! Extremal and summary values over a canonical dataset's numeric fields.

use crate::data::{CanonicalDataset, Record};
use serde::Serialize;
use statrs::statistics::Statistics;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    #[error("dataset '{source_id}' has no records")]
    EmptyDataset { source_id: String },
    #[error("field '{field}' is not a numeric field of dataset '{source_id}'")]
    FieldNotFound { field: String, source_id: String },
}

/// Which end of the ordering an extremum picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Max,
    Min,
}

impl Direction {
    /// True when `candidate` strictly beats `best`. Strictness keeps the
    /// earlier record on ties.
    fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            Direction::Max => candidate > best,
            Direction::Min => candidate < best,
        }
    }
}

/// Summary statistics for one numeric field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub field: String,
    pub count: usize,
    pub total: f64,
    pub mean: f64,
    /// Sample standard deviation; `NaN` for a single record.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Pure aggregation functions; never mutate the dataset.
pub struct Aggregator;

impl Aggregator {
    /// Record holding the max/min value of `field`, first in insertion order on ties.
    ///
    /// Single pass, constant extra space.
    pub fn extremum<'a>(
        dataset: &'a CanonicalDataset,
        field: &str,
        direction: Direction,
    ) -> Result<Record<'a>, AggregateError> {
        let mut values = Self::values(dataset, field)?;

        let (mut best, mut best_value) =
            values.next().ok_or_else(|| AggregateError::EmptyDataset {
                source_id: dataset.source_id().to_string(),
            })?;

        for (record, value) in values {
            if direction.improves(value, best_value) {
                best = record;
                best_value = value;
            }
        }

        Ok(best)
    }

    pub fn summary(dataset: &CanonicalDataset, field: &str) -> Result<FieldSummary, AggregateError> {
        let values: Vec<f64> = Self::values(dataset, field)?.map(|(_, v)| v).collect();
        if values.is_empty() {
            return Err(AggregateError::EmptyDataset {
                source_id: dataset.source_id().to_string(),
            });
        }

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        Ok(FieldSummary {
            field: field.to_string(),
            count: values.len(),
            total: values.iter().sum(),
            mean: values.iter().mean(),
            std_dev: values.iter().std_dev(),
            min,
            max,
        })
    }

    fn values<'a>(
        dataset: &'a CanonicalDataset,
        field: &str,
    ) -> Result<impl Iterator<Item = (Record<'a>, f64)> + 'a, AggregateError> {
        dataset
            .field_values(field)
            .ok_or_else(|| AggregateError::FieldNotFound {
                field: field.to_string(),
                source_id: dataset.source_id().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::fields;
    use crate::data::{DataLoader, DatasetSchema, RenameMap};

    fn production(rows: &[(&str, f64)]) -> CanonicalDataset {
        let mut csv = String::from("Name of the Minerals,Production\n");
        for (name, value) in rows {
            csv.push_str(&format!("{name},{value}\n"));
        }
        let raw = DataLoader::read_csv_bytes(csv.as_bytes()).unwrap();
        DataLoader::load(
            &raw,
            &RenameMap::production(),
            &DatasetSchema::production(),
            "prod.csv",
        )
        .unwrap()
    }

    #[test]
    fn max_and_min() {
        let ds = production(&[("Coal", 100.0), ("Iron", 250.0), ("Copper", 90.0)]);
        let max = Aggregator::extremum(&ds, fields::PRODUCTION, Direction::Max).unwrap();
        let min = Aggregator::extremum(&ds, fields::PRODUCTION, Direction::Min).unwrap();
        assert_eq!(max.key(), "Iron");
        assert_eq!(min.key(), "Copper");
    }

    #[test]
    fn extremum_dominates_every_other_record() {
        let ds = production(&[
            ("A", 3.5),
            ("B", 0.0),
            ("C", 17.25),
            ("D", 17.0),
            ("E", 2.0),
        ]);
        let max = Aggregator::extremum(&ds, fields::PRODUCTION, Direction::Max).unwrap();
        let min = Aggregator::extremum(&ds, fields::PRODUCTION, Direction::Min).unwrap();
        let max_value = max.value(fields::PRODUCTION).unwrap();
        let min_value = min.value(fields::PRODUCTION).unwrap();
        for (_, v) in ds.field_values(fields::PRODUCTION).unwrap() {
            assert!(max_value >= v);
            assert!(min_value <= v);
        }
    }

    #[test]
    fn ties_resolve_to_first_inserted() {
        let ds = production(&[("Zinc", 7.0), ("Lead", 7.0), ("Tin", 7.0)]);
        for direction in [Direction::Max, Direction::Min] {
            let r = Aggregator::extremum(&ds, fields::PRODUCTION, direction).unwrap();
            assert_eq!(r.key(), "Zinc");
            assert_eq!(r.index(), 0);
        }

        let ds = production(&[("Zinc", 1.0), ("Lead", 9.0), ("Tin", 9.0)]);
        let r = Aggregator::extremum(&ds, fields::PRODUCTION, Direction::Max).unwrap();
        assert_eq!(r.key(), "Lead");
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let ds = production(&[]);
        let err = Aggregator::extremum(&ds, fields::PRODUCTION, Direction::Max).unwrap_err();
        assert_eq!(
            err,
            AggregateError::EmptyDataset {
                source_id: "prod.csv".into()
            }
        );
        assert!(matches!(
            Aggregator::summary(&ds, fields::PRODUCTION),
            Err(AggregateError::EmptyDataset { .. })
        ));
    }

    #[test]
    fn unknown_field_is_an_error() {
        let ds = production(&[("Coal", 1.0)]);
        let err = Aggregator::extremum(&ds, fields::ACTUAL, Direction::Min).unwrap_err();
        assert!(matches!(err, AggregateError::FieldNotFound { ref field, .. } if field == "actual"));
        assert!(Aggregator::extremum(&ds, fields::MINERAL_NAME, Direction::Max).is_err());
    }

    #[test]
    fn summary_values() {
        let ds = production(&[("Coal", 100.0), ("Iron", 250.0), ("Copper", 90.0)]);
        let s = Aggregator::summary(&ds, fields::PRODUCTION).unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.total, 440.0);
        assert!((s.mean - 440.0 / 3.0).abs() < 1e-9);
        assert_eq!((s.min, s.max), (90.0, 250.0));
        assert!(s.std_dev > 0.0);

        let single = production(&[("Coal", 5.0)]);
        assert!(Aggregator::summary(&single, fields::PRODUCTION)
            .unwrap()
            .std_dev
            .is_nan());
    }
}
