//! Quick Insights
//! Headline figures shown next to the datasets.

use super::aggregator::{Aggregator, Direction};
use crate::data::schema::fields;
use crate::data::{DatasetCatalog, PRODUCTION, RAINFALL};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub label: String,
    pub key: String,
    pub value: f64,
    pub unit: &'static str,
    pub source: String,
}

/// Top production mineral and region with the highest rainfall departure.
/// Missing or empty datasets contribute nothing.
pub fn insights(catalog: &DatasetCatalog) -> Vec<Insight> {
    let wanted = [
        (PRODUCTION, fields::PRODUCTION, "Top Production Mineral", "units"),
        (RAINFALL, fields::DEPARTURE_PERCENT, "Highest Rainfall Departure", "%"),
    ];

    wanted
        .into_iter()
        .filter_map(|(name, field, label, unit)| {
            let dataset = catalog.get(name)?;
            let record = Aggregator::extremum(dataset, field, Direction::Max).ok()?;
            Some(Insight {
                label: label.to_string(),
                key: record.key().to_string(),
                value: record.value(field)?,
                unit,
                source: dataset.source_id().to_string(),
            })
        })
        .collect()
}
