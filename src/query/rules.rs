//! Rule Table Module
//! Keyword predicates and the handlers they dispatch to.

use super::response::Response;
use crate::data::schema::fields;
use crate::data::{CanonicalDataset, DatasetCatalog, Record, PRODUCTION, RAINFALL};
use crate::stats::{AggregateError, Aggregator, Direction};
use thiserror::Error;

/// Why a matched rule's handler could not produce an answer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryFailure {
    #[error("dataset '{0}' is not loaded")]
    DatasetUnavailable(String),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

pub type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync>;
pub type Handler = Box<dyn Fn(&DatasetCatalog) -> Result<Response, QueryFailure> + Send + Sync>;

/// One `(predicate, handler)` entry of the resolver's table.
///
/// Predicates receive the question already lowercased and trimmed.
pub struct Rule {
    name: String,
    predicate: Predicate,
    handler: Handler,
}

impl Rule {
    pub fn new(
        name: &str,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
        handler: impl Fn(&DatasetCatalog) -> Result<Response, QueryFailure> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            predicate: Box::new(predicate),
            handler: Box::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, question: &str) -> bool {
        (self.predicate)(question)
    }

    pub fn run(&self, catalog: &DatasetCatalog) -> Result<Response, QueryFailure> {
        (self.handler)(catalog)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Substring test.
pub fn contains(needle: &'static str) -> impl Fn(&str) -> bool + Send + Sync {
    move |q| q.contains(needle)
}

/// Every needle must appear somewhere in the question.
pub fn contains_all(needles: &'static [&'static str]) -> impl Fn(&str) -> bool + Send + Sync {
    move |q| needles.iter().all(|n| q.contains(n))
}

fn dataset<'a>(catalog: &'a DatasetCatalog, name: &str) -> Result<&'a CanonicalDataset, QueryFailure> {
    catalog
        .get(name)
        .ok_or_else(|| QueryFailure::DatasetUnavailable(name.to_string()))
}

/// Handler answering with the extremal record of `field`, cited to its dataset.
fn extremum_rule(
    name: &'static str,
    trigger: &'static str,
    dataset_name: &'static str,
    field: &'static str,
    direction: Direction,
    describe: fn(Record<'_>, f64) -> String,
) -> Rule {
    Rule::new(name, contains(trigger), move |catalog| {
        let ds = dataset(catalog, dataset_name)?;
        let record = Aggregator::extremum(ds, field, direction)?;
        let value = record
            .value(field)
            .ok_or_else(|| AggregateError::FieldNotFound {
                field: field.to_string(),
                source_id: ds.source_id().to_string(),
            })?;
        Ok(Response::cited(describe(record, value), ds.source_id()))
    })
}

/// The built-in table, in precedence order.
///
/// The two-word extremum rules come before the broader `compare` rule, so
/// "compare ... highest rainfall" is answered as an extremum.
pub fn builtin_rules() -> Vec<Rule> {
    vec![
        extremum_rule(
            "highest-rainfall",
            "highest rainfall",
            RAINFALL,
            fields::ACTUAL,
            Direction::Max,
            |r, v| format!("The region with the highest rainfall is {} with {} mm.", r.key(), v),
        ),
        extremum_rule(
            "lowest-rainfall",
            "lowest rainfall",
            RAINFALL,
            fields::ACTUAL,
            Direction::Min,
            |r, v| format!("The region with the lowest rainfall is {} with {} mm.", r.key(), v),
        ),
        extremum_rule(
            "highest-production",
            "highest production",
            PRODUCTION,
            fields::PRODUCTION,
            Direction::Max,
            |r, v| {
                format!(
                    "The mineral with the highest production is {} with {} units.",
                    r.key(),
                    v
                )
            },
        ),
        extremum_rule(
            "lowest-production",
            "lowest production",
            PRODUCTION,
            fields::PRODUCTION,
            Direction::Min,
            |r, v| {
                format!(
                    "The mineral with the lowest production is {} with {} units.",
                    r.key(),
                    v
                )
            },
        ),
        Rule::new(
            "compare-rainfall",
            contains_all(&["compare", "rainfall"]),
            |catalog| {
                let ds = dataset(catalog, RAINFALL)?;
                Ok(Response::cited(
                    "Comparing rainfall across regions: refer to the actual vs normal \
                     rainfall chart for the per-region breakdown.",
                    ds.source_id(),
                ))
            },
        ),
        extremum_rule(
            "highest-departure",
            "highest departure",
            RAINFALL,
            fields::DEPARTURE_PERCENT,
            Direction::Max,
            |r, v| {
                format!(
                    "The region with the highest rainfall departure is {} with {}%.",
                    r.key(),
                    v
                )
            },
        ),
        extremum_rule(
            "lowest-departure",
            "lowest departure",
            RAINFALL,
            fields::DEPARTURE_PERCENT,
            Direction::Min,
            |r, v| {
                format!(
                    "The region with the lowest rainfall departure is {} with {}%.",
                    r.key(),
                    v
                )
            },
        ),
        Rule::new("average-rainfall", contains("average rainfall"), |catalog| {
            let ds = dataset(catalog, RAINFALL)?;
            let summary = Aggregator::summary(ds, fields::ACTUAL)?;
            Ok(Response::cited(
                format!(
                    "The average rainfall is {:.1} mm across {} regions.",
                    summary.mean, summary.count
                ),
                ds.source_id(),
            ))
        }),
        Rule::new("total-production", contains("total production"), |catalog| {
            let ds = dataset(catalog, PRODUCTION)?;
            let summary = Aggregator::summary(ds, fields::PRODUCTION)?;
            Ok(Response::cited(
                format!(
                    "The total production is {} units across {} minerals.",
                    summary.total, summary.count
                ),
                ds.source_id(),
            ))
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str) -> Rule {
        builtin_rules()
            .into_iter()
            .find(|r| r.name() == name)
            .unwrap()
    }

    #[test]
    fn predicates_are_plain_substring_tests() {
        assert!(rule("highest-rainfall").matches("which region had the highest rainfall?"));
        assert!(!rule("highest-rainfall").matches("highest  rainfall"));
        assert!(rule("compare-rainfall").matches("rainfall: please compare"));
        assert!(!rule("compare-rainfall").matches("compare production"));
    }

    #[test]
    fn handler_reports_missing_dataset() {
        let err = rule("lowest-production")
            .run(&DatasetCatalog::new())
            .unwrap_err();
        assert_eq!(err, QueryFailure::DatasetUnavailable(PRODUCTION.into()));
    }

    #[test]
    fn builtin_order_is_fixed() {
        let names: Vec<String> = builtin_rules()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "highest-rainfall",
                "lowest-rainfall",
                "highest-production",
                "lowest-production",
                "compare-rainfall",
                "highest-departure",
                "lowest-departure",
                "average-rainfall",
                "total-production",
            ]
        );
    }
}
