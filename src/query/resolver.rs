//! Query Resolver Module
//! Dispatches a free-text question through the ordered rule table.

use super::response::Response;
use super::rules::{builtin_rules, QueryFailure, Rule};
use crate::data::DatasetCatalog;
use thiserror::Error;
use tracing::{debug, warn};

/// Text of the answer given when no rule matches.
pub const FALLBACK_TEXT: &str =
    "Sorry, I couldn't understand that query yet. Try asking about rainfall or production.";

/// A matched rule's handler failed.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("rule '{rule}' failed: {cause}")]
pub struct QueryExecutionError {
    pub rule: String,
    #[source]
    pub cause: QueryFailure,
}

/// Ordered `(predicate, handler)` table with a terminal fallback.
///
/// The first rule whose predicate matches wins. The fallback is kept outside
/// the rule list, so rules appended later are still reachable and every
/// question gets a response.
pub struct QueryResolver {
    rules: Vec<Rule>,
    fallback: String,
}

impl Default for QueryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryResolver {
    /// Resolver with the built-in rule table.
    pub fn new() -> Self {
        Self {
            rules: builtin_rules(),
            fallback: FALLBACK_TEXT.to_string(),
        }
    }

    /// Resolver with no rules; everything falls through to the fallback.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            fallback: FALLBACK_TEXT.to_string(),
        }
    }

    /// Append a rule after the existing ones.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.push_rule(rule);
        self
    }

    pub fn push_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Insert a rule at `index`, ahead of everything currently at or after it.
    pub fn insert_rule(&mut self, index: usize, rule: Rule) {
        let index = index.min(self.rules.len());
        self.rules.insert(index, rule);
    }

    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(Rule::name).collect()
    }

    /// Lowercase and trim; no further tokenization.
    pub fn normalize(question: &str) -> String {
        question.trim().to_lowercase()
    }

    /// First rule matching the question, if any.
    pub fn matching_rule(&self, question: &str) -> Option<&Rule> {
        let normalized = Self::normalize(question);
        self.rules.iter().find(|rule| rule.matches(&normalized))
    }

    /// Answer a question against the catalog.
    ///
    /// Unmatched questions get the fallback response; only a failing handler
    /// produces an error.
    pub fn resolve(
        &self,
        question: &str,
        catalog: &DatasetCatalog,
    ) -> Result<Response, QueryExecutionError> {
        let Some(rule) = self.matching_rule(question) else {
            debug!(question, "no rule matched, using fallback");
            return Ok(Response::uncited(self.fallback.clone()));
        };

        debug!(question, rule = rule.name(), "rule matched");
        rule.run(catalog).map_err(|cause| {
            warn!(rule = rule.name(), error = %cause, "rule handler failed");
            QueryExecutionError {
                rule: rule.name().to_string(),
                cause,
            }
        })
    }
}
