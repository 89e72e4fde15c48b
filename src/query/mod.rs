//! Query module - keyword rule table and cited responses

mod resolver;
mod response;
pub mod rules;

pub use resolver::{QueryExecutionError, QueryResolver, FALLBACK_TEXT};
pub use response::Response;
pub use rules::{QueryFailure, Rule};
