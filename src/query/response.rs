//! Response value returned for every question.

use serde::{Deserialize, Serialize};

/// Answer text plus the identifier of the dataset it was drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Response {
    pub fn cited(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: Some(source.into()),
        }
    }

    pub fn uncited(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }
}
