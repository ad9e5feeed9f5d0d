//! Inbound request.

use crate::agents::CustomerId;
use serde::{Deserialize, Serialize};

/// Context supplied alongside the text, used when the text itself lacks it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
}

/// A single natural-language request. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    text: String,
    #[serde(default)]
    hints: RequestHints,
}

impl Request {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hints: RequestHints::default(),
        }
    }

    pub fn with_customer_id(mut self, customer_id: CustomerId) -> Self {
        self.hints.customer_id = Some(customer_id);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn hints(&self) -> &RequestHints {
        &self.hints
    }
}

impl From<&str> for Request {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
