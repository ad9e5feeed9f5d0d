//! Customer Data Agent.
//!
//! The only component that talks to the tool server. Each operation
//! validates its arguments, issues exactly one tool call and normalizes the
//! reply into a [`Record`]. Nothing is cached between calls.

use super::error::{DataError, Result};
use crate::protocol::types::error_codes;
use crate::protocol::{ToolError, ToolTransport, tools};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::sync::Arc;

pub type CustomerId = u64;

/// Normalized tool result: a JSON object.
pub type Record = Map<String, Value>;

/// Page size when a caller doesn't ask for one.
pub const DEFAULT_LIST_LIMIT: u32 = 10;

/// Fields `update_customer` accepts.
pub const UPDATABLE_FIELDS: &[&str] = &["name", "email", "phone", "status"];

/// Ticket priority. Ordered so the most severe compares greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One data operation, ready to be sent as a tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum DataRequest {
    GetCustomer {
        customer_id: CustomerId,
    },
    ListCustomers {
        status: Option<String>,
        limit: u32,
    },
    UpdateCustomer {
        customer_id: CustomerId,
        fields: Record,
    },
    CreateTicket {
        customer_id: CustomerId,
        issue: String,
        priority: Priority,
    },
    GetCustomerHistory {
        customer_id: CustomerId,
    },
}

impl DataRequest {
    pub fn tool(&self) -> &'static str {
        match self {
            Self::GetCustomer { .. } => tools::GET_CUSTOMER,
            Self::ListCustomers { .. } => tools::LIST_CUSTOMERS,
            Self::UpdateCustomer { .. } => tools::UPDATE_CUSTOMER,
            Self::CreateTicket { .. } => tools::CREATE_TICKET,
            Self::GetCustomerHistory { .. } => tools::GET_CUSTOMER_HISTORY,
        }
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        match self {
            Self::GetCustomer { customer_id }
            | Self::UpdateCustomer { customer_id, .. }
            | Self::CreateTicket { customer_id, .. }
            | Self::GetCustomerHistory { customer_id } => Some(*customer_id),
            Self::ListCustomers { .. } => None,
        }
    }

    /// Tool call arguments in the server's schema.
    pub fn arguments(&self) -> Value {
        match self {
            Self::GetCustomer { customer_id } | Self::GetCustomerHistory { customer_id } => {
                json!({ "customer_id": customer_id })
            }
            Self::ListCustomers { status, limit } => {
                let mut args = json!({ "limit": limit });
                if let Some(status) = status {
                    args["status"] = json!(status);
                }
                args
            }
            Self::UpdateCustomer {
                customer_id,
                fields,
            } => json!({ "customer_id": customer_id, "data": fields }),
            Self::CreateTicket {
                customer_id,
                issue,
                priority,
            } => json!({
                "customer_id": customer_id,
                "issue": issue,
                "priority": priority,
            }),
        }
    }

    /// Reject requests that must not reach the server.
    pub fn validate(&self) -> Result<()> {
        if let Some(0) = self.customer_id() {
            return Err(DataError::InvalidArgument(
                "customer_id must be a positive integer".to_string(),
            ));
        }

        match self {
            Self::ListCustomers { limit: 0, .. } => Err(DataError::InvalidArgument(
                "limit must be at least 1".to_string(),
            )),
            Self::UpdateCustomer { fields, .. } => {
                if fields.is_empty() {
                    return Err(DataError::InvalidArgument(
                        "no fields to update".to_string(),
                    ));
                }
                if let Some(unknown) = fields
                    .keys()
                    .find(|k| !UPDATABLE_FIELDS.contains(&k.as_str()))
                {
                    return Err(DataError::InvalidArgument(format!(
                        "field '{}' cannot be updated",
                        unknown
                    )));
                }
                Ok(())
            }
            Self::CreateTicket { issue, .. } if issue.trim().is_empty() => Err(
                DataError::InvalidArgument("issue text is empty".to_string()),
            ),
            _ => Ok(()),
        }
    }

    fn subject(&self) -> String {
        match self.customer_id() {
            Some(id) => format!("customer {}", id),
            None => "customers".to_string(),
        }
    }
}

/// Stateless adapter between the router and the tool server.
#[derive(Clone)]
pub struct DataAgent {
    tools: Arc<dyn ToolTransport>,
}

impl DataAgent {
    pub fn new(tools: Arc<dyn ToolTransport>) -> Self {
        Self { tools }
    }

    /// Validate, call the tool, normalize the reply.
    pub async fn execute(&self, request: &DataRequest) -> Result<Record> {
        request.validate()?;

        let tool = request.tool();
        tracing::debug!("Data agent: calling {}", tool);

        let value = self
            .tools
            .call(tool, request.arguments())
            .await
            .map_err(|e| {
                tracing::warn!("Data agent: {} failed: {}", tool, e);
                map_tool_error(e)
            })?;

        normalize(value, &request.subject())
    }

    pub async fn get_customer(&self, customer_id: CustomerId) -> Result<Record> {
        self.execute(&DataRequest::GetCustomer { customer_id })
            .await
    }

    pub async fn list_customers(&self, status: Option<&str>, limit: Option<u32>) -> Result<Record> {
        self.execute(&DataRequest::ListCustomers {
            status: status.map(str::to_string),
            limit: limit.unwrap_or(DEFAULT_LIST_LIMIT),
        })
        .await
    }

    pub async fn update_customer(&self, customer_id: CustomerId, fields: Record) -> Result<Record> {
        self.execute(&DataRequest::UpdateCustomer {
            customer_id,
            fields,
        })
        .await
    }

    pub async fn create_ticket(
        &self,
        customer_id: CustomerId,
        issue: &str,
        priority: Priority,
    ) -> Result<Record> {
        self.execute(&DataRequest::CreateTicket {
            customer_id,
            issue: issue.to_string(),
            priority,
        })
        .await
    }

    pub async fn get_customer_history(&self, customer_id: CustomerId) -> Result<Record> {
        self.execute(&DataRequest::GetCustomerHistory { customer_id })
            .await
    }
}

fn map_tool_error(err: ToolError) -> DataError {
    match err {
        ToolError::Rpc { code, message } => {
            if code == error_codes::NOT_FOUND || message.to_lowercase().contains("not found") {
                DataError::NotFound(message)
            } else if code == error_codes::INVALID_PARAMS {
                DataError::InvalidArgument(message)
            } else {
                DataError::Tool { code, message }
            }
        }
        other => DataError::UpstreamUnavailable(other.to_string()),
    }
}

/// Object → as-is, array → `{items, count}`, null → not found.
fn normalize(value: Value, subject: &str) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Array(items) => {
            let mut record = Record::new();
            record.insert("count".to_string(), json!(items.len()));
            record.insert("items".to_string(), Value::Array(items));
            Ok(record)
        }
        Value::Null => Err(DataError::NotFound(subject.to_string())),
        scalar => {
            let mut record = Record::new();
            record.insert("value".to_string(), scalar);
            Ok(record)
        }
    }
}

/// Short description of a record for the A2A log. Never includes field values.
pub fn describe_record(record: &Record) -> String {
    if let Some(items) = record.get("items").and_then(Value::as_array) {
        return format!("{} item(s)", items.len());
    }
    match record.get("id").and_then(Value::as_u64) {
        Some(id) => format!("record #{} ({} fields)", id, record.len()),
        None => format!("record ({} fields)", record.len()),
    }
}
