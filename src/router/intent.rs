//! Intents and plan shapes.

use crate::agents::{CustomerId, DataRequest, Priority, Record};
use crate::config::RouterConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One discrete goal extracted from a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// Fetch one customer's profile.
    Lookup { customer_id: Option<CustomerId> },
    /// Enumerate customers, optionally by status.
    List {
        status: Option<String>,
        limit: Option<u32>,
        /// The request also asked about open tickets, which no single tool answers.
        open_tickets: bool,
    },
    /// Change profile fields.
    Update {
        customer_id: Option<CustomerId>,
        fields: Record,
    },
    /// Account upgrade help. Verifies the account, then gives guidance.
    Upgrade { customer_id: Option<CustomerId> },
    /// Ticket history for one customer.
    History { customer_id: Option<CustomerId> },
    /// Open a support ticket.
    Escalate {
        customer_id: Option<CustomerId>,
        issue: String,
        priority: Priority,
    },
    /// Nothing recognizable.
    Unparsed { text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Lookup,
    List,
    Update,
    Upgrade,
    History,
    Escalate,
    Unparsed,
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lookup => "lookup",
            Self::List => "list",
            Self::Update => "update",
            Self::Upgrade => "upgrade",
            Self::History => "history",
            Self::Escalate => "escalate",
            Self::Unparsed => "unparsed",
        };
        f.write_str(s)
    }
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::Lookup { .. } => IntentKind::Lookup,
            Self::List { .. } => IntentKind::List,
            Self::Update { .. } => IntentKind::Update,
            Self::Upgrade { .. } => IntentKind::Upgrade,
            Self::History { .. } => IntentKind::History,
            Self::Escalate { .. } => IntentKind::Escalate,
            Self::Unparsed { .. } => IntentKind::Unparsed,
        }
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        match self {
            Self::Lookup { customer_id }
            | Self::Update { customer_id, .. }
            | Self::Upgrade { customer_id }
            | Self::History { customer_id }
            | Self::Escalate { customer_id, .. } => *customer_id,
            Self::List { .. } | Self::Unparsed { .. } => None,
        }
    }

    /// Writes to the data store.
    pub fn is_side_effecting(&self) -> bool {
        matches!(self, Self::Update { .. } | Self::Escalate { .. })
    }

    /// Confirms the customer exists; later intents on the same customer depend on it.
    pub fn is_verification(&self) -> bool {
        matches!(self, Self::Lookup { .. } | Self::Upgrade { .. })
    }

    /// Build the data operation for this intent, or explain what is missing.
    pub fn data_request(&self, config: &RouterConfig) -> Result<DataRequest, String> {
        let customer = || {
            self.customer_id()
                .ok_or_else(|| "no customer ID was found in the request".to_string())
        };

        match self {
            Self::Lookup { .. } | Self::Upgrade { .. } => Ok(DataRequest::GetCustomer {
                customer_id: customer()?,
            }),
            Self::History { .. } => Ok(DataRequest::GetCustomerHistory {
                customer_id: customer()?,
            }),
            Self::List { status, limit, .. } => Ok(DataRequest::ListCustomers {
                status: status.clone(),
                limit: limit
                    .unwrap_or(config.default_list_limit)
                    .clamp(1, config.max_list_limit.max(1)),
            }),
            Self::Update { fields, .. } => {
                let customer_id = customer()?;
                if fields.is_empty() {
                    return Err("no field and new value were given to update".to_string());
                }
                Ok(DataRequest::UpdateCustomer {
                    customer_id,
                    fields: fields.clone(),
                })
            }
            Self::Escalate {
                issue, priority, ..
            } => Ok(DataRequest::CreateTicket {
                customer_id: customer()?,
                issue: issue.clone(),
                priority: *priority,
            }),
            Self::Unparsed { .. } => Err("the request was not understood".to_string()),
        }
    }
}

/// How the intents of one request relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "kind", rename_all = "snake_case")]
pub enum PlanShape {
    /// No intent recognized.
    Unparsed,
    /// Exactly one intent.
    Single(IntentKind),
    /// A later intent acts on a customer an earlier intent verifies.
    MultiStep,
    /// Independent intents answered together.
    MultiIntent,
}

impl PlanShape {
    pub fn of(intents: &[Intent]) -> Self {
        match intents {
            [] | [Intent::Unparsed { .. }] => Self::Unparsed,
            [only] => Self::Single(only.kind()),
            _ => {
                let chained = intents.iter().enumerate().any(|(i, later)| {
                    later.customer_id().is_some_and(|id| {
                        intents[..i].iter().any(|earlier| {
                            earlier.is_verification() && earlier.customer_id() == Some(id)
                        })
                    })
                });
                if chained {
                    Self::MultiStep
                } else {
                    Self::MultiIntent
                }
            }
        }
    }
}

impl fmt::Display for PlanShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unparsed => f.write_str("unparsed"),
            Self::Single(kind) => write!(f, "single ({})", kind),
            Self::MultiStep => f.write_str("multi-step"),
            Self::MultiIntent => f.write_str("multi-intent"),
        }
    }
}
