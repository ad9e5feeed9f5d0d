//! In-memory customer store exposed through [`LocalTools`].
//!
//! Mirrors the customer data server's tool semantics closely enough for the
//! router and agents to be exercised end to end without a child process.

use crate::protocol::types::error_codes;
use crate::protocol::{LocalTools, ToolError, ToolTransport, tools};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub customers: Vec<Value>,
    pub tickets: Vec<Value>,
}

impl MemoryStore {
    pub fn seeded() -> Self {
        let customer = |id: u64, name: &str, email: &str, phone: &str, status: &str| {
            json!({
                "id": id,
                "name": name,
                "email": email,
                "phone": phone,
                "status": status,
                "created_at": "2024-01-15 09:30:00",
            })
        };
        let ticket = |id: u64, customer_id: u64, issue: &str, status: &str, priority: &str| {
            json!({
                "id": id,
                "customer_id": customer_id,
                "issue": issue,
                "status": status,
                "priority": priority,
                "created_at": "2024-03-02 14:00:00",
            })
        };

        Self {
            customers: vec![
                customer(1, "John Doe", "john.doe@example.com", "+1-555-0101", "active"),
                customer(3, "Bob Johnson", "bob.j@example.com", "+1-555-0103", "disabled"),
                customer(5, "Charlie Brown", "charlie.b@example.com", "+1-555-0105", "active"),
                customer(7, "Grace Hopper", "grace@example.com", "+1-555-0107", "active"),
                customer(12, "Alan Turing", "alan@example.com", "+1-555-0112", "active"),
            ],
            tickets: vec![
                ticket(1, 12, "Login fails after password reset", "open", "high"),
                ticket(2, 12, "Invoice shows wrong address", "resolved", "low"),
                ticket(3, 5, "Export to CSV is slow", "in_progress", "medium"),
            ],
        }
    }

    fn customer_mut(&mut self, id: u64) -> Option<&mut Value> {
        self.customers.iter_mut().find(|c| c["id"] == id)
    }
}

fn customer_id(args: &Value) -> Result<u64, ToolError> {
    args["customer_id"].as_u64().ok_or_else(|| ToolError::Rpc {
        code: error_codes::INVALID_PARAMS,
        message: "customer_id is required".to_string(),
    })
}

/// A [`LocalTools`] table backed by a shared [`MemoryStore`].
pub fn customer_tools(store: Arc<Mutex<MemoryStore>>) -> LocalTools {
    let get = store.clone();
    let list = store.clone();
    let update = store.clone();
    let create = store.clone();
    let history = store;

    LocalTools::new()
        .with_tool(tools::GET_CUSTOMER, move |args| {
            let id = customer_id(&args)?;
            let store = get.lock().unwrap();
            Ok(store
                .customers
                .iter()
                .find(|c| c["id"] == id)
                .cloned()
                .unwrap_or(Value::Null))
        })
        .with_tool(tools::LIST_CUSTOMERS, move |args| {
            let limit = args["limit"].as_u64().unwrap_or(10) as usize;
            let status = args["status"].as_str();
            let store = list.lock().unwrap();
            let rows: Vec<Value> = store
                .customers
                .iter()
                .filter(|c| status.is_none_or(|s| c["status"] == s))
                .take(limit)
                .cloned()
                .collect();
            Ok(Value::Array(rows))
        })
        .with_tool(tools::UPDATE_CUSTOMER, move |args| {
            let id = customer_id(&args)?;
            let data = args["data"].as_object().cloned().unwrap_or_default();
            let mut store = update.lock().unwrap();
            let Some(customer) = store.customer_mut(id) else {
                return Err(ToolError::Rpc {
                    code: error_codes::INTERNAL_ERROR,
                    message: "Customer not found.".to_string(),
                });
            };
            let mut changed = 0;
            for (field, value) in data {
                if ["name", "email", "phone", "status"].contains(&field.as_str()) {
                    customer[field] = value;
                    changed += 1;
                }
            }
            if changed == 0 {
                return Err(ToolError::Rpc {
                    code: error_codes::INVALID_PARAMS,
                    message: "No valid update fields.".to_string(),
                });
            }
            Ok(customer.clone())
        })
        .with_tool(tools::CREATE_TICKET, move |args| {
            let id = customer_id(&args)?;
            let mut store = create.lock().unwrap();
            if !store.customers.iter().any(|c| c["id"] == id) {
                return Err(ToolError::Rpc {
                    code: error_codes::INTERNAL_ERROR,
                    message: "Customer not found.".to_string(),
                });
            }
            let ticket_id = store.tickets.len() as u64 + 1;
            let ticket = json!({
                "id": ticket_id,
                "customer_id": id,
                "issue": args["issue"],
                "status": "open",
                "priority": args["priority"],
                "created_at": "2024-06-01 10:00:00",
            });
            store.tickets.push(ticket.clone());
            Ok(ticket)
        })
        .with_tool(tools::GET_CUSTOMER_HISTORY, move |args| {
            let id = customer_id(&args)?;
            let store = history.lock().unwrap();
            let rows: Vec<Value> = store
                .tickets
                .iter()
                .filter(|t| t["customer_id"] == id)
                .cloned()
                .collect();
            Ok(Value::Array(rows))
        })
}

/// Seeded store plus its tool table.
pub fn seeded_tools() -> (Arc<Mutex<MemoryStore>>, LocalTools) {
    let store = Arc::new(Mutex::new(MemoryStore::seeded()));
    let tools = customer_tools(store.clone());
    (store, tools)
}

/// Wraps a transport and sleeps before each call so concurrent requests interleave.
pub struct SlowTools<T> {
    pub inner: T,
    pub delay: Duration,
}

#[async_trait]
impl<T: ToolTransport> ToolTransport for SlowTools<T> {
    async fn call(&self, tool: &str, arguments: Value) -> Result<Value, ToolError> {
        tokio::time::sleep(self.delay).await;
        self.inner.call(tool, arguments).await
    }
}
