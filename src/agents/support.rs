//! Support Agent.
//!
//! Pure text composition. Receives the intents of a request together with
//! their result slots and writes one reply that covers every slot, failed
//! ones included. Never touches the tool server.

use super::data::{CustomerId, Priority, Record};
use crate::error::{FailureKind, IntentFailure};
use crate::router::{Intent, IntentOutcome};
use serde_json::Value;

/// Reply used when no intent could be recognized.
pub const CLARIFICATION: &str = "Sorry, I couldn't tell what you need. I can look up a customer, \
list customers, update contact details, help with an upgrade, show ticket history, or open a \
support ticket. Please rephrase and include your customer ID.";

const OPEN_TICKETS_NOTE: &str = "Note: I can't filter customers by open tickets in a single \
lookup. Ask about a specific customer ID and I'll pull up their ticket history.";

#[derive(Debug, Clone, Copy, Default)]
pub struct SupportAgent;

impl SupportAgent {
    pub fn new() -> Self {
        Self
    }

    /// Compose the final reply. `results[i]` belongs to `intents[i]`.
    pub fn summarize(&self, intents: &[Intent], results: &[IntentOutcome]) -> String {
        let sections: Vec<String> = intents
            .iter()
            .zip(results)
            .map(|(intent, outcome)| match outcome {
                IntentOutcome::Completed { record } => render_success(intent, record),
                IntentOutcome::Failed { failure } => render_failure(intent, failure),
            })
            .collect();

        if sections.is_empty() {
            return CLARIFICATION.to_string();
        }
        sections.join("\n\n")
    }
}

fn render_success(intent: &Intent, record: &Record) -> String {
    match intent {
        Intent::Lookup { customer_id } => render_profile(*customer_id, record),
        Intent::List {
            status,
            open_tickets,
            ..
        } => {
            let mut text = render_list(status.as_deref(), record);
            if *open_tickets {
                text.push('\n');
                text.push_str(OPEN_TICKETS_NOTE);
            }
            text
        }
        Intent::Update {
            customer_id,
            fields,
        } => {
            let changes: Vec<String> = fields
                .iter()
                .map(|(field, requested)| {
                    let value = record.get(field).unwrap_or(requested);
                    format!("{} is now {}", field, display(value))
                })
                .collect();
            format!(
                "Done. I've updated {}: {}.",
                subject(*customer_id, record),
                changes.join(", ")
            )
        }
        Intent::Upgrade { customer_id } => {
            let name = text_field(record, "name").unwrap_or("there");
            let status = text_field(record, "status").unwrap_or("unknown");
            format!(
                "Thanks, {}. I've confirmed {} (current status: {}). Plan changes are handled by \
our accounts team, who can walk you through the available plans and pricing. Let us know which \
plan you're interested in to get started.",
                name,
                subject(*customer_id, record),
                status
            )
        }
        Intent::History { customer_id } => render_history(*customer_id, record),
        Intent::Escalate {
            customer_id,
            priority,
            ..
        } => {
            let priority = text_field(record, "priority")
                .and_then(|p| serde_json::from_value::<Priority>(Value::String(p.to_string())).ok())
                .unwrap_or(*priority);
            let ticket = match record.get("id").and_then(Value::as_u64) {
                Some(id) => format!("ticket #{}", id),
                None => "a ticket".to_string(),
            };
            let follow_up = if priority == Priority::High {
                "A support specialist will contact you within 24 hours."
            } else {
                "Our support team will review it and get back to you."
            };
            format!(
                "I'm sorry for the trouble. I've opened {} for {} with {} priority. {}",
                ticket,
                subject(*customer_id, record),
                priority,
                follow_up
            )
        }
        Intent::Unparsed { .. } => CLARIFICATION.to_string(),
    }
}

fn render_failure(intent: &Intent, failure: &IntentFailure) -> String {
    let action = action_phrase(intent);
    match failure.kind {
        FailureKind::ParseFailure => CLARIFICATION.to_string(),
        FailureKind::MissingPrerequisite => format!(
            "I couldn't {}: {}. Please include the missing details and try again.",
            action, failure.message
        ),
        FailureKind::ToolFailure => format!(
            "Sorry, I wasn't able to {} ({}).",
            action, failure.message
        ),
        FailureKind::UpstreamUnavailable => format!(
            "Sorry, I couldn't {} because the customer system is temporarily unavailable. \
Please try again shortly.",
            action
        ),
    }
}

fn action_phrase(intent: &Intent) -> String {
    let who = match intent.customer_id() {
        Some(id) => format!("customer #{}", id),
        None => "your account".to_string(),
    };
    match intent {
        Intent::Lookup { .. } => format!("look up {}", who),
        Intent::List { .. } => "list customers".to_string(),
        Intent::Update { .. } => format!("update the details for {}", who),
        Intent::Upgrade { .. } => format!("check {} for an upgrade", who),
        Intent::History { .. } => format!("fetch the ticket history for {}", who),
        Intent::Escalate { .. } => format!("open a support ticket for {}", who),
        Intent::Unparsed { .. } => "understand the request".to_string(),
    }
}

fn render_profile(customer_id: Option<CustomerId>, record: &Record) -> String {
    let mut lines = vec![format!("Here are the details for {}:", subject(customer_id, record))];
    for field in ["name", "email", "phone", "status"] {
        let value = record.get(field).map(display).unwrap_or_else(|| "unknown".to_string());
        lines.push(format!("- {}: {}", field, value));
    }
    if let Some(created) = text_field(record, "created_at") {
        lines.push(format!("- customer since: {}", created));
    }
    lines.join("\n")
}

fn render_list(status: Option<&str>, record: &Record) -> String {
    let items = items(record);
    let label = match status {
        Some(status) => format!("{} customers", status),
        None => "customers".to_string(),
    };
    if items.is_empty() {
        return format!("I couldn't find any {}.", label);
    }

    let mut lines = vec![format!("I found {} {}:", items.len(), label)];
    for item in items {
        let id = item.get("id").map(display).unwrap_or_else(|| "?".to_string());
        let name = item.get("name").map(display).unwrap_or_else(|| "unknown".to_string());
        match item.get("status") {
            Some(status) => lines.push(format!("- #{} {} ({})", id, name, display(status))),
            None => lines.push(format!("- #{} {}", id, name)),
        }
    }
    lines.join("\n")
}

fn render_history(customer_id: Option<CustomerId>, record: &Record) -> String {
    let who = match customer_id {
        Some(id) => format!("customer #{}", id),
        None => "this customer".to_string(),
    };
    let tickets = items(record);
    if tickets.is_empty() {
        return format!("There are no tickets on file for {}.", who);
    }

    let mut lines = vec![format!("Ticket history for {} ({} tickets):", who, tickets.len())];
    for ticket in tickets {
        let id = ticket.get("id").map(display).unwrap_or_else(|| "?".to_string());
        let issue = ticket.get("issue").map(display).unwrap_or_default();
        let status = ticket.get("status").map(display).unwrap_or_else(|| "unknown".to_string());
        let priority = ticket.get("priority").map(display).unwrap_or_else(|| "unknown".to_string());
        lines.push(format!("- #{} [{}, {} priority] {}", id, status, priority, issue));
    }
    lines.join("\n")
}

fn subject(customer_id: Option<CustomerId>, record: &Record) -> String {
    let id = customer_id.or_else(|| record.get("customer_id").and_then(Value::as_u64));
    match id {
        Some(id) => format!("customer #{}", id),
        None => "your account".to_string(),
    }
}

fn items(record: &Record) -> &[Value] {
    record
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn text_field<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "unknown".to_string(),
        other => other.to_string(),
    }
}
