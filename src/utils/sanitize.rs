//! PII masking for A2A payload summaries and logs.
//!
//! The A2A log is returned to callers and written to tracing output, so
//! tool arguments are summarised with contact details masked: enough to
//! tell which record was touched, not enough to reconstruct the value.

use super::string::truncate_str;
use serde_json::{Map, Value};

/// Field names (case-insensitive substring match) whose values are masked.
const PII_KEYS: &[&str] = &["email", "phone", "mobile", "address"];

const MAX_VALUE_CHARS: usize = 40;

fn is_pii_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    PII_KEYS.iter().any(|&pat| lower.contains(pat))
}

/// `new@email.com` → `n***@email.com`
fn mask_email(value: &str) -> String {
    match value.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, domain)
        }
        None => mask_tail(value),
    }
}

/// Keep the last two characters only: `555-0134` → `***34`
fn mask_tail(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 2 {
        return "***".to_string();
    }
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("***{}", tail)
}

fn mask_string(key: &str, value: &str) -> String {
    if key.to_lowercase().contains("email") {
        mask_email(value)
    } else {
        mask_tail(value)
    }
}

/// Recursively mask PII-bearing fields of a JSON value.
pub fn mask_pii(value: &Value) -> Value {
    mask_value(value, None)
}

fn mask_value(value: &Value, parent_key: Option<&str>) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), mask_value(v, Some(k)));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| mask_value(v, parent_key)).collect()),
        Value::String(s) => match parent_key {
            Some(key) if is_pii_key(key) => Value::String(mask_string(key, s)),
            _ => Value::String(s.clone()),
        },
        other => other.clone(),
    }
}

/// One-line `key=value` summary of tool arguments, PII masked and long values cut.
pub fn summarize_args(arguments: &Value) -> String {
    match mask_pii(arguments) {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}={}", k, render_scalar(v)))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => String::new(),
        other => render_scalar(&other),
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => truncate_str(s, MAX_VALUE_CHARS),
        Value::Object(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("{}={}", k, render_scalar(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        other => truncate_str(&other.to_string(), MAX_VALUE_CHARS),
    }
}
