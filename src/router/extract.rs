//! Intent extraction.
//!
//! A fixed table of matchers runs over the request text. Each matcher
//! reports at most one intent together with the byte offset of the phrase
//! that triggered it; intents are then ordered by that offset so the plan
//! follows the order the customer wrote things in.

use super::intent::Intent;
use super::request::Request;
use crate::agents::{CustomerId, Priority, Record};
use crate::utils::{collapse_whitespace, truncate_str};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Longest issue text copied into a ticket.
const MAX_ISSUE_CHARS: usize = 500;

static CUSTOMER_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:customer|id)\b(?:\s+id\b)?(?:\s+(?:is|number|no\.?))?\s*[:#]?\s*(\d+)\b")
        .expect("valid regex")
});

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid regex")
});

/// An address introduced by "to", as in "from old@a.com to new@b.com".
static EMAIL_TARGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bto\s*[:=]?\s*([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})")
        .expect("valid regex")
});

static UPDATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:update|change|set)\b").expect("valid regex"));

static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(email|phone|name|status)\b(?:\s+(?:address|number))?\s*(?:\bto\b|=|:|\bas\b)\s*([^\s,;]+)")
        .expect("valid regex")
});

static UPGRADE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bupgrad(?:e|ed|es|ing)\b").expect("valid regex"));

static LOOKUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bget\s+customer\b|\b(?:information|info|details|profile|look\s?up)\b")
        .expect("valid regex")
});

static HISTORY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bhistory\b|\b(?:my|past|previous)\s+tickets\b").expect("valid regex")
});

static LIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\blist\b|\ball\s+(?:\w+\s+)?customers\b|\b(?:active|inactive|disabled|suspended)\s+customers\b")
        .expect("valid regex")
});

static STATUS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(active|inactive|disabled|suspended)\s+customers\b").expect("valid regex")
});

static LIMIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:top|first|limit(?:\s+of)?)\s+(\d+)\b").expect("valid regex")
});

static OPEN_TICKETS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bopen\s+tickets?\b").expect("valid regex"));

/// Escalation vocabulary. The highest matching priority wins.
static ESCALATION_KEYWORDS: Lazy<Vec<(Regex, Priority)>> = Lazy::new(|| {
    [
        (r"(?i)\burgent(?:ly)?\b", Priority::High),
        (r"(?i)\bimmediately\b", Priority::High),
        (r"(?i)\bcharged\s+twice\b", Priority::High),
        (r"(?i)\brefund\b", Priority::High),
        (r"(?i)\bescalate\b", Priority::High),
        (r"(?i)\bbilling\b", Priority::Medium),
        (r"(?i)\bcancel\b", Priority::Medium),
        (r"(?i)\bcomplaint\b", Priority::Medium),
    ]
    .into_iter()
    .map(|(pattern, priority)| (Regex::new(pattern).expect("valid regex"), priority))
    .collect()
});

/// What the matchers see: the raw text plus entities pulled out once.
pub struct Scan<'a> {
    pub text: &'a str,
    pub customer_id: Option<CustomerId>,
    /// Every e-mail address in the text, in order.
    pub emails: Vec<&'a str>,
}

impl<'a> Scan<'a> {
    pub fn new(request: &'a Request) -> Self {
        let text = request.text();
        Self {
            text,
            customer_id: customer_id_in(text).or(request.hints().customer_id),
            emails: EMAIL_RE.find_iter(text).map(|m| m.as_str()).collect(),
        }
    }
}

pub struct IntentMatch {
    pub offset: usize,
    pub intent: Intent,
}

type Matcher = fn(&Scan<'_>) -> Option<IntentMatch>;

const MATCHERS: &[(&str, Matcher)] = &[
    ("update", match_update),
    ("escalate", match_escalate),
    ("upgrade", match_upgrade),
    ("lookup", match_lookup),
    ("history", match_history),
    ("list", match_list),
];

/// Extract the ordered intents of a request.
///
/// Never empty: a request nothing matches yields a single
/// [`Intent::Unparsed`].
pub fn extract(request: &Request) -> Vec<Intent> {
    let scan = Scan::new(request);

    let mut matches: Vec<IntentMatch> = MATCHERS
        .iter()
        .filter_map(|(name, matcher)| {
            let found = matcher(&scan)?;
            tracing::debug!("Router: matcher '{}' hit at offset {}", name, found.offset);
            Some(found)
        })
        .collect();

    if matches.is_empty() {
        return vec![Intent::Unparsed {
            text: request.text().to_string(),
        }];
    }

    // Same trigger position: writes go before reads.
    matches.sort_by_key(|m| (m.offset, !m.intent.is_side_effecting()));
    matches.into_iter().map(|m| m.intent).collect()
}

fn customer_id_in(text: &str) -> Option<CustomerId> {
    CUSTOMER_ID_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .next()
}

fn match_update(scan: &Scan<'_>) -> Option<IntentMatch> {
    let trigger = UPDATE_RE.find(scan.text)?;

    let mut fields = Record::new();
    for caps in FIELD_RE.captures_iter(scan.text) {
        let (Some(field), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let field = field.as_str().to_lowercase();
        let value = match field.as_str() {
            "email" => match EMAIL_RE.find(value.as_str()) {
                Some(email) => email.as_str().to_string(),
                None => continue,
            },
            "status" => clean_value(value.as_str()).to_lowercase(),
            _ => clean_value(value.as_str()).to_string(),
        };
        if !value.is_empty() {
            fields.insert(field, Value::String(value));
        }
    }
    if !fields.contains_key("email")
        && let Some(email) = target_email(scan)
    {
        fields.insert("email".to_string(), Value::String(email.to_string()));
    }

    Some(IntentMatch {
        offset: trigger.start(),
        intent: Intent::Update {
            customer_id: scan.customer_id,
            fields,
        },
    })
}

/// The address an update should write when no `email to X` phrase named it:
/// the one introduced by "to", else the only address in the text. Two or
/// more unmarked addresses are ambiguous and yield none.
fn target_email<'a>(scan: &Scan<'a>) -> Option<&'a str> {
    if let Some(target) = EMAIL_TARGET_RE.captures(scan.text).and_then(|caps| caps.get(1)) {
        return Some(target.as_str());
    }
    match scan.emails.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

fn clean_value(raw: &str) -> &str {
    raw.trim_matches(|c: char| matches!(c, '.' | '!' | '?' | ')' | '(' | '"' | '\''))
}

fn match_escalate(scan: &Scan<'_>) -> Option<IntentMatch> {
    let mut offset: Option<usize> = None;
    let mut priority: Option<Priority> = None;

    for (re, keyword_priority) in ESCALATION_KEYWORDS.iter() {
        if let Some(m) = re.find(scan.text) {
            offset = Some(offset.map_or(m.start(), |o| o.min(m.start())));
            priority = Some(priority.map_or(*keyword_priority, |p| p.max(*keyword_priority)));
        }
    }

    Some(IntentMatch {
        offset: offset?,
        intent: Intent::Escalate {
            customer_id: scan.customer_id,
            issue: truncate_str(&collapse_whitespace(scan.text), MAX_ISSUE_CHARS),
            priority: priority?,
        },
    })
}

fn match_upgrade(scan: &Scan<'_>) -> Option<IntentMatch> {
    let m = UPGRADE_RE.find(scan.text)?;
    Some(IntentMatch {
        offset: m.start(),
        intent: Intent::Upgrade {
            customer_id: scan.customer_id,
        },
    })
}

fn match_lookup(scan: &Scan<'_>) -> Option<IntentMatch> {
    let m = LOOKUP_RE.find(scan.text)?;
    Some(IntentMatch {
        offset: m.start(),
        intent: Intent::Lookup {
            customer_id: scan.customer_id,
        },
    })
}

fn match_history(scan: &Scan<'_>) -> Option<IntentMatch> {
    let m = HISTORY_RE.find(scan.text)?;
    Some(IntentMatch {
        offset: m.start(),
        intent: Intent::History {
            customer_id: scan.customer_id,
        },
    })
}

fn match_list(scan: &Scan<'_>) -> Option<IntentMatch> {
    let m = LIST_RE.find(scan.text)?;
    let status = STATUS_RE
        .captures(scan.text)
        .and_then(|caps| caps.get(1))
        .map(|s| s.as_str().to_lowercase());
    let limit = LIMIT_RE
        .captures(scan.text)
        .and_then(|caps| caps.get(1)?.as_str().parse().ok());

    Some(IntentMatch {
        offset: m.start(),
        intent: Intent::List {
            status,
            limit,
            open_tickets: OPEN_TICKETS_RE.is_match(scan.text),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::intent::IntentKind;
    use rstest::rstest;
    use serde_json::json;

    fn kinds(text: &str) -> Vec<IntentKind> {
        extract(&Request::new(text)).iter().map(Intent::kind).collect()
    }

    #[rstest]
    #[case("Get customer information for ID 5", Some(5))]
    #[case("I'm customer 12 and need help", Some(12))]
    #[case("My ID is 7", Some(7))]
    #[case("customer #42 here", Some(42))]
    #[case("customer id: 3", Some(3))]
    #[case("I have 3 questions", None)]
    fn test_customer_id_extraction(#[case] text: &str, #[case] expected: Option<CustomerId>) {
        assert_eq!(customer_id_in(text), expected);
    }

    #[test]
    fn test_single_lookup() {
        let intents = extract(&Request::new("Get customer information for ID 5"));
        assert_eq!(
            intents,
            vec![Intent::Lookup {
                customer_id: Some(5)
            }]
        );
    }

    #[test]
    fn test_upgrade_is_not_a_lookup() {
        let intents = extract(&Request::new("I'm customer 12 and need help upgrade my account"));
        assert_eq!(
            intents,
            vec![Intent::Upgrade {
                customer_id: Some(12)
            }]
        );
    }

    #[test]
    fn test_update_then_history_in_text_order() {
        let intents = extract(&Request::new(
            "I am customer 12, update my email to new@email.com and show my ticket history",
        ));
        let mut fields = Record::new();
        fields.insert("email".to_string(), json!("new@email.com"));
        assert_eq!(
            intents,
            vec![
                Intent::Update {
                    customer_id: Some(12),
                    fields,
                },
                Intent::History {
                    customer_id: Some(12)
                },
            ]
        );
    }

    #[test]
    fn test_history_then_update_keeps_text_order() {
        assert_eq!(
            kinds("Show my ticket history for customer 4, then change my phone to 555-0100."),
            vec![IntentKind::History, IntentKind::Update]
        );
    }

    #[test]
    fn test_update_fields_are_cleaned() {
        let intents = extract(&Request::new("customer 9: set phone to 555-0134, status to Inactive."));
        let Intent::Update { fields, .. } = &intents[0] else {
            panic!("expected update, got {:?}", intents);
        };
        assert_eq!(fields.get("phone"), Some(&json!("555-0134")));
        assert_eq!(fields.get("status"), Some(&json!("inactive")));
    }

    #[rstest]
    #[case("customer 12: change my email from old@a.com to new@b.com", Some("new@b.com"))]
    #[case(
        "customer 12, my email is old@a.com, please update email to new@b.com",
        Some("new@b.com")
    )]
    #[case("customer 12: update my email: new@b.com.", Some("new@b.com"))]
    #[case("customer 12: please update my email, it's new@b.com", Some("new@b.com"))]
    #[case("customer 12: update email, old is old@a.com, new is new@b.com", None)]
    fn test_update_writes_the_new_email(#[case] text: &str, #[case] expected: Option<&str>) {
        let intents = extract(&Request::new(text));
        let Some(Intent::Update { fields, .. }) = intents.first() else {
            panic!("expected update, got {:?}", intents);
        };
        assert_eq!(fields.get("email").and_then(Value::as_str), expected);
    }

    #[test]
    fn test_escalation_takes_highest_priority() {
        let intents = extract(&Request::new(
            "I've been charged twice, please cancel my subscription. My ID is 7",
        ));
        assert_eq!(intents.len(), 1);
        let Intent::Escalate {
            customer_id,
            priority,
            issue,
        } = &intents[0]
        else {
            panic!("expected escalate, got {:?}", intents);
        };
        assert_eq!(*customer_id, Some(7));
        assert_eq!(*priority, Priority::High);
        assert!(issue.contains("charged twice"));
    }

    #[test]
    fn test_medium_priority_escalation() {
        let intents = extract(&Request::new("customer 3 has a billing complaint"));
        assert!(matches!(
            intents[0],
            Intent::Escalate {
                priority: Priority::Medium,
                ..
            }
        ));
    }

    #[test]
    fn test_list_with_status_and_open_tickets() {
        let intents = extract(&Request::new("Show me all active customers who have open tickets"));
        assert_eq!(
            intents,
            vec![Intent::List {
                status: Some("active".to_string()),
                limit: None,
                open_tickets: true,
            }]
        );
    }

    #[test]
    fn test_list_limit() {
        let intents = extract(&Request::new("list the top 3 inactive customers"));
        assert_eq!(
            intents,
            vec![Intent::List {
                status: Some("inactive".to_string()),
                limit: Some(3),
                open_tickets: false,
            }]
        );
    }

    #[test]
    fn test_hint_supplies_missing_customer_id() {
        let intents = extract(&Request::new("show my ticket history").with_customer_id(8));
        assert_eq!(
            intents,
            vec![Intent::History {
                customer_id: Some(8)
            }]
        );
    }

    #[test]
    fn test_text_id_beats_hint() {
        let intents = extract(&Request::new("details for customer 2").with_customer_id(8));
        assert_eq!(intents[0].customer_id(), Some(2));
    }

    #[rstest]
    #[case("")]
    #[case("hello there")]
    #[case("what's the weather like?")]
    fn test_nothing_recognized(#[case] text: &str) {
        assert_eq!(
            extract(&Request::new(text)),
            vec![Intent::Unparsed {
                text: text.to_string()
            }]
        );
    }

    #[test]
    fn test_long_issue_is_truncated() {
        let text = format!("urgent: {}", "x ".repeat(600));
        let intents = extract(&Request::new(text));
        let Intent::Escalate { issue, .. } = &intents[0] else {
            panic!("expected escalate");
        };
        assert!(issue.chars().count() <= MAX_ISSUE_CHARS + 1);
    }
}
