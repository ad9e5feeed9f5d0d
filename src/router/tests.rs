//! End-to-end router scenarios against the in-memory customer store.

use super::*;
use crate::a2a::A2aMessage;
use crate::agents::Priority;
use crate::protocol::types::error_codes;
use crate::protocol::{ClientOptions, LocalTools, ToolClient, ToolError, WireDialect, tools};
use crate::testing::{SlowTools, seeded_tools};
use serde_json::json;
use std::time::Duration;

fn router(tools: LocalTools) -> Router {
    Router::new(Arc::new(tools))
}

fn hops(log: &[A2aMessage]) -> Vec<(AgentRole, AgentRole)> {
    log.iter().map(|m| (m.from, m.to)).collect()
}

const PAIR_AND_SUMMARY: [(AgentRole, AgentRole); 4] = [
    (AgentRole::Router, AgentRole::DataAgent),
    (AgentRole::DataAgent, AgentRole::Router),
    (AgentRole::Router, AgentRole::SupportAgent),
    (AgentRole::SupportAgent, AgentRole::Router),
];

#[tokio::test]
async fn test_single_lookup_is_one_pair_and_one_summary() {
    let (_, tools) = seeded_tools();
    let outcome = router(tools.clone())
        .handle(Request::new("Get customer information for ID 5"))
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert_eq!(outcome.shape, PlanShape::Single(IntentKind::Lookup));
    assert_eq!(hops(&outcome.log), PAIR_AND_SUMMARY);
    assert!(outcome.log[0].summary.contains("get_customer(customer_id=5)"));
    assert!(outcome.response.contains("Charlie Brown"));
    assert_eq!(tools.call_count(), 1);
}

#[tokio::test]
async fn test_each_single_intent_request_dispatches_once() {
    for text in [
        "I'm customer 12 and need help upgrade my account",
        "Show me all active customers",
        "customer 5, what's my ticket history?",
        "I've been charged twice, please cancel my subscription. My ID is 7",
        "customer 1: change my phone to 555-0199",
    ] {
        let (_, tools) = seeded_tools();
        let outcome = router(tools.clone()).handle(Request::new(text)).await;
        assert_eq!(outcome.intents.len(), 1, "{}", text);
        assert_eq!(hops(&outcome.log), PAIR_AND_SUMMARY, "{}", text);
        assert_eq!(tools.call_count(), 1, "{}", text);
        assert_eq!(outcome.status, OutcomeStatus::Completed, "{}", text);
    }
}

#[tokio::test]
async fn test_update_then_history_log_order() {
    let (store, tools) = seeded_tools();
    let outcome = router(tools)
        .handle(Request::new(
            "I am customer 12, update my email to new@email.com and show my ticket history",
        ))
        .await;

    let kinds: Vec<IntentKind> = outcome.intents.iter().map(Intent::kind).collect();
    assert_eq!(kinds, vec![IntentKind::Update, IntentKind::History]);
    assert_eq!(
        hops(&outcome.log),
        vec![
            (AgentRole::Router, AgentRole::DataAgent),
            (AgentRole::DataAgent, AgentRole::Router),
            (AgentRole::Router, AgentRole::DataAgent),
            (AgentRole::DataAgent, AgentRole::Router),
            (AgentRole::Router, AgentRole::SupportAgent),
            (AgentRole::SupportAgent, AgentRole::Router),
        ]
    );
    assert!(outcome.log[0].summary.contains("update_customer"));
    assert!(outcome.log[2].summary.contains("get_customer_history"));
    // The address itself never reaches the log.
    assert!(outcome.log.iter().all(|m| !m.summary.contains("new@email.com")));

    let seqs: Vec<u64> = outcome.log.iter().map(|m| m.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5, 6]);

    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert!(outcome.response.contains("email is now new@email.com"));
    assert!(outcome.response.contains("Login fails after password reset"));

    let store = store.lock().unwrap();
    let customer = store.customers.iter().find(|c| c["id"] == 12).unwrap();
    assert_eq!(customer["email"], "new@email.com");
}

#[tokio::test]
async fn test_email_change_stores_the_new_address() {
    let (store, tools) = seeded_tools();
    let outcome = router(tools)
        .handle(Request::new(
            "customer 12: change my email from alan@example.com to alan.t@example.org",
        ))
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert!(outcome.response.contains("email is now alan.t@example.org"));

    let store = store.lock().unwrap();
    let customer = store.customers.iter().find(|c| c["id"] == 12).unwrap();
    assert_eq!(customer["email"], "alan.t@example.org");
}

#[tokio::test]
async fn test_failed_update_does_not_stop_history() {
    let (_, mut tools) = seeded_tools();
    tools.register(tools::UPDATE_CUSTOMER, |_| {
        Err(ToolError::Rpc {
            code: error_codes::INTERNAL_ERROR,
            message: "database is locked".to_string(),
        })
    });

    let outcome = router(tools)
        .handle(Request::new(
            "I am customer 12, update my email to new@email.com and show my ticket history",
        ))
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Partial);
    let failure = outcome.results[0].failure().expect("update failed");
    assert_eq!(failure.kind, FailureKind::ToolFailure);
    assert!(outcome.results[1].is_completed());
    assert!(outcome.log[1].summary.starts_with("returning error"));
    assert!(outcome.response.contains("wasn't able to update the details for customer #12"));
    assert!(outcome.response.contains("Ticket history for customer #12"));
}

#[tokio::test]
async fn test_unrecognized_request_asks_for_clarification() {
    let (_, tools) = seeded_tools();
    let outcome = router(tools.clone())
        .handle(Request::new("hello, is anybody there?"))
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Clarification);
    assert!(outcome.log.is_empty());
    assert_eq!(outcome.response, CLARIFICATION);
    assert_eq!(
        outcome.results[0].failure().map(|f| f.kind),
        Some(FailureKind::ParseFailure)
    );
    assert_eq!(tools.call_count(), 0);
}

#[tokio::test]
async fn test_concurrent_requests_keep_separate_logs() {
    let (_, tools) = seeded_tools();
    let router = Router::new(Arc::new(SlowTools {
        inner: tools,
        delay: Duration::from_millis(20),
    }));

    let (a, b) = tokio::join!(
        router.handle(Request::new(
            "I am customer 12, update my email to new@email.com and show my ticket history",
        )),
        router.handle(Request::new(
            "Get customer information for ID 5 and show my ticket history",
        )),
    );

    assert_ne!(a.request_id, b.request_id);
    for outcome in [&a, &b] {
        let seqs: Vec<u64> = outcome.log.iter().map(|m| m.seq).collect();
        let expected: Vec<u64> = (1..=outcome.log.len() as u64).collect();
        assert_eq!(seqs, expected);
    }
    assert!(a.log.iter().all(|m| !m.summary.contains("customer_id=5")));
    assert!(b.log.iter().all(|m| !m.summary.contains("customer_id=12")));
    assert_eq!(a.log.len(), 6);
    assert_eq!(b.log.len(), 6);
}

#[tokio::test]
async fn test_silent_tool_server_is_upstream_unavailable() {
    let (client_end, server_end) = tokio::io::duplex(64 * 1024);
    let (reader, writer) = tokio::io::split(client_end);
    let client = ToolClient::connect(
        reader,
        writer,
        ClientOptions {
            dialect: WireDialect::Direct,
            timeout: Duration::from_millis(100),
            ..ClientOptions::default()
        },
    )
    .await
    .unwrap();

    let started = std::time::Instant::now();
    let outcome = Router::new(Arc::new(client))
        .handle(Request::new("Get customer information for ID 5"))
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(
        outcome.results[0].failure().map(|f| f.kind),
        Some(FailureKind::UpstreamUnavailable)
    );
    assert!(outcome.response.contains("temporarily unavailable"));
    assert_eq!(hops(&outcome.log), PAIR_AND_SUMMARY);
    drop(server_end);
}

#[tokio::test]
async fn test_failed_verification_blocks_dependent_intents() {
    let (_, tools) = seeded_tools();
    let outcome = router(tools.clone())
        .handle(Request::new("Look up customer 99 and show the ticket history"))
        .await;

    assert_eq!(outcome.shape, PlanShape::MultiStep);
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(
        outcome.results[0].failure().map(|f| f.kind),
        Some(FailureKind::ToolFailure)
    );
    assert_eq!(
        outcome.results[1].failure().map(|f| f.kind),
        Some(FailureKind::MissingPrerequisite)
    );
    // Only the lookup reached the tool server.
    assert_eq!(tools.call_count(), 1);
    assert_eq!(outcome.log[2].from, AgentRole::Router);
    assert_eq!(outcome.log[2].to, AgentRole::Router);
}

#[tokio::test]
async fn test_missing_customer_id_skips_without_dispatch() {
    let (_, tools) = seeded_tools();
    let outcome = router(tools.clone())
        .handle(Request::new("please show my ticket history"))
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(
        outcome.results[0].failure().map(|f| f.kind),
        Some(FailureKind::MissingPrerequisite)
    );
    assert_eq!(tools.call_count(), 0);
    assert!(outcome.response.contains("no customer ID was found"));
}

#[tokio::test]
async fn test_hint_customer_id_is_used() {
    let (_, tools) = seeded_tools();
    let outcome = router(tools)
        .handle(Request::new("please show my ticket history").with_customer_id(5))
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert!(outcome.response.contains("Export to CSV is slow"));
}

#[tokio::test]
async fn test_escalation_creates_high_priority_ticket() {
    let (store, tools) = seeded_tools();
    let outcome = router(tools)
        .handle(Request::new(
            "I've been charged twice, please cancel my subscription. My ID is 7",
        ))
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert!(outcome.response.contains("high priority"));
    assert!(outcome.response.contains("within 24 hours"));

    let store = store.lock().unwrap();
    let ticket = store.tickets.last().unwrap();
    assert_eq!(ticket["customer_id"], 7);
    assert_eq!(ticket["priority"], json!(Priority::High));
}

#[tokio::test]
async fn test_open_tickets_request_states_limitation() {
    let (_, tools) = seeded_tools();
    let outcome = router(tools)
        .handle(Request::new(
            "Show me all active customers who have open tickets",
        ))
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert!(outcome.response.starts_with("I found 4 active customers:"));
    assert!(outcome.response.contains("open tickets"));
}

#[tokio::test]
async fn test_outcome_serializes_for_json_output() {
    let (_, tools) = seeded_tools();
    let outcome = router(tools)
        .handle(Request::new("Get customer information for ID 5"))
        .await;

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["status"], "completed");
    assert_eq!(value["intents"][0]["kind"], "lookup");
    assert_eq!(value["results"][0]["status"], "completed");
    assert_eq!(value["log"][0]["from"], "router");
}
