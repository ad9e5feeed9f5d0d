//! Router Agent.
//!
//! Entry point for every request. Extracts the ordered intents, hands each
//! one to the Data Agent in turn, records every hand-off in a per-request
//! A2A log and finally asks the Support Agent for the reply. Holds no
//! per-request state between calls, so one router serves any number of
//! concurrent requests.

mod extract;
mod intent;
mod outcome;
mod request;

#[cfg(test)]
mod tests;

pub use extract::extract;
pub use intent::{Intent, IntentKind, PlanShape};
pub use outcome::{IntentOutcome, OutcomeStatus, RouterOutcome};
pub use request::{Request, RequestHints};

use crate::a2a::{A2aLog, AgentRole};
use crate::agents::{CLARIFICATION, CustomerId, DataAgent, SupportAgent, describe_record};
use crate::config::RouterConfig;
use crate::error::{FailureKind, IntentFailure};
use crate::protocol::ToolTransport;
use crate::utils::summarize_args;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

pub struct Router {
    data: DataAgent,
    support: SupportAgent,
    config: RouterConfig,
}

impl Router {
    pub fn new(tools: Arc<dyn ToolTransport>) -> Self {
        Self::with_config(tools, RouterConfig::default())
    }

    pub fn with_config(tools: Arc<dyn ToolTransport>, config: RouterConfig) -> Self {
        Self {
            data: DataAgent::new(tools),
            support: SupportAgent::new(),
            config,
        }
    }

    /// Serve one request end to end. Never fails: every problem ends up in
    /// the outcome's result slots and in the reply text.
    pub async fn handle(&self, request: Request) -> RouterOutcome {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("request", id = %request_id);
        self.run(request_id, request).instrument(span).await
    }

    async fn run(&self, request_id: Uuid, request: Request) -> RouterOutcome {
        let intents = extract(&request);
        let shape = PlanShape::of(&intents);
        tracing::info!("Router: {} intent(s), {}", intents.len(), shape);

        if shape == PlanShape::Unparsed {
            tracing::info!("Router: no intent recognized, asking for clarification");
            let results = intents
                .iter()
                .map(|_| {
                    IntentOutcome::failed(IntentFailure::new(
                        FailureKind::ParseFailure,
                        "no intent recognized",
                    ))
                })
                .collect();
            return RouterOutcome {
                request_id,
                status: OutcomeStatus::Clarification,
                shape,
                response: CLARIFICATION.to_string(),
                intents,
                results,
                log: Vec::new(),
            };
        }

        let mut log = A2aLog::new();
        let mut results = Vec::with_capacity(intents.len());
        let mut unverified: HashSet<CustomerId> = HashSet::new();
        let mut blocked = false;

        for (index, intent) in intents.iter().enumerate() {
            let outcome = match intent.customer_id() {
                Some(id) if unverified.contains(&id) => {
                    blocked = true;
                    self.skip(
                        intent,
                        IntentFailure::missing(format!("customer #{} could not be verified", id)),
                        &mut log,
                    )
                }
                _ => self.dispatch(intent, &mut log).await,
            };

            if !outcome.is_completed() {
                tracing::warn!("Router: intent {} ({}) failed", index + 1, intent.kind());
                if intent.is_verification()
                    && let Some(id) = intent.customer_id()
                {
                    unverified.insert(id);
                }
            }
            results.push(outcome);
        }

        log.append(
            AgentRole::Router,
            AgentRole::SupportAgent,
            format!("requesting summary of {} intent(s)", intents.len()),
        );
        let response = self.support.summarize(&intents, &results);
        log.append(
            AgentRole::SupportAgent,
            AgentRole::Router,
            format!("returning response ({} chars)", response.chars().count()),
        );

        let status = overall_status(&results, blocked);
        tracing::info!("Router: request {} with {} A2A messages", status, log.len());

        RouterOutcome {
            request_id,
            status,
            shape,
            response,
            intents,
            results,
            log: log.into_entries(),
        }
    }

    /// One Data Agent round trip for one intent.
    async fn dispatch(&self, intent: &Intent, log: &mut A2aLog) -> IntentOutcome {
        let request = match intent.data_request(&self.config) {
            Ok(request) => request,
            Err(reason) => return self.skip(intent, IntentFailure::missing(reason), log),
        };

        log.append(
            AgentRole::Router,
            AgentRole::DataAgent,
            format!(
                "requesting {}({})",
                request.tool(),
                summarize_args(&request.arguments())
            ),
        );

        match self.data.execute(&request).await {
            Ok(record) => {
                log.append(
                    AgentRole::DataAgent,
                    AgentRole::Router,
                    format!("returning {}", describe_record(&record)),
                );
                IntentOutcome::Completed { record }
            }
            Err(e) => {
                log.append(
                    AgentRole::DataAgent,
                    AgentRole::Router,
                    format!("returning error: {}", e),
                );
                IntentOutcome::failed(e.into())
            }
        }
    }

    fn skip(&self, intent: &Intent, failure: IntentFailure, log: &mut A2aLog) -> IntentOutcome {
        tracing::info!("Router: skipping {} intent: {}", intent.kind(), failure.message);
        log.append(
            AgentRole::Router,
            AgentRole::Router,
            format!("skipping {}: {}", intent.kind(), failure.message),
        );
        IntentOutcome::failed(failure)
    }
}

/// Failed when nothing succeeded or a verification blocked later intents.
fn overall_status(results: &[IntentOutcome], blocked: bool) -> OutcomeStatus {
    let completed = results.iter().filter(|r| r.is_completed()).count();
    if blocked || completed == 0 {
        OutcomeStatus::Failed
    } else if completed < results.len() {
        OutcomeStatus::Partial
    } else {
        OutcomeStatus::Completed
    }
}
