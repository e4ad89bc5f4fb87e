use serde::{Deserialize, Serialize};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::agent::AgentConfig;
use crate::domain::priority::{Priority, PriorityId};
use crate::facts::{FactRegistry, FactSnapshot};
use crate::guard::{evaluate_guard, translate_guard_json, GuardValidator, ROOT_PATH};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityOutcome {
    Unconditional,
    GuardPassed,
    GuardFailed,
    InvalidGuard,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityDecision {
    pub priority_id: PriorityId,
    pub eligible: bool,
    pub outcome: EligibilityOutcome,
    pub summary: String,
    pub errors: Vec<String>,
}

/// Gates priorities at conversation time. A guard that does not validate
/// against the agent's registry never makes its priority eligible.
#[derive(Clone, Copy, Debug, Default)]
pub struct EligibilityEngine {
    validator: GuardValidator,
}

impl EligibilityEngine {
    pub fn new(validator: GuardValidator) -> Self {
        Self { validator }
    }

    pub fn evaluate(
        &self,
        agent: &AgentConfig,
        registry: &FactRegistry,
        snapshot: &FactSnapshot,
    ) -> Vec<PriorityDecision> {
        agent
            .orchestration
            .priorities
            .iter()
            .map(|priority| self.decide(priority, registry, snapshot))
            .collect()
    }

    pub fn eligible_priorities<'a>(
        &self,
        agent: &'a AgentConfig,
        registry: &FactRegistry,
        snapshot: &FactSnapshot,
    ) -> Vec<&'a Priority> {
        agent
            .orchestration
            .priorities
            .iter()
            .filter(|priority| self.decide(priority, registry, snapshot).eligible)
            .collect()
    }

    pub fn evaluate_with_audit<S>(
        &self,
        agent: &AgentConfig,
        registry: &FactRegistry,
        snapshot: &FactSnapshot,
        sink: &S,
        audit: &AuditContext,
    ) -> Vec<PriorityDecision>
    where
        S: AuditSink,
    {
        let decisions = self.evaluate(agent, registry, snapshot);
        for decision in &decisions {
            let (event_type, outcome) = match decision.outcome {
                EligibilityOutcome::Unconditional | EligibilityOutcome::GuardPassed => {
                    ("eligibility.priority_eligible", AuditOutcome::Success)
                }
                EligibilityOutcome::GuardFailed => {
                    ("eligibility.priority_blocked", AuditOutcome::Rejected)
                }
                EligibilityOutcome::InvalidGuard => ("eligibility.guard_invalid", AuditOutcome::Failed),
            };

            let mut event = AuditEvent::new(audit, event_type, AuditCategory::Eligibility, outcome)
                .with_metadata("priority_id", decision.priority_id.0.clone())
                .with_metadata("summary", decision.summary.clone());
            if !decision.errors.is_empty() {
                event = event.with_metadata("errors", decision.errors.join("; "));
            }
            sink.emit(event);
        }
        decisions
    }

    fn decide(
        &self,
        priority: &Priority,
        registry: &FactRegistry,
        snapshot: &FactSnapshot,
    ) -> PriorityDecision {
        let summary = translate_guard_json(priority.guard.as_ref(), registry);
        let validation = self.validator.validate_json(priority.guard.as_ref(), ROOT_PATH, registry);

        let decision = |eligible, outcome, errors| PriorityDecision {
            priority_id: priority.id.clone(),
            eligible,
            outcome,
            summary: summary.clone(),
            errors,
        };

        if !validation.valid {
            tracing::warn!(
                event_name = "eligibility.guard_invalid",
                priority_id = %priority.id.0,
                errors = validation.errors.len(),
                "priority guard failed validation; treating as not eligible"
            );
            return decision(false, EligibilityOutcome::InvalidGuard, validation.errors);
        }

        match priority.guard_expression() {
            Ok(None) => decision(true, EligibilityOutcome::Unconditional, Vec::new()),
            Ok(Some(guard)) => {
                if evaluate_guard(Some(&guard), snapshot) {
                    decision(true, EligibilityOutcome::GuardPassed, Vec::new())
                } else {
                    decision(false, EligibilityOutcome::GuardFailed, Vec::new())
                }
            }
            Err(error) => decision(
                false,
                EligibilityOutcome::InvalidGuard,
                vec![format!("{ROOT_PATH}: {error}")],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{EligibilityEngine, EligibilityOutcome};
    use crate::audit::{AuditContext, AuditOutcome, InMemoryAuditSink};
    use crate::domain::agent::{AgentConfig, AgentId};
    use crate::facts::{FactResolver, FactSnapshot};

    fn agent() -> AgentConfig {
        serde_json::from_value(json!({
            "id": "agent-valencia",
            "name": "Asistente Valencia",
            "orchestration": {
                "factDefinitions": [
                    { "name": "wants_garden", "type": "equals", "field": "search.garden", "value": true }
                ],
                "priorities": [
                    { "id": "greet", "name": "Saludar" },
                    { "id": "offer-houses", "name": "Ofrecer casas",
                      "guard": { "all": [{ "eq": ["operation_type", "SELL"] }, { "eq": ["wants_garden", true] }] } },
                    { "id": "rentals", "name": "Alquileres",
                      "guard": { "eq": ["operation_type", "RENT"] } },
                    { "id": "broken", "name": "Roto", "guard": { "exists": "ghost" } }
                ]
            }
        }))
        .expect("agent fixture should parse")
    }

    #[test]
    fn decisions_follow_priority_order() {
        let agent = agent();
        let registry = agent.registry();
        let snapshot = FactResolver::new().resolve(
            &agent.orchestration.fact_definitions,
            FactSnapshot::new().with("operation_type", "SELL"),
            &json!({ "search": { "garden": true } }),
        );

        let decisions = EligibilityEngine::default().evaluate(&agent, &registry, &snapshot);
        let outcomes: Vec<_> = decisions.iter().map(|decision| decision.outcome).collect();

        assert_eq!(
            outcomes,
            vec![
                EligibilityOutcome::Unconditional,
                EligibilityOutcome::GuardPassed,
                EligibilityOutcome::GuardFailed,
                EligibilityOutcome::InvalidGuard,
            ]
        );
        assert!(!decisions[3].eligible);
        assert_eq!(decisions[3].errors.len(), 1);

        let eligible: Vec<&str> = EligibilityEngine::default()
            .eligible_priorities(&agent, &registry, &snapshot)
            .into_iter()
            .map(|priority| priority.id.0.as_str())
            .collect();
        assert_eq!(eligible, vec!["greet", "offer-houses"]);
    }

    #[test]
    fn audit_records_one_event_per_priority() {
        let agent = agent();
        let sink = InMemoryAuditSink::default();
        let context = AuditContext::new(
            Some(AgentId("agent-valencia".to_owned())),
            Some("conv-77".to_owned()),
            "req-9",
            "eligibility-engine",
        );

        EligibilityEngine::default().evaluate_with_audit(
            &agent,
            &agent.registry(),
            &FactSnapshot::new().with("operation_type", "RENT"),
            &sink,
            &context,
        );

        let events = sink.events();
        let types: Vec<&str> = events.iter().map(|event| event.event_type.as_str()).collect();
        assert_eq!(
            types,
            vec![
                "eligibility.priority_eligible",
                "eligibility.priority_blocked",
                "eligibility.priority_eligible",
                "eligibility.guard_invalid",
            ]
        );
        assert_eq!(events[3].outcome, AuditOutcome::Failed);
        assert!(events[3].metadata.contains_key("errors"));
        assert!(events.iter().all(|event| event.correlation_id == "req-9"));
    }
}
