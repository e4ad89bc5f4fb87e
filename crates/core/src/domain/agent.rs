use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::priority::{Priority, PriorityId};
use crate::errors::DomainError;
use crate::facts::{get_available_facts, FactDefinition, FactDerivation, FactRegistry};
use crate::guard::{
    count_conditions, translate_guard_json, used_fact_keys_json, GuardValidator, ROOT_PATH,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Orchestration {
    #[serde(default)]
    pub fact_definitions: Vec<FactDefinition>,
    #[serde(default)]
    pub priorities: Vec<Priority>,
}

/// Agent configuration as persisted by the console.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub id: AgentId,
    pub name: String,
    #[serde(default)]
    pub orchestration: Orchestration,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AgentValidationOptions {
    pub validator: GuardValidator,
    pub reject_core_overrides: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIssue {
    pub code: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityReport {
    pub priority_id: PriorityId,
    pub valid: bool,
    pub errors: Vec<String>,
    pub conditions: usize,
    pub summary: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentValidationReport {
    pub agent_id: AgentId,
    pub valid: bool,
    pub issues: Vec<AgentIssue>,
    pub priorities: Vec<PriorityReport>,
}

impl AgentConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, DomainError> {
        serde_json::from_str(raw).map_err(|error| DomainError::InvalidDocument(error.to_string()))
    }

    pub fn registry(&self) -> FactRegistry {
        get_available_facts(&self.orchestration.fact_definitions)
    }

    pub fn priority(&self, id: &str) -> Option<&Priority> {
        self.orchestration.priorities.iter().find(|priority| priority.id.0 == id)
    }

    /// Priorities whose guard mentions `fact`; shown before a custom fact is deleted.
    pub fn priorities_referencing(&self, fact: &str) -> Vec<&Priority> {
        self.orchestration
            .priorities
            .iter()
            .filter(|priority| {
                used_fact_keys_json(priority.guard.as_ref()).iter().any(|key| key == fact)
            })
            .collect()
    }

    pub fn validate(&self, options: &AgentValidationOptions) -> AgentValidationReport {
        self.validate_with(&self.registry(), options)
    }

    pub fn validate_with(
        &self,
        registry: &FactRegistry,
        options: &AgentValidationOptions,
    ) -> AgentValidationReport {
        let mut issues = self.definition_issues(registry);

        if options.reject_core_overrides {
            for fact in registry.overridden_core_facts() {
                issues.push(AgentIssue {
                    code: "CORE_FACT_OVERRIDE".to_string(),
                    message: format!("Custom fact `{fact}` replaces a core fact"),
                });
            }
        }

        let mut seen_priority_ids = HashSet::new();
        for priority in &self.orchestration.priorities {
            if !seen_priority_ids.insert(priority.id.0.as_str()) {
                issues.push(AgentIssue {
                    code: "DUPLICATE_PRIORITY_ID".to_string(),
                    message: format!("Duplicate priority id: {}", priority.id.0),
                });
            }
        }

        let priorities: Vec<PriorityReport> = self
            .orchestration
            .priorities
            .iter()
            .map(|priority| validate_priority(priority, registry, &options.validator))
            .collect();

        let valid = issues.is_empty() && priorities.iter().all(|report| report.valid);
        AgentValidationReport { agent_id: self.id.clone(), valid, issues, priorities }
    }

    /// Same report as [`AgentConfig::validate_with`], plus one audit event per
    /// agent issue, one per rejected guard and a closing verdict event.
    pub fn validate_with_audit<S>(
        &self,
        registry: &FactRegistry,
        options: &AgentValidationOptions,
        sink: &S,
        audit: &AuditContext,
    ) -> AgentValidationReport
    where
        S: AuditSink,
    {
        let report = self.validate_with(registry, options);

        for issue in &report.issues {
            sink.emit(
                AuditEvent::new(
                    audit,
                    "validation.agent_issue",
                    AuditCategory::Validation,
                    AuditOutcome::Rejected,
                )
                .with_metadata("code", issue.code.clone())
                .with_metadata("message", issue.message.clone()),
            );
        }

        for priority in report.priorities.iter().filter(|priority| !priority.valid) {
            sink.emit(
                AuditEvent::new(
                    audit,
                    "validation.guard_rejected",
                    AuditCategory::Validation,
                    AuditOutcome::Rejected,
                )
                .with_metadata("priority_id", priority.priority_id.0.clone())
                .with_metadata("errors", priority.errors.join("; ")),
            );
        }

        let (event_type, outcome) = if report.valid {
            ("validation.agent_valid", AuditOutcome::Success)
        } else {
            ("validation.agent_invalid", AuditOutcome::Rejected)
        };
        sink.emit(
            AuditEvent::new(audit, event_type, AuditCategory::Validation, outcome)
                .with_metadata("priorities", report.priorities.len().to_string())
                .with_metadata("issues", report.issues.len().to_string()),
        );

        report
    }

    fn definition_issues(&self, registry: &FactRegistry) -> Vec<AgentIssue> {
        let mut issues = Vec::new();
        let mut seen_names = HashSet::new();

        for definition in &self.orchestration.fact_definitions {
            let name = definition.name.trim();
            if name.is_empty() {
                issues.push(AgentIssue {
                    code: "MISSING_FACT_NAME".to_string(),
                    message: format!(
                        "A `{}` fact definition has no name",
                        definition.derivation.as_str()
                    ),
                });
                continue;
            }

            if !seen_names.insert(name) {
                issues.push(AgentIssue {
                    code: "DUPLICATE_FACT_DEFINITION".to_string(),
                    message: format!("Custom fact `{name}` is defined more than once"),
                });
            }

            if definition.derivation == FactDerivation::Composite {
                for condition in &definition.conditions {
                    if !registry.contains(&condition.fact) {
                        issues.push(AgentIssue {
                            code: "UNKNOWN_COMPOSITE_FACT".to_string(),
                            message: format!(
                                "Composite fact `{name}` references unknown fact `{}`",
                                condition.fact
                            ),
                        });
                    }
                }
            }
        }

        issues
    }
}

fn validate_priority(
    priority: &Priority,
    registry: &FactRegistry,
    validator: &GuardValidator,
) -> PriorityReport {
    let validation = validator.validate_json(priority.guard.as_ref(), ROOT_PATH, registry);
    let mut errors = validation.errors;
    let mut conditions = 0;

    if errors.is_empty() {
        match priority.guard_expression() {
            Ok(guard) => conditions = count_conditions(guard.as_ref()),
            Err(error) => errors.push(format!("{ROOT_PATH}: {error}")),
        }
    }

    PriorityReport {
        priority_id: priority.id.clone(),
        valid: errors.is_empty(),
        errors,
        conditions,
        summary: translate_guard_json(priority.guard.as_ref(), registry),
    }
}
