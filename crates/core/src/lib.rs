pub mod audit;
pub mod config;
pub mod domain;
pub mod eligibility;
pub mod errors;
pub mod facts;
pub mod guard;

pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat};
pub use domain::agent::{AgentConfig, AgentId, AgentValidationOptions, AgentValidationReport};
pub use domain::priority::{GuardMode, Priority, PriorityId};
pub use eligibility::{EligibilityEngine, EligibilityOutcome, PriorityDecision};
pub use errors::{ApplicationError, DomainError};
pub use facts::{
    get_available_facts, FactDefinition, FactMeta, FactRegistry, FactRegistryCache, FactResolver,
    FactSnapshot,
};
pub use guard::{
    evaluate_guard, translate_guard, validate_guard, FactValue, GuardExpression, GuardValidation,
    GuardValidator,
};
