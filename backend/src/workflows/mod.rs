// Workflow Automation Engine
//
// Event-driven automation for the Triage service desk. Evaluates
// tenant-configured rules against an entity snapshot when a lifecycle
// trigger fires and executes the actions of every matching rule.

pub mod actions;
pub mod conditions;
pub mod engine;
pub mod executor;
pub mod rules;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use actions::{ActionResult, ActionType, WorkflowAction};
pub use conditions::{
    evaluate_condition, evaluate_conditions, ConditionOperator, LogicalOperator, WorkflowCondition,
};
pub use engine::{ExecutionResult, WorkflowEngine, WorkflowError};
pub use executor::WorkflowExecutor;
pub use rules::WorkflowRule;
pub use store::{CachedRuleStore, PgRuleStore, RuleCache, RuleStore, StoreError};
