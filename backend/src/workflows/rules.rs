// Workflow rule model. Rules are created and edited by the external rule
// management service; this engine only reads them.

use serde::{Deserialize, Serialize};
use triage_shared::{EntityType, TriggerType};
use uuid::Uuid;

use super::{WorkflowAction, WorkflowCondition};

/// A named, ordered condition set plus ordered action list, scoped to one
/// entity type and trigger type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRule {
    pub id: Uuid,
    pub name: String,
    pub entity_type: EntityType,
    pub trigger_type: TriggerType,
    pub is_active: bool,
    #[serde(default)]
    pub conditions: Vec<WorkflowCondition>,
    #[serde(default)]
    pub actions: Vec<WorkflowAction>,
    /// Global ordering across rules for one entity type; lower runs first.
    pub execution_order: i32,
    /// Halt evaluation of lower-priority rules once this rule matches.
    #[serde(default)]
    pub stop_on_match: bool,
}

impl WorkflowRule {
    pub fn new(name: &str, entity_type: EntityType, trigger_type: TriggerType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            entity_type,
            trigger_type,
            is_active: true,
            conditions: Vec::new(),
            actions: Vec::new(),
            execution_order: 0,
            stop_on_match: false,
        }
    }

    pub fn with_conditions(mut self, conditions: Vec<WorkflowCondition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_actions(mut self, actions: Vec<WorkflowAction>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_execution_order(mut self, order: i32) -> Self {
        self.execution_order = order;
        self
    }

    pub fn stop_on_match(mut self) -> Self {
        self.stop_on_match = true;
        self
    }

    /// Actions in ascending execution order. The sort is stable, so actions
    /// sharing an order keep their configured sequence.
    pub fn ordered_actions(&self) -> Vec<&WorkflowAction> {
        let mut actions: Vec<&WorkflowAction> = self.actions.iter().collect();
        actions.sort_by_key(|action| action.order);
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::ActionType;

    #[test]
    fn rule_builder_defaults() {
        let rule = WorkflowRule::new("Auto-assign", EntityType::Issue, TriggerType::OnCreate);
        assert!(rule.is_active);
        assert!(!rule.stop_on_match);
        assert!(rule.conditions.is_empty());
        assert_eq!(rule.execution_order, 0);
    }

    #[test]
    fn ordered_actions_sorts_ascending_and_stable() {
        let rule = WorkflowRule::new("Ordering", EntityType::Issue, TriggerType::OnCreate)
            .with_actions(vec![
                WorkflowAction::change_status("assigned").with_order(5),
                WorkflowAction::add_comment("first of the ties", true).with_order(1),
                WorkflowAction::add_comment("second of the ties", true).with_order(1),
            ]);

        let ordered = rule.ordered_actions();
        assert_eq!(ordered[0].action_type, ActionType::AddComment);
        assert_eq!(ordered[0].parameters["comment"], "first of the ties");
        assert_eq!(ordered[1].parameters["comment"], "second of the ties");
        assert_eq!(ordered[2].action_type, ActionType::ChangeStatus);
    }
}
