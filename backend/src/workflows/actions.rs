// Workflow Actions - action model for matched rules

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Side-effecting operations a matched rule can perform.
///
/// Kinds arrive as strings from the rule store; an unrecognized kind lands
/// in [`ActionType::Other`] so the executor can report it by name instead
/// of the rule failing to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    SetField,
    AssignToUser,
    AssignToGroup,
    ChangeStatus,
    ChangePriority,
    AddComment,
    SendNotification,
    Escalate,
    Other(String),
}

impl ActionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::SetField => "set_field",
            Self::AssignToUser => "assign_to_user",
            Self::AssignToGroup => "assign_to_group",
            Self::ChangeStatus => "change_status",
            Self::ChangePriority => "change_priority",
            Self::AddComment => "add_comment",
            Self::SendNotification => "send_notification",
            Self::Escalate => "escalate",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ActionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "set_field" => Self::SetField,
            "assign_to_user" => Self::AssignToUser,
            "assign_to_group" => Self::AssignToGroup,
            "change_status" => Self::ChangeStatus,
            "change_priority" => Self::ChangePriority,
            "add_comment" => Self::AddComment,
            "send_notification" => Self::SendNotification,
            "escalate" => Self::Escalate,
            _ => Self::Other(value),
        }
    }
}

impl From<ActionType> for String {
    fn from(action_type: ActionType) -> Self {
        action_type.as_str().to_string()
    }
}

/// An action executed when its rule matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowAction {
    pub action_type: ActionType,
    /// Shape depends on the action type; the executor reads the keys it
    /// needs and fails the action on missing ones.
    #[serde(default)]
    pub parameters: serde_json::Value,
    /// Execution order within the rule.
    #[serde(default)]
    pub order: i32,
}

impl WorkflowAction {
    pub fn new(action_type: ActionType, parameters: serde_json::Value) -> Self {
        Self {
            action_type,
            parameters,
            order: 0,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn set_field(field: &str, value: serde_json::Value) -> Self {
        Self::new(ActionType::SetField, json!({ "field": field, "value": value }))
    }

    pub fn assign_to_user(user_id: &str) -> Self {
        Self::new(ActionType::AssignToUser, json!({ "userId": user_id }))
    }

    pub fn assign_to_group(group_id: &str) -> Self {
        Self::new(ActionType::AssignToGroup, json!({ "groupId": group_id }))
    }

    pub fn change_status(status: &str) -> Self {
        Self::new(ActionType::ChangeStatus, json!({ "status": status }))
    }

    pub fn change_priority(priority: &str) -> Self {
        Self::new(ActionType::ChangePriority, json!({ "priority": priority }))
    }

    pub fn add_comment(comment: &str, is_internal: bool) -> Self {
        Self::new(
            ActionType::AddComment,
            json!({ "comment": comment, "isInternal": is_internal }),
        )
    }

    pub fn send_notification(recipient_ids: Vec<String>, message: &str) -> Self {
        Self::new(
            ActionType::SendNotification,
            json!({ "recipientIds": recipient_ids, "message": message }),
        )
    }

    pub fn escalate(level: i64) -> Self {
        Self::new(ActionType::Escalate, json!({ "escalationLevel": level }))
    }
}

/// Result of executing a single action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub error: Option<String>,
}

impl ActionResult {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_type_round_trips_through_strings() {
        let parsed: ActionType = serde_json::from_str("\"assign_to_user\"").unwrap();
        assert_eq!(parsed, ActionType::AssignToUser);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"assign_to_user\"");

        let unknown: ActionType = serde_json::from_str("\"summon_intern\"").unwrap();
        assert_eq!(unknown, ActionType::Other("summon_intern".to_string()));
        assert_eq!(unknown.as_str(), "summon_intern");
    }

    #[test]
    fn action_builder() {
        let action = WorkflowAction::change_priority("high").with_order(2);
        assert_eq!(action.action_type, ActionType::ChangePriority);
        assert_eq!(action.parameters["priority"], "high");
        assert_eq!(action.order, 2);
    }

    #[test]
    fn action_result_constructors() {
        let ok = ActionResult::success();
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = ActionResult::failure("database connection lost");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("database connection lost"));
    }

    #[test]
    fn actions_deserialize_from_rule_json() {
        let actions: Vec<WorkflowAction> = serde_json::from_value(json!([
            { "action_type": "change_status", "parameters": { "status": "assigned" }, "order": 1 },
            { "action_type": "add_comment", "parameters": { "comment": "auto" } }
        ]))
        .unwrap();

        assert_eq!(actions[0].action_type, ActionType::ChangeStatus);
        assert_eq!(actions[1].order, 0);
    }
}
