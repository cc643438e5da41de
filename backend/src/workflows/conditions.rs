// Workflow Conditions - condition model and evaluation

use serde::{Deserialize, Serialize};
use triage_shared::{EntitySnapshot, FieldValue};

/// Comparison operators available to rule conditions.
///
/// Operators arrive as strings from the rule store; anything this engine
/// version does not recognize lands in [`ConditionOperator::Unknown`] and
/// never matches, rather than rejecting the whole rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
    InList,
    NotInList,
    Unknown(String),
}

impl ConditionOperator {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::IsEmpty => "is_empty",
            Self::IsNotEmpty => "is_not_empty",
            Self::InList => "in_list",
            Self::NotInList => "not_in_list",
            Self::Unknown(s) => s,
        }
    }
}

impl From<String> for ConditionOperator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "equals" => Self::Equals,
            "not_equals" => Self::NotEquals,
            "contains" => Self::Contains,
            "not_contains" => Self::NotContains,
            "starts_with" => Self::StartsWith,
            "ends_with" => Self::EndsWith,
            "greater_than" => Self::GreaterThan,
            "less_than" => Self::LessThan,
            "is_empty" => Self::IsEmpty,
            "is_not_empty" => Self::IsNotEmpty,
            "in_list" => Self::InList,
            "not_in_list" => Self::NotInList,
            _ => Self::Unknown(value),
        }
    }
}

impl From<ConditionOperator> for String {
    fn from(operator: ConditionOperator) -> Self {
        operator.as_str().to_string()
    }
}

/// How a condition joins with the condition before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

/// One comparison of a snapshot field against a configured value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowCondition {
    /// Field name to look up in the entity snapshot.
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: FieldValue,
    /// Join with the previous condition; irrelevant on the first condition.
    #[serde(default)]
    pub logical_operator: LogicalOperator,
}

impl WorkflowCondition {
    pub fn new(field: &str, operator: ConditionOperator, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value: value.into(),
            logical_operator: LogicalOperator::And,
        }
    }

    pub fn equals(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::new(field, ConditionOperator::Equals, value)
    }

    pub fn not_equals(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::new(field, ConditionOperator::NotEquals, value)
    }

    pub fn contains(field: &str, value: &str) -> Self {
        Self::new(field, ConditionOperator::Contains, value)
    }

    pub fn greater_than(field: &str, value: f64) -> Self {
        Self::new(field, ConditionOperator::GreaterThan, value)
    }

    pub fn is_empty(field: &str) -> Self {
        Self::new(field, ConditionOperator::IsEmpty, FieldValue::Null)
    }

    pub fn in_list(field: &str, values: Vec<String>) -> Self {
        Self::new(field, ConditionOperator::InList, values)
    }

    /// Join this condition to the previous one with OR instead of AND.
    pub fn or(mut self) -> Self {
        self.logical_operator = LogicalOperator::Or;
        self
    }
}

/// Evaluate one condition against a snapshot. Deterministic, no side
/// effects, never fails: malformed values degrade to the operator-specific
/// default documented on each arm.
pub fn evaluate_condition(condition: &WorkflowCondition, snapshot: &EntitySnapshot) -> bool {
    let field = snapshot.get(&condition.field);

    match &condition.operator {
        ConditionOperator::Equals => field.map(|v| v == &condition.value).unwrap_or(false),
        ConditionOperator::NotEquals => !field.map(|v| v == &condition.value).unwrap_or(false),
        // Non-string fields never "contain" anything; the negated form
        // holds for them, so the pair is not a plain negation.
        ConditionOperator::Contains => string_pair(field, &condition.value)
            .map(|(s, pattern)| s.to_lowercase().contains(&pattern.to_lowercase()))
            .unwrap_or(false),
        ConditionOperator::NotContains => string_pair(field, &condition.value)
            .map(|(s, pattern)| !s.to_lowercase().contains(&pattern.to_lowercase()))
            .unwrap_or(true),
        ConditionOperator::StartsWith => string_pair(field, &condition.value)
            .map(|(s, pattern)| s.to_lowercase().starts_with(&pattern.to_lowercase()))
            .unwrap_or(false),
        ConditionOperator::EndsWith => string_pair(field, &condition.value)
            .map(|(s, pattern)| s.to_lowercase().ends_with(&pattern.to_lowercase()))
            .unwrap_or(false),
        ConditionOperator::GreaterThan => number_pair(field, &condition.value)
            .map(|(a, b)| a > b)
            .unwrap_or(false),
        ConditionOperator::LessThan => number_pair(field, &condition.value)
            .map(|(a, b)| a < b)
            .unwrap_or(false),
        ConditionOperator::IsEmpty => field.map(FieldValue::is_empty_value).unwrap_or(true),
        ConditionOperator::IsNotEmpty => field.map(|v| !v.is_empty_value()).unwrap_or(false),
        // Fail-closed for inclusion, fail-open for exclusion: a malformed
        // list value makes in_list always false and not_in_list always true.
        ConditionOperator::InList => match condition.value.as_list() {
            Some(list) => field
                .and_then(FieldValue::as_str)
                .map(|s| list.iter().any(|item| item == s))
                .unwrap_or(false),
            None => false,
        },
        ConditionOperator::NotInList => match condition.value.as_list() {
            Some(list) => field
                .and_then(FieldValue::as_str)
                .map(|s| !list.iter().any(|item| item == s))
                .unwrap_or(true),
            None => true,
        },
        ConditionOperator::Unknown(_) => false,
    }
}

/// Fold an ordered condition list into one boolean. An empty list places no
/// restriction on the entity. No operator precedence: `[A, B(AND), C(OR)]`
/// associates as `(A AND B) OR C`.
pub fn evaluate_conditions(conditions: &[WorkflowCondition], snapshot: &EntitySnapshot) -> bool {
    let Some((first, rest)) = conditions.split_first() else {
        return true;
    };

    let mut result = evaluate_condition(first, snapshot);
    for condition in rest {
        let matched = evaluate_condition(condition, snapshot);
        result = match condition.logical_operator {
            LogicalOperator::Or => result || matched,
            LogicalOperator::And => result && matched,
        };
    }
    result
}

fn string_pair<'a>(
    field: Option<&'a FieldValue>,
    value: &'a FieldValue,
) -> Option<(&'a str, &'a str)> {
    match (field.and_then(FieldValue::as_str), value.as_str()) {
        (Some(s), Some(pattern)) => Some((s, pattern)),
        _ => None,
    }
}

fn number_pair(field: Option<&FieldValue>, value: &FieldValue) -> Option<(f64, f64)> {
    match (field.and_then(FieldValue::as_number), value.as_number()) {
        (Some(a), Some(b)) => Some((a, b)),
        _ => None,
    }
}
