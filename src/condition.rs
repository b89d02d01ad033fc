//! Condition Evaluator - Pure Visibility Predicates
//!
//! No I/O, no mutation, never panics. Absent state values evaluate
//! as empty; schema-level reference problems are handled upstream
//! during normalization.

use crate::descriptor::{Condition, ConditionAction, ConditionKind, FieldValue, FormState};

/// Evaluate one condition against the current form state.
pub fn evaluate(condition: &Condition, state: &FormState) -> bool {
    let current = state.get(&condition.field);
    let empty = current.map_or(true, FieldValue::is_empty);

    match condition.kind {
        ConditionKind::IsEmpty => empty,
        ConditionKind::IsFilled => !empty,
        ConditionKind::Contains => stringify(current).contains(&condition.value),
        ConditionKind::NotContains => !stringify(current).contains(&condition.value),
        ConditionKind::Equals => stringify(current) == condition.value,
        ConditionKind::NotEqual => stringify(current) != condition.value,
    }
}

/// Visibility of a field given all of its conditions.
///
/// A field with no conditions is always visible. Each condition
/// contributes `show -> satisfied`, `hide -> !satisfied`; the
/// contributions are AND-ed.
pub fn is_visible(conditions: &[Condition], state: &FormState) -> bool {
    conditions.iter().all(|condition| {
        let satisfied = evaluate(condition, state);
        match condition.action {
            ConditionAction::Show => satisfied,
            ConditionAction::Hide => !satisfied,
        }
    })
}

fn stringify(value: Option<&FieldValue>) -> String {
    value.map(FieldValue::to_text).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(field: &str, action: ConditionAction, kind: ConditionKind, value: &str) -> Condition {
        Condition {
            field: field.to_string(),
            action,
            kind,
            value: value.to_string(),
        }
    }

    fn state_with(key: &str, value: FieldValue) -> FormState {
        let mut state = FormState::new();
        state.insert(key.to_string(), value);
        state
    }

    #[test]
    fn is_empty_semantics() {
        let c = cond("a", ConditionAction::Show, ConditionKind::IsEmpty, "");

        // Absent key, empty string, empty list and false are all empty.
        assert!(evaluate(&c, &FormState::new()));
        assert!(evaluate(&c, &state_with("a", FieldValue::Text(String::new()))));
        assert!(evaluate(&c, &state_with("a", FieldValue::Files(vec![]))));
        assert!(evaluate(&c, &state_with("a", FieldValue::Bool(false))));
        assert!(evaluate(&c, &state_with("a", FieldValue::Null)));

        assert!(!evaluate(&c, &state_with("a", FieldValue::Text("x".into()))));
        assert!(!evaluate(&c, &state_with("a", FieldValue::Bool(true))));
        assert!(!evaluate(&c, &state_with("a", FieldValue::Files(vec!["f1".into()]))));
    }

    #[test]
    fn is_filled_negates_is_empty() {
        let c = cond("a", ConditionAction::Show, ConditionKind::IsFilled, "");
        assert!(!evaluate(&c, &FormState::new()));
        assert!(evaluate(&c, &state_with("a", FieldValue::Text("x".into()))));
    }

    #[test]
    fn contains_is_case_sensitive() {
        let c = cond("a", ConditionAction::Show, ConditionKind::Contains, "Ab");
        assert!(evaluate(&c, &state_with("a", FieldValue::Text("xAby".into()))));
        assert!(!evaluate(&c, &state_with("a", FieldValue::Text("xaby".into()))));

        let n = cond("a", ConditionAction::Show, ConditionKind::NotContains, "Ab");
        assert!(evaluate(&n, &state_with("a", FieldValue::Text("xaby".into()))));
    }

    #[test]
    fn equals_compares_stringified_values() {
        let c = cond("a", ConditionAction::Show, ConditionKind::Equals, "true");
        assert!(evaluate(&c, &state_with("a", FieldValue::Bool(true))));
        assert!(!evaluate(&c, &state_with("a", FieldValue::Bool(false))));

        let n = cond("a", ConditionAction::Show, ConditionKind::NotEqual, "x");
        assert!(evaluate(&n, &state_with("a", FieldValue::Text("y".into()))));
        assert!(!evaluate(&n, &state_with("a", FieldValue::Text("x".into()))));
    }

    #[test]
    fn hide_action_inverts_visibility() {
        let conds = vec![cond("a", ConditionAction::Hide, ConditionKind::Equals, "x")];
        assert!(!is_visible(&conds, &state_with("a", FieldValue::Text("x".into()))));
        assert!(is_visible(&conds, &state_with("a", FieldValue::Text("y".into()))));
    }

    #[test]
    fn no_conditions_means_visible() {
        assert!(is_visible(&[], &FormState::new()));
    }

    #[test]
    fn multiple_conditions_are_anded() {
        let conds = vec![
            cond("a", ConditionAction::Show, ConditionKind::IsFilled, ""),
            cond("b", ConditionAction::Show, ConditionKind::Equals, "yes"),
        ];

        let mut state = state_with("a", FieldValue::Text("x".into()));
        assert!(!is_visible(&conds, &state));

        state.insert("b".to_string(), FieldValue::Text("yes".into()));
        assert!(is_visible(&conds, &state));
    }
}
