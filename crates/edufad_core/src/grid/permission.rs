//! Permission gate for response edits.
//!
//! Admin edits must be attributable to a named operator: until the
//! assessment carries both an operator name and an operator role, an admin
//! cannot record any item response. Every other role may always edit.

use crate::model::assessment::{Actor, Assessment, Role};

/// Notice shown while the gate is closed. It cannot be dismissed.
pub const OPERATOR_REQUIRED_NOTICE: &str =
    "Enter the operator name and role for this assessment before recording responses.";

/// Result of evaluating the gate for one actor/assessment pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditGate {
    Open,
    /// Edits blocked; the notice must stay visible and inputs disabled.
    Closed { notice: &'static str },
}

impl EditGate {
    pub fn evaluate(actor: &Actor, assessment: &Assessment) -> Self {
        if can_edit(actor, assessment) {
            Self::Open
        } else {
            Self::Closed {
                notice: OPERATOR_REQUIRED_NOTICE,
            }
        }
    }

    pub fn is_open(self) -> bool {
        self == Self::Open
    }

    pub fn notice(self) -> Option<&'static str> {
        match self {
            Self::Open => None,
            Self::Closed { notice } => Some(notice),
        }
    }
}

/// Whether `actor` may edit responses of `assessment` right now.
pub fn can_edit(actor: &Actor, assessment: &Assessment) -> bool {
    match actor.role {
        Role::Admin => assessment.has_operator_attribution(),
        Role::Editor | Role::Other => true,
    }
}

#[cfg(test)]
mod tests {
    use super::{can_edit, EditGate, OPERATOR_REQUIRED_NOTICE};
    use crate::model::assessment::{Actor, Assessment, Role};
    use chrono::NaiveDate;

    fn assessment(name: &str, role: &str) -> Assessment {
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).expect("valid date");
        let mut assessment = Assessment::draft("1", "s1", date);
        assessment.operator_name = Some(name.to_string());
        assessment.operator_role = Some(role.to_string());
        assessment
    }

    #[test]
    fn admin_is_blocked_until_operator_name_is_set() {
        let admin = Actor::new("1", "admin", Role::Admin);
        let mut target = assessment("", "X");
        assert!(!can_edit(&admin, &target));

        target.operator_name = Some("Y".to_string());
        assert!(can_edit(&admin, &target));
    }

    #[test]
    fn admin_is_blocked_when_role_is_missing() {
        let admin = Actor::new("1", "admin", Role::Admin);
        let mut target = assessment("Y", "");
        target.operator_role = None;
        assert!(!can_edit(&admin, &target));
    }

    #[test]
    fn editor_is_always_allowed() {
        let editor = Actor::new("2", "editor1", Role::Editor);
        assert!(can_edit(&editor, &assessment("", "")));
    }

    #[test]
    fn closed_gate_carries_notice() {
        let admin = Actor::new("1", "admin", Role::Admin);
        let gate = EditGate::evaluate(&admin, &assessment("", ""));
        assert!(!gate.is_open());
        assert_eq!(gate.notice(), Some(OPERATOR_REQUIRED_NOTICE));
    }
}
