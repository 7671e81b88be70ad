//! Assessment and actor records.
//!
//! # Responsibility
//! - Define one dated recording session for a subject.
//! - Define the signed-in actor as far as core needs it (role only).
//! - Provide lifecycle helpers for soft-delete semantics.
//!
//! # Invariants
//! - An assessment belongs to exactly one subject.
//! - `is_deleted` is the source of truth for tombstone state.

use crate::model::id_from_str_or_int;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Remote assessment identifier.
pub type AssessmentId = String;
/// Remote subject (profile) identifier.
pub type SubjectId = String;

/// Assessment lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    /// Created but still being recorded.
    #[default]
    Draft,
    /// Closed by the operator.
    Finalized,
}

/// One dated recording session for a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(deserialize_with = "id_from_str_or_int")]
    pub id: AssessmentId,
    /// Serialized as `profile_id` to match the remote schema.
    #[serde(rename = "profile_id", deserialize_with = "id_from_str_or_int")]
    pub subject_id: SubjectId,
    /// Serialized as `assessment_date` (`YYYY-MM-DD`).
    #[serde(rename = "assessment_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub operator_name: Option<String>,
    #[serde(default)]
    pub operator_role: Option<String>,
    #[serde(default)]
    pub status: AssessmentStatus,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Assessment {
    /// Creates a draft assessment with no operator attribution.
    pub fn draft(
        id: impl Into<AssessmentId>,
        subject_id: impl Into<SubjectId>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            subject_id: subject_id.into(),
            date,
            operator_name: None,
            operator_role: None,
            status: AssessmentStatus::Draft,
            is_deleted: false,
        }
    }

    /// Marks this assessment as softly deleted.
    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
    }

    /// Clears soft delete flag.
    pub fn restore(&mut self) {
        self.is_deleted = false;
    }

    /// Returns whether this assessment takes part in aggregation by default.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    pub fn is_finalized(&self) -> bool {
        self.status == AssessmentStatus::Finalized
    }

    /// Both operator fields are present and not blank.
    pub fn has_operator_attribution(&self) -> bool {
        is_filled(self.operator_name.as_deref()) && is_filled(self.operator_role.as_deref())
    }
}

fn is_filled(value: Option<&str>) -> bool {
    value.is_some_and(|raw| !raw.trim().is_empty())
}

/// Actor role as reported by the session collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Editor,
    /// Any role core has no special rule for.
    #[serde(other)]
    Other,
}

/// The signed-in user, as far as core needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(deserialize_with = "id_from_str_or_int")]
    pub id: String,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub disclaimer_ack_at: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, username: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            role,
            disclaimer_ack_at: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
