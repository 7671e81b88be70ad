//! Response grid view model.
//!
//! # Responsibility
//! - Project the response store into one row per checklist item.
//! - Track the active category, which only affects row visibility.
//! - Enforce the permission gate on the edit path.
//!
//! # Invariants
//! - Switching categories never mutates the store.
//! - While the gate is closed every row's controls are disabled and edits
//!   through the grid are rejected.

use crate::grid::permission::EditGate;
use crate::model::assessment::{Actor, Assessment};
use crate::model::checklist::{CategoryId, Checklist, ChecklistItem, ReferenceError};
use crate::model::response::{Response, ResponseEdit};
use crate::store::response_store::ResponseStore;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// One rendered grid row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub category_id: CategoryId,
    pub item: ChecklistItem,
    pub response: Response,
    pub visible: bool,
    pub controls_enabled: bool,
}

/// Grid edit rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEditError {
    GateClosed { notice: &'static str },
    Reference(ReferenceError),
}

impl Display for GridEditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GateClosed { notice } => write!(f, "editing is blocked: {notice}"),
            Self::Reference(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GridEditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::GateClosed { .. } => None,
            Self::Reference(err) => Some(err),
        }
    }
}

impl From<ReferenceError> for GridEditError {
    fn from(value: ReferenceError) -> Self {
        Self::Reference(value)
    }
}

/// Grid state for one open assessment.
#[derive(Debug, Clone)]
pub struct GridModel {
    checklist: Arc<Checklist>,
    active_category: Option<CategoryId>,
    gate: EditGate,
}

impl GridModel {
    /// Creates a grid showing the first category.
    pub fn new(checklist: Arc<Checklist>, gate: EditGate) -> Self {
        let active_category = checklist
            .categories()
            .first()
            .map(|category| category.id.clone());
        Self {
            checklist,
            active_category,
            gate,
        }
    }

    pub fn active_category(&self) -> Option<&str> {
        self.active_category.as_deref()
    }

    pub fn select_category(&mut self, category_id: &str) -> Result<(), ReferenceError> {
        let category = self.checklist.require_category(category_id)?;
        self.active_category = Some(category.id.clone());
        Ok(())
    }

    pub fn gate(&self) -> EditGate {
        self.gate
    }

    /// Re-evaluates the gate after assessment metadata changed.
    pub fn refresh_gate(&mut self, actor: &Actor, assessment: &Assessment) {
        self.gate = EditGate::evaluate(actor, assessment);
    }

    /// Non-dismissible notice while the gate is closed.
    pub fn notice(&self) -> Option<&'static str> {
        self.gate.notice()
    }

    /// Every row of the checklist, with visibility for the active category.
    pub fn rows(&self, store: &ResponseStore) -> Vec<GridRow> {
        let enabled = self.gate.is_open();
        store
            .rows()
            .into_iter()
            .map(|row| GridRow {
                visible: self.active_category.as_deref() == Some(row.category_id.as_str()),
                category_id: row.category_id,
                item: row.item,
                response: row.response,
                controls_enabled: enabled,
            })
            .collect()
    }

    /// Rows of the active category only.
    pub fn visible_rows(&self, store: &ResponseStore) -> Vec<GridRow> {
        self.rows(store).into_iter().filter(|row| row.visible).collect()
    }

    /// Applies a user edit to the store if the gate is open.
    pub fn apply_edit(
        &self,
        store: &mut ResponseStore,
        item_id: &str,
        edit: ResponseEdit,
    ) -> Result<(), GridEditError> {
        if let EditGate::Closed { notice } = self.gate {
            return Err(GridEditError::GateClosed { notice });
        }
        store.set(item_id, edit)?;
        Ok(())
    }
}
