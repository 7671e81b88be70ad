//! In-memory response store for one open assessment.
//!
//! # Responsibility
//! - Hold the current value of every `(item_id, field)` of the open
//!   assessment, seeded from the remote responses.
//! - Apply local single-field edits synchronously.
//!
//! # Invariants
//! - Only checklist items can hold a record; unknown ids are reference errors.
//! - `get` never fails and never inserts; absent items read as the default
//!   record (`support = 0`, everything else none).
//! - The store never talks to the network.

use crate::model::assessment::AssessmentId;
use crate::model::checklist::{Checklist, ChecklistItem, ItemId, ReferenceError};
use crate::model::response::{Response, ResponseEdit};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Store shared between the edit path and the autosave path.
///
/// The lock is only held for synchronous reads/writes, never across an
/// await point.
pub type SharedResponseStore = Arc<Mutex<ResponseStore>>;

/// Locks a shared store, recovering the data if a previous holder panicked.
pub fn lock_store(store: &SharedResponseStore) -> MutexGuard<'_, ResponseStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One logical grid row: a checklist item plus its current response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRow {
    pub category_id: String,
    pub item: ChecklistItem,
    pub response: Response,
    /// False while the item still reads as the default record.
    pub recorded: bool,
}

/// Current values for the open assessment.
#[derive(Debug, Clone)]
pub struct ResponseStore {
    assessment_id: AssessmentId,
    checklist: Arc<Checklist>,
    records: HashMap<ItemId, Response>,
}

impl ResponseStore {
    /// Seeds the store from remote responses.
    ///
    /// # Errors
    /// - A response names an item outside the checklist.
    /// - A response belongs to another assessment.
    pub fn seeded(
        checklist: Arc<Checklist>,
        assessment_id: impl Into<AssessmentId>,
        existing: Vec<Response>,
    ) -> Result<Self, ReferenceError> {
        let assessment_id = assessment_id.into();
        let mut records = HashMap::with_capacity(existing.len());
        for response in existing {
            checklist.require_item(&response.item_id)?;
            if response.assessment_id != assessment_id {
                return Err(ReferenceError::ForeignResponse {
                    item_id: response.item_id,
                    expected_assessment: assessment_id,
                    found_assessment: response.assessment_id,
                });
            }
            records.insert(response.item_id.clone(), response);
        }

        Ok(Self {
            assessment_id,
            checklist,
            records,
        })
    }

    /// Empty store, every item at its default record.
    pub fn empty(checklist: Arc<Checklist>, assessment_id: impl Into<AssessmentId>) -> Self {
        Self {
            assessment_id: assessment_id.into(),
            checklist,
            records: HashMap::new(),
        }
    }

    pub fn assessment_id(&self) -> &str {
        &self.assessment_id
    }

    pub fn checklist(&self) -> &Checklist {
        &self.checklist
    }

    /// Current record for `item_id`, or the default record if absent.
    pub fn get(&self, item_id: &str) -> Response {
        self.records
            .get(item_id)
            .cloned()
            .unwrap_or_else(|| Response::empty(self.assessment_id.clone(), item_id))
    }

    /// Whether `item_id` holds a seeded or edited record.
    pub fn is_recorded(&self, item_id: &str) -> bool {
        self.records.contains_key(item_id)
    }

    /// Applies one single-field edit locally.
    pub fn set(&mut self, item_id: &str, edit: ResponseEdit) -> Result<(), ReferenceError> {
        self.checklist.require_item(item_id)?;
        let assessment_id = &self.assessment_id;
        self.records
            .entry(item_id.to_string())
            .or_insert_with(|| Response::empty(assessment_id.clone(), item_id))
            .apply(edit);
        Ok(())
    }

    /// Recorded responses in checklist category/item order.
    pub fn snapshot(&self) -> Vec<Response> {
        self.checklist
            .items()
            .filter_map(|(_, item)| self.records.get(&item.id).cloned())
            .collect()
    }

    /// Exactly one row per checklist item, across all categories.
    pub fn rows(&self) -> Vec<ResponseRow> {
        self.checklist
            .items()
            .map(|(category, item)| ResponseRow {
                category_id: category.id.clone(),
                item: item.clone(),
                response: self.get(&item.id),
                recorded: self.is_recorded(&item.id),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::ResponseStore;
    use crate::model::checklist::{Checklist, ChecklistCategory, ChecklistItem, ReferenceError};
    use crate::model::response::{Frequency, Response, ResponseEdit, Support};
    use std::sync::Arc;

    fn checklist() -> Arc<Checklist> {
        let item = |id: &str| ChecklistItem {
            id: id.to_string(),
            label: id.to_lowercase(),
        };
        Arc::new(
            Checklist::new(
                None,
                vec![
                    ChecklistCategory {
                        id: "C1".to_string(),
                        name: "One".to_string(),
                        items: vec![item("I1"), item("I2")],
                    },
                    ChecklistCategory {
                        id: "C2".to_string(),
                        name: "Two".to_string(),
                        items: vec![item("I3")],
                    },
                ],
            )
            .expect("valid checklist"),
        )
    }

    #[test]
    fn get_returns_default_record_for_absent_items() {
        let store = ResponseStore::empty(checklist(), "a1");
        let response = store.get("I2");
        assert_eq!(response, Response::empty("a1", "I2"));
        assert!(!store.is_recorded("I2"));
    }

    #[test]
    fn support_round_trips_for_every_valid_value() {
        let mut store = ResponseStore::empty(checklist(), "a1");
        for support in Support::all() {
            store
                .set("I1", ResponseEdit::Support(support))
                .expect("known item");
            assert_eq!(store.get("I1").support, support);
        }
    }

    #[test]
    fn seeding_rejects_unknown_item() {
        let err = ResponseStore::seeded(checklist(), "a1", vec![Response::empty("a1", "ZZ")])
            .expect_err("unknown item must fail");
        assert_eq!(err, ReferenceError::UnknownItem("ZZ".to_string()));
    }

    #[test]
    fn seeding_rejects_response_from_another_assessment() {
        let err = ResponseStore::seeded(checklist(), "a1", vec![Response::empty("a2", "I1")])
            .expect_err("foreign response must fail");
        assert!(matches!(err, ReferenceError::ForeignResponse { .. }));
    }

    #[test]
    fn snapshot_follows_checklist_order_and_skips_unrecorded_items() {
        let mut store = ResponseStore::empty(checklist(), "a1");
        store
            .set("I3", ResponseEdit::Freq(Some(Frequency::F1)))
            .expect("known item");
        store
            .set("I1", ResponseEdit::Support(Support::new(2).expect("valid")))
            .expect("known item");

        let ids: Vec<_> = store
            .snapshot()
            .into_iter()
            .map(|response| response.item_id)
            .collect();
        assert_eq!(ids, vec!["I1".to_string(), "I3".to_string()]);
    }

    #[test]
    fn rows_cover_every_item_once() {
        let store = ResponseStore::empty(checklist(), "a1");
        let rows = store.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].category_id, "C2");
        assert!(rows.iter().all(|row| !row.recorded));
    }
}
