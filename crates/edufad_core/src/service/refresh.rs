//! Dashboard refresh signals.
//!
//! Successful saves mark the subject dirty; whoever renders dashboards
//! drains the dirty set and recomputes. Marks made while nobody waits are
//! kept until the next drain.

use crate::model::assessment::SubjectId;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct RefreshSignals {
    dirty: Mutex<BTreeSet<SubjectId>>,
    notify: Notify,
}

impl RefreshSignals {
    pub fn new() -> Self {
        Self::default()
    }

    fn dirty(&self) -> MutexGuard<'_, BTreeSet<SubjectId>> {
        self.dirty.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedules a dashboard recompute for `subject_id`.
    pub fn mark_dirty(&self, subject_id: &str) {
        self.dirty().insert(subject_id.to_string());
        self.notify.notify_one();
    }

    pub fn is_dirty(&self, subject_id: &str) -> bool {
        self.dirty().contains(subject_id)
    }

    /// Drains and returns every dirty subject.
    pub fn take_dirty(&self) -> Vec<SubjectId> {
        std::mem::take(&mut *self.dirty()).into_iter().collect()
    }

    /// Resolves after the next `mark_dirty`, or immediately if one happened
    /// since the last wake-up.
    pub async fn changed(&self) {
        self.notify.notified().await;
    }
}
