//! Per-item autosave of response edits.
//!
//! # Responsibility
//! - Turn a committed single-field edit into a full-record upsert.
//! - Serialize upserts per item and coalesce commits that pile up behind an
//!   in-flight one.
//! - Invalidate derived state after a successful save.
//!
//! # Invariants
//! - At most one upsert per item is in flight at any time.
//! - The record is read from the response store after the item slot is
//!   acquired, never before; a send always carries the latest local state.
//! - A commit resolves with the outcome of the first send that started
//!   after it was requested.
//! - Failures never roll back the local value.

use crate::api::{ApiError, AssessmentApi, AuthError};
use crate::model::assessment::{AssessmentId, SubjectId};
use crate::model::checklist::{ItemId, ReferenceError};
use crate::model::response::{Response, ResponseInput};
use crate::service::refresh::RefreshSignals;
use crate::service::summary::SummaryCache;
use crate::store::response_store::{lock_store, SharedResponseStore};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Why an item save failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveCause {
    Remote(ApiError),
    Reference(ReferenceError),
    /// The permission gate is closed; nothing was sent.
    GateClosed { notice: &'static str },
}

/// One item's upsert failed. Non-fatal and scoped to that item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveError {
    pub item_id: ItemId,
    pub cause: SaveCause,
}

impl SaveError {
    /// Credentials failure to hand over to session management.
    pub fn auth_error(&self) -> Option<&AuthError> {
        match &self.cause {
            SaveCause::Remote(err) => err.auth_error(),
            SaveCause::Reference(_) | SaveCause::GateClosed { .. } => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        self.auth_error().is_some()
    }
}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            SaveCause::Remote(err) => write!(f, "saving item {} failed: {err}", self.item_id),
            SaveCause::Reference(err) => write!(f, "saving item {} failed: {err}", self.item_id),
            SaveCause::GateClosed { notice } => {
                write!(f, "saving item {} is blocked: {notice}", self.item_id)
            }
        }
    }
}

impl Error for SaveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            SaveCause::Remote(err) => Some(err),
            SaveCause::Reference(err) => Some(err),
            SaveCause::GateClosed { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
struct SlotState {
    /// Highest commit generation covered by a send that already started.
    sent_generation: u64,
    last_outcome: Option<Result<Response, SaveError>>,
}

#[derive(Debug, Default)]
struct ItemSlot {
    requested: AtomicU64,
    state: tokio::sync::Mutex<SlotState>,
}

/// Autosave queue for one open assessment.
pub struct AutosaveCoordinator<A: AssessmentApi> {
    api: Arc<A>,
    store: SharedResponseStore,
    assessment_id: AssessmentId,
    subject_id: SubjectId,
    session_id: Uuid,
    summaries: Arc<SummaryCache>,
    refresh: Arc<RefreshSignals>,
    slots: Mutex<HashMap<ItemId, Arc<ItemSlot>>>,
}

impl<A: AssessmentApi> AutosaveCoordinator<A> {
    pub fn new(
        api: Arc<A>,
        store: SharedResponseStore,
        subject_id: impl Into<SubjectId>,
        session_id: Uuid,
        summaries: Arc<SummaryCache>,
        refresh: Arc<RefreshSignals>,
    ) -> Self {
        let assessment_id = lock_store(&store).assessment_id().to_string();
        Self {
            api,
            store,
            assessment_id,
            subject_id: subject_id.into(),
            session_id,
            summaries,
            refresh,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn assessment_id(&self) -> &str {
        &self.assessment_id
    }

    fn slot(&self, item_id: &str) -> Arc<ItemSlot> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(item_id.to_string()).or_default())
    }

    /// Persists the current full record of `item_id`.
    ///
    /// Commits issued while a send for the same item is in flight wait for
    /// it, then share a single follow-up send that carries the latest record.
    pub async fn commit(&self, item_id: &str) -> Result<Response, SaveError> {
        let known = lock_store(&self.store).checklist().require_item(item_id);
        if let Err(err) = known {
            return Err(SaveError {
                item_id: item_id.to_string(),
                cause: SaveCause::Reference(err),
            });
        }

        let slot = self.slot(item_id);
        let generation = slot.requested.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = slot.state.lock().await;
        if state.sent_generation >= generation {
            if let Some(outcome) = &state.last_outcome {
                debug!(
                    "event=autosave_coalesced module=autosave status=ok session={} item={} generation={}",
                    self.session_id, item_id, generation
                );
                return outcome.clone();
            }
        }
        state.sent_generation = slot.requested.load(Ordering::SeqCst);

        let input = ResponseInput::from(&lock_store(&self.store).get(item_id));
        let outcome = match self.api.upsert_response(&self.assessment_id, &input).await {
            Ok(saved) => {
                self.summaries.invalidate(&self.assessment_id);
                self.refresh.mark_dirty(&self.subject_id);
                info!(
                    "event=autosave module=autosave status=ok session={} assessment={} item={}",
                    self.session_id, self.assessment_id, item_id
                );
                Ok(saved)
            }
            Err(err) => {
                warn!(
                    "event=autosave module=autosave status=error session={} assessment={} item={} auth={} error={}",
                    self.session_id,
                    self.assessment_id,
                    item_id,
                    err.is_auth(),
                    err
                );
                Err(SaveError {
                    item_id: item_id.to_string(),
                    cause: SaveCause::Remote(err),
                })
            }
        };
        state.last_outcome = Some(outcome.clone());
        outcome
    }
}
