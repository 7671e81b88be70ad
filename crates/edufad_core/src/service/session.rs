//! Application context and editing sessions.
//!
//! # Responsibility
//! - Own the process-level collaborators (api client, actor, checklist,
//!   view bindings, refresh signals, summary cache) in one explicit value.
//! - Open an assessment for editing: seed the response store, evaluate the
//!   permission gate and wire the autosave coordinator.
//!
//! # Invariants
//! - Components receive only the slices they need; nothing is global.
//! - An editing session owns its response store and drops it on close.
//! - Grid edits go through the gate before touching the store.

use crate::api::AssessmentApi;
use crate::grid::model::{GridEditError, GridModel, GridRow};
use crate::grid::permission::EditGate;
use crate::model::assessment::{Actor, Assessment};
use crate::model::checklist::{Checklist, ReferenceError};
use crate::model::response::{Response, ResponseEdit};
use crate::service::autosave::{AutosaveCoordinator, SaveCause, SaveError};
use crate::service::compare::CompareService;
use crate::service::dashboard::DashboardService;
use crate::service::refresh::RefreshSignals;
use crate::service::summary::{summarize_assessment, SummaryCache};
use crate::store::checklist_store::{ChecklistStore, FetchError};
use crate::store::response_store::{lock_store, ResponseStore, SharedResponseStore};
use crate::view::ViewBindings;
use log::{info, warn};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Explicit application context.
pub struct AppContext<A: AssessmentApi> {
    api: Arc<A>,
    actor: Actor,
    checklists: Arc<ChecklistStore<A>>,
    checklist: Arc<Checklist>,
    bindings: ViewBindings,
    refresh: Arc<RefreshSignals>,
    summaries: Arc<SummaryCache>,
}

impl<A: AssessmentApi> AppContext<A> {
    pub fn new(api: Arc<A>, actor: Actor, checklist: Arc<Checklist>, bindings: ViewBindings) -> Self {
        let checklists = ChecklistStore::with_checklist(Arc::clone(&api), Arc::clone(&checklist));
        Self::from_parts(api, actor, Arc::new(checklists), checklist, bindings)
    }

    fn from_parts(
        api: Arc<A>,
        actor: Actor,
        checklists: Arc<ChecklistStore<A>>,
        checklist: Arc<Checklist>,
        bindings: ViewBindings,
    ) -> Self {
        Self {
            api,
            actor,
            checklists,
            checklist,
            bindings,
            refresh: Arc::new(RefreshSignals::new()),
            summaries: Arc::new(SummaryCache::new()),
        }
    }

    /// Resolves the current actor and loads the checklist through `checklists`.
    ///
    /// The store outlives a failed bootstrap, so a retry with the same store
    /// fetches again while a successful load is never repeated.
    pub async fn bootstrap_with(
        api: Arc<A>,
        checklists: Arc<ChecklistStore<A>>,
        bindings: ViewBindings,
    ) -> Result<Self, FetchError> {
        let actor = api
            .current_actor()
            .await
            .map_err(|err| FetchError::from_api("actor", err))?;
        let checklist = checklists.load().await?;
        info!(
            "event=context_bootstrap module=session status=ok actor={} bindings={}",
            actor.username,
            bindings.version().as_str()
        );
        Ok(Self::from_parts(api, actor, checklists, checklist, bindings))
    }

    /// Bootstraps with a fresh checklist store.
    pub async fn bootstrap(api: Arc<A>, bindings: ViewBindings) -> Result<Self, FetchError> {
        let checklists = Arc::new(ChecklistStore::new(Arc::clone(&api)));
        Self::bootstrap_with(api, checklists, bindings).await
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Checklist resolved at startup; the same value `checklists` caches.
    pub fn checklist(&self) -> &Arc<Checklist> {
        &self.checklist
    }

    pub fn checklists(&self) -> &Arc<ChecklistStore<A>> {
        &self.checklists
    }

    pub fn bindings(&self) -> &ViewBindings {
        &self.bindings
    }

    pub fn refresh(&self) -> &Arc<RefreshSignals> {
        &self.refresh
    }

    pub fn summaries(&self) -> &Arc<SummaryCache> {
        &self.summaries
    }

    /// Records the disclaimer acknowledgment for the current actor.
    pub async fn acknowledge_disclaimer(&mut self) -> Result<&Actor, FetchError> {
        self.actor = self
            .api
            .acknowledge_disclaimer()
            .await
            .map_err(|err| FetchError::from_api("actor", err))?;
        Ok(&self.actor)
    }

    pub fn dashboard(&self) -> DashboardService<A> {
        DashboardService::new(Arc::clone(&self.api), Arc::clone(&self.checklist))
    }

    pub fn compare(&self) -> CompareService<A> {
        CompareService::new(Arc::clone(&self.api), Arc::clone(&self.checklist))
    }

    /// Loads an assessment and its responses into a new editing session.
    pub async fn open_assessment(&self, assessment_id: &str) -> Result<EditingSession<A>, FetchError> {
        let assessment = self
            .api
            .get_assessment(assessment_id)
            .await
            .map_err(|err| FetchError::from_api("assessment", err))?;
        let responses = self
            .api
            .list_responses(&assessment.id)
            .await
            .map_err(|err| FetchError::from_api("responses", err))?;
        let store = ResponseStore::seeded(Arc::clone(&self.checklist), assessment.id.clone(), responses)
            .map_err(|err| {
                warn!(
                    "event=session_open module=session status=error assessment={} error={}",
                    assessment.id, err
                );
                FetchError::from(err)
            })?;

        let id = Uuid::new_v4();
        let gate = EditGate::evaluate(&self.actor, &assessment);
        let store: SharedResponseStore = Arc::new(Mutex::new(store));
        let autosave = AutosaveCoordinator::new(
            Arc::clone(&self.api),
            Arc::clone(&store),
            assessment.subject_id.clone(),
            id,
            Arc::clone(&self.summaries),
            Arc::clone(&self.refresh),
        );
        info!(
            "event=session_open module=session status=ok session={} assessment={} gate_open={}",
            id,
            assessment.id,
            gate.is_open()
        );

        Ok(EditingSession {
            id,
            actor: self.actor.clone(),
            grid: GridModel::new(Arc::clone(&self.checklist), gate),
            assessment,
            store,
            autosave,
        })
    }

    /// Auto-generated summary of an assessment, cached until its next save.
    pub async fn summary(&self, assessment_id: &str) -> Result<Arc<str>, FetchError> {
        let generation = self.summaries.generation(assessment_id);
        if let Some(text) = self.summaries.get(assessment_id) {
            return Ok(text);
        }
        let responses = self
            .api
            .list_responses(assessment_id)
            .await
            .map_err(|err| FetchError::from_api("responses", err))?;
        Ok(self
            .summaries
            .get_or_generate(assessment_id, generation, || {
                summarize_assessment(&self.checklist, &responses)
            })?)
    }
}

/// One open assessment.
pub struct EditingSession<A: AssessmentApi> {
    id: Uuid,
    actor: Actor,
    assessment: Assessment,
    store: SharedResponseStore,
    grid: GridModel,
    autosave: AutosaveCoordinator<A>,
}

impl<A: AssessmentApi> EditingSession<A> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    pub fn store(&self) -> SharedResponseStore {
        Arc::clone(&self.store)
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn select_category(&mut self, category_id: &str) -> Result<(), ReferenceError> {
        self.grid.select_category(category_id)
    }

    /// Applies locally edited operator metadata and re-evaluates the gate.
    pub fn set_operator(&mut self, name: Option<String>, role: Option<String>) {
        self.assessment.operator_name = name;
        self.assessment.operator_role = role;
        self.grid.refresh_gate(&self.actor, &self.assessment);
    }

    pub fn rows(&self) -> Vec<GridRow> {
        self.grid.rows(&lock_store(&self.store))
    }

    pub fn visible_rows(&self) -> Vec<GridRow> {
        self.grid.visible_rows(&lock_store(&self.store))
    }

    pub fn response(&self, item_id: &str) -> Response {
        lock_store(&self.store).get(item_id)
    }

    /// Records a single-field edit locally. Does not save.
    pub fn edit(&self, item_id: &str, edit: ResponseEdit) -> Result<(), GridEditError> {
        let mut store = lock_store(&self.store);
        self.grid.apply_edit(&mut store, item_id, edit)
    }

    /// Saves the current record of `item_id`.
    ///
    /// Refused without sending while the permission gate is closed.
    pub async fn commit(&self, item_id: &str) -> Result<Response, SaveError> {
        if let EditGate::Closed { notice } = self.grid.gate() {
            warn!(
                "event=autosave module=session status=blocked session={} assessment={} item={}",
                self.id, self.assessment.id, item_id
            );
            return Err(SaveError {
                item_id: item_id.to_string(),
                cause: SaveCause::GateClosed { notice },
            });
        }
        self.autosave.commit(item_id).await
    }
}
