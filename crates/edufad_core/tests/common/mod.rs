#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use edufad_core::api::{ApiError, ApiResult, AssessmentApi, SubjectDashboardPayload};
use edufad_core::model::response::ResponseInput;
use edufad_core::view::{BindingVersion, ViewBindings};
use edufad_core::{
    Actor, AppContext, Assessment, Checklist, ChecklistCategory, ChecklistItem, ComparisonDelta,
    Response, Role, SubjectDashboard, Support,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub fn checklist(categories: &[(&str, &[&str])]) -> Checklist {
    Checklist::new(
        Some("test".to_string()),
        categories
            .iter()
            .map(|(id, items)| ChecklistCategory {
                id: id.to_string(),
                name: format!("Area {id}"),
                items: items
                    .iter()
                    .map(|item| ChecklistItem {
                        id: item.to_string(),
                        label: format!("Behavior {item}"),
                    })
                    .collect(),
            })
            .collect(),
    )
    .unwrap()
}

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

pub fn response(assessment: &str, item: &str, support: u8) -> Response {
    let mut response = Response::empty(assessment, item);
    response.support = Support::new(support).unwrap();
    response
}

pub fn editor() -> Actor {
    Actor::new("2", "editor1", Role::Editor)
}

pub fn admin() -> Actor {
    Actor::new("1", "admin", Role::Admin)
}

/// In-memory remote service.
///
/// When built with `gated`, every upsert records its body and then waits
/// for a permit released by the test. After `hold_reads`, response reads
/// take their snapshot and then wait for `release_reads`.
pub struct FakeApi {
    checklist: Checklist,
    actor: Mutex<Actor>,
    assessments: Mutex<Vec<Assessment>>,
    responses: Mutex<HashMap<String, Vec<Response>>>,
    sent: Mutex<Vec<(String, ResponseInput)>>,
    fail_next: Mutex<Option<ApiError>>,
    dashboard: Mutex<Option<SubjectDashboardPayload>>,
    remote_deltas: Mutex<Vec<ComparisonDelta>>,
    checklist_loads: AtomicUsize,
    fail_checklist: Mutex<Option<ApiError>>,
    gate: Option<Semaphore>,
    hold_reads: AtomicBool,
    held_reads: AtomicUsize,
    read_gate: Semaphore,
}

impl FakeApi {
    pub fn new(checklist: Checklist, actor: Actor) -> Self {
        Self {
            checklist,
            actor: Mutex::new(actor),
            assessments: Mutex::new(Vec::new()),
            responses: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            dashboard: Mutex::new(None),
            remote_deltas: Mutex::new(Vec::new()),
            checklist_loads: AtomicUsize::new(0),
            fail_checklist: Mutex::new(None),
            gate: None,
            hold_reads: AtomicBool::new(false),
            held_reads: AtomicUsize::new(0),
            read_gate: Semaphore::new(0),
        }
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn with_assessment(self, assessment: Assessment, responses: Vec<Response>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(assessment.id.clone(), responses);
        self.assessments.lock().unwrap().push(assessment);
        self
    }

    pub fn set_dashboard(&self, payload: SubjectDashboardPayload) {
        *self.dashboard.lock().unwrap() = Some(payload);
    }

    pub fn set_remote_deltas(&self, deltas: Vec<ComparisonDelta>) {
        *self.remote_deltas.lock().unwrap() = deltas;
    }

    pub fn fail_next(&self, err: ApiError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    pub fn fail_next_checklist(&self, err: ApiError) {
        *self.fail_checklist.lock().unwrap() = Some(err);
    }

    pub fn hold_reads(&self) {
        self.hold_reads.store(true, Ordering::SeqCst);
    }

    /// Stops holding new reads and lets `count` held reads finish.
    pub fn release_reads(&self, count: usize) {
        self.hold_reads.store(false, Ordering::SeqCst);
        self.read_gate.add_permits(count);
    }

    /// Yields until at least `count` reads are waiting on `release_reads`.
    pub async fn wait_for_held_reads(&self, count: usize) {
        while self.held_reads.load(Ordering::SeqCst) < count {
            tokio::task::yield_now().await;
        }
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn sent(&self) -> Vec<(String, ResponseInput)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn stored(&self, assessment_id: &str) -> Vec<Response> {
        self.responses
            .lock()
            .unwrap()
            .get(assessment_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn checklist_loads(&self) -> usize {
        self.checklist_loads.load(Ordering::SeqCst)
    }

    /// Yields until at least `count` upserts have been issued.
    pub async fn wait_for_sends(&self, count: usize) {
        while self.sent.lock().unwrap().len() < count {
            tokio::task::yield_now().await;
        }
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Status {
            status: 404,
            detail: format!("{what} not found"),
        }
    }
}

#[async_trait]
impl AssessmentApi for FakeApi {
    async fn load_checklist(&self) -> ApiResult<Checklist> {
        self.checklist_loads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if let Some(err) = self.fail_checklist.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.checklist.clone())
    }

    async fn current_actor(&self) -> ApiResult<Actor> {
        Ok(self.actor.lock().unwrap().clone())
    }

    async fn acknowledge_disclaimer(&self) -> ApiResult<Actor> {
        let mut actor = self.actor.lock().unwrap();
        actor.disclaimer_ack_at = Some("2024-06-01T09:00:00".to_string());
        Ok(actor.clone())
    }

    async fn list_assessments(&self) -> ApiResult<Vec<Assessment>> {
        Ok(self.assessments.lock().unwrap().clone())
    }

    async fn get_assessment(&self, assessment_id: &str) -> ApiResult<Assessment> {
        self.assessments
            .lock()
            .unwrap()
            .iter()
            .find(|assessment| assessment.id == assessment_id)
            .cloned()
            .ok_or_else(|| Self::not_found("assessment"))
    }

    async fn list_responses(&self, assessment_id: &str) -> ApiResult<Vec<Response>> {
        let snapshot = self.stored(assessment_id);
        if self.hold_reads.load(Ordering::SeqCst) {
            self.held_reads.fetch_add(1, Ordering::SeqCst);
            self.read_gate.acquire().await.unwrap().forget();
        }
        Ok(snapshot)
    }

    async fn upsert_response(
        &self,
        assessment_id: &str,
        input: &ResponseInput,
    ) -> ApiResult<Response> {
        self.sent
            .lock()
            .unwrap()
            .push((assessment_id.to_string(), input.clone()));
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }

        let saved = Response {
            assessment_id: assessment_id.to_string(),
            item_id: input.item_id.clone(),
            support: input.support,
            freq: input.freq,
            generalization: input.generalization,
            context: input.context.clone(),
            note: input.note.clone(),
        };
        let mut responses = self.responses.lock().unwrap();
        let rows = responses.entry(assessment_id.to_string()).or_default();
        rows.retain(|row| row.item_id != input.item_id);
        rows.push(saved.clone());
        Ok(saved)
    }

    async fn subject_dashboard(&self, _subject_id: &str) -> ApiResult<SubjectDashboardPayload> {
        Ok(self
            .dashboard
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| SubjectDashboardPayload::Aggregated(SubjectDashboard::default())))
    }

    async fn compare(
        &self,
        _assessment_a: &str,
        _assessment_b: &str,
    ) -> ApiResult<Vec<ComparisonDelta>> {
        Ok(self.remote_deltas.lock().unwrap().clone())
    }
}

pub fn context(api: &Arc<FakeApi>, actor: Actor, checklist: Checklist) -> AppContext<FakeApi> {
    AppContext::new(
        Arc::clone(api),
        actor,
        Arc::new(checklist),
        ViewBindings::for_version(BindingVersion::V2),
    )
}
