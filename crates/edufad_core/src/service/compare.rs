//! Pairwise assessment comparison.
//!
//! # Invariants
//! - `delta = support_b - support_a`; an item missing on one side counts as
//!   support 0 on that side.
//! - Output follows checklist item order and covers every item present in
//!   either assessment.
//! - Soft-deleted assessments are refused unless explicitly allowed.

use crate::api::AssessmentApi;
use crate::model::assessment::AssessmentId;
use crate::model::checklist::{Checklist, ReferenceError};
use crate::model::derived::ComparisonDelta;
use crate::model::response::{Response, Support};
use crate::store::checklist_store::FetchError;
use log::info;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

fn supports_by_order<'a>(
    checklist: &Checklist,
    responses: &'a [Response],
) -> Result<BTreeMap<usize, (&'a str, Support)>, ReferenceError> {
    let mut out = BTreeMap::new();
    for response in responses {
        let order = checklist.require_item(&response.item_id)?;
        out.insert(order, (response.item_id.as_str(), response.support));
    }
    Ok(out)
}

/// Per-item support deltas from `responses_a` to `responses_b`.
pub fn compare(
    checklist: &Checklist,
    responses_a: &[Response],
    responses_b: &[Response],
) -> Result<Vec<ComparisonDelta>, ReferenceError> {
    let a = supports_by_order(checklist, responses_a)?;
    let mut b = supports_by_order(checklist, responses_b)?;

    let mut merged: BTreeMap<usize, ComparisonDelta> = BTreeMap::new();
    for (order, (item_id, support_a)) in a {
        let support_b = b.remove(&order).map_or(Support::ZERO, |(_, support)| support);
        merged.insert(order, delta(item_id, support_a, support_b));
    }
    for (order, (item_id, support_b)) in b {
        merged.insert(order, delta(item_id, Support::ZERO, support_b));
    }
    Ok(merged.into_values().collect())
}

fn delta(item_id: &str, a: Support, b: Support) -> ComparisonDelta {
    ComparisonDelta {
        item_id: item_id.to_string(),
        delta: i32::from(b.value()) - i32::from(a.value()),
    }
}

/// Re-orders remote deltas into checklist item order.
pub fn order_deltas(
    checklist: &Checklist,
    deltas: Vec<ComparisonDelta>,
) -> Result<Vec<ComparisonDelta>, ReferenceError> {
    let mut ordered = BTreeMap::new();
    for delta in deltas {
        ordered.insert(checklist.require_item(&delta.item_id)?, delta);
    }
    Ok(ordered.into_values().collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareOptions {
    pub allow_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    Fetch(FetchError),
    /// One side is soft-deleted and deleted assessments were not allowed.
    DeletedAssessment(AssessmentId),
}

impl Display for CompareError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "{err}"),
            Self::DeletedAssessment(id) => write!(f, "assessment {id} is deleted"),
        }
    }
}

impl Error for CompareError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch(err) => Some(err),
            Self::DeletedAssessment(_) => None,
        }
    }
}

impl From<FetchError> for CompareError {
    fn from(value: FetchError) -> Self {
        Self::Fetch(value)
    }
}

impl From<ReferenceError> for CompareError {
    fn from(value: ReferenceError) -> Self {
        Self::Fetch(FetchError::Reference(value))
    }
}

pub struct CompareService<A: AssessmentApi> {
    api: Arc<A>,
    checklist: Arc<Checklist>,
}

impl<A: AssessmentApi> CompareService<A> {
    pub fn new(api: Arc<A>, checklist: Arc<Checklist>) -> Self {
        Self { api, checklist }
    }

    async fn responses_of(
        &self,
        assessment_id: &str,
        options: CompareOptions,
    ) -> Result<Vec<Response>, CompareError> {
        let assessment = self
            .api
            .get_assessment(assessment_id)
            .await
            .map_err(|err| FetchError::from_api("assessment", err))?;
        if assessment.is_deleted && !options.allow_deleted {
            return Err(CompareError::DeletedAssessment(assessment.id));
        }
        Ok(self
            .api
            .list_responses(assessment_id)
            .await
            .map_err(|err| FetchError::from_api("responses", err))?)
    }

    /// Compares two assessments client-side.
    pub async fn compare_assessments(
        &self,
        assessment_a: &str,
        assessment_b: &str,
        options: CompareOptions,
    ) -> Result<Vec<ComparisonDelta>, CompareError> {
        let responses_a = self.responses_of(assessment_a, options).await?;
        let responses_b = self.responses_of(assessment_b, options).await?;
        let deltas = compare(&self.checklist, &responses_a, &responses_b)?;
        info!(
            "event=compare module=compare status=ok a={} b={} items={}",
            assessment_a,
            assessment_b,
            deltas.len()
        );
        Ok(deltas)
    }

    /// Uses the remote compare endpoint, re-ordered into checklist order.
    pub async fn remote_compare(
        &self,
        assessment_a: &str,
        assessment_b: &str,
    ) -> Result<Vec<ComparisonDelta>, FetchError> {
        let deltas = self
            .api
            .compare(assessment_a, assessment_b)
            .await
            .map_err(|err| FetchError::from_api("compare", err))?;
        Ok(order_deltas(&self.checklist, deltas)?)
    }
}
