//! Dashboard aggregation.
//!
//! # Responsibility
//! - Derive the progress series and latest category snapshot of a subject.
//! - Normalize remote dashboard payloads into the same shape.
//! - Build the per-item watchlist across subjects.
//!
//! # Invariants
//! - Soft-deleted assessments and other subjects' assessments never
//!   contribute.
//! - Empty input yields "no data" (`None` or empty vectors), never zero.
//! - Series order is date ascending, then assessment id ascending.
//! - Snapshot entries follow checklist category order.

use crate::api::{AssessmentApi, RawSeriesEntry, SubjectDashboardPayload};
use crate::model::assessment::{Assessment, AssessmentId, SubjectId};
use crate::model::checklist::{Checklist, ReferenceError};
use crate::model::compare_ids;
use crate::model::derived::{CategorySnapshot, SeriesPoint, SubjectDashboard};
use crate::model::response::{Frequency, Generalization, Response, Support};
use crate::store::checklist_store::FetchError;
use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Default `max_support` threshold of the item watchlist.
pub const DEFAULT_WATCHLIST_MAX_SUPPORT: u8 = 1;

/// One assessment together with its responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentResponses {
    pub assessment: Assessment,
    pub responses: Vec<Response>,
}

/// Aggregation switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Only finalized assessments contribute.
    pub finalized_only: bool,
}

/// Arithmetic mean of `support`; `None` for an empty set.
pub fn average_support(responses: &[Response]) -> Option<f64> {
    mean(responses.iter().map(|response| response.support.as_f64()))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn chronological(a: &Assessment, b: &Assessment) -> Ordering {
    a.date.cmp(&b.date).then_with(|| compare_ids(&a.id, &b.id))
}

fn check_responses(checklist: &Checklist, entry: &AssessmentResponses) -> Result<(), ReferenceError> {
    for response in &entry.responses {
        checklist.require_item(&response.item_id)?;
        if response.assessment_id != entry.assessment.id {
            return Err(ReferenceError::ForeignResponse {
                item_id: response.item_id.clone(),
                expected_assessment: entry.assessment.id.clone(),
                found_assessment: response.assessment_id.clone(),
            });
        }
    }
    Ok(())
}

/// Per-category mean support of one assessment, in checklist order.
///
/// Categories without responses are omitted.
pub fn category_snapshot(
    checklist: &Checklist,
    responses: &[Response],
) -> Result<Vec<CategorySnapshot>, ReferenceError> {
    let mut buckets: HashMap<&str, Vec<f64>> = HashMap::new();
    for response in responses {
        let category = checklist
            .category_of(&response.item_id)
            .ok_or_else(|| ReferenceError::UnknownItem(response.item_id.clone()))?;
        buckets
            .entry(category.id.as_str())
            .or_default()
            .push(response.support.as_f64());
    }

    Ok(checklist
        .categories()
        .iter()
        .filter_map(|category| {
            let supports = buckets.remove(category.id.as_str())?;
            mean(supports.into_iter()).map(|average_support| CategorySnapshot {
                category_id: category.id.clone(),
                average_support,
            })
        })
        .collect())
}

/// Aggregates a subject's history into its dashboard.
///
/// `history` may contain other subjects and deleted assessments; both are
/// skipped. Assessments without responses produce no series point.
///
/// # Errors
/// A contributing response names an item outside the checklist or belongs
/// to another assessment.
pub fn aggregate(
    checklist: &Checklist,
    subject_id: &str,
    history: &[AssessmentResponses],
    options: AggregateOptions,
) -> Result<SubjectDashboard, ReferenceError> {
    let mut included: Vec<&AssessmentResponses> = history
        .iter()
        .filter(|entry| entry.assessment.subject_id == subject_id)
        .filter(|entry| entry.assessment.is_active())
        .filter(|entry| !options.finalized_only || entry.assessment.is_finalized())
        .collect();
    for entry in &included {
        check_responses(checklist, entry)?;
    }
    included.sort_by(|a, b| chronological(&a.assessment, &b.assessment));

    let series = included
        .iter()
        .filter_map(|entry| {
            average_support(&entry.responses).map(|average_support| SeriesPoint {
                assessment_id: Some(entry.assessment.id.clone()),
                date: entry.assessment.date,
                average_support,
            })
        })
        .collect();

    let category_snapshot = match included.last() {
        Some(latest) => category_snapshot(checklist, &latest.responses)?,
        None => Vec::new(),
    };

    Ok(SubjectDashboard {
        series,
        category_snapshot,
    })
}

fn raw_assessment_id(value: &Option<serde_json::Value>) -> Option<AssessmentId> {
    match value {
        Some(serde_json::Value::String(id)) => Some(id.clone()),
        Some(serde_json::Value::Number(id)) => Some(id.to_string()),
        _ => None,
    }
}

/// Aggregates the raw per-assessment area averages served by older servers.
///
/// A point's value is the mean of its area averages; the snapshot is the
/// latest entry's area map.
pub fn from_raw_series(
    checklist: &Checklist,
    entries: &[RawSeriesEntry],
) -> Result<SubjectDashboard, ReferenceError> {
    let mut ordered: Vec<(Option<AssessmentId>, &RawSeriesEntry)> = entries
        .iter()
        .map(|entry| (raw_assessment_id(&entry.assessment_id), entry))
        .collect();
    ordered.sort_by(|(a_id, a), (b_id, b)| {
        a.date.cmp(&b.date).then_with(|| match (a_id, b_id) {
            (Some(a_id), Some(b_id)) => compare_ids(a_id, b_id),
            _ => a_id.is_some().cmp(&b_id.is_some()),
        })
    });

    let series = ordered
        .iter()
        .filter_map(|(assessment_id, entry)| {
            mean(entry.areas.values().copied()).map(|average_support| SeriesPoint {
                assessment_id: assessment_id.clone(),
                date: entry.date,
                average_support,
            })
        })
        .collect();

    let category_snapshot = match ordered.last() {
        Some((_, latest)) => order_snapshot(
            checklist,
            latest
                .areas
                .iter()
                .map(|(category_id, average_support)| CategorySnapshot {
                    category_id: category_id.clone(),
                    average_support: *average_support,
                })
                .collect(),
        )?,
        None => Vec::new(),
    };

    Ok(SubjectDashboard {
        series,
        category_snapshot,
    })
}

/// Puts snapshot entries into checklist category order.
pub fn order_snapshot(
    checklist: &Checklist,
    snapshot: Vec<CategorySnapshot>,
) -> Result<Vec<CategorySnapshot>, ReferenceError> {
    let mut by_category = BTreeMap::new();
    for entry in snapshot {
        checklist.require_category(&entry.category_id)?;
        by_category.insert(entry.category_id.clone(), entry);
    }
    Ok(checklist
        .categories()
        .iter()
        .filter_map(|category| by_category.remove(&category.id))
        .collect())
}

/// Normalizes either remote dashboard shape.
pub fn resolve_payload(
    checklist: &Checklist,
    payload: SubjectDashboardPayload,
) -> Result<SubjectDashboard, ReferenceError> {
    match payload {
        SubjectDashboardPayload::Aggregated(dashboard) => Ok(SubjectDashboard {
            series: dashboard.series,
            category_snapshot: order_snapshot(checklist, dashboard.category_snapshot)?,
        }),
        SubjectDashboardPayload::Raw { series } => from_raw_series(checklist, &series),
    }
}

/// A subject whose latest finalized assessment still needs support on one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchlistEntry {
    pub subject_id: SubjectId,
    pub assessment_id: AssessmentId,
    pub date: NaiveDate,
    pub support: Support,
    pub freq: Option<Frequency>,
    #[serde(rename = "gen")]
    pub generalization: Option<Generalization>,
}

/// Latest non-deleted finalized assessment of every subject.
pub fn latest_finalized_per_subject(assessments: &[Assessment]) -> Vec<&Assessment> {
    let mut latest: BTreeMap<&str, &Assessment> = BTreeMap::new();
    for assessment in assessments
        .iter()
        .filter(|assessment| assessment.is_active() && assessment.is_finalized())
    {
        latest
            .entry(assessment.subject_id.as_str())
            .and_modify(|current| {
                if chronological(*current, assessment) == Ordering::Less {
                    *current = assessment;
                }
            })
            .or_insert(assessment);
    }
    let mut picked: Vec<&Assessment> = latest.into_values().collect();
    picked.sort_by(|a, b| compare_ids(&a.subject_id, &b.subject_id));
    picked
}

/// Subjects whose latest finalized assessment rates `item_id` at or below
/// `max_support`. Subjects without a response for the item are skipped.
pub fn item_watchlist(
    checklist: &Checklist,
    item_id: &str,
    history: &[AssessmentResponses],
    max_support: Support,
) -> Result<Vec<WatchlistEntry>, ReferenceError> {
    checklist.require_item(item_id)?;
    let assessments: Vec<Assessment> = history
        .iter()
        .map(|entry| entry.assessment.clone())
        .collect();

    let mut entries = Vec::new();
    for latest in latest_finalized_per_subject(&assessments) {
        let Some(entry) = history
            .iter()
            .find(|entry| entry.assessment.id == latest.id)
        else {
            continue;
        };
        check_responses(checklist, entry)?;
        let Some(response) = entry
            .responses
            .iter()
            .find(|response| response.item_id == item_id)
        else {
            continue;
        };
        if response.support <= max_support {
            entries.push(WatchlistEntry {
                subject_id: latest.subject_id.clone(),
                assessment_id: latest.id.clone(),
                date: latest.date,
                support: response.support,
                freq: response.freq,
                generalization: response.generalization,
            });
        }
    }
    Ok(entries)
}

/// Fetches history through the api and aggregates it.
pub struct DashboardService<A: AssessmentApi> {
    api: Arc<A>,
    checklist: Arc<Checklist>,
}

impl<A: AssessmentApi> DashboardService<A> {
    pub fn new(api: Arc<A>, checklist: Arc<Checklist>) -> Self {
        Self { api, checklist }
    }

    async fn with_responses(
        &self,
        assessments: Vec<Assessment>,
    ) -> Result<Vec<AssessmentResponses>, FetchError> {
        let mut history = Vec::with_capacity(assessments.len());
        for assessment in assessments {
            let responses = self
                .api
                .list_responses(&assessment.id)
                .await
                .map_err(|err| FetchError::from_api("responses", err))?;
            history.push(AssessmentResponses {
                assessment,
                responses,
            });
        }
        Ok(history)
    }

    /// Non-deleted assessments of `subject_id` with their responses.
    pub async fn history(&self, subject_id: &str) -> Result<Vec<AssessmentResponses>, FetchError> {
        let assessments: Vec<Assessment> = self
            .api
            .list_assessments()
            .await
            .map_err(|err| FetchError::from_api("assessments", err))?
            .into_iter()
            .filter(|assessment| assessment.subject_id == subject_id && assessment.is_active())
            .collect();
        debug!(
            "event=dashboard_history module=dashboard status=ok subject={} assessments={}",
            subject_id,
            assessments.len()
        );
        self.with_responses(assessments).await
    }

    /// Aggregates the subject's dashboard client-side.
    pub async fn subject_dashboard(
        &self,
        subject_id: &str,
        options: AggregateOptions,
    ) -> Result<SubjectDashboard, FetchError> {
        let history = self.history(subject_id).await?;
        let dashboard = aggregate(&self.checklist, subject_id, &history, options)?;
        info!(
            "event=dashboard_aggregate module=dashboard status=ok subject={} points={} categories={}",
            subject_id,
            dashboard.series.len(),
            dashboard.category_snapshot.len()
        );
        Ok(dashboard)
    }

    /// Consumes the remote dashboard endpoint.
    pub async fn remote_subject_dashboard(
        &self,
        subject_id: &str,
    ) -> Result<SubjectDashboard, FetchError> {
        let payload = self
            .api
            .subject_dashboard(subject_id)
            .await
            .map_err(|err| FetchError::from_api("dashboard", err))?;
        Ok(resolve_payload(&self.checklist, payload)?)
    }

    /// Item watchlist across every subject.
    pub async fn watchlist(
        &self,
        item_id: &str,
        max_support: Support,
    ) -> Result<Vec<WatchlistEntry>, FetchError> {
        self.checklist.require_item(item_id)?;
        let assessments = self
            .api
            .list_assessments()
            .await
            .map_err(|err| FetchError::from_api("assessments", err))?;
        let latest: Vec<Assessment> = latest_finalized_per_subject(&assessments)
            .into_iter()
            .cloned()
            .collect();
        let history = self.with_responses(latest).await?;
        Ok(item_watchlist(
            &self.checklist,
            item_id,
            &history,
            max_support,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        aggregate, average_support, from_raw_series, item_watchlist, AggregateOptions,
        AssessmentResponses, DEFAULT_WATCHLIST_MAX_SUPPORT,
    };
    use crate::api::RawSeriesEntry;
    use crate::model::assessment::{Assessment, AssessmentStatus};
    use crate::model::checklist::{Checklist, ChecklistCategory, ChecklistItem, ReferenceError};
    use crate::model::response::{Response, Support};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn checklist() -> Checklist {
        let category = |id: &str, items: &[&str]| ChecklistCategory {
            id: id.to_string(),
            name: id.to_string(),
            items: items
                .iter()
                .map(|item| ChecklistItem {
                    id: item.to_string(),
                    label: item.to_string(),
                })
                .collect(),
        };
        Checklist::new(None, vec![category("C1", &["I1", "I2"]), category("C2", &["I3"])])
            .expect("valid checklist")
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).expect("valid date")
    }

    fn response(assessment: &str, item: &str, support: u8) -> Response {
        let mut response = Response::empty(assessment, item);
        response.support = Support::new(support).expect("valid support");
        response
    }

    fn entry(id: &str, subject: &str, day: u32, responses: &[(&str, u8)]) -> AssessmentResponses {
        AssessmentResponses {
            assessment: Assessment::draft(id, subject, date(day)),
            responses: responses
                .iter()
                .map(|(item, support)| response(id, item, *support))
                .collect(),
        }
    }

    #[test]
    fn average_support_distinguishes_no_data_from_zero() {
        assert_eq!(average_support(&[]), None);
        assert_eq!(average_support(&[response("1", "I1", 0)]), Some(0.0));
        assert_eq!(
            average_support(&[response("1", "I1", 0), response("1", "I2", 3)]),
            Some(1.5)
        );
    }

    #[test]
    fn series_orders_by_date_then_numeric_id_and_skips_deleted() {
        let mut deleted = entry("3", "s1", 2, &[("I1", 3)]);
        deleted.assessment.soft_delete();
        let history = vec![
            entry("10", "s1", 5, &[("I1", 2)]),
            entry("9", "s1", 5, &[("I1", 1)]),
            entry("2", "s1", 1, &[("I1", 0), ("I3", 3)]),
            entry("4", "s2", 3, &[("I1", 3)]),
            deleted,
        ];

        let dashboard = aggregate(&checklist(), "s1", &history, AggregateOptions::default())
            .expect("aggregate");
        let ids: Vec<_> = dashboard
            .series
            .iter()
            .map(|point| point.assessment_id.clone().unwrap_or_default())
            .collect();
        assert_eq!(ids, vec!["2", "9", "10"]);
        assert_eq!(dashboard.series[0].average_support, 1.5);

        let again = aggregate(&checklist(), "s1", &history, AggregateOptions::default())
            .expect("aggregate");
        assert_eq!(dashboard, again);
    }

    #[test]
    fn snapshot_uses_latest_assessment_and_omits_empty_categories() {
        let history = vec![
            entry("1", "s1", 1, &[("I3", 3)]),
            entry("2", "s1", 2, &[("I2", 1), ("I1", 2)]),
        ];
        let dashboard = aggregate(&checklist(), "s1", &history, AggregateOptions::default())
            .expect("aggregate");
        assert_eq!(dashboard.category_snapshot.len(), 1);
        assert_eq!(dashboard.category_snapshot[0].category_id, "C1");
        assert_eq!(dashboard.category_snapshot[0].average_support, 1.5);
    }

    #[test]
    fn finalized_only_skips_drafts() {
        let mut finalized = entry("1", "s1", 1, &[("I1", 3)]);
        finalized.assessment.status = AssessmentStatus::Finalized;
        let history = vec![finalized, entry("2", "s1", 2, &[("I1", 0)])];

        let options = AggregateOptions {
            finalized_only: true,
        };
        let dashboard = aggregate(&checklist(), "s1", &history, options).expect("aggregate");
        assert_eq!(dashboard.series.len(), 1);
        assert_eq!(dashboard.category_snapshot[0].average_support, 3.0);
    }

    #[test]
    fn aggregate_rejects_unknown_items() {
        let history = vec![entry("1", "s1", 1, &[("ZZ", 1)])];
        let err = aggregate(&checklist(), "s1", &history, AggregateOptions::default())
            .expect_err("unknown item");
        assert_eq!(err, ReferenceError::UnknownItem("ZZ".to_string()));
    }

    #[test]
    fn raw_series_is_aggregated_client_side() {
        let areas = |pairs: &[(&str, f64)]| -> BTreeMap<String, f64> {
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        };
        let entries = vec![
            RawSeriesEntry {
                assessment_id: Some(serde_json::json!(8)),
                date: date(9),
                areas: areas(&[("C2", 1.0), ("C1", 2.0)]),
            },
            RawSeriesEntry {
                assessment_id: Some(serde_json::json!(5)),
                date: date(3),
                areas: areas(&[("C1", 3.0)]),
            },
        ];
        let dashboard = from_raw_series(&checklist(), &entries).expect("known areas");
        assert_eq!(dashboard.series[0].assessment_id.as_deref(), Some("5"));
        assert_eq!(dashboard.series[1].average_support, 1.5);
        let snapshot: Vec<_> = dashboard
            .category_snapshot
            .iter()
            .map(|entry| entry.category_id.as_str())
            .collect();
        assert_eq!(snapshot, vec!["C1", "C2"]);
    }

    #[test]
    fn watchlist_uses_latest_finalized_assessment_per_subject() {
        let finalize = |mut entry: AssessmentResponses| {
            entry.assessment.status = AssessmentStatus::Finalized;
            entry
        };
        let history = vec![
            finalize(entry("1", "s1", 1, &[("I1", 0)])),
            finalize(entry("2", "s1", 4, &[("I1", 3)])),
            finalize(entry("3", "s2", 2, &[("I1", 1)])),
            entry("4", "s2", 6, &[("I1", 3)]),
            finalize(entry("5", "s3", 2, &[("I2", 0)])),
        ];

        let max = Support::new(DEFAULT_WATCHLIST_MAX_SUPPORT).expect("valid threshold");
        let rows = item_watchlist(&checklist(), "I1", &history, max).expect("known item");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].subject_id, "s2");
        assert_eq!(rows[0].assessment_id, "3");
        assert_eq!(rows[0].support.value(), 1);
    }
}
