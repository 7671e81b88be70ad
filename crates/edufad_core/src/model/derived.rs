//! Derived, never-persisted aggregate records.
//!
//! These are recomputed from assessments and responses on demand. Field
//! aliases accept the camelCase names some dashboard payloads use.

use crate::model::assessment::AssessmentId;
use crate::model::checklist::{CategoryId, ItemId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One assessment's average support on the progress line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    #[serde(default)]
    pub assessment_id: Option<AssessmentId>,
    pub date: NaiveDate,
    #[serde(alias = "averageSupport")]
    pub average_support: f64,
}

/// Latest-assessment average support for one checklist category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySnapshot {
    #[serde(alias = "categoryId")]
    pub category_id: CategoryId,
    #[serde(alias = "averageSupport")]
    pub average_support: f64,
}

/// Aggregated dashboard for one subject.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubjectDashboard {
    pub series: Vec<SeriesPoint>,
    #[serde(alias = "categorySnapshot")]
    pub category_snapshot: Vec<CategorySnapshot>,
}

impl SubjectDashboard {
    /// No assessment contributed any data.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty() && self.category_snapshot.is_empty()
    }
}

/// Support change for one item between an ordered pair of assessments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonDelta {
    pub item_id: ItemId,
    pub delta: i32,
}
