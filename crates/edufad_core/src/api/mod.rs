//! Remote assessment service contract.
//!
//! # Responsibility
//! - Define the async operations core consumes from the remote service.
//! - Define the transport-level error shape every remote call returns.
//!
//! # Invariants
//! - Every call is authenticated; a 401 always maps to `ApiError::Auth`.
//! - Non-2xx messages come from the body's `detail` field when present.
//! - Implementations never retry on their own.

pub mod http;

use crate::model::assessment::{Actor, Assessment};
use crate::model::checklist::Checklist;
use crate::model::derived::{ComparisonDelta, SubjectDashboard};
use crate::model::response::{Response, ResponseInput};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use http::HttpAssessmentApi;

pub type ApiResult<T> = Result<T, ApiError>;

/// Expired or missing credentials; handed to session management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    pub detail: String,
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "authentication failed: {}", self.detail)
    }
}

impl Error for AuthError {}

/// Failure of one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Auth(AuthError),
    /// Non-2xx response other than 401.
    Status { status: u16, detail: String },
    /// Connection, timeout or TLS failure.
    Transport(String),
    /// Body could not be decoded into the expected shape.
    Decode(String),
    /// Request URL could not be built from the configured base URL.
    InvalidEndpoint(String),
}

impl ApiError {
    pub fn auth_error(&self) -> Option<&AuthError> {
        match self {
            Self::Auth(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        self.auth_error().is_some()
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(err) => write!(f, "{err}"),
            Self::Status { status, detail } => write!(f, "remote error {status}: {detail}"),
            Self::Transport(message) => write!(f, "network error: {message}"),
            Self::Decode(message) => write!(f, "invalid remote payload: {message}"),
            Self::InvalidEndpoint(message) => write!(f, "invalid endpoint: {message}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Auth(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

/// Per-assessment entry of the raw dashboard payload: area id to average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeriesEntry {
    #[serde(default)]
    pub assessment_id: Option<serde_json::Value>,
    pub date: NaiveDate,
    #[serde(default)]
    pub areas: BTreeMap<String, f64>,
}

/// Dashboard payload as served by `GET dashboard/subject/{id}`.
///
/// Older servers return per-assessment area maps that are aggregated
/// client-side; newer ones return the aggregated shape directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectDashboardPayload {
    Aggregated(SubjectDashboard),
    Raw { series: Vec<RawSeriesEntry> },
}

/// Body of `GET dashboard/compare`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareEnvelope {
    pub deltas: Vec<ComparisonDelta>,
}

/// Remote operations consumed by core.
#[async_trait]
pub trait AssessmentApi: Send + Sync {
    async fn load_checklist(&self) -> ApiResult<Checklist>;
    async fn current_actor(&self) -> ApiResult<Actor>;
    async fn acknowledge_disclaimer(&self) -> ApiResult<Actor>;
    async fn list_assessments(&self) -> ApiResult<Vec<Assessment>>;
    async fn get_assessment(&self, assessment_id: &str) -> ApiResult<Assessment>;
    async fn list_responses(&self, assessment_id: &str) -> ApiResult<Vec<Response>>;
    /// Creates or fully replaces the record keyed by `(assessment_id, item_id)`.
    async fn upsert_response(
        &self,
        assessment_id: &str,
        input: &ResponseInput,
    ) -> ApiResult<Response>;
    async fn subject_dashboard(&self, subject_id: &str) -> ApiResult<SubjectDashboardPayload>;
    async fn compare(&self, assessment_a: &str, assessment_b: &str)
        -> ApiResult<Vec<ComparisonDelta>>;
}

#[cfg(test)]
mod tests {
    use super::{ApiError, AuthError, SubjectDashboardPayload};

    #[test]
    fn raw_dashboard_payload_decodes_as_raw() {
        let json = serde_json::json!({
            "series": [
                {"assessment_id": 4, "date": "2024-03-01", "areas": {"AP": 1.5, "CO": 2.0}}
            ]
        });
        let payload: SubjectDashboardPayload = serde_json::from_value(json).expect("decode");
        match payload {
            SubjectDashboardPayload::Raw { series } => {
                assert_eq!(series.len(), 1);
                assert_eq!(series[0].areas.get("AP"), Some(&1.5));
            }
            other => panic!("expected raw payload, got {other:?}"),
        }
    }

    #[test]
    fn aggregated_dashboard_payload_accepts_camel_case() {
        let json = serde_json::json!({
            "series": [{"date": "2024-03-01", "averageSupport": 2.0}],
            "categorySnapshot": [{"categoryId": "C1", "averageSupport": 2.0}]
        });
        let payload: SubjectDashboardPayload = serde_json::from_value(json).expect("decode");
        assert!(matches!(payload, SubjectDashboardPayload::Aggregated(_)));
    }

    #[test]
    fn auth_errors_are_recognizable() {
        let err = ApiError::from(AuthError {
            detail: "token expired".to_string(),
        });
        assert!(err.is_auth());
        assert!(!ApiError::Transport("reset".to_string()).is_auth());
    }
}
