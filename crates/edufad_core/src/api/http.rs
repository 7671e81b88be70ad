//! `reqwest` implementation of the remote assessment service.
//!
//! # Responsibility
//! - Build endpoint URLs relative to the configured base URL.
//! - Attach bearer credentials and JSON bodies.
//! - Convert HTTP failures into `ApiError` at the call boundary.

use crate::api::{ApiError, ApiResult, AssessmentApi, AuthError, CompareEnvelope, SubjectDashboardPayload};
use crate::config::ClientConfig;
use crate::model::assessment::{Actor, Assessment};
use crate::model::checklist::Checklist;
use crate::model::derived::ComparisonDelta;
use crate::model::response::{Response, ResponseInput};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("edufad-core/", env!("CARGO_PKG_VERSION"));
const FALLBACK_ERROR_DETAIL: &str = "unexpected error";

/// HTTP client for the remote assessment service.
#[derive(Debug, Clone)]
pub struct HttpAssessmentApi {
    client: Client,
    base_url: Url,
    token: String,
}

impl HttpAssessmentApi {
    /// Creates a client for `base_url` authenticated with `token`.
    pub fn new(base_url: Url, token: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidEndpoint(format!(
                "base url cannot carry paths: {base_url}"
            )));
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        Self::new(
            config.base_url.clone(),
            config.token.clone(),
            config.request_timeout,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        debug!("event=api_request module=api method=GET url={url}");
        self.send(self.client.get(url)).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Option<&ResponseInput>,
    ) -> ApiResult<T> {
        debug!("event=api_request module=api method=POST url={url}");
        let request = match body {
            Some(body) => self.client.post(url).json(body),
            None => self.client.post(url),
        };
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        if !status.is_success() {
            let err = error_from_status(status, &body);
            warn!(
                "event=api_response module=api status=error http_status={} error={}",
                status.as_u16(),
                err
            );
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[async_trait]
impl AssessmentApi for HttpAssessmentApi {
    async fn load_checklist(&self) -> ApiResult<Checklist> {
        self.get_json(endpoint_url(&self.base_url, &["checklist"])?)
            .await
    }

    async fn current_actor(&self) -> ApiResult<Actor> {
        self.get_json(endpoint_url(&self.base_url, &["auth", "me"])?)
            .await
    }

    async fn acknowledge_disclaimer(&self) -> ApiResult<Actor> {
        self.post_json(
            endpoint_url(&self.base_url, &["auth", "ack-disclaimer"])?,
            None,
        )
        .await
    }

    async fn list_assessments(&self) -> ApiResult<Vec<Assessment>> {
        self.get_json(endpoint_url(&self.base_url, &["assessments"])?)
            .await
    }

    async fn get_assessment(&self, assessment_id: &str) -> ApiResult<Assessment> {
        self.get_json(endpoint_url(
            &self.base_url,
            &["assessments", assessment_id],
        )?)
        .await
    }

    async fn list_responses(&self, assessment_id: &str) -> ApiResult<Vec<Response>> {
        self.get_json(endpoint_url(
            &self.base_url,
            &["assessments", assessment_id, "responses"],
        )?)
        .await
    }

    async fn upsert_response(
        &self,
        assessment_id: &str,
        input: &ResponseInput,
    ) -> ApiResult<Response> {
        self.post_json(
            endpoint_url(&self.base_url, &["assessments", assessment_id, "responses"])?,
            Some(input),
        )
        .await
    }

    async fn subject_dashboard(&self, subject_id: &str) -> ApiResult<SubjectDashboardPayload> {
        self.get_json(endpoint_url(
            &self.base_url,
            &["dashboard", "subject", subject_id],
        )?)
        .await
    }

    async fn compare(
        &self,
        assessment_a: &str,
        assessment_b: &str,
    ) -> ApiResult<Vec<ComparisonDelta>> {
        let mut url = endpoint_url(&self.base_url, &["dashboard", "compare"])?;
        url.query_pairs_mut()
            .append_pair("a", assessment_a)
            .append_pair("b", assessment_b);
        let envelope: CompareEnvelope = self.get_json(url).await?;
        Ok(envelope.deltas)
    }
}

/// Appends percent-encoded path segments to `base`.
///
/// A trailing slash on the base is ignored, so `https://host/api` and
/// `https://host/api/` resolve the same endpoints.
pub(crate) fn endpoint_url(base: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidEndpoint(format!("base url cannot carry paths: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn error_from_status(status: StatusCode, body: &str) -> ApiError {
    let detail = extract_detail(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or(FALLBACK_ERROR_DETAIL)
            .to_string()
    });
    if status == StatusCode::UNAUTHORIZED {
        return ApiError::Auth(AuthError { detail });
    }
    ApiError::Status {
        status: status.as_u16(),
        detail,
    }
}

/// Reads `detail` from an error body; structured details are kept as JSON.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) if text.trim().is_empty() => None,
        serde_json::Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
