//! Process-wide checklist cache.
//!
//! # Responsibility
//! - Fetch the checklist taxonomy once and hand out shared read-only copies.
//! - Convert remote failures into `FetchError` at the call boundary.
//!
//! # Invariants
//! - At most one successful fetch per store; concurrent first loads share it.
//! - A failed load leaves the cache empty so a later load may retry.

use crate::api::{ApiError, AssessmentApi, AuthError};
use crate::model::checklist::{Checklist, ReferenceError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Reference or view data could not be loaded; the view must not render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Credentials rejected; belongs to session management.
    Auth(AuthError),
    /// Remote call failed.
    Unavailable {
        resource: &'static str,
        cause: ApiError,
    },
    /// Remote payload was malformed or inconsistent.
    InvalidData {
        resource: &'static str,
        message: String,
    },
    /// Remote data referred to ids outside the checklist.
    Reference(ReferenceError),
}

impl FetchError {
    /// Classifies a remote failure for `resource`.
    pub fn from_api(resource: &'static str, err: ApiError) -> Self {
        match err {
            ApiError::Auth(auth) => Self::Auth(auth),
            ApiError::Decode(message) => Self::InvalidData { resource, message },
            cause => Self::Unavailable { resource, cause },
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(err) => write!(f, "{err}"),
            Self::Unavailable { resource, cause } => {
                write!(f, "{resource} unavailable: {cause}")
            }
            Self::InvalidData { resource, message } => {
                write!(f, "{resource} payload is invalid: {message}")
            }
            Self::Reference(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Auth(err) => Some(err),
            Self::Unavailable { cause, .. } => Some(cause),
            Self::InvalidData { .. } => None,
            Self::Reference(err) => Some(err),
        }
    }
}

impl From<ReferenceError> for FetchError {
    fn from(value: ReferenceError) -> Self {
        Self::Reference(value)
    }
}

/// Lazily loaded, process-lifetime checklist.
pub struct ChecklistStore<A: AssessmentApi> {
    api: Arc<A>,
    cached: OnceCell<Arc<Checklist>>,
}

impl<A: AssessmentApi> ChecklistStore<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            cached: OnceCell::new(),
        }
    }

    /// Store seeded with an already loaded checklist; `load` never fetches.
    pub fn with_checklist(api: Arc<A>, checklist: Arc<Checklist>) -> Self {
        Self {
            api,
            cached: OnceCell::new_with(Some(checklist)),
        }
    }

    /// Returns the checklist, fetching it on first use.
    pub async fn load(&self) -> Result<Arc<Checklist>, FetchError> {
        let checklist = self
            .cached
            .get_or_try_init(|| async {
                match self.api.load_checklist().await {
                    Ok(checklist) => {
                        info!(
                            "event=checklist_load module=checklist status=ok categories={} items={}",
                            checklist.categories().len(),
                            checklist.item_count()
                        );
                        Ok(Arc::new(checklist))
                    }
                    Err(err) => {
                        error!(
                            "event=checklist_load module=checklist status=error error={}",
                            err
                        );
                        Err(FetchError::from_api("checklist", err))
                    }
                }
            })
            .await?;
        Ok(Arc::clone(checklist))
    }

    /// Checklist if a previous load succeeded.
    pub fn cached(&self) -> Option<Arc<Checklist>> {
        self.cached.get().cloned()
    }
}
