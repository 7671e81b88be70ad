//! Core domain logic for the EduFAD assessment client.
//! This crate is the single source of truth for response capture and
//! dashboard aggregation invariants.

pub mod api;
pub mod chart;
pub mod config;
pub mod grid;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod view;

pub use api::{ApiError, ApiResult, AssessmentApi, AuthError, HttpAssessmentApi};
pub use config::{ClientConfig, ConfigError};
pub use grid::permission::{can_edit, EditGate};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::assessment::{Actor, Assessment, AssessmentStatus, Role};
pub use model::checklist::{Checklist, ChecklistCategory, ChecklistItem, ReferenceError};
pub use model::derived::{CategorySnapshot, ComparisonDelta, SeriesPoint, SubjectDashboard};
pub use model::response::{Frequency, Generalization, Response, ResponseEdit, Support};
pub use service::autosave::{SaveCause, SaveError};
pub use service::session::{AppContext, EditingSession};
pub use store::checklist_store::{ChecklistStore, FetchError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
