//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate remote calls, stores and pure aggregation into use-case
//!   level APIs.
//! - Convert remote failures into the core error taxonomy at the call site.
//!
//! # Invariants
//! - Aggregation, compare and summary math are pure functions; the service
//!   structs only fetch and delegate.

pub mod autosave;
pub mod compare;
pub mod dashboard;
pub mod refresh;
pub mod session;
pub mod summary;
