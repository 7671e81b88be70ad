//! Client-side stores.
//!
//! # Responsibility
//! - Cache the process-wide checklist.
//! - Hold the editable response values of the open assessment.
//!
//! # Invariants
//! - Stores never invent upstream data: unknown ids are surfaced as
//!   `ReferenceError`, remote failures as `FetchError`.

pub mod checklist_store;
pub mod response_store;
