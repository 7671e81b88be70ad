//! Domain model for checklist, assessment and response records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep wire naming (`profile_id`, `assessment_date`, `gen`) at the serde
//!   boundary so the rest of core uses domain names.
//!
//! # Invariants
//! - Identifiers are opaque strings; numeric wire ids are normalized.
//! - `support` is always within `0..=3` once a record exists in memory.

pub mod assessment;
pub mod checklist;
pub mod derived;
pub mod response;

use serde::{Deserialize, Deserializer};
use std::cmp::Ordering;

/// Deserializes an identifier that the remote service may send either as a
/// JSON string or as an integer.
pub(crate) fn id_from_str_or_int<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Text(value) => Ok(value),
        RawId::Int(value) => Ok(value.to_string()),
    }
}

/// Orders identifiers numerically when both parse as integers, otherwise
/// lexicographically.
///
/// Remote ids are database integers rendered as strings, so plain string
/// order would put `"10"` before `"9"`.
pub fn compare_ids(left: &str, right: &str) -> Ordering {
    match (left.parse::<u64>(), right.parse::<u64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r),
        _ => left.cmp(right),
    }
}
