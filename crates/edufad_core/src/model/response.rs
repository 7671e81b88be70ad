//! Per-item response record.
//!
//! # Responsibility
//! - Define the record stored once per `(assessment_id, item_id)`.
//! - Provide typed single-field edits applied by the grid.
//! - Define the upsert body sent to the remote service.
//!
//! # Invariants
//! - `support` is within `0..=3`; anything else is rejected at decode time.
//! - `freq`/`generalization` are categorical; "none" is `None` and an empty
//!   wire string decodes as `None`.
//! - An upsert always carries the full record, never a single field.

use crate::model::assessment::AssessmentId;
use crate::model::checklist::ItemId;
use crate::model::id_from_str_or_int;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Upper bound of the support scale.
pub const SUPPORT_MAX: u8 = 3;

/// Ordinal 0..=3 rating of assistance required for a behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Support(u8);

impl Support {
    pub const ZERO: Support = Support(0);

    /// Validates a raw support value.
    pub fn new(value: u8) -> Result<Self, ResponseValidationError> {
        if value > SUPPORT_MAX {
            return Err(ResponseValidationError::SupportOutOfRange(i64::from(value)));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }

    /// Every valid support value in ascending order.
    pub fn all() -> [Support; 4] {
        [Support(0), Support(1), Support(2), Support(3)]
    }
}

impl TryFrom<i64> for Support {
    type Error = ResponseValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(raw) if raw <= SUPPORT_MAX => Ok(Self(raw)),
            _ => Err(ResponseValidationError::SupportOutOfRange(value)),
        }
    }
}

impl From<Support> for u8 {
    fn from(value: Support) -> Self {
        value.0
    }
}

impl Display for Support {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Frequency axis code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    F0,
    F1,
    F2,
    F3,
    F4,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::F0 => "F0",
            Self::F1 => "F1",
            Self::F2 => "F2",
            Self::F3 => "F3",
            Self::F4 => "F4",
        }
    }
}

impl FromStr for Frequency {
    type Err = ResponseValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "F0" => Ok(Self::F0),
            "F1" => Ok(Self::F1),
            "F2" => Ok(Self::F2),
            "F3" => Ok(Self::F3),
            "F4" => Ok(Self::F4),
            other => Err(ResponseValidationError::UnknownFrequency(other.to_string())),
        }
    }
}

/// Generalization axis code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Generalization {
    G0,
    G1,
    G2,
    G3,
}

impl Generalization {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::G0 => "G0",
            Self::G1 => "G1",
            Self::G2 => "G2",
            Self::G3 => "G3",
        }
    }
}

impl FromStr for Generalization {
    type Err = ResponseValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "G0" => Ok(Self::G0),
            "G1" => Ok(Self::G1),
            "G2" => Ok(Self::G2),
            "G3" => Ok(Self::G3),
            other => Err(ResponseValidationError::UnknownGeneralization(
                other.to_string(),
            )),
        }
    }
}

/// Response record for one checklist item in one assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(deserialize_with = "id_from_str_or_int")]
    pub assessment_id: AssessmentId,
    pub item_id: ItemId,
    pub support: Support,
    #[serde(default, deserialize_with = "code_or_none")]
    pub freq: Option<Frequency>,
    /// Serialized as `gen` to match the remote schema.
    #[serde(rename = "gen", default, deserialize_with = "code_or_none")]
    pub generalization: Option<Generalization>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl Response {
    /// Default record used for items without a stored response.
    pub fn empty(assessment_id: impl Into<AssessmentId>, item_id: impl Into<ItemId>) -> Self {
        Self {
            assessment_id: assessment_id.into(),
            item_id: item_id.into(),
            support: Support::ZERO,
            freq: None,
            generalization: None,
            context: None,
            note: None,
        }
    }

    /// Applies one single-field edit, leaving sibling fields untouched.
    pub fn apply(&mut self, edit: ResponseEdit) {
        match edit {
            ResponseEdit::Support(value) => self.support = value,
            ResponseEdit::Freq(value) => self.freq = value,
            ResponseEdit::Generalization(value) => self.generalization = value,
            ResponseEdit::Context(value) => self.context = normalize_text(value),
            ResponseEdit::Note(value) => self.note = normalize_text(value),
        }
    }
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn code_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(code) if code.eq_ignore_ascii_case("none") => Ok(None),
        Some(code) => code.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Editable response field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseField {
    Support,
    Freq,
    Generalization,
    Context,
    Note,
}

impl ResponseField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Support => "support",
            Self::Freq => "freq",
            Self::Generalization => "gen",
            Self::Context => "context",
            Self::Note => "note",
        }
    }
}

/// One typed single-field edit from the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEdit {
    Support(Support),
    Freq(Option<Frequency>),
    Generalization(Option<Generalization>),
    Context(Option<String>),
    Note(Option<String>),
}

impl ResponseEdit {
    pub fn field(&self) -> ResponseField {
        match self {
            Self::Support(_) => ResponseField::Support,
            Self::Freq(_) => ResponseField::Freq,
            Self::Generalization(_) => ResponseField::Generalization,
            Self::Context(_) => ResponseField::Context,
            Self::Note(_) => ResponseField::Note,
        }
    }
}

/// Upsert body for `POST assessments/{id}/responses`.
///
/// The assessment id travels in the path, every other field in the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInput {
    pub item_id: ItemId,
    pub support: Support,
    pub freq: Option<Frequency>,
    #[serde(rename = "gen")]
    pub generalization: Option<Generalization>,
    pub context: Option<String>,
    pub note: Option<String>,
}

impl From<&Response> for ResponseInput {
    fn from(value: &Response) -> Self {
        Self {
            item_id: value.item_id.clone(),
            support: value.support,
            freq: value.freq,
            generalization: value.generalization,
            context: value.context.clone(),
            note: value.note.clone(),
        }
    }
}

/// Malformed response values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseValidationError {
    SupportOutOfRange(i64),
    UnknownFrequency(String),
    UnknownGeneralization(String),
}

impl Display for ResponseValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SupportOutOfRange(value) => {
                write!(f, "support must be within 0..={SUPPORT_MAX}, got {value}")
            }
            Self::UnknownFrequency(value) => {
                write!(f, "unknown frequency code `{value}`; expected F0..F4")
            }
            Self::UnknownGeneralization(value) => {
                write!(f, "unknown generalization code `{value}`; expected G0..G3")
            }
        }
    }
}

impl Error for ResponseValidationError {}
