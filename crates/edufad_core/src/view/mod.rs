//! Versioned view-binding configuration.
//!
//! # Responsibility
//! - Declare, per layout version, which concrete selector renders each
//!   logical screen region.
//! - Validate a declared mapping once at startup.
//!
//! # Invariants
//! - Every `Region` is bound exactly once.
//! - Selectors are a single id, class or `data-` attribute selector.
//! - Bindings are chosen once and then only read; there is no per-call
//!   fallback lookup.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static SELECTOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(#[A-Za-z][\w-]*|\.[A-Za-z][\w-]*|\[data-[a-z][a-z0-9-]*\])$")
        .expect("valid selector regex")
});

/// Logical screen regions core renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    CategoryList,
    ResponseGrid,
    GateNotice,
    SaveNotice,
    ProgressChart,
    CategoryChart,
    CompareTable,
}

impl Region {
    pub const ALL: [Region; 7] = [
        Region::CategoryList,
        Region::ResponseGrid,
        Region::GateNotice,
        Region::SaveNotice,
        Region::ProgressChart,
        Region::CategoryChart,
        Region::CompareTable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CategoryList => "category_list",
            Self::ResponseGrid => "response_grid",
            Self::GateNotice => "gate_notice",
            Self::SaveNotice => "save_notice",
            Self::ProgressChart => "progress_chart",
            Self::CategoryChart => "category_chart",
            Self::CompareTable => "compare_table",
        }
    }
}

/// Page layout revision the bindings target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingVersion {
    /// Id-based layout.
    V1,
    /// `data-` attribute layout.
    #[default]
    V2,
}

impl BindingVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }

    fn table(self) -> [(Region, &'static str); 7] {
        match self {
            Self::V1 => [
                (Region::CategoryList, "#areas-list"),
                (Region::ResponseGrid, "#responses-container"),
                (Region::GateNotice, "#gate-notice"),
                (Region::SaveNotice, "#save-notice"),
                (Region::ProgressChart, "#profile-chart"),
                (Region::CategoryChart, "#category-chart"),
                (Region::CompareTable, "#compare-table"),
            ],
            Self::V2 => [
                (Region::CategoryList, "[data-areas-container]"),
                (Region::ResponseGrid, "[data-responses-container]"),
                (Region::GateNotice, "[data-gate-notice]"),
                (Region::SaveNotice, "[data-save-notice]"),
                (Region::ProgressChart, "[data-profile-chart]"),
                (Region::CategoryChart, "[data-category-chart]"),
                (Region::CompareTable, "[data-compare-table]"),
            ],
        }
    }
}

impl FromStr for BindingVersion {
    type Err = BindingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" => Ok(Self::V2),
            other => Err(BindingError::UnknownVersion(other.to_string())),
        }
    }
}

/// Region to selector mapping for one layout version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewBindings {
    version: BindingVersion,
    selectors: BTreeMap<Region, String>,
}

impl ViewBindings {
    /// Built-in bindings for `version`.
    pub fn for_version(version: BindingVersion) -> Self {
        Self {
            version,
            selectors: version
                .table()
                .iter()
                .map(|(region, selector)| (*region, (*selector).to_string()))
                .collect(),
        }
    }

    /// Validates a custom declaration.
    ///
    /// # Errors
    /// - A region is bound twice or not at all.
    /// - A selector is not a single id, class or `data-` attribute selector.
    pub fn declared<I, S>(version: BindingVersion, entries: I) -> Result<Self, BindingError>
    where
        I: IntoIterator<Item = (Region, S)>,
        S: Into<String>,
    {
        let mut selectors = BTreeMap::new();
        for (region, selector) in entries {
            let selector = selector.into().trim().to_string();
            if !SELECTOR_RE.is_match(&selector) {
                return Err(BindingError::InvalidSelector { region, selector });
            }
            if selectors.insert(region, selector).is_some() {
                return Err(BindingError::DuplicateRegion(region));
            }
        }
        if let Some(missing) = Region::ALL
            .iter()
            .find(|region| !selectors.contains_key(*region))
        {
            return Err(BindingError::MissingRegion(*missing));
        }

        Ok(Self { version, selectors })
    }

    pub fn version(&self) -> BindingVersion {
        self.version
    }

    pub fn selector(&self, region: Region) -> &str {
        // Every constructor binds all regions.
        self.selectors
            .get(&region)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// View-binding declaration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    UnknownVersion(String),
    DuplicateRegion(Region),
    MissingRegion(Region),
    InvalidSelector { region: Region, selector: String },
}

impl Display for BindingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownVersion(value) => {
                write!(f, "unknown view binding version `{value}`; expected v1|v2")
            }
            Self::DuplicateRegion(region) => {
                write!(f, "region bound more than once: {}", region.as_str())
            }
            Self::MissingRegion(region) => write!(f, "region not bound: {}", region.as_str()),
            Self::InvalidSelector { region, selector } => write!(
                f,
                "invalid selector `{selector}` for region {}",
                region.as_str()
            ),
        }
    }
}

impl Error for BindingError {}
