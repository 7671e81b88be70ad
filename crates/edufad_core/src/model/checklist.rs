//! Checklist taxonomy model.
//!
//! # Responsibility
//! - Hold the ordered category/item taxonomy every assessment is shaped by.
//! - Resolve item and category ids, reporting unknown ids as `ReferenceError`.
//!
//! # Invariants
//! - Item ids are unique across the whole checklist.
//! - Category and item order is the order received from the remote service.
//! - A `Checklist` is immutable after construction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable checklist item identifier, e.g. `AP01`.
pub type ItemId = String;
/// Stable checklist category identifier, e.g. `AP`.
pub type CategoryId = String;

/// One observable behavior in the checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ItemId,
    pub label: String,
}

/// Ordered group of checklist items. Serialized as an "area" on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistCategory {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ItemPosition {
    category: usize,
    order: usize,
}

/// Immutable reference taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChecklistDocument", into = "ChecklistDocument")]
pub struct Checklist {
    version: Option<String>,
    categories: Vec<ChecklistCategory>,
    item_index: HashMap<ItemId, ItemPosition>,
}

/// Wire envelope returned by `GET checklist`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChecklistDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    areas: Vec<ChecklistCategory>,
}

impl TryFrom<ChecklistDocument> for Checklist {
    type Error = ChecklistValidationError;

    fn try_from(value: ChecklistDocument) -> Result<Self, Self::Error> {
        Checklist::new(value.version, value.areas)
    }
}

impl From<Checklist> for ChecklistDocument {
    fn from(value: Checklist) -> Self {
        Self {
            version: value.version,
            areas: value.categories,
        }
    }
}

impl Checklist {
    /// Builds a checklist and its item index.
    ///
    /// # Errors
    /// - Empty category or item ids.
    /// - Duplicate category ids, or item ids repeated anywhere in the checklist.
    pub fn new(
        version: Option<String>,
        categories: Vec<ChecklistCategory>,
    ) -> Result<Self, ChecklistValidationError> {
        let mut item_index = HashMap::new();
        let mut seen_categories = HashMap::new();
        let mut order = 0usize;

        for (category_pos, category) in categories.iter().enumerate() {
            if category.id.trim().is_empty() {
                return Err(ChecklistValidationError::EmptyCategoryId);
            }
            if seen_categories.insert(category.id.as_str(), ()).is_some() {
                return Err(ChecklistValidationError::DuplicateCategoryId(
                    category.id.clone(),
                ));
            }
            for item in &category.items {
                if item.id.trim().is_empty() {
                    return Err(ChecklistValidationError::EmptyItemId(category.id.clone()));
                }
                let position = ItemPosition {
                    category: category_pos,
                    order,
                };
                if item_index.insert(item.id.clone(), position).is_some() {
                    return Err(ChecklistValidationError::DuplicateItemId(item.id.clone()));
                }
                order += 1;
            }
        }

        Ok(Self {
            version,
            categories,
            item_index,
        })
    }

    /// Checklist revision label, when the service provides one.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn categories(&self) -> &[ChecklistCategory] {
        &self.categories
    }

    pub fn category(&self, category_id: &str) -> Option<&ChecklistCategory> {
        self.categories
            .iter()
            .find(|category| category.id == category_id)
    }

    /// Total number of items across all categories.
    pub fn item_count(&self) -> usize {
        self.item_index.len()
    }

    pub fn contains_item(&self, item_id: &str) -> bool {
        self.item_index.contains_key(item_id)
    }

    /// Global position of an item in category/item order.
    pub fn item_order(&self, item_id: &str) -> Option<usize> {
        self.item_index.get(item_id).map(|position| position.order)
    }

    /// Same as [`Checklist::item_order`] but unknown ids are a reference error.
    pub fn require_item(&self, item_id: &str) -> Result<usize, ReferenceError> {
        self.item_order(item_id)
            .ok_or_else(|| ReferenceError::UnknownItem(item_id.to_string()))
    }

    pub fn category_of(&self, item_id: &str) -> Option<&ChecklistCategory> {
        self.item_index
            .get(item_id)
            .map(|position| &self.categories[position.category])
    }

    pub fn require_category(&self, category_id: &str) -> Result<&ChecklistCategory, ReferenceError> {
        self.category(category_id)
            .ok_or_else(|| ReferenceError::UnknownCategory(category_id.to_string()))
    }

    /// Iterates `(category, item)` pairs in checklist order.
    pub fn items(&self) -> impl Iterator<Item = (&ChecklistCategory, &ChecklistItem)> {
        self.categories
            .iter()
            .flat_map(|category| category.items.iter().map(move |item| (category, item)))
    }
}

/// Structural problems in a checklist payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecklistValidationError {
    EmptyCategoryId,
    DuplicateCategoryId(CategoryId),
    EmptyItemId(CategoryId),
    DuplicateItemId(ItemId),
}

impl Display for ChecklistValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCategoryId => write!(f, "checklist category id must not be empty"),
            Self::DuplicateCategoryId(id) => write!(f, "duplicate checklist category id: {id}"),
            Self::EmptyItemId(category) => {
                write!(f, "checklist item id must not be empty (category {category})")
            }
            Self::DuplicateItemId(id) => write!(f, "duplicate checklist item id: {id}"),
        }
    }
}

impl Error for ChecklistValidationError {}

/// A record refers to something outside the loaded checklist or session.
///
/// This always indicates a data-consistency bug upstream and must be
/// surfaced, never defaulted away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    UnknownItem(ItemId),
    UnknownCategory(CategoryId),
    /// A response carried an assessment id other than the open one.
    ForeignResponse {
        item_id: ItemId,
        expected_assessment: String,
        found_assessment: String,
    },
}

impl Display for ReferenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownItem(id) => write!(f, "item is not part of the checklist: {id}"),
            Self::UnknownCategory(id) => {
                write!(f, "category is not part of the checklist: {id}")
            }
            Self::ForeignResponse {
                item_id,
                expected_assessment,
                found_assessment,
            } => write!(
                f,
                "response for item {item_id} belongs to assessment {found_assessment}, \
                 expected {expected_assessment}"
            ),
        }
    }
}

impl Error for ReferenceError {}
