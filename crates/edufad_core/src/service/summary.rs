//! Auto-generated assessment summary.
//!
//! # Responsibility
//! - Render the per-category summary text for one assessment.
//! - Cache generated text per assessment until an autosave invalidates it.
//!
//! # Invariants
//! - Categories appear in checklist order; categories without responses are
//!   left out.
//! - The cache never holds text older than the last successful save it has
//!   been told about.

use crate::model::assessment::AssessmentId;
use crate::model::checklist::{Checklist, ReferenceError};
use crate::model::response::Response;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Support values at or below this count as critical indicators.
pub const CRITICAL_SUPPORT_MAX: u8 = 1;

/// Builds the summary text from one assessment's responses.
///
/// One sentence pair per category that has responses, e.g.
/// `Autonomy: average support 1.5; critical indicators (support 0-1): 1 of 2.`
pub fn summarize_assessment(
    checklist: &Checklist,
    responses: &[Response],
) -> Result<String, ReferenceError> {
    let mut buckets: HashMap<&str, Vec<u8>> = HashMap::new();
    for response in responses {
        let category = checklist
            .category_of(&response.item_id)
            .ok_or_else(|| ReferenceError::UnknownItem(response.item_id.clone()))?;
        buckets
            .entry(category.id.as_str())
            .or_default()
            .push(response.support.value());
    }

    let lines: Vec<String> = checklist
        .categories()
        .iter()
        .filter_map(|category| {
            buckets
                .get(category.id.as_str())
                .map(|supports| (category, supports))
        })
        .map(|(category, supports)| {
            let total: u32 = supports.iter().copied().map(u32::from).sum();
            let avg = f64::from(total) / supports.len() as f64;
            let critical = supports
                .iter()
                .filter(|support| **support <= CRITICAL_SUPPORT_MAX)
                .count();
            format!(
                "{}: average support {avg:.1}; critical indicators (support 0-{CRITICAL_SUPPORT_MAX}): {critical} of {}.",
                category.name,
                supports.len()
            )
        })
        .collect();
    Ok(lines.join(" "))
}

/// Generated summaries keyed by assessment.
///
/// Each assessment carries a generation bumped by [`SummaryCache::invalidate`].
/// Text generated from data read before an invalidation is returned to the
/// caller but not cached.
#[derive(Debug, Default)]
pub struct SummaryCache {
    state: Mutex<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    texts: HashMap<AssessmentId, Arc<str>>,
    generations: HashMap<AssessmentId, u64>,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, assessment_id: &str) -> Option<Arc<str>> {
        self.state().texts.get(assessment_id).cloned()
    }

    /// Current generation; read it before fetching the data a summary is
    /// built from.
    pub fn generation(&self, assessment_id: &str) -> u64 {
        self.state()
            .generations
            .get(assessment_id)
            .copied()
            .unwrap_or_default()
    }

    /// Returns the cached text or the output of `generate`.
    ///
    /// The output is stored only if no invalidation happened since
    /// `observed` was read. A failed generation leaves the cache untouched.
    pub fn get_or_generate<E>(
        &self,
        assessment_id: &str,
        observed: u64,
        generate: impl FnOnce() -> Result<String, E>,
    ) -> Result<Arc<str>, E> {
        if let Some(text) = self.get(assessment_id) {
            return Ok(text);
        }
        let text: Arc<str> = Arc::from(generate()?);
        let mut state = self.state();
        let current = state.generations.get(assessment_id).copied().unwrap_or_default();
        if current == observed {
            state
                .texts
                .insert(assessment_id.to_string(), Arc::clone(&text));
        }
        Ok(text)
    }

    /// Drops the cached text and starts a new generation. Returns whether an
    /// entry existed.
    pub fn invalidate(&self, assessment_id: &str) -> bool {
        let mut state = self.state();
        *state
            .generations
            .entry(assessment_id.to_string())
            .or_default() += 1;
        state.texts.remove(assessment_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{summarize_assessment, SummaryCache};
    use crate::model::checklist::{Checklist, ChecklistCategory, ChecklistItem, ReferenceError};
    use crate::model::response::{Response, Support};

    fn checklist() -> Checklist {
        let category = |id: &str, name: &str, items: &[&str]| ChecklistCategory {
            id: id.to_string(),
            name: name.to_string(),
            items: items
                .iter()
                .map(|item| ChecklistItem {
                    id: item.to_string(),
                    label: item.to_string(),
                })
                .collect(),
        };
        Checklist::new(
            None,
            vec![
                category("AP", "Autonomy", &["AP01", "AP02"]),
                category("CO", "Communication", &["CO01"]),
            ],
        )
        .expect("valid checklist")
    }

    fn response(item: &str, support: u8) -> Response {
        let mut response = Response::empty("1", item);
        response.support = Support::new(support).expect("valid support");
        response
    }

    #[test]
    fn summary_lists_categories_in_checklist_order() {
        let text = summarize_assessment(
            &checklist(),
            &[response("CO01", 3), response("AP01", 2), response("AP02", 1)],
        )
        .expect("known items");
        assert_eq!(
            text,
            "Autonomy: average support 1.5; critical indicators (support 0-1): 1 of 2. \
             Communication: average support 3.0; critical indicators (support 0-1): 0 of 1."
        );
    }

    #[test]
    fn summary_of_no_responses_is_empty() {
        assert_eq!(summarize_assessment(&checklist(), &[]).expect("empty"), "");
    }

    #[test]
    fn summary_rejects_unknown_item() {
        let err = summarize_assessment(&checklist(), &[response("ZZ01", 0)])
            .expect_err("unknown item");
        assert_eq!(err, ReferenceError::UnknownItem("ZZ01".to_string()));
    }

    #[test]
    fn cache_regenerates_after_invalidate() {
        let cache = SummaryCache::new();
        let first = cache
            .get_or_generate::<ReferenceError>("7", 0, || Ok("first".to_string()))
            .expect("generated");
        let cached = cache
            .get_or_generate::<ReferenceError>("7", 0, || Ok("second".to_string()))
            .expect("cached");
        assert_eq!(&*first, "first");
        assert_eq!(&*cached, "first");

        assert!(cache.invalidate("7"));
        assert!(!cache.invalidate("7"));
        let generation = cache.generation("7");
        let fresh = cache
            .get_or_generate::<ReferenceError>("7", generation, || Ok("second".to_string()))
            .expect("regenerated");
        assert_eq!(&*fresh, "second");
        assert_eq!(cache.get("7").as_deref(), Some("second"));
    }

    #[test]
    fn text_read_before_invalidate_is_not_cached() {
        let cache = SummaryCache::new();
        let observed = cache.generation("7");
        assert!(!cache.invalidate("7"));

        let stale = cache
            .get_or_generate::<ReferenceError>("7", observed, || Ok("stale".to_string()))
            .expect("generated");
        assert_eq!(&*stale, "stale");
        assert_eq!(cache.get("7"), None);
    }
}
