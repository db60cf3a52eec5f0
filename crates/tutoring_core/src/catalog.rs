//! crates/tutoring_core/src/catalog.rs
//!
//! Read-only tutor reference data and the fallback ranking built on it.

use crate::domain::TutorCatalogEntry;
use crate::ports::{PortError, PortResult};

/// Maximum number of alternative tutors suggested for a request.
pub const MAX_FALLBACK_TUTORS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct TutorCatalog {
    entries: Vec<TutorCatalogEntry>,
}

impl TutorCatalog {
    /// Wraps entries as given. Iteration order is insertion order.
    pub fn new(entries: Vec<TutorCatalogEntry>) -> Self {
        Self { entries }
    }

    /// Like [`TutorCatalog::new`] but rejects entries the ranking cannot use.
    pub fn try_new(entries: Vec<TutorCatalogEntry>) -> PortResult<Self> {
        for entry in &entries {
            if entry.tutor_id.trim().is_empty() {
                return Err(PortError::Invalid("catalog entry with empty tutor_id".into()));
            }
            if !entry.rating.is_finite() || !(0.0..=5.0).contains(&entry.rating) {
                return Err(PortError::Invalid(format!(
                    "rating {} of tutor {} is outside 0..=5",
                    entry.rating, entry.tutor_id
                )));
            }
        }
        Ok(Self::new(entries))
    }

    /// The catalog used when no catalog file is configured.
    pub fn builtin() -> Self {
        let entry = |id: &str, subjects: &[&str], rating: f64| TutorCatalogEntry {
            tutor_id: id.to_string(),
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            rating,
        };
        Self::new(vec![
            entry("tutor-1", &["Math", "Physics"], 4.9),
            entry("tutor-2", &["Math", "Chemistry"], 4.7),
            entry("tutor-3", &["English", "History"], 4.8),
            entry("tutor-4", &["Math", "English"], 4.6),
            entry("tutor-5", &["Physics", "Chemistry", "Math"], 4.5),
            entry("tutor-6", &["Spanish", "English"], 4.4),
        ])
    }

    pub fn entries(&self) -> &[TutorCatalogEntry] {
        &self.entries
    }

    pub fn get(&self, tutor_id: &str) -> Option<&TutorCatalogEntry> {
        self.entries.iter().find(|e| e.tutor_id == tutor_id)
    }

    pub fn tutors_for_subject<'a>(
        &'a self,
        subject: &'a str,
    ) -> impl Iterator<Item = &'a TutorCatalogEntry> + 'a {
        self.entries.iter().filter(move |e| e.teaches(subject))
    }

    /// Ranks alternatives for `subject`, skipping `exclude_tutor_id`.
    ///
    /// Highest rating first; equal ratings keep catalog order because the
    /// sort is stable.
    pub fn rank_fallbacks(&self, subject: &str, exclude_tutor_id: &str) -> Vec<String> {
        let mut candidates: Vec<&TutorCatalogEntry> = self
            .tutors_for_subject(subject)
            .filter(|e| e.tutor_id != exclude_tutor_id)
            .collect();
        candidates.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        candidates
            .into_iter()
            .take(MAX_FALLBACK_TUTORS)
            .map(|e| e.tutor_id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, subjects: &[&str], rating: f64) -> TutorCatalogEntry {
        TutorCatalogEntry {
            tutor_id: id.into(),
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            rating,
        }
    }

    #[test]
    fn fallbacks_exclude_original_and_sort_by_rating() {
        let catalog = TutorCatalog::builtin();
        let ranked = catalog.rank_fallbacks("Math", "tutor-1");
        assert_eq!(ranked, vec!["tutor-2", "tutor-4", "tutor-5"]);
    }

    #[test]
    fn fallbacks_cap_at_three() {
        let catalog = TutorCatalog::new(vec![
            entry("a", &["Art"], 3.0),
            entry("b", &["Art"], 4.0),
            entry("c", &["Art"], 5.0),
            entry("d", &["Art"], 4.5),
            entry("e", &["Art"], 1.0),
        ]);
        assert_eq!(catalog.rank_fallbacks("Art", "nobody"), vec!["c", "d", "b"]);
    }

    #[test]
    fn equal_ratings_keep_catalog_order() {
        let catalog = TutorCatalog::new(vec![
            entry("first", &["Math"], 4.0),
            entry("second", &["Math"], 4.0),
            entry("third", &["Math"], 4.0),
        ]);
        assert_eq!(
            catalog.rank_fallbacks("Math", "x"),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn subject_match_is_exact() {
        let catalog = TutorCatalog::builtin();
        assert!(catalog.rank_fallbacks("math", "tutor-1").is_empty());
        assert!(catalog.rank_fallbacks("Latin", "tutor-1").is_empty());
    }

    #[test]
    fn try_new_rejects_bad_entries() {
        assert!(TutorCatalog::try_new(vec![entry(" ", &["Math"], 4.0)]).is_err());
        assert!(TutorCatalog::try_new(vec![entry("t", &["Math"], 7.5)]).is_err());
        assert!(TutorCatalog::try_new(vec![entry("t", &["Math"], f64::NAN)]).is_err());
        assert!(TutorCatalog::try_new(vec![entry("t", &["Math"], 5.0)]).is_ok());
    }

    #[test]
    fn lookup_by_id() {
        let catalog = TutorCatalog::builtin();
        assert_eq!(catalog.get("tutor-3").map(|e| e.rating), Some(4.8));
        assert!(catalog.get("tutor-99").is_none());
    }
}
