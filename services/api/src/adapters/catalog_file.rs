//! services/api/src/adapters/catalog_file.rs
//!
//! Loads the tutor catalog from a JSON file. The file holds an array of
//! `{ "tutor_id": ..., "subjects": [...], "rating": ... }` records; order in
//! the file is the tie-break order of the fallback ranking.

use serde::Deserialize;
use std::path::Path;
use tracing::info;
use tutoring_core::domain::TutorCatalogEntry;
use tutoring_core::TutorCatalog;

use crate::error::ApiError;

//=========================================================================================
// File Record Structs
//=========================================================================================

#[derive(Deserialize)]
struct CatalogRecord {
    tutor_id: String,
    #[serde(default)]
    subjects: Vec<String>,
    rating: f64,
}

impl CatalogRecord {
    fn into_domain(self) -> TutorCatalogEntry {
        TutorCatalogEntry {
            tutor_id: self.tutor_id.trim().to_string(),
            subjects: self.subjects,
            rating: self.rating,
        }
    }
}

//=========================================================================================
// Loading
//=========================================================================================

/// Parses and validates catalog JSON.
pub fn parse_catalog(json: &str) -> Result<TutorCatalog, ApiError> {
    let records: Vec<CatalogRecord> = serde_json::from_str(json)?;
    let entries = records.into_iter().map(CatalogRecord::into_domain).collect();
    Ok(TutorCatalog::try_new(entries)?)
}

/// Reads the catalog from `path`.
pub async fn load_catalog(path: &Path) -> Result<TutorCatalog, ApiError> {
    let json = tokio::fs::read_to_string(path).await?;
    let catalog = parse_catalog(&json)?;
    info!(
        path = %path.display(),
        tutors = catalog.entries().len(),
        "Tutor catalog loaded."
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const CATALOG: &str = r#"[
        { "tutor_id": "t-1", "subjects": ["Math"], "rating": 4.1 },
        { "tutor_id": " t-2 ", "subjects": ["Math", "Art"], "rating": 4.8 },
        { "tutor_id": "t-3", "rating": 3.0 }
    ]"#;

    #[test]
    fn parses_records_in_file_order() {
        let catalog = parse_catalog(CATALOG).unwrap();
        let ids: Vec<&str> = catalog.entries().iter().map(|e| e.tutor_id.as_str()).collect();
        assert_eq!(ids, vec!["t-1", "t-2", "t-3"]);
        assert!(catalog.get("t-3").unwrap().subjects.is_empty());
        assert_eq!(catalog.rank_fallbacks("Math", "t-9"), vec!["t-2", "t-1"]);
    }

    #[test]
    fn malformed_json_is_a_catalog_error() {
        assert!(matches!(parse_catalog("{ nope"), Err(ApiError::Catalog(_))));
    }

    #[test]
    fn out_of_range_rating_is_a_port_error() {
        let json = r#"[{ "tutor_id": "t-1", "subjects": ["Math"], "rating": 9.5 }]"#;
        assert!(matches!(parse_catalog(json), Err(ApiError::Port(_))));
    }

    #[tokio::test]
    async fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!("catalog-{}.json", Uuid::new_v4()));
        tokio::fs::write(&path, CATALOG).await.unwrap();

        let catalog = load_catalog(&path).await.unwrap();
        assert_eq!(catalog.entries().len(), 3);

        tokio::fs::remove_file(&path).await.unwrap();
        assert!(matches!(load_catalog(&path).await, Err(ApiError::Io(_))));
    }
}
