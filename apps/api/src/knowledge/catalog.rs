use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::knowledge::CareerEntry;
use crate::matching::subjects::subjects_match;

const BUILTIN_CATALOG: &str = include_str!("../../data/careers.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("career entry #{index} has an empty id")]
    EmptyId { index: usize },

    #[error("duplicate career id '{0}'")]
    DuplicateId(String),

    #[error("career '{id}' has demand_level {level}, expected 0-100")]
    DemandOutOfRange { id: String, level: u8 },
}

/// The immutable career catalog. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Arc<[Arc<CareerEntry>]>,
}

impl Catalog {
    /// Catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Loads a catalog from a JSON array of career entries on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&raw)?;
        info!("Loaded {} careers from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let entries: Vec<CareerEntry> = serde_json::from_str(raw)?;
        Self::new(entries)
    }

    pub fn new(entries: Vec<CareerEntry>) -> Result<Self, CatalogError> {
        validate(&entries)?;
        Ok(Self {
            entries: entries.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn entries(&self) -> &[Arc<CareerEntry>] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&Arc<CareerEntry>> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate(entries: &[CareerEntry]) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        if entry.id.trim().is_empty() {
            return Err(CatalogError::EmptyId { index });
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(CatalogError::DuplicateId(entry.id.clone()));
        }
        if entry.demand_level > 100 {
            return Err(CatalogError::DemandOutOfRange {
                id: entry.id.clone(),
                level: entry.demand_level,
            });
        }

        // Not fatal: grade matching just finds less evidence for such subjects.
        for threshold in &entry.grade_thresholds {
            let listed = entry
                .required_subjects
                .iter()
                .any(|subject| subjects_match(subject, &threshold.subject));
            if !listed {
                warn!(
                    "Career '{}' has a grade threshold for '{}' that is not a required subject",
                    entry.id, threshold.subject
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::knowledge::test_support::career;
    use crate::knowledge::{Importance, MinimumGrade};

    #[test]
    fn test_builtin_catalog_loads_eleven_careers() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), 11);
        assert!(catalog.get("data-scientist").is_some());
        assert!(catalog.get("financial-analyst").is_some());
    }

    #[test]
    fn test_builtin_thresholds_parse_as_letters() {
        let catalog = Catalog::builtin().unwrap();
        let ds = catalog.get("data-scientist").unwrap();
        assert_eq!(ds.grade_thresholds[0].subject, "Mathematics");
        assert_eq!(
            ds.grade_thresholds[0].minimum_grade,
            MinimumGrade::Letter("B+".to_string())
        );
        assert_eq!(ds.grade_thresholds[0].importance, Importance::Critical);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let entries = vec![career("a", "A", vec![]), career("a", "A again", vec![])];
        assert!(matches!(
            Catalog::new(entries),
            Err(CatalogError::DuplicateId(id)) if id == "a"
        ));
    }

    #[test]
    fn test_empty_id_rejected() {
        let entries = vec![career("ok", "Ok", vec![]), career("  ", "Blank", vec![])];
        assert!(matches!(
            Catalog::new(entries),
            Err(CatalogError::EmptyId { index: 1 })
        ));
    }

    #[test]
    fn test_demand_level_above_100_rejected() {
        let mut entry = career("a", "A", vec![]);
        entry.demand_level = 101;
        assert!(matches!(
            Catalog::new(vec![entry]),
            Err(CatalogError::DemandOutOfRange { level: 101, .. })
        ));
    }

    #[test]
    fn test_empty_catalog_is_valid() {
        let catalog = Catalog::from_json("[]").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let entries = vec![career("nurse", "Nurse", vec![("Biology", "B", Importance::Critical)])];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&entries).unwrap().as_bytes())
            .unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries()[0].title, "Nurse");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Catalog::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            Catalog::from_json("{not json"),
            Err(CatalogError::Parse(_))
        ));
    }
}
