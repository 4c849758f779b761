//! Training corpus and correction log handling
//!
//! The classifier trains from two CSV sources:
//! - a base corpus: headered `Description,Category` rows shipped or curated
//!   by the user
//! - a corrections log: headerless rows appended whenever the user overrides
//!   a suggested category
//!
//! The corrections log is append-only and is merged into every retrain, so
//! user overrides accumulate influence as the log grows.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::models::CorrectionRecord;

/// One labeled example for classifier training
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub description: String,
    pub category: String,
}

impl TrainingExample {
    pub fn new(description: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            category: category.into(),
        }
    }
}

/// Locations of the base corpus and the corrections log
#[derive(Debug, Clone)]
pub struct Corpus {
    base_path: PathBuf,
    corrections_path: PathBuf,
}

impl Corpus {
    pub fn new(base_path: impl Into<PathBuf>, corrections_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            corrections_path: corrections_path.into(),
        }
    }

    /// Corpus rooted in the platform data directory (~/.local/share/tally)
    pub fn in_data_dir() -> Self {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tally");
        Self::new(dir.join("corpus.csv"), dir.join("corrections.csv"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn corrections_path(&self) -> &Path {
        &self.corrections_path
    }

    /// Load base corpus plus corrections, in that order.
    ///
    /// A missing base file yields just the corrections; a missing corrections
    /// file yields just the base. Corrections carry no extra weight beyond
    /// appearing as additional examples.
    pub fn load_examples(&self) -> Result<Vec<TrainingExample>> {
        let mut examples = Vec::new();

        if self.base_path.exists() {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .from_path(&self.base_path)?;
            for record in reader.records() {
                let record = record?;
                if let (Some(description), Some(category)) = (record.get(0), record.get(1)) {
                    examples.push(TrainingExample::new(description, category));
                }
            }
        }

        for correction in self.load_corrections()? {
            examples.push(TrainingExample::new(
                correction.description,
                correction.category,
            ));
        }

        debug!(count = examples.len(), "Loaded training examples");
        Ok(examples)
    }

    /// Read the full corrections log (headerless)
    pub fn load_corrections(&self) -> Result<Vec<CorrectionRecord>> {
        if !self.corrections_path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(&self.corrections_path)?;
        let mut corrections = Vec::new();
        for record in reader.records() {
            let record = record?;
            if let (Some(description), Some(category)) = (record.get(0), record.get(1)) {
                corrections.push(CorrectionRecord {
                    description: description.to_string(),
                    category: category.to_string(),
                });
            }
        }
        Ok(corrections)
    }

    /// Append one correction. The csv writer quote-escapes embedded
    /// delimiters, so descriptions may contain commas and quotes.
    pub fn append_correction(&self, description: &str, category: &str) -> Result<()> {
        if let Some(parent) = self.corrections_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.corrections_path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record([description, category])?;
        writer.flush()?;
        debug!(category, "Appended correction");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_corpus(dir: &tempfile::TempDir) -> Corpus {
        Corpus::new(
            dir.path().join("corpus.csv"),
            dir.path().join("corrections.csv"),
        )
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = scratch_corpus(&dir);
        assert!(corpus.load_examples().unwrap().is_empty());
        assert!(corpus.load_corrections().unwrap().is_empty());
    }

    #[test]
    fn base_corpus_and_corrections_merge_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = scratch_corpus(&dir);
        std::fs::write(
            corpus.base_path(),
            "Description,Category\npizza palace,Food\ncity metro pass,Transport\n",
        )
        .unwrap();
        corpus.append_correction("corner pharmacy", "Health").unwrap();

        let examples = corpus.load_examples().unwrap();
        assert_eq!(examples.len(), 3);
        assert_eq!(examples[0], TrainingExample::new("pizza palace", "Food"));
        assert_eq!(examples[2], TrainingExample::new("corner pharmacy", "Health"));
    }

    #[test]
    fn corrections_are_appended_and_quote_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = scratch_corpus(&dir);

        corpus
            .append_correction("dinner, \"La Piazza\"", "Food")
            .unwrap();
        corpus.append_correction("gym membership", "Health").unwrap();

        let corrections = corpus.load_corrections().unwrap();
        assert_eq!(corrections.len(), 2);
        assert_eq!(corrections[0].description, "dinner, \"La Piazza\"");
        assert_eq!(corrections[1].category, "Health");

        // Appending never rewrites earlier records
        corpus.append_correction("gym membership", "Fitness").unwrap();
        assert_eq!(corpus.load_corrections().unwrap().len(), 3);
    }
}
