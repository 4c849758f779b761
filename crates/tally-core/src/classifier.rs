//! Category classification for transaction descriptions
//!
//! A multinomial naive Bayes classifier over case-folded bag-of-words
//! features. The vocabulary and label set are fixed at training time; unknown
//! tokens at predict time are ignored. The trained model is a plain value
//! that serializes to a JSON artifact, and `ClassifierHandle` provides the
//! process-wide slot that swaps models atomically under concurrent readers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::corpus::TrainingExample;
use crate::error::{Error, Result};

/// Category reported when no model is loaded
pub const FALLBACK_CATEGORY: &str = "Other";

/// Minimum confidence for a category to appear in top-k results
pub const CONFIDENCE_FLOOR: f64 = 0.05;

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

/// Case-folded alphanumeric tokens
fn tokenize(text: &str) -> Vec<String> {
    let re = TOKEN_RE.get_or_init(|| Regex::new(r"[a-z0-9]+").expect("valid token regex"));
    re.find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// A category prediction with estimated probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub category: String,
    /// Estimated probability in [0, 1]
    pub confidence: f64,
}

/// Artifact format version; bump on incompatible layout changes
const ARTIFACT_VERSION: u32 = 1;

fn artifact_version() -> u32 {
    ARTIFACT_VERSION
}

/// A trained naive Bayes model: vocabulary, label set, and counts.
///
/// Serializable as the persisted model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierModel {
    /// Artifact format version
    #[serde(default = "artifact_version")]
    version: u32,
    /// Token -> dense feature index
    vocabulary: HashMap<String, usize>,
    /// Labels in first-seen training order
    labels: Vec<String>,
    /// Documents per label
    label_doc_counts: Vec<u64>,
    /// Token occurrence counts per label, dense over the vocabulary
    token_counts: Vec<Vec<u64>>,
    /// Total token occurrences per label
    label_token_totals: Vec<u64>,
    /// Total training documents
    total_docs: u64,
}

impl ClassifierModel {
    /// Train a model from labeled examples.
    ///
    /// Fails with `InsufficientData` on an empty corpus. The label set is
    /// exactly the categories present in `examples`; nothing else can be
    /// predicted without retraining.
    pub fn train(examples: &[TrainingExample]) -> Result<Self> {
        if examples.is_empty() {
            return Err(Error::InsufficientData(
                "classifier training corpus is empty".into(),
            ));
        }

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut labels: Vec<String> = Vec::new();
        let mut label_index: HashMap<String, usize> = HashMap::new();
        let mut tokenized: Vec<(Vec<String>, usize)> = Vec::with_capacity(examples.len());

        for example in examples {
            let label = match label_index.get(&example.category) {
                Some(&i) => i,
                None => {
                    let i = labels.len();
                    labels.push(example.category.clone());
                    label_index.insert(example.category.clone(), i);
                    i
                }
            };
            let tokens = tokenize(&example.description);
            for token in &tokens {
                let next = vocabulary.len();
                vocabulary.entry(token.clone()).or_insert(next);
            }
            tokenized.push((tokens, label));
        }

        let vocab_size = vocabulary.len();
        let mut label_doc_counts = vec![0u64; labels.len()];
        let mut token_counts = vec![vec![0u64; vocab_size]; labels.len()];
        let mut label_token_totals = vec![0u64; labels.len()];

        for (tokens, label) in &tokenized {
            label_doc_counts[*label] += 1;
            for token in tokens {
                let feature = vocabulary[token];
                token_counts[*label][feature] += 1;
                label_token_totals[*label] += 1;
            }
        }

        info!(
            examples = examples.len(),
            labels = labels.len(),
            vocabulary = vocab_size,
            "Trained classifier"
        );

        Ok(Self {
            version: ARTIFACT_VERSION,
            vocabulary,
            labels,
            label_doc_counts,
            token_counts,
            label_token_totals,
            total_docs: examples.len() as u64,
        })
    }

    /// The label set, in first-seen training order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Posterior probability per label for a description.
    /// Laplace-smoothed, log-space, softmax-normalized.
    fn posterior(&self, text: &str) -> Vec<f64> {
        let vocab_size = self.vocabulary.len() as f64;
        let features: Vec<usize> = tokenize(text)
            .iter()
            .filter_map(|token| self.vocabulary.get(token).copied())
            .collect();

        let log_probs: Vec<f64> = (0..self.labels.len())
            .map(|label| {
                let mut lp = (self.label_doc_counts[label] as f64 / self.total_docs as f64).ln();
                let total = self.label_token_totals[label] as f64;
                for &feature in &features {
                    let count = self.token_counts[label][feature] as f64;
                    lp += ((count + 1.0) / (total + vocab_size)).ln();
                }
                lp
            })
            .collect();

        // Softmax with max-shift for numerical stability
        let max = log_probs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = log_probs.iter().map(|lp| (lp - max).exp()).collect();
        let sum: f64 = exps.iter().sum();
        exps.iter().map(|e| e / sum).collect()
    }

    /// Predict the most likely category for a description
    pub fn predict(&self, text: &str) -> Prediction {
        let posterior = self.posterior(text);
        let mut best = 0;
        for (i, p) in posterior.iter().enumerate() {
            if *p > posterior[best] {
                best = i;
            }
        }
        Prediction {
            category: self.labels[best].clone(),
            confidence: posterior[best],
        }
    }

    /// The top categories for a description, best first.
    ///
    /// Only categories with confidence >= `CONFIDENCE_FLOOR` are returned,
    /// sorted descending; ties keep label training order. At most `k`.
    pub fn predict_top_k(&self, text: &str, k: usize) -> Vec<Prediction> {
        let posterior = self.posterior(text);
        let mut predictions: Vec<Prediction> = self
            .labels
            .iter()
            .zip(posterior.iter())
            .filter(|(_, &p)| p >= CONFIDENCE_FLOOR)
            .map(|(label, &p)| Prediction {
                category: label.clone(),
                confidence: p,
            })
            .collect();
        predictions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        predictions.truncate(k);
        predictions
    }

    /// Write the model artifact as JSON, replacing any existing file
    /// atomically (write to a temp file in the same directory, then rename).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&tmp, self)?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        info!(path = %path.display(), "Saved classifier artifact");
        Ok(())
    }

    /// Read a model artifact from disk
    pub fn load_from(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let model: Self = serde_json::from_reader(file)?;
        if model.version != ARTIFACT_VERSION {
            return Err(Error::ModelUnavailable(format!(
                "artifact version {} is not supported (expected {})",
                model.version, ARTIFACT_VERSION
            )));
        }
        Ok(model)
    }
}

/// Process-wide classifier slot.
///
/// Readers either see the previous model in full or the new one in full;
/// prediction with no loaded model degrades to `FALLBACK_CATEGORY` at zero
/// confidence instead of failing.
#[derive(Debug, Default)]
pub struct ClassifierHandle {
    slot: RwLock<Option<Arc<ClassifierModel>>>,
}

impl ClassifierHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the loaded model
    pub fn install(&self, model: ClassifierModel) {
        let mut slot = self.slot.write().expect("classifier slot poisoned");
        *slot = Some(Arc::new(model));
        info!("Classifier model swapped");
    }

    /// Load an artifact from disk. A failed load leaves the handle with no
    /// model rather than a partially constructed one.
    pub fn load(&self, path: &Path) {
        match ClassifierModel::load_from(path) {
            Ok(model) => self.install(model),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Classifier artifact load failed");
                let mut slot = self.slot.write().expect("classifier slot poisoned");
                *slot = None;
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.read().expect("classifier slot poisoned").is_some()
    }

    fn current(&self) -> Option<Arc<ClassifierModel>> {
        self.slot.read().expect("classifier slot poisoned").clone()
    }

    /// Predict with the loaded model, or fall back to "Other" at zero
    /// confidence when none is loaded
    pub fn predict(&self, text: &str) -> Prediction {
        match self.current() {
            Some(model) => model.predict(text),
            None => Prediction {
                category: FALLBACK_CATEGORY.to_string(),
                confidence: 0.0,
            },
        }
    }

    /// Top-k predictions, or empty when no model is loaded
    pub fn predict_top_k(&self, text: &str, k: usize) -> Vec<Prediction> {
        match self.current() {
            Some(model) => model.predict_top_k(text, k),
            None => Vec::new(),
        }
    }
}
