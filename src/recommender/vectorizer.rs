use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Common English stop words, matching the original training configuration.
/// Mostly a no-op on Spanish-language corpora; kept as a tunable.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "up", "about", "into", "through", "during", "is", "was", "are", "were", "been", "be",
    "have", "has", "had", "do", "does", "did", "will", "would", "could", "should", "may", "might",
    "must", "can", "this", "that", "these", "those", "it", "its", "as", "not", "no",
];

/// Vectorizer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorizerConfig {
    /// Maximum vocabulary size (most frequent terms kept)
    pub max_features: usize,

    /// N-gram range (min, max), inclusive
    pub ngram_range: (usize, usize),

    /// Strip English stop words before n-gram generation
    pub english_stop_words: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            ngram_range: (1, 2),
            english_stop_words: true,
        }
    }
}

/// A sparse vector: parallel index/value arrays, indices strictly ascending
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Build from an index -> value map, dropping zeros
    pub fn from_map(map: &HashMap<usize, f64>) -> Self {
        let mut entries: Vec<(u32, f64)> = map
            .iter()
            .filter(|(_, &v)| v != 0.0)
            .map(|(&i, &v)| (i as u32, v))
            .collect();
        entries.sort_by_key(|(i, _)| *i);

        Self {
            indices: entries.iter().map(|(i, _)| *i).collect(),
            values: entries.iter().map(|(_, v)| *v).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Dot product with another sparse vector (merge join over indices)
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let mut sum = 0.0;
        let (mut i, mut j) = (0, 0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Scale to unit L2 norm; zero vectors stay zero
    pub fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.values {
                *value /= norm;
            }
        }
    }

    /// Cosine similarity. Zero against anything is 0, not an error.
    pub fn cosine_similarity(&self, other: &SparseVector) -> f64 {
        let denom = self.norm() * other.norm();
        if denom == 0.0 {
            return 0.0;
        }
        self.dot(other) / denom
    }
}

/// TF-IDF vectorizer over a text corpus.
///
/// Fitted once by the corpus builder, then used read-only to project both
/// corpus documents and incoming queries into the same vector space.
/// Out-of-vocabulary terms are dropped silently at transform time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Configuration
    config: VectorizerConfig,

    /// Vocabulary mapping (term -> column index)
    vocabulary: HashMap<String, usize>,

    /// Inverse document frequency, indexed by vocabulary column
    idf: Vec<f64>,

    /// Is fitted (vocabulary built)
    is_fitted: bool,
}

impl TfidfVectorizer {
    /// Create a new, unfitted vectorizer
    pub fn new(config: VectorizerConfig) -> Self {
        Self {
            config,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            is_fitted: false,
        }
    }

    /// Check that the operator-supplied configuration is usable
    fn validate_config(&self) -> Result<()> {
        let (min_n, max_n) = self.config.ngram_range;
        if min_n == 0 {
            return Err(AppError::Configuration(
                "ngram_range minimum must be at least 1".to_string(),
            ));
        }
        if min_n > max_n {
            return Err(AppError::Configuration(format!(
                "ngram_range minimum {} exceeds maximum {}",
                min_n, max_n
            )));
        }
        Ok(())
    }

    /// Fit the vocabulary and IDF weights on a corpus
    pub fn fit(&mut self, documents: &[String]) -> Result<()> {
        self.validate_config()?;

        if documents.is_empty() {
            return Err(AppError::Internal(
                "Cannot fit vectorizer on an empty corpus".to_string(),
            ));
        }

        let mut corpus_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for document in documents {
            let terms = self.analyze(document);
            let unique: HashSet<&String> = terms.iter().collect();
            for term in &terms {
                *corpus_counts.entry(term.clone()).or_insert(0) += 1;
            }
            for term in unique {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }

        // Keep the most frequent terms; ties broken alphabetically so that
        // refitting on unchanged data yields an identical vocabulary
        let mut ranked: Vec<(String, usize)> = corpus_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.config.max_features);

        // Column indices follow sorted term order
        let mut selected: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        selected.sort();

        self.vocabulary = selected
            .iter()
            .cloned()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect();

        // Smoothed IDF: ln((1 + n) / (1 + df)) + 1
        let n_docs = documents.len() as f64;
        self.idf = vec![0.0; selected.len()];
        for term in &selected {
            let idx = self.vocabulary[term];
            let df = *doc_freq.get(term).unwrap_or(&0) as f64;
            self.idf[idx] = ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0;
        }

        self.is_fitted = true;
        Ok(())
    }

    /// Project a text into the fitted vector space (L2-normalized TF-IDF)
    pub fn transform(&self, text: &str) -> Result<SparseVector> {
        if !self.is_fitted {
            return Err(AppError::Internal(
                "Vectorizer must be fitted before transform".to_string(),
            ));
        }

        let mut weights: HashMap<usize, f64> = HashMap::new();
        for term in self.analyze(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *weights.entry(idx).or_insert(0.0) += self.idf[idx];
            }
        }

        let mut vector = SparseVector::from_map(&weights);
        vector.l2_normalize();
        Ok(vector)
    }

    /// Fit on a corpus and transform every document in one pass
    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Vec<SparseVector>> {
        self.fit(documents)?;
        documents.iter().map(|doc| self.transform(doc)).collect()
    }

    /// Tokenize and expand into n-grams
    fn analyze(&self, text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        let words: Vec<&str> = text
            .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .filter(|w| !w.is_empty())
            .filter(|w| !self.config.english_stop_words || !ENGLISH_STOP_WORDS.contains(w))
            .collect();

        // Range is validated at fit time
        let (min_n, max_n) = self.config.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            for window in words.windows(n) {
                terms.push(window.join("_"));
            }
        }
        terms
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.vocabulary
    }
}
