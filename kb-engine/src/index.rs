//! Vector indexer: fits a TF-IDF vector space over a corpus snapshot.
//!
//! The fit is deterministic: identical corpus + config always produce
//! identical vocabularies and identical (bit-for-bit) weights. Nothing here
//! is mutated after `build`; a rebuild produces a whole new `CorpusIndex`
//! that the app state publishes by swapping a single `Arc`.
//!
//! Pipeline per document:
//!   lowercase alphanumeric runs → drop len < 2 → drop stop words
//!   → unigrams + bigrams over the surviving stream
//!   → raw term frequency × smooth IDF → L2 normalization
//!
//! With every vector unit-length, cosine similarity is a plain dot product.

use std::collections::HashMap;

use shared_types::Article;

use crate::error::EngineError;

/// Minimum token length kept by the tokenizer.
const MIN_TOKEN_LEN: usize = 2;

/// English stop words removed before n-gram formation.
const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during", "each", "else",
    "few", "for", "from", "further", "get", "had", "has", "have", "having", "he", "her", "here",
    "hers", "herself", "him", "himself", "his", "how", "if", "in", "into", "is", "it", "its",
    "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off",
    "on", "once", "only", "or", "other", "ought", "our", "ours", "ourselves", "out", "over",
    "own", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those", "through",
    "to", "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
    "yourself", "yourselves",
];

/// Indexer configuration. Part of the determinism contract: the same corpus
/// under the same config always yields the same `VectorSpace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Vocabulary cap; the most document-frequent terms are kept.
    pub max_vocabulary: usize,
    /// Whether bigrams are formed over the stop-filtered token stream.
    pub bigrams: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_vocabulary: 5000,
            bigrams: true,
        }
    }
}

/// Lowercased alphanumeric runs, short tokens and stop words dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .map(|t| t.to_ascii_lowercase())
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Unigrams plus (optionally) bigrams over consecutive surviving tokens.
fn terms_of(text: &str, config: &IndexConfig) -> Vec<String> {
    let tokens = tokenize(text);
    let mut terms = Vec::with_capacity(tokens.len() * 2);
    for window in tokens.windows(2) {
        terms.push(window[0].clone());
        if config.bigrams {
            terms.push(format!("{} {}", window[0], window[1]));
        }
    }
    if let Some(last) = tokens.last() {
        terms.push(last.clone());
    }
    terms
}

/// A fitted TF-IDF vector space: vocabulary, per-term IDF weights, and one
/// L2-normalized sparse vector per article (same order as the input slice).
#[derive(Debug, Clone)]
pub struct VectorSpace {
    vocabulary: Vec<String>,
    term_index: HashMap<String, u32>,
    idf: Vec<f64>,
    doc_vectors: Vec<Vec<(u32, f64)>>,
    config: IndexConfig,
}

impl VectorSpace {
    /// Fit a vector space over the corpus. Fails with `EmptyCorpus` on an
    /// empty slice; articles with empty content contribute empty vectors
    /// rather than aborting the build.
    pub fn build(articles: &[Article], config: &IndexConfig) -> Result<Self, EngineError> {
        if articles.is_empty() {
            return Err(EngineError::EmptyCorpus);
        }

        // Pass 1: per-document term counts and corpus document frequencies.
        let mut doc_counts: Vec<HashMap<String, f64>> = Vec::with_capacity(articles.len());
        let mut document_frequency: HashMap<String, u32> = HashMap::new();
        for article in articles {
            let mut counts: HashMap<String, f64> = HashMap::new();
            for term in terms_of(&article.content, config) {
                *counts.entry(term).or_insert(0.0) += 1.0;
            }
            for term in counts.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
            doc_counts.push(counts);
        }

        // Vocabulary selection: top `max_vocabulary` terms by document
        // frequency, ties broken by ascending term text. Indices are then
        // assigned in ascending term order; both steps keep the fit
        // deterministic.
        let mut ranked: Vec<(&String, u32)> = document_frequency
            .iter()
            .map(|(term, df)| (term, *df))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(config.max_vocabulary);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(t, _)| t.clone()).collect();
        vocabulary.sort();

        let term_index: HashMap<String, u32> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as u32))
            .collect();

        // Smooth IDF: ln((1 + n) / (1 + df)) + 1.
        let n_docs = articles.len() as f64;
        let idf: Vec<f64> = vocabulary
            .iter()
            .map(|term| {
                let df = f64::from(document_frequency[term]);
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        // Pass 2: weighted, L2-normalized sparse document vectors.
        let doc_vectors = doc_counts
            .into_iter()
            .map(|counts| {
                let mut vector: Vec<(u32, f64)> = counts
                    .into_iter()
                    .filter_map(|(term, tf)| {
                        term_index
                            .get(&term)
                            .map(|&idx| (idx, tf * idf[idx as usize]))
                    })
                    .collect();
                vector.sort_by_key(|(idx, _)| *idx);
                l2_normalize(&mut vector);
                vector
            })
            .collect();

        Ok(VectorSpace {
            vocabulary,
            term_index,
            idf,
            doc_vectors,
            config: config.clone(),
        })
    }

    /// Weight a query using the fitted vocabulary and IDF. Out-of-vocabulary
    /// terms contribute nothing; the space is never re-fit on a query.
    /// Returns an empty vector when no query term is in vocabulary.
    pub fn query_vector(&self, query: &str) -> Vec<(u32, f64)> {
        let mut counts: HashMap<u32, f64> = HashMap::new();
        for term in terms_of(query, &self.config) {
            if let Some(&idx) = self.term_index.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: Vec<(u32, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx as usize]))
            .collect();
        vector.sort_by_key(|(idx, _)| *idx);
        l2_normalize(&mut vector);
        vector
    }

    /// Dot product of a query vector against document `doc`. Both sides are
    /// unit-length, so this is the cosine similarity.
    pub fn similarity(&self, query: &[(u32, f64)], doc: usize) -> f64 {
        sparse_dot(query, &self.doc_vectors[doc])
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn doc_count(&self) -> usize {
        self.doc_vectors.len()
    }

    #[cfg(test)]
    pub(crate) fn doc_vector(&self, doc: usize) -> &[(u32, f64)] {
        &self.doc_vectors[doc]
    }
}

fn l2_normalize(vector: &mut [(u32, f64)]) {
    let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in vector.iter_mut() {
            *w /= norm;
        }
    }
}

/// Merge-walk dot product over two index-sorted sparse vectors.
fn sparse_dot(a: &[(u32, f64)], b: &[(u32, f64)]) -> f64 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// One published corpus snapshot: the articles and their fitted space.
/// Never mutated; replaced wholesale by `AppState::publish_index`.
#[derive(Debug)]
pub struct CorpusIndex {
    pub articles: Vec<Article>,
    pub space: VectorSpace,
}

impl CorpusIndex {
    pub fn build(articles: Vec<Article>, config: &IndexConfig) -> Result<Self, EngineError> {
        let space = VectorSpace::build(&articles, config)?;
        Ok(CorpusIndex { articles, space })
    }

    pub fn article_by_id(&self, article_id: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.article_id == article_id)
    }
}
