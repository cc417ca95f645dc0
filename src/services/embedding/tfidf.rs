//! TF-IDF Embedding Provider
//!
//! Local, offline text vectorization. The vocabulary is learned from the
//! first corpus passed to `embed_documents` (the check catalog) and frozen
//! afterwards, so query vectors share the corpus' dimensionality.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EmbeddingProvider, EmbeddingResult};

/// Maximum vocabulary size (number of unique tokens tracked).
const MAX_VOCAB_SIZE: usize = 8192;

/// Vocabulary learned from a corpus.
#[derive(Debug, Clone)]
struct Vocabulary {
    /// Map from token to column index in the TF-IDF vector.
    token_to_idx: HashMap<String, usize>,
    /// Inverse document frequency per column.
    idf: Vec<f32>,
}

/// TF-IDF embedding provider.
#[derive(Debug, Default)]
pub struct TfIdfEmbeddingProvider {
    vocab: RwLock<Option<Vocabulary>>,
}

impl TfIdfEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimensionality of the produced vectors; 0 before the vocabulary exists.
    pub async fn dimension(&self) -> usize {
        self.vocab.read().await.as_ref().map_or(0, |v| v.idf.len())
    }
}

#[async_trait]
impl EmbeddingProvider for TfIdfEmbeddingProvider {
    fn name(&self) -> &'static str {
        "tfidf"
    }

    async fn embed_documents(&self, documents: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut guard = self.vocab.write().await;
        let vocab = &*guard.get_or_insert_with(|| build_vocab(documents));
        Ok(documents.iter().map(|d| tfidf_vector(d, vocab)).collect())
    }

    async fn embed_query(&self, query: &str) -> EmbeddingResult<Vec<f32>> {
        let guard = self.vocab.read().await;
        Ok(match guard.as_ref() {
            Some(vocab) => tfidf_vector(query, vocab),
            None => Vec::new(),
        })
    }
}

/// Lowercase, split on anything but alphanumerics, drop one-letter tokens.
///
/// Hyphenated and snake_case words yield both their parts and the whole word,
/// so `reentrancy-eth` matches queries about "reentrancy" as well as the
/// exact check name.
fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tokens = Vec::new();

    for word in lower.split(|c: char| !c.is_alphanumeric() && c != '_' && c != '-') {
        let word = word.trim_matches(|c| c == '_' || c == '-');
        if word.len() < 2 {
            continue;
        }
        let parts: Vec<&str> = word
            .split(['_', '-'])
            .filter(|p| p.len() >= 2)
            .collect();
        if parts.len() > 1 {
            tokens.push(word.to_string());
        }
        tokens.extend(parts.into_iter().map(String::from));
    }

    tokens
}

fn build_vocab(corpus: &[String]) -> Vocabulary {
    let num_docs = corpus.len().max(1);

    let mut doc_freq: HashMap<String, usize> = HashMap::new();
    for doc in corpus {
        let unique: HashSet<String> = tokenize(doc).into_iter().collect();
        for tok in unique {
            *doc_freq.entry(tok).or_insert(0) += 1;
        }
    }

    // Most frequent first, ties by token, so the layout is deterministic.
    let mut entries: Vec<(String, usize)> = doc_freq.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(MAX_VOCAB_SIZE);

    let mut token_to_idx = HashMap::with_capacity(entries.len());
    let mut idf = Vec::with_capacity(entries.len());
    for (idx, (token, freq)) in entries.into_iter().enumerate() {
        token_to_idx.insert(token, idx);
        idf.push(((num_docs as f32) / (freq as f32)).ln() + 1.0);
    }

    Vocabulary { token_to_idx, idf }
}

/// L2-normalised TF-IDF vector for `text`.
fn tfidf_vector(text: &str, vocab: &Vocabulary) -> Vec<f32> {
    let dim = vocab.idf.len();
    if dim == 0 {
        return Vec::new();
    }

    let tokens = tokenize(text);
    let total_tokens = tokens.len().max(1) as f32;

    let mut tf = vec![0.0f32; dim];
    for tok in &tokens {
        if let Some(&idx) = vocab.token_to_idx.get(tok.as_str()) {
            tf[idx] += 1.0 / total_tokens;
        }
    }

    for (value, idf) in tf.iter_mut().zip(&vocab.idf) {
        *value *= idf;
    }

    let mag: f32 = tf.iter().map(|v| v * v).sum::<f32>().sqrt();
    if mag > 0.0 {
        for v in &mut tf {
            *v /= mag;
        }
    }

    tf
}
