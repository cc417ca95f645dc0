//! Flat Vector Index
//!
//! Exact nearest-neighbour search by cosine similarity over an in-memory
//! corpus. The check catalog holds on the order of a hundred documents, so a
//! linear scan per query is all the index does.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{cosine_similarity, EmbeddingError, EmbeddingProvider, EmbeddingResult};

/// One retrieved document with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    /// Position of the document in the indexed corpus.
    pub index: usize,
    pub score: f32,
    pub document: String,
}

/// Read-only embedding index over a fixed corpus.
pub struct VectorIndex {
    provider: Arc<dyn EmbeddingProvider>,
    documents: Vec<String>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("provider", &self.provider.name())
            .field("documents", &self.documents.len())
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl VectorIndex {
    /// Embed `documents` and build the index.
    pub async fn build(
        provider: Arc<dyn EmbeddingProvider>,
        documents: Vec<String>,
    ) -> EmbeddingResult<Self> {
        let vectors = provider.embed_documents(&documents).await?;
        if vectors.len() != documents.len() {
            return Err(EmbeddingError::Parse(format!(
                "provider returned {} vectors for {} documents",
                vectors.len(),
                documents.len()
            )));
        }

        let dimension = vectors.first().map_or(0, Vec::len);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        tracing::info!(
            provider = provider.name(),
            documents = documents.len(),
            dimension,
            "vector index built"
        );

        Ok(Self {
            provider,
            documents,
            vectors,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The `k` documents most similar to `text`, best first.
    ///
    /// Equal scores keep corpus order.
    pub async fn query(&self, text: &str, k: usize) -> EmbeddingResult<Vec<ScoredDocument>> {
        if k == 0 || self.documents.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.provider.embed_query(text).await?;
        if query.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(v, &query)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(index, score)| ScoredDocument {
                index,
                score,
                document: self.documents[index].clone(),
            })
            .collect())
    }
}
