//! Seam to the embedding model and vector index, plus a local stand-in for both.

use crate::documents::VectorDocument;
use crate::error::{Result, SearchError};
use crate::tokenize::tokenize;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;

/// `embed(text) -> vector`
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::VectorProvider("embedder returned no vector".to_string()))
    }
}

/// `nearest(vector, k) -> ranked node ids`
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<String>>;
}

/// Embedder and index used together for query-time similarity search
#[derive(Clone)]
pub struct SemanticSearch {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl SemanticSearch {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Ranked node ids, each id once even when several of its parts matched
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<String>> {
        let vector = self.embedder.embed(query).await?;
        let ranked = self.index.nearest(&vector, k).await?;
        let mut seen = HashSet::new();
        Ok(ranked.into_iter().filter(|id| seen.insert(id.clone())).collect())
    }
}

/// Deterministic bag-of-words embedder: every token is hashed into one dimension
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let slot = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[slot] += sign;
        }
        normalize(&mut vector);
        vector
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Brute-force cosine index over document vectors
#[derive(Debug, Clone, Default)]
pub struct InMemoryVectorIndex {
    dimension: usize,
    entries: Vec<(String, Vec<f32>)>,
}

impl InMemoryVectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, node_id: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(SearchError::VectorProvider(format!(
                "vector has {} dimensions, index expects {}",
                vector.len(),
                self.dimension
            )));
        }
        self.entries.push((node_id.into(), vector));
        Ok(())
    }

    /// Embed every document and index it under its node id
    pub async fn build(embedder: &dyn Embedder, documents: &[VectorDocument]) -> Result<Self> {
        let mut index = Self::new(embedder.dimension());
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        for (document, vector) in documents.iter().zip(vectors) {
            index.add(document.node_id.clone(), vector)?;
        }
        log::info!("Vector index holds {} documents", index.len());
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<String>> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (_, v))| (i, cosine_similarity(vector, v)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        Ok(scored
            .into_iter()
            .map(|(i, _)| self.entries[i].0.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(id: &str, text: &str) -> VectorDocument {
        VectorDocument {
            node_id: id.to_string(),
            file: "m.py".to_string(),
            part: 1,
            total_parts: 1,
            text: text.to_string(),
        }
    }

    #[test]
    fn stub_embeddings_are_deterministic_and_normalized() {
        let embedder = StubEmbedder::new(64);
        let a = embedder.embed_text("load the config file");
        let b = embedder.embed_text("load the config file");
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!(embedder.embed_text("").iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn nearest_prefers_shared_vocabulary() {
        let embedder = StubEmbedder::default();
        let documents = vec![
            doc("m.parse", "parse tokens from input text"),
            doc("m.save", "save user row to database"),
            doc("m.save", "commit database transaction"),
            doc("m.draw", "draw page header"),
        ];
        let index = InMemoryVectorIndex::build(&embedder, &documents).await.unwrap();
        assert_eq!(index.len(), 4);

        let search = SemanticSearch::new(Arc::new(embedder), Arc::new(index));
        let hits = search.search("database user", 3).await.unwrap();
        assert_eq!(hits[0], "m.save");
        assert_eq!(hits.iter().filter(|h| *h == "m.save").count(), 1);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut index = InMemoryVectorIndex::new(3);
        assert!(index.add("a", vec![1.0, 0.0]).is_err());
        assert!(index.add("a", vec![1.0, 0.0, 0.0]).is_ok());
    }
}
