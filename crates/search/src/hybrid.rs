use crate::bm25::KeywordIndex;
use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::fusion::RRFFusion;
use crate::vector::SemanticSearch;
use serde::{Deserialize, Serialize};

/// Fused search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
}

/// Hybrid search combining BM25 keyword ranking and vector similarity through RRF
pub struct HybridSearch {
    keyword: KeywordIndex,
    semantic: Option<SemanticSearch>,
    fusion: RRFFusion,
    config: SearchConfig,
}

impl HybridSearch {
    pub fn new(keyword: KeywordIndex, semantic: Option<SemanticSearch>, config: SearchConfig) -> Self {
        Self {
            keyword,
            semantic,
            fusion: RRFFusion::new(config.rrf_k),
            config,
        }
    }

    pub fn keyword(&self) -> &KeywordIndex {
        &self.keyword
    }

    pub fn has_vectors(&self) -> bool {
        self.semantic.is_some()
    }

    /// Vector and keyword candidates fused by RRF.
    ///
    /// The vector list is fused first, so a tie goes to the id the vector provider saw
    /// first. Without a vector provider, or when it fails, only the keyword list is fused.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        log::debug!("Hybrid search: query='{}', limit={}", query, limit);

        let keyword_pool = limit.saturating_mul(self.config.keyword_pool_multiplier);
        let keyword_ids: Vec<String> = self
            .keyword
            .search(query, keyword_pool)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        log::debug!("Keyword: {} results", keyword_ids.len());

        let vector_ids = match &self.semantic {
            Some(semantic) => {
                let pool = limit.saturating_add(self.config.vector_pool_extra);
                match semantic.search(query, pool).await {
                    Ok(ids) => ids,
                    Err(e) => {
                        log::warn!("Vector search failed, using keyword results only: {e}");
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };
        log::debug!("Vector: {} results", vector_ids.len());

        let fused = self.fusion.fuse(&[&vector_ids, &keyword_ids], limit);
        log::info!("Hybrid search completed: {} final results", fused.len());

        Ok(fused
            .into_iter()
            .map(|(id, score)| SearchHit { id, score })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bm25::Bm25Params;
    use crate::documents::VectorDocument;
    use crate::vector::{Embedder, InMemoryVectorIndex, StubEmbedder, VectorIndex};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn keyword_index() -> KeywordIndex {
        KeywordIndex::build(
            [
                ("app.load_config", "function load_config reads the yaml config file"),
                ("app.save_user", "function save_user writes a user row"),
                ("app.parse", "function parse tokenizes input text"),
                ("app.render", "function render draws the user page"),
                ("app.delete", "function delete removes a row"),
                ("app.log", "function log prints a line"),
            ]
            .iter()
            .map(|(id, text)| (id.to_string(), text.to_string())),
            Bm25Params::default(),
        )
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let search = HybridSearch::new(keyword_index(), None, SearchConfig::default());
        let err = search.search("   ", 5).await.unwrap_err();
        assert_eq!(err.to_string(), "Error: Query is empty.");
    }

    #[tokio::test]
    async fn keyword_only_uses_rrf_scores() {
        let search = HybridSearch::new(keyword_index(), None, SearchConfig::default());
        let hits = search.search("user", 5).await.unwrap();

        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["app.save_user", "app.render"]);
        assert!((hits[0].score - 1.0 / 61.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn vector_hits_are_fused_in() {
        let embedder = StubEmbedder::default();
        let documents = vec![VectorDocument {
            node_id: "app.parse".to_string(),
            file: "app.py".to_string(),
            part: 1,
            total_parts: 1,
            text: "user account row storage".to_string(),
        }];
        let index = InMemoryVectorIndex::build(&embedder, &documents).await.unwrap();
        let semantic = SemanticSearch::new(Arc::new(embedder), Arc::new(index));

        let search = HybridSearch::new(keyword_index(), Some(semantic), SearchConfig::default());
        assert!(search.has_vectors());
        let ids: Vec<String> = search
            .search("user", 5)
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(ids, vec!["app.parse", "app.save_user", "app.render"]);
    }

    /// Returns the same ranking for every query
    struct FixedIndex(Vec<&'static str>);

    #[async_trait]
    impl VectorIndex for FixedIndex {
        async fn nearest(&self, _vector: &[f32], k: usize) -> Result<Vec<String>> {
            Ok(self.0.iter().take(k).map(|id| id.to_string()).collect())
        }
    }

    #[tokio::test]
    async fn tied_ids_follow_the_vector_ranking() {
        let keyword = KeywordIndex::build(
            [
                ("x", "alpha alpha alpha beta"),
                ("y", "alpha alpha beta"),
                ("z", "alpha beta gamma delta"),
                ("p", "gamma"),
                ("q", "delta"),
                ("r", "epsilon"),
                ("s", "zeta"),
            ]
            .iter()
            .map(|(id, text)| (id.to_string(), text.to_string())),
            Bm25Params::default(),
        );
        assert_eq!(
            keyword
                .search("alpha", 10)
                .into_iter()
                .map(|(id, _)| id)
                .collect::<Vec<_>>(),
            vec!["x", "y", "z"]
        );

        let semantic = SemanticSearch::new(
            Arc::new(StubEmbedder::default()),
            Arc::new(FixedIndex(vec!["y", "x", "w"])),
        );
        let search = HybridSearch::new(keyword, Some(semantic), SearchConfig::default());
        let hits = search.search("alpha", 10).await.unwrap();

        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["y", "x", "w", "z"]);
        assert!((hits[0].score - hits[1].score).abs() < 1e-12);
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn dimension(&self) -> usize {
            4
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(SearchError::VectorProvider("service unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn failing_provider_falls_back_to_keywords() {
        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new(4));
        let semantic = SemanticSearch::new(Arc::new(FailingEmbedder), index);
        let search = HybridSearch::new(keyword_index(), Some(semantic), SearchConfig::default());

        let hits = search.search("config", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "app.load_config");
    }
}
