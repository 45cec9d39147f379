use codemap_graph::{DiagramConfig, ExpandConfig, FlowConfig};
use codemap_indexer::IndexerConfig;
use serde::{Deserialize, Serialize};

/// Vector provider used alongside keyword search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorMode {
    /// Keyword-only fusion
    #[default]
    None,
    /// Local hashing embedder with an in-memory index
    Stub,
}

/// Retrieval settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Reciprocal Rank Fusion constant
    pub rrf_k: f64,

    /// Keyword candidates requested per result (`limit * multiplier`)
    pub keyword_pool_multiplier: usize,

    /// Vector candidates requested beyond the limit (`limit + extra`)
    pub vector_pool_extra: usize,

    /// BM25 term-frequency saturation
    pub k1: f64,

    /// BM25 length normalization
    pub b: f64,

    /// Floor for negative IDF values, as a fraction of the mean IDF
    pub epsilon: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            keyword_pool_multiplier: 2,
            vector_pool_extra: 5,
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.rrf_k.is_nan() || self.rrf_k < 0.0 {
            return Err("rrf_k must be >= 0".to_string());
        }
        if self.keyword_pool_multiplier == 0 {
            return Err("keyword_pool_multiplier must be > 0".to_string());
        }
        if self.k1.is_nan() || self.k1 < 0.0 {
            return Err("k1 must be >= 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err("b must be between 0 and 1".to_string());
        }
        Ok(())
    }
}

/// Everything the query engine needs besides artifact locations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Walk settings for the file tree and README lookup in the overview
    pub indexer: IndexerConfig,
    pub expand: ExpandConfig,
    pub flow: FlowConfig,
    pub diagram: DiagramConfig,
    pub search: SearchConfig,
    pub vector: VectorMode,
}

impl QueryConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.indexer.validate().map_err(|e| format!("indexer: {e}"))?;
        self.expand.validate().map_err(|e| format!("expand: {e}"))?;
        self.flow.validate().map_err(|e| format!("flow: {e}"))?;
        self.diagram.validate().map_err(|e| format!("diagram: {e}"))?;
        self.search.validate().map_err(|e| format!("search: {e}"))?;
        Ok(())
    }
}
