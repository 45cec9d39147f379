//! # Codemap Search
//!
//! Keyword ranking, rank fusion and the query engine over a linked codemap graph.
//!
//! ## Features
//!
//! - **BM25 keyword index** over node ids, names, docstrings, parameters and code
//! - **Reciprocal Rank Fusion** of keyword and vector rankings
//! - **Vector seam** - `Embedder` / `VectorIndex` traits with a local stub backend
//! - **Query engine** - search, expand, trace, diagram, lookup, node info, overview,
//!   numbered file reads
//!
//! ## Example
//!
//! ```no_run
//! use codemap_graph::ArtifactPaths;
//! use codemap_search::{index_project, QueryConfig, QueryEngine};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let root = Path::new("/path/to/project");
//!     let paths = ArtifactPaths::for_project_root(root);
//!     index_project(root, &paths, Default::default(), &Default::default()).await?;
//!
//!     let engine = QueryEngine::open(root, &paths, QueryConfig::default()).await?;
//!     for hit in engine.search("load config", 5).await? {
//!         println!("{} ({:.4})", hit.id, hit.score);
//!     }
//!     Ok(())
//! }
//! ```

mod bm25;
mod config;
mod documents;
mod engine;
mod error;
mod fusion;
mod hybrid;
mod pipeline;
mod tokenize;
mod vector;

pub use bm25::{Bm25Model, Bm25Params, KeywordIndex};
pub use config::{QueryConfig, SearchConfig, VectorMode};
pub use documents::{keyword_text, split_on_lines, CorpusBuilder, VectorDocument, MAX_VECTOR_BODY_CHARS};
pub use engine::{
    CoreModule, LookupResult, NodeInfo, Overview, QueryEngine, ReadmeExcerpt, FILE_TREE_LIMIT,
    LOOKUP_LIMIT, NODE_INFO_NEIGHBORS, OVERVIEW_MODULES, README_CHAR_LIMIT,
};
pub use error::{Result, SearchError};
pub use fusion::RRFFusion;
pub use hybrid::{HybridSearch, SearchHit};
pub use pipeline::{index_project, IndexReport};
pub use tokenize::tokenize;
pub use vector::{
    cosine_similarity, Embedder, InMemoryVectorIndex, SemanticSearch, StubEmbedder, VectorIndex,
};
