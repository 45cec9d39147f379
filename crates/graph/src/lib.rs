//! # Codemap Graph
//!
//! Turns per-file indexes into a project-wide call graph and answers questions about it.
//!
//! ## Features
//!
//! - **Cross-file linking** - resolve call hints to definitions with confidence tiers
//! - **Importance ranking** - PageRank over the finished graph
//! - **Context expansion** - a node's code with bounded caller/callee context
//! - **Flow tracing** - depth-bounded call narratives and Mermaid diagrams
//!
//! ## Architecture
//!
//! ```text
//! FileIndex[]
//!     │
//!     ├──> Linker
//!     │      ├─ Exact id match           (high)
//!     │      ├─ Suffix match             (medium)
//!     │      ├─ Short-name fallback      (low)
//!     │      └─ External / builtin drop  (high / none)
//!     │
//!     ├──> CodeGraph (petgraph) + importance scores
//!     │      └─ DependencyMap (calls adjacency)
//!     │
//!     └──> Query side
//!            ├─ ContextExpander
//!            ├─ FlowTracer
//!            └─ DiagramGenerator
//! ```

mod artifacts;
mod assembler;
mod builtins;
mod config;
mod dependency;
mod diagram;
mod error;
mod flow;
mod graph;
mod linker;
mod node_id;
mod rank;
mod types;

pub use artifacts::{
    load_dependency_map, load_graph, load_ingested, persist, read_json, write_json,
    ArtifactPaths, EdgeRecord, GraphSnapshot, IngestedProject, DEFAULT_STORAGE_DIR,
    GRAPH_SNAPSHOT_SCHEMA_VERSION,
};
pub use assembler::{ContextBundle, ContextExpander, NeighborContext};
pub use builtins::BuiltinNames;
pub use config::{DiagramConfig, ExpandConfig, FlowConfig};
pub use dependency::DependencyMap;
pub use diagram::DiagramGenerator;
pub use error::{GraphError, Result};
pub use flow::{find_entry_file, FlowTrace, FlowTracer};
pub use linker::{LinkStats, LinkedGraph, Linker};
pub use node_id::{normalize_id, short_name};
pub use rank::{apply_importance, pagerank};
pub use types::{
    CodeGraph, Confidence, GraphEdge, GraphNode, NodeKind, Relation, EXTERNAL_PREFIX,
};
