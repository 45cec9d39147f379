//! On-disk artifacts shared between indexing and the query side.

use crate::dependency::DependencyMap;
use crate::error::{GraphError, Result};
use crate::linker::{LinkStats, LinkedGraph};
use crate::types::{CodeGraph, Confidence, GraphEdge, GraphNode, Relation};
use codemap_indexer::SyntacticContext;
use petgraph::visit::EdgeRef;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const GRAPH_SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Default storage directory name below the project root
pub const DEFAULT_STORAGE_DIR: &str = ".codemap";

/// Locations of every artifact inside one storage directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn for_project_root(root: &Path) -> Self {
        Self::new(root.join(DEFAULT_STORAGE_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ingested(&self) -> PathBuf {
        self.dir.join("ingested.json")
    }

    pub fn graph(&self) -> PathBuf {
        self.dir.join("graph.json")
    }

    pub fn dependency_map(&self) -> PathBuf {
        self.dir.join("dependency_map.json")
    }

    pub fn keyword_index(&self) -> PathBuf {
        self.dir.join("keyword_index.json")
    }
}

/// Flat edge record keyed by node ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub relation: Relation,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default)]
    pub context: Vec<SyntacticContext>,
    /// Call site sits inside a try block
    #[serde(default)]
    pub is_protected: bool,
    #[serde(default = "default_weight")]
    pub weight: usize,
}

fn default_weight() -> usize {
    1
}

impl EdgeRecord {
    fn from_edge(source: &str, target: &str, edge: &GraphEdge) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            relation: edge.relation,
            confidence: edge.confidence,
            line: edge.line,
            context: edge.context.clone(),
            is_protected: edge.is_guarded,
            weight: edge.weight,
        }
    }

    fn to_edge(&self) -> GraphEdge {
        GraphEdge {
            relation: self.relation,
            confidence: self.confidence,
            line: self.line,
            context: self.context.clone(),
            is_guarded: self.is_protected,
            weight: self.weight,
        }
    }
}

/// Everything indexing produced, with run statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestedProject {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<EdgeRecord>,
    pub stats: LinkStats,
}

/// Serialized property graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub schema_version: u32,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<EdgeRecord>,
}

impl CodeGraph {
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let nodes = self.nodes().map(|(_, node)| node.clone()).collect();
        let edges = self
            .graph
            .edge_references()
            .filter_map(|edge| {
                let source = self.get_node(edge.source())?;
                let target = self.get_node(edge.target())?;
                Some(EdgeRecord::from_edge(&source.id, &target.id, edge.weight()))
            })
            .collect();
        GraphSnapshot {
            schema_version: GRAPH_SNAPSHOT_SCHEMA_VERSION,
            nodes,
            edges,
        }
    }

    /// Rebuild a graph; edges naming unknown nodes are skipped with a warning
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        if snapshot.schema_version != GRAPH_SNAPSHOT_SCHEMA_VERSION {
            return Err(GraphError::BuildError(format!(
                "Unsupported graph snapshot schema_version {} (expected {GRAPH_SNAPSHOT_SCHEMA_VERSION})",
                snapshot.schema_version
            )));
        }

        let mut graph = CodeGraph::new();
        for node in snapshot.nodes {
            graph.add_node(node);
        }

        let mut skipped = 0usize;
        for record in &snapshot.edges {
            let source = graph.id_index.get(&record.source).copied();
            let target = graph.id_index.get(&record.target).copied();
            match (source, target) {
                (Some(source), Some(target)) => {
                    graph.add_edge(source, target, record.to_edge());
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            log::warn!("Graph snapshot has {skipped} edges with unknown endpoints; skipped");
        }

        Ok(graph)
    }
}

impl IngestedProject {
    pub fn from_linked(linked: &LinkedGraph) -> Self {
        let snapshot = linked.graph.to_snapshot();
        Self {
            nodes: snapshot.nodes,
            edges: snapshot.edges,
            stats: linked.stats.clone(),
        }
    }
}

/// Write `value` as pretty JSON through a temporary file
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Read a JSON artifact, reporting an absent file as [`GraphError::MissingArtifact`]
pub async fn read_json<T: DeserializeOwned>(artifact: &str, path: &Path) -> Result<T> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(GraphError::missing_artifact(artifact, path));
        }
        Err(err) => return Err(err.into()),
    };
    serde_json::from_slice(&bytes).map_err(|err| {
        log::warn!("Corrupted {artifact} at {}: {err}", path.display());
        GraphError::SerializationError(err)
    })
}

/// Write the ingested data, graph snapshot and dependency map
pub async fn persist(paths: &ArtifactPaths, linked: &LinkedGraph) -> Result<()> {
    write_json(&paths.ingested(), &IngestedProject::from_linked(linked)).await?;
    write_json(&paths.graph(), &linked.graph.to_snapshot()).await?;
    write_json(&paths.dependency_map(), &linked.dependency_map).await?;
    log::info!("Artifacts written to {}", paths.dir().display());
    Ok(())
}

pub async fn load_graph(paths: &ArtifactPaths) -> Result<CodeGraph> {
    let snapshot: GraphSnapshot = read_json("graph snapshot", &paths.graph()).await?;
    CodeGraph::from_snapshot(snapshot)
}

pub async fn load_dependency_map(paths: &ArtifactPaths) -> Result<DependencyMap> {
    read_json("dependency map", &paths.dependency_map()).await
}

pub async fn load_ingested(paths: &ArtifactPaths) -> Result<IngestedProject> {
    read_json("ingested project data", &paths.ingested()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::BuiltinNames;
    use crate::linker::Linker;
    use codemap_indexer::{index_source, ClassRegistry};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn linked() -> LinkedGraph {
        let files: Vec<_> = [
            ("a.py", "def helper():\n    pass\n"),
            (
                "b.py",
                "from a import helper\n\ndef main():\n    try:\n        helper()\n    except ValueError:\n        pass\n    missing()\n",
            ),
        ]
        .iter()
        .map(|(path, source)| {
            index_source(path, source, &ClassRegistry::new(), 300)
                .unwrap()
                .index
        })
        .collect();
        Linker::new(&BuiltinNames::python()).link(&files)
    }

    #[tokio::test]
    async fn artifacts_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let paths = ArtifactPaths::for_project_root(dir.path());
        let linked = linked();

        persist(&paths, &linked).await.unwrap();
        let graph = load_graph(&paths).await.unwrap();
        let deps = load_dependency_map(&paths).await.unwrap();
        let ingested = load_ingested(&paths).await.unwrap();

        assert_eq!(graph.node_count(), linked.graph.node_count());
        assert_eq!(graph.edge_count(), linked.graph.edge_count());
        assert_eq!(deps, linked.dependency_map);
        assert_eq!(ingested.stats.files, 2);

        let guarded = ingested
            .edges
            .iter()
            .find(|e| e.target == "a.helper" && e.relation == Relation::Calls)
            .unwrap();
        assert!(guarded.is_protected);
        assert_eq!(guarded.line, Some(5));

        let helper = graph.node_by_id("a.helper").unwrap();
        let original = linked.graph.node_by_id("a.helper").unwrap();
        assert_eq!(helper.importance_score, original.importance_score);
    }

    #[tokio::test]
    async fn missing_artifacts_fail_fast() {
        let dir = TempDir::new().unwrap();
        let paths = ArtifactPaths::new(dir.path().join("nothing-here"));
        let err = load_graph(&paths).await.unwrap_err();
        assert!(matches!(err, GraphError::MissingArtifact { .. }));
        assert!(err.to_string().contains("codemap index"));
    }

    #[test]
    fn snapshots_skip_dangling_edges() {
        let mut snapshot = linked().graph.to_snapshot();
        snapshot.edges.push(EdgeRecord {
            source: "b.main".to_string(),
            target: "gone".to_string(),
            relation: Relation::Calls,
            confidence: Confidence::High,
            line: None,
            context: Vec::new(),
            is_protected: false,
            weight: 1,
        });
        let edges = snapshot.edges.len();
        let graph = CodeGraph::from_snapshot(snapshot).unwrap();
        assert_eq!(graph.edge_count(), edges - 1);
    }
}
