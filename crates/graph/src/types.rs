use crate::error::{GraphError, Result};
use crate::node_id::{normalize_id, short_name};
use codemap_indexer::{CallSite, Definition, DefinitionKind, Role, SyntacticContext};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Prefix of synthetic ids for call targets outside the project
pub const EXTERNAL_PREFIX: &str = "external::";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Module,
    Function,
    Class,
    External,
}

impl From<DefinitionKind> for NodeKind {
    fn from(kind: DefinitionKind) -> Self {
        match kind {
            DefinitionKind::Module => Self::Module,
            DefinitionKind::Function => Self::Function,
            DefinitionKind::Class => Self::Class,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Module => "module",
            Self::Function => "function",
            Self::Class => "class",
            Self::External => "external",
        };
        f.write_str(name)
    }
}

/// Type of relationship between nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// A module contains a definition
    Contains,

    /// A calls B
    Calls,
}

/// How a call edge was resolved.
///
/// `High` covers both exact internal matches and confidently external targets; check the
/// target's [`NodeKind`] to tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Node in code graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    /// Short display name
    pub label: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default)]
    pub start_line: usize,
    #[serde(default)]
    pub end_line: usize,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub docstring: String,
    #[serde(default)]
    pub decorators: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub complexity: usize,
    #[serde(default)]
    pub line_count: usize,
    #[serde(default)]
    pub is_oversized: bool,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub importance_score: f64,
}

impl GraphNode {
    pub fn from_definition(def: &Definition) -> Self {
        Self {
            id: def.id.clone(),
            label: def.short_name().to_string(),
            kind: def.kind.into(),
            file: Some(def.file.clone()),
            start_line: def.start_line,
            end_line: def.end_line,
            is_async: def.is_async,
            docstring: def.docstring.clone(),
            decorators: def.decorators.clone(),
            role: Some(def.role),
            complexity: def.complexity,
            line_count: def.line_count,
            is_oversized: def.is_oversized,
            parameters: def.parameters.clone(),
            return_type: def.return_type.clone(),
            bases: def.bases.clone(),
            importance_score: 0.0,
        }
    }

    /// Placeholder for an unresolved call target
    pub fn external(target_hint: &str) -> Self {
        Self {
            id: format!("{EXTERNAL_PREFIX}{target_hint}"),
            label: target_hint.to_string(),
            kind: NodeKind::External,
            file: None,
            start_line: 0,
            end_line: 0,
            is_async: false,
            docstring: String::new(),
            decorators: Vec::new(),
            role: None,
            complexity: 0,
            line_count: 0,
            is_oversized: false,
            parameters: Vec::new(),
            return_type: None,
            bases: Vec::new(),
            importance_score: 0.0,
        }
    }

    pub fn is_external(&self) -> bool {
        self.kind == NodeKind::External
    }

    pub fn short_name(&self) -> &str {
        short_name(&self.id)
    }
}

/// Edge in code graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub relation: Relation,
    pub confidence: Confidence,
    /// Line of the first call site collapsed into this edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default)]
    pub context: Vec<SyntacticContext>,
    #[serde(default)]
    pub is_guarded: bool,
    /// Number of call sites collapsed into this edge
    #[serde(default = "default_weight")]
    pub weight: usize,
}

fn default_weight() -> usize {
    1
}

impl GraphEdge {
    pub fn contains() -> Self {
        Self {
            relation: Relation::Contains,
            confidence: Confidence::High,
            line: None,
            context: Vec::new(),
            is_guarded: false,
            weight: 1,
        }
    }

    pub fn call(site: &CallSite, confidence: Confidence) -> Self {
        Self {
            relation: Relation::Calls,
            confidence,
            line: Some(site.line),
            context: site.syntactic_context.clone(),
            is_guarded: site.is_guarded,
            weight: 1,
        }
    }
}

/// Code graph with relationships
#[derive(Debug, Clone, Default)]
pub struct CodeGraph {
    /// Directed graph (node -> node with relationships)
    pub graph: DiGraph<GraphNode, GraphEdge>,

    /// Exact id -> NodeIndex mapping
    pub id_index: HashMap<String, NodeIndex>,

    /// Canonical (normalized) id -> NodeIndex mapping
    normalized_index: HashMap<String, NodeIndex>,

    /// One edge per (source, target, relation)
    edge_index: HashMap<(NodeIndex, NodeIndex, Relation), EdgeIndex>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, replacing the payload of an existing node with the same id
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.id_index.get(&node.id) {
            self.graph[idx] = node;
            return idx;
        }

        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.normalized_index.entry(normalize_id(&id)).or_insert(idx);
        self.id_index.insert(id, idx);
        idx
    }

    /// Add an edge, collapsing repeats onto the existing edge. Self-loops are dropped.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: GraphEdge) -> Option<EdgeIndex> {
        if from == to {
            return None;
        }

        let key = (from, to, edge.relation);
        if let Some(&existing) = self.edge_index.get(&key) {
            if let Some(weight) = self.graph.edge_weight_mut(existing) {
                weight.weight += edge.weight;
            }
            return Some(existing);
        }

        let idx = self.graph.add_edge(from, to, edge);
        self.edge_index.insert(key, idx);
        Some(idx)
    }

    /// Find a node by exact id, then by canonical id
    pub fn find_node(&self, id: &str) -> Option<NodeIndex> {
        self.id_index
            .get(id)
            .or_else(|| self.normalized_index.get(&normalize_id(id)))
            .copied()
    }

    /// Like [`find_node`](Self::find_node) but with a not-found error
    pub fn resolve(&self, id: &str) -> Result<NodeIndex> {
        self.find_node(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    pub fn get_node(&self, idx: NodeIndex) -> Option<&GraphNode> {
        self.graph.node_weight(idx)
    }

    pub fn get_node_mut(&mut self, idx: NodeIndex) -> Option<&mut GraphNode> {
        self.graph.node_weight_mut(idx)
    }

    pub fn node_by_id(&self, id: &str) -> Option<&GraphNode> {
        self.find_node(id).and_then(|idx| self.get_node(idx))
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &GraphNode)> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx).map(|node| (idx, node)))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
