use crate::config::ExpandConfig;
use crate::error::{GraphError, Result};
use crate::types::{CodeGraph, GraphNode, NodeKind, Relation};
use codemap_indexer::{skeleton, stub, Role, SourceReader};
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use serde::Serialize;
use std::fmt::Write as _;

/// Gathers a node's code together with bounded caller and callee context
pub struct ContextExpander<'a> {
    graph: &'a CodeGraph,
    reader: &'a SourceReader,
    config: ExpandConfig,
}

/// A caller or callee of the focus node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborContext {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub relation: Relation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub code: String,
    /// Code was reduced to a stub or skeleton
    pub truncated: bool,
}

/// Explanation bundle for one node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextBundle {
    pub id: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    /// Focus source with line numbers
    pub code: String,
    pub callers: Vec<NeighborContext>,
    pub callees: Vec<NeighborContext>,
    /// "Triggered by: ... Uses: ..."
    pub summary: String,
}

impl<'a> ContextExpander<'a> {
    pub fn new(graph: &'a CodeGraph, reader: &'a SourceReader, config: ExpandConfig) -> Self {
        Self {
            graph,
            reader,
            config,
        }
    }

    /// Expand a node id given in any accepted spelling
    pub fn expand(&self, id: &str) -> Result<ContextBundle> {
        let idx = self.graph.resolve(id)?;
        let node = self
            .graph
            .get_node(idx)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;

        let code = match node.file.as_deref() {
            Some(file) if !node.is_external() => self
                .reader
                .read_numbered(file, node.start_line, node.end_line)
                .map_err(|e| GraphError::SourceUnavailable(e.to_string()))?,
            _ => String::new(),
        };

        let callers = self.neighbors(idx, Direction::Incoming);
        let callees = self.neighbors(idx, Direction::Outgoing);
        let summary = summarize(&callers, &callees);

        log::debug!(
            "Expanded {}: {} callers, {} callees",
            node.id,
            callers.len(),
            callees.len()
        );

        Ok(ContextBundle {
            id: node.id.clone(),
            kind: node.kind,
            role: node.role,
            file: node.file.clone(),
            start_line: node.start_line,
            end_line: node.end_line,
            code,
            callers,
            callees,
            summary,
        })
    }

    fn neighbors(&self, idx: NodeIndex, direction: Direction) -> Vec<NeighborContext> {
        self.graph
            .project_neighbors(idx, direction)
            .into_iter()
            .take(self.config.neighbor_cap)
            .filter_map(|(other, relation)| {
                let node = self.graph.get_node(other)?;
                let (code, truncated) = self.neighbor_code(node);
                Some(NeighborContext {
                    id: node.id.clone(),
                    label: node.short_name().to_string(),
                    kind: node.kind,
                    relation,
                    file: node.file.clone(),
                    code,
                    truncated,
                })
            })
            .collect()
    }

    fn neighbor_code(&self, node: &GraphNode) -> (String, bool) {
        let Some(file) = node.file.as_deref() else {
            return (String::new(), false);
        };
        let code = match self.reader.read_span(file, node.start_line, node.end_line) {
            Ok(code) => code,
            Err(e) => {
                log::warn!("Cannot read {} for {}: {e}", file, node.id);
                return (String::new(), false);
            }
        };

        if node.line_count <= self.config.stub_threshold_lines {
            return (code, false);
        }
        let reduced = match node.kind {
            NodeKind::Module => skeleton(&code),
            _ => stub(&code, self.config.stub_head_lines),
        };
        (reduced, true)
    }
}

fn summarize(callers: &[NeighborContext], callees: &[NeighborContext]) -> String {
    let names = |list: &[NeighborContext]| {
        if list.is_empty() {
            "None".to_string()
        } else {
            list.iter()
                .map(|n| n.label.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        }
    };
    format!("Triggered by: {}. Uses: {}.", names(callers), names(callees))
}

impl ContextBundle {
    pub fn caller_names(&self) -> Vec<&str> {
        self.callers.iter().map(|n| n.label.as_str()).collect()
    }

    pub fn callee_names(&self) -> Vec<&str> {
        self.callees.iter().map(|n| n.label.as_str()).collect()
    }

    /// Markdown rendering for terminal output
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {} ({})", self.id, self.kind);
        if let Some(file) = &self.file {
            let _ = writeln!(out, "File: {}:{}-{}", file, self.start_line, self.end_line);
        }
        if let Some(role) = self.role {
            let _ = writeln!(out, "Role: {role}");
        }
        let _ = writeln!(out, "{}", self.summary);

        out.push_str("\n## Code\n");
        if self.code.is_empty() {
            out.push_str("(no source available)\n");
        } else {
            let _ = writeln!(out, "```python\n{}\n```", self.code);
        }

        render_neighbors(&mut out, "Triggered by", &self.callers);
        render_neighbors(&mut out, "Uses", &self.callees);
        out
    }
}

fn render_neighbors(out: &mut String, title: &str, neighbors: &[NeighborContext]) {
    if neighbors.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n## {title}");
    for neighbor in neighbors {
        let _ = writeln!(out, "\n### {} ({}, {:?})", neighbor.label, neighbor.id, neighbor.relation);
        if !neighbor.code.is_empty() {
            let _ = writeln!(out, "```python\n{}\n```", neighbor.code);
        }
    }
}
