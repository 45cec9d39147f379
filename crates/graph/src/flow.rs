//! Depth-bounded call-flow traces and their Mermaid rendering.

use crate::dependency::DependencyMap;
use crate::error::{GraphError, Result};
use crate::node_id::short_name;
use crate::types::{CodeGraph, NodeKind};
use codemap_indexer::{module_name_for, SourceReader};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;

/// Root files checked, in order, before scanning for a `__main__` guard
const ENTRY_FILE_NAMES: &[&str] = &[
    "main.py",
    "app.py",
    "run.py",
    "manage.py",
    "start.py",
    "cli.py",
];

/// Result of one trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowTrace {
    pub start: String,
    /// `Function **caller** calls -> a, b` per node with in-project children
    pub lines: Vec<String>,
    /// Caller/callee id pairs in visiting order
    pub edges: Vec<(String, String)>,
}

impl FlowTrace {
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Mermaid flowchart with sequential node ids and the start node highlighted
    pub fn to_mermaid(&self) -> String {
        let mut ids: HashMap<&str, String> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        intern(&self.start, &mut ids, &mut order);
        for (from, to) in &self.edges {
            intern(from, &mut ids, &mut order);
            intern(to, &mut ids, &mut order);
        }

        let mut out = String::from("graph TD\n");
        for id in &order {
            let _ = writeln!(out, "    {}[{}]", ids[id], short_name(id));
        }
        for (from, to) in &self.edges {
            let _ = writeln!(out, "    {} --> {}", ids[from.as_str()], ids[to.as_str()]);
        }
        out.push('\n');
        out.push_str("    classDef entryPoint fill:#4CAF50,stroke:#333,stroke-width:4px\n");
        let _ = write!(out, "    class {} entryPoint", ids[self.start.as_str()]);
        out
    }
}

fn intern<'t>(id: &'t str, ids: &mut HashMap<&'t str, String>, order: &mut Vec<&'t str>) {
    if !ids.contains_key(id) {
        ids.insert(id, letter_id(order.len()));
        order.push(id);
    }
}

/// `A`..`Z`, then `AA`, `AB`, ...
fn letter_id(mut n: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Walks the dependency map depth-first from a start node
pub struct FlowTracer<'a> {
    graph: &'a CodeGraph,
    deps: &'a DependencyMap,
}

impl<'a> FlowTracer<'a> {
    pub fn new(graph: &'a CodeGraph, deps: &'a DependencyMap) -> Self {
        Self { graph, deps }
    }

    pub fn trace(&self, start: &str, max_depth: usize) -> Result<FlowTrace> {
        let idx = self.graph.resolve(start)?;
        let start = self
            .graph
            .get_node(idx)
            .map(|node| node.id.clone())
            .ok_or_else(|| GraphError::NodeNotFound(start.to_string()))?;

        let mut visited = HashSet::new();
        let mut trace = FlowTrace {
            start: start.clone(),
            lines: Vec::new(),
            edges: Vec::new(),
        };
        self.visit(&start, 0, max_depth, &mut visited, &mut trace);
        Ok(trace)
    }

    fn visit(
        &self,
        id: &str,
        depth: usize,
        max_depth: usize,
        visited: &mut HashSet<String>,
        trace: &mut FlowTrace,
    ) {
        if depth > max_depth || !visited.insert(id.to_string()) {
            return;
        }

        let children = self.children(id);
        if children.is_empty() {
            return;
        }

        let names: Vec<&str> = children.iter().map(|c| short_name(c)).collect();
        trace.lines.push(format!(
            "Function **{}** calls -> {}",
            short_name(id),
            names.join(", ")
        ));
        for child in &children {
            trace.edges.push((id.to_string(), child.clone()));
        }
        for child in &children {
            self.visit(child, depth + 1, max_depth, visited, trace);
        }
    }

    /// In-project children sorted by id; falls back to graph successors when the map has
    /// no entry
    fn children(&self, id: &str) -> Vec<String> {
        let candidates: Vec<String> = match self.deps.get(id).filter(|c| !c.is_empty()) {
            Some(mapped) => mapped.to_vec(),
            None => self
                .graph
                .find_node(id)
                .map(|idx| {
                    self.graph
                        .successors(idx)
                        .into_iter()
                        .filter_map(|s| self.graph.get_node(s).map(|n| n.id.clone()))
                        .collect()
                })
                .unwrap_or_default(),
        };

        candidates
            .into_iter()
            .filter(|child| child != id)
            .filter(|child| {
                self.graph
                    .node_by_id(child)
                    .is_some_and(|node| !node.is_external())
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Start node for the project's entry file: its `main`/`run` callee if one is
    /// mapped, else the module itself
    pub fn entry_node(&self, entry_file: &str) -> Option<String> {
        let module = self.graph.node_by_id(&module_name_for(entry_file))?;
        if module.kind != NodeKind::Module {
            return None;
        }

        let preferred = self.deps.get(&module.id).and_then(|children| {
            children.iter().find(|child| {
                let lower = child.to_lowercase();
                lower.ends_with(".main") || lower.ends_with(".run")
            })
        });
        Some(preferred.cloned().unwrap_or_else(|| module.id.clone()))
    }
}

/// Locate the entry file among the indexed modules
pub fn find_entry_file(graph: &CodeGraph, reader: &SourceReader) -> Option<String> {
    let files: BTreeSet<&str> = graph
        .nodes()
        .filter(|(_, node)| node.kind == NodeKind::Module)
        .filter_map(|(_, node)| node.file.as_deref())
        .collect();

    if let Some(name) = ENTRY_FILE_NAMES.iter().find(|name| files.contains(**name)) {
        return Some((*name).to_string());
    }

    files
        .into_iter()
        .find(|file| {
            reader
                .read(file)
                .map(|source| source.contains("if __name__"))
                .unwrap_or(false)
        })
        .map(str::to_string)
}
