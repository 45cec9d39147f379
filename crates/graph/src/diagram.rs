use crate::config::DiagramConfig;
use crate::error::{GraphError, Result};
use crate::types::{CodeGraph, NodeKind};
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, BTreeSet};

/// Renders the neighbourhood of seed nodes as a Mermaid flowchart clustered by file
pub struct DiagramGenerator<'a> {
    graph: &'a CodeGraph,
    config: DiagramConfig,
}

impl<'a> DiagramGenerator<'a> {
    pub fn new(graph: &'a CodeGraph, config: DiagramConfig) -> Self {
        Self { graph, config }
    }

    /// Diagram around `seeds`, expanding `depth` rounds (configured depth when `None`)
    pub fn generate(&self, seeds: &[String], depth: Option<usize>) -> Result<String> {
        if seeds.is_empty() {
            return Err(GraphError::EmptyRequest("No nodes provided.".to_string()));
        }

        let mut roots = BTreeSet::new();
        for seed in seeds {
            match self.graph.find_node(seed) {
                Some(idx) => {
                    roots.insert(idx);
                }
                None => log::warn!("Diagram seed {seed} is not in the graph; skipping"),
            }
        }
        if roots.is_empty() {
            return Err(GraphError::NodeNotFound(seeds.join(", ")));
        }

        let relevant = self.expand(&roots, depth.unwrap_or(self.config.depth));
        if relevant.len() > self.config.ceiling {
            return Err(GraphError::DiagramTooComplex {
                nodes: relevant.len(),
                ceiling: self.config.ceiling,
            });
        }

        Ok(self.render(&roots, &relevant))
    }

    /// Breadth-first rounds over callers and callees, never entering external nodes
    fn expand(&self, roots: &BTreeSet<NodeIndex>, depth: usize) -> BTreeSet<NodeIndex> {
        let mut relevant = roots.clone();
        let mut frontier = roots.clone();

        for _ in 0..depth {
            let mut next = BTreeSet::new();
            for &idx in &frontier {
                let neighbors = self
                    .graph
                    .successors(idx)
                    .into_iter()
                    .chain(self.graph.predecessors(idx));
                for neighbor in neighbors {
                    let internal = self
                        .graph
                        .get_node(neighbor)
                        .is_some_and(|node| !node.is_external());
                    if internal {
                        next.insert(neighbor);
                    }
                }
            }
            relevant.extend(next.iter().copied());
            frontier = next;
        }
        relevant
    }

    fn render(&self, roots: &BTreeSet<NodeIndex>, relevant: &BTreeSet<NodeIndex>) -> String {
        let mut clusters: BTreeMap<&str, Vec<(&str, &str, NodeKind)>> = BTreeMap::new();
        let mut edges = BTreeSet::new();

        for &idx in relevant {
            let Some(node) = self.graph.get_node(idx) else {
                continue;
            };
            let Some(file) = node.file.as_deref() else {
                continue;
            };
            clusters
                .entry(file)
                .or_default()
                .push((node.id.as_str(), node.short_name(), node.kind));

            for child in self.graph.successors(idx) {
                if !relevant.contains(&child) {
                    continue;
                }
                if let Some(target) = self.graph.get_node(child) {
                    edges.insert(format!(
                        "    {} --> {}",
                        clean_id(&node.id),
                        clean_id(&target.id)
                    ));
                }
            }
        }

        let mut lines = vec![
            "graph TD".to_string(),
            "    classDef fileNode fill:#f9f,stroke:#333,stroke-width:2px;".to_string(),
            "    classDef funcNode fill:#bbf,stroke:#333,stroke-width:1px;".to_string(),
        ];

        for (file, mut nodes) in clusters {
            nodes.sort_unstable_by(|a, b| a.0.cmp(b.0));
            let basename = file.rsplit('/').next().unwrap_or(file);
            lines.push(format!("    subgraph {} [{}]", clean_id(file), basename));
            for (id, label, kind) in nodes {
                let line = match kind {
                    NodeKind::Module => {
                        format!("        {}[\"{}\"]:::fileNode", clean_id(id), basename)
                    }
                    _ => format!("        {}[\"{}\"]:::funcNode", clean_id(id), label),
                };
                lines.push(line);
            }
            lines.push("    end".to_string());
        }

        lines.extend(edges);

        lines.push(
            "    classDef entryPoint fill:#4CAF50,stroke:#333,stroke-width:4px".to_string(),
        );
        for &idx in roots {
            if let Some(node) = self.graph.get_node(idx) {
                lines.push(format!("    class {} entryPoint", clean_id(&node.id)));
            }
        }

        lines.join("\n")
    }
}

/// Mermaid-safe identifier
fn clean_id(text: &str) -> String {
    text.replace(['.', ':', '/', '-'], "_")
}
