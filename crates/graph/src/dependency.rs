use crate::types::{CodeGraph, Relation};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Caller id → callee ids, projected from the graph's `calls` edges.
///
/// Callees keep the order in which their edges were first added; repeats are removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl DependencyMap {
    pub fn from_graph(graph: &CodeGraph) -> Self {
        let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for edge in graph.graph.edge_references() {
            if edge.weight().relation != Relation::Calls {
                continue;
            }
            let (Some(source), Some(target)) =
                (graph.get_node(edge.source()), graph.get_node(edge.target()))
            else {
                continue;
            };
            let callees = entries.entry(source.id.clone()).or_default();
            if !callees.contains(&target.id) {
                callees.push(target.id.clone());
            }
        }
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&[String]> {
        self.entries.get(id).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
