use crate::types::CodeGraph;
use petgraph::visit::EdgeRef;
use std::collections::BTreeSet;

const DAMPING: f64 = 0.85;
const TOLERANCE: f64 = 1.0e-6;
const MAX_ITERATIONS: usize = 100;

/// PageRank by power iteration over every node, isolated ones included.
///
/// Parallel edges count once and dangling mass is spread uniformly. Returns `None`
/// for an empty graph or when the iteration does not converge.
pub fn pagerank(graph: &CodeGraph) -> Option<Vec<f64>> {
    let n = graph.node_count();
    if n == 0 {
        return None;
    }

    let mut successors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    for edge in graph.graph.edge_references() {
        successors[edge.source().index()].insert(edge.target().index());
    }

    let uniform = 1.0 / n as f64;
    let mut rank = vec![uniform; n];

    for _ in 0..MAX_ITERATIONS {
        let previous = rank;
        rank = vec![0.0; n];

        let dangling: f64 = successors
            .iter()
            .zip(&previous)
            .filter(|(succ, _)| succ.is_empty())
            .map(|(_, r)| r)
            .sum();

        for (node, succ) in successors.iter().enumerate() {
            if succ.is_empty() {
                continue;
            }
            let share = DAMPING * previous[node] / succ.len() as f64;
            for &target in succ {
                rank[target] += share;
            }
        }

        let base = (1.0 - DAMPING) * uniform + DAMPING * dangling * uniform;
        for value in rank.iter_mut() {
            *value += base;
        }

        let error: f64 = rank.iter().zip(&previous).map(|(a, b)| (a - b).abs()).sum();
        if error < n as f64 * TOLERANCE {
            return Some(rank);
        }
    }

    None
}

/// Store each node's score as `importance_score`, falling back to 0 everywhere
pub fn apply_importance(graph: &mut CodeGraph) {
    let scores = pagerank(graph);
    if scores.is_none() && graph.node_count() > 0 {
        log::warn!("Importance scoring did not converge; defaulting all scores to 0");
    }

    let indices: Vec<_> = graph.graph.node_indices().collect();
    for idx in indices {
        let score = scores
            .as_ref()
            .and_then(|s| s.get(idx.index()).copied())
            .unwrap_or(0.0);
        if let Some(node) = graph.get_node_mut(idx) {
            node.importance_score = score;
        }
    }
}
