use crate::types::{CodeGraph, GraphNode, Relation};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashSet;

impl CodeGraph {
    /// Find all nodes that current node calls (outgoing Calls edges)
    pub fn get_callees(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_by(node, Direction::Outgoing, Some(Relation::Calls))
    }

    /// Find all nodes that call current node (incoming Calls edges)
    pub fn get_callers(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_by(node, Direction::Incoming, Some(Relation::Calls))
    }

    /// Direct successors over any relation
    pub fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_by(node, Direction::Outgoing, None)
    }

    /// Direct predecessors over any relation
    pub fn predecessors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_by(node, Direction::Incoming, None)
    }

    /// Neighbours in one direction with the relation of the connecting edge, excluding
    /// external nodes. Calls come before containment; ties are ordered by id.
    pub fn project_neighbors(
        &self,
        node: NodeIndex,
        direction: Direction,
    ) -> Vec<(NodeIndex, Relation)> {
        let mut seen = HashSet::new();
        let mut out: Vec<(NodeIndex, Relation, &str)> = Vec::new();
        let mut edges: Vec<_> = self.graph.edges_directed(node, direction).collect();
        edges.sort_by_key(|e| e.weight().relation == Relation::Contains);

        for edge in edges {
            let other = match direction {
                Direction::Outgoing => edge.target(),
                Direction::Incoming => edge.source(),
            };
            let Some(data) = self.get_node(other) else {
                continue;
            };
            if data.is_external() || !seen.insert(other) {
                continue;
            }
            out.push((other, edge.weight().relation, data.id.as_str()));
        }

        out.sort_by(|a, b| {
            (a.1 == Relation::Contains, a.2).cmp(&(b.1 == Relation::Contains, b.2))
        });
        out.into_iter().map(|(idx, rel, _)| (idx, rel)).collect()
    }

    /// Module nodes, most important first
    pub fn modules_by_importance(&self) -> Vec<&GraphNode> {
        let mut modules: Vec<&GraphNode> = self
            .nodes()
            .map(|(_, node)| node)
            .filter(|node| node.kind == crate::types::NodeKind::Module)
            .collect();
        modules.sort_by(|a, b| {
            b.importance_score
                .partial_cmp(&a.importance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        modules
    }

    /// Unique neighbours in edge insertion order
    fn neighbors_by(
        &self,
        node: NodeIndex,
        direction: Direction,
        relation: Option<Relation>,
    ) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(node, direction)
            .filter(|e| relation.map_or(true, |r| e.weight().relation == r))
            .collect();
        edges.sort_by_key(|e| e.id());

        let mut seen = HashSet::new();
        edges
            .into_iter()
            .map(|e| match direction {
                Direction::Outgoing => e.target(),
                Direction::Incoming => e.source(),
            })
            .filter(|idx| seen.insert(*idx))
            .collect()
    }
}
