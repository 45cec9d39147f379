//! Cross-file call resolution.

use crate::builtins::BuiltinNames;
use crate::dependency::DependencyMap;
use crate::node_id::short_name;
use crate::rank::apply_importance;
use crate::types::{CodeGraph, Confidence, GraphEdge, GraphNode, NodeKind, Relation};
use codemap_indexer::{CallSite, FileIndex, ParseFailure};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Counts gathered while linking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkStats {
    /// Module nodes in the graph
    pub files: usize,
    /// Definitions, modules included
    pub definitions: usize,
    /// `calls` edges in the finished graph
    pub calls: usize,
    pub call_sites: usize,
    pub resolved_exact: usize,
    pub resolved_suffix: usize,
    pub resolved_short_name: usize,
    pub external_calls: usize,
    pub external_nodes: usize,
    pub dropped_builtins: usize,
    pub ambiguous: usize,
    pub duplicate_definitions: usize,
    #[serde(default)]
    pub parse_failures: Vec<ParseFailure>,
}

/// The finished graph and its derived views
#[derive(Debug, Clone, Default)]
pub struct LinkedGraph {
    pub graph: CodeGraph,
    pub dependency_map: DependencyMap,
    pub stats: LinkStats,
}

enum Resolution {
    Internal(Vec<String>, Confidence),
    External(String),
    Dropped,
}

/// Resolves call sites from every file against the complete definition set
pub struct Linker<'a> {
    builtins: &'a BuiltinNames,
}

impl<'a> Linker<'a> {
    pub fn new(builtins: &'a BuiltinNames) -> Self {
        Self { builtins }
    }

    pub fn link(&self, files: &[FileIndex]) -> LinkedGraph {
        let mut graph = CodeGraph::new();
        let mut stats = LinkStats::default();
        let mut def_files: HashMap<String, String> = HashMap::new();

        for file in files {
            for def in &file.definitions {
                if let Some(previous) = def_files.get(&def.id) {
                    log::warn!(
                        "Definition {} appears in {} and {}; keeping the later one",
                        def.id,
                        previous,
                        def.file
                    );
                    stats.duplicate_definitions += 1;
                }
                def_files.insert(def.id.clone(), def.file.clone());
                graph.add_node(GraphNode::from_definition(def));
            }
        }

        for file in files {
            let Some(module) = graph.find_node(&file.module) else {
                continue;
            };
            for def in &file.definitions {
                if def.id == file.module {
                    continue;
                }
                if let Some(target) = graph.id_index.get(&def.id).copied() {
                    graph.add_edge(module, target, GraphEdge::contains());
                }
            }
        }

        // Modules are not callable, so they never serve as call targets.
        let modules: HashSet<&str> = files.iter().map(|f| f.module.as_str()).collect();
        let mut by_short: HashMap<&str, Vec<&str>> = HashMap::new();
        for id in def_files.keys().filter(|id| !modules.contains(id.as_str())) {
            by_short.entry(short_name(id)).or_default().push(id.as_str());
        }
        for candidates in by_short.values_mut() {
            candidates.sort_unstable();
        }

        let lookup = NameLookup {
            def_files: &def_files,
            modules,
            by_short,
        };

        for file in files {
            for call in &file.calls {
                stats.call_sites += 1;
                let Some(source) = graph.id_index.get(&call.source_scope).copied() else {
                    log::debug!("Call from unknown scope {}", call.source_scope);
                    continue;
                };

                match self.resolve(call, &lookup, &mut stats) {
                    Resolution::Internal(targets, confidence) => {
                        for target in targets {
                            if let Some(target) = graph.id_index.get(&target).copied() {
                                graph.add_edge(source, target, GraphEdge::call(call, confidence));
                            }
                        }
                    }
                    Resolution::External(id) => {
                        stats.external_calls += 1;
                        let target = match graph.id_index.get(&id).copied() {
                            Some(idx) => idx,
                            None => {
                                stats.external_nodes += 1;
                                graph.add_node(GraphNode::external(&call.target_hint))
                            }
                        };
                        graph.add_edge(source, target, GraphEdge::call(call, Confidence::High));
                    }
                    Resolution::Dropped => stats.dropped_builtins += 1,
                }
            }
        }

        apply_importance(&mut graph);
        let dependency_map = DependencyMap::from_graph(&graph);

        stats.definitions = def_files.len();
        stats.files = graph
            .nodes()
            .filter(|(_, node)| node.kind == NodeKind::Module)
            .count();
        stats.calls = graph
            .graph
            .edge_weights()
            .filter(|edge| edge.relation == Relation::Calls)
            .count();

        log::info!(
            "Linked graph: {} nodes, {} edges ({} exact, {} suffix, {} short-name, {} external, {} builtin calls dropped, {} ambiguous)",
            graph.node_count(),
            graph.edge_count(),
            stats.resolved_exact,
            stats.resolved_suffix,
            stats.resolved_short_name,
            stats.external_calls,
            stats.dropped_builtins,
            stats.ambiguous
        );

        LinkedGraph {
            graph,
            dependency_map,
            stats,
        }
    }

    fn resolve(&self, call: &CallSite, lookup: &NameLookup, stats: &mut LinkStats) -> Resolution {
        let hint = call.target_hint.as_str();

        if lookup.def_files.contains_key(hint) && !lookup.modules.contains(hint) {
            stats.resolved_exact += 1;
            return Resolution::Internal(vec![hint.to_string()], Confidence::High);
        }

        let short = short_name(hint);
        let suffix_hint = format!(".{hint}");
        let suffix_short = format!(".{short}");
        let mut candidates: Vec<&str> = lookup
            .by_short
            .get(short)
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|id| id.ends_with(&suffix_hint) || id.ends_with(&suffix_short))
                    .collect()
            })
            .unwrap_or_default();

        if !candidates.is_empty() {
            if candidates.len() > 1 {
                stats.ambiguous += 1;
                candidates.sort_by_key(|id| lookup.preference(id, call));
                log::warn!(
                    "Ambiguous call {} from {} ({}:{}): {} candidates, picked {}",
                    hint,
                    call.source_scope,
                    call.file,
                    call.line,
                    candidates.len(),
                    candidates[0]
                );
            }
            stats.resolved_suffix += 1;
            return Resolution::Internal(vec![candidates[0].to_string()], Confidence::Medium);
        }

        if !hint.contains('.') {
            if let Some(all) = lookup.by_short.get(hint).filter(|ids| !ids.is_empty()) {
                stats.resolved_short_name += 1;
                return Resolution::Internal(
                    all.iter().map(|id| id.to_string()).collect(),
                    Confidence::Low,
                );
            }
        }

        // A receiver imported from a module is a library call even when its method name
        // shadows a built-in.
        if call.import_source.is_none() && self.builtins.contains(short) {
            return Resolution::Dropped;
        }

        Resolution::External(format!("{}{hint}", crate::types::EXTERNAL_PREFIX))
    }
}

struct NameLookup<'a> {
    def_files: &'a HashMap<String, String>,
    modules: HashSet<&'a str>,
    by_short: HashMap<&'a str, Vec<&'a str>>,
}

impl NameLookup<'_> {
    /// Sort key for suffix candidates: import-derived, then same file, then the first
    /// candidate. Among the remaining ones a full-hint suffix comes before id order
    /// (candidates are pre-sorted).
    fn preference(&self, id: &str, call: &CallSite) -> (bool, bool, bool) {
        let imported = call
            .import_source
            .as_deref()
            .is_some_and(|source| matches_import(id, source));
        let full_suffix = id.ends_with(&format!(".{}", call.target_hint));
        let same_file = self
            .def_files
            .get(id)
            .is_some_and(|file| *file == call.file);
        (!imported, !same_file, !full_suffix)
    }
}

fn matches_import(id: &str, source: &str) -> bool {
    if id == source || id.starts_with(&format!("{source}.")) {
        return true;
    }
    source
        .rsplit_once('.')
        .is_some_and(|(module, _)| id.starts_with(&format!("{module}.")))
}
