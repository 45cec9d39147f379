//! Query side of codemap: loads the persisted artifacts once and answers every request
//! against them.

use crate::bm25::KeywordIndex;
use crate::config::{QueryConfig, VectorMode};
use crate::documents::CorpusBuilder;
use crate::error::{Result, SearchError};
use crate::hybrid::{HybridSearch, SearchHit};
use crate::vector::{InMemoryVectorIndex, SemanticSearch, StubEmbedder};
use codemap_graph::{
    find_entry_file, load_dependency_map, load_graph, ArtifactPaths, CodeGraph, ContextBundle,
    ContextExpander, DependencyMap, DiagramGenerator, FlowTrace, FlowTracer, GraphNode,
    NodeKind,
};
use codemap_indexer::{module_name_for, FileScanner, Role, SourceReader};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Upper bound on [`QueryEngine::lookup`] results
pub const LOOKUP_LIMIT: usize = 10;

/// Neighbours listed per direction by [`QueryEngine::node_info`]
pub const NODE_INFO_NEIGHBORS: usize = 10;

/// Modules listed by [`QueryEngine::overview`]
pub const OVERVIEW_MODULES: usize = 8;

/// Characters of the README shown in the overview
pub const README_CHAR_LIMIT: usize = 2000;

/// Lines of the project file tree shown in the overview
pub const FILE_TREE_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult {
    pub symbol: String,
    pub ids: Vec<String>,
}

impl LookupResult {
    pub fn render(&self) -> String {
        if self.ids.is_empty() {
            return format!("No exact matches found for '{}'.", self.symbol);
        }
        let mut out = format!("Found '{}' in these locations:\n", self.symbol);
        out.push_str(&self.ids.join("\n"));
        out
    }
}

/// Metadata and direct neighbours of one node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeInfo {
    pub id: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub definition_line: usize,
    pub importance: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inherits_from: Vec<String>,
    pub calls: Vec<String>,
    pub called_by: Vec<String>,
}

impl NodeInfo {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "id: {}", self.id);
        let _ = writeln!(out, "type: {}", self.kind);
        if let Some(role) = self.role {
            let _ = writeln!(out, "role: {role}");
        }
        if let Some(file) = &self.file {
            let _ = writeln!(out, "file: {file}");
        }
        let _ = writeln!(out, "definition_line: {}", self.definition_line);
        let _ = writeln!(out, "importance: {:.4}", self.importance);
        if !self.inherits_from.is_empty() {
            let _ = writeln!(out, "inherits_from: [{}]", self.inherits_from.join(", "));
        }
        let _ = writeln!(out, "calls: [{}]", self.calls.join(", "));
        let _ = write!(out, "called_by: [{}]", self.called_by.join(", "));
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoreModule {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub importance: f64,
}

/// Head of the README nearest the project root
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadmeExcerpt {
    pub path: String,
    pub content: String,
    pub truncated: bool,
}

/// Project outline: README, most central modules, entry point and file tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<ReadmeExcerpt>,
    pub core_modules: Vec<CoreModule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_node: Option<String>,
    pub file_tree: Vec<String>,
}

impl Overview {
    pub fn render(&self) -> String {
        let mut out = String::new();
        match &self.readme {
            Some(readme) => {
                let _ = write!(out, "README ({}):\n{}", readme.path, readme.content);
                if readme.truncated {
                    out.push_str("\n... [Truncated] ...");
                }
                out.push_str("\n\n");
            }
            None => out.push_str("README: Not found in repository.\n\n"),
        }

        if self.core_modules.is_empty() {
            out.push_str("CORE FILES: Graph not available or no high-gravity files found.\n");
        } else {
            out.push_str("CORE FILES (Most heavily referenced):\n");
            for module in &self.core_modules {
                let _ = writeln!(out, "  - {} (Importance: {:.4})", module.id, module.importance);
            }
        }
        match (&self.entry_file, &self.entry_node) {
            (Some(file), Some(node)) => {
                let _ = write!(out, "\nEntry point: {file} (starts at {node})");
            }
            (Some(file), None) => {
                let _ = write!(out, "\nEntry point: {file}");
            }
            _ => out.push_str("\nEntry point: not found"),
        }

        if !self.file_tree.is_empty() {
            out.push_str("\n\nPROJECT FILE TREE:\n");
            out.push_str(&self.file_tree.join("\n"));
        }
        out
    }
}

/// Loaded artifacts plus the project sources they describe
pub struct QueryEngine {
    graph: CodeGraph,
    deps: DependencyMap,
    reader: SourceReader,
    scanner: FileScanner,
    search: HybridSearch,
    config: QueryConfig,
}

impl QueryEngine {
    /// Load the graph, dependency map and keyword index. Any absent artifact fails the
    /// whole open with [`SearchError::MissingArtifact`].
    pub async fn open(root: impl AsRef<Path>, paths: &ArtifactPaths, config: QueryConfig) -> Result<Self> {
        config.validate().map_err(SearchError::Other)?;

        let graph = load_graph(paths).await?;
        let deps = load_dependency_map(paths).await?;
        let keyword = KeywordIndex::load(&paths.keyword_index()).await?;
        let reader = SourceReader::new(root);

        let semantic = match config.vector {
            VectorMode::None => None,
            VectorMode::Stub => {
                let documents = CorpusBuilder::new(&graph, &reader, &deps).vector_documents();
                let embedder = StubEmbedder::default();
                let index = InMemoryVectorIndex::build(&embedder, &documents).await?;
                Some(SemanticSearch::new(Arc::new(embedder), Arc::new(index)))
            }
        };

        log::info!(
            "Query engine ready: {} nodes, {} edges, {} keyword documents",
            graph.node_count(),
            graph.edge_count(),
            keyword.len()
        );

        Ok(Self::from_parts(graph, deps, reader, keyword, semantic, config))
    }

    /// Assemble an engine from already loaded parts, e.g. to plug in an external vector
    /// provider
    pub fn from_parts(
        graph: CodeGraph,
        deps: DependencyMap,
        reader: SourceReader,
        keyword: KeywordIndex,
        semantic: Option<SemanticSearch>,
        config: QueryConfig,
    ) -> Self {
        let search = HybridSearch::new(keyword, semantic, config.search.clone());
        let scanner = FileScanner::new(reader.root(), config.indexer.clone());
        Self {
            graph,
            deps,
            reader,
            scanner,
            search,
            config,
        }
    }

    pub fn graph(&self) -> &CodeGraph {
        &self.graph
    }

    pub fn dependency_map(&self) -> &DependencyMap {
        &self.deps
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.search.search(query, limit).await
    }

    pub fn expand(&self, id: &str) -> Result<ContextBundle> {
        let expander = ContextExpander::new(&self.graph, &self.reader, self.config.expand.clone());
        Ok(expander.expand(id)?)
    }

    pub fn trace_flow(&self, start: &str, depth: Option<usize>) -> Result<FlowTrace> {
        let depth = depth.unwrap_or(self.config.flow.max_depth);
        Ok(FlowTracer::new(&self.graph, &self.deps).trace(start, depth)?)
    }

    pub fn generate_diagram(&self, ids: &[String], depth: Option<usize>) -> Result<String> {
        Ok(DiagramGenerator::new(&self.graph, self.config.diagram.clone()).generate(ids, depth)?)
    }

    /// Keyword-only search for an exact symbol
    pub fn lookup(&self, symbol: &str) -> Result<LookupResult> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let ids = self
            .search
            .keyword()
            .search(symbol, LOOKUP_LIMIT)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        Ok(LookupResult {
            symbol: symbol.to_string(),
            ids,
        })
    }

    pub fn node_info(&self, id: &str) -> Result<NodeInfo> {
        let idx = self.graph.resolve(id)?;
        let node = self
            .graph
            .get_node(idx)
            .ok_or_else(|| codemap_graph::GraphError::NodeNotFound(id.to_string()))?;

        let ids = |indices: Vec<_>| -> Vec<String> {
            indices
                .into_iter()
                .filter_map(|i| self.graph.get_node(i).map(|n| n.id.clone()))
                .take(NODE_INFO_NEIGHBORS)
                .collect()
        };

        Ok(NodeInfo {
            id: node.id.clone(),
            kind: node.kind,
            role: node.role,
            file: node.file.clone(),
            definition_line: node.start_line,
            importance: node.importance_score,
            inherits_from: self.base_ids(node),
            calls: ids(self.graph.successors(idx)),
            called_by: ids(self.graph.predecessors(idx)),
        })
    }

    pub fn overview(&self) -> Overview {
        let core_modules = self
            .graph
            .modules_by_importance()
            .into_iter()
            .take(OVERVIEW_MODULES)
            .map(|node| CoreModule {
                id: node.id.clone(),
                file: node.file.clone(),
                importance: node.importance_score,
            })
            .collect();

        let entry_file = find_entry_file(&self.graph, &self.reader);
        let entry_node = entry_file
            .as_deref()
            .and_then(|file| FlowTracer::new(&self.graph, &self.deps).entry_node(file));

        Overview {
            readme: self.readme(),
            core_modules,
            entry_file,
            entry_node,
            file_tree: self.scanner.file_tree(FILE_TREE_LIMIT),
        }
    }

    /// Numbered lines of a project file; see [`SourceReader::read_file`]
    pub fn read_file(&self, path: &str, start: usize, end: Option<usize>) -> Result<String> {
        Ok(self.reader.read_file(path, start, end)?)
    }

    /// Flow trace starting at the detected entry point
    pub fn trace_entry_flow(&self, depth: Option<usize>) -> Result<FlowTrace> {
        let start = self.entry_node()?;
        self.trace_flow(&start, depth)
    }

    /// Mermaid rendering of a flow trace; without `start` the entry point is used
    pub fn flow_diagram(&self, start: Option<&str>, depth: Option<usize>) -> Result<String> {
        let trace = match start {
            Some(start) => self.trace_flow(start, depth)?,
            None => self.trace_entry_flow(depth)?,
        };
        Ok(trace.to_mermaid())
    }

    fn readme(&self) -> Option<ReadmeExcerpt> {
        let path = self.scanner.find_readme()?;
        let text = match self.reader.read(&path) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("README found at {path} but could not be read: {e}");
                return None;
            }
        };

        let mut chars = text.chars();
        let content: String = chars.by_ref().take(README_CHAR_LIMIT).collect();
        Some(ReadmeExcerpt {
            path,
            content,
            truncated: chars.next().is_some(),
        })
    }

    /// Class bases as node ids where the class is defined in the same module, otherwise as
    /// written
    fn base_ids(&self, node: &GraphNode) -> Vec<String> {
        let module = node.file.as_deref().map(module_name_for);
        node.bases
            .iter()
            .map(|base| {
                module
                    .iter()
                    .map(|m| format!("{m}.{base}"))
                    .chain(std::iter::once(base.clone()))
                    .find_map(|candidate| self.graph.node_by_id(&candidate).map(|n| n.id.clone()))
                    .unwrap_or_else(|| base.clone())
            })
            .collect()
    }

    fn entry_node(&self) -> Result<String> {
        let no_entry = || SearchError::Other("Project analysis failed: no entry point found.".to_string());
        let file = find_entry_file(&self.graph, &self.reader).ok_or_else(no_entry)?;
        FlowTracer::new(&self.graph, &self.deps)
            .entry_node(&file)
            .ok_or_else(no_entry)
    }
}
