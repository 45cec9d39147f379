use crate::bm25::{Bm25Params, KeywordIndex};
use crate::config::SearchConfig;
use crate::documents::CorpusBuilder;
use crate::error::Result;
use codemap_graph::{persist, ArtifactPaths, BuiltinNames, LinkStats, Linker};
use codemap_indexer::{IndexStats, IndexerConfig, ProjectIndexer, SourceReader};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Instant;

/// Outcome of a full indexing run
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    pub indexing: IndexStats,
    pub linking: LinkStats,
    pub keyword_documents: usize,
    pub artifact_dir: String,
    pub time_ms: u64,
}

impl IndexReport {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Indexed {} files ({} definitions, {} call sites) in {} ms",
            self.indexing.files, self.indexing.definitions, self.indexing.calls, self.time_ms
        );
        let _ = writeln!(
            out,
            "Linked {} calls: {} exact, {} suffix, {} short-name, {} external, {} builtin dropped, {} ambiguous",
            self.linking.calls,
            self.linking.resolved_exact,
            self.linking.resolved_suffix,
            self.linking.resolved_short_name,
            self.linking.external_calls,
            self.linking.dropped_builtins,
            self.linking.ambiguous
        );
        let _ = writeln!(out, "Keyword index: {} documents", self.keyword_documents);
        for failure in &self.linking.parse_failures {
            let _ = writeln!(out, "Skipped {}: {}", failure.file, failure.reason);
        }
        let _ = write!(out, "Artifacts: {}", self.artifact_dir);
        out
    }
}

/// Index `root`, link the result, and write every artifact under `paths`.
///
/// Files that fail to parse are skipped and listed in the report; only an unreadable
/// root or a failed artifact write aborts the run.
pub async fn index_project(
    root: &Path,
    paths: &ArtifactPaths,
    indexer_config: IndexerConfig,
    search_config: &SearchConfig,
) -> Result<IndexReport> {
    let started = Instant::now();

    let project = ProjectIndexer::new(root, indexer_config)?.index().await?;

    let builtins = BuiltinNames::python();
    let mut linked = Linker::new(&builtins).link(&project.files);
    linked.stats.parse_failures = project.stats.parse_failures.clone();

    persist(paths, &linked).await?;

    let reader = SourceReader::new(root);
    let documents =
        CorpusBuilder::new(&linked.graph, &reader, &linked.dependency_map).keyword_documents();
    let keyword = KeywordIndex::build(documents, Bm25Params::from(search_config));
    keyword.save(&paths.keyword_index()).await?;

    let report = IndexReport {
        indexing: project.stats,
        linking: linked.stats,
        keyword_documents: keyword.len(),
        artifact_dir: paths.dir().display().to_string(),
        time_ms: started.elapsed().as_millis() as u64,
    };
    log::info!("Index complete in {} ms", report.time_ms);
    Ok(report)
}
