use crate::config::IndexerConfig;
use crate::error::{IndexerError, Result};
use crate::registry::ClassRegistry;
use crate::scanner::{relative_path, FileScanner};
use crate::semantic::SemanticIndexer;
use crate::stats::IndexStats;
use crate::syntax::parse_python;
use crate::types::FileIndex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tree_sitter::Tree;

/// Output of a full indexing run
#[derive(Debug, Clone, Default)]
pub struct IndexedProject {
    /// One entry per successfully parsed file, in path order
    pub files: Vec<FileIndex>,
    /// Class attributes merged across every file
    pub registry: ClassRegistry,
    pub stats: IndexStats,
}

/// A parsed file carried from the discovery pass into the resolution pass
struct ParsedSource {
    file: String,
    source: String,
    tree: Tree,
    discovered: ClassRegistry,
}

type TaskOutcome = std::result::Result<ParsedSource, IndexerError>;

/// Project indexer: walks the root, parses every file and runs the semantic pass.
///
/// Files are handled in two parallel passes. The first parses each file and collects
/// the class attributes it assigns; those are merged into one registry, which the
/// second pass reads while resolving call sites.
pub struct ProjectIndexer {
    root: PathBuf,
    config: IndexerConfig,
}

impl ProjectIndexer {
    pub fn new(root: impl AsRef<Path>, config: IndexerConfig) -> Result<Self> {
        config.validate().map_err(IndexerError::InvalidConfig)?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            config,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn index(&self) -> Result<IndexedProject> {
        let start = Instant::now();
        let scanner = FileScanner::new(&self.root, self.config.clone());
        let files = scanner.scan()?;
        let mut stats = IndexStats::new();

        let parsed = self.discover(&files, &mut stats).await;

        let mut registry = ClassRegistry::new();
        let mut sources = Vec::with_capacity(parsed.len());
        for mut file in parsed {
            registry.merge(std::mem::take(&mut file.discovered));
            sources.push(file);
        }
        stats.registry_entries = registry.len();
        log::info!(
            "Discovery pass: {} files parsed, {} class attributes",
            sources.len(),
            stats.registry_entries
        );

        let registry = Arc::new(registry);
        let files = self.resolve(sources, Arc::clone(&registry), &mut stats).await;

        stats.time_ms = start.elapsed().as_millis() as u64;
        log::info!(
            "Indexed {} files ({} definitions, {} calls, {} parse failures) in {} ms",
            stats.files,
            stats.definitions,
            stats.calls,
            stats.parse_failures.len(),
            stats.time_ms
        );

        let registry = Arc::try_unwrap(registry).unwrap_or_else(|shared| (*shared).clone());
        Ok(IndexedProject {
            files,
            registry,
            stats,
        })
    }

    /// First pass: read, parse and collect class attributes, in bounded batches
    async fn discover(&self, files: &[PathBuf], stats: &mut IndexStats) -> Vec<ParsedSource> {
        let max_concurrent = self.config.effective_parallelism();
        let threshold = self.config.oversized_line_threshold;
        let mut parsed = Vec::with_capacity(files.len());

        for batch in files.chunks(max_concurrent) {
            let mut tasks = Vec::with_capacity(batch.len());
            for path in batch {
                let path = path.clone();
                let file = relative_path(&self.root, &path);
                tasks.push(tokio::task::spawn_blocking(move || {
                    parse_source(path, file, threshold)
                }));
            }

            for task in tasks {
                match task.await {
                    Ok(Ok(source)) => parsed.push(source),
                    Ok(Err(IndexerError::ParseError { path, reason })) => {
                        log::warn!("Skipping {path}: {reason}");
                        stats.add_parse_failure(path, reason);
                    }
                    Ok(Err(e)) => {
                        log::warn!("{e}");
                        stats.add_error(e.to_string());
                    }
                    Err(e) => stats.add_error(format!("Task panicked: {e}")),
                }
            }
        }

        parsed
    }

    /// Second pass: re-walk every kept tree against the merged registry
    async fn resolve(
        &self,
        sources: Vec<ParsedSource>,
        registry: Arc<ClassRegistry>,
        stats: &mut IndexStats,
    ) -> Vec<FileIndex> {
        let max_concurrent = self.config.effective_parallelism();
        let threshold = self.config.oversized_line_threshold;
        let mut indexes = Vec::with_capacity(sources.len());
        let mut pending = sources.into_iter().peekable();

        while pending.peek().is_some() {
            let batch: Vec<ParsedSource> = pending.by_ref().take(max_concurrent).collect();
            let mut tasks = Vec::with_capacity(batch.len());
            for source in batch {
                let registry = Arc::clone(&registry);
                tasks.push(tokio::task::spawn_blocking(move || {
                    SemanticIndexer::new(&source.file, &source.source, &registry, threshold)
                        .analyze(&source.tree)
                        .index
                }));
            }

            for task in tasks {
                match task.await {
                    Ok(index) => {
                        stats.add_file(index.lines, index.definitions.len(), index.calls.len());
                        indexes.push(index);
                    }
                    Err(e) => stats.add_error(format!("Task panicked: {e}")),
                }
            }
        }

        indexes
    }
}

fn parse_source(path: PathBuf, file: String, threshold: usize) -> TaskOutcome {
    let bytes = std::fs::read(&path)
        .map_err(|e| IndexerError::Other(format!("{}: {e}", path.display())))?;
    let source = String::from_utf8_lossy(&bytes).into_owned();
    let tree = parse_python(&file, &source)?;
    let discovered = SemanticIndexer::new(&file, &source, &ClassRegistry::new(), threshold)
        .analyze(&tree)
        .discovered;
    log::debug!("Parsed {file}");
    Ok(ParsedSource {
        file,
        source,
        tree,
        discovered,
    })
}
