//! # Codemap Indexer
//!
//! Source walking and per-file semantic indexing of Python repositories.
//!
//! ## Pipeline
//!
//! ```text
//! Directory
//!     │
//!     ├──> File Scanner (.gitignore aware, ignore-list filtered)
//!     │      └─> Python files
//!     │
//!     ├──> Discovery pass (parallel): parse + collect `self.attr` types
//!     │      └─> Merged class registry
//!     │
//!     └──> Resolution pass (parallel): definitions + call sites
//!            └─> FileIndex per file
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use codemap_indexer::{IndexerConfig, ProjectIndexer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let indexer = ProjectIndexer::new("/path/to/project", IndexerConfig::default())?;
//!     let project = indexer.index().await?;
//!
//!     println!(
//!         "Indexed {} files, {} definitions",
//!         project.stats.files, project.stats.definitions
//!     );
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod indexer;
mod registry;
mod scanner;
mod scope;
mod semantic;
mod source;
mod stats;
mod syntax;
mod types;

pub use config::IndexerConfig;
pub use error::{IndexerError, Result};
pub use indexer::{IndexedProject, ProjectIndexer};
pub use registry::ClassRegistry;
pub use scanner::FileScanner;
pub use scope::{ScopeArena, ScopeId};
pub use semantic::{index_source, FileAnalysis, SemanticIndexer};
pub use source::{number_lines, skeleton, stub, SourceReader, MAX_READ_LINES};
pub use stats::IndexStats;
pub use syntax::{clean_docstring, module_name_for, parse_python, python_parser};
pub use types::{
    CallSite, Definition, DefinitionKind, FileIndex, ParseFailure, Role, SyntacticContext,
};
