use serde::{Deserialize, Serialize};

/// Configuration for the source walker and the semantic indexer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Directory names skipped anywhere below the root
    pub ignore_dirs: Vec<String>,

    /// File extensions treated as Python source
    pub extensions: Vec<String>,

    /// Files larger than this are skipped by the walker
    pub max_file_size_bytes: u64,

    /// Definitions spanning more lines than this are flagged `is_oversized`
    pub oversized_line_threshold: usize,

    /// Upper bound on files parsed concurrently (0 = derive from available CPUs)
    pub parallelism: usize,

    /// Respect `.gitignore` files while walking
    pub respect_gitignore: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            ignore_dirs: DEFAULT_IGNORE_DIRS.iter().map(|s| (*s).to_string()).collect(),
            extensions: vec!["py".to_string()],
            max_file_size_bytes: 1_048_576,
            oversized_line_threshold: 300,
            parallelism: 0,
            respect_gitignore: true,
        }
    }
}

impl IndexerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.extensions.is_empty() {
            return Err("extensions must list at least one source extension".to_string());
        }

        if self.oversized_line_threshold == 0 {
            return Err("oversized_line_threshold must be > 0".to_string());
        }

        if self.max_file_size_bytes == 0 {
            return Err("max_file_size_bytes must be > 0".to_string());
        }

        Ok(())
    }

    /// Number of files parsed per batch
    pub fn effective_parallelism(&self) -> usize {
        if self.parallelism > 0 {
            return self.parallelism;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .clamp(2, 8)
    }
}

const DEFAULT_IGNORE_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    "venv",
    ".venv",
    "env",
    "node_modules",
    "dist",
    "tests",
    "docs",
    "site-packages",
    ".idea",
    ".vscode",
];
