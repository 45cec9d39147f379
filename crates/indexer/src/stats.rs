use crate::types::ParseFailure;
use serde::{Deserialize, Serialize};

/// Statistics about an indexing run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of files indexed successfully
    pub files: usize,

    /// Number of definitions extracted (modules included)
    pub definitions: usize,

    /// Number of call sites recorded
    pub calls: usize,

    /// Total lines of indexed source
    pub total_lines: usize,

    /// Class attributes discovered in the first pass
    pub registry_entries: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,

    /// Files skipped because they failed to parse
    pub parse_failures: Vec<ParseFailure>,

    /// Other per-file errors (unreadable files, panicked tasks)
    pub errors: Vec<String>,
}

impl IndexStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, lines: usize, definitions: usize, calls: usize) {
        self.files += 1;
        self.total_lines += lines;
        self.definitions += definitions;
        self.calls += calls;
    }

    pub fn add_parse_failure(&mut self, file: impl Into<String>, reason: impl Into<String>) {
        self.parse_failures.push(ParseFailure {
            file: file.into(),
            reason: reason.into(),
        });
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }
}
