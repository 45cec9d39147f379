use crate::config::IndexerConfig;
use crate::error::{IndexerError, Result};
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

/// Scanner for finding Python source files in a project
pub struct FileScanner {
    root: PathBuf,
    config: IndexerConfig,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>, config: IndexerConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the root for source files, sorted by path.
    ///
    /// Fails only when the root itself cannot be enumerated; unreadable entries below it
    /// are logged and skipped.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(IndexerError::InvalidPath(format!(
                "{} is not a readable directory",
                self.root.display()
            )));
        }

        let mut files = Vec::new();

        for result in self.walker().build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > self.config.max_file_size_bytes {
                            log::debug!(
                                "Skipping large file {} ({} bytes > {})",
                                path.display(),
                                meta.len(),
                                self.config.max_file_size_bytes
                            );
                            continue;
                        }
                    }

                    if !self.is_source_file(path) {
                        continue;
                    }

                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!("Found {} source files", files.len());
        Ok(files)
    }

    /// Indented listing of directories and source files, `name/` for directories and
    /// four spaces per level, capped at `limit` lines
    pub fn file_tree(&self, limit: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for entry in self.walker().sort_by_file_name(|a, b| a.cmp(b)).build() {
            if lines.len() >= limit {
                break;
            }
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Failed to read entry: {e}");
                    continue;
                }
            };
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            if !is_dir && !self.is_source_file(entry.path()) {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            let indent = " ".repeat(4 * entry.depth());
            lines.push(if is_dir {
                format!("{indent}{name}/")
            } else {
                format!("{indent}{name}")
            });
        }
        lines
    }

    /// Relative path of the README closest to the root; shorter paths win ties
    pub fn find_readme(&self) -> Option<String> {
        self.walker()
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .to_lowercase()
                    .contains("readme")
            })
            .map(|entry| (entry.depth(), self.relative_path(entry.path())))
            .min_by(|a, b| (a.0, a.1.len(), &a.1).cmp(&(b.0, b.1.len(), &b.1)))
            .map(|(_, path)| path)
    }

    fn walker(&self) -> WalkBuilder {
        let root = self.root.clone();
        let ignore_dirs = self.config.ignore_dirs.clone();
        let gitignore = self.config.respect_gitignore;

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(gitignore)
            .git_global(gitignore)
            .git_exclude(gitignore)
            .require_git(false)
            .filter_entry(move |entry| !is_ignored_scope(entry.path(), &root, &ignore_dirs));
        builder
    }

    /// Path of `file` relative to the root, always `/`-separated
    pub fn relative_path(&self, file: &Path) -> String {
        relative_path(&self.root, file)
    }

    fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .extensions
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

pub(crate) fn relative_path(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_ignored_scope(path: &Path, root: &Path, ignore_dirs: &[String]) -> bool {
    if let Ok(relative) = path.strip_prefix(root) {
        for component in relative.components() {
            if let Component::Normal(name) = component {
                let name = name.to_string_lossy();
                if ignore_dirs.iter().any(|ignored| ignored == name.as_ref()) {
                    return true;
                }
            }
        }
    }
    false
}
