use anyhow::{bail, Context, Result};
use codemap_graph::{DiagramConfig, ExpandConfig, FlowConfig};
use codemap_indexer::IndexerConfig;
use codemap_search::{QueryConfig, SearchConfig, VectorMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Looked up in the project root when `--config` is not given
pub(crate) const CONFIG_FILE_NAME: &str = "codemap.toml";

/// Contents of `codemap.toml`; every section is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    /// Artifact directory, relative to the project root unless absolute
    pub storage_dir: Option<PathBuf>,
    pub vector: VectorMode,
    pub indexer: IndexerConfig,
    pub expand: ExpandConfig,
    pub flow: FlowConfig,
    pub diagram: DiagramConfig,
    pub search: SearchConfig,
}

impl AppConfig {
    /// Read `explicit`, or `codemap.toml` under `root` when present, else defaults
    pub(crate) fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    bail!("Config file {} does not exist", path.display());
                }
                path.to_path_buf()
            }
            None => {
                let candidate = root.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    log::debug!("No {CONFIG_FILE_NAME} in {}, using defaults", root.display());
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.query_config().validate().map_err(anyhow::Error::msg)
    }

    pub(crate) fn query_config(&self) -> QueryConfig {
        QueryConfig {
            indexer: self.indexer.clone(),
            expand: self.expand.clone(),
            flow: self.flow.clone(),
            diagram: self.diagram.clone(),
            search: self.search.clone(),
            vector: self.vector,
        }
    }

    pub(crate) fn storage_dir(&self, root: &Path) -> Option<PathBuf> {
        self.storage_dir.as_ref().map(|dir| {
            if dir.is_absolute() {
                dir.clone()
            } else {
                root.join(dir)
            }
        })
    }
}
