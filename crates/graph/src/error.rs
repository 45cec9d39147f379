use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Node '{0}' not found in graph.")]
    NodeNotFound(String),

    #[error("Missing {artifact} at {path}. Run `codemap index` first.")]
    MissingArtifact { artifact: String, path: String },

    #[error("Error: Diagram too complex ({nodes} nodes). Filtered out external libs but still too big. Try depth=1.")]
    DiagramTooComplex { nodes: usize, ceiling: usize },

    #[error("Error: {0}")]
    EmptyRequest(String),

    #[error("Graph build error: {0}")]
    BuildError(String),

    #[error("Cannot read source: {0}")]
    SourceUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Corrupted artifact: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl GraphError {
    pub fn missing_artifact(artifact: impl Into<String>, path: &std::path::Path) -> Self {
        Self::MissingArtifact {
            artifact: artifact.into(),
            path: path.display().to_string(),
        }
    }
}
