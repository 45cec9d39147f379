use codemap_graph::GraphError;
use codemap_indexer::IndexerError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Error: Query is empty.")]
    EmptyQuery,

    #[error("Missing {artifact} at {path}. Run `codemap index` first.")]
    MissingArtifact { artifact: String, path: String },

    #[error("Vector provider failed: {0}")]
    VectorProvider(String),

    #[error(transparent)]
    Graph(GraphError),

    #[error(transparent)]
    Indexer(#[from] IndexerError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Corrupted artifact: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<GraphError> for SearchError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::MissingArtifact { artifact, path } => {
                Self::MissingArtifact { artifact, path }
            }
            other => Self::Graph(other),
        }
    }
}
