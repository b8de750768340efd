use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("docx parse error: {0}")]
    DocxParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("embedding service failure from {provider}: {details}")]
    EmbeddingService { provider: String, details: String },

    #[error("no embeddings to index")]
    EmptyCorpus,

    #[error("embedding dimension {found} does not match expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("retrieval request failed: {0}")]
    Request(String),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
