pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod index;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod retriever;
pub mod stores;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use chunking::{build_chunks, chunk_text, make_chunk_key, ChunkingConfig, DEFAULT_CHUNK_SIZE};
pub use embeddings::{
    Embedder, HashedNgramEmbedder, OpenAiEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
    DEFAULT_EMBEDDING_MODEL,
};
pub use error::{IngestError, RetrievalError};
pub use extractor::{extract_bytes, extract_file};
pub use index::FlatIndex;
pub use ingest::{discover_document_files, IngestionPipeline};
pub use models::{
    ChunkDetails, ChunkRecord, Citation, ContextBlock, DocumentReport, FolderReport, RetrievalHit,
    SkippedDocument, SkippedFile, SweepOutcome,
};
pub use orchestrator::CorpusRetriever;
pub use retriever::{DocumentRetriever, DEFAULT_TOP_K};
pub use stores::Neo4jStore;
pub use traits::GraphStore;
