use crate::error::RetrievalError;
use crate::models::{ChunkDetails, ChunkRecord};
use async_trait::async_trait;

/// Property-graph persistence for chunks. Each call owns its own session;
/// no connection is held across a sweep.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Upserts one node per chunk, keyed by `chunk_key`. Re-ingestion of the
    /// same document overwrites rather than duplicates.
    async fn upsert_chunks(
        &self,
        chunks: &[ChunkRecord],
        embeddings: &[Vec<f32>],
    ) -> Result<(), RetrievalError>;

    /// Creates auxiliary `RELATED_TO` edges from this document's chunks to
    /// the rest of the corpus. Traversal only, never consulted for ranking.
    async fn link_related(&self, document_name: &str) -> Result<(), RetrievalError>;

    /// Returns `(chunk_keys, embeddings)` for one document, in stored page
    /// order. An empty result means "skip document", not an error.
    async fn fetch_embeddings(
        &self,
        document_name: &str,
    ) -> Result<(Vec<String>, Vec<Vec<f32>>), RetrievalError>;

    /// Hydrates one search hit. `None` means the node no longer resolves.
    async fn chunk_details(&self, chunk_key: &str)
        -> Result<Option<ChunkDetails>, RetrievalError>;
}

// Lets the ingestion pipeline and the retriever share one store handle.
#[async_trait]
impl<S> GraphStore for std::sync::Arc<S>
where
    S: GraphStore + ?Sized,
{
    async fn upsert_chunks(
        &self,
        chunks: &[ChunkRecord],
        embeddings: &[Vec<f32>],
    ) -> Result<(), RetrievalError> {
        (**self).upsert_chunks(chunks, embeddings).await
    }

    async fn link_related(&self, document_name: &str) -> Result<(), RetrievalError> {
        (**self).link_related(document_name).await
    }

    async fn fetch_embeddings(
        &self,
        document_name: &str,
    ) -> Result<(Vec<String>, Vec<Vec<f32>>), RetrievalError> {
        (**self).fetch_embeddings(document_name).await
    }

    async fn chunk_details(
        &self,
        chunk_key: &str,
    ) -> Result<Option<ChunkDetails>, RetrievalError> {
        (**self).chunk_details(chunk_key).await
    }
}
