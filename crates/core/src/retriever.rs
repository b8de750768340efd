use crate::embeddings::Embedder;
use crate::error::RetrievalError;
use crate::index::FlatIndex;
use crate::models::{Citation, ContextBlock, RetrievalHit};
use crate::traits::GraphStore;
use tracing::{debug, warn};

pub const DEFAULT_TOP_K: usize = 5;

/// Retrieval over a single document: fetch its stored embeddings, build a
/// fresh flat index, embed the query, search, and hydrate the hits into a
/// [`ContextBlock`] with citations.
pub struct DocumentRetriever<E, S> {
    embedder: E,
    store: S,
}

impl<E, S> DocumentRetriever<E, S>
where
    E: Embedder,
    S: GraphStore,
{
    pub fn new(embedder: E, store: S) -> Self {
        Self { embedder, store }
    }

    /// A document with no stored chunks yields an empty block, not an error;
    /// absence of one document must never abort a corpus sweep.
    pub async fn retrieve(
        &self,
        document_name: &str,
        query: &str,
        top_k: usize,
    ) -> Result<ContextBlock, RetrievalError> {
        let (chunk_keys, embeddings) = self.store.fetch_embeddings(document_name).await?;

        if chunk_keys.is_empty() {
            debug!(document = document_name, "no stored chunks, skipping");
            return Ok(ContextBlock::default());
        }

        let index = FlatIndex::build(&embeddings)?;
        let query_vector = self.embedder.embed(query).await?;
        let raw_hits = index.search(&query_vector, top_k)?;

        let mut context = String::new();
        let mut citations = Vec::new();
        let mut hits = Vec::new();

        for (position, distance) in raw_hits {
            let chunk_key = chunk_keys[position].clone();
            hits.push(RetrievalHit {
                chunk_key: chunk_key.clone(),
                distance,
            });

            match self.store.chunk_details(&chunk_key).await? {
                Some(details) => {
                    if !context.is_empty() {
                        context.push_str("\n\n");
                    }
                    context.push_str(&details.text);
                    citations.push(Citation {
                        document_name: details.document_name,
                        page_number: details.page_number,
                        distance,
                    });
                }
                None => {
                    warn!(chunk_key = %chunk_key, "search hit no longer resolves, dropping");
                }
            }
        }

        Ok(ContextBlock {
            context,
            citations,
            hits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryStore, StubEmbedder};
    use std::sync::Arc;

    fn store_with_chunks(document: &str, texts: &[&str]) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::default());
        store.seed_document(document, texts);
        store
    }

    #[tokio::test]
    async fn empty_document_yields_empty_block() {
        let store = Arc::new(InMemoryStore::default());
        let retriever = DocumentRetriever::new(StubEmbedder::default(), store);

        let block = retriever.retrieve("A.pdf", "alpha", 5).await.unwrap();
        assert!(block.is_empty());
        assert!(block.hits.is_empty());
    }

    #[tokio::test]
    async fn returns_at_most_top_k_and_exactly_min_of_k_and_n() {
        let store = store_with_chunks("A.pdf", &["alpha one", "alpha two"]);
        let retriever = DocumentRetriever::new(StubEmbedder::default(), store);

        let block = retriever.retrieve("A.pdf", "alpha", 5).await.unwrap();
        assert_eq!(block.citations.len(), 2);
        assert_eq!(block.hits.len(), 2);
    }

    #[tokio::test]
    async fn citations_are_ordered_nearest_first() {
        let store = store_with_chunks(
            "A.pdf",
            &["beta beta beta", "alpha alpha alpha", "alpha beta"],
        );
        let retriever = DocumentRetriever::new(StubEmbedder::default(), store);

        let block = retriever.retrieve("A.pdf", "alpha alpha alpha", 3).await.unwrap();

        let distances: Vec<f32> = block
            .citations
            .iter()
            .map(|citation| citation.distance)
            .collect();
        assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(block.citations[0].page_number, 2);
    }

    #[tokio::test]
    async fn unresolvable_hit_is_dropped_from_citations_but_kept_in_hits() {
        let store = store_with_chunks("A.pdf", &["alpha one", "alpha two"]);
        let dropped_key = crate::chunking::make_chunk_key("A.pdf", 2);
        store.drop_chunk(&dropped_key);

        let retriever = DocumentRetriever::new(StubEmbedder::default(), store);
        let block = retriever.retrieve("A.pdf", "alpha", 5).await.unwrap();

        assert_eq!(block.hits.len(), 2);
        assert_eq!(block.citations.len(), 1);
        assert_eq!(block.citations[0].page_number, 1);
    }

    #[tokio::test]
    async fn citations_carry_document_and_page_metadata() {
        let store = store_with_chunks("guidelines.pdf", &["alpha storage rules"]);
        let retriever = DocumentRetriever::new(StubEmbedder::default(), store);

        let block = retriever.retrieve("guidelines.pdf", "alpha", 5).await.unwrap();
        assert_eq!(block.citations[0].document_name, "guidelines.pdf");
        assert_eq!(block.citations[0].page_number, 1);
        assert!(block.context.contains("alpha storage rules"));
    }
}
