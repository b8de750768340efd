use crate::embeddings::Embedder;
use crate::error::RetrievalError;
use crate::models::{ContextBlock, SkippedDocument, SweepOutcome};
use crate::retriever::DocumentRetriever;
use crate::traits::GraphStore;
use tracing::warn;

/// Sweeps the configured corpus one document at a time. The corpus list is
/// injected here and owned here; no other component carries its own copy.
pub struct CorpusRetriever<E, S> {
    retriever: DocumentRetriever<E, S>,
    corpus: Vec<String>,
}

impl<E, S> CorpusRetriever<E, S>
where
    E: Embedder,
    S: GraphStore,
{
    pub fn new(embedder: E, store: S, corpus: Vec<String>) -> Self {
        Self {
            retriever: DocumentRetriever::new(embedder, store),
            corpus,
        }
    }

    pub fn corpus(&self) -> &[String] {
        &self.corpus
    }

    /// Retrieves context independently per document. A hard failure on one
    /// document is logged and recorded, never allowed to abort the sweep;
    /// every corpus document gets an entry in the outcome either way.
    pub async fn get_context(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<SweepOutcome, RetrievalError> {
        if query.trim().is_empty() {
            return Err(RetrievalError::Request("query is empty".to_string()));
        }

        let mut outcome = SweepOutcome::default();

        for document_name in &self.corpus {
            match self.retriever.retrieve(document_name, query, top_k).await {
                Ok(block) => {
                    outcome.blocks.insert(document_name.clone(), block);
                }
                Err(error) => {
                    warn!(document = %document_name, error = %error, "document skipped during sweep");
                    outcome.skipped.push(SkippedDocument {
                        document_name: document_name.clone(),
                        reason: error.to_string(),
                    });
                    outcome
                        .blocks
                        .insert(document_name.clone(), ContextBlock::default());
                }
            }
        }

        Ok(outcome)
    }
}
