//! Shared fakes for the async seams: an in-memory graph store and a
//! keyword-axis embedder with steerable similarity.

use crate::chunking::make_chunk_key;
use crate::embeddings::Embedder;
use crate::error::RetrievalError;
use crate::models::{ChunkDetails, ChunkRecord};
use crate::traits::GraphStore;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

/// Embeds onto fixed keyword axes so tests can place a query near one
/// document's chunks and far from another's.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubEmbedder {
    pub fail: bool,
}

impl StubEmbedder {
    const AXES: [&'static str; 3] = ["alpha", "beta", "gamma"];

    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; 4];
        for word in text.split_whitespace() {
            for (axis, keyword) in Self::AXES.iter().enumerate() {
                if word.eq_ignore_ascii_case(keyword) {
                    vector[axis] += 1.0;
                }
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn dimensions(&self) -> usize {
        4
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        if self.fail {
            return Err(RetrievalError::EmbeddingService {
                provider: "stub".to_string(),
                details: "quota exhausted".to_string(),
            });
        }
        Ok(Self::vector(text))
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    chunks: Mutex<BTreeMap<String, (ChunkRecord, Vec<f32>)>>,
    dropped: Mutex<HashSet<String>>,
    failing_documents: Mutex<HashSet<String>>,
    linked_documents: Mutex<Vec<String>>,
}

impl InMemoryStore {
    pub fn seed_document(&self, document_name: &str, texts: &[&str]) {
        let mut chunks = self.chunks.lock().unwrap();
        for (index, text) in texts.iter().enumerate() {
            let sequence_number = (index + 1) as u32;
            let record = ChunkRecord {
                chunk_key: make_chunk_key(document_name, sequence_number),
                document_name: document_name.to_string(),
                sequence_number,
                text: text.to_string(),
            };
            chunks.insert(record.chunk_key.clone(), (record, StubEmbedder::vector(text)));
        }
    }

    /// Simulates a chunk deleted between index build and hydration: it still
    /// shows up in `fetch_embeddings` but no longer resolves to details.
    pub fn drop_chunk(&self, chunk_key: &str) {
        self.dropped.lock().unwrap().insert(chunk_key.to_string());
    }

    pub fn fail_document(&self, document_name: &str) {
        self.failing_documents
            .lock()
            .unwrap()
            .insert(document_name.to_string());
    }

    pub fn chunk_count(&self, document_name: &str) -> usize {
        self.chunks
            .lock()
            .unwrap()
            .values()
            .filter(|(record, _)| record.document_name == document_name)
            .count()
    }

    pub fn linked_documents(&self) -> Vec<String> {
        self.linked_documents.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphStore for InMemoryStore {
    async fn upsert_chunks(
        &self,
        chunks: &[ChunkRecord],
        embeddings: &[Vec<f32>],
    ) -> Result<(), RetrievalError> {
        if chunks.len() != embeddings.len() {
            return Err(RetrievalError::Request(format!(
                "embedding count {} doesn't match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }

        let mut stored = self.chunks.lock().unwrap();
        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            stored.insert(chunk.chunk_key.clone(), (chunk.clone(), embedding.clone()));
        }
        Ok(())
    }

    async fn link_related(&self, document_name: &str) -> Result<(), RetrievalError> {
        self.linked_documents
            .lock()
            .unwrap()
            .push(document_name.to_string());
        Ok(())
    }

    async fn fetch_embeddings(
        &self,
        document_name: &str,
    ) -> Result<(Vec<String>, Vec<Vec<f32>>), RetrievalError> {
        if self.failing_documents.lock().unwrap().contains(document_name) {
            return Err(RetrievalError::Request(format!(
                "store unavailable for {document_name}"
            )));
        }

        let stored = self.chunks.lock().unwrap();
        let mut records: Vec<_> = stored
            .values()
            .filter(|(record, _)| record.document_name == document_name)
            .collect();
        records.sort_by_key(|(record, _)| record.sequence_number);

        let keys = records
            .iter()
            .map(|(record, _)| record.chunk_key.clone())
            .collect();
        let embeddings = records
            .iter()
            .map(|(_, embedding)| embedding.clone())
            .collect();
        Ok((keys, embeddings))
    }

    async fn chunk_details(
        &self,
        chunk_key: &str,
    ) -> Result<Option<ChunkDetails>, RetrievalError> {
        if self.dropped.lock().unwrap().contains(chunk_key) {
            return Ok(None);
        }

        Ok(self
            .chunks
            .lock()
            .unwrap()
            .get(chunk_key)
            .map(|(record, _)| ChunkDetails {
                chunk_key: record.chunk_key.clone(),
                document_name: record.document_name.clone(),
                page_number: record.sequence_number,
                text: record.text.clone(),
            }))
    }
}
