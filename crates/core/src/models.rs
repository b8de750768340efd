use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One stored slice of a document's extracted text. `sequence_number` is the
/// 1-based ingestion order and doubles as the cited page number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkRecord {
    pub chunk_key: String,
    pub document_name: String,
    pub sequence_number: u32,
    pub text: String,
}

/// Hydrated view of a chunk fetched back from the graph store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkDetails {
    pub chunk_key: String,
    pub document_name: String,
    pub page_number: u32,
    pub text: String,
}

/// A raw similarity-search hit before hydration. Smaller distance is closer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalHit {
    pub chunk_key: String,
    pub distance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    pub document_name: String,
    pub page_number: u32,
    pub distance: f32,
}

/// Per-document bundle of concatenated relevant text plus citations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextBlock {
    pub context: String,
    pub citations: Vec<Citation>,
    pub hits: Vec<RetrievalHit>,
}

impl ContextBlock {
    pub fn is_empty(&self) -> bool {
        self.context.is_empty() && self.citations.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub document_name: String,
    pub reason: String,
}

/// Result of one corpus sweep. Every configured document has an entry in
/// `blocks`; documents that failed hard are listed in `skipped` as well.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub blocks: BTreeMap<String, ContextBlock>,
    pub skipped: Vec<SkippedDocument>,
}

impl SweepOutcome {
    /// False means the consumer should report "no relevant information found"
    /// instead of passing empty context downstream.
    pub fn has_context(&self) -> bool {
        self.blocks.values().any(|block| !block.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub document_name: String,
    pub chunk_count: usize,
}

pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

pub struct FolderReport {
    pub documents: Vec<DocumentReport>,
    pub skipped_files: Vec<SkippedFile>,
}
