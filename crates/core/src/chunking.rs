use crate::error::IngestError;
use crate::models::ChunkRecord;
use sha2::{Digest, Sha256};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize) -> Result<Self, IngestError> {
        if chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { chunk_size })
    }
}

/// Fixed-width character split with no overlap. Lazy and restartable: the
/// same text always yields the same segmentation, and concatenating every
/// segment reconstructs the input exactly.
pub fn chunk_text(text: &str, chunk_size: usize) -> FixedChunks<'_> {
    FixedChunks {
        rest: text,
        chunk_size,
    }
}

pub struct FixedChunks<'a> {
    rest: &'a str,
    chunk_size: usize,
}

impl<'a> Iterator for FixedChunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() || self.chunk_size == 0 {
            return None;
        }

        let split_at = self
            .rest
            .char_indices()
            .nth(self.chunk_size)
            .map(|(byte_index, _)| byte_index)
            .unwrap_or(self.rest.len());

        let (segment, rest) = self.rest.split_at(split_at);
        self.rest = rest;
        Some(segment)
    }
}

/// Splits extracted text and assigns 1-based sequence numbers. The chunk key
/// is derived from `(document_name, sequence_number)` only, so re-ingesting
/// the same document upserts onto the same graph nodes.
pub fn build_chunks(
    document_name: &str,
    text: &str,
    config: ChunkingConfig,
) -> Result<Vec<ChunkRecord>, IngestError> {
    if config.chunk_size == 0 {
        return Err(IngestError::InvalidChunkConfig(
            "chunk_size must be greater than zero".to_string(),
        ));
    }

    Ok(chunk_text(text, config.chunk_size)
        .enumerate()
        .map(|(index, segment)| {
            let sequence_number = (index + 1) as u32;
            ChunkRecord {
                chunk_key: make_chunk_key(document_name, sequence_number),
                document_name: document_name.to_string(),
                sequence_number,
                text: segment.to_string(),
            }
        })
        .collect())
}

pub fn make_chunk_key(document_name: &str, sequence_number: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_name.as_bytes());
    hasher.update(sequence_number.to_le_bytes());
    format!("{:x}", hasher.finalize())
}
