use crate::chunking::{build_chunks, ChunkingConfig};
use crate::embeddings::Embedder;
use crate::error::IngestError;
use crate::extractor::extract_bytes;
use crate::models::{DocumentReport, FolderReport, SkippedFile};
use crate::traits::GraphStore;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "txt"];

/// Extract → chunk → embed → upsert, one document at a time. The same
/// embedder instance must back both ingestion and querying.
pub struct IngestionPipeline<E, S> {
    embedder: E,
    store: S,
    config: ChunkingConfig,
}

impl<E, S> IngestionPipeline<E, S>
where
    E: Embedder,
    S: GraphStore,
{
    pub fn new(embedder: E, store: S, config: ChunkingConfig) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    /// No transactional boundary spans the document: a failure midway leaves
    /// the chunks stored so far in place. Re-running the ingestion upserts
    /// onto the same chunk keys, so a retry converges instead of duplicating.
    pub async fn ingest_bytes(
        &self,
        document_name: &str,
        bytes: &[u8],
    ) -> Result<DocumentReport, IngestError> {
        let text = extract_bytes(document_name, bytes)?;
        let chunks = build_chunks(document_name, &text, self.config)?;

        let mut embeddings = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            embeddings.push(self.embedder.embed(&chunk.text).await?);
        }

        self.store.upsert_chunks(&chunks, &embeddings).await?;
        self.store.link_related(document_name).await?;

        info!(
            document = document_name,
            chunk_count = chunks.len(),
            "document ingested"
        );

        Ok(DocumentReport {
            document_name: document_name.to_string(),
            chunk_count: chunks.len(),
        })
    }

    pub async fn ingest_file(&self, path: &Path) -> Result<DocumentReport, IngestError> {
        let document_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
            })?;

        let bytes = std::fs::read(path)?;
        self.ingest_bytes(document_name, &bytes).await
    }

    /// Best-effort recursive ingestion: an unreadable file is recorded and
    /// skipped, never allowed to fail the rest of the folder.
    pub async fn ingest_folder(&self, folder: &Path) -> Result<FolderReport, IngestError> {
        let files = discover_document_files(folder);

        if files.is_empty() {
            return Err(IngestError::InvalidArgument(format!(
                "no supported documents found in {}",
                folder.display()
            )));
        }

        let mut documents = Vec::new();
        let mut skipped_files = Vec::new();

        for path in files {
            match self.ingest_file(&path).await {
                Ok(report) => documents.push(report),
                Err(error) => skipped_files.push(SkippedFile {
                    path,
                    reason: error.to_string(),
                }),
            }
        }

        Ok(FolderReport {
            documents,
            skipped_files,
        })
    }
}

/// Recursively lists ingestable files (pdf, docx, txt), sorted for
/// deterministic ingestion order.
pub fn discover_document_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let supported = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });

        if supported {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}
