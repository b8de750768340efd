use async_trait::async_trait;
use chrono::Utc;
use clap::{Parser, Subcommand};
use doc_context_core::{
    ChunkingConfig, CorpusRetriever, Embedder, HashedNgramEmbedder, IngestionPipeline, Neo4jStore,
    OpenAiEmbedder, RetrievalError, DEFAULT_CHUNK_SIZE, DEFAULT_EMBEDDING_DIMENSIONS,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_TOP_K,
};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "doc-context", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Neo4j HTTP transaction URL
    #[arg(long, default_value = "http://localhost:7474")]
    neo4j_url: String,

    /// Neo4j database name
    #[arg(long, default_value = "neo4j")]
    neo4j_db: String,

    /// Neo4j username
    #[arg(long, default_value = "neo4j")]
    neo4j_user: String,

    /// Neo4j password
    #[arg(long, default_value = "password")]
    neo4j_password: String,

    /// Embeddings endpoint (OpenAI-compatible)
    #[arg(long, default_value = "https://api.openai.com/v1/embeddings")]
    embedding_url: String,

    /// Embedding model name
    #[arg(long, default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Embedding vector dimension; must match the model and the stored corpus
    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    embedding_dimensions: usize,

    /// API key for the embeddings endpoint
    #[arg(long, env = "OPENAI_API_KEY", default_value = "")]
    api_key: String,

    /// Use the offline deterministic hashing embedder instead of the remote model
    #[arg(long, default_value_t = false)]
    hash_embedder: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Extract, chunk, embed, and store a document or a folder of documents.
    Ingest {
        /// Single document to ingest (pdf, docx, or txt).
        #[arg(long, conflicts_with = "folder")]
        file: Option<String>,
        /// Folder to ingest recursively.
        #[arg(long)]
        folder: Option<String>,
        /// Chunk width in characters.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
    /// Sweep the corpus and print grounded context with citations.
    Query {
        /// Question to retrieve context for.
        #[arg(long)]
        query: String,
        /// Nearest chunks to return per document.
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        /// Corpus document name; repeat for multiple documents.
        #[arg(long = "document")]
        documents: Vec<String>,
        /// File listing corpus document names, one per line.
        #[arg(long)]
        corpus_file: Option<String>,
    },
}

enum CliEmbedder {
    Remote(OpenAiEmbedder),
    Hashed(HashedNgramEmbedder),
}

#[async_trait]
impl Embedder for CliEmbedder {
    fn dimensions(&self) -> usize {
        match self {
            CliEmbedder::Remote(embedder) => embedder.dimensions(),
            CliEmbedder::Hashed(embedder) => embedder.dimensions(),
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        match self {
            CliEmbedder::Remote(embedder) => embedder.embed(text).await,
            CliEmbedder::Hashed(embedder) => embedder.embed(text).await,
        }
    }
}

fn build_embedder(cli: &Cli) -> CliEmbedder {
    if cli.hash_embedder {
        CliEmbedder::Hashed(HashedNgramEmbedder::default())
    } else {
        CliEmbedder::Remote(OpenAiEmbedder::new(
            &cli.embedding_url,
            &cli.api_key,
            &cli.embedding_model,
            cli.embedding_dimensions,
        ))
    }
}

async fn load_corpus(
    documents: Vec<String>,
    corpus_file: Option<String>,
) -> anyhow::Result<Vec<String>> {
    let mut corpus = documents;

    if let Some(path) = corpus_file {
        let listed = tokio::fs::read_to_string(&path).await?;
        corpus.extend(
            listed
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }

    corpus.dedup();
    if corpus.is_empty() {
        anyhow::bail!("corpus is empty: pass --document or --corpus-file");
    }
    Ok(corpus)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let store = Neo4jStore::new(
        &cli.neo4j_url,
        &cli.neo4j_db,
        &cli.neo4j_user,
        &cli.neo4j_password,
    )
    .map_err(|error| anyhow::anyhow!(error.to_string()))?;
    let embedder = build_embedder(&cli);

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "doc-context boot"
    );

    match cli.command {
        Command::Ingest {
            file,
            folder,
            chunk_size,
        } => {
            let config = ChunkingConfig::new(chunk_size)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            let pipeline = IngestionPipeline::new(embedder, store, config);

            if let Some(file) = file {
                let report = pipeline
                    .ingest_file(Path::new(&file))
                    .await
                    .map_err(|error| anyhow::anyhow!(error.to_string()))?;
                println!(
                    "{}: {} chunks ingested at {}",
                    report.document_name,
                    report.chunk_count,
                    Utc::now().to_rfc3339()
                );
            } else if let Some(folder) = folder {
                let report = pipeline
                    .ingest_folder(Path::new(&folder))
                    .await
                    .map_err(|error| anyhow::anyhow!(error.to_string()))?;

                for skipped in &report.skipped_files {
                    warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped file");
                }
                for document in &report.documents {
                    println!(
                        "{}: {} chunks ingested",
                        document.document_name, document.chunk_count
                    );
                }
                println!(
                    "{} documents ingested, {} skipped",
                    report.documents.len(),
                    report.skipped_files.len()
                );
            } else {
                anyhow::bail!("pass --file or --folder");
            }
        }
        Command::Query {
            query,
            top_k,
            documents,
            corpus_file,
        } => {
            let corpus = load_corpus(documents, corpus_file).await?;
            let sweep = CorpusRetriever::new(embedder, store, corpus);

            let outcome = sweep
                .get_context(&query, top_k)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            for skipped in &outcome.skipped {
                warn!(document = %skipped.document_name, reason = %skipped.reason, "document skipped");
            }

            if !outcome.has_context() {
                println!("no relevant information found in the corpus");
                return Ok(());
            }

            for (document_name, block) in &outcome.blocks {
                println!("document: {document_name}");

                if block.is_empty() {
                    println!("  (no relevant chunks)");
                    continue;
                }

                for citation in &block.citations {
                    println!(
                        "  cite: {} page={} distance={:.4}",
                        citation.document_name, citation.page_number, citation.distance
                    );
                }
                println!("  context:\n{}", block.context);
            }
        }
    }

    Ok(())
}
