//! `ragsearch`: prepare, chunk, index and query a folder of text documents.
//!
//! Usage:
//!   ragsearch prepare                       # data/raw/*.txt -> documents.jsonl
//!   ragsearch chunk --window 200 --overlap 50
//!   ragsearch build --metric all
//!   ragsearch search "rain water" --top-k 5 --metric cosine
//!   ragsearch ingest                        # documents + chunks -> SQLite + text index
//!   ragsearch text-search "battery"
//!   ragsearch update-chunk doc_1_chunk_0 "new text"
//!   ragsearch verify --rebuild

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ragsearch_core::config::{expand_path, ChunkingConfig, Config, Settings};
use ragsearch_core::data_processor::{read_jsonl, write_jsonl, DataProcessor};
use ragsearch_core::types::{Chunk, Document, Metric};
use ragsearch_embed::get_default_embedder;
use ragsearch_service::{IndexRegistry, SearchService};
use ragsearch_store::ChunkStore;
use ragsearch_text::TantivyTextIndex;
use ragsearch_vector::IndexBuilder;

#[derive(Parser)]
#[command(name = "ragsearch", version, about = "Local semantic and keyword search over text documents")]
struct Cli {
    /// Config file to use instead of config.toml / config.<env>.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Turn raw .txt files into documents.jsonl
    Prepare {
        #[arg(long)]
        raw_dir: Option<String>,
    },
    /// Split documents into overlapping word windows
    Chunk {
        #[arg(long)]
        window: Option<usize>,
        #[arg(long)]
        overlap: Option<usize>,
    },
    /// Embed chunks and write one index pair per metric
    Build {
        /// l2, cosine or all
        #[arg(long, default_value = "all")]
        metric: String,
    },
    /// Vector search
    Search {
        query: String,
        #[arg(short = 'k', long)]
        top_k: Option<i64>,
        #[arg(short, long)]
        metric: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Load documents and chunks into the canonical store and text index
    Ingest,
    /// Keyword (BM25) search over the canonical chunks
    TextSearch {
        query: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Replace the text of one stored chunk
    UpdateChunk { chunk_id: String, text: String },
    /// Delete one stored chunk
    DeleteChunk { chunk_id: String },
    /// Compare the text index against the chunk table
    Verify {
        /// Rebuild the text index from the chunk table if they disagree
        #[arg(long)]
        rebuild: bool,
    },
    /// Report which index pairs are available
    Health,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "ragsearch=debug" } else { "ragsearch=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    let settings = config.settings()?;

    match cli.command {
        Command::Prepare { raw_dir } => prepare(&settings, raw_dir),
        Command::Chunk { window, overlap } => chunk(&settings, window, overlap),
        Command::Build { metric } => build(&settings, &metric),
        Command::Search { query, top_k, metric, json } => search(&settings, &query, top_k, metric, json),
        Command::Ingest => ingest(&settings),
        Command::TextSearch { query, limit } => text_search(&settings, &query, limit),
        Command::UpdateChunk { chunk_id, text } => {
            open_store(&settings)?.update_chunk_text(&chunk_id, &text)?;
            println!("Updated {chunk_id}");
            Ok(())
        }
        Command::DeleteChunk { chunk_id } => {
            open_store(&settings)?.delete_chunk(&chunk_id)?;
            println!("Deleted {chunk_id}");
            Ok(())
        }
        Command::Verify { rebuild } => verify(&settings, rebuild),
        Command::Health => {
            let service = open_service(&settings)?;
            println!("{}", serde_json::to_string_pretty(&service.health())?);
            Ok(())
        }
    }
}

fn prepare(settings: &Settings, raw_dir: Option<String>) -> Result<()> {
    let raw_dir = expand_path(raw_dir.as_deref().unwrap_or(&settings.data.raw_txt_dir));
    let processor = DataProcessor::new(settings.chunking)?;
    let docs = processor.prepare_documents(&raw_dir).with_context(|| format!("preparing {}", raw_dir.display()))?;
    let out = expand_path(&settings.data.documents_path);
    write_jsonl(&out, &docs)?;
    println!("Prepared {} documents from {} -> {}", docs.len(), raw_dir.display(), out.display());
    Ok(())
}

fn chunk(settings: &Settings, window: Option<usize>, overlap: Option<usize>) -> Result<()> {
    let chunking = ChunkingConfig {
        window_size: window.unwrap_or(settings.chunking.window_size),
        overlap: overlap.unwrap_or(settings.chunking.overlap),
    };
    let processor = DataProcessor::new(chunking)?;
    let docs: Vec<Document> = read_jsonl(&expand_path(&settings.data.documents_path))?;
    let chunks = processor.chunk_documents(&docs);
    let out = expand_path(&settings.data.chunks_path);
    write_jsonl(&out, &chunks)?;
    println!(
        "Chunked {} documents into {} chunks (window {}, overlap {}) -> {}",
        docs.len(), chunks.len(), chunking.window_size, chunking.overlap, out.display()
    );
    Ok(())
}

fn parse_metrics(arg: &str) -> Result<Vec<Metric>> {
    if arg.trim().eq_ignore_ascii_case("all") {
        return Ok(Metric::ALL.to_vec());
    }
    arg.split(',').map(|m| m.parse::<Metric>().map_err(anyhow::Error::from)).collect()
}

fn build(settings: &Settings, metric: &str) -> Result<()> {
    let metrics = parse_metrics(metric)?;
    let chunks: Vec<Chunk> = read_jsonl(&expand_path(&settings.data.chunks_path))?;
    let embedder = get_default_embedder(&settings.embedding)?;
    let index_dir = expand_path(&settings.data.index_dir);
    let pairs = IndexBuilder::new(embedder.as_ref(), settings.embedding.batch_size)?
        .with_progress(true)
        .build_and_save(&chunks, &metrics, &index_dir)?;
    for pair in &pairs {
        println!("Built {} index: {} vectors, dim {}, build {}", pair.metric(), pair.len(), pair.dim(), &pair.build_id()[..12]);
    }
    println!("Index pairs written to {}", index_dir.display());
    Ok(())
}

fn open_service(settings: &Settings) -> Result<SearchService> {
    let embedder = get_default_embedder(&settings.embedding)?;
    Ok(SearchService::new(embedder, IndexRegistry::with_dir(expand_path(&settings.data.index_dir))))
}

fn search(settings: &Settings, query: &str, top_k: Option<i64>, metric: Option<String>, json: bool) -> Result<()> {
    let service = open_service(settings)?;
    let top_k = top_k.unwrap_or(settings.search.default_top_k as i64);
    let metric = metric.unwrap_or_else(|| settings.search.default_metric.to_string());
    let results = service.search_named(query, top_k, &metric)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    println!("Query: {query} ({metric}, top {top_k})");
    for (rank, r) in results.iter().enumerate() {
        println!("{:>2}. {:<24} score={:.4}  [{}] {}", rank + 1, r.chunk_id, r.score, r.parent_id, r.title);
    }
    if results.is_empty() {
        println!("No results");
    }
    Ok(())
}

fn open_store(settings: &Settings) -> Result<ChunkStore> {
    let text = TantivyTextIndex::open_or_create(&expand_path(&settings.data.text_index_dir))?;
    Ok(ChunkStore::open(&expand_path(&settings.data.store_path), Arc::new(text))?)
}

fn ingest(settings: &Settings) -> Result<()> {
    let docs: Vec<Document> = read_jsonl(&expand_path(&settings.data.documents_path))?;
    let chunks: Vec<Chunk> = read_jsonl(&expand_path(&settings.data.chunks_path))?;
    let store = open_store(settings)?;
    let n = store.ingest(&docs, &chunks)?;
    println!("Ingested {} documents / {} chunks into {}", docs.len(), n, settings.data.store_path);
    Ok(())
}

fn text_search(settings: &Settings, query: &str, limit: usize) -> Result<()> {
    let store = open_store(settings)?;
    let hits = store.text_search(query, limit)?;
    println!("Text query: {query} ({} hits)", hits.len());
    for (rank, h) in hits.iter().enumerate() {
        println!("{:>2}. {:<24} bm25={:.3}  [{}]\n    {}", rank + 1, h.chunk_id, h.score, h.doc_id, h.snippet);
    }
    Ok(())
}

fn verify(settings: &Settings, rebuild: bool) -> Result<()> {
    let store = open_store(settings)?;
    let report = store.verify_text_index()?;
    println!("chunks table: {}  text index: {}", report.canonical_chunks, report.indexed_chunks);
    if report.is_consistent() {
        println!("Text index is consistent");
    } else if rebuild {
        let n = store.rebuild_text_index()?;
        println!("Rebuilt text index from {n} chunks");
    } else {
        anyhow::bail!("text index out of step with chunks table; rerun with --rebuild");
    }
    Ok(())
}
