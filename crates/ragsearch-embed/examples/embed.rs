use ragsearch_core::config::Config;
use ragsearch_embed::get_default_embedder;

// Embed two strings with the configured backend and print shapes.
// Usage:
//   cargo run -p ragsearch-embed --example embed
//   cargo run -p ragsearch-embed --features bge --example embed   (with APP_EMBEDDING__BACKEND=bge)

fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let embedder = get_default_embedder(&settings.embedding)?;
    let texts = vec!["hello world".to_string(), "rust embeddings".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("B={} dim={}", embs.len(), embedder.dim());
    Ok(())
}
