use ragsearch_core::config::{EmbeddingBackend, EmbeddingConfig};
use ragsearch_core::traits::Embedder;
use ragsearch_embed::{get_default_embedder, HashEmbedder};

fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = HashEmbedder::new(64).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 64);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_words_score_closer_than_disjoint_ones() {
    let embedder = HashEmbedder::new(256).unwrap();
    let q = embedder.embed("solar battery storage").unwrap();
    let near = embedder.embed("battery storage for solar panels").unwrap();
    let far = embedder.embed("medieval castle architecture").unwrap();
    assert!(dot(&q, &near) > dot(&q, &far));
}

#[test]
fn zero_dimension_is_rejected() {
    assert!(HashEmbedder::new(0).is_err());
}

#[test]
fn default_embedder_follows_config() {
    let config = EmbeddingConfig { backend: EmbeddingBackend::Hash, dimension: 32, batch_size: 8, model_dir: None };
    let embedder = get_default_embedder(&config).expect("embedder");
    assert_eq!(embedder.dim(), 32);
    assert_eq!(embedder.embed("anything").unwrap().len(), 32);
}
