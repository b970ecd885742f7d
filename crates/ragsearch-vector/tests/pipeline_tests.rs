use std::fs;

use ragsearch_core::traits::Embedder;
use ragsearch_core::types::{Chunk, Metric};
use ragsearch_core::Error;
use ragsearch_embed::HashEmbedder;
use ragsearch_vector::{IndexBuilder, IndexPair};
use tempfile::TempDir;

fn chunks() -> Vec<Chunk> {
    let texts = [
        "solar panels convert sunlight into electricity",
        "rainwater harvesting barrels for the garden",
        "wood stove maintenance before winter",
        "battery bank sizing for off grid cabins",
        "composting kitchen scraps into soil",
        "wireless sensor network for greenhouse humidity",
    ];
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| Chunk {
            chunk_id: Chunk::make_id(&format!("doc_{}", i / 2), i % 2),
            parent_id: format!("doc_{}", i / 2),
            title: format!("title {}", i / 2),
            chunk_index: i % 2,
            text: t.to_string(),
        })
        .collect()
}

#[test]
fn build_save_load_round_trip_preserves_answers() -> anyhow::Result<()> {
    let embedder = HashEmbedder::new(64)?;
    let builder = IndexBuilder::new(&embedder, 4)?;
    let tmp = TempDir::new()?;
    let built = builder.build_and_save(&chunks(), &Metric::ALL, tmp.path())?;
    assert_eq!(built.len(), 2);

    for pair in &built {
        assert!(IndexPair::index_path(tmp.path(), pair.metric()).exists());
        assert!(IndexPair::metadata_path(tmp.path(), pair.metric()).exists());
        let loaded = IndexPair::load(tmp.path(), pair.metric())?;
        assert_eq!(loaded.build_id(), pair.build_id());
        assert_eq!(loaded.len(), 6);

        let q = embedder.embed("battery bank sizing for off grid cabins")?;
        let hits = loaded.query(&q, 3)?;
        assert_eq!(hits[0].chunk_id, "doc_1_chunk_1");
        assert_eq!(hits[0].parent_id, "doc_1");
        assert_eq!(hits, pair.query(&q, 3)?);
    }
    Ok(())
}

#[test]
fn every_chunk_is_its_own_best_match_after_reload() -> anyhow::Result<()> {
    let embedder = HashEmbedder::new(64)?;
    let chunks = chunks();
    let tmp = TempDir::new()?;
    IndexBuilder::new(&embedder, 5)?.build_and_save(&chunks, &Metric::ALL, tmp.path())?;
    for metric in Metric::ALL {
        let pair = IndexPair::load(tmp.path(), metric)?;
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(pair.metadata().get(i)?, &chunk.identity());
            let hits = pair.query(&embedder.embed(&chunk.text)?, 1)?;
            assert_eq!(hits[0].chunk_id, chunk.chunk_id, "{metric}");
            let perfect = match metric { Metric::L2 => 0.0, Metric::Cosine => 1.0 };
            assert!((hits[0].score - perfect).abs() < 1e-5, "{metric}: {}", hits[0].score);
        }
    }
    Ok(())
}

#[test]
fn batch_size_does_not_change_the_build() -> anyhow::Result<()> {
    let embedder = HashEmbedder::new(32)?;
    let a = IndexBuilder::new(&embedder, 1)?.build(&chunks(), Metric::Cosine)?;
    let b = IndexBuilder::new(&embedder, 32)?.build(&chunks(), Metric::Cosine)?;
    assert_eq!(a.build_id(), b.build_id());
    Ok(())
}

#[test]
fn missing_pair_is_not_built() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    assert!(matches!(IndexPair::load(tmp.path(), Metric::Cosine), Err(Error::IndexNotBuilt(Metric::Cosine))));
    Ok(())
}

#[test]
fn mixed_artifacts_are_rejected() -> anyhow::Result<()> {
    let embedder = HashEmbedder::new(32)?;
    let first = TempDir::new()?;
    let second = TempDir::new()?;
    let builder = IndexBuilder::new(&embedder, 8)?;
    builder.build_and_save(&chunks(), &[Metric::L2], first.path())?;
    builder.build_and_save(&chunks()[..4], &[Metric::L2], second.path())?;

    fs::copy(IndexPair::metadata_path(second.path(), Metric::L2), IndexPair::metadata_path(first.path(), Metric::L2))?;
    assert!(matches!(IndexPair::load(first.path(), Metric::L2), Err(Error::ArtifactMismatch(_))));

    fs::remove_file(IndexPair::metadata_path(second.path(), Metric::L2))?;
    assert!(matches!(IndexPair::load(second.path(), Metric::L2), Err(Error::ArtifactMismatch(_))));
    Ok(())
}

#[test]
fn empty_input_and_zero_batch_are_rejected() -> anyhow::Result<()> {
    let embedder = HashEmbedder::new(16)?;
    assert!(matches!(IndexBuilder::new(&embedder, 0), Err(Error::Configuration(_))));
    let builder = IndexBuilder::new(&embedder, 4)?;
    assert!(matches!(builder.build(&[], Metric::L2), Err(Error::EmptyIndex)));
    Ok(())
}
