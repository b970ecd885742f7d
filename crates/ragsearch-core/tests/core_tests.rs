use std::fs;
use tempfile::TempDir;

use ragsearch_core::config::{ChunkingConfig, Config, EmbeddingBackend};
use ragsearch_core::data_processor::{clean_text, read_jsonl, write_jsonl, DataProcessor};
use ragsearch_core::types::{Chunk, Document, Metric};
use ragsearch_core::Error;

fn processor(window_size: usize, overlap: usize) -> DataProcessor {
    DataProcessor::new(ChunkingConfig { window_size, overlap }).expect("valid chunking")
}

#[test]
fn clean_text_collapses_whitespace() {
    assert_eq!(clean_text("  hello \n\n world\t again  "), "hello world again");
    assert_eq!(clean_text(" \n\t "), "");
}

#[test]
fn prepare_documents_numbers_sorted_files_and_builds_titles() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("b_second.txt"), "beta   text\n\nmore").unwrap();
    fs::write(dir.join("a_first_file.txt"), "alpha text").unwrap();
    fs::write(dir.join("ignored.md"), "not a txt").unwrap();

    let docs = processor(4, 1).prepare_documents(dir).expect("prepare");

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].doc_id, "doc_1");
    assert_eq!(docs[0].title, "a first file");
    assert_eq!(docs[1].doc_id, "doc_2");
    assert_eq!(docs[1].raw_text, "beta text more");
}

#[test]
fn prepare_documents_missing_dir_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = processor(4, 1).prepare_documents(&tmp.path().join("nope")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
}

#[test]
fn chunk_documents_ids_are_contiguous_per_parent() {
    let docs = vec![
        Document { doc_id: "doc_1".into(), title: "One".into(), raw_text: "a b c d e f g".into(), tags: vec![] },
        Document { doc_id: "doc_2".into(), title: "Two".into(), raw_text: "x y".into(), tags: vec![] },
    ];
    let chunks = processor(4, 1).chunk_documents(&docs);

    let ids: Vec<&str> = chunks.iter().map(|c| c.chunk_id.as_str()).collect();
    assert_eq!(ids, ["doc_1_chunk_0", "doc_1_chunk_1", "doc_2_chunk_0"]);
    assert_eq!(chunks[1].chunk_index, 1);
    assert_eq!(chunks[1].parent_id, "doc_1");
    assert_eq!(chunks[1].title, "One");
    assert_eq!(chunks[1].text, "d e f g");
}

#[test]
fn jsonl_uses_dataset_field_names() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("processed/chunks.jsonl");
    let chunk = Chunk { chunk_id: "doc_1_chunk_0".into(), parent_id: "doc_1".into(), title: "T".into(), chunk_index: 0, text: "hello".into() };
    write_jsonl(&path, &[chunk.clone()]).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(raw.lines().next().unwrap()).unwrap();
    assert_eq!(value["id"], "doc_1_chunk_0");
    assert_eq!(value["parent_id"], "doc_1");

    let back: Vec<Chunk> = read_jsonl(&path).unwrap();
    assert_eq!(back, vec![chunk]);
}

#[test]
fn metric_parses_known_names_only() {
    assert_eq!("l2".parse::<Metric>().unwrap(), Metric::L2);
    assert_eq!("Cosine".parse::<Metric>().unwrap(), Metric::Cosine);
    let err = "bogus".parse::<Metric>().unwrap_err();
    assert!(matches!(err, Error::UnknownMetric(ref m) if m == "bogus"), "got {err:?}");
}

#[test]
fn config_file_overrides_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, "[chunking]\nwindow_size = 64\noverlap = 8\n\n[search]\ndefault_metric = \"cosine\"\n").unwrap();

    let settings = Config::from_file(&path).unwrap().settings().unwrap();
    assert_eq!(settings.chunking, ChunkingConfig { window_size: 64, overlap: 8 });
    assert_eq!(settings.search.default_metric, Metric::Cosine);
    assert_eq!(settings.search.default_top_k, 5);
    assert_eq!(settings.embedding.backend, EmbeddingBackend::Hash);
}

#[test]
fn config_file_rejects_overlap_not_below_window() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, "[chunking]\nwindow_size = 10\noverlap = 10\n").unwrap();
    assert!(Config::from_file(&path).is_err());
}

#[test]
fn expand_path_substitutes_environment_variables() {
    use ragsearch_core::config::expand_path;
    use std::path::PathBuf;

    std::env::set_var("RAGSEARCH_TEST_DATA_ROOT", "/srv/ragsearch");
    assert_eq!(expand_path("${RAGSEARCH_TEST_DATA_ROOT}/index"), PathBuf::from("/srv/ragsearch/index"));
    assert_eq!(expand_path("$RAGSEARCH_TEST_NEVER_SET/x"), PathBuf::from("$RAGSEARCH_TEST_NEVER_SET/x"));
    assert_eq!(expand_path("relative/dir"), PathBuf::from("relative/dir"));
}
