use ragsearch_core::traits::TextIndexer;
use ragsearch_core::types::SyncEvent;
use ragsearch_core::Error;
use ragsearch_text::TantivyTextIndex;

fn add(id: &str, doc: &str, text: &str) -> SyncEvent {
    SyncEvent::Add { chunk_id: id.into(), doc_id: doc.into(), text: text.into() }
}

fn remove(id: &str, doc: &str, text: &str) -> SyncEvent {
    SyncEvent::Remove { chunk_id: id.into(), doc_id: doc.into(), text: text.into() }
}

fn ids(index: &TantivyTextIndex, q: &str) -> Vec<String> {
    let mut ids: Vec<String> = index.search(q, 10).unwrap().into_iter().map(|h| h.chunk_id).collect();
    ids.sort();
    ids
}

#[test]
fn added_chunks_are_searchable_with_snippets() -> anyhow::Result<()> {
    let index = TantivyTextIndex::in_memory()?;
    index.apply(&[
        add("doc_1_chunk_0", "doc_1", "the wireless sensor reports humidity"),
        add("doc_2_chunk_0", "doc_2", "rain barrels collect water"),
    ])?;
    assert_eq!(index.doc_count()?, 2);
    let hits = index.search("humidity", 5)?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk_id, "doc_1_chunk_0");
    assert_eq!(hits[0].doc_id, "doc_1");
    assert!(hits[0].score > 0.0);
    assert!(hits[0].snippet.contains("<b>humidity</b>"));
    Ok(())
}

#[test]
fn remove_then_add_in_one_batch_replaces_text() -> anyhow::Result<()> {
    let index = TantivyTextIndex::in_memory()?;
    index.apply(&[add("c1", "d1", "wireless sensor")])?;
    index.apply(&[remove("c1", "d1", "wireless sensor"), add("c1", "d1", "battery lifetime")])?;
    assert!(ids(&index, "wireless").is_empty());
    assert_eq!(ids(&index, "battery"), vec!["c1".to_string()]);
    assert_eq!(index.doc_count()?, 1);
    Ok(())
}

#[test]
fn stop_words_do_not_match() -> anyhow::Result<()> {
    let index = TantivyTextIndex::in_memory()?;
    index.apply(&[add("c1", "d1", "the stove and the chimney")])?;
    assert!(ids(&index, "the").is_empty());
    assert_eq!(ids(&index, "Chimney"), vec!["c1".to_string()]);
    Ok(())
}

#[test]
fn reset_replaces_everything() -> anyhow::Result<()> {
    let index = TantivyTextIndex::in_memory()?;
    index.apply(&[add("old", "d0", "obsolete content")])?;
    index.reset(&[
        ("a".into(), "d1".into(), "fresh compost".into()),
        ("b".into(), "d1".into(), "fresh water".into()),
    ])?;
    assert_eq!(index.doc_count()?, 2);
    assert!(ids(&index, "obsolete").is_empty());
    assert_eq!(ids(&index, "fresh"), vec!["a".to_string(), "b".to_string()]);
    Ok(())
}

#[test]
fn blank_query_is_rejected() -> anyhow::Result<()> {
    let index = TantivyTextIndex::in_memory()?;
    assert!(matches!(index.search("   ", 3), Err(Error::InvalidArgument(_))));
    Ok(())
}

#[test]
fn reopened_directory_keeps_committed_documents() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    {
        let index = TantivyTextIndex::recreate(tmp.path())?;
        index.apply(&[add("c1", "d1", "solar charge controller")])?;
    }
    let index = TantivyTextIndex::open_or_create(tmp.path())?;
    assert_eq!(index.doc_count()?, 1);
    assert_eq!(ids(&index, "solar"), vec!["c1".to_string()]);
    Ok(())
}

#[test]
fn analyzer_lowercases_and_drops_stop_words_and_overlong_tokens() {
    use tantivy::tokenizer::TokenStream;

    let mut analyzer = ragsearch_text::tantivy_utils::chunk_text_analyzer();
    let long = "x".repeat(64);
    let text = format!("The Wood-Stove is {long} ready");
    let mut stream = analyzer.token_stream(&text);
    let mut tokens = Vec::new();
    while stream.advance() {
        tokens.push(stream.token().text.clone());
    }
    assert_eq!(tokens, ["wood", "stove", "ready"]);
}
