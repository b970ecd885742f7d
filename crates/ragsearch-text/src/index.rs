use std::path::Path;
use std::sync::Mutex;

use tantivy::directory::MmapDirectory;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, Term};

use ragsearch_core::traits::TextIndexer;
use ragsearch_core::types::{SyncEvent, TextHit};
use ragsearch_core::{Error, Result};

use crate::tantivy_utils::{build_schema, register_tokenizer, text_err, ChunkFields};

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Full-text index over chunk text, one tantivy document per chunk keyed by `chunk_id`.
///
/// A single writer is held for the lifetime of the index; every batch of
/// events ends in exactly one commit or one rollback.
pub struct TantivyTextIndex {
	pub(crate) index: Index,
	pub(crate) reader: IndexReader,
	writer: Mutex<IndexWriter>,
	pub(crate) fields: ChunkFields,
}

impl TantivyTextIndex {
	/// Open the index in `dir`, creating it if the directory holds none.
	pub fn open_or_create(dir: &Path) -> Result<Self> {
		std::fs::create_dir_all(dir)?;
		let directory = MmapDirectory::open(dir).map_err(text_err)?;
		let index = Index::open_or_create(directory, build_schema()).map_err(text_err)?;
		tracing::debug!(dir = %dir.display(), "opened text index");
		Self::from_index(index)
	}

	/// Wipe `dir` and start an empty index there.
	pub fn recreate(dir: &Path) -> Result<Self> {
		if dir.exists() { std::fs::remove_dir_all(dir)?; }
		std::fs::create_dir_all(dir)?;
		let index = Index::create_in_dir(dir, build_schema()).map_err(text_err)?;
		Self::from_index(index)
	}

	pub fn in_memory() -> Result<Self> {
		Self::from_index(Index::create_in_ram(build_schema()))
	}

	fn from_index(index: Index) -> Result<Self> {
		register_tokenizer(&index);
		let fields = ChunkFields::resolve(&index.schema())?;
		let writer = index.writer_with_num_threads(1, WRITER_HEAP_BYTES).map_err(text_err)?;
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(text_err)?;
		Ok(Self { index, reader, writer: Mutex::new(writer), fields })
	}

	fn stage(&self, writer: &IndexWriter, event: &SyncEvent) -> Result<()> {
		match event {
			SyncEvent::Add { chunk_id, doc_id, text } => {
				writer.add_document(doc!(
					self.fields.chunk_id => chunk_id.as_str(),
					self.fields.doc_id => doc_id.as_str(),
					self.fields.text => text.as_str(),
				)).map_err(text_err)?;
			}
			SyncEvent::Remove { chunk_id, .. } => {
				writer.delete_term(Term::from_field_text(self.fields.chunk_id, chunk_id));
			}
		}
		Ok(())
	}

	/// Commit what has been staged, or roll it back if staging failed.
	fn finish(&self, writer: &mut IndexWriter, staged: Result<()>) -> Result<()> {
		let outcome = staged.and_then(|()| writer.commit().map(|_| ()).map_err(text_err));
		if let Err(e) = outcome {
			if let Err(rollback) = writer.rollback() {
				tracing::error!(error = %rollback, "text index rollback failed");
			}
			return Err(Error::SyncTransaction(e.to_string()));
		}
		self.reader.reload().map_err(text_err)
	}
}

impl TextIndexer for TantivyTextIndex {
	fn apply(&self, events: &[SyncEvent]) -> Result<()> {
		if events.is_empty() { return Ok(()); }
		let mut writer = self.writer.lock().map_err(|_| Error::SyncTransaction("text index writer lock poisoned".into()))?;
		let staged = events.iter().try_for_each(|e| self.stage(&writer, e));
		self.finish(&mut writer, staged)?;
		tracing::debug!(events = events.len(), "text index committed");
		Ok(())
	}

	fn reset(&self, rows: &[(String, String, String)]) -> Result<()> {
		let mut writer = self.writer.lock().map_err(|_| Error::SyncTransaction("text index writer lock poisoned".into()))?;
		let staged = writer.delete_all_documents().map(|_| ()).map_err(text_err).and_then(|()| {
			rows.iter().try_for_each(|(chunk_id, doc_id, text)| {
				self.stage(&writer, &SyncEvent::Add { chunk_id: chunk_id.clone(), doc_id: doc_id.clone(), text: text.clone() })
			})
		});
		self.finish(&mut writer, staged)?;
		tracing::info!(docs = rows.len(), "text index rebuilt");
		Ok(())
	}

	fn search(&self, query: &str, limit: usize) -> Result<Vec<TextHit>> {
		self.search_hits(query, limit)
	}

	fn doc_count(&self) -> Result<u64> {
		Ok(self.reader.searcher().num_docs())
	}
}
