use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Value};
use tantivy::snippet::SnippetGenerator;
use tantivy::TantivyDocument;

use ragsearch_core::types::TextHit;
use ragsearch_core::{Error, Result};

use crate::index::TantivyTextIndex;
use crate::tantivy_utils::text_err;

impl TantivyTextIndex {
	/// BM25 search over chunk text. Hits come back best first with an HTML snippet.
	pub fn search_hits(&self, query_text: &str, limit: usize) -> Result<Vec<TextHit>> {
		if query_text.trim().is_empty() {
			return Err(Error::InvalidArgument("text query is empty".into()));
		}
		let searcher = self.reader.searcher();
		let query_parser = QueryParser::for_index(&self.index, vec![self.fields.text]);
		let query = query_parser.parse_query(query_text).map_err(|e| Error::InvalidArgument(format!("bad text query '{query_text}': {e}")))?;
		let top_docs = searcher.search(&query, &TopDocs::with_limit(limit.max(1))).map_err(text_err)?;
		let snippet_generator = SnippetGenerator::create(&searcher, &*query, self.fields.text).map_err(text_err)?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr).map_err(text_err)?;
			let field_str = |f: Field| doc.get_first(f).and_then(|v| v.as_str()).unwrap_or_default().to_string();
			hits.push(TextHit {
				chunk_id: field_str(self.fields.chunk_id),
				doc_id: field_str(self.fields.doc_id),
				score,
				snippet: snippet_generator.snippet_from_doc(&doc).to_html(),
			});
		}
		tracing::debug!(query = query_text, hits = hits.len(), "text search");
		Ok(hits)
	}
}
