use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

use ragsearch_core::{Error, Result};

pub const TOKENIZER: &str = "text_with_stopwords";

/// Field handles resolved once from the schema.
#[derive(Debug, Clone, Copy)]
pub struct ChunkFields {
	pub chunk_id: Field,
	pub doc_id: Field,
	pub text: Field,
}

impl ChunkFields {
	pub fn resolve(schema: &Schema) -> Result<Self> {
		let get = |name: &str| schema.get_field(name).map_err(text_err);
		Ok(Self { chunk_id: get("chunk_id")?, doc_id: get("doc_id")?, text: get("text")? })
	}
}

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_text_field("chunk_id", STRING | STORED);
	schema_builder.add_text_field("doc_id", STRING | STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing).set_stored();
	schema_builder.add_text_field("text", text_options);
	schema_builder.build()
}

/// English function words dropped from chunk text and queries alike.
const STOP_WORDS: &[&str] = &[
	"a", "an", "the", "this", "these", "that", "it", "its", "they", "them", "their", "there", "he",
	"and", "or", "but", "not", "so", "if", "then", "than",
	"as", "at", "by", "for", "from", "in", "of", "on", "to", "with",
	"is", "are", "was", "be", "has", "have", "had", "having", "do", "does", "did",
	"will", "can", "could", "should", "would", "may", "might", "must", "shall",
	"when", "where", "why", "how", "what", "which", "who", "whom", "whose",
];

/// Tokens longer than this are dropped rather than indexed (base64 blobs, hashes).
const MAX_TOKEN_LEN: usize = 40;

/// Analyzer for chunk text: split on non-alphanumerics, drop overlong tokens, lowercase, drop stop words.
pub fn chunk_text_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|w| (*w).to_string())))
		.build()
}

/// Must run on every opened [`Index`] before a writer or query parser touches the `text` field.
pub fn register_tokenizer(index: &Index) {
	index.tokenizers().register(TOKENIZER, chunk_text_analyzer());
}

pub(crate) fn text_err(e: impl std::fmt::Display) -> Error {
	Error::TextIndex(e.to_string())
}
