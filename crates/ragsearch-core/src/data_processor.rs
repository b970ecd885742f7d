use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::chunker::Chunker;
use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

/// Trim and collapse every whitespace run (spaces, tabs, line breaks) to one space.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct DataProcessor {
    chunker: Chunker,
}

impl DataProcessor {
    pub fn new(chunking: ChunkingConfig) -> Result<Self> {
        Ok(Self { chunker: Chunker::new(chunking)? })
    }

    /// Turn every `.txt` file under `raw_dir` into a [`Document`].
    ///
    /// Files are visited in sorted path order and numbered `doc_1`, `doc_2`, ...
    pub fn prepare_documents(&self, raw_dir: &Path) -> Result<Vec<Document>> {
        if !raw_dir.is_dir() {
            return Err(Error::NotFound(format!("raw directory {}", raw_dir.display())));
        }
        let files = self.list_txt_files(raw_dir);
        if files.is_empty() {
            tracing::warn!(dir = %raw_dir.display(), "no .txt files found");
            return Ok(vec![]);
        }
        let mut docs = Vec::with_capacity(files.len());
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!(file = %file_path.display(), "reading {}/{}", file_index + 1, files.len());
            let content = self.read_file_content(file_path)?;
            docs.push(Document {
                doc_id: format!("doc_{}", file_index + 1),
                title: self.title_from_path(file_path),
                raw_text: clean_text(&content),
                tags: vec![],
            });
        }
        tracing::info!(documents = docs.len(), dir = %raw_dir.display(), "prepared documents");
        Ok(docs)
    }

    /// Chunk documents in order. Output order is document order, then chunk index.
    pub fn chunk_documents(&self, docs: &[Document]) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = docs.iter().flat_map(|d| self.chunker.chunk_document(d)).collect();
        tracing::info!(documents = docs.len(), chunks = chunks.len(), "chunked documents");
        chunks
    }

    pub fn chunker(&self) -> &Chunker { &self.chunker }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn title_from_path(&self, file_path: &Path) -> String {
        file_path.file_stem().map(|s| s.to_string_lossy().replace('_', " ")).unwrap_or_default()
    }

    fn list_txt_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut txt_files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path(); if path.extension().and_then(|s| s.to_str()) == Some("txt") { txt_files.push(path.to_path_buf()); }
        }
        txt_files.sort(); txt_files
    }
}

/// Write one JSON object per line, creating parent directories as needed.
pub fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() { if !parent.as_os_str().is_empty() { fs::create_dir_all(parent)?; } }
    let mut out = BufWriter::new(fs::File::create(path)?);
    for row in rows {
        serde_json::to_writer(&mut out, row)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Read a JSON Lines file. Blank lines are skipped.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Io(e),
    })?;
    let mut rows = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        rows.push(serde_json::from_str(&line)?);
    }
    Ok(rows)
}
