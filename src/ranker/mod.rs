pub mod blocks;
pub mod scoring;
pub mod sections;

use std::path::Path;

use tracing::debug;

use crate::embedder::Embedder;
use crate::pdf::DocumentSource;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("no extractable text")]
    Empty,
    #[error("unreadable document: {0:#}")]
    Unreadable(anyhow::Error),
    #[error("embedding backend failed: {0:#}")]
    Embedding(anyhow::Error),
}

impl DocumentError {
    /// Only an embedding failure stops the run; everything else skips the document.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DocumentError::Embedding(_))
    }
}

/// The single best block of one document, with its cleaned context.
#[derive(Debug, Clone)]
pub struct SelectedSection {
    pub document: String,
    pub title: String,
    pub page_number: usize,
    pub refined_text: String,
}

/// Five-stage pipeline: parse → blocks → structural + semantic scores → top block → refined text.
pub fn process_document(
    source: &dyn DocumentSource,
    embedder: &dyn Embedder,
    path: &Path,
    name: &str,
    query_embedding: &[f32],
) -> Result<SelectedSection, DocumentError> {
    let parsed = source.open(path).map_err(DocumentError::Unreadable)?;
    let mut extraction = blocks::extract_blocks(&parsed);
    drop(parsed);

    let (min_size, max_size) = extraction.size_range().ok_or(DocumentError::Empty)?;
    scoring::score_structure(&mut extraction.blocks, min_size, max_size);
    scoring::score_semantics(&mut extraction.blocks, query_embedding, embedder)
        .map_err(DocumentError::Embedding)?;

    let all = &extraction.blocks;

    let top = sections::select_top(all).ok_or(DocumentError::Empty)?;
    debug!(
        document = name,
        blocks = all.len(),
        page = top.page_number,
        score = top.total_score,
        "selected section"
    );

    let refined = sections::refine_context(top, all);
    Ok(SelectedSection {
        document: name.to_string(),
        title: top.text.clone(),
        page_number: top.page_number,
        refined_text: sections::clean_refined_text(&refined),
    })
}

// ── Tests ──
