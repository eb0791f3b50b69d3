use anyhow::{ensure, Result};

use super::blocks::TextBlock;
use crate::embedder::{cosine_similarity, Embedder};

/// Guards the size ratio when every span in a document shares one font size.
pub const SIZE_EPSILON: f64 = 1e-5;
pub const BOLD_MARKER: &str = "Bold";
pub const BOLD_BONUS: f64 = 0.5;
pub const UPPERCASE_BONUS: f64 = 0.3;
/// Device units from the top edge; assumes PDF point scale.
pub const TOP_OF_PAGE_Y: f64 = 100.0;
pub const TOP_OF_PAGE_BONUS: f64 = 0.3;

/// Layout/typography importance of one block within its document's font-size range.
pub fn structural_score(block: &TextBlock, min_size: f64, max_size: f64) -> f64 {
    let mut score = (block.font_size - min_size) / (max_size - min_size + SIZE_EPSILON);
    if block.font_name.contains(BOLD_MARKER) {
        score += BOLD_BONUS;
    }
    if is_upper(&block.text) {
        score += UPPERCASE_BONUS;
    }
    if block.bbox.y0 < TOP_OF_PAGE_Y {
        score += TOP_OF_PAGE_BONUS;
    }
    score
}

/// At least one cased character and no lower- or titlecase ones. "2024" and "---"
/// are not upper-case.
pub fn is_upper(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() || is_titlecase(c) {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Neither upper nor lower, yet changed by upper-casing: the Lt letters like 'ǅ'.
fn is_titlecase(c: char) -> bool {
    !c.is_lowercase() && !c.is_uppercase() && !c.to_uppercase().eq(std::iter::once(c))
}

pub fn score_structure(blocks: &mut [TextBlock], min_size: f64, max_size: f64) {
    for b in blocks.iter_mut() {
        b.structural_score = structural_score(b, min_size, max_size);
    }
}

/// Persona and task joined by one space.
pub fn build_query(persona: &str, task: &str) -> String {
    format!("{persona} {task}")
}

/// Embed all block texts in one batch and store each block's similarity to the query.
pub fn score_semantics(
    blocks: &mut [TextBlock],
    query_embedding: &[f32],
    embedder: &dyn Embedder,
) -> Result<()> {
    let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
    let embeddings = embedder.encode_batch(&texts)?;
    ensure!(
        embeddings.len() == blocks.len(),
        "embedder returned {} vectors for {} blocks",
        embeddings.len(),
        blocks.len()
    );

    for (block, embedding) in blocks.iter_mut().zip(&embeddings) {
        ensure!(
            embedding.len() == query_embedding.len(),
            "embedding dimension {} does not match query dimension {}",
            embedding.len(),
            query_embedding.len()
        );
        block.semantic_score = cosine_similarity(query_embedding, embedding);
        block.total_score = block.structural_score + block.semantic_score;
    }
    Ok(())
}

// ── Tests ──
