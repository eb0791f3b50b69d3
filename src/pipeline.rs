use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::embedder::Embedder;
use crate::input::{ExtractedSection, Metadata, RunInput, RunOutput, SubsectionAnalysis};
use crate::pdf::DocumentSource;
use crate::ranker::{self, scoring, SelectedSection};

/// Accumulates one entry per successfully processed document. Ranks follow
/// processing order, starting at 1, with no gaps for skipped documents.
struct Ranking {
    next_rank: usize,
    sections: Vec<ExtractedSection>,
    subsections: Vec<SubsectionAnalysis>,
}

impl Ranking {
    fn new() -> Self {
        Self {
            next_rank: 1,
            sections: Vec::new(),
            subsections: Vec::new(),
        }
    }

    fn push(&mut self, s: SelectedSection) {
        self.sections.push(ExtractedSection {
            document: s.document.clone(),
            section_title: s.title,
            importance_rank: self.next_rank,
            page_number: s.page_number,
        });
        self.subsections.push(SubsectionAnalysis {
            document: s.document,
            refined_text: s.refined_text,
            page_number: s.page_number,
        });
        self.next_rank += 1;
    }
}

/// Rank every document in input order. Missing, empty or unreadable documents are
/// skipped with a warning; an embedding failure aborts the run.
pub fn run(
    input: &RunInput,
    pdf_dir: &Path,
    source: &dyn DocumentSource,
    embedder: &dyn Embedder,
) -> Result<RunOutput> {
    let persona = &input.persona.role;
    let task = &input.job_to_be_done.task;
    let query = scoring::build_query(persona, task);
    let query_embedding = embedder
        .encode(&query)
        .context("failed to embed persona/task query")?;

    let pb = ProgressBar::new(input.documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut ranking = Ranking::new();
    for doc in &input.documents {
        pb.set_message(doc.title.clone().unwrap_or_else(|| doc.filename.clone()));
        let path = pdf_dir.join(&doc.filename);

        if !source.exists(&path) {
            warn!(document = %doc.filename, "missing file, skipping");
            pb.inc(1);
            continue;
        }

        match ranker::process_document(source, embedder, &path, &doc.filename, &query_embedding) {
            Ok(section) => {
                info!(document = %doc.filename, page = section.page_number, title = %section.title, "ranked");
                ranking.push(section);
            }
            Err(e) if e.is_fatal() => {
                pb.abandon();
                return Err(anyhow::Error::new(e).context(format!("aborting run at {}", doc.filename)));
            }
            Err(e) => warn!(document = %doc.filename, "{e}, skipping"),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(RunOutput {
        metadata: Metadata {
            input_documents: input.filenames(),
            persona: persona.clone(),
            job_to_be_done: task.clone(),
            processing_timestamp: crate::input::timestamp_now(),
        },
        extracted_sections: ranking.sections,
        subsection_analysis: ranking.subsections,
    })
}

// ── Tests ──
