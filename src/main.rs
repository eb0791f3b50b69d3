mod embedder;
mod input;
mod pdf;
mod pipeline;
mod ranker;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::embedder::OpenAiEmbedder;
use crate::pdf::{DocumentSource, PdfiumSource};
use crate::ranker::{blocks, scoring};

#[derive(Parser)]
#[command(name = "persona_ranker", about = "Pick the most relevant PDF section for a persona and task")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank one section per document and write the JSON summary
    Rank {
        /// Input descriptor (persona, job_to_be_done, documents)
        #[arg(short, long, default_value = "input/input.json")]
        input: PathBuf,
        /// Directory the document filenames resolve against (default: the descriptor's directory)
        #[arg(long)]
        pdf_dir: Option<PathBuf>,
        #[arg(short, long, default_value = "output/output.json")]
        output: PathBuf,
        #[command(flatten)]
        embed: EmbedArgs,
        /// Directory holding the pdfium dynamic library
        #[arg(long, env = "PDFIUM_DIR")]
        pdfium_dir: Option<PathBuf>,
    },
    /// Show one PDF's extracted blocks with their structural scores
    Blocks {
        pdf: PathBuf,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        /// Order by structural score instead of extraction order
        #[arg(short, long)]
        sort: bool,
        #[arg(long, env = "PDFIUM_DIR")]
        pdfium_dir: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct EmbedArgs {
    /// Base URL of an OpenAI-compatible embeddings API
    #[arg(long, env = "EMBEDDING_URL", default_value = "http://localhost:8080/v1")]
    embed_url: String,
    #[arg(long, env = "EMBEDDING_MODEL", default_value = "all-MiniLM-L6-v2")]
    embed_model: String,
    #[arg(long, env = "EMBEDDING_API_KEY", hide_env_values = true)]
    embed_api_key: Option<String>,
    /// Max texts per embedding request
    #[arg(long, default_value = "32")]
    embed_batch: usize,
    #[arg(long, default_value = "60")]
    timeout_secs: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Rank {
            input,
            pdf_dir,
            output,
            embed,
            pdfium_dir,
        } => {
            let run_input = input::load_input(&input)?;
            let pdf_dir = pdf_dir.unwrap_or_else(|| {
                input
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default()
            });

            let source = PdfiumSource::bind(pdfium_dir.as_deref())?;
            let embedder = OpenAiEmbedder::new(
                &embed.embed_url,
                &embed.embed_model,
                embed.embed_api_key.as_deref(),
                Duration::from_secs(embed.timeout_secs),
                embed.embed_batch,
            )?;

            println!(
                "Ranking {} documents for \"{}\"...",
                run_input.documents.len(),
                run_input.persona.role
            );
            let out = pipeline::run(&run_input, &pdf_dir, &source, &embedder)?;
            input::write_output(&output, &out)?;
            println!(
                "Ranked {} of {} documents.",
                out.extracted_sections.len(),
                run_input.documents.len()
            );
            println!("Saved: {}", output.display());
            Ok(())
        }
        Commands::Blocks {
            pdf,
            limit,
            sort,
            pdfium_dir,
        } => {
            let source = PdfiumSource::bind(pdfium_dir.as_deref())?;
            let parsed = source
                .open(&pdf)
                .with_context(|| format!("failed to parse {}", pdf.display()))?;
            let mut extraction = blocks::extract_blocks(&parsed);
            let Some((min_size, max_size)) = extraction.size_range() else {
                println!("No extractable text in {}.", pdf.display());
                return Ok(());
            };
            scoring::score_structure(&mut extraction.blocks, min_size, max_size);

            let mut rows: Vec<_> = extraction.blocks.iter().collect();
            if sort {
                rows.sort_by(|a, b| b.structural_score.total_cmp(&a.structural_score));
            }

            println!(
                "{:>4} | {:>4} | {:>5} | {:>4} | {:>6} | {:>6} | {:>5} | {:>5} | {:<48}",
                "#", "Page", "Size", "Bold", "x0", "y0", "Width", "Score", "Text"
            );
            println!("{}", "-".repeat(112));
            for (i, b) in rows.iter().take(limit).enumerate() {
                println!("{}", block_row(i + 1, b));
            }

            println!(
                "\n{} blocks | font sizes {:.1}..{:.1}",
                extraction.blocks.len(),
                min_size,
                max_size
            );
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn block_row(n: usize, b: &blocks::TextBlock) -> String {
    let bold = if b.font_name.contains(scoring::BOLD_MARKER) { "yes" } else { "" };
    format!(
        "{:>4} | {:>4} | {:>5.1} | {:>4} | {:>6.1} | {:>6.1} | {:>5.1} | {:>5.2} | {:<48}",
        n,
        b.page_number,
        b.font_size,
        bold,
        b.bbox.x0,
        b.bbox.y0,
        b.bbox.x1 - b.bbox.x0,
        b.structural_score,
        truncate(&b.text, 48)
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

// ── Tests ──
