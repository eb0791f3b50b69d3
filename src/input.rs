use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ── Input descriptor ──

#[derive(Debug, Clone, Deserialize)]
pub struct RunInput {
    pub persona: Persona,
    pub job_to_be_done: JobToBeDone,
    pub documents: Vec<DocumentRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Persona {
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobToBeDone {
    pub task: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRef {
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl RunInput {
    pub fn filenames(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.filename.clone()).collect()
    }
}

pub fn load_input(path: &Path) -> Result<RunInput> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read input descriptor {}", path.display()))?;
    parse_input(&raw).with_context(|| format!("malformed input descriptor {}", path.display()))
}

pub fn parse_input(raw: &str) -> Result<RunInput> {
    Ok(serde_json::from_str(raw)?)
}

// ── Output ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    pub metadata: Metadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub processing_timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub section_title: String,
    pub importance_rank: usize,
    pub page_number: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub refined_text: String,
    pub page_number: usize,
}

/// Local time, microsecond precision, no offset: `2025-07-20T12:34:56.123456`.
pub fn timestamp_now() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Pretty-print (2-space indent) to `path`, creating parent directories.
pub fn write_output(path: &Path, output: &RunOutput) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(output)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_descriptor() {
        let raw = std::fs::read_to_string("tests/fixtures/input.json").unwrap();
        let input = parse_input(&raw).unwrap();
        assert_eq!(input.persona.role, "Travel Planner");
        assert_eq!(input.job_to_be_done.task, "Plan a trip of 4 days for a group of 10 college friends.");
        assert_eq!(
            input.filenames(),
            vec!["South of France - Cities.pdf", "South of France - Cuisine.pdf", "missing.pdf"]
        );
        assert_eq!(input.documents[0].title.as_deref(), Some("South of France - Cities"));
        assert_eq!(input.documents[2].title, None);
    }

    #[test]
    fn missing_role_is_an_error() {
        let raw = r#"{"persona":{},"job_to_be_done":{"task":"t"},"documents":[]}"#;
        assert!(parse_input(raw).is_err());
    }

    #[test]
    fn missing_filename_is_an_error() {
        let raw = r#"{"persona":{"role":"r"},"job_to_be_done":{"task":"t"},"documents":[{"title":"x"}]}"#;
        assert!(parse_input(raw).is_err());
    }

    #[test]
    fn missing_documents_is_an_error() {
        let raw = r#"{"persona":{"role":"r"},"job_to_be_done":{"task":"t"}}"#;
        assert!(parse_input(raw).is_err());
    }

    #[test]
    fn timestamp_shape() {
        let ts = timestamp_now();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
        assert_eq!(ts.len(), "2025-07-20T12:34:56.123456".len());
    }

    #[test]
    fn output_field_names() {
        let out = RunOutput {
            metadata: Metadata {
                input_documents: vec!["a.pdf".into()],
                persona: "p".into(),
                job_to_be_done: "j".into(),
                processing_timestamp: "2025-01-01T00:00:00.000000".into(),
            },
            extracted_sections: vec![ExtractedSection {
                document: "a.pdf".into(),
                section_title: "Intro".into(),
                importance_rank: 1,
                page_number: 2,
            }],
            subsection_analysis: vec![SubsectionAnalysis {
                document: "a.pdf".into(),
                refined_text: "Intro text".into(),
                page_number: 2,
            }],
        };
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["metadata"]["job_to_be_done"], "j");
        assert_eq!(v["extracted_sections"][0]["importance_rank"], 1);
        assert_eq!(v["subsection_analysis"][0]["refined_text"], "Intro text");
    }
}
