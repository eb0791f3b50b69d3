use std::path::Path;

use anyhow::Result;

/// Axis-aligned box in top-down page coordinates; `y0` is the top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub pages: Vec<ParsedPage>,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    pub blocks: Vec<LayoutBlock>,
}

#[derive(Debug, Clone)]
pub enum LayoutBlock {
    Text { lines: Vec<Line> },
    Image,
}

#[derive(Debug, Clone, Default)]
pub struct Line {
    pub spans: Vec<Span>,
}

/// One styled run of text as the parser reports it.
#[derive(Debug, Clone)]
pub struct Span {
    pub text: String,
    pub size: f64,
    pub font: String,
    pub bbox: BoundingBox,
}

/// Where documents come from. Opening must release the underlying handle
/// before returning, on success and on failure.
pub trait DocumentSource {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn open(&self, path: &Path) -> Result<ParsedDocument>;
}

// ── Char grouping ──

/// A single glyph in top-down coordinates, as read from the PDF text layer.
#[derive(Debug, Clone)]
pub struct PositionedChar {
    pub ch: char,
    pub bbox: BoundingBox,
    pub font_size: f64,
    pub font_name: String,
}

/// Group a page's characters (in content order) into layout blocks of lines of spans.
///
/// Spans break on font name/size changes, lines on newlines or vertical jumps
/// larger than half the font size, blocks on gaps larger than one line height.
pub fn group_chars(chars: &[PositionedChar]) -> Vec<LayoutBlock> {
    let mut blocks: Vec<Vec<Line>> = Vec::new();
    let mut lines: Vec<Line> = Vec::new();
    let mut line = Line::default();
    let mut span: Option<Span> = None;
    let mut prev: Option<&PositionedChar> = None;

    for c in chars {
        if c.ch == '\n' || c.ch == '\r' {
            flush_span(&mut span, &mut line);
            flush_line(&mut line, &mut lines);
            continue;
        }

        if let Some(p) = prev {
            let jump = (c.bbox.y1 - p.bbox.y1).abs();
            if jump > p.font_size.max(c.font_size) * 0.5 {
                flush_span(&mut span, &mut line);
                flush_line(&mut line, &mut lines);
            }
        }

        // Paragraph gap: compare against the last finished line.
        if line.spans.is_empty() && span.is_none() {
            if let Some(last) = lines.last().and_then(line_bbox) {
                let gap = c.bbox.y0 - last.y1;
                if gap > (last.y1 - last.y0).max(c.font_size) {
                    blocks.push(std::mem::take(&mut lines));
                }
            }
        }

        let same_style = span
            .as_ref()
            .is_some_and(|s| s.font == c.font_name && (s.size - c.font_size).abs() < 0.01);
        if !same_style {
            flush_span(&mut span, &mut line);
        }

        match span.as_mut() {
            Some(s) => {
                s.text.push(c.ch);
                s.bbox = s.bbox.union(&c.bbox);
            }
            None => {
                span = Some(Span {
                    text: c.ch.to_string(),
                    size: c.font_size,
                    font: c.font_name.clone(),
                    bbox: c.bbox,
                });
            }
        }
        prev = Some(c);
    }

    flush_span(&mut span, &mut line);
    flush_line(&mut line, &mut lines);
    if !lines.is_empty() {
        blocks.push(lines);
    }

    blocks
        .into_iter()
        .map(|lines| LayoutBlock::Text { lines })
        .collect()
}

fn flush_span(span: &mut Option<Span>, line: &mut Line) {
    if let Some(s) = span.take() {
        line.spans.push(s);
    }
}

fn flush_line(line: &mut Line, lines: &mut Vec<Line>) {
    if !line.spans.is_empty() {
        lines.push(std::mem::take(line));
    }
}

fn line_bbox(line: &Line) -> Option<BoundingBox> {
    let mut spans = line.spans.iter();
    let first = spans.next()?.bbox;
    Some(spans.fold(first, |acc, s| acc.union(&s.bbox)))
}

// ── pdfium ──

#[cfg(feature = "pdf")]
pub use self::pdfium::PdfiumSource;

#[cfg(feature = "pdf")]
mod pdfium {
    use std::path::{Path, PathBuf};

    use anyhow::{anyhow, Context, Result};
    use pdfium_render::prelude::*;
    use tracing::debug;

    use super::{
        group_chars, BoundingBox, DocumentSource, LayoutBlock, ParsedDocument, ParsedPage,
        PositionedChar,
    };

    /// Bound pdfium library, created once per run.
    pub struct PdfiumSource {
        pdfium: Pdfium,
    }

    impl PdfiumSource {
        /// Bind pdfium from `dir` if given, else `./`, else the system library paths.
        pub fn bind(dir: Option<&Path>) -> Result<Self> {
            let local = dir
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("./"));
            let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                &local,
            ))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| anyhow!("failed to load pdfium library: {e:?}"))?;
            Ok(Self {
                pdfium: Pdfium::new(bindings),
            })
        }
    }

    impl DocumentSource for PdfiumSource {
        fn open(&self, path: &Path) -> Result<ParsedDocument> {
            let doc = self
                .pdfium
                .load_pdf_from_file(path, None)
                .with_context(|| format!("failed to open {}", path.display()))?;

            let mut pages = Vec::new();
            for (idx, page) in doc.pages().iter().enumerate() {
                pages.push(
                    read_page(&page)
                        .with_context(|| format!("failed to read page {}", idx + 1))?,
                );
            }
            debug!(path = %path.display(), pages = pages.len(), "parsed pdf");
            // `doc` drops here, closing the file on both paths.
            Ok(ParsedDocument { pages })
        }
    }

    #[allow(deprecated)] // PdfRect field access deprecated in 0.8.28
    fn read_page(page: &PdfPage) -> Result<ParsedPage> {
        let height = page.height().value as f64;
        let text = page.text().context("failed to extract text layer")?;

        let mut chars = Vec::new();
        for ch in text.chars().iter() {
            let Some(unicode) = ch.unicode_char() else {
                continue;
            };
            let Ok(rect) = ch.tight_bounds() else {
                continue;
            };
            chars.push(PositionedChar {
                ch: unicode,
                bbox: BoundingBox {
                    x0: rect.left.value as f64,
                    y0: height - rect.top.value as f64,
                    x1: rect.right.value as f64,
                    y1: height - rect.bottom.value as f64,
                },
                font_size: ch.scaled_font_size().value as f64,
                font_name: ch.font_name(),
            });
        }

        let mut blocks = group_chars(&chars);
        let images = page
            .objects()
            .iter()
            .filter(|o| o.object_type() == PdfPageObjectType::Image)
            .count();
        blocks.extend(std::iter::repeat_with(|| LayoutBlock::Image).take(images));

        Ok(ParsedPage { blocks })
    }
}

/// Stand-in used when the crate is built without pdfium.
#[cfg(not(feature = "pdf"))]
pub struct PdfiumSource;

#[cfg(not(feature = "pdf"))]
impl PdfiumSource {
    pub fn bind(_dir: Option<&Path>) -> Result<Self> {
        Ok(Self)
    }
}

#[cfg(not(feature = "pdf"))]
impl DocumentSource for PdfiumSource {
    fn open(&self, path: &Path) -> Result<ParsedDocument> {
        anyhow::bail!(
            "cannot open {}: built without the `pdf` feature",
            path.display()
        )
    }
}

// ── Test doubles ──


// ── Tests ──
