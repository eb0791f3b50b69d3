use crate::pdf::{BoundingBox, LayoutBlock, ParsedDocument};

/// One non-empty styled span, flattened out of the page/block/line hierarchy.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub text: String,
    pub font_size: f64,
    pub font_name: String,
    pub bbox: BoundingBox,
    /// 1-based, in the parser's page order.
    pub page_number: usize,
    pub structural_score: f64,
    pub semantic_score: f64,
    pub total_score: f64,
}

impl TextBlock {
    pub fn new(text: &str, font_size: f64, font_name: &str, bbox: BoundingBox, page_number: usize) -> Self {
        Self {
            text: text.to_string(),
            font_size,
            font_name: font_name.to_string(),
            bbox,
            page_number,
            structural_score: 0.0,
            semantic_score: 0.0,
            total_score: 0.0,
        }
    }
}

/// Flattened spans plus every observed font size, in extraction order.
#[derive(Debug, Default)]
pub struct Extraction {
    pub blocks: Vec<TextBlock>,
    pub font_sizes: Vec<f64>,
}

impl Extraction {
    /// (min, max) of the observed font sizes, `None` for an empty document.
    pub fn size_range(&self) -> Option<(f64, f64)> {
        let mut sizes = self.font_sizes.iter().copied();
        let first = sizes.next()?;
        Some(sizes.fold((first, first), |(lo, hi), s| (lo.min(s), hi.max(s))))
    }
}

/// Walk pages → text blocks → lines → spans; image blocks and blank spans are dropped.
pub fn extract_blocks(doc: &ParsedDocument) -> Extraction {
    let mut out = Extraction::default();

    for (idx, page) in doc.pages.iter().enumerate() {
        let page_number = idx + 1;
        for block in &page.blocks {
            let LayoutBlock::Text { lines } = block else {
                continue;
            };
            for span in lines.iter().flat_map(|l| &l.spans) {
                let text = span.text.trim();
                if text.is_empty() {
                    continue;
                }
                out.blocks
                    .push(TextBlock::new(text, span.size, &span.font, span.bbox, page_number));
                out.font_sizes.push(span.size);
            }
        }
    }

    out
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{Line, ParsedPage, Span};

    fn span(text: &str, size: f64, y0: f64) -> Span {
        Span {
            text: text.to_string(),
            size,
            font: "Helvetica".to_string(),
            bbox: BoundingBox { x0: 0.0, y0, x1: 100.0, y1: y0 + size },
        }
    }

    fn text_block(spans: Vec<Span>) -> LayoutBlock {
        LayoutBlock::Text {
            lines: vec![Line { spans }],
        }
    }

    #[test]
    fn flattens_in_order_with_page_numbers() {
        let doc = ParsedDocument {
            pages: vec![
                ParsedPage {
                    blocks: vec![text_block(vec![span("Intro", 18.0, 40.0), span("body", 10.0, 80.0)])],
                },
                ParsedPage {
                    blocks: vec![text_block(vec![span("Second page", 12.0, 40.0)])],
                },
            ],
        };
        let ex = extract_blocks(&doc);
        let got: Vec<_> = ex.blocks.iter().map(|b| (b.text.as_str(), b.page_number)).collect();
        assert_eq!(got, vec![("Intro", 1), ("body", 1), ("Second page", 2)]);
        assert_eq!(ex.font_sizes, vec![18.0, 10.0, 12.0]);
        assert_eq!(ex.size_range(), Some((10.0, 18.0)));
    }

    #[test]
    fn trims_and_drops_blank_spans() {
        let doc = ParsedDocument {
            pages: vec![ParsedPage {
                blocks: vec![text_block(vec![span("  padded \n", 10.0, 0.0), span("   ", 30.0, 10.0)])],
            }],
        };
        let ex = extract_blocks(&doc);
        assert_eq!(ex.blocks.len(), 1);
        assert_eq!(ex.blocks[0].text, "padded");
        // Blank spans contribute no font size either.
        assert_eq!(ex.font_sizes, vec![10.0]);
    }

    #[test]
    fn skips_image_blocks() {
        let doc = ParsedDocument {
            pages: vec![ParsedPage {
                blocks: vec![LayoutBlock::Image, text_block(vec![span("caption", 9.0, 300.0)])],
            }],
        };
        let ex = extract_blocks(&doc);
        assert_eq!(ex.blocks.len(), 1);
        assert_eq!(ex.blocks[0].text, "caption");
    }

    #[test]
    fn empty_document() {
        let doc = ParsedDocument {
            pages: vec![ParsedPage::default(), ParsedPage { blocks: vec![LayoutBlock::Image] }],
        };
        let ex = extract_blocks(&doc);
        assert!(ex.blocks.is_empty());
        assert_eq!(ex.size_range(), None);
    }

    #[test]
    fn page_numbers_count_empty_pages() {
        let doc = ParsedDocument {
            pages: vec![
                ParsedPage::default(),
                ParsedPage {
                    blocks: vec![text_block(vec![span("late", 10.0, 0.0)])],
                },
            ],
        };
        let ex = extract_blocks(&doc);
        assert_eq!(ex.blocks[0].page_number, 2);
    }
}
