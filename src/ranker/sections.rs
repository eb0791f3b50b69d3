use std::sync::LazyLock;

use regex::Regex;

use super::blocks::TextBlock;

static NON_PRINTABLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\x20-\x7E]").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Vertical reach below the selected block, in device units.
pub const CONTEXT_WINDOW: f64 = 250.0;
const BULLET: char = '\u{2022}';

/// Highest `total_score`; the earliest block wins ties.
pub fn select_top(blocks: &[TextBlock]) -> Option<&TextBlock> {
    let mut best: Option<&TextBlock> = None;
    for b in blocks {
        match best {
            Some(top) if b.total_score <= top.total_score => {}
            _ => best = Some(b),
        }
    }
    best
}

/// The top block's text followed by every same-page block that starts strictly
/// inside `(top.y0, top.y0 + CONTEXT_WINDOW)`, in extraction order.
pub fn refine_context(top: &TextBlock, all: &[TextBlock]) -> String {
    let y0 = top.bbox.y0;
    let context: Vec<&str> = all
        .iter()
        .filter(|b| b.page_number == top.page_number)
        .filter(|b| b.bbox.y0 > y0 && b.bbox.y0 < y0 + CONTEXT_WINDOW)
        .map(|b| b.text.as_str())
        .collect();

    if context.is_empty() {
        top.text.clone()
    } else {
        format!("{} {}", top.text, context.join(" "))
    }
}

/// Flatten to single-spaced printable ASCII. Anything outside 0x20..=0x7E is
/// deleted, not transliterated; newlines and bullets become spaces first.
pub fn clean_refined_text(text: &str) -> String {
    let text = text.replace('\n', " ").replace(BULLET, " ");
    let text = NON_PRINTABLE_RE.replace_all(&text, "");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::BoundingBox;

    fn at(text: &str, page: usize, y0: f64) -> TextBlock {
        TextBlock::new(
            text,
            10.0,
            "Arial",
            BoundingBox { x0: 0.0, y0, x1: 100.0, y1: y0 + 10.0 },
            page,
        )
    }

    fn scored(text: &str, total: f64) -> TextBlock {
        let mut b = at(text, 1, 0.0);
        b.total_score = total;
        b
    }

    #[test]
    fn picks_highest_score() {
        let blocks = vec![scored("a", 0.4), scored("b", 1.7), scored("c", 0.9)];
        assert_eq!(select_top(&blocks).unwrap().text, "b");
    }

    #[test]
    fn tie_goes_to_earliest() {
        let blocks = vec![scored("a", 0.1), scored("first", 1.2), scored("second", 1.2)];
        assert_eq!(select_top(&blocks).unwrap().text, "first");
    }

    #[test]
    fn no_blocks_no_selection() {
        assert!(select_top(&[]).is_none());
    }

    #[test]
    fn window_bounds_are_strict() {
        let top = at("Heading", 1, 100.0);
        let blocks = vec![
            at("above", 1, 90.0),
            top.clone(),
            at("same line", 1, 100.0),
            at("inside", 1, 349.9),
            at("edge", 1, 350.0),
            at("other page", 2, 150.0),
        ];
        assert_eq!(refine_context(&top, &blocks), "Heading inside");
    }

    #[test]
    fn keeps_extraction_order() {
        let top = at("Top", 3, 10.0);
        let blocks = vec![top.clone(), at("later-lower", 3, 200.0), at("earlier-higher", 3, 20.0)];
        assert_eq!(refine_context(&top, &blocks), "Top later-lower earlier-higher");
    }

    #[test]
    fn empty_window_returns_title_unchanged() {
        let top = at("  Lonely\n", 1, 700.0);
        assert_eq!(refine_context(&top, &[top.clone()]), "  Lonely\n");
    }

    #[test]
    fn clean_example() {
        assert_eq!(clean_refined_text("héllo\u{2022}world\n"), "hllo world");
    }

    #[test]
    fn clean_drops_tabs_and_non_latin() {
        assert_eq!(clean_refined_text("a\tb  Ωmega   café – done"), "ab mega caf done");
    }

    #[test]
    fn clean_is_idempotent() {
        let inputs = [
            "  Plan\u{2022}your\ttrip\r\n to   Nice ",
            "日本語 text",
            "",
            "already clean",
        ];
        for s in inputs {
            let once = clean_refined_text(s);
            assert_eq!(clean_refined_text(&once), once);
        }
    }
}
