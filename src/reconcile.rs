//! Diff-based segment reconciliation.
//!
//! A working text that was edited apart from its translation keeps its
//! sentence breaks but may have lost or changed wording. Reconciliation diffs the
//! flattened working text against the unsegmented source and re-threads the
//! source wording through the working text's sentence breaks. Every break of the
//! working text survives, so the line count of the result always equals the line
//! count of the working text.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::lang::Lang;
use crate::sentence::sentence_lines;
use crate::tm::TextPair;

/// Spans at most this many characters long are ignored by [`DiffStats`]
pub const MIN_STAT_SPAN: usize = 5;

static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("Invalid regex"));
static TEMPLATE_MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{.*?\}\}").expect("Invalid regex"));
static TRAILING_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)[ \t]+$").expect("Invalid regex"));

/// One span of a character-level diff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp<'a> {
    /// Present in both texts
    Equal(&'a str),
    /// Only in the old text
    Delete(&'a str),
    /// Only in the new text
    Insert(&'a str),
}

impl<'a> DiffOp<'a> {
    /// The text of the span
    pub fn text(&self) -> &'a str {
        match *self {
            DiffOp::Equal(s) | DiffOp::Delete(s) | DiffOp::Insert(s) => s,
        }
    }
}

/// Character-level diff of `old` against `new`
pub fn char_diff<'a>(old: &'a str, new: &'a str) -> Vec<DiffOp<'a>> {
    dissimilar::diff(old, new)
        .into_iter()
        .map(|chunk| match chunk {
            dissimilar::Chunk::Equal(s) => DiffOp::Equal(s),
            dissimilar::Chunk::Delete(s) => DiffOp::Delete(s),
            dissimilar::Chunk::Insert(s) => DiffOp::Insert(s),
        })
        .collect()
}

/// Counts of substantial diff spans, to judge how far two texts diverge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Spans only in the source
    pub missing: usize,
    /// Spans in both texts
    pub common: usize,
    /// Spans only in the working text
    pub extra: usize,
}

impl DiffStats {
    /// Count spans longer than [`MIN_STAT_SPAN`] characters, skipping bare breaks and shads
    pub fn from_ops(ops: &[DiffOp<'_>]) -> Self {
        let mut stats = DiffStats::default();
        for op in ops {
            let text = op.text();
            if matches!(text, "\n" | "།") || text.chars().count() <= MIN_STAT_SPAN {
                continue;
            }
            match op {
                DiffOp::Delete(_) => stats.missing += 1,
                DiffOp::Equal(_) => stats.common += 1,
                DiffOp::Insert(_) => stats.extra += 1,
            }
        }
        stats
    }
}

/// Collapse space runs, drop `{{...}}` markup and trailing whitespace on every line
pub fn common_cleanup(text: &str) -> String {
    let text = SPACE_RUN.replace_all(text, " ");
    let text = TEMPLATE_MARKUP.replace_all(&text, "");
    TRAILING_SPACE.replace_all(&text, "").into_owned()
}

/// Tibetan post-processing: move doubled shads back where they belong
pub fn bo_postprocess(text: &str) -> String {
    let text = text.replace("། ། ", "། །").replace("། །\n", "།\n།");
    common_cleanup(&text)
}

fn postprocess(text: &str, lang: Lang) -> String {
    match lang {
        Lang::Bo => bo_postprocess(text),
        Lang::En => common_cleanup(text),
    }
}

/// Flatten working lines, returning the text and the char offset of every break
fn flatten(lines: &[&str], lang: Lang) -> (String, Vec<usize>) {
    let mut flat = String::new();
    let mut breaks = Vec::with_capacity(lines.len().saturating_sub(1));
    let mut offset = 0;

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            breaks.push(offset);
        }
        // the source supplies the shads
        let line = match lang {
            Lang::Bo => line.replace('།', ""),
            Lang::En => line.to_string(),
        };
        offset += line.chars().count();
        flat.push_str(&line);
    }

    (flat, breaks)
}

/// Re-thread the source wording through the working breaks
fn merge(ops: &[DiffOp<'_>], breaks: &[usize]) -> String {
    let mut merged = String::new();
    let mut pending = breaks.iter().peekable();
    let mut new_offset = 0;

    for op in ops {
        match op {
            DiffOp::Delete(text) => merged.push_str(text),
            DiffOp::Equal(text) | DiffOp::Insert(text) => {
                for c in text.chars() {
                    while pending.next_if(|&&b| b <= new_offset).is_some() {
                        merged.push('\n');
                    }
                    if matches!(op, DiffOp::Equal(_)) {
                        merged.push(c);
                    }
                    new_offset += 1;
                }
            }
        }
    }
    for _ in pending {
        merged.push('\n');
    }

    merged
}

/// Reconcile `working` against `source`, returning one entry per working line
pub fn reconcile_lines(source: &str, working: &str, lang: Lang) -> Vec<String> {
    let lines = sentence_lines(working);
    if lines.is_empty() {
        return Vec::new();
    }

    let source = source.replace("\r\n", " ").replace(['\n', '\r'], " ");
    let (flat, breaks) = flatten(&lines, lang);
    let ops = char_diff(&source, &flat);
    debug!("{} diff: {:?}", lang, DiffStats::from_ops(&ops));

    postprocess(&merge(&ops, &breaks), lang)
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}

/// Reconcile `working` against `source` into a sentence-per-line text
pub fn reconcile(source: &str, working: &str, lang: Lang) -> String {
    reconcile_lines(source, working, lang).join("\n")
}

/// Reconcile both sides of a pair; the pair is rejected when the line counts differ
pub fn reconcile_pair(bo_source: &str, en_source: &str, working: &TextPair) -> Result<TextPair> {
    let bo = reconcile_lines(bo_source, &working.bo, Lang::Bo);
    let en = reconcile_lines(en_source, &working.en, Lang::En);

    if bo.len() != en.len() {
        return Err(Error::SegmentCountMismatch {
            bo: bo.len(),
            en: en.len(),
        });
    }

    Ok(TextPair {
        bo: bo.join("\n"),
        en: en.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rebuild_new(ops: &[DiffOp<'_>]) -> String {
        ops.iter()
            .filter(|op| !matches!(op, DiffOp::Delete(_)))
            .map(|op| op.text())
            .collect()
    }

    fn rebuild_old(ops: &[DiffOp<'_>]) -> String {
        ops.iter()
            .filter(|op| !matches!(op, DiffOp::Insert(_)))
            .map(|op| op.text())
            .collect()
    }

    #[test]
    fn test_char_diff_reconstructs_both_sides() {
        let old = "This is the original text.";
        let new = "This is a modified text!";
        let ops = char_diff(old, new);
        assert_eq!(rebuild_old(&ops), old);
        assert_eq!(rebuild_new(&ops), new);
    }

    #[test]
    fn test_en_breaks_restored() {
        let source = "This is a test. This is another test.";
        let working = "This is a test.\nThis is another test.";
        assert_eq!(reconcile(source, working, Lang::En), working);
    }

    #[test]
    fn test_en_source_wording_wins() {
        let source = "The cat sat on the mat. It was happy.";
        let working = "The cat sat on mat.\nIt was  happy.";
        assert_eq!(
            reconcile(source, working, Lang::En),
            "The cat sat on the mat.\nIt was happy."
        );
    }

    #[test]
    fn test_break_inside_equal_span() {
        // the break sits in the middle of text both sides share
        let source = "one two three four";
        let working = "one two\nthree four";
        assert_eq!(reconcile(source, working, Lang::En), "one two\nthree four");
    }

    #[test]
    fn test_source_only_text_joins_previous_line() {
        let lines = reconcile_lines("A. B. C.", "A.\nC.", Lang::En);
        assert_eq!(lines, vec!["A. B.", "C."]);

        let lines = reconcile_lines("One. Two. Three. Four.", "One.\nFour.", Lang::En);
        assert_eq!(lines, vec!["One. Two. Three.", "Four."]);
    }

    #[test]
    fn test_every_break_survives() {
        let source = "Completely different wording here.";
        let working = "a\nb\nc\nd";
        let lines = reconcile_lines(source, working, Lang::En);
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_bo_shads_from_source() {
        let source = "ཀ་ཁ། ག་ང། ཅ་ཆ།";
        let working = "ཀ་ཁ།\nག་ང།\nཅ་ཆ།";
        assert_eq!(reconcile(source, working, Lang::Bo), working);
    }

    #[test]
    fn test_source_line_breaks_ignored() {
        let source = "This is a\ntest. This is\r\nanother test.";
        let working = "This is a test.\nThis is another test.";
        assert_eq!(
            reconcile(source, working, Lang::En),
            "This is a test.\nThis is another test."
        );
    }

    #[test]
    fn test_empty_working() {
        assert_eq!(reconcile("some source", "", Lang::En), "");
        assert!(reconcile_lines("some source", "\n", Lang::En).is_empty());
    }

    #[test]
    fn test_bo_postprocess() {
        assert_eq!(bo_postprocess("ཀ། ། ཁ"), "ཀ། །ཁ");
        assert_eq!(bo_postprocess("ཀ། །\nཁ"), "ཀ།\n།ཁ");
    }

    #[test]
    fn test_common_cleanup() {
        assert_eq!(
            common_cleanup("a  b\t c {{note}} \nd   "),
            "a b c\nd"
        );
    }

    #[test]
    fn test_pair_mismatch_rejected() {
        let working = TextPair {
            bo: "ཀ་ཁ།\nག་ང།".to_string(),
            en: "Only one line.".to_string(),
        };
        let result = reconcile_pair("ཀ་ཁ། ག་ང།", "Only one line.", &working);
        assert!(matches!(
            result,
            Err(Error::SegmentCountMismatch { bo: 2, en: 1 })
        ));
    }

    #[test]
    fn test_pair() {
        let working = TextPair {
            bo: "ཀ་ཁ།\nག་ང།".to_string(),
            en: "One.\nTwo.".to_string(),
        };
        let pair = reconcile_pair("ཀ་ཁ། ག་ང།", "One. Two.", &working).unwrap();
        assert_eq!(pair.bo, "ཀ་ཁ།\nག་ང།");
        assert_eq!(pair.en, "One.\nTwo.");
    }

    #[test]
    fn test_diff_stats() {
        let ops = [
            DiffOp::Equal("a long shared span"),
            DiffOp::Delete("\n"),
            DiffOp::Delete("short"),
            DiffOp::Insert("an added sentence"),
        ];
        assert_eq!(
            DiffStats::from_ops(&ops),
            DiffStats {
                missing: 0,
                common: 1,
                extra: 1
            }
        );
    }
}
