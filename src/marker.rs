//! Rank markers for human review.
//!
//! QC prepends a marker to both sides of every suspicious pair so a reviewer
//! scanning the files can triage by severity. Markers are removed again before
//! the next QC run; `remove(mark(x)) == trim(x)`.

use crate::error::{Error, Result};

/// Keycap digits, indexed by rank
pub const DEFAULT_PALETTE: [&str; 10] = [
    "0\u{FE0F}\u{20E3}",
    "1\u{FE0F}\u{20E3}",
    "2\u{FE0F}\u{20E3}",
    "3\u{FE0F}\u{20E3}",
    "4\u{FE0F}\u{20E3}",
    "5\u{FE0F}\u{20E3}",
    "6\u{FE0F}\u{20E3}",
    "7\u{FE0F}\u{20E3}",
    "8\u{FE0F}\u{20E3}",
    "9\u{FE0F}\u{20E3}",
];

/// Separates a notice from the sentence; plain spaces after a sign are content
pub const NOTICE_SEPARATOR: char = '\u{A0}';

/// Adds and strips markers on sentence lines
pub trait Marker: Send + Sync {
    /// Mark a single (trimmed) line with `rank`
    fn mark_line(&self, line: &str, rank: usize) -> String;

    /// Strip the marker `mark_line` may have added and trim the line
    fn remove_line(&self, line: &str) -> String;

    /// Mark both sides of every pair with the pair's rank
    fn mark(
        &self,
        bo: &[String],
        en: &[String],
        ranks: &[usize],
    ) -> Result<(Vec<String>, Vec<String>)> {
        if bo.len() != en.len() {
            return Err(Error::SegmentCountMismatch {
                bo: bo.len(),
                en: en.len(),
            });
        }
        if ranks.len() != bo.len() {
            return Err(Error::RankCountMismatch {
                pairs: bo.len(),
                ranks: ranks.len(),
            });
        }

        Ok(bo
            .iter()
            .zip(en)
            .zip(ranks)
            .map(|((b, e), &rank)| (self.mark_line(b, rank), self.mark_line(e, rank)))
            .unzip())
    }

    /// Strip markers from both sides
    fn remove(&self, bo: &[String], en: &[String]) -> (Vec<String>, Vec<String>) {
        (
            bo.iter().map(|l| self.remove_line(l)).collect(),
            en.iter().map(|l| self.remove_line(l)).collect(),
        )
    }
}

/// One glyph per rank; rank 0 is left unmarked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankMarker {
    palette: Vec<String>,
}

impl Default for RankMarker {
    fn default() -> Self {
        RankMarker {
            palette: DEFAULT_PALETTE.iter().map(|g| g.to_string()).collect(),
        }
    }
}

impl RankMarker {
    /// Use a custom palette of exactly ten distinct glyphs. A glyph made only
    /// of letters or digits would read as sentence text and is rejected.
    pub fn with_palette(palette: Vec<String>) -> Result<Self> {
        if palette.len() != DEFAULT_PALETTE.len() {
            return Err(Error::Config(format!(
                "marker palette needs {} glyphs, got {}",
                DEFAULT_PALETTE.len(),
                palette.len()
            )));
        }
        if palette.iter().any(|g| g.trim().is_empty()) {
            return Err(Error::Config("marker palette has an empty glyph".into()));
        }
        if let Some(glyph) = palette
            .iter()
            .find(|g| g.chars().all(char::is_alphanumeric) || g.contains(char::is_whitespace))
        {
            return Err(Error::Config(format!("marker glyph {:?} looks like text", glyph)));
        }
        for (i, glyph) in palette.iter().enumerate() {
            if palette[..i].contains(glyph) {
                return Err(Error::Config(format!("duplicate marker glyph {}", glyph)));
            }
        }
        Ok(RankMarker { palette })
    }

    /// Glyph of `rank`, clamped to the palette
    pub fn glyph(&self, rank: usize) -> &str {
        &self.palette[rank.min(self.palette.len() - 1)]
    }

    fn strip_glyph<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.palette.iter().find_map(|g| {
            line.strip_prefix(g.as_str())
                .and_then(|rest| rest.strip_prefix(' '))
        })
    }
}

impl Marker for RankMarker {
    fn mark_line(&self, line: &str, rank: usize) -> String {
        let line = line.trim();
        if rank == 0 || line.is_empty() {
            return line.to_string();
        }
        let prefix = format!("{} ", self.glyph(rank));
        if line.starts_with(&prefix) {
            return line.to_string();
        }
        prefix + line
    }

    fn remove_line(&self, line: &str) -> String {
        let line = line.trim();
        match self.strip_glyph(line) {
            Some(rest) => rest.trim().to_string(),
            None => line.to_string(),
        }
    }
}

/// Repeats a sign `rank` times before a no-break space; ranks 0 and 1 are
/// left unmarked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeMarker {
    sign: String,
}

impl Default for NoticeMarker {
    fn default() -> Self {
        NoticeMarker::new("*")
    }
}

impl NoticeMarker {
    /// Create a marker that repeats `sign`
    pub fn new(sign: &str) -> Self {
        NoticeMarker {
            sign: sign.to_string(),
        }
    }

    /// The repeated sign
    pub fn sign(&self) -> &str {
        &self.sign
    }
}

impl Marker for NoticeMarker {
    fn mark_line(&self, line: &str, rank: usize) -> String {
        let line = line.trim();
        if rank <= 1 || self.sign.is_empty() || line.is_empty() {
            return line.to_string();
        }
        let notice = format!("{}{}", self.sign.repeat(rank), NOTICE_SEPARATOR);
        if line.starts_with(&notice) {
            return line.to_string();
        }
        format!("{}{}", notice, line)
    }

    fn remove_line(&self, line: &str) -> String {
        let line = line.trim();
        if self.sign.is_empty() {
            return line.to_string();
        }
        let body = line.trim_start_matches(self.sign.as_str());
        let run = (line.len() - body.len()) / self.sign.len();
        match body.strip_prefix(NOTICE_SEPARATOR) {
            Some(rest) if run >= 2 => rest.trim().to_string(),
            _ => line.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rank_marker() {
        let marker = RankMarker::default();
        assert_eq!(marker.mark_line("  text ", 0), "text");
        assert_eq!(marker.mark_line("text", 2), "2\u{FE0F}\u{20E3} text");
        assert_eq!(marker.mark_line("text", 42), "9\u{FE0F}\u{20E3} text");
    }

    #[test]
    fn test_rank_marker_both_sides() {
        let marker = RankMarker::default();
        let (bo, en) = marker
            .mark(&strings(&["ཀ།", "ཁ།"]), &strings(&["A.", "B."]), &[0, 3])
            .unwrap();
        assert_eq!(bo, vec!["ཀ།", "3\u{FE0F}\u{20E3} ཁ།"]);
        assert_eq!(en, vec!["A.", "3\u{FE0F}\u{20E3} B."]);
    }

    #[test]
    fn test_no_double_marking() {
        let marker = RankMarker::default();
        let once = marker.mark_line("text", 4);
        assert_eq!(marker.mark_line(&once, 4), once);
    }

    #[test]
    fn test_round_trip() {
        let bo = strings(&[" ཀ་ཁ། ", "ག་ང།", "ཅ་ཆ།\t"]);
        let en = strings(&["One. ", " Two.", "3 apples."]);
        for marker in [
            Box::new(RankMarker::default()) as Box<dyn Marker>,
            Box::new(NoticeMarker::default()),
        ] {
            let (bo_marked, en_marked) = marker.mark(&bo, &en, &[0, 2, 7]).unwrap();
            let (bo_clean, en_clean) = marker.remove(&bo_marked, &en_marked);
            assert_eq!(bo_clean, vec!["ཀ་ཁ།", "ག་ང།", "ཅ་ཆ།"]);
            assert_eq!(en_clean, vec!["One.", "Two.", "3 apples."]);
        }
    }

    #[test]
    fn test_round_trip_keeps_marker_like_text() {
        let bo = strings(&["*ཀ།", "** ཁ།", "ག།", "* ང།", "1\u{FE0F}\u{20E3}ཅ།"]);
        let en = strings(&["*Note: see above.", "** bold claim", "**", "* item", "1\u{FE0F}\u{20E3}x"]);
        for ranks in [[0, 1, 0, 1, 0], [1, 0, 1, 0, 1], [2, 3, 2, 5, 9]] {
            for marker in [
                Box::new(RankMarker::default()) as Box<dyn Marker>,
                Box::new(NoticeMarker::default()),
            ] {
                let (bo_marked, en_marked) = marker.mark(&bo, &en, &ranks).unwrap();
                let (bo_clean, en_clean) = marker.remove(&bo_marked, &en_marked);
                assert_eq!(bo_clean, bo);
                assert_eq!(en_clean, en);
            }
        }
    }

    #[test]
    fn test_remove_strips_one_glyph() {
        let marker = RankMarker::default();
        let line = "1\u{FE0F}\u{20E3} 5\u{FE0F}\u{20E3} text";
        assert_eq!(marker.remove_line(line), "5\u{FE0F}\u{20E3} text");
        assert_eq!(marker.remove_line("5\u{FE0F}\u{20E3}text"), "5\u{FE0F}\u{20E3}text");
    }

    #[test]
    fn test_notice_marker() {
        let marker = NoticeMarker::default();
        assert_eq!(marker.mark_line("text", 1), "text");
        assert_eq!(marker.mark_line("text", 5), "*****\u{A0}text");
        assert_eq!(marker.remove_line("*****\u{A0}text"), "text");
        assert_eq!(marker.remove_line("***** text"), "***** text");
        assert_eq!(marker.remove_line("*\u{A0}text"), "*\u{A0}text");
    }

    #[test]
    fn test_notice_marker_multichar_sign() {
        let marker = NoticeMarker::new("!?");
        let marked = marker.mark_line("!?Really", 3);
        assert_eq!(marked, "!?!?!?\u{A0}!?Really");
        assert_eq!(marker.remove_line(&marked), "!?Really");
    }

    #[test]
    fn test_mark_count_checks() {
        let marker = RankMarker::default();
        assert!(matches!(
            marker.mark(&strings(&["a"]), &strings(&["a", "b"]), &[0]),
            Err(Error::SegmentCountMismatch { bo: 1, en: 2 })
        ));
        assert!(matches!(
            marker.mark(&strings(&["a"]), &strings(&["b"]), &[0, 1]),
            Err(Error::RankCountMismatch { pairs: 1, ranks: 2 })
        ));
    }

    #[test]
    fn test_custom_palette() {
        let glyphs: Vec<String> = "●○◆◇■□▲△▼▽".chars().map(String::from).collect();
        let marker = RankMarker::with_palette(glyphs).unwrap();
        assert_eq!(marker.mark_line("text", 1), "○ text");
        assert_eq!(marker.remove_line("○ text"), "text");

        assert!(RankMarker::with_palette(vec!["●".into()]).is_err());
        let dup: Vec<String> = "●●◆◇■□▲△▼▽".chars().map(String::from).collect();
        assert!(RankMarker::with_palette(dup).is_err());
        let letters: Vec<String> = "abcdefghij".chars().map(String::from).collect();
        assert!(RankMarker::with_palette(letters).is_err());
        let spaced: Vec<String> = "●○◆◇■□▲△▼▽".chars().map(|c| format!("{} x", c)).collect();
        assert!(RankMarker::with_palette(spaced).is_err());
    }
}
