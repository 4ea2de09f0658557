//! Character classification for Tibetan Unicode characters.
//!
//! Each character of the Tibetan block (U+0F00–U+0FFF) is mapped to the role it
//! plays when a string is cut into syllables; characters outside the block are
//! only told apart as spaces, Latin, CJK or other.

/// Character categories used in Tibetan text processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CharCategory {
    /// Tibetan consonant
    Cons,
    /// Sub-joined consonant (used in consonant clusters)
    SubCons,
    /// Tibetan vowel sign
    Vow,
    /// Sanskrit long vowel marks (anusvara, visarga)
    SkrtLongVow,
    /// Combining mark that stays inside a syllable
    InSylMark,
    /// Tsek (syllable separator ་)
    Tsek,
    /// Shads and other sentence punctuation
    NormalPunct,
    /// Head marks, brackets and other framing punctuation
    SpecialPunct,
    /// Tibetan numeral
    Numeral,
    /// Symbol
    Symbol,
    /// Transparent characters (spaces, etc.) - ignored in syllable processing
    Transparent,
    /// Latin character
    Latin,
    /// CJK character
    Cjk,
    /// Other/unknown character
    #[default]
    Other,
}

impl CharCategory {
    /// Check if this category represents a character that can be part of a syllable
    pub fn is_syllable_part(&self) -> bool {
        matches!(
            self,
            CharCategory::Cons
                | CharCategory::SubCons
                | CharCategory::Vow
                | CharCategory::SkrtLongVow
                | CharCategory::InSylMark
        )
    }

    /// Check if this is punctuation (shads, head marks, brackets)
    pub fn is_punct(&self) -> bool {
        matches!(self, CharCategory::NormalPunct | CharCategory::SpecialPunct)
    }
}

/// Spaces, plus the zero-width characters that scanned texts carry between syllables
fn is_transparent(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\u{200B}' | '\u{FEFF}')
}

/// Category of a character inside the Tibetan block
fn tibetan_category(c: char) -> CharCategory {
    match c as u32 {
        0x0F00 => CharCategory::Cons,
        0x0F01..=0x0F0A => CharCategory::SpecialPunct,
        0x0F0B | 0x0F0C => CharCategory::Tsek,
        0x0F0D..=0x0F12 | 0x0F34 | 0x0F85 => CharCategory::NormalPunct,
        0x0F13..=0x0F17 | 0x0F1A..=0x0F1F | 0x0F36 | 0x0F38 => CharCategory::Symbol,
        0x0F18 | 0x0F19 | 0x0F35 | 0x0F37 | 0x0F39 => CharCategory::InSylMark,
        0x0F20..=0x0F33 => CharCategory::Numeral,
        0x0F3A..=0x0F3F => CharCategory::SpecialPunct,
        0x0F40..=0x0F6C | 0x0F88..=0x0F8C => CharCategory::Cons,
        0x0F71..=0x0F7D | 0x0F80 | 0x0F81 => CharCategory::Vow,
        0x0F7E | 0x0F7F => CharCategory::SkrtLongVow,
        0x0F82..=0x0F84 | 0x0F86 | 0x0F87 | 0x0FC6 => CharCategory::InSylMark,
        0x0F8D..=0x0FBC => CharCategory::SubCons,
        0x0FBE..=0x0FC5 | 0x0FC7..=0x0FCC | 0x0FCE | 0x0FCF | 0x0FD5..=0x0FD8 => {
            CharCategory::Symbol
        }
        0x0FD0..=0x0FD4 | 0x0FD9 | 0x0FDA => CharCategory::SpecialPunct,
        _ => CharCategory::Other,
    }
}

/// Category of any character
pub fn get_char_category(c: char) -> CharCategory {
    if is_transparent(c) {
        return CharCategory::Transparent;
    }
    match c {
        '\u{0F00}'..='\u{0FFF}' => tibetan_category(c),
        // Latin blocks up to the combining marks, Latin Extended Additional to currency
        '\u{0020}'..='\u{036F}' | '\u{1E00}'..='\u{20CF}' => CharCategory::Latin,
        // radicals, CJK symbols, ideographs and full-width forms
        '\u{2E80}'..='\u{2EFF}'
        | '\u{3000}'..='\u{303F}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{FF00}'..='\u{FFEF}' => CharCategory::Cjk,
        _ => CharCategory::Other,
    }
}

/// A string together with the category of each of its chars
#[derive(Debug, Clone)]
pub struct BoString {
    /// The text as given
    pub string: String,
    /// One category per char, in order
    pub categories: Vec<CharCategory>,
}

impl BoString {
    /// Categorize every char of `s`
    pub fn new(s: &str) -> Self {
        BoString {
            string: s.to_string(),
            categories: s.chars().map(get_char_category).collect(),
        }
    }

    /// Number of chars
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the string has no chars
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Category of the char at `idx`
    pub fn get_category(&self, idx: usize) -> Option<CharCategory> {
        self.categories.get(idx).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tibetan_consonants() {
        assert_eq!(get_char_category('ཀ'), CharCategory::Cons);
        assert_eq!(get_char_category('ང'), CharCategory::Cons);
        assert_eq!(get_char_category('འ'), CharCategory::Cons);
    }

    #[test]
    fn test_tibetan_vowels() {
        assert_eq!(get_char_category('ི'), CharCategory::Vow);
        assert_eq!(get_char_category('ུ'), CharCategory::Vow);
        assert_eq!(get_char_category('ེ'), CharCategory::Vow);
        assert_eq!(get_char_category('ོ'), CharCategory::Vow);
    }

    #[test]
    fn test_subjoined() {
        assert_eq!(get_char_category('ྲ'), CharCategory::SubCons);
        assert_eq!(get_char_category('ྱ'), CharCategory::SubCons);
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(get_char_category('་'), CharCategory::Tsek);
        assert_eq!(get_char_category('།'), CharCategory::NormalPunct);
        assert_eq!(get_char_category('༄'), CharCategory::SpecialPunct);
        assert_eq!(get_char_category('༼'), CharCategory::SpecialPunct);
        assert!(get_char_category('༅').is_punct());
    }

    #[test]
    fn test_foreign_scripts() {
        assert_eq!(get_char_category(' '), CharCategory::Transparent);
        assert_eq!(get_char_category('\u{3000}'), CharCategory::Transparent);
        assert_eq!(get_char_category('\u{200B}'), CharCategory::Transparent);
        assert_eq!(get_char_category('a'), CharCategory::Latin);
        assert_eq!(get_char_category('('), CharCategory::Latin);
        assert_eq!(get_char_category('“'), CharCategory::Latin);
        assert_eq!(get_char_category('就'), CharCategory::Cjk);
        assert_eq!(get_char_category('😀'), CharCategory::Other);
    }

    #[test]
    fn test_bo_string() {
        let bs = BoString::new("བཀྲ་");
        assert_eq!(bs.len(), 4);
        assert_eq!(bs.get_category(0), Some(CharCategory::Cons)); // བ
        assert_eq!(bs.get_category(1), Some(CharCategory::Cons)); // ཀ
        assert_eq!(bs.get_category(2), Some(CharCategory::SubCons)); // ྲ
        assert_eq!(bs.get_category(3), Some(CharCategory::Tsek)); // ་
        assert_eq!(bs.get_category(4), None);
    }
}
