//! Sentence roles of Tibetan punctuation.
//!
//! Tibetan does not separate words with spaces and does not end sentences with
//! a period. Whether a sentence may end at a given place is decided only by the
//! punctuation found there: opening marks (head marks, opening brackets) start a
//! unit, closing marks (shads, closing brackets) end one.

/// Role a punctuation mark plays at a sentence boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunctRole {
    /// Starts a unit; never ends the previous one
    Opening,
    /// Terminates a sentence
    Closing,
    /// Carries no boundary information
    Neutral,
}

/// Opening punctuation: head marks, opening brackets and ornaments
pub const OPENING_PUNCTS: [char; 20] = [
    '\u{0F01}', '\u{0F02}', '\u{0F03}', '\u{0F04}', '\u{0F05}', '\u{0F06}', '\u{0F07}',
    '\u{0F08}', '\u{0F09}', '\u{0F0A}', '\u{0F11}', '\u{0F12}', '\u{0F3A}', '\u{0F3C}',
    '\u{0F3F}', '\u{0FD0}', '\u{0FD1}', '\u{0FD3}', '\u{0FD4}', '\u{0FD9}',
];

/// Closing punctuation: shads, closing brackets and terminators
pub const CLOSING_PUNCTS: [char; 10] = [
    '\u{0F0D}', '\u{0F0E}', '\u{0F0F}', '\u{0F10}', '\u{0F14}', '\u{0F34}', '\u{0F3B}',
    '\u{0F3D}', '\u{0F3E}', '\u{0FDA}',
];

/// Role of a single character
pub fn punct_role(c: char) -> PunctRole {
    if OPENING_PUNCTS.contains(&c) {
        PunctRole::Opening
    } else if CLOSING_PUNCTS.contains(&c) {
        PunctRole::Closing
    } else {
        PunctRole::Neutral
    }
}

/// Whether `text` contains any opening mark
pub fn has_opening(text: &str) -> bool {
    text.chars().any(|c| punct_role(c) == PunctRole::Opening)
}

/// Whether `text` contains any closing mark
pub fn has_closing(text: &str) -> bool {
    text.chars().any(|c| punct_role(c) == PunctRole::Closing)
}

/// Role of a whole token text. An opening mark anywhere wins over closing marks.
pub fn text_role(text: &str) -> PunctRole {
    if has_opening(text) {
        PunctRole::Opening
    } else if has_closing(text) {
        PunctRole::Closing
    } else {
        PunctRole::Neutral
    }
}
