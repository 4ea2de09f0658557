//! Token representation for word-tokenized text.
//!
//! Tokens are produced by a [`WordTokenizer`](crate::tokenizer::WordTokenizer)
//! and consumed by the Tibetan sentence segmenter. They are never mutated after
//! the tokenizer hands them out.

use serde::{Deserialize, Serialize};

/// The script class of a chunk/token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChunkType {
    /// Tibetan text (syllables/words)
    #[default]
    Tibetan,
    /// Latin text
    Latin,
    /// CJK text
    Cjk,
    /// Punctuation
    Punct,
    /// Numerals, symbols and anything else
    Other,
}

impl ChunkType {
    /// Convert to a string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Tibetan => "TIBETAN",
            ChunkType::Latin => "LATIN",
            ChunkType::Cjk => "CJK",
            ChunkType::Punct => "PUNCT",
            ChunkType::Other => "OTHER",
        }
    }

    /// Latin and CJK runs are foreign-script noise inside Tibetan documents
    pub fn is_foreign(&self) -> bool {
        matches!(self, ChunkType::Latin | ChunkType::Cjk)
    }
}

/// A single token from the tokenization process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The raw text of the token, including trailing spaces
    pub text: String,

    /// Starting byte offset in the (normalized) input string
    pub start: usize,

    /// Length in bytes
    pub len: usize,

    /// The type of this token
    pub chunk_type: ChunkType,

    /// Normalized text (syllables re-joined with tsek), if the tokenizer has one
    pub cleaned_text: Option<String>,

    /// Part-of-speech tag (if available)
    pub pos: Option<String>,

    /// Syllables that make up this token
    pub syls: Vec<String>,
}

impl Token {
    /// Create a token with text and position
    pub fn with_text(text: String, start: usize, len: usize, chunk_type: ChunkType) -> Self {
        Token {
            text,
            start,
            len,
            chunk_type,
            ..Default::default()
        }
    }

    /// The cleaned text when there is one, the raw text otherwise
    pub fn cleaned_or_raw(&self) -> &str {
        self.cleaned_text.as_deref().unwrap_or(&self.text)
    }

    /// Check if this is punctuation
    pub fn is_punct(&self) -> bool {
        self.chunk_type == ChunkType::Punct
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)?;
        if let Some(ref pos) = self.pos {
            write!(f, "/{}", pos)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_creation() {
        let token = Token::with_text("བཀྲ་ཤིས་".to_string(), 0, 24, ChunkType::Tibetan);
        assert_eq!(token.text, "བཀྲ་ཤིས་");
        assert_eq!(token.start, 0);
        assert_eq!(token.chunk_type, ChunkType::Tibetan);
        assert!(token.cleaned_text.is_none());
    }

    #[test]
    fn test_cleaned_or_raw() {
        let mut token = Token::with_text("ཤིས་ ".to_string(), 0, 13, ChunkType::Tibetan);
        assert_eq!(token.cleaned_or_raw(), "ཤིས་ ");
        token.cleaned_text = Some("ཤིས་".to_string());
        assert_eq!(token.cleaned_or_raw(), "ཤིས་");
    }

    #[test]
    fn test_token_display() {
        let mut token = Token::with_text("བཀྲ་ཤིས་".to_string(), 0, 24, ChunkType::Tibetan);
        token.pos = Some("NOUN".to_string());
        assert_eq!(format!("{}", token), "བཀྲ་ཤིས་/NOUN");
    }

    #[test]
    fn test_chunk_type_serde() {
        let json = serde_json::to_string(&ChunkType::Cjk).unwrap();
        assert_eq!(json, "\"CJK\"");
        assert!(ChunkType::Latin.is_foreign());
        assert!(!ChunkType::Punct.is_foreign());
    }
}
