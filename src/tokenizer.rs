//! Word tokenizer adapter.
//!
//! The sentence segmenter only needs a stream of [`Token`]s; any morphological
//! tokenizer can feed it by implementing [`WordTokenizer`]. The crate bundles
//! [`SyllableTokenizer`], which cuts Tibetan at syllable level without a
//! dictionary.

use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

use crate::chunker::Chunker;
use crate::error::{Error, Result};
use crate::token::{ChunkType, Token};

/// Tsek character
pub const TSEK: char = '་';

/// Anything that turns text into an ordered token stream.
///
/// Concatenating the raw `text` of every token must give back the input,
/// modulo whitespace (and Unicode normalization).
pub trait WordTokenizer: Send + Sync {
    /// Tokenize a string
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

impl<T: WordTokenizer + ?Sized> WordTokenizer for Arc<T> {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        (**self).tokenize(text)
    }
}

impl<T: WordTokenizer + ?Sized> WordTokenizer for Box<T> {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        (**self).tokenize(text)
    }
}

/// A tokenizer that doesn't use a dictionary: one token per syllable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyllableTokenizer;

impl SyllableTokenizer {
    /// Create a new syllable tokenizer
    pub fn new() -> Self {
        SyllableTokenizer
    }
}

impl WordTokenizer for SyllableTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let normalized: String = text.nfc().collect();

        let chunker = Chunker::new(&normalized);
        chunker
            .make_chunks()
            .into_iter()
            .map(|chunk| {
                let mut token = Token::with_text(
                    chunk.text(&normalized).to_string(),
                    chunk.start,
                    chunk.len,
                    chunk.chunk_type,
                );
                if let Some(syl) = chunk.syl {
                    let mut cleaned = syl.clone();
                    if chunk.tsek {
                        cleaned.push(TSEK);
                    }
                    token.cleaned_text = Some(cleaned);
                    token.syls = vec![syl];
                }
                token
            })
            .collect()
    }
}

/// Check that `tokens` covers all of `text`.
///
/// An empty stream for non-blank input, or a stream whose raw text holds fewer
/// non-space characters than the input, is a [`Error::MalformedTokenStream`].
pub fn validate_stream(text: &str, tokens: &[Token]) -> Result<()> {
    let expected = text.nfc().filter(|c| !c.is_whitespace()).count();
    if expected == 0 {
        return Ok(());
    }
    if tokens.is_empty() {
        return Err(Error::MalformedTokenStream(format!(
            "no tokens for {} characters of input",
            expected
        )));
    }

    let covered: usize = tokens
        .iter()
        .map(|t| t.text.chars().filter(|c| !c.is_whitespace()).count())
        .sum();
    if covered < expected {
        return Err(Error::MalformedTokenStream(format!(
            "tokens cover {} of {} characters",
            covered, expected
        )));
    }
    Ok(())
}

/// Count tokens per chunk type, mostly for debug logging
pub fn chunk_type_counts(tokens: &[Token]) -> [(ChunkType, usize); 5] {
    let mut counts = [
        (ChunkType::Tibetan, 0),
        (ChunkType::Latin, 0),
        (ChunkType::Cjk, 0),
        (ChunkType::Punct, 0),
        (ChunkType::Other, 0),
    ];
    for token in tokens {
        if let Some(entry) = counts.iter_mut().find(|(t, _)| *t == token.chunk_type) {
            entry.1 += 1;
        }
    }
    counts
}
