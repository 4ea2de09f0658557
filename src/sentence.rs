//! Tibetan sentence segmentation.
//!
//! Whitespace carries no boundary information in Tibetan, so the segmenter
//! works on the token stream: closing punctuation ends a line, opening
//! punctuation starts a unit without ending the previous one, and foreign-script
//! runs are dropped. A fixed list of rewrite rules then repairs the artifacts the
//! word tokenizer is known to leave behind.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::affix::fix_split_affix;
use crate::error::Result;
use crate::punct::{text_role, PunctRole};
use crate::token::Token;
use crate::tokenizer::{chunk_type_counts, validate_stream, SyllableTokenizer, WordTokenizer};

/// Scan page markers such as `༼༼༡༢༽༽` or `((12b))`, with the break they caused
static PAGE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\(\(|༼༼|༺༺)\s*[0-9༠-༩]+\s*[bn]?\s*(?:\)\)|༽༽|༻༻)\n?")
        .expect("Invalid regex")
});

/// A space between a non-nasal syllable end and a shad
static SPACE_BEFORE_SHAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new("([\u{0F40}-\u{0F6C}\u{0F71}-\u{0FBC}--\u{0F44}]) +([།༎])").expect("Invalid regex")
});

/// Two shads separated by spaces
static DOUBLE_SHAD: Lazy<Regex> =
    Lazy::new(|| Regex::new("([།༎]) +([།༎])").expect("Invalid regex"));

/// Join sentences into a text with one sentence per line
pub fn join_sentences<S: AsRef<str>>(sentences: &[S]) -> String {
    sentences
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lines of a sentence-per-line text, ignoring trailing empty lines
pub fn sentence_lines(text: &str) -> Vec<&str> {
    let trimmed = text.trim_end_matches(['\n', '\r']);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.lines().collect()
}

/// Remove line breaks; the tokenizer only understands continuous runs
pub fn bo_preprocess(text: &str) -> String {
    text.replace(['\n', '\r'], "")
}

/// Concatenate the token stream, breaking the line after closing punctuation.
pub fn join_tokens(tokens: &[Token]) -> String {
    let mut text = String::new();

    for token in tokens.iter().filter(|t| !t.chunk_type.is_foreign()) {
        match text_role(&token.text) {
            PunctRole::Opening => text.push_str(token.cleaned_or_raw().trim()),
            PunctRole::Closing => {
                text.push_str(token.cleaned_or_raw().trim());
                text.push('\n');
            }
            PunctRole::Neutral => text.push_str(token.cleaned_or_raw()),
        }
    }

    text
}

/// Delete scan page markers left in the text by the digitization
pub fn remove_page_markers(text: &str) -> String {
    PAGE_MARKER.replace_all(text, "").into_owned()
}

/// `ཀ །` becomes `ཀ།`; `ང །` is left alone
pub fn fix_space_before_shad(text: &str) -> String {
    SPACE_BEFORE_SHAD.replace_all(text, "${1}${2}").into_owned()
}

/// `། །` becomes `།། ` so doubled shads always read the same way
pub fn normalize_double_shad(text: &str) -> String {
    DOUBLE_SHAD.replace_all(text, "${1}${2} ").into_owned()
}

/// The repair rules, in the order they must run
pub fn apply_repair_rules(text: &str) -> String {
    let text = remove_page_markers(text);
    let text = fix_space_before_shad(&text);
    let text = normalize_double_shad(&text);
    fix_split_affix(&text)
}

/// Sentence tokenizer for Tibetan, built around an injected word tokenizer
#[derive(Debug, Clone, Default)]
pub struct BoSentenceTokenizer<T: WordTokenizer = SyllableTokenizer> {
    tokenizer: T,
}

impl<T: WordTokenizer> BoSentenceTokenizer<T> {
    /// Create a sentence tokenizer that uses `tokenizer` for words
    pub fn new(tokenizer: T) -> Self {
        BoSentenceTokenizer { tokenizer }
    }

    /// Get a reference to the word tokenizer
    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Segment `text` into a sentence-per-line string.
    ///
    /// The result may end with a line break when the text ends with closing
    /// punctuation; use [`sentence_lines`] before counting sentences.
    pub fn tokenize(&self, text: &str) -> Result<String> {
        let text = bo_preprocess(text);
        let tokens = self.tokenizer.tokenize(&text);
        validate_stream(&text, &tokens)?;
        debug!("token counts: {:?}", chunk_type_counts(&tokens));

        Ok(apply_repair_rules(&join_tokens(&tokens)))
    }

    /// Segment `text` and return the sentences
    pub fn sentences(&self, text: &str) -> Result<Vec<String>> {
        let segmented = self.tokenize(text)?;
        Ok(sentence_lines(&segmented)
            .into_iter()
            .map(String::from)
            .collect())
    }
}
