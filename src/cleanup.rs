//! Text cleanup.
//!
//! Placeholder and template-markup stripping for TM files, plus the contract
//! of the external cleanup service that re-splits raw English into sentences.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::tm::TextPair;

/// Default chunk size, in whitespace-separated tokens, sent to a cleanup service
pub const DEFAULT_MAX_TOKENS: usize = 4096;

/// Prefix of files written by [`cleaning_pipeline`]
pub const CLEANED_TEXT_PREFIX: &str = "[CLEANED]";

static TEMPLATE_MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{.*?\}\}").expect("Invalid regex"));
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?] +").expect("Invalid regex"));

/// Remove `{{...}}` template markup
pub fn strip_template_markup(text: &str) -> String {
    TEMPLATE_MARKUP.replace_all(text, "").into_owned()
}

/// Clean a Tibetan TM text
pub fn clean_bo(text: &str) -> String {
    strip_template_markup(&text.replace("input_text", ""))
        .trim()
        .to_string()
}

/// Clean an English TM text
pub fn clean_en(text: &str) -> String {
    strip_template_markup(&text.replace("target_text", ""))
        .trim()
        .to_string()
}

/// Clean both sides; the pair is rejected if cleaning changed the line balance
pub fn clean_pair(pair: &TextPair) -> Result<TextPair> {
    let cleaned = TextPair {
        bo: clean_bo(&pair.bo),
        en: clean_en(&pair.en),
    };
    cleaned.check_line_counts()?;
    Ok(cleaned)
}

/// Service that splits a chunk of raw text into clean sentences
pub trait CleanupService: Send + Sync {
    /// Sentences of `chunk`, in order
    fn cleanup(&self, chunk: &str) -> Result<Vec<String>>;
}

/// Sentences split after `.`, `!` or `?` followed by spaces
fn split_sentences(document: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(document) {
        // keep the terminator, drop the spaces
        sentences.push(&document[start..m.start() + 1]);
        start = m.end();
    }
    if start < document.len() {
        sentences.push(&document[start..]);
    }
    sentences
}

/// Pack whole sentences into chunks of at most `max_tokens` whitespace tokens.
///
/// A sentence longer than `max_tokens` becomes a chunk of its own.
pub fn split_document(document: &str, max_tokens: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chunk: Vec<&str> = Vec::new();
    let mut tokens = 0;

    for sentence in split_sentences(document) {
        let count = sentence.split_whitespace().count();
        if !chunk.is_empty() && tokens + count > max_tokens {
            chunks.push(chunk.join(" "));
            chunk.clear();
            tokens = 0;
        }
        chunk.push(sentence);
        tokens += count;
    }
    if !chunk.is_empty() {
        chunks.push(chunk.join(" "));
    }
    chunks
}

/// Run `service` over every chunk of `text`
pub fn clean_document<S: CleanupService + ?Sized>(
    service: &S,
    text: &str,
    max_tokens: usize,
) -> Result<Vec<String>> {
    let mut sentences = Vec::new();
    for chunk in split_document(text, max_tokens) {
        sentences.extend(
            service
                .cleanup(&chunk)?
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        );
    }
    Ok(sentences)
}

/// Clean the file at `path` into `[CLEANED]_<stem>.txt` next to it
pub fn cleaning_pipeline<S: CleanupService + ?Sized>(service: &S, path: &Path) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .ok_or_else(|| Error::FileNotFound(path.to_path_buf()))?
        .to_string_lossy();
    let cleaned_path = path.with_file_name(format!("{}_{}.txt", CLEANED_TEXT_PREFIX, stem));

    let text = fs::read_to_string(path)?;
    let sentences = clean_document(service, &text, DEFAULT_MAX_TOKENS)?;
    fs::write(&cleaned_path, sentences.join("\n"))?;

    info!("cleaned {} into {} sentences", path.display(), sentences.len());
    Ok(cleaned_path)
}
