//! English preprocessing, sentence and word tokenization.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n\t]+").expect("Invalid regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("Invalid regex"));

/// Abbreviations that precede a capitalized word without ending the sentence
const NON_TERMINAL_ABBREVIATIONS: &[&str] = &[
    "Dr.", "Mr.", "Mrs.", "Ms.", "Prof.", "Sr.", "Jr.", "St.", "Mt.", "Ven.", "Skt.", "Tib.",
    "e.g.", "i.e.", "cf.", "vs.", "viz.",
];

/// Turn hard-wrapped English into a single line
pub fn en_preprocess(text: &str) -> String {
    let text = LINE_BREAKS.replace_all(text, " ");
    SPACES.replace_all(&text, " ").trim().to_string()
}

/// English sentences, one per line
pub fn en_sent_tokenize(text: &str) -> String {
    en_sentences(text).join("\n")
}

/// English sentences using Unicode sentence boundaries (UAX #29). A boundary
/// right after a title or similar abbreviation is not a sentence end.
pub fn en_sentences(text: &str) -> Vec<String> {
    let mut sentences: Vec<String> = Vec::new();
    let mut continues = false;
    for segment in en_preprocess(text).unicode_sentences() {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        match sentences.last_mut() {
            Some(last) if continues => {
                last.push(' ');
                last.push_str(segment);
            }
            _ => sentences.push(segment.to_string()),
        }
        continues = ends_with_abbreviation(segment);
    }
    sentences
}

fn ends_with_abbreviation(segment: &str) -> bool {
    let last_word = segment
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(|c: char| matches!(c, '(' | '[' | '"' | '\'' | '“' | '‘'));
    NON_TERMINAL_ABBREVIATIONS.contains(&last_word)
}

/// Words and punctuation of an English text, whitespace dropped
pub fn en_word_tokenize(text: &str) -> Vec<&str> {
    text.split_word_bounds()
        .filter(|w| !w.trim().is_empty())
        .collect()
}

/// Share of distinct tokens in `text` that are not in `vocab`. Empty text has no OOV.
pub fn oov_rate(vocab: &HashSet<String>, text: &str) -> f64 {
    let words: HashSet<&str> = en_word_tokenize(text).into_iter().collect();
    if words.is_empty() {
        return 0.0;
    }
    let oov = words.iter().filter(|w| !vocab.contains(**w)).count();
    oov as f64 / words.len() as f64
}
