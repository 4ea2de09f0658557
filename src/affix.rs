//! Repair of genitive affixes split from their host syllable.
//!
//! Word tokenizers sometimes cut the genitive affix འི off a nominalizing
//! syllable (པ, པོ, བ, བོ...) and re-join the pieces with a tsek, producing
//! `དད་པ་འི་` where the text reads `དད་པའི་`. The functions here work on plain
//! strings so they can be run again over corpora that were segmented long ago.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tokenizer::TSEK;

/// Host syllables that take the split genitive affix
pub const STEM_SUFFIXES: [&str; 7] = ["པ", "པེ", "པོ", "བ", "བེ", "བོ", "བུ"];

/// `་(host)་འི་`: the host must be a whole syllable, hence the leading tsek
static SPLIT_AFFIX: Lazy<Regex> = Lazy::new(|| {
    let hosts = STEM_SUFFIXES.join("|");
    Regex::new(&format!("{TSEK}({hosts}){TSEK}འི{TSEK}")).expect("Invalid regex")
});

/// Every occurrence of a split affix in `text`, in order.
///
/// Consecutive occurrences may share their boundary tsek; all of them are
/// reported.
pub fn find_split_affix(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut at = 0;
    while let Some(m) = SPLIT_AFFIX.find_at(text, at) {
        found.push(m.as_str());
        at = m.end() - TSEK.len_utf8();
    }
    found
}

/// Re-attach every split affix to its host: `་པ་འི་` becomes `་པའི་`.
///
/// The result never contains a split affix, so applying it twice changes nothing.
pub fn fix_split_affix(text: &str) -> String {
    let mut fixed = text.to_string();
    while SPLIT_AFFIX.is_match(&fixed) {
        fixed = SPLIT_AFFIX
            .replace_all(&fixed, format!("{TSEK}${{1}}འི{TSEK}").as_str())
            .into_owned();
    }
    fixed
}
