//! Languages of a text pair and per-language sentence tokenization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::en::en_sent_tokenize;
use crate::error::{Error, Result};
use crate::sentence::BoSentenceTokenizer;
use crate::tokenizer::{SyllableTokenizer, WordTokenizer};

/// The two sides of a text pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// Tibetan
    Bo,
    /// English
    En,
}

impl Lang {
    /// Both languages, Tibetan first
    pub const ALL: [Lang; 2] = [Lang::Bo, Lang::En];

    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Lang::Bo => "bo",
            Lang::En => "en",
        }
    }

    /// Prefix of text ids in this language (`BO0001`)
    pub fn text_id_prefix(&self) -> &'static str {
        match self {
            Lang::Bo => "BO",
            Lang::En => "EN",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bo" => Ok(Lang::Bo),
            "en" => Ok(Lang::En),
            _ => Err(Error::UnsupportedLang(s.to_string())),
        }
    }
}

/// Sentence tokenizers for both languages, chosen by [`Lang`]
#[derive(Debug, Clone, Default)]
pub struct SentTokenizer<T: WordTokenizer = SyllableTokenizer> {
    bo: BoSentenceTokenizer<T>,
}

impl<T: WordTokenizer> SentTokenizer<T> {
    /// Use `tokenizer` for Tibetan words
    pub fn new(tokenizer: T) -> Self {
        SentTokenizer {
            bo: BoSentenceTokenizer::new(tokenizer),
        }
    }

    /// The Tibetan sentence tokenizer
    pub fn bo(&self) -> &BoSentenceTokenizer<T> {
        &self.bo
    }

    /// Sentence-per-line text of `text` in `lang`
    pub fn sent_tokenize(&self, text: &str, lang: Lang) -> Result<String> {
        match lang {
            Lang::Bo => self.bo.tokenize(text),
            Lang::En => Ok(en_sent_tokenize(text)),
        }
    }
}

/// Sentence-tokenize `text` given a language code (`bo` or `en`)
pub fn sent_tokenize(text: &str, lang: &str) -> Result<String> {
    let lang: Lang = lang.parse()?;
    SentTokenizer::new(SyllableTokenizer).sent_tokenize(text, lang)
}
