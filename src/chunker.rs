//! Chunking and syllabification for Tibetan text.
//!
//! This module cuts text into chunks (syllables, punctuation runs, foreign-script
//! runs) that the bundled word tokenizer turns into tokens. Spaces never form a
//! chunk of their own: they are attached to the chunk they follow.

use crate::char_categories::{BoString, CharCategory};
use crate::punct::{punct_role, PunctRole};
use crate::token::ChunkType;

/// A chunk of text with its type and position
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// The syllable text (without tsek) - None for non-syllable chunks
    pub syl: Option<String>,
    /// The type of this chunk
    pub chunk_type: ChunkType,
    /// Starting byte offset in the original string
    pub start: usize,
    /// Length in bytes, trailing spaces included
    pub len: usize,
    /// The syllable is followed by a tsek, or by a space standing in for one
    pub tsek: bool,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(syl: Option<String>, chunk_type: ChunkType, start: usize, len: usize) -> Self {
        Chunk {
            syl,
            chunk_type,
            start,
            len,
            tsek: false,
        }
    }

    /// The raw text this chunk covers in `source`
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.start + self.len]
    }
}

/// Chunker for Tibetan text
pub struct Chunker {
    /// The analyzed string
    bs: BoString,
    /// Byte offset of every character, plus the end offset
    byte_positions: Vec<usize>,
}

impl Chunker {
    /// Create a new chunker for the given string
    pub fn new(text: &str) -> Self {
        let mut byte_positions: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        byte_positions.push(text.len());
        Chunker {
            bs: BoString::new(text),
            byte_positions,
        }
    }

    /// Get the original string
    pub fn string(&self) -> &str {
        &self.bs.string
    }

    fn category(&self, i: usize) -> CharCategory {
        self.bs.categories[i]
    }

    /// Chunk the text into syllables, punctuation, etc.
    pub fn make_chunks(&self) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = Vec::new();
        let chars: Vec<char> = self.bs.string.chars().collect();

        let mut i = 0;
        while i < chars.len() {
            let cat = self.category(i);

            let (chunk, next_i) = match cat {
                c if c.is_syllable_part() => self.read_syllable(&chars, i),
                CharCategory::NormalPunct | CharCategory::SpecialPunct => {
                    self.read_punct(&chars, i)
                }
                // A tsek with no syllable before it
                CharCategory::Tsek => {
                    self.read_run(i, |c| c == CharCategory::Tsek, ChunkType::Punct)
                }
                CharCategory::Numeral => {
                    self.read_run(i, |c| c == CharCategory::Numeral, ChunkType::Other)
                }
                CharCategory::Symbol => {
                    self.read_run(i, |c| c == CharCategory::Symbol, ChunkType::Other)
                }
                CharCategory::Latin => {
                    self.read_run(i, |c| c == CharCategory::Latin, ChunkType::Latin)
                }
                CharCategory::Cjk => self.read_run(i, |c| c == CharCategory::Cjk, ChunkType::Cjk),
                CharCategory::Transparent => {
                    // Leading spaces have nothing to attach to and are dropped
                    if let Some(last) = chunks.last_mut() {
                        last.len += chars[i].len_utf8();
                    }
                    i += 1;
                    continue;
                }
                _ => self.read_run(i, |_| false, ChunkType::Other),
            };

            chunks.push(chunk);
            i = next_i;
        }

        chunks
    }

    /// Read a Tibetan syllable starting at position i
    fn read_syllable(&self, chars: &[char], start_i: usize) -> (Chunk, usize) {
        let mut i = start_i;
        let mut syl = String::new();

        while i < chars.len() && self.category(i).is_syllable_part() {
            syl.push(chars[i]);
            i += 1;
        }

        let mut tsek = false;
        if i < chars.len() && self.category(i) == CharCategory::Tsek {
            tsek = true;
            i += 1;
        }

        let spaced_from = i;
        i = self.skip_spaces(i);
        // "ཀ འདི" reads as "ཀ་འདི"
        if !tsek && i > spaced_from && i < chars.len() && self.category(i).is_syllable_part() {
            tsek = true;
        }

        let mut chunk = self.chunk_between(start_i, i, ChunkType::Tibetan);
        chunk.syl = Some(syl);
        chunk.tsek = tsek;
        (chunk, i)
    }

    /// Read punctuation starting at position i.
    ///
    /// An opening mark that follows other punctuation starts a new chunk, so that
    /// "། ༄༅། །" yields a closing chunk and an opening chunk.
    fn read_punct(&self, chars: &[char], start_i: usize) -> (Chunk, usize) {
        let mut i = start_i;
        let mut seen_non_opening = false;

        while i < chars.len() {
            match self.category(i) {
                CharCategory::NormalPunct | CharCategory::SpecialPunct => {
                    let opening = punct_role(chars[i]) == PunctRole::Opening;
                    if opening && seen_non_opening {
                        break;
                    }
                    seen_non_opening |= !opening;
                    i += 1;
                }
                CharCategory::Transparent => i += 1,
                _ => break,
            }
        }

        (self.chunk_between(start_i, i, ChunkType::Punct), i)
    }

    /// Read a run of characters accepted by `accepts` (spaces included).
    /// The first character is always taken.
    fn read_run<F>(&self, start_i: usize, accepts: F, chunk_type: ChunkType) -> (Chunk, usize)
    where
        F: Fn(CharCategory) -> bool,
    {
        let mut i = start_i + 1;
        while i < self.bs.len() {
            let cat = self.category(i);
            if accepts(cat) || (cat == CharCategory::Transparent && chunk_type != ChunkType::Other)
            {
                i += 1;
            } else {
                break;
            }
        }
        (self.chunk_between(start_i, i, chunk_type), i)
    }

    fn skip_spaces(&self, mut i: usize) -> usize {
        while i < self.bs.len() && self.category(i) == CharCategory::Transparent {
            i += 1;
        }
        i
    }

    fn chunk_between(&self, start_i: usize, end_i: usize, chunk_type: ChunkType) -> Chunk {
        let start = self.byte_positions[start_i];
        let end = self.byte_positions[end_i];
        Chunk::new(None, chunk_type, start, end - start)
    }
}
