//! # tm-tools-rs
//!
//! Tools for building and checking Tibetan/English translation memories.
//!
//! A translation memory (TM) record is a pair of sentence-per-line files, one
//! Tibetan and one English, where line *i* of one side translates line *i* of
//! the other. This crate provides the pieces to produce and maintain them:
//!
//! - sentence segmentation of Tibetan ([`BoSentenceTokenizer`]) and English
//!   ([`en_sent_tokenize`]) text, one sentence per line
//! - repair of genitive affixes split off by word tokenizers
//!   ([`fix_split_affix`])
//! - reconciliation of hand-aligned text against its source wording
//!   ([`reconcile`])
//! - alignment quality scoring ([`SimilarityMetric`], [`CharLenRatioMetric`])
//!   and review markers ([`RankMarker`], [`NoticeMarker`])
//! - batch drivers over a TM collection ([`Pipeline`])
//!
//! ## Quick Start
//!
//! ```rust
//! use tm_tools::{sent_tokenize, reconcile, Lang};
//!
//! let bo = sent_tokenize("ཀ་ཁ། ག་ང།", "bo").unwrap();
//! assert_eq!(bo, "ཀ་ཁ།\nག་ང།\n");
//!
//! let en = reconcile(
//!     "The cat sat on the mat. It was happy.",
//!     "The cat sat on mat.\nIt was happy.",
//!     Lang::En,
//! );
//! assert_eq!(en, "The cat sat on the mat.\nIt was happy.");
//! ```
//!
//! ## Python Bindings
//!
//! The segmenters, the affix repair and the reconciler can be compiled as a
//! Python extension module with the `python` feature.

pub mod affix;
pub mod char_categories;
pub mod chunker;
pub mod cleanup;
pub mod config;
pub mod en;
pub mod error;
pub mod lang;
pub mod marker;
pub mod metric;
pub mod oracle;
pub mod pipeline;
pub mod punct;
pub mod qc_log;
pub mod reconcile;
pub mod sentence;
pub mod tm;
pub mod token;
pub mod tokenizer;

// Python bindings (only compiled when the "python" feature is enabled)
#[cfg(feature = "python")]
pub mod python;

// Re-export main types for convenience
pub use affix::{find_split_affix, fix_split_affix};
pub use chunker::{Chunk, Chunker};
pub use cleanup::{clean_pair, cleaning_pipeline, CleanupService};
pub use config::Config;
pub use en::{en_sent_tokenize, en_word_tokenize, oov_rate};
pub use error::{Error, Result};
pub use lang::{sent_tokenize, Lang, SentTokenizer};
pub use marker::{Marker, NoticeMarker, RankMarker};
pub use metric::{AlignmentMetric, CharLenRatioMetric, Scores, SimilarityMetric};
#[cfg(feature = "http")]
pub use oracle::HttpSimilarityOracle;
pub use oracle::{RetryingOracle, SimilarityOracle};
pub use pipeline::{BatchReport, DirSourceProvider, Pipeline, QcOutcome, SourceProvider};
pub use qc_log::{parse_failed_downloads, parse_ranks, RankEntry};
pub use reconcile::{reconcile, reconcile_lines, reconcile_pair};
pub use sentence::BoSentenceTokenizer;
pub use tm::{TextPair, TmId, TmRecord};
pub use token::{ChunkType, Token};
pub use tokenizer::{SyllableTokenizer, WordTokenizer};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
