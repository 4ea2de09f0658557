//! Error types for the TM tools.
//!
//! Every failure is scoped to a single TM record: batch drivers log it, leave
//! the record's files untouched and move on to the next record.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for TM operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The golden source text used for reconciliation could not be fetched.
    #[error("source text {text_id} unavailable: {reason}")]
    SourceUnavailable {
        /// Text id of the missing source (e.g. `BO0001`).
        text_id: String,
        /// Why the source could not be read.
        reason: String,
    },

    /// bo/en line counts disagree. Never corrected by truncation.
    #[error("segment count mismatch: bo has {bo} lines, en has {en} lines")]
    SegmentCountMismatch {
        /// Number of Tibetan lines.
        bo: usize,
        /// Number of English lines.
        en: usize,
    },

    /// A rank list that does not have one rank per sentence pair.
    #[error("rank count mismatch: {pairs} pairs, {ranks} ranks")]
    RankCountMismatch {
        /// Number of sentence pairs.
        pairs: usize,
        /// Number of ranks.
        ranks: usize,
    },

    /// The similarity oracle rejected a call because of rate limiting.
    #[error("similarity oracle rate limited: {0}")]
    OracleRateLimited(String),

    /// The similarity oracle kept rate limiting after every retry.
    #[error("similarity oracle still rate limited after {attempts} attempts: {last}")]
    OracleRetriesExhausted {
        /// Number of calls made, including the first one.
        attempts: u32,
        /// Message of the last rejection.
        last: String,
    },

    /// The similarity oracle answered but broke its contract.
    #[error("similarity oracle error: {0}")]
    Oracle(String),

    /// The word tokenizer returned an empty or truncated stream.
    #[error("malformed token stream: {0}")]
    MalformedTokenStream(String),

    /// A document with no sentence pairs cannot be scored.
    #[error("cannot score an empty document")]
    EmptyDocument,

    /// A TM id that is not of the form `TM<digits>`.
    #[error("invalid TM id: {0}")]
    InvalidTmId(String),

    /// A language code other than `bo` or `en`.
    #[error("unsupported language: {0}")]
    UnsupportedLang(String),

    /// One of the two text files of a TM record is missing.
    #[error("TM file not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Glob pattern error.
    #[error("glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    /// HTTP transport error.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::OracleRateLimited(_))
    }
}

/// Result type alias for TM operations.
pub type Result<T> = std::result::Result<T, Error>;
