//! Batch drivers over TM records.
//!
//! Each driver processes a list of records on a worker pool. Records are
//! independent: one record failing is logged and reported, and never stops
//! the others. A failed record's files are left as they were.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::affix::{find_split_affix, fix_split_affix};
use crate::cleanup::clean_pair;
use crate::error::{Error, Result};
use crate::lang::{Lang, SentTokenizer};
use crate::marker::Marker;
use crate::metric::AlignmentMetric;
use crate::qc_log::{failed_download_line, rank_line};
use crate::reconcile::reconcile_pair;
use crate::sentence::sentence_lines;
use crate::tm::{TextPair, TmId, TmRecord};
use crate::tokenizer::WordTokenizer;

/// Where the unsegmented source of a text comes from
pub trait SourceProvider: Send + Sync {
    /// Source text of `text_id` (`BO0001`), with line breaks replaced by spaces
    fn source_text(&self, text_id: &str) -> Result<String>;
}

/// Sources stored as `texts_path/<TEXT_ID>/*.txt`; the first file by name is used
#[derive(Debug, Clone)]
pub struct DirSourceProvider {
    texts_path: PathBuf,
}

impl DirSourceProvider {
    /// Read sources under `texts_path`
    pub fn new<P: AsRef<Path>>(texts_path: P) -> Self {
        DirSourceProvider {
            texts_path: texts_path.as_ref().to_path_buf(),
        }
    }

    fn unavailable(text_id: &str, reason: impl Into<String>) -> Error {
        Error::SourceUnavailable {
            text_id: text_id.to_string(),
            reason: reason.into(),
        }
    }
}

impl SourceProvider for DirSourceProvider {
    fn source_text(&self, text_id: &str) -> Result<String> {
        let dir = self.texts_path.join(text_id);
        if !dir.is_dir() {
            return Err(Self::unavailable(
                text_id,
                format!("{} is not a directory", dir.display()),
            ));
        }

        let pattern = dir.join("*.txt");
        let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
            .filter_map(|entry| entry.ok())
            .collect();
        files.sort();
        let path = files
            .first()
            .ok_or_else(|| Self::unavailable(text_id, "no .txt file"))?;

        let text = fs::read_to_string(path)
            .map_err(|e| Self::unavailable(text_id, e.to_string()))?;
        Ok(text.replace("\r\n", " ").replace(['\n', '\r'], " "))
    }
}

/// Result of QC on one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcOutcome {
    /// Document rank
    pub rank: usize,
    /// Mean score
    pub score: f64,
    /// Number of pairs above the acceptable rank
    pub flagged: usize,
}

/// Outcome of every record of a batch, in input order
#[derive(Debug)]
pub struct BatchReport<T> {
    /// Per-record results
    pub outcomes: Vec<(TmId, Result<T>)>,
}

impl<T> BatchReport<T> {
    /// Records that succeeded, with their values
    pub fn succeeded(&self) -> impl Iterator<Item = (&TmId, &T)> {
        self.outcomes
            .iter()
            .filter_map(|(id, r)| r.as_ref().ok().map(|v| (id, v)))
    }

    /// Records that failed, with their errors
    pub fn failed(&self) -> impl Iterator<Item = (&TmId, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|(id, r)| r.as_ref().err().map(|e| (id, e)))
    }

    /// Number of failed records
    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    /// Whether every record succeeded
    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether the batch was empty
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Segment a raw text pair; rejected when the sides disagree on the sentence count
pub fn segment_pair<T: WordTokenizer>(
    tokenizer: &SentTokenizer<T>,
    bo_raw: &str,
    en_raw: &str,
) -> Result<TextPair> {
    let pair = TextPair {
        bo: tokenizer.sent_tokenize(bo_raw, Lang::Bo)?,
        en: tokenizer.sent_tokenize(en_raw, Lang::En)?,
    };
    pair.check_line_counts()?;
    Ok(TextPair::from_lines(&pair.bo_lines(), &pair.en_lines()))
}

/// Run QC on one record: strip old markers, score, mark and save
pub fn qc_record(
    record: &TmRecord,
    metric: &dyn AlignmentMetric,
    marker: &dyn Marker,
    verbose: bool,
) -> Result<QcOutcome> {
    info!("Running QC on {}", record.id());
    let pair = record.read_pair()?;
    pair.check_line_counts()?;

    let (bo, en) = marker.remove(&pair.bo_lines(), &pair.en_lines());
    let scores = metric.score(&bo, &en)?;
    let (bo_marked, en_marked) = marker.mark(&bo, &en, &scores.ranks)?;

    if verbose {
        for (((b, e), score), rank) in bo_marked
            .iter()
            .zip(&en_marked)
            .zip(&scores.scores)
            .zip(&scores.ranks)
        {
            info!("{} {} {} ||| {}", rank, score, b, e);
        }
    }

    record.write_pair(&TextPair::from_lines(&bo_marked, &en_marked))?;
    info!(
        "{}",
        rank_line(record.id(), scores.overall_rank, scores.overall_score)
    );

    let acceptable = metric.acceptable_rank();
    Ok(QcOutcome {
        rank: scores.overall_rank,
        score: scores.overall_score,
        flagged: scores.ranks.iter().filter(|&&r| r > acceptable).count(),
    })
}

fn fetch_source(sources: &dyn SourceProvider, text_id: &str) -> Result<String> {
    sources.source_text(text_id).map_err(|e| {
        error!("{}", failed_download_line(text_id));
        e
    })
}

/// Re-derive the record's wording from its sources, keeping its sentence breaks
pub fn reconcile_record(record: &TmRecord, sources: &dyn SourceProvider) -> Result<usize> {
    let bo_source = fetch_source(sources, &record.id().text_id(Lang::Bo))?;
    let en_source = fetch_source(sources, &record.id().text_id(Lang::En))?;

    let working = record.read_pair()?;
    let reconciled = reconcile_pair(&bo_source, &en_source, &working)?;
    let lines = reconciled.check_line_counts()?;
    if lines == 0 && !sentence_lines(&working.bo).is_empty() {
        warn!("{}: reconciliation produced an empty record", record.id());
    }

    record.write_pair(&reconciled)?;
    info!("{}: reconciled {} segments", record.id(), lines);
    Ok(lines)
}

/// Re-attach split genitive affixes in the Tibetan text; returns the number of repairs
pub fn fix_affix_record(record: &TmRecord) -> Result<usize> {
    let pair = record.read_pair()?;
    let found = find_split_affix(&pair.bo).len();
    if found == 0 {
        debug!("{}: no split affix", record.id());
        return Ok(0);
    }

    record.write_pair(&TextPair {
        bo: fix_split_affix(&pair.bo),
        en: pair.en,
    })?;
    info!("{}: fixed {} split affixes", record.id(), found);
    Ok(found)
}

/// Strip placeholders and template markup from both texts
pub fn clean_record(record: &TmRecord) -> Result<()> {
    let pair = record.read_pair()?;
    let cleaned = clean_pair(&pair)?;
    if cleaned != pair {
        record.write_pair(&cleaned)?;
        info!("{}: cleaned", record.id());
    }
    Ok(())
}

/// Runs drivers over a TM collection on a worker pool
pub struct Pipeline {
    tms_path: PathBuf,
    pool: rayon::ThreadPool,
}

impl Pipeline {
    /// Process records under `tms_path` with `workers` threads (0 = one per core)
    pub fn new<P: AsRef<Path>>(tms_path: P, workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| Error::Config(format!("cannot build worker pool: {}", e)))?;
        Ok(Pipeline {
            tms_path: tms_path.as_ref().to_path_buf(),
            pool,
        })
    }

    /// The TM collection
    pub fn tms_path(&self) -> &Path {
        &self.tms_path
    }

    /// Record of `id` in the collection
    pub fn record(&self, id: &TmId) -> TmRecord {
        TmRecord::in_collection(&self.tms_path, id.clone())
    }

    /// Apply `f` to every record. Each id is processed once, even if repeated.
    pub fn run<T, F>(&self, tm_ids: &[TmId], f: F) -> BatchReport<T>
    where
        T: Send,
        F: Fn(&TmRecord) -> Result<T> + Sync,
    {
        let mut ids: Vec<&TmId> = Vec::with_capacity(tm_ids.len());
        for id in tm_ids {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let outcomes: Vec<(TmId, Result<T>)> = self.pool.install(|| {
            ids.par_iter()
                .map(|&id| {
                    let outcome = f(&self.record(id));
                    if let Err(e) = &outcome {
                        error!("{}: {}", id, e);
                    }
                    (id.clone(), outcome)
                })
                .collect()
        });

        let report = BatchReport { outcomes };
        info!(
            "{} records processed, {} failed",
            report.len(),
            report.failure_count()
        );
        report
    }

    /// QC every record
    pub fn qc(
        &self,
        tm_ids: &[TmId],
        metric: &dyn AlignmentMetric,
        marker: &dyn Marker,
        verbose: bool,
    ) -> BatchReport<QcOutcome> {
        self.run(tm_ids, |record| qc_record(record, metric, marker, verbose))
    }

    /// Reconcile every record against its sources
    pub fn reconcile(&self, tm_ids: &[TmId], sources: &dyn SourceProvider) -> BatchReport<usize> {
        self.run(tm_ids, |record| reconcile_record(record, sources))
    }

    /// Repair split affixes in every record
    pub fn fix_affix(&self, tm_ids: &[TmId]) -> BatchReport<usize> {
        self.run(tm_ids, fix_affix_record)
    }

    /// Clean every record
    pub fn clean(&self, tm_ids: &[TmId]) -> BatchReport<()> {
        self.run(tm_ids, clean_record)
    }
}
