//! Alignment quality metrics.
//!
//! A metric scores every (bo, en) sentence pair of a document, maps each
//! score to a discrete rank and ranks the document as a whole. Rank 0 (for the
//! similarity metric) or 1 (for the length-ratio metric) means the pair looks
//! aligned; higher ranks mean increasing suspicion of misalignment.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::oracle::{check_scores, SimilarityOracle};

/// Rank given to a pair whose score cannot be computed
pub const MAX_RANK: usize = 9;

/// Output of a metric over one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    /// Rank of every pair
    pub ranks: Vec<usize>,
    /// Score of every pair
    pub scores: Vec<f64>,
    /// Rank of the whole document
    pub overall_rank: usize,
    /// Mean score of the document
    pub overall_score: f64,
}

/// Scores sentence pairs. Implementations differ only in how a pair is scored.
pub trait AlignmentMetric: Send + Sync {
    /// Score `bo[i]` against `en[i]` for every `i`
    fn score(&self, bo: &[String], en: &[String]) -> Result<Scores>;

    /// Rank considered acceptable
    fn acceptable_rank(&self) -> usize;
}

fn check_pairs(bo: &[String], en: &[String]) -> Result<()> {
    if bo.len() != en.len() {
        return Err(Error::SegmentCountMismatch {
            bo: bo.len(),
            en: en.len(),
        });
    }
    if bo.is_empty() {
        return Err(Error::EmptyDocument);
    }
    Ok(())
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Ranks pairs by their embedding similarity
#[derive(Debug, Clone)]
pub struct SimilarityMetric<O> {
    oracle: O,
    threshold: f64,
    max_ranks: usize,
    batch_size: Option<usize>,
}

impl<O: SimilarityOracle> SimilarityMetric<O> {
    /// Default similarity threshold
    pub const DEFAULT_THRESHOLD: f64 = 0.8;
    /// Default rank divisor
    pub const DEFAULT_MAX_RANKS: usize = 3;

    /// Create a metric with the default threshold and rank divisor
    pub fn new(oracle: O) -> Self {
        Self::with_params(oracle, Self::DEFAULT_THRESHOLD, Self::DEFAULT_MAX_RANKS)
    }

    /// Create a metric with custom threshold and rank divisor
    pub fn with_params(oracle: O, threshold: f64, max_ranks: usize) -> Self {
        SimilarityMetric {
            oracle,
            threshold,
            max_ranks: max_ranks.max(1),
            batch_size: None,
        }
    }

    /// Send at most `batch_size` pairs per oracle call instead of the whole document
    pub fn batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.batch_size = batch_size.filter(|&n| n > 0);
        self
    }

    /// Rank of a similarity score: 0 at or above the threshold
    pub fn rank(&self, score: f64) -> usize {
        if score.is_nan() {
            return MAX_RANK;
        }
        let score = score.clamp(0.0, 1.0);
        if score >= self.threshold {
            return 0;
        }
        ((self.threshold - score) / self.max_ranks as f64 * 10.0).ceil() as usize
    }

    fn similarities(&self, bo: &[String], en: &[String]) -> Result<Vec<f64>> {
        let size = self.batch_size.unwrap_or(bo.len());
        let mut scores = Vec::with_capacity(bo.len());
        for (bo_batch, en_batch) in bo.chunks(size).zip(en.chunks(size)) {
            let batch = self.oracle.similarity(bo_batch, en_batch)?;
            scores.extend(check_scores(bo_batch.len(), batch)?);
        }
        Ok(scores)
    }
}

impl<O: SimilarityOracle> AlignmentMetric for SimilarityMetric<O> {
    fn score(&self, bo: &[String], en: &[String]) -> Result<Scores> {
        check_pairs(bo, en)?;

        let scores = self.similarities(bo, en)?;
        let ranks: Vec<usize> = scores.iter().map(|&s| self.rank(s)).collect();
        let overall_score = mean(scores.iter().copied());
        debug!("similarity of {} pairs, mean {:.4}", scores.len(), overall_score);

        Ok(Scores {
            ranks,
            scores,
            overall_rank: self.rank(overall_score),
            overall_score,
        })
    }

    fn acceptable_rank(&self) -> usize {
        0
    }
}

/// Ranks pairs by how far their length ratio strays from the expected one.
///
/// Lengths are counted in characters. A pair with an empty Tibetan side gets
/// an infinite ratio and [`MAX_RANK`]; it is left out of the document mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharLenRatioMetric {
    /// Expected en/bo length ratio
    pub avg_ratio: f64,
    /// Lowest acceptable normalized ratio
    pub lower_bound: f64,
    /// Highest acceptable normalized ratio
    pub upper_bound: f64,
}

impl Default for CharLenRatioMetric {
    fn default() -> Self {
        CharLenRatioMetric {
            avg_ratio: 1.67,
            lower_bound: 0.2,
            upper_bound: 2.0,
        }
    }
}

impl CharLenRatioMetric {
    /// Create a metric
    pub fn new(avg_ratio: f64, lower_bound: f64, upper_bound: f64) -> Self {
        CharLenRatioMetric {
            avg_ratio,
            lower_bound,
            upper_bound,
        }
    }

    /// Normalized length ratio of one pair
    pub fn ratio(&self, bo: &str, en: &str) -> f64 {
        let bo_len = bo.chars().count();
        if bo_len == 0 {
            return f64::INFINITY;
        }
        en.chars().count() as f64 / bo_len as f64 / self.avg_ratio
    }

    /// Rank of a normalized ratio: 1 within bounds, 2 below, its ceiling above
    pub fn rank(&self, ratio: f64) -> usize {
        if !ratio.is_finite() {
            return MAX_RANK;
        }
        if ratio < self.lower_bound {
            2
        } else if ratio <= self.upper_bound {
            1
        } else {
            (ratio.ceil() as usize).min(MAX_RANK)
        }
    }
}

impl AlignmentMetric for CharLenRatioMetric {
    fn score(&self, bo: &[String], en: &[String]) -> Result<Scores> {
        check_pairs(bo, en)?;

        let scores: Vec<f64> = bo
            .iter()
            .zip(en)
            .map(|(b, e)| self.ratio(b, e))
            .collect();
        let ranks = scores.iter().map(|&r| self.rank(r)).collect();
        let overall_score = mean(scores.iter().copied().filter(|s| s.is_finite()));

        Ok(Scores {
            ranks,
            scores,
            overall_rank: self.rank(overall_score),
            overall_score,
        })
    }

    fn acceptable_rank(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns fixed scores, in order
    struct FixedOracle(Vec<f64>);

    impl SimilarityOracle for FixedOracle {
        fn similarity(&self, batch1: &[String], _batch2: &[String]) -> Result<Vec<f64>> {
            Ok(self.0[..batch1.len()].to_vec())
        }
    }

    /// Records the size of every batch
    struct CountingOracle(std::sync::Mutex<Vec<usize>>);

    impl SimilarityOracle for CountingOracle {
        fn similarity(&self, batch1: &[String], _batch2: &[String]) -> Result<Vec<f64>> {
            self.0.lock().unwrap().push(batch1.len());
            Ok(vec![0.9; batch1.len()])
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_similarity_rank() {
        let metric = SimilarityMetric::new(FixedOracle(vec![]));
        assert_eq!(metric.rank(0.7404), 1);
        assert_eq!(metric.rank(0.8), 0);
        assert_eq!(metric.rank(0.95), 0);
        assert_eq!(metric.rank(0.6), 1);
        assert_eq!(metric.rank(0.0), 3);
        // clamped to 0 before ranking
        assert_eq!(metric.rank(-0.6), 3);
        assert_eq!(metric.rank(f64::NAN), MAX_RANK);
    }

    #[test]
    fn test_similarity_rejects_nan_scores() {
        let metric = SimilarityMetric::new(FixedOracle(vec![0.9, f64::NAN]));
        assert!(matches!(
            metric.score(&strings(&["a", "b"]), &strings(&["x", "y"])),
            Err(Error::Oracle(_))
        ));
    }

    #[test]
    fn test_similarity_rank_monotonic() {
        let metric = SimilarityMetric::new(FixedOracle(vec![]));
        let mut previous = metric.rank(-1.0);
        for i in -100..=100 {
            let rank = metric.rank(i as f64 / 100.0);
            assert!(rank <= previous);
            previous = rank;
        }
    }

    #[test]
    fn test_similarity_overall_is_rank_of_mean() {
        let metric = SimilarityMetric::new(FixedOracle(vec![1.0, 0.1]));
        let scores = metric.score(&strings(&["a", "b"]), &strings(&["x", "y"])).unwrap();
        assert_eq!(scores.ranks, vec![0, 3]);
        assert!((scores.overall_score - 0.55).abs() < 1e-9);
        assert_eq!(scores.overall_rank, 1);
    }

    #[test]
    fn test_similarity_batching() {
        let oracle = CountingOracle(std::sync::Mutex::new(Vec::new()));
        let metric = SimilarityMetric::new(oracle).batch_size(Some(2));
        let bo = strings(&["a", "b", "c", "d", "e"]);
        let scores = metric.score(&bo, &bo).unwrap();
        assert_eq!(scores.scores.len(), 5);
        assert_eq!(*metric.oracle.0.lock().unwrap(), vec![2, 2, 1]);

        let oracle = CountingOracle(std::sync::Mutex::new(Vec::new()));
        let metric = SimilarityMetric::new(oracle);
        metric.score(&bo, &bo).unwrap();
        assert_eq!(*metric.oracle.0.lock().unwrap(), vec![5]);
    }

    #[test]
    fn test_similarity_short_answer() {
        struct ShortOracle;
        impl SimilarityOracle for ShortOracle {
            fn similarity(&self, _: &[String], _: &[String]) -> Result<Vec<f64>> {
                Ok(vec![0.9])
            }
        }
        let metric = SimilarityMetric::new(ShortOracle);
        let pairs = strings(&["a", "b"]);
        assert!(matches!(metric.score(&pairs, &pairs), Err(Error::Oracle(_))));
    }

    #[test]
    fn test_mismatched_and_empty_documents() {
        let metric = CharLenRatioMetric::default();
        assert!(matches!(
            metric.score(&strings(&["a"]), &strings(&["a", "b"])),
            Err(Error::SegmentCountMismatch { bo: 1, en: 2 })
        ));
        assert!(matches!(metric.score(&[], &[]), Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_char_len_ranks() {
        let metric = CharLenRatioMetric::new(1.0, 0.0, 2.0);
        let scores = metric
            .score(
                &strings(&["**", "**", "**"]),
                &strings(&["****", "*", "**********"]),
            )
            .unwrap();
        assert_eq!(scores.ranks, vec![1, 1, 5]);
        assert_eq!(scores.scores, vec![2.0, 0.5, 5.0]);
    }

    #[test]
    fn test_char_len_below_lower_bound() {
        let metric = CharLenRatioMetric::default();
        assert_eq!(metric.rank(0.1), 2);
        assert_eq!(metric.rank(2.5), 3);
    }

    #[test]
    fn test_char_len_counts_chars() {
        let metric = CharLenRatioMetric::new(1.0, 0.0, 2.0);
        assert_eq!(metric.ratio("ཀཁ", "ab"), 1.0);
    }

    #[test]
    fn test_char_len_empty_bo() {
        let metric = CharLenRatioMetric::new(1.0, 0.0, 2.0);
        let scores = metric
            .score(&strings(&["", "**"]), &strings(&["abc", "**"]))
            .unwrap();
        assert_eq!(scores.ranks, vec![MAX_RANK, 1]);
        assert!(scores.scores[0].is_infinite());
        assert_eq!(scores.overall_score, 1.0);
        assert_eq!(scores.overall_rank, 1);
    }
}
