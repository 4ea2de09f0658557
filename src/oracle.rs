//! Sentence-embedding similarity oracle.
//!
//! The oracle is an external service that returns the cosine similarity of
//! each pair of sentences. It is the only rate-limited resource of the
//! pipeline, so calls are batched per document and rate-limit rejections are
//! retried a bounded number of times by [`RetryingOracle`].

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::warn;

use crate::error::{Error, Result};

/// Pairwise similarity of two equally long batches of sentences.
///
/// Scores are nominally in `[-1, 1]`; one score per pair, in order.
pub trait SimilarityOracle: Send + Sync {
    /// Compute the similarity of `batch1[i]` and `batch2[i]` for every `i`
    fn similarity(&self, batch1: &[String], batch2: &[String]) -> Result<Vec<f64>>;
}

impl<T: SimilarityOracle + ?Sized> SimilarityOracle for Arc<T> {
    fn similarity(&self, batch1: &[String], batch2: &[String]) -> Result<Vec<f64>> {
        (**self).similarity(batch1, batch2)
    }
}

impl<T: SimilarityOracle + ?Sized> SimilarityOracle for Box<T> {
    fn similarity(&self, batch1: &[String], batch2: &[String]) -> Result<Vec<f64>> {
        (**self).similarity(batch1, batch2)
    }
}

/// Make sure the oracle answered with one finite score per pair
pub fn check_scores(expected: usize, scores: Vec<f64>) -> Result<Vec<f64>> {
    if scores.len() != expected {
        return Err(Error::Oracle(format!(
            "expected {} scores, got {}",
            expected,
            scores.len()
        )));
    }
    if let Some(i) = scores.iter().position(|s| !s.is_finite()) {
        return Err(Error::Oracle(format!("score {} of pair {} is not a number", scores[i], i)));
    }
    Ok(scores)
}

/// Retries rate-limited calls with a fixed delay
#[derive(Debug, Clone)]
pub struct RetryingOracle<O> {
    inner: O,
    max_retries: u32,
    delay: Duration,
}

impl<O: SimilarityOracle> RetryingOracle<O> {
    /// Wrap `inner`, retrying at most `max_retries` times after the first call
    pub fn new(inner: O, max_retries: u32, delay: Duration) -> Self {
        RetryingOracle {
            inner,
            max_retries,
            delay,
        }
    }

    /// Get a reference to the wrapped oracle
    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: SimilarityOracle> SimilarityOracle for RetryingOracle<O> {
    fn similarity(&self, batch1: &[String], batch2: &[String]) -> Result<Vec<f64>> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.inner.similarity(batch1, batch2) {
                Err(e) if e.is_transient() => {
                    if attempts > self.max_retries {
                        return Err(Error::OracleRetriesExhausted {
                            attempts,
                            last: e.to_string(),
                        });
                    }
                    warn!("{}, retrying in {:?}", e, self.delay);
                    thread::sleep(self.delay);
                }
                result => return result,
            }
        }
    }
}

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use reqwest::StatusCode;
    use serde::{Deserialize, Serialize};

    use super::{check_scores, SimilarityOracle};
    use crate::error::{Error, Result};

    #[derive(Serialize)]
    struct SimilarityRequest<'a> {
        sentences1: &'a [String],
        sentences2: &'a [String],
    }

    #[derive(Deserialize)]
    struct SimilarityResponse {
        scores: Vec<f64>,
    }

    /// Oracle served over HTTP.
    ///
    /// POSTs `{"sentences1": [...], "sentences2": [...]}` and expects
    /// `{"scores": [...]}` back. HTTP 429 is reported as a rate limit.
    #[derive(Debug, Clone)]
    pub struct HttpSimilarityOracle {
        client: reqwest::blocking::Client,
        endpoint: String,
    }

    impl HttpSimilarityOracle {
        /// Create a client for `endpoint`
        pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .user_agent("tm-tools-rs")
                .timeout(timeout)
                .build()?;
            Ok(HttpSimilarityOracle {
                client,
                endpoint: endpoint.to_string(),
            })
        }

        /// The service URL
        pub fn endpoint(&self) -> &str {
            &self.endpoint
        }
    }

    impl SimilarityOracle for HttpSimilarityOracle {
        fn similarity(&self, batch1: &[String], batch2: &[String]) -> Result<Vec<f64>> {
            let response = self
                .client
                .post(&self.endpoint)
                .json(&SimilarityRequest {
                    sentences1: batch1,
                    sentences2: batch2,
                })
                .send()?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(Error::OracleRateLimited(format!("HTTP {}", status)));
            }
            if !status.is_success() {
                return Err(Error::Oracle(format!(
                    "similarity service returned status: {}",
                    status
                )));
            }

            let body: SimilarityResponse = response.json()?;
            check_scores(batch1.len(), body.scores)
        }
    }
}

#[cfg(feature = "http")]
pub use http::HttpSimilarityOracle;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Rate limited for the first `failures` calls, then returns 1.0 per pair
    struct FlakyOracle {
        failures: u32,
        calls: AtomicU32,
    }

    impl SimilarityOracle for FlakyOracle {
        fn similarity(&self, batch1: &[String], _batch2: &[String]) -> Result<Vec<f64>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(Error::OracleRateLimited("429".to_string()));
            }
            Ok(vec![1.0; batch1.len()])
        }
    }

    fn flaky(failures: u32) -> FlakyOracle {
        FlakyOracle {
            failures,
            calls: AtomicU32::new(0),
        }
    }

    fn batch() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    #[test]
    fn test_retry_then_succeed() {
        let oracle = RetryingOracle::new(flaky(2), 3, Duration::ZERO);
        assert_eq!(oracle.similarity(&batch(), &batch()).unwrap(), vec![1.0, 1.0]);
        assert_eq!(oracle.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_retries_exhausted() {
        let oracle = RetryingOracle::new(flaky(10), 2, Duration::ZERO);
        match oracle.similarity(&batch(), &batch()) {
            Err(Error::OracleRetriesExhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected exhausted retries, got {:?}", other),
        }
        assert_eq!(oracle.inner().calls.load(Ordering::SeqCst), 3);
    }

    struct BrokenOracle;

    impl SimilarityOracle for BrokenOracle {
        fn similarity(&self, _batch1: &[String], _batch2: &[String]) -> Result<Vec<f64>> {
            Err(Error::Oracle("boom".to_string()))
        }
    }

    #[test]
    fn test_permanent_error_not_retried() {
        let oracle = RetryingOracle::new(BrokenOracle, 5, Duration::from_secs(60));
        assert!(matches!(
            oracle.similarity(&batch(), &batch()),
            Err(Error::Oracle(_))
        ));
    }

    #[test]
    fn test_check_scores() {
        assert!(check_scores(2, vec![0.5, 0.5]).is_ok());
        assert!(matches!(check_scores(2, vec![0.5]), Err(Error::Oracle(_))));
        assert!(matches!(
            check_scores(2, vec![0.5, f64::NAN]),
            Err(Error::Oracle(_))
        ));
        assert!(matches!(
            check_scores(1, vec![f64::INFINITY]),
            Err(Error::Oracle(_))
        ));
    }
}
