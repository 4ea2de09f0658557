//! Configuration for the TM tools.
//!
//! Loaded from a TOML file; every key is optional and falls back to the
//! defaults below.
//!
//! ```toml
//! data_path = "/srv/monlam/data"
//! workers = 8
//!
//! [similarity]
//! endpoint = "http://localhost:8000/similarity"
//! threshold = 0.75
//!
//! [marker]
//! notice_sign = "!"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::marker::{NoticeMarker, RankMarker};
use crate::metric::CharLenRatioMetric;

/// Default data directory: `~/.monlamAI/data`
pub fn default_data_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".monlamAI")
        .join("data")
}

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the local data.
    pub data_path: PathBuf,

    /// Source text directories, one per text id.
    /// Default: `data_path/texts`.
    pub texts_path: Option<PathBuf>,

    /// TM record directories, one per TM id.
    /// Default: `data_path/TMs`.
    pub tms_path: Option<PathBuf>,

    /// Size of the worker pool.
    /// Default: 0 (one worker per core).
    pub workers: usize,

    /// Similarity metric and oracle.
    pub similarity: SimilarityConfig,

    /// Length-ratio metric.
    pub char_len: CharLenConfig,

    /// Review markers.
    pub marker: MarkerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            texts_path: None,
            tms_path: None,
            workers: 0,
            similarity: SimilarityConfig::default(),
            char_len: CharLenConfig::default(),
            marker: MarkerConfig::default(),
        }
    }
}

impl Config {
    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let config: Config = toml::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, the defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        let sim = &self.similarity;
        if !(0.0..=1.0).contains(&sim.threshold) {
            return Err(Error::Config(format!(
                "similarity.threshold must be within [0, 1], got {}",
                sim.threshold
            )));
        }
        if sim.max_ranks == 0 {
            return Err(Error::Config("similarity.max_ranks must be positive".into()));
        }
        if sim.batch_size == Some(0) {
            return Err(Error::Config("similarity.batch_size must be positive".into()));
        }
        let len = &self.char_len;
        if len.avg_ratio <= 0.0 || len.lower_bound > len.upper_bound {
            return Err(Error::Config(format!(
                "char_len needs avg_ratio > 0 and lower_bound <= upper_bound, got {:?}",
                len
            )));
        }
        self.marker.rank_marker()?;
        Ok(())
    }

    /// Directory of source texts
    pub fn texts_path(&self) -> PathBuf {
        self.texts_path
            .clone()
            .unwrap_or_else(|| self.data_path.join("texts"))
    }

    /// Directory of TM records
    pub fn tms_path(&self) -> PathBuf {
        self.tms_path
            .clone()
            .unwrap_or_else(|| self.data_path.join("TMs"))
    }
}

/// Similarity metric and oracle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// URL of the similarity service.
    /// Default: None (similarity QC unavailable).
    pub endpoint: Option<String>,

    /// Scores at or above this are rank 0.
    /// Default: 0.8.
    pub threshold: f64,

    /// Rank divisor.
    /// Default: 3.
    pub max_ranks: usize,

    /// Pairs per oracle call.
    /// Default: None (whole document).
    pub batch_size: Option<usize>,

    /// Retries after a rate-limit rejection.
    /// Default: 5.
    pub max_retries: u32,

    /// Delay between retries, in seconds.
    /// Default: 5.
    pub retry_delay_secs: u64,

    /// Request timeout, in seconds.
    /// Default: 60.
    pub timeout_secs: u64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            threshold: 0.8,
            max_ranks: 3,
            batch_size: None,
            max_retries: 5,
            retry_delay_secs: 5,
            timeout_secs: 60,
        }
    }
}

impl SimilarityConfig {
    /// Delay between retries
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Length-ratio metric configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharLenConfig {
    /// Expected en/bo length ratio.
    /// Default: 1.67.
    pub avg_ratio: f64,

    /// Default: 0.2.
    pub lower_bound: f64,

    /// Default: 2.0.
    pub upper_bound: f64,
}

impl Default for CharLenConfig {
    fn default() -> Self {
        let metric = CharLenRatioMetric::default();
        Self {
            avg_ratio: metric.avg_ratio,
            lower_bound: metric.lower_bound,
            upper_bound: metric.upper_bound,
        }
    }
}

impl CharLenConfig {
    /// Build the metric
    pub fn metric(&self) -> CharLenRatioMetric {
        CharLenRatioMetric::new(self.avg_ratio, self.lower_bound, self.upper_bound)
    }
}

/// Review marker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Sign repeated by the notice marker.
    /// Default: "*".
    pub notice_sign: String,

    /// Ten rank glyphs replacing the keycap digits.
    /// Default: None.
    pub palette: Option<Vec<String>>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            notice_sign: "*".to_string(),
            palette: None,
        }
    }
}

impl MarkerConfig {
    /// Rank marker with the configured palette
    pub fn rank_marker(&self) -> Result<RankMarker> {
        match &self.palette {
            Some(palette) => RankMarker::with_palette(palette.clone()),
            None => Ok(RankMarker::default()),
        }
    }

    /// Notice marker with the configured sign
    pub fn notice_marker(&self) -> NoticeMarker {
        NoticeMarker::new(&self.notice_sign)
    }
}
