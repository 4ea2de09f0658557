//! Parsing of QC run logs.
//!
//! A QC run logs one line per record, `TM0001 rank: 2, avg sim score: 0.61`,
//! and one error line per source text it could not fetch. These functions
//! recover both from the log files so that runs can be summarized or retried.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tm::TmId;

static RANK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(TM\d+)\s+rank: (\d+), avg sim score: ([\d.]+(?:[eE][-+]?\d+)?)")
        .expect("Invalid regex")
});

static FAILED_DOWNLOAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ERROR\b[^\n]*?Error in downloading ((?:TM|BO|EN)\d+)").expect("Invalid regex")
});

/// Outcome of QC on one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    /// The record
    pub tm_id: TmId,
    /// Document rank
    pub rank: usize,
    /// Mean score of the document
    pub score: f64,
}

/// The line QC logs for a record
pub fn rank_line(tm_id: &TmId, rank: usize, score: f64) -> String {
    format!("{} rank: {}, avg sim score: {}", tm_id, rank, score)
}

/// The line logged when a text cannot be fetched
pub fn failed_download_line(text_id: &str) -> String {
    format!("Error in downloading {}", text_id)
}

/// Every record rank found in `log`, in order
pub fn parse_ranks(log: &str) -> Vec<RankEntry> {
    RANK_LINE
        .captures_iter(log)
        .filter_map(|caps| {
            Some(RankEntry {
                tm_id: caps[1].parse().ok()?,
                rank: caps[2].parse().ok()?,
                score: caps[3].parse().ok()?,
            })
        })
        .collect()
}

/// Records whose text failed to download, in order of first failure.
///
/// Failures logged under a source text id (`BO0001`) are reported as the
/// owning record (`TM0001`).
pub fn parse_failed_downloads(log: &str) -> Vec<TmId> {
    let mut failed: Vec<TmId> = Vec::new();
    for caps in FAILED_DOWNLOAD.captures_iter(log) {
        let id = &caps[1];
        let tm_id = match id.parse::<TmId>() {
            Ok(tm_id) => tm_id,
            Err(_) => match TmId::from_text_id(id) {
                Ok(tm_id) => tm_id,
                Err(_) => continue,
            },
        };
        if !failed.contains(&tm_id) {
            failed.push(tm_id);
        }
    }
    failed
}

/// QC log files (`qc-*.log`) in `dir`, sorted by name
pub fn qc_log_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let pattern = dir.as_ref().join("qc-*.log");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Read and concatenate log files
pub fn read_logs(paths: &[PathBuf]) -> Result<String> {
    let mut logs = String::new();
    for path in paths {
        logs.push_str(&fs::read_to_string(path)?);
        if !logs.ends_with('\n') {
            logs.push('\n');
        }
    }
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LOG: &str = "\
2023-06-01 10:00:00,000 - INFO - Running QC on TM0001
2023-06-01 10:00:05,000 - INFO - TM0001 rank: 1, avg sim score: 0.7404
2023-06-01 10:00:06,000 - ERROR - Error in downloading TM0002
[2024-01-01T00:00:00Z ERROR tm_tools::pipeline] Error in downloading BO0003
[2024-01-01T00:00:01Z INFO  tm_tools::pipeline] TM0004 rank: 0, avg sim score: 0.91
[2024-01-01T00:00:02Z WARN  tm_tools::pipeline] Error in downloading EN0005
";

    #[test]
    fn test_parse_ranks() {
        let ranks = parse_ranks(LOG);
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks[0].tm_id.as_str(), "TM0001");
        assert_eq!(ranks[0].rank, 1);
        assert_eq!(ranks[0].score, 0.7404);
        assert_eq!(ranks[1].tm_id.as_str(), "TM0004");
    }

    #[test]
    fn test_parse_failed_downloads() {
        let failed: Vec<String> = parse_failed_downloads(LOG)
            .iter()
            .map(|id| id.to_string())
            .collect();
        // warnings are not failures
        assert_eq!(failed, vec!["TM0002", "TM0003"]);
    }

    #[test]
    fn test_failures_deduplicated() {
        let log = "ERROR Error in downloading BO0001\nERROR Error in downloading EN0001\n";
        assert_eq!(parse_failed_downloads(log).len(), 1);
    }

    #[test]
    fn test_lines_parse_back() {
        let id: TmId = "TM0042".parse().unwrap();
        let line = rank_line(&id, 3, 0.25);
        assert_eq!(line, "TM0042 rank: 3, avg sim score: 0.25");
        assert_eq!(parse_ranks(&line)[0].score, 0.25);

        let log = format!("ERROR {}", failed_download_line("EN0042"));
        assert_eq!(parse_failed_downloads(&log), vec![id]);
    }

    #[test]
    fn test_log_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("qc-2.log"), "TM0002 rank: 0, avg sim score: 1").unwrap();
        fs::write(dir.path().join("qc-1.log"), "TM0001 rank: 2, avg sim score: 0.5\n").unwrap();
        fs::write(dir.path().join("other.log"), "TM0003 rank: 2, avg sim score: 0.5\n").unwrap();

        let files = qc_log_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        let logs = read_logs(&files).unwrap();
        let ids: Vec<String> = parse_ranks(&logs).iter().map(|e| e.tm_id.to_string()).collect();
        assert_eq!(ids, vec!["TM0001", "TM0002"]);
    }
}
