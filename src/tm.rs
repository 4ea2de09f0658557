//! Translation-memory records on disk.
//!
//! A TM record is a directory holding `{tm_id}-bo.txt` and `{tm_id}-en.txt`,
//! sentence-per-line and always with the same number of lines. Records are
//! rewritten wholesale: both files are written next to the originals and only
//! renamed into place once both writes succeeded.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lang::Lang;
use crate::sentence::sentence_lines;

/// Id of a TM record, `TM` followed by digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TmId(String);

impl TmId {
    /// The digits after the prefix
    pub fn number(&self) -> &str {
        &self.0[2..]
    }

    /// Id of the source text in `lang`: `TM0001` gives `BO0001` / `EN0001`
    pub fn text_id(&self, lang: Lang) -> String {
        format!("{}{}", lang.text_id_prefix(), self.number())
    }

    /// TM id owning a source text id
    pub fn from_text_id(text_id: &str) -> Result<Self> {
        let number = Lang::ALL
            .iter()
            .find_map(|lang| text_id.strip_prefix(lang.text_id_prefix()))
            .ok_or_else(|| Error::InvalidTmId(text_id.to_string()))?;
        format!("TM{}", number).parse()
    }

    /// Borrow as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TmId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.strip_prefix("TM") {
            Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
                Ok(TmId(s.to_string()))
            }
            _ => Err(Error::InvalidTmId(s.to_string())),
        }
    }
}

impl TryFrom<String> for TmId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TmId> for String {
    fn from(id: TmId) -> Self {
        id.0
    }
}

impl fmt::Display for TmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two sentence-per-line texts of a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPair {
    /// Tibetan side
    pub bo: String,
    /// English side
    pub en: String,
}

impl TextPair {
    /// Build a pair from sentence lists
    pub fn from_lines(bo: &[String], en: &[String]) -> Self {
        TextPair {
            bo: bo.join("\n"),
            en: en.join("\n"),
        }
    }

    /// Tibetan sentences
    pub fn bo_lines(&self) -> Vec<String> {
        sentence_lines(&self.bo).into_iter().map(String::from).collect()
    }

    /// English sentences
    pub fn en_lines(&self) -> Vec<String> {
        sentence_lines(&self.en).into_iter().map(String::from).collect()
    }

    /// Text of one side
    pub fn side(&self, lang: Lang) -> &str {
        match lang {
            Lang::Bo => &self.bo,
            Lang::En => &self.en,
        }
    }

    /// Fail unless both sides have the same number of lines
    pub fn check_line_counts(&self) -> Result<usize> {
        let bo = sentence_lines(&self.bo).len();
        let en = sentence_lines(&self.en).len();
        if bo != en {
            return Err(Error::SegmentCountMismatch { bo, en });
        }
        Ok(bo)
    }
}

/// A TM record directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmRecord {
    dir: PathBuf,
    id: TmId,
}

impl TmRecord {
    /// Record `id` stored in `dir`
    pub fn new<P: AsRef<Path>>(dir: P, id: TmId) -> Self {
        TmRecord {
            dir: dir.as_ref().to_path_buf(),
            id,
        }
    }

    /// Record `id` stored in `tms_path/<id>`
    pub fn in_collection<P: AsRef<Path>>(tms_path: P, id: TmId) -> Self {
        let dir = tms_path.as_ref().join(id.as_str());
        TmRecord { dir, id }
    }

    /// The record's id
    pub fn id(&self) -> &TmId {
        &self.id
    }

    /// The record's directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `lang`
    pub fn path(&self, lang: Lang) -> PathBuf {
        self.dir.join(format!("{}-{}.txt", self.id, lang.code()))
    }

    /// Path of the Tibetan file
    pub fn bo_path(&self) -> PathBuf {
        self.path(Lang::Bo)
    }

    /// Path of the English file
    pub fn en_path(&self) -> PathBuf {
        self.path(Lang::En)
    }

    /// Whether both files exist
    pub fn exists(&self) -> bool {
        self.bo_path().is_file() && self.en_path().is_file()
    }

    fn read_side(&self, lang: Lang) -> Result<String> {
        let path = self.path(lang);
        if !path.is_file() {
            return Err(Error::FileNotFound(path));
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Read both texts
    pub fn read_pair(&self) -> Result<TextPair> {
        Ok(TextPair {
            bo: self.read_side(Lang::Bo)?,
            en: self.read_side(Lang::En)?,
        })
    }

    /// Replace both texts.
    ///
    /// Nothing is written unless the line counts match, and the originals are
    /// only replaced once both new files are on disk. If the English file
    /// cannot be replaced, the previous Tibetan file is put back.
    pub fn write_pair(&self, pair: &TextPair) -> Result<()> {
        let lines = pair.check_line_counts()?;
        fs::create_dir_all(&self.dir)?;

        let staged = [
            (self.bo_path(), &pair.bo),
            (self.en_path(), &pair.en),
        ]
        .map(|(path, text)| (path.with_extension("txt.tmp"), path, text));

        for (tmp, _, text) in &staged {
            if let Err(e) = fs::write(tmp, text.as_bytes()) {
                for (tmp, _, _) in &staged {
                    let _ = fs::remove_file(tmp);
                }
                return Err(e.into());
            }
        }
        let discard = |paths: &[&PathBuf]| {
            for path in paths {
                let _ = fs::remove_file(path);
            }
        };
        let [(bo_tmp, bo_path, _), (en_tmp, en_path, _)] = &staged;

        let backup = bo_path.with_extension("txt.bak");
        let had_bo = bo_path.exists();
        if had_bo {
            if let Err(e) = fs::rename(bo_path, &backup) {
                discard(&[bo_tmp, en_tmp]);
                return Err(e.into());
            }
        }
        let restore = || {
            if had_bo {
                if let Err(e) = fs::rename(&backup, bo_path) {
                    error!(
                        "{}: could not restore {} from {}: {}",
                        self.id,
                        bo_path.display(),
                        backup.display(),
                        e
                    );
                }
            } else {
                let _ = fs::remove_file(bo_path);
            }
        };

        if let Err(e) = fs::rename(bo_tmp, bo_path) {
            restore();
            discard(&[bo_tmp, en_tmp]);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(en_tmp, en_path) {
            warn!(
                "{}: {} not replaced, restoring {}",
                self.id,
                en_path.display(),
                bo_path.display()
            );
            restore();
            discard(&[en_tmp]);
            return Err(e.into());
        }
        if had_bo {
            let _ = fs::remove_file(&backup);
        }

        debug!("{}: wrote {} lines per side", self.id, lines);
        Ok(())
    }
}

/// All records found under `tms_path` (directories named like a TM id)
pub fn list_records<P: AsRef<Path>>(tms_path: P) -> Result<Vec<TmRecord>> {
    let mut records = Vec::new();
    for entry in fs::read_dir(tms_path.as_ref())? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Ok(id) = entry.file_name().to_string_lossy().parse::<TmId>() {
            records.push(TmRecord::new(entry.path(), id));
        }
    }
    records.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tm(id: &str) -> TmId {
        id.parse().unwrap()
    }

    #[test]
    fn test_parse_tm_id() {
        assert_eq!(tm("TM0001").as_str(), "TM0001");
        assert_eq!(tm(" TM12 ").number(), "12");
        for bad in ["", "TM", "BO0001", "TM12a", "tm0001"] {
            assert!(matches!(bad.parse::<TmId>(), Err(Error::InvalidTmId(_))), "{}", bad);
        }
    }

    #[test]
    fn test_text_ids() {
        let id = tm("TM0001");
        assert_eq!(id.text_id(Lang::Bo), "BO0001");
        assert_eq!(id.text_id(Lang::En), "EN0001");
        assert_eq!(TmId::from_text_id("BO0001").unwrap(), id);
        assert_eq!(TmId::from_text_id("EN0001").unwrap(), id);
        assert!(TmId::from_text_id("ZH0001").is_err());
    }

    #[test]
    fn test_tm_id_serde() {
        let json = serde_json::to_string(&tm("TM0042")).unwrap();
        assert_eq!(json, "\"TM0042\"");
        assert!(serde_json::from_str::<TmId>("\"XX1\"").is_err());
    }

    #[test]
    fn test_file_layout() {
        let record = TmRecord::in_collection("/data/TMs", tm("TM0001"));
        assert_eq!(record.bo_path(), PathBuf::from("/data/TMs/TM0001/TM0001-bo.txt"));
        assert_eq!(record.en_path(), PathBuf::from("/data/TMs/TM0001/TM0001-en.txt"));
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let record = TmRecord::new(dir.path(), tm("TM0001"));
        let pair = TextPair {
            bo: "ཀ།\nཁ།".to_string(),
            en: "A.\nB.".to_string(),
        };
        record.write_pair(&pair).unwrap();

        assert!(record.exists());
        assert_eq!(record.read_pair().unwrap(), pair);
        assert!(!record.bo_path().with_extension("txt.tmp").exists());
    }

    #[test]
    fn test_mismatch_leaves_files_untouched() {
        let dir = TempDir::new().unwrap();
        let record = TmRecord::new(dir.path(), tm("TM0001"));
        let original = TextPair {
            bo: "ཀ།\nཁ།".to_string(),
            en: "A.\nB.".to_string(),
        };
        record.write_pair(&original).unwrap();

        let bad = TextPair {
            bo: "ཀ།".to_string(),
            en: "A.\nB.".to_string(),
        };
        assert!(matches!(
            record.write_pair(&bad),
            Err(Error::SegmentCountMismatch { bo: 1, en: 2 })
        ));
        assert_eq!(record.read_pair().unwrap(), original);
    }

    #[test]
    fn test_failed_en_replace_restores_bo() {
        let dir = TempDir::new().unwrap();
        let record = TmRecord::new(dir.path(), tm("TM0001"));
        fs::write(record.bo_path(), "ཀ།").unwrap();
        // a non-empty directory where the English file belongs cannot be replaced
        fs::create_dir_all(record.en_path().join("blocked")).unwrap();

        let pair = TextPair {
            bo: "ཁ།".to_string(),
            en: "B.".to_string(),
        };
        assert!(record.write_pair(&pair).is_err());
        assert_eq!(fs::read_to_string(record.bo_path()).unwrap(), "ཀ།");

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp") || name.ends_with(".bak"))
            .collect();
        assert!(leftovers.is_empty(), "{:?}", leftovers);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let record = TmRecord::new(dir.path(), tm("TM0001"));
        assert!(matches!(record.read_pair(), Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_line_counts_ignore_trailing_newline() {
        let pair = TextPair {
            bo: "ཀ།\nཁ།\n".to_string(),
            en: "A.\nB.".to_string(),
        };
        assert_eq!(pair.check_line_counts().unwrap(), 2);
        assert_eq!(pair.bo_lines(), vec!["ཀ།", "ཁ།"]);
    }

    #[test]
    fn test_list_records() {
        let dir = TempDir::new().unwrap();
        for name in ["TM0002", "TM0001", "notes"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("TM0003"), "a file").unwrap();

        let ids: Vec<String> = list_records(dir.path())
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["TM0001", "TM0002"]);
    }
}
