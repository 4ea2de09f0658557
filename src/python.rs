//! Python bindings for tm-tools-rs using PyO3
//!
//! Exposes the segmenters, the affix repair and the reconciler to Python.

use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::affix;
use crate::en;
use crate::error::Error;
use crate::lang::{Lang, SentTokenizer};
use crate::reconcile as rec;
use crate::token::Token as RustToken;
use crate::tokenizer::{SyllableTokenizer, WordTokenizer};

fn to_py_err(e: Error) -> PyErr {
    match e {
        Error::UnsupportedLang(_) | Error::InvalidTmId(_) => {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string())
        }
        Error::Io(_) | Error::FileNotFound(_) => {
            PyErr::new::<pyo3::exceptions::PyIOError, _>(e.to_string())
        }
        _ => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()),
    }
}

fn parse_lang(lang: &str) -> PyResult<Lang> {
    lang.parse().map_err(to_py_err)
}

/// A Python-compatible Token class
#[pyclass(name = "Token")]
#[derive(Clone)]
pub struct PyToken {
    #[pyo3(get)]
    pub text: String,
    #[pyo3(get)]
    pub start: usize,
    #[pyo3(get)]
    pub len: usize,
    #[pyo3(get)]
    pub chunk_type: String,
    #[pyo3(get)]
    pub cleaned_text: Option<String>,
    #[pyo3(get)]
    pub syls: Vec<String>,
}

impl From<RustToken> for PyToken {
    fn from(t: RustToken) -> Self {
        PyToken {
            text: t.text,
            start: t.start,
            len: t.len,
            chunk_type: t.chunk_type.as_str().to_string(),
            cleaned_text: t.cleaned_text,
            syls: t.syls,
        }
    }
}

#[pymethods]
impl PyToken {
    fn __repr__(&self) -> String {
        format!("Token('{}', chunk_type='{}')", self.text, self.chunk_type)
    }

    fn __str__(&self) -> String {
        self.text.clone()
    }

    /// Convert to dictionary
    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict = PyDict::new_bound(py);
        dict.set_item("text", &self.text)?;
        dict.set_item("start", self.start)?;
        dict.set_item("len", self.len)?;
        dict.set_item("chunk_type", &self.chunk_type)?;
        dict.set_item("cleaned_text", &self.cleaned_text)?;
        dict.set_item("syls", &self.syls)?;
        Ok(dict)
    }
}

/// Split text into syllable tokens (no dictionary)
///
/// Args:
///     text: The Tibetan text to tokenize
///
/// Returns:
///     List of Token objects
#[pyfunction]
fn tokenize_syllables(text: &str) -> Vec<PyToken> {
    SyllableTokenizer
        .tokenize(text)
        .into_iter()
        .map(PyToken::from)
        .collect()
}

/// Split Tibetan text into one sentence per line
///
/// Example:
///     >>> from tm_tools import bo_sent_tokenize
///     >>> bo_sent_tokenize("ཀ་ཁ། ག་ང།")
///     'ཀ་ཁ།\nག་ང།\n'
#[pyfunction]
fn bo_sent_tokenize(text: &str) -> PyResult<String> {
    SentTokenizer::new(SyllableTokenizer)
        .sent_tokenize(text, Lang::Bo)
        .map_err(to_py_err)
}

/// Split English text into one sentence per line
#[pyfunction]
fn en_sent_tokenize(text: &str) -> String {
    en::en_sent_tokenize(text)
}

/// Sentence-tokenize text in `lang` ("bo" or "en")
///
/// Raises:
///     ValueError: for any other language code
#[pyfunction]
fn sent_tokenize(text: &str, lang: &str) -> PyResult<String> {
    let lang = parse_lang(lang)?;
    SentTokenizer::new(SyllableTokenizer)
        .sent_tokenize(text, lang)
        .map_err(to_py_err)
}

/// Occurrences of a genitive affix split off its stem
#[pyfunction]
fn find_split_affix(text: &str) -> Vec<String> {
    affix::find_split_affix(text)
        .into_iter()
        .map(String::from)
        .collect()
}

/// Re-attach genitive affixes split off their stem
#[pyfunction]
fn fix_split_affix(text: &str) -> String {
    affix::fix_split_affix(text)
}

/// Restore the wording of `source` into the line breaks of `working`
///
/// Args:
///     source: Unsegmented source text
///     working: Sentence-per-line text whose breaks are kept
///     lang: "bo" or "en"
///
/// Returns:
///     The source text, one segment per line of `working`
#[pyfunction]
#[pyo3(signature = (source, working, lang="en"))]
fn reconcile(source: &str, working: &str, lang: &str) -> PyResult<String> {
    let lang = parse_lang(lang)?;
    Ok(rec::reconcile(source, working, lang))
}

/// Create the Python module
#[pymodule]
fn tm_tools(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyToken>()?;
    m.add_function(wrap_pyfunction!(tokenize_syllables, m)?)?;
    m.add_function(wrap_pyfunction!(bo_sent_tokenize, m)?)?;
    m.add_function(wrap_pyfunction!(en_sent_tokenize, m)?)?;
    m.add_function(wrap_pyfunction!(sent_tokenize, m)?)?;
    m.add_function(wrap_pyfunction!(find_split_affix, m)?)?;
    m.add_function(wrap_pyfunction!(fix_split_affix, m)?)?;
    m.add_function(wrap_pyfunction!(reconcile, m)?)?;

    // Add version
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
