//! Watchman-style filter expressions.

use std::path::Path;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// File type term values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Regular,
    Directory,
    Symlink,
}

impl FileType {
    /// Single-letter code used on the wire.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Regular => "f",
            Self::Directory => "d",
            Self::Symlink => "l",
        }
    }
}

/// A filter expression evaluated by the watch service for each changed file.
///
/// Serializes to watchman's array form, e.g. `["allof", ["type", "f"], ["not", "empty"]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Every term must match.
    AllOf(Vec<Expression>),
    /// At least one term must match.
    AnyOf(Vec<Expression>),
    /// Negation of the inner term.
    Not(Box<Expression>),
    /// The file has the given type.
    Type(FileType),
    /// The file is empty (zero bytes, or a directory without entries).
    Empty,
    /// The file name ends in `.<suffix>`, compared case-insensitively.
    Suffix(String),
}

impl Expression {
    #[must_use]
    pub fn all_of(terms: impl IntoIterator<Item = Expression>) -> Self {
        Self::AllOf(terms.into_iter().collect())
    }

    #[must_use]
    pub fn any_of(terms: impl IntoIterator<Item = Expression>) -> Self {
        Self::AnyOf(terms.into_iter().collect())
    }

    #[must_use]
    pub fn not(term: Expression) -> Self {
        Self::Not(Box::new(term))
    }

    #[must_use]
    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self::Suffix(suffix.into())
    }

    /// Evaluate the expression against a file's current state.
    #[must_use]
    pub fn matches(&self, file: &FileSnapshot<'_>) -> bool {
        match self {
            Self::AllOf(terms) => terms.iter().all(|term| term.matches(file)),
            Self::AnyOf(terms) => terms.iter().any(|term| term.matches(file)),
            Self::Not(term) => !term.matches(file),
            Self::Type(file_type) => file.file_type == Some(*file_type),
            Self::Empty => file.exists() && file.empty,
            Self::Suffix(suffix) => has_suffix(file.name, suffix),
        }
    }
}

fn has_suffix(name: &Path, suffix: &str) -> bool {
    let Some(file_name) = name.file_name() else {
        return false;
    };
    let file_name = file_name.to_string_lossy().to_ascii_lowercase();
    let suffix = suffix.to_ascii_lowercase();
    file_name
        .strip_suffix(&suffix)
        .is_some_and(|stem| stem.len() > 1 && stem.ends_with('.'))
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::AllOf(terms) => serialize_compound(serializer, "allof", terms),
            Self::AnyOf(terms) => serialize_compound(serializer, "anyof", terms),
            Self::Not(term) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element("not")?;
                seq.serialize_element(term)?;
                seq.end()
            }
            Self::Type(file_type) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element("type")?;
                seq.serialize_element(file_type.code())?;
                seq.end()
            }
            Self::Empty => serializer.serialize_str("empty"),
            Self::Suffix(suffix) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element("suffix")?;
                seq.serialize_element(suffix)?;
                seq.end()
            }
        }
    }
}

fn serialize_compound<S: Serializer>(
    serializer: S,
    name: &str,
    terms: &[Expression],
) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(terms.len() + 1))?;
    seq.serialize_element(name)?;
    for term in terms {
        seq.serialize_element(term)?;
    }
    seq.end()
}

/// State of a changed file, as seen when the expression is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSnapshot<'a> {
    /// Path relative to the watch root.
    pub name: &'a Path,
    /// `None` when the file no longer exists.
    pub file_type: Option<FileType>,
    pub size: u64,
    pub empty: bool,
}

impl FileSnapshot<'_> {
    #[must_use]
    pub fn exists(&self) -> bool {
        self.file_type.is_some()
    }
}
