//! Step addresses
//!
//! An address names a location inside a configuration document: a file name
//! plus a structural path made of `/`-separated mapping keys and
//! bracket-enclosed list indices. The fifth element of the `bar` key of the
//! third element of the `foo` key in `spam.yaml` renders as
//! `spam.yaml:/foo[3]/bar[5]`.
//!
//! Addresses are immutable; [`StepAddress::key`], [`StepAddress::idx`] and
//! [`StepAddress::extend`] return derived addresses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single structural path element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Mapping key, rendered as `/key`
    Key(String),
    /// Sequence index, rendered as `[idx]`
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "/{}", key),
            PathSegment::Index(idx) => write!(f, "[{}]", idx),
        }
    }
}

/// Location of a configuration item, used for error attribution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepAddress {
    filename: String,
    #[serde(default)]
    path: String,
}

impl StepAddress {
    /// Create an address pointing at the root of a file
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            path: String::new(),
        }
    }

    /// Create an address with an already rendered initial path
    pub fn with_path(filename: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            path: path.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Derive the address of a mapping key below this one
    pub fn key(&self, key: &str) -> Self {
        self.extend([PathSegment::from(key)])
    }

    /// Derive the address of a list element below this one
    pub fn idx(&self, idx: usize) -> Self {
        self.extend([PathSegment::Index(idx)])
    }

    /// Derive an address by appending several path segments at once
    ///
    /// Useful when a validator reports the location of a problem as a list
    /// of keys and indices relative to the item being validated.
    pub fn extend<I>(&self, segments: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PathSegment>,
    {
        let mut path = self.path.clone();
        for segment in segments {
            path.push_str(&segment.into().to_string());
        }

        Self {
            filename: self.filename.clone(),
            path,
        }
    }
}

impl fmt::Display for StepAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.path)
    }
}
