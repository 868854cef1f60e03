//! Hierarchical WBS codes
//!
//! Provides [`WbsCode`], the dot-separated position string carried by every
//! work breakdown node (`1`, `2.1`, `2.1.3`, ...).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Dot-separated hierarchical position of a node
///
/// Codes are stored verbatim. Snapshots written by older tooling may contain
/// segments that are not integers; every numeric accessor treats such a
/// segment as `0` instead of failing, so code generation always terminates.
///
/// # Examples
/// - root node → `3`
/// - third child of `2.1` → `2.1.3`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WbsCode(String);

impl WbsCode {
    /// Wrap a raw code string without validation
    #[inline]
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Code of the `n`-th root node
    #[inline]
    #[must_use]
    pub fn root(n: u64) -> Self {
        Self(n.to_string())
    }

    /// Code of the `n`-th child below this code
    #[inline]
    #[must_use]
    pub fn child(&self, n: u64) -> Self {
        self.child_segment(&n.to_string())
    }

    /// Code with a raw segment appended
    ///
    /// Always `parent + "." + segment`, so a parent with an empty code yields
    /// `.n`, which can never equal a root code. Used when re-homing nodes
    /// whose historical segment is not numeric.
    #[inline]
    #[must_use]
    pub fn child_segment(&self, segment: &str) -> Self {
        Self(format!("{}.{}", self.0, segment))
    }

    /// Parse a code, requiring every segment to be a positive integer
    ///
    /// # Errors
    /// Returns error on empty input, empty segments or non-numeric segments
    pub fn parse_strict(s: &str) -> Result<Self, CodeError> {
        if s.is_empty() {
            return Err(CodeError::Empty);
        }

        for seg in s.split('.') {
            if seg.is_empty() {
                return Err(CodeError::EmptySegment);
            }
            match seg.parse::<u64>() {
                Ok(0) | Err(_) => return Err(CodeError::InvalidSegment(seg.to_string())),
                Ok(_) => {}
            }
        }

        Ok(Self(s.to_string()))
    }

    /// Raw code string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the code is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterator over the raw segments
    #[inline]
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|_| !self.0.is_empty())
    }

    /// Last segment (if not empty)
    #[inline]
    #[must_use]
    pub fn last_segment(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Whole code read as a single integer
    ///
    /// Used when numbering root nodes. Anything that is not a plain integer
    /// (including multi-segment codes) yields `0`.
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> u64 {
        self.0.trim().parse().unwrap_or(0)
    }

    /// Last segment read as an integer, `0` when missing or malformed
    #[inline]
    #[must_use]
    pub fn suffix_number(&self) -> u64 {
        self.last_segment()
            .and_then(|seg| seg.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Every segment read as an integer, malformed segments as `0`
    #[must_use]
    pub fn numeric_segments(&self) -> Vec<u64> {
        self.segments()
            .map(|seg| seg.trim().parse().unwrap_or(0))
            .collect()
    }

    /// Check if this code is a strict ancestor of another
    ///
    /// `1.2` is an ancestor of `1.2.3` but not of `1.20`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        if self.0.is_empty() || other.0.len() <= self.0.len() {
            return false;
        }
        other.0.starts_with(&self.0) && other.0.as_bytes()[self.0.len()] == b'.'
    }

    /// Compare codes segment by segment as numbers
    ///
    /// `1.10` sorts after `1.9`. Ties on the numeric value fall back to the
    /// raw strings so the ordering stays total.
    #[must_use]
    pub fn cmp_numeric(&self, other: &Self) -> Ordering {
        self.numeric_segments()
            .cmp(&other.numeric_segments())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl Display for WbsCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WbsCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_strict(s)
    }
}

impl From<&str> for WbsCode {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for WbsCode {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Errors from strict code parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    /// Empty code
    #[error("code is empty")]
    Empty,

    /// Empty segment in code
    #[error("code contains empty segment")]
    EmptySegment,

    /// Segment is not a positive integer
    #[error("invalid code segment: {0} (must be a positive integer)")]
    InvalidSegment(String),
}
