// SPDX-License-Identifier: MPL-2.0
//! Source identities and the quality-level table.
//!
//! A [`SourceId`] names one pre-encoded quality variant of the content; the
//! engine treats it as an opaque key and only the opener interprets it (as
//! a path or URI). The [`QualityTable`] fixes the label → identity mapping
//! at construction time.

use std::fmt;

/// Opaque identity of one encoded quality variant.
///
/// Immutable once selected for playback; also the key under which the
/// decoder cache tracks live handle pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The closed set of quality labels a viewer can switch among.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityLevel {
    Low,
    Medium,
    High,
}

impl QualityLevel {
    /// All levels, in ascending quality order.
    pub const ALL: [QualityLevel; 3] = [QualityLevel::Low, QualityLevel::Medium, QualityLevel::High];

    pub fn label(self) -> &'static str {
        match self {
            QualityLevel::Low => "Low",
            QualityLevel::Medium => "Medium",
            QualityLevel::High => "High",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Fixed mapping from quality labels to source identities.
///
/// Supplied at engine construction and not mutable at runtime; the
/// "current" label lives on the engine, not here.
#[derive(Debug, Clone)]
pub struct QualityTable {
    low: SourceId,
    medium: SourceId,
    high: SourceId,
}

impl QualityTable {
    pub fn new(
        low: impl Into<SourceId>,
        medium: impl Into<SourceId>,
        high: impl Into<SourceId>,
    ) -> Self {
        Self {
            low: low.into(),
            medium: medium.into(),
            high: high.into(),
        }
    }

    /// Returns the source identity for a quality level.
    pub fn source(&self, level: QualityLevel) -> &SourceId {
        match level {
            QualityLevel::Low => &self.low,
            QualityLevel::Medium => &self.medium,
            QualityLevel::High => &self.high,
        }
    }
}
