//! Severity level definitions.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Severity of a finding, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// The name nuclei accepts on its `-severity` flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown severity '{0}' (valid: info, low, medium, high, critical)")]
pub struct SeverityParseError(pub String);

impl FromStr for Severity {
    type Err = SeverityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(SeverityParseError(s.trim().to_string())),
        }
    }
}

/// A set of severities to pass to the scanner.
///
/// An empty filter means "use the scanner's default" and produces no
/// `-severity` argument at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityFilter(BTreeSet<Severity>);

impl SeverityFilter {
    pub fn new<I: IntoIterator<Item = Severity>>(levels: I) -> Self {
        Self(levels.into_iter().collect())
    }

    /// Parse a comma-joined list such as `"critical,high"`.
    ///
    /// Blank tokens are ignored, so `""` and `" , "` both yield an empty filter.
    pub fn parse(input: &str) -> Result<Self, SeverityParseError> {
        input
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(Severity::from_str)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comma-joined form in ascending severity order, e.g. `"high,critical"`.
    pub fn to_arg(&self) -> String {
        self.0
            .iter()
            .map(Severity::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromStr for SeverityFilter {
    type Err = SeverityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SeverityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_arg())
    }
}
