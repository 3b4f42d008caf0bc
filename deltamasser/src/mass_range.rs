use std::{fmt::Display, num::ParseFloatError, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An inclusive range of delta masses, denoted (low):(high) on the command line and in
/// configuration files alike
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeltaMassRange {
    pub low: f64,
    pub high: f64,
}

impl DeltaMassRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

impl Display for DeltaMassRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.low, self.high)
    }
}

#[derive(Debug, Error)]
pub enum DeltaMassRangeParseError {
    #[error("Failed to parse delta mass range low {0}")]
    MalformedLow(#[source] ParseFloatError),
    #[error("Failed to parse delta mass range high {0}")]
    MalformedHigh(#[source] ParseFloatError),
    #[error("Delta mass ranges are written (low):(high), but got `{0}`")]
    MissingSeparator(String),
}

impl FromStr for DeltaMassRange {
    type Err = DeltaMassRangeParseError;

    /// Negative bounds are common, so `-` cannot separate the two ends. `:` and `,` can.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (low_s, high_s) = s
            .split_once(':')
            .or_else(|| s.split_once(','))
            .ok_or_else(|| DeltaMassRangeParseError::MissingSeparator(s.to_string()))?;
        let low = low_s
            .trim()
            .parse()
            .map_err(DeltaMassRangeParseError::MalformedLow)?;
        let high = high_s
            .trim()
            .parse()
            .map_err(DeltaMassRangeParseError::MalformedHigh)?;
        Ok(Self::new(low, high))
    }
}

impl TryFrom<String> for DeltaMassRange {
    type Error = DeltaMassRangeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DeltaMassRange> for String {
    fn from(value: DeltaMassRange) -> Self {
        value.to_string()
    }
}
