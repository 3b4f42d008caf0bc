use std::fmt::Display;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use deltamass::ProteoformComparison;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ArgComparison {
    /// Experimental against theoretical proteoforms
    Et,
    /// Experimental against decoy proteoforms
    Ed,
    /// Pairs of experimental proteoforms
    Ee,
    /// Pairs of experimental proteoforms with unequal lysine counts
    Ef,
    /// Experimental against top-down proteoforms
    Etd,
    /// Theoretical against top-down proteoforms
    Ttd,
    /// Experimental against targeted top-down proteoforms
    Ettd,
}

impl From<ArgComparison> for ProteoformComparison {
    fn from(value: ArgComparison) -> Self {
        match value {
            ArgComparison::Et => ProteoformComparison::Et,
            ArgComparison::Ed => ProteoformComparison::Ed,
            ArgComparison::Ee => ProteoformComparison::Ee,
            ArgComparison::Ef => ProteoformComparison::Ef,
            ArgComparison::Etd => ProteoformComparison::Etd,
            ArgComparison::Ttd => ProteoformComparison::Ttd,
            ArgComparison::Ettd => ProteoformComparison::Ettd,
        }
    }
}

impl Display for ArgComparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub fn non_negative_float_f64(s: &str) -> Result<f64, String> {
    let value = s.parse::<f64>().map_err(|e| e.to_string())?;
    if value < 0.0 {
        Err(format!("`{s}` is less than zero"))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_comparison_names() {
        let c = ArgComparison::from_str("ettd", true).unwrap();
        assert_eq!(ProteoformComparison::from(c), ProteoformComparison::Ettd);
        assert_eq!(c.to_string(), "Ettd");
        assert!(non_negative_float_f64("-1").is_err());
        assert_eq!(non_negative_float_f64("0.5"), Ok(0.5));
    }
}
