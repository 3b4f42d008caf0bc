//! Configuration for building relations, grouping them into peaks and estimating FDR.
//!
//! [`RelationConfig`] is the plain, possibly incomplete description a caller assembles
//! from wherever it keeps settings. [`RelationParams`] is the validated form the engine
//! runs with, carrying exact copies of every threshold.
use thiserror::Error;

use crate::rational::ExactRational;
use crate::relation::NoMansLand;

/// An error in the engine configuration, reported before any relation is built
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("The required parameter `{0}` was not provided")]
    Missing(&'static str),
    #[error("The parameter `{name}` must be finite, but was {value}")]
    NonFinite { name: &'static str, value: f64 },
    #[error("The parameter `{name}` must be greater than zero, but was {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("The no-man's-land lower bound {lower} must be less than the upper bound {upper}")]
    InvertedBounds { lower: f64, upper: f64 },
    #[error("The no-man's-land upper bound must be at most 1.0, but was {0}")]
    UpperBoundOutOfRange(f64),
    #[error("The range `{name}` must be ordered low to high, but was ({low}, {high})")]
    InvalidRange {
        name: &'static str,
        low: f64,
        high: f64,
    },
}

/// The unvalidated engine configuration.
///
/// The four threshold constants have no defaults: a missing value is a
/// [`ConfigurationError::Missing`] rather than a silent guess.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RelationConfig {
    pub no_mans_land_lower_bound: Option<f64>,
    pub no_mans_land_upper_bound: Option<f64>,
    /// The peak width for relations to a theoretical (or decoy) proteoform
    pub peak_width_base_et: Option<f64>,
    /// The peak width for all other relations
    pub peak_width_base_ee: Option<f64>,
    /// Whether proteoforms carry lysine counts from NeuCode labeling
    pub lysine_labeled: bool,
    /// Whether relations are being restored from saved results, in which case
    /// copies do not carry cached neighborhoods
    pub opening_results: bool,
    pub min_peak_count_et: Option<usize>,
    pub min_peak_count_ee: Option<usize>,
    /// Inclusive delta mass limits for relations against theoretical or top-down proteoforms
    pub et_mass_difference_range: Option<(f64, f64)>,
    /// The largest delta mass allowed between two experimental proteoforms
    pub ee_max_mass_difference: Option<f64>,
    /// The largest retention time difference allowed between two experimental proteoforms
    pub ee_max_retention_time_difference: Option<f64>,
    /// The lysine count mismatch tolerated between an experimental and a theoretical proteoform
    pub missed_lysines: u32,
}

impl RelationConfig {
    pub fn new(
        no_mans_land_lower_bound: f64,
        no_mans_land_upper_bound: f64,
        peak_width_base_et: f64,
        peak_width_base_ee: f64,
    ) -> Self {
        Self {
            no_mans_land_lower_bound: Some(no_mans_land_lower_bound),
            no_mans_land_upper_bound: Some(no_mans_land_upper_bound),
            peak_width_base_et: Some(peak_width_base_et),
            peak_width_base_ee: Some(peak_width_base_ee),
            ..Default::default()
        }
    }

    /// Check the configuration and build the exact thresholds from it
    pub fn validate(&self) -> Result<RelationParams, ConfigurationError> {
        RelationParams::try_from(self.clone())
    }
}

fn required(value: Option<f64>, name: &'static str) -> Result<f64, ConfigurationError> {
    let value = value.ok_or(ConfigurationError::Missing(name))?;
    positive(value, name)
}

fn finite(value: f64, name: &'static str) -> Result<f64, ConfigurationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigurationError::NonFinite { name, value })
    }
}

fn positive(value: f64, name: &'static str) -> Result<f64, ConfigurationError> {
    let value = finite(value, name)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigurationError::NonPositive { name, value })
    }
}

fn exact(value: f64, name: &'static str) -> Result<ExactRational, ConfigurationError> {
    ExactRational::from_decimal_f64(value).map_err(|_| ConfigurationError::NonFinite { name, value })
}

/// The validated engine configuration, including exact copies of every threshold
#[derive(Debug, Clone, PartialEq)]
pub struct RelationParams {
    config: RelationConfig,
    pub(crate) no_mans_land: NoMansLand,
    pub(crate) peak_width_et: ExactRational,
    pub(crate) peak_width_ee: ExactRational,
    pub(crate) et_mass_difference_range: Option<(ExactRational, ExactRational)>,
    pub(crate) ee_max_mass_difference: Option<ExactRational>,
}

impl RelationParams {
    /// Validate the four required thresholds, leaving every optional setting at its default.
    ///
    /// # Errors
    /// A [`ConfigurationError`] if any value is non-finite or non-positive, or if the
    /// no-man's-land bounds are not ordered `lower < upper <= 1`.
    pub fn new(
        no_mans_land_lower_bound: f64,
        no_mans_land_upper_bound: f64,
        peak_width_base_et: f64,
        peak_width_base_ee: f64,
    ) -> Result<Self, ConfigurationError> {
        RelationConfig::new(
            no_mans_land_lower_bound,
            no_mans_land_upper_bound,
            peak_width_base_et,
            peak_width_base_ee,
        )
        .validate()
    }

    pub fn config(&self) -> &RelationConfig {
        &self.config
    }

    pub fn no_mans_land(&self) -> &NoMansLand {
        &self.no_mans_land
    }

    pub fn peak_width_et(&self) -> &ExactRational {
        &self.peak_width_et
    }

    pub fn peak_width_ee(&self) -> &ExactRational {
        &self.peak_width_ee
    }

    /// Select the peak width for a relation class
    pub fn peak_width(&self, theoretical: bool) -> &ExactRational {
        if theoretical {
            &self.peak_width_et
        } else {
            &self.peak_width_ee
        }
    }

    /// The smallest member count for a peak to be accepted
    pub fn min_peak_count(&self, theoretical: bool) -> usize {
        if theoretical {
            self.config.min_peak_count_et.unwrap_or(1)
        } else {
            self.config.min_peak_count_ee.unwrap_or(1)
        }
    }

    pub fn lysine_labeled(&self) -> bool {
        self.config.lysine_labeled
    }

    pub fn opening_results(&self) -> bool {
        self.config.opening_results
    }

    pub fn missed_lysines(&self) -> u32 {
        self.config.missed_lysines
    }

    pub fn ee_max_retention_time_difference(&self) -> Option<f64> {
        self.config.ee_max_retention_time_difference
    }

    pub fn with_lysine_labeling(mut self, lysine_labeled: bool) -> Self {
        self.config.lysine_labeled = lysine_labeled;
        self
    }

    pub fn with_opening_results(mut self, opening_results: bool) -> Self {
        self.config.opening_results = opening_results;
        self
    }

    pub fn with_min_peak_counts(mut self, et: usize, ee: usize) -> Self {
        self.config.min_peak_count_et = Some(et);
        self.config.min_peak_count_ee = Some(ee);
        self
    }

    pub fn with_missed_lysines(mut self, missed_lysines: u32) -> Self {
        self.config.missed_lysines = missed_lysines;
        self
    }

    pub fn with_et_mass_difference_range(
        mut self,
        low: f64,
        high: f64,
    ) -> Result<Self, ConfigurationError> {
        self.config.et_mass_difference_range = Some((low, high));
        Self::try_from(self.config)
    }

    pub fn with_ee_max_mass_difference(mut self, max: f64) -> Result<Self, ConfigurationError> {
        self.config.ee_max_mass_difference = Some(max);
        Self::try_from(self.config)
    }

    pub fn with_ee_max_retention_time_difference(
        mut self,
        max: f64,
    ) -> Result<Self, ConfigurationError> {
        self.config.ee_max_retention_time_difference = Some(max);
        Self::try_from(self.config)
    }
}

impl TryFrom<RelationConfig> for RelationParams {
    type Error = ConfigurationError;

    fn try_from(config: RelationConfig) -> Result<Self, Self::Error> {
        let lower = required(config.no_mans_land_lower_bound, "no_mans_land_lower_bound")?;
        let upper = required(config.no_mans_land_upper_bound, "no_mans_land_upper_bound")?;
        if lower >= upper {
            return Err(ConfigurationError::InvertedBounds { lower, upper });
        }
        if upper > 1.0 {
            return Err(ConfigurationError::UpperBoundOutOfRange(upper));
        }
        let width_et = required(config.peak_width_base_et, "peak_width_base_et")?;
        let width_ee = required(config.peak_width_base_ee, "peak_width_base_ee")?;

        let et_mass_difference_range = match config.et_mass_difference_range {
            Some((low, high)) => {
                let low = finite(low, "et_mass_difference_range")?;
                let high = finite(high, "et_mass_difference_range")?;
                if low > high {
                    return Err(ConfigurationError::InvalidRange {
                        name: "et_mass_difference_range",
                        low,
                        high,
                    });
                }
                Some((
                    exact(low, "et_mass_difference_range")?,
                    exact(high, "et_mass_difference_range")?,
                ))
            }
            None => None,
        };
        let ee_max_mass_difference = match config.ee_max_mass_difference {
            Some(value) => Some(exact(
                positive(value, "ee_max_mass_difference")?,
                "ee_max_mass_difference",
            )?),
            None => None,
        };
        if let Some(value) = config.ee_max_retention_time_difference {
            positive(value, "ee_max_retention_time_difference")?;
        }

        Ok(Self {
            no_mans_land: NoMansLand::new(
                exact(lower, "no_mans_land_lower_bound")?,
                exact(upper, "no_mans_land_upper_bound")?,
            ),
            peak_width_et: exact(width_et, "peak_width_base_et")?,
            peak_width_ee: exact(width_ee, "peak_width_base_ee")?,
            et_mass_difference_range,
            ee_max_mass_difference,
            config,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_valid() {
        let params = RelationParams::new(0.22, 0.88, 0.015, 0.02).unwrap();
        assert_eq!(*params.peak_width(true), ExactRational::new(15, 1000).unwrap());
        assert_eq!(*params.peak_width(false), ExactRational::new(2, 100).unwrap());
        assert_eq!(params.min_peak_count(true), 1);
        assert!(!params.lysine_labeled());
        let params = params.with_min_peak_counts(10, 5).with_lysine_labeling(true);
        assert_eq!(params.min_peak_count(true), 10);
        assert_eq!(params.min_peak_count(false), 5);
        assert!(params.lysine_labeled());
    }

    #[test]
    fn test_missing() {
        let mut config = RelationConfig::new(0.22, 0.88, 0.015, 0.015);
        config.peak_width_base_ee = None;
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::Missing("peak_width_base_ee"))
        );
        assert_eq!(
            RelationConfig::default().validate(),
            Err(ConfigurationError::Missing("no_mans_land_lower_bound"))
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            RelationParams::new(0.22, 0.88, 0.0, 0.015),
            Err(ConfigurationError::NonPositive { name: "peak_width_base_et", .. })
        ));
        assert!(matches!(
            RelationParams::new(0.22, 0.88, 0.015, -1.0),
            Err(ConfigurationError::NonPositive { name: "peak_width_base_ee", .. })
        ));
        assert!(matches!(
            RelationParams::new(f64::NAN, 0.88, 0.015, 0.015),
            Err(ConfigurationError::NonFinite { .. })
        ));
        assert!(matches!(
            RelationParams::new(0.9, 0.5, 0.015, 0.015),
            Err(ConfigurationError::InvertedBounds { .. })
        ));
        assert!(matches!(
            RelationParams::new(0.2, 1.5, 0.015, 0.015),
            Err(ConfigurationError::UpperBoundOutOfRange(_))
        ));
        let params = RelationParams::new(0.22, 0.88, 0.015, 0.015).unwrap();
        assert!(matches!(
            params.clone().with_et_mass_difference_range(10.0, -10.0),
            Err(ConfigurationError::InvalidRange { .. })
        ));
        assert!(params.clone().with_ee_max_mass_difference(0.0).is_err());
        assert!(params.with_et_mass_difference_range(-250.0, 250.0).is_ok());
    }
}
