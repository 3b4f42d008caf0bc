//! False discovery rate estimation for delta mass peaks by decoy density.
//!
//! For a peak with mean $`\bar{m}`$ and width $`W`$, each decoy relation set $`D_k`$
//! contributes the count of its relations in $`[\bar{m} - W/2, \bar{m} + W/2]`$, scaled by
//! the ratio of the target and decoy universe sizes:
//!
//! ```math
//! \hat{f}_k = \left|D_k \cap \text{window}\right| \frac{|T|}{|D_k|}
//! ```
//!
//! The peak's expected false count is the median of $`\hat{f}_k`$ over the non-empty decoy
//! sets, and its FDR that count over the peak's member count, capped at 1.
use itertools::Itertools;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::neighborhood::SortedRelations;
use crate::peak::DeltaMassPeak;
use crate::relation::ProteoformComparison;

/// The FDR of all accepted peaks of one relation type taken together
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FdrSummary {
    pub relation_type: ProteoformComparison,
    /// The summed expected false relation count of the accepted peaks
    pub expected_false: f64,
    /// The summed member count of the accepted peaks with an estimate
    pub target_count: usize,
    pub fdr: f64,
}

impl FdrSummary {
    pub fn empty(relation_type: ProteoformComparison) -> Self {
        Self {
            relation_type,
            expected_false: f64::NAN,
            target_count: 0,
            fdr: f64::NAN,
        }
    }
}

fn median(values: impl IntoIterator<Item = f64>) -> f64 {
    let values = values.into_iter().sorted_by(|a, b| a.total_cmp(b)).collect_vec();
    let n = values.len();
    match n {
        0 => f64::NAN,
        _ if n % 2 == 1 => values[n / 2],
        _ => (values[n / 2 - 1] + values[n / 2]) / 2.0,
    }
}

/// Estimates how many members of each peak are expected to be spurious, using
/// separately built decoy relation sets as the null model
#[derive(Debug, Default, Clone, Copy)]
pub struct FdrEstimator;

impl FdrEstimator {
    pub fn new() -> Self {
        Self
    }

    /// The expected false member count of `peak`, given the size of its target universe.
    ///
    /// Returns NaN when no decoy set is non-empty or the target universe is empty.
    pub fn expected_false_count(
        &self,
        peak: &DeltaMassPeak,
        target_universe: usize,
        decoys: &[SortedRelations<'_>],
    ) -> f64 {
        if target_universe == 0 {
            return f64::NAN;
        }
        median(decoys.iter().filter(|d| !d.is_empty()).map(|d| {
            let hits = d.window(peak.peak_delta_mass_average(), peak.width()).len();
            hits as f64 * target_universe as f64 / d.len() as f64
        }))
    }

    /// Annotate every peak with its expected false count and FDR, and summarize the
    /// accepted peaks.
    ///
    /// `targets` is the admissible relation set the peaks were built from. Missing or
    /// empty decoy sets degrade to NaN rather than failing.
    #[tracing::instrument(level = "debug", skip_all, fields(relation_type = %relation_type))]
    pub fn estimate(
        &self,
        relation_type: ProteoformComparison,
        targets: &SortedRelations<'_>,
        peaks: &mut [DeltaMassPeak],
        decoys: &[SortedRelations<'_>],
    ) -> FdrSummary {
        if decoys.iter().all(|d| d.is_empty()) {
            warn!("No decoy relations are available for {relation_type}, FDR cannot be estimated");
        }
        let target_universe = targets.len();
        peaks.par_iter_mut().for_each(|peak| {
            let expected = self.expected_false_count(peak, target_universe, decoys);
            let count = peak.peak_relation_group_count();
            peak.decoy_relation_count = expected;
            peak.fdr = if count == 0 || expected.is_nan() {
                f64::NAN
            } else {
                (expected / count as f64).min(1.0)
            };
        });

        let (expected_false, target_count) = peaks
            .iter()
            .filter(|p| p.peak_accepted() && !p.decoy_relation_count.is_nan())
            .fold((0.0, 0), |(expected, count), p| {
                (
                    expected + p.decoy_relation_count,
                    count + p.peak_relation_group_count(),
                )
            });
        let summary = if target_count == 0 {
            FdrSummary::empty(relation_type)
        } else {
            FdrSummary {
                relation_type,
                expected_false,
                target_count,
                fdr: (expected_false / target_count as f64).min(1.0),
            }
        };
        debug!(
            "Estimated FDR {:.4} over {} peaks of {relation_type}",
            summary.fdr,
            peaks.len()
        );
        summary
    }
}
