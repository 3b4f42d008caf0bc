//! Grouping of relations into delta mass peaks.
//!
//! Relations are visited in ascending delta mass order. Each relation either extends the
//! open peak or closes it and opens a new one:
//!
//! ```math
//! \left| \Delta m_i - \bar{\Delta m} \right| \le \frac{W_i}{2}
//! ```
//!
//! where $`\bar{\Delta m}`$ is the exact running mean of the open peak's members and
//! $`W_i`$ is the peak width of relation $`i`$. A relation exactly on the boundary extends
//! the open peak. Because the visit order is fixed and the arithmetic exact, identical
//! inputs always give the same partition.
use std::collections::BTreeMap;
use std::fmt::Display;
use std::ops::Range;

use tracing::debug;

use crate::interval::Span1D;
use crate::neighborhood::SortedRelations;
use crate::params::RelationParams;
use crate::rational::ExactRational;
use crate::relation::{ProteoformComparison, ProteoformRelation};

/// The position of a [`DeltaMassPeak`] in the peak list it was produced in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeakKey(pub usize);

impl Display for PeakKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Peak({})", self.0)
    }
}

/// A pile-up of relations along the delta mass axis, thought to share a single
/// underlying mass shift.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaMassPeak {
    key: PeakKey,
    relation_type: ProteoformComparison,
    members: Range<usize>,
    peak_delta_mass_average: ExactRational,
    start: ExactRational,
    end: ExactRational,
    width: ExactRational,
    counts_by_type: BTreeMap<ProteoformComparison, usize>,
    peak_accepted: bool,
    /// The expected number of false members estimated from a null model, NaN when
    /// no estimate is available
    pub(crate) decoy_relation_count: f64,
    pub(crate) fdr: f64,
}

impl DeltaMassPeak {
    fn from_members(
        key: PeakKey,
        members: Range<usize>,
        relations: &[ProteoformRelation<'_>],
        sum: ExactRational,
        params: &RelationParams,
    ) -> Self {
        let first = &relations[0];
        let count = relations.len();
        let mut counts_by_type = BTreeMap::new();
        for r in relations {
            *counts_by_type.entry(r.relation_type()).or_insert(0usize) += 1;
        }
        let mut relation_type = first.relation_type();
        let mut most = 0;
        for (kind, n) in counts_by_type.iter() {
            if *n > most {
                most = *n;
                relation_type = *kind;
            }
        }
        let theoretical = first.uses_theoretical_width();
        Self {
            key,
            relation_type,
            peak_delta_mass_average: sum / ExactRational::from_integer(count as u64),
            start: first.delta_mass().clone(),
            end: relations[count - 1].delta_mass().clone(),
            width: params.peak_width(theoretical).clone(),
            counts_by_type,
            peak_accepted: count >= params.min_peak_count(theoretical),
            members,
            decoy_relation_count: f64::NAN,
            fdr: f64::NAN,
        }
    }

    pub fn key(&self) -> PeakKey {
        self.key
    }

    /// The most common relation type among the members
    pub fn relation_type(&self) -> ProteoformComparison {
        self.relation_type
    }

    /// The positions of the members in the [`SortedRelations`] the peak was built from
    pub fn members(&self) -> Range<usize> {
        self.members.clone()
    }

    /// The mean delta mass of the members
    pub fn peak_delta_mass_average(&self) -> &ExactRational {
        &self.peak_delta_mass_average
    }

    /// The peak width of the members, used again when counting decoys
    pub fn width(&self) -> &ExactRational {
        &self.width
    }

    pub fn counts_by_type(&self) -> &BTreeMap<ProteoformComparison, usize> {
        &self.counts_by_type
    }

    /// Whether the peak has enough members to be reported
    pub fn peak_accepted(&self) -> bool {
        self.peak_accepted
    }

    /// The expected false member count, NaN until estimated or when no null model exists
    pub fn decoy_relation_count(&self) -> f64 {
        self.decoy_relation_count
    }

    pub fn fdr(&self) -> f64 {
        self.fdr
    }

    pub fn peak_relation_group_count(&self) -> usize {
        self.members.len()
    }

    pub fn count_of(&self, relation_type: ProteoformComparison) -> usize {
        self.counts_by_type.get(&relation_type).copied().unwrap_or_default()
    }

    pub fn peak_delta_mass_average_f64(&self) -> f64 {
        self.peak_delta_mass_average.to_f64()
    }

    /// Whether the member relations were compared against theoretical proteoforms
    pub fn is_theoretical(&self, relations: &SortedRelations<'_>) -> bool {
        relations
            .get(self.members.start)
            .is_some_and(|r| r.uses_theoretical_width())
    }
}

/// The peak spans its smallest to its largest member delta mass
impl Span1D for DeltaMassPeak {
    type DimType = ExactRational;

    fn start(&self) -> &Self::DimType {
        &self.start
    }

    fn end(&self) -> &Self::DimType {
        &self.end
    }
}

/// Partitions a [`SortedRelations`] into disjoint [`DeltaMassPeak`]s
#[derive(Debug, Clone, Copy)]
pub struct PeakAggregator<'p> {
    params: &'p RelationParams,
}

impl<'p> PeakAggregator<'p> {
    pub fn new(params: &'p RelationParams) -> Self {
        Self { params }
    }

    /// Build the peaks and record each relation's peak and acceptance.
    ///
    /// Every relation ends up in exactly one peak, and peaks are returned in
    /// ascending delta mass order.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn aggregate(&self, relations: &mut SortedRelations<'_>) -> Vec<DeltaMassPeak> {
        let spans = self.partition(relations);
        let mut peaks = Vec::with_capacity(spans.len());
        for (i, (span, sum)) in spans.into_iter().enumerate() {
            let peak = DeltaMassPeak::from_members(
                PeakKey(i),
                span.clone(),
                &relations.as_slice()[span.clone()],
                sum,
                self.params,
            );
            for r in relations.relations_mut()[span].iter_mut() {
                r.assign_peak(peak.key, peak.peak_accepted);
            }
            peaks.push(peak);
        }
        debug!(
            "Aggregated {} relations into {} peaks, {} accepted",
            relations.len(),
            peaks.len(),
            peaks.iter().filter(|p| p.peak_accepted).count()
        );
        peaks
    }

    /// Split the relations into contiguous runs, returning each run and the sum of its
    /// delta masses
    fn partition(&self, relations: &SortedRelations<'_>) -> Vec<(Range<usize>, ExactRational)> {
        let mut spans = Vec::new();
        let mut start = 0;
        let mut sum = ExactRational::zero();
        for (i, relation) in relations.iter().enumerate() {
            let delta = relation.delta_mass();
            if i > start {
                // |d - sum / n| <= w / 2, rearranged to avoid dividing by n
                let n = ExactRational::from_integer((i - start) as u64);
                let deviation = ((&n * delta) - &sum).abs() * ExactRational::from_integer(2);
                if deviation > n * relation.peak_width(self.params) {
                    spans.push((start..i, std::mem::take(&mut sum)));
                    start = i;
                }
            }
            sum = sum + delta;
        }
        if start < relations.len() {
            spans.push((start..relations.len(), sum));
        }
        spans
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::proteoform::Proteoform;

    fn et_relations<'a>(
        base: &'a Proteoform,
        pfs: &'a [Proteoform],
        params: &RelationParams,
    ) -> SortedRelations<'a> {
        pfs.iter()
            .map(|pf| ProteoformRelation::new(base, pf, ProteoformComparison::Et, params).unwrap())
            .collect()
    }

    fn theoretical(masses: &[f64]) -> Vec<Proteoform> {
        masses
            .iter()
            .enumerate()
            .map(|(i, m)| Proteoform::theoretical(format!("T{i}"), *m, 0, "T", ""))
            .collect()
    }

    #[test]
    fn test_merge_and_split() {
        let params = RelationParams::new(0.22, 0.88, 0.1, 0.02).unwrap();
        let base = Proteoform::experimental("E", 10_000.0, 0, 1.0, 1.0);
        let pfs = theoretical(&[10_079.0, 10_079.02, 10_079.2]);
        let mut relations = et_relations(&base, &pfs, &params);
        let peaks = PeakAggregator::new(&params).aggregate(&mut relations);

        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].peak_relation_group_count(), 2);
        assert_eq!(*peaks[0].peak_delta_mass_average(), ExactRational::new(7901, 100).unwrap());
        assert!((peaks[0].peak_delta_mass_average_f64() - 79.01).abs() < 1e-9);
        assert_eq!(peaks[0].count_of(ProteoformComparison::Et), 2);
        assert_eq!(peaks[0].relation_type(), ProteoformComparison::Et);
        assert_eq!(peaks[1].peak_relation_group_count(), 1);
        assert_eq!(*peaks[1].start(), ExactRational::new(792, 10).unwrap());
        assert!(peaks[0].peak_accepted());

        assert_eq!(relations[0].peak(), Some(PeakKey(0)));
        assert_eq!(relations[1].peak(), Some(PeakKey(0)));
        assert_eq!(relations[2].peak(), Some(PeakKey(1)));
        assert!(relations.iter().all(|r| r.accepted));
        assert!(peaks[0].is_theoretical(&relations));
    }

    #[test]
    fn test_boundary_extends() {
        // The second relation sits exactly half a peak width from the first
        let params = RelationParams::new(0.22, 0.88, 0.1, 0.02).unwrap();
        let base = Proteoform::experimental("E", 1_000.0, 0, 1.0, 1.0);
        let pfs = theoretical(&[1_001.0, 1_001.05]);
        let mut relations = et_relations(&base, &pfs, &params);
        let peaks = PeakAggregator::new(&params).aggregate(&mut relations);
        assert_eq!(peaks.len(), 1);
        assert_eq!(*peaks[0].end(), ExactRational::new(105, 100).unwrap());
    }

    #[test]
    fn test_running_mean_closes_chains() {
        let params = RelationParams::new(0.22, 0.88, 0.1, 0.02).unwrap();
        let base = Proteoform::experimental("E", 1_000.0, 0, 1.0, 1.0);
        // Evenly spaced by 0.04, always within one half width of the previous member
        let masses: Vec<f64> = (0..10).map(|i| 1_001.0 + 0.04 * i as f64).collect();
        let pfs = theoretical(&masses);
        let mut relations = et_relations(&base, &pfs, &params);
        let peaks = PeakAggregator::new(&params).aggregate(&mut relations);
        assert!(peaks.len() > 1);

        let mut covered = 0;
        for pair in peaks.windows(2) {
            assert_eq!(pair[0].members().end, pair[1].members().start);
            assert!(pair[0].end() < pair[1].start());
        }
        for peak in peaks.iter() {
            covered += peak.peak_relation_group_count();
            for i in peak.members() {
                assert_eq!(relations[i].peak(), Some(peak.key()));
            }
        }
        assert_eq!(covered, relations.len());
    }

    #[test]
    fn test_min_peak_count() {
        let params = RelationParams::new(0.22, 0.88, 0.1, 0.02)
            .unwrap()
            .with_min_peak_counts(2, 2);
        let base = Proteoform::experimental("E", 10_000.0, 0, 1.0, 1.0);
        let pfs = theoretical(&[10_079.0, 10_079.02, 10_079.2]);
        let mut relations = et_relations(&base, &pfs, &params);
        let peaks = PeakAggregator::new(&params).aggregate(&mut relations);
        assert!(peaks[0].peak_accepted());
        assert!(!peaks[1].peak_accepted());
        assert!(relations[0].accepted);
        assert!(!relations[2].accepted);
    }

    #[test]
    fn test_empty() {
        let params = RelationParams::new(0.22, 0.88, 0.1, 0.02).unwrap();
        let mut relations = SortedRelations::default();
        assert!(PeakAggregator::new(&params).aggregate(&mut relations).is_empty());
    }
}
