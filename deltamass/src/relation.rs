//! Typed mass difference edges between pairs of proteoforms.
//!
//! A [`ProteoformRelation`] is the edge of a proteoform family graph: two proteoforms,
//! the kind of comparison that paired them, and the exact signed mass difference
//! between them. Nearby relations along the delta mass axis are later grouped into
//! [`DeltaMassPeak`](crate::peak::DeltaMassPeak)s.
use std::fmt::Display;

use thiserror::Error;

use crate::neighborhood::Neighborhood;
use crate::params::{ConfigurationError, RelationParams};
use crate::peak::PeakKey;
use crate::proteoform::Proteoform;
use crate::rational::{ExactRational, RationalError};

/// An error that might occur while building or analyzing relations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RelationError {
    #[error("The mass of proteoform {accession} could not be made exact: {source}")]
    InvalidMass {
        accession: String,
        #[source]
        source: RationalError,
    },
    #[error(transparent)]
    Rational(#[from] RationalError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// The kinds of comparison that produce relations, the edge types of a proteoform family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProteoformComparison {
    /// Experiment-Theoretical
    Et,
    /// Experiment-Decoy
    Ed,
    /// Experiment-Experiment
    Ee,
    /// Experiment-Experiment with unequal lysine counts
    Ef,
    /// Experiment-TopDown
    Etd,
    /// Theoretical-TopDown
    Ttd,
    /// Experiment-Targeted-TopDown
    Ettd,
}

impl ProteoformComparison {
    pub const ALL: [ProteoformComparison; 7] = [
        Self::Et,
        Self::Ed,
        Self::Ee,
        Self::Ef,
        Self::Etd,
        Self::Ttd,
        Self::Ettd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Et => "Experiment-Theoretical",
            Self::Ed => "Experiment-Decoy",
            Self::Ee => "Experiment-Experimental",
            Self::Ef => "Experiment-Unequal Lysine Count",
            Self::Etd => "Experiment-Topdown",
            Self::Ttd => "Theoretical-Topdown",
            Self::Ettd => "Experiment-Targeted-Topdown",
        }
    }

    /// The comparison whose relations are the null model for this one's peaks,
    /// if there is one
    pub fn null_model(&self) -> Option<ProteoformComparison> {
        match self {
            Self::Et => Some(Self::Ed),
            Self::Ee => Some(Self::Ef),
            _ => None,
        }
    }

    /// Whether both members of the relation are experimental proteoforms
    pub fn is_experiment_experiment(&self) -> bool {
        matches!(self, Self::Ee | Self::Ef)
    }
}

impl Display for ProteoformComparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The band of fractional delta mass values that are too ambiguous to interpret.
///
/// Meaningful mass shifts sit near whole multiples of a unit mass, so a relation is
/// admissible when the absolute fractional part of its delta mass is at most
/// `lower_bound` or at least `upper_bound`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoMansLand {
    pub lower_bound: ExactRational,
    pub upper_bound: ExactRational,
}

impl NoMansLand {
    pub fn new(lower_bound: ExactRational, upper_bound: ExactRational) -> Self {
        Self {
            lower_bound,
            upper_bound,
        }
    }

    pub fn is_outside(&self, delta_mass: &ExactRational) -> bool {
        let fraction = delta_mass.fraction_part().abs();
        fraction >= self.upper_bound || fraction <= self.lower_bound
    }
}

/// A single pairwise comparison between two proteoforms.
///
/// The proteoforms are borrowed from the collection that produced them. The delta mass
/// and relation type are fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ProteoformRelation<'a> {
    connected_proteoforms: [&'a Proteoform; 2],
    relation_type: ProteoformComparison,
    delta_mass: ExactRational,
    /// Whether the peak this relation belongs to was accepted
    pub accepted: bool,
    /// The lysine count of the first proteoform when lysine labeling is active
    pub lysine_count: Option<i32>,
    peak: Option<PeakKey>,
    nearby: Option<Neighborhood>,
}

impl<'a> ProteoformRelation<'a> {
    /// Relate `pf1` to `pf2`, with the delta mass `pf2 - pf1`
    ///
    /// # Errors
    /// [`RelationError::InvalidMass`] if either mass is not finite
    pub fn new(
        pf1: &'a Proteoform,
        pf2: &'a Proteoform,
        relation_type: ProteoformComparison,
        params: &RelationParams,
    ) -> Result<Self, RelationError> {
        let delta_mass = exact_mass_of(pf2)? - exact_mass_of(pf1)?;
        Ok(Self::from_delta(pf1, pf2, relation_type, delta_mass, params))
    }

    pub(crate) fn from_delta(
        pf1: &'a Proteoform,
        pf2: &'a Proteoform,
        relation_type: ProteoformComparison,
        delta_mass: ExactRational,
        params: &RelationParams,
    ) -> Self {
        Self {
            connected_proteoforms: [pf1, pf2],
            relation_type,
            delta_mass,
            accepted: false,
            lysine_count: params.lysine_labeled().then_some(pf1.lysine_count),
            peak: None,
            nearby: None,
        }
    }

    /// Copy this relation. The peak assignment always carries over, the neighborhood
    /// only when not restoring saved results. Acceptance is left to be decided again.
    pub fn duplicate(&self, params: &RelationParams) -> Self {
        let mut dup = self.clone();
        dup.accepted = false;
        if params.opening_results() {
            dup.nearby = None;
        }
        dup
    }

    pub fn connected_proteoforms(&self) -> &[&'a Proteoform; 2] {
        &self.connected_proteoforms
    }

    pub fn proteoform_1(&self) -> &'a Proteoform {
        self.connected_proteoforms[0]
    }

    pub fn proteoform_2(&self) -> &'a Proteoform {
        self.connected_proteoforms[1]
    }

    pub fn relation_type(&self) -> ProteoformComparison {
        self.relation_type
    }

    pub fn delta_mass(&self) -> &ExactRational {
        &self.delta_mass
    }

    pub fn delta_mass_f64(&self) -> f64 {
        self.delta_mass.to_f64()
    }

    pub fn outside_no_mans_land(&self, params: &RelationParams) -> bool {
        params.no_mans_land().is_outside(&self.delta_mass)
    }

    /// Whether the theoretical peak width applies to this relation
    pub fn uses_theoretical_width(&self) -> bool {
        self.proteoform_2().is_theoretical()
    }

    pub fn peak_width<'p>(&self, params: &'p RelationParams) -> &'p ExactRational {
        params.peak_width(self.uses_theoretical_width())
    }

    pub fn peak(&self) -> Option<PeakKey> {
        self.peak
    }

    pub(crate) fn assign_peak(&mut self, key: PeakKey, accepted: bool) {
        self.peak = Some(key);
        self.accepted = accepted;
    }

    pub fn neighborhood(&self) -> Option<&Neighborhood> {
        self.nearby.as_ref()
    }

    pub fn nearby_relations_count(&self) -> Option<usize> {
        self.nearby.as_ref().map(|n| n.len())
    }

    pub(crate) fn set_neighborhood(&mut self, neighborhood: Neighborhood) {
        self.nearby = Some(neighborhood);
    }

    pub(crate) fn clear_neighborhood(&mut self) {
        self.nearby = None;
    }

    pub fn accession_1(&self) -> &str {
        &self.proteoform_1().accession
    }

    pub fn accession_2(&self) -> &str {
        &self.proteoform_2().accession
    }

    pub fn proteoform_mass_1(&self) -> f64 {
        self.proteoform_1().modified_mass
    }

    pub fn proteoform_mass_2(&self) -> f64 {
        self.proteoform_2().modified_mass
    }

    pub fn agg_intensity_1(&self) -> Option<f64> {
        self.proteoform_1().agg_intensity()
    }

    pub fn agg_intensity_2(&self) -> Option<f64> {
        self.proteoform_2().agg_intensity()
    }

    pub fn agg_rt_1(&self) -> Option<f64> {
        self.proteoform_1().retention_time()
    }

    pub fn agg_rt_2(&self) -> Option<f64> {
        self.proteoform_2().retention_time()
    }

    pub fn num_observations_1(&self) -> Option<usize> {
        self.proteoform_1().observation_count()
    }

    pub fn num_observations_2(&self) -> Option<usize> {
        self.proteoform_2().observation_count()
    }

    pub fn name_1(&self) -> Option<&str> {
        self.proteoform_1().name()
    }

    pub fn name_2(&self) -> Option<&str> {
        self.proteoform_2().name()
    }

    pub fn ptm_list_1(&self) -> Option<&str> {
        self.proteoform_1().ptm_descriptions()
    }

    pub fn ptm_list_2(&self) -> Option<&str> {
        self.proteoform_2().ptm_descriptions()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.proteoform_2().fragment()
    }

    pub fn psm_count_bu(&self) -> Option<usize> {
        self.proteoform_2().psm_count_bu()
    }
}

pub(crate) fn exact_mass_of(pf: &Proteoform) -> Result<ExactRational, RelationError> {
    pf.exact_mass().map_err(|source| RelationError::InvalidMass {
        accession: pf.accession.clone(),
        source,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn r(numer: i64, denom: i64) -> ExactRational {
        ExactRational::new(numer, denom).unwrap()
    }

    fn params() -> RelationParams {
        RelationParams::new(0.25, 0.75, 0.1, 0.02).unwrap()
    }

    #[test]
    fn test_no_mans_land() {
        let nml = NoMansLand::new(r(1, 4), r(3, 4));
        assert!(!nml.is_outside(&r(1, 2)));
        assert!(nml.is_outside(&r(1, 4)));
        assert!(nml.is_outside(&r(3, 4)));
        assert!(nml.is_outside(&r(7902, 100)));
        assert!(nml.is_outside(&r(7998, 100)));
        assert!(!nml.is_outside(&r(7960, 100)));
        assert!(nml.is_outside(&ExactRational::zero()));
    }

    #[test]
    fn test_no_mans_land_symmetric() {
        let nml = NoMansLand::new(r(22, 100), r(88, 100));
        for numer in -5_000i64..5_000 {
            let m = r(numer * 37, 1000);
            assert_eq!(nml.is_outside(&m), nml.is_outside(&-m.clone()), "{m}");
        }
    }

    #[test]
    fn test_construction() {
        let params = params();
        let e = Proteoform::experimental("E1", 10_079.02, 7, 1e5, 20.0);
        let t = Proteoform::theoretical("T1", 10_000.0, 7, "PROT", "unmodified");
        let rel = ProteoformRelation::new(&e, &t, ProteoformComparison::Et, &params).unwrap();
        assert_eq!(*rel.delta_mass(), r(-7902, 100));
        assert_eq!(rel.relation_type(), ProteoformComparison::Et);
        assert_eq!(rel.lysine_count, None);
        assert!(rel.uses_theoretical_width());
        assert_eq!(*rel.peak_width(&params), r(1, 10));
        assert!(rel.outside_no_mans_land(&params));
        assert_eq!(rel.accession_1(), "E1");
        assert_eq!(rel.name_2(), Some("PROT"));
        assert_eq!(rel.agg_intensity_1(), Some(1e5));
        assert_eq!(rel.agg_intensity_2(), None);
        assert_eq!(rel.fragment(), Some("full"));
        assert_eq!(rel.nearby_relations_count(), None);

        let labeled = params.with_lysine_labeling(true);
        let rel = ProteoformRelation::new(&e, &t, ProteoformComparison::Et, &labeled).unwrap();
        assert_eq!(rel.lysine_count, Some(7));

        let e2 = Proteoform::experimental("E2", 10_080.02, 7, 1e5, 20.0);
        let rel = ProteoformRelation::new(&e, &e2, ProteoformComparison::Ee, &labeled).unwrap();
        assert_eq!(*rel.delta_mass(), ExactRational::one());
        assert!(!rel.uses_theoretical_width());
        assert_eq!(*rel.peak_width(&labeled), r(2, 100));
    }

    #[test]
    fn test_invalid_mass() {
        let params = params();
        let e = Proteoform::experimental("E1", f64::INFINITY, 7, 1e5, 20.0);
        let t = Proteoform::theoretical("T1", 10_000.0, 7, "PROT", "unmodified");
        let err = ProteoformRelation::new(&e, &t, ProteoformComparison::Et, &params).unwrap_err();
        assert!(matches!(err, RelationError::InvalidMass { ref accession, .. } if accession == "E1"));
    }

    #[test]
    fn test_duplicate() {
        let params = params();
        let e = Proteoform::experimental("E1", 100.0, 0, 1.0, 1.0);
        let t = Proteoform::theoretical("T1", 101.0, 0, "T1", "");
        let mut rel = ProteoformRelation::new(&e, &t, ProteoformComparison::Et, &params).unwrap();
        rel.assign_peak(PeakKey(3), true);
        rel.set_neighborhood(Neighborhood::new(2..5));

        let dup = rel.duplicate(&params);
        assert_eq!(dup.peak(), Some(PeakKey(3)));
        assert_eq!(dup.nearby_relations_count(), Some(3));
        assert!(rel.accepted);
        assert!(!dup.accepted);

        let reloading = params.with_opening_results(true);
        let dup = rel.duplicate(&reloading);
        assert_eq!(dup.peak(), Some(PeakKey(3)));
        assert_eq!(dup.nearby_relations_count(), None);
    }
}
