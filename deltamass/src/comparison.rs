//! Construction of every valid relation of one comparison type from a [`ProteoformCommunity`].
//!
//! Each relation depends only on its two proteoforms, so pairs are evaluated in parallel.
//! The results are always collected in input order.
use rayon::prelude::*;
use tracing::debug;

use crate::params::RelationParams;
use crate::proteoform::{Proteoform, ProteoformCommunity};
use crate::rational::ExactRational;
use crate::relation::{exact_mass_of, ProteoformComparison, ProteoformRelation, RelationError};

fn exact_masses(proteoforms: &[&Proteoform]) -> Result<Vec<ExactRational>, RelationError> {
    proteoforms.iter().map(|pf| exact_mass_of(pf)).collect()
}

/// Pairs proteoforms according to the rules of each [`ProteoformComparison`]
#[derive(Debug, Clone, Copy)]
pub struct RelationBuilder<'p> {
    params: &'p RelationParams,
}

impl<'p> RelationBuilder<'p> {
    pub fn new(params: &'p RelationParams) -> Self {
        Self { params }
    }

    /// Build all relations of type `comparison`. Decoy relations from every decoy database
    /// are returned together, see [`RelationBuilder::relate_decoy_databases`] to keep them apart.
    ///
    /// An empty side of the comparison yields no relations and no error.
    ///
    /// # Errors
    /// [`RelationError::InvalidMass`] for the first proteoform whose mass is not finite
    #[tracing::instrument(level = "debug", skip(self, community))]
    pub fn relate<'a>(
        &self,
        community: &ProteoformCommunity<'a>,
        comparison: ProteoformComparison,
    ) -> Result<Vec<ProteoformRelation<'a>>, RelationError> {
        let relations = match comparison {
            ProteoformComparison::Et => {
                self.cross(&community.experimental, &community.theoretical, comparison)?
            }
            ProteoformComparison::Ed => self
                .relate_decoy_databases(community)?
                .into_iter()
                .flat_map(|(_, relations)| relations)
                .collect(),
            ProteoformComparison::Ee | ProteoformComparison::Ef => {
                self.among(&community.experimental, comparison)?
            }
            ProteoformComparison::Etd => {
                self.cross(&community.experimental, &community.top_down, comparison)?
            }
            ProteoformComparison::Ettd => {
                let targeted: Vec<&Proteoform> = community.targeted_top_down().collect();
                self.cross(&community.experimental, &targeted, comparison)?
            }
            ProteoformComparison::Ttd => {
                self.cross(&community.theoretical, &community.top_down, comparison)?
            }
        };
        debug!("Built {} {comparison} relations", relations.len());
        Ok(relations)
    }

    /// Build the experiment-decoy relations of each decoy database separately, in the
    /// order the databases were first seen
    pub fn relate_decoy_databases<'a>(
        &self,
        community: &ProteoformCommunity<'a>,
    ) -> Result<Vec<(usize, Vec<ProteoformRelation<'a>>)>, RelationError> {
        community
            .decoy_databases
            .iter()
            .map(|(database, decoys)| {
                self.cross(&community.experimental, decoys, ProteoformComparison::Ed)
                    .map(|relations| (*database, relations))
            })
            .collect()
    }

    /// Whether a pair passes the rules of `comparison` beyond its proteoform classes
    pub fn admits(
        &self,
        comparison: ProteoformComparison,
        pf1: &Proteoform,
        pf2: &Proteoform,
        delta_mass: &ExactRational,
    ) -> bool {
        let params = self.params;
        match comparison {
            ProteoformComparison::Et | ProteoformComparison::Ed => {
                self.within_et_range(delta_mass)
                    && (!params.lysine_labeled()
                        || pf1.lysine_count.abs_diff(pf2.lysine_count) <= params.missed_lysines())
            }
            ProteoformComparison::Etd | ProteoformComparison::Ttd | ProteoformComparison::Ettd => {
                self.within_et_range(delta_mass)
            }
            ProteoformComparison::Ee | ProteoformComparison::Ef => {
                let same_lysines = pf1.lysine_count == pf2.lysine_count;
                let lysines_ok = match comparison {
                    ProteoformComparison::Ee => !params.lysine_labeled() || same_lysines,
                    _ => params.lysine_labeled() && !same_lysines,
                };
                lysines_ok
                    && params
                        .ee_max_mass_difference
                        .as_ref()
                        .is_none_or(|max| delta_mass <= max)
                    && params.ee_max_retention_time_difference().is_none_or(|max| {
                        match (pf1.retention_time(), pf2.retention_time()) {
                            (Some(rt1), Some(rt2)) => (rt1 - rt2).abs() <= max,
                            _ => false,
                        }
                    })
            }
        }
    }

    fn within_et_range(&self, delta_mass: &ExactRational) -> bool {
        self.params
            .et_mass_difference_range
            .as_ref()
            .is_none_or(|(low, high)| low <= delta_mass && delta_mass <= high)
    }

    /// Every `left` × `right` pair, with the left proteoform first
    fn cross<'a>(
        &self,
        left: &[&'a Proteoform],
        right: &[&'a Proteoform],
        comparison: ProteoformComparison,
    ) -> Result<Vec<ProteoformRelation<'a>>, RelationError> {
        if left.is_empty() || right.is_empty() {
            return Ok(Vec::new());
        }
        let left_masses = exact_masses(left)?;
        let right_masses = &exact_masses(right)?;
        let relations = left
            .par_iter()
            .zip(left_masses.par_iter())
            .flat_map_iter(move |(&pf1, m1)| {
                right
                    .iter()
                    .zip(right_masses.iter())
                    .filter_map(move |(&pf2, m2)| self.pair(pf1, pf2, m1, m2, comparison))
            })
            .collect();
        Ok(relations)
    }

    /// Every unordered pair within `proteoforms`, oriented so that the second proteoform is
    /// the heavier one. Equal masses keep their input order.
    fn among<'a>(
        &self,
        proteoforms: &[&'a Proteoform],
        comparison: ProteoformComparison,
    ) -> Result<Vec<ProteoformRelation<'a>>, RelationError> {
        if proteoforms.len() < 2 {
            return Ok(Vec::new());
        }
        let masses = &exact_masses(proteoforms)?;
        let n = proteoforms.len();
        let relations = (0..n)
            .into_par_iter()
            .flat_map_iter(move |i| {
                (i + 1..n).filter_map(move |j| {
                    let (a, b) = if masses[j] < masses[i] { (j, i) } else { (i, j) };
                    self.pair(
                        proteoforms[a],
                        proteoforms[b],
                        &masses[a],
                        &masses[b],
                        comparison,
                    )
                })
            })
            .collect();
        Ok(relations)
    }

    fn pair<'a>(
        &self,
        pf1: &'a Proteoform,
        pf2: &'a Proteoform,
        m1: &ExactRational,
        m2: &ExactRational,
        comparison: ProteoformComparison,
    ) -> Option<ProteoformRelation<'a>> {
        let delta_mass = m2 - m1;
        self.admits(comparison, pf1, pf2, &delta_mass)
            .then(|| ProteoformRelation::from_delta(pf1, pf2, comparison, delta_mass, self.params))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn params() -> RelationParams {
        RelationParams::new(0.22, 0.88, 0.015, 0.02).unwrap()
    }

    fn community_fixture() -> Vec<Proteoform> {
        vec![
            Proteoform::experimental("E1", 10_000.0, 4, 1.0, 10.0),
            Proteoform::experimental("E2", 10_042.01, 4, 1.0, 11.0),
            Proteoform::experimental("E3", 9_980.0, 5, 1.0, 30.0),
            Proteoform::theoretical("T1", 10_000.01, 4, "P1", "unmodified"),
            Proteoform::theoretical("T2", 10_500.0, 7, "P2", "unmodified"),
            Proteoform::decoy("D1", 10_010.0, 4, 0),
            Proteoform::decoy("D2", 10_020.0, 7, 1),
            Proteoform::decoy("D3", 10_030.0, 4, 0),
            Proteoform::top_down("TD1", 10_042.0, 4, 11.0, true),
            Proteoform::top_down("TD2", 10_100.0, 4, 40.0, false),
        ]
    }

    #[test]
    fn test_experiment_theoretical() {
        let params = params();
        let pfs = community_fixture();
        let community = ProteoformCommunity::new(&pfs);
        let builder = RelationBuilder::new(&params);
        let et = builder.relate(&community, ProteoformComparison::Et).unwrap();
        assert_eq!(et.len(), 6);
        assert_eq!(et[0].accession_1(), "E1");
        assert_eq!(et[0].accession_2(), "T1");
        assert_eq!(*et[0].delta_mass(), ExactRational::new(1, 100).unwrap());
        assert!(et.iter().all(|r| r.proteoform_1().accession.starts_with('E')));
        assert!(et.iter().all(|r| r.lysine_count.is_none()));

        let ttd = builder.relate(&community, ProteoformComparison::Ttd).unwrap();
        assert_eq!(ttd.len(), 4);
        let etd = builder.relate(&community, ProteoformComparison::Etd).unwrap();
        assert_eq!(etd.len(), 6);
        let ettd = builder.relate(&community, ProteoformComparison::Ettd).unwrap();
        assert_eq!(ettd.len(), 3);
        assert!(ettd.iter().all(|r| r.accession_2() == "TD1"));
    }

    #[test]
    fn test_decoy_databases() {
        let params = params();
        let pfs = community_fixture();
        let community = ProteoformCommunity::new(&pfs);
        let builder = RelationBuilder::new(&params);
        let per_db = builder.relate_decoy_databases(&community).unwrap();
        assert_eq!(per_db.len(), 2);
        assert_eq!(per_db[0].0, 0);
        assert_eq!(per_db[0].1.len(), 6);
        assert_eq!(per_db[1].1.len(), 3);
        let ed = builder.relate(&community, ProteoformComparison::Ed).unwrap();
        assert_eq!(ed.len(), 9);
        assert!(ed.iter().all(|r| r.uses_theoretical_width()));
    }

    #[test]
    fn test_experiment_experiment() {
        let params = params();
        let pfs = community_fixture();
        let community = ProteoformCommunity::new(&pfs);
        let builder = RelationBuilder::new(&params);
        let ee = builder.relate(&community, ProteoformComparison::Ee).unwrap();
        assert_eq!(ee.len(), 3);
        assert!(ee.iter().all(|r| r.delta_mass().signum() >= 0));
        // E3 is the lightest, so it is always first
        assert_eq!(ee[1].accession_1(), "E3");
        assert_eq!(ee[1].accession_2(), "E1");
        let ef = builder.relate(&community, ProteoformComparison::Ef).unwrap();
        assert!(ef.is_empty());

        let labeled = params.with_lysine_labeling(true);
        let builder = RelationBuilder::new(&labeled);
        let ee = builder.relate(&community, ProteoformComparison::Ee).unwrap();
        assert_eq!(ee.len(), 1);
        assert_eq!(ee[0].lysine_count, Some(4));
        let ef = builder.relate(&community, ProteoformComparison::Ef).unwrap();
        assert_eq!(ef.len(), 2);
        assert!(ef
            .iter()
            .all(|r| r.proteoform_1().lysine_count != r.proteoform_2().lysine_count));
    }

    #[test]
    fn test_optional_constraints() {
        let pfs = community_fixture();
        let community = ProteoformCommunity::new(&pfs);

        let ranged = params().with_et_mass_difference_range(-50.0, 50.0).unwrap();
        let et = RelationBuilder::new(&ranged)
            .relate(&community, ProteoformComparison::Et)
            .unwrap();
        assert_eq!(et.len(), 3);

        let limited = params()
            .with_ee_max_mass_difference(30.0)
            .unwrap()
            .with_ee_max_retention_time_difference(5.0)
            .unwrap();
        let ee = RelationBuilder::new(&limited)
            .relate(&community, ProteoformComparison::Ee)
            .unwrap();
        assert!(ee.is_empty());
        let limited = params().with_ee_max_retention_time_difference(5.0).unwrap();
        let ee = RelationBuilder::new(&limited)
            .relate(&community, ProteoformComparison::Ee)
            .unwrap();
        assert_eq!(ee.len(), 1);
        assert_eq!(ee[0].accession_2(), "E2");

        let missed = params().with_lysine_labeling(true).with_missed_lysines(1);
        let et = RelationBuilder::new(&missed)
            .relate(&community, ProteoformComparison::Et)
            .unwrap();
        // E1, E2 and E3 against T1, the lysine counts of T2 are too far off
        assert_eq!(et.len(), 3);
    }

    #[test]
    fn test_empty_and_invalid() {
        let params = params();
        let empty: Vec<Proteoform> = Vec::new();
        let community = ProteoformCommunity::new(&empty);
        let builder = RelationBuilder::new(&params);
        for comparison in ProteoformComparison::ALL {
            assert!(builder.relate(&community, comparison).unwrap().is_empty());
        }

        let pfs = vec![
            Proteoform::experimental("E1", f64::NAN, 0, 1.0, 1.0),
            Proteoform::theoretical("T1", 1_000.0, 0, "P", ""),
        ];
        let community = ProteoformCommunity::new(&pfs);
        let err = builder
            .relate(&community, ProteoformComparison::Et)
            .unwrap_err();
        assert!(matches!(err, RelationError::InvalidMass { accession, .. } if accession == "E1"));
        // Nothing to pair the bad mass with, so it is never looked at
        assert!(builder
            .relate(&community, ProteoformComparison::Ee)
            .unwrap()
            .is_empty());
    }
}
