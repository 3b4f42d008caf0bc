/*! Proteoform records consumed by the relation engine */
use crate::rational::{ExactRational, RationalError};

/// The variant-specific data of a [`Proteoform`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProteoformKind {
    /// A proteoform observed in deconvolved intact mass spectra
    Experimental {
        /// The summed intensity of all aggregated observations
        agg_intensity: f64,
        /// The intensity-weighted retention time of all aggregated observations
        agg_rt: f64,
        observation_count: usize,
    },
    /// A proteoform predicted from a protein database
    Theoretical {
        name: String,
        fragment: String,
        ptm_descriptions: String,
        /// The number of bottom-up peptide spectrum matches supporting the entry
        psm_count_bu: usize,
    },
    /// A shuffled database entry used as a null model for theoretical matches
    Decoy {
        name: String,
        ptm_descriptions: String,
        /// The decoy database this entry was drawn from
        database: usize,
    },
    /// A proteoform identified by top-down fragmentation
    TopDown {
        name: String,
        ptm_descriptions: String,
        agg_rt: f64,
        /// Whether the identification came from a targeted acquisition
        targeted: bool,
    },
}

/// The field-less discriminant of [`ProteoformKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProteoformClass {
    Experimental,
    Theoretical,
    Decoy,
    TopDown,
}

/// A single proteoform with a resolved mass.
///
/// The relation engine never mutates these, it only reads the fields it needs
/// to build [`ProteoformRelation`](crate::relation::ProteoformRelation)s.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Proteoform {
    pub accession: String,
    /// The observed mass for experimental proteoforms, or the modification-corrected
    /// theoretical mass otherwise
    pub modified_mass: f64,
    pub lysine_count: i32,
    pub kind: ProteoformKind,
}

impl Proteoform {
    pub fn new(accession: String, modified_mass: f64, lysine_count: i32, kind: ProteoformKind) -> Self {
        Self {
            accession,
            modified_mass,
            lysine_count,
            kind,
        }
    }

    pub fn experimental(
        accession: impl Into<String>,
        modified_mass: f64,
        lysine_count: i32,
        agg_intensity: f64,
        agg_rt: f64,
    ) -> Self {
        Self::new(
            accession.into(),
            modified_mass,
            lysine_count,
            ProteoformKind::Experimental {
                agg_intensity,
                agg_rt,
                observation_count: 1,
            },
        )
    }

    pub fn theoretical(
        accession: impl Into<String>,
        modified_mass: f64,
        lysine_count: i32,
        name: impl Into<String>,
        ptm_descriptions: impl Into<String>,
    ) -> Self {
        Self::new(
            accession.into(),
            modified_mass,
            lysine_count,
            ProteoformKind::Theoretical {
                name: name.into(),
                fragment: "full".to_string(),
                ptm_descriptions: ptm_descriptions.into(),
                psm_count_bu: 0,
            },
        )
    }

    pub fn decoy(
        accession: impl Into<String>,
        modified_mass: f64,
        lysine_count: i32,
        database: usize,
    ) -> Self {
        let accession = accession.into();
        Self::new(
            accession.clone(),
            modified_mass,
            lysine_count,
            ProteoformKind::Decoy {
                name: accession,
                ptm_descriptions: "unmodified".to_string(),
                database,
            },
        )
    }

    pub fn top_down(
        accession: impl Into<String>,
        modified_mass: f64,
        lysine_count: i32,
        agg_rt: f64,
        targeted: bool,
    ) -> Self {
        let accession = accession.into();
        Self::new(
            accession.clone(),
            modified_mass,
            lysine_count,
            ProteoformKind::TopDown {
                name: accession,
                ptm_descriptions: String::new(),
                agg_rt,
                targeted,
            },
        )
    }

    pub fn class(&self) -> ProteoformClass {
        match self.kind {
            ProteoformKind::Experimental { .. } => ProteoformClass::Experimental,
            ProteoformKind::Theoretical { .. } => ProteoformClass::Theoretical,
            ProteoformKind::Decoy { .. } => ProteoformClass::Decoy,
            ProteoformKind::TopDown { .. } => ProteoformClass::TopDown,
        }
    }

    /// Whether this proteoform came from a sequence database, decoy or otherwise.
    ///
    /// Relations whose second member is theoretical use the theoretical peak width.
    pub fn is_theoretical(&self) -> bool {
        matches!(
            self.kind,
            ProteoformKind::Theoretical { .. } | ProteoformKind::Decoy { .. }
        )
    }

    /// The exact value of [`Proteoform::modified_mass`]
    ///
    /// # Errors
    /// Fails if the mass is not finite.
    pub fn exact_mass(&self) -> Result<ExactRational, RationalError> {
        ExactRational::from_decimal_f64(self.modified_mass)
    }

    pub fn agg_intensity(&self) -> Option<f64> {
        match self.kind {
            ProteoformKind::Experimental { agg_intensity, .. } => Some(agg_intensity),
            _ => None,
        }
    }

    pub fn retention_time(&self) -> Option<f64> {
        match self.kind {
            ProteoformKind::Experimental { agg_rt, .. } | ProteoformKind::TopDown { agg_rt, .. } => {
                Some(agg_rt)
            }
            _ => None,
        }
    }

    pub fn observation_count(&self) -> Option<usize> {
        match self.kind {
            ProteoformKind::Experimental {
                observation_count, ..
            } => Some(observation_count),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            ProteoformKind::Experimental { .. } => None,
            ProteoformKind::Theoretical { name, .. }
            | ProteoformKind::Decoy { name, .. }
            | ProteoformKind::TopDown { name, .. } => Some(name),
        }
    }

    pub fn ptm_descriptions(&self) -> Option<&str> {
        match &self.kind {
            ProteoformKind::Experimental { .. } => None,
            ProteoformKind::Theoretical {
                ptm_descriptions, ..
            }
            | ProteoformKind::Decoy {
                ptm_descriptions, ..
            }
            | ProteoformKind::TopDown {
                ptm_descriptions, ..
            } => Some(ptm_descriptions),
        }
    }

    pub fn fragment(&self) -> Option<&str> {
        match &self.kind {
            ProteoformKind::Theoretical { fragment, .. } => Some(fragment),
            _ => None,
        }
    }

    pub fn psm_count_bu(&self) -> Option<usize> {
        match self.kind {
            ProteoformKind::Theoretical { psm_count_bu, .. } => Some(psm_count_bu),
            _ => None,
        }
    }

    pub fn decoy_database(&self) -> Option<usize> {
        match self.kind {
            ProteoformKind::Decoy { database, .. } => Some(database),
            _ => None,
        }
    }

    pub fn is_targeted(&self) -> bool {
        matches!(self.kind, ProteoformKind::TopDown { targeted: true, .. })
    }
}

/// All of the proteoforms of an analysis, partitioned by [`ProteoformClass`].
///
/// Decoys are further grouped by the database they were drawn from, in the order
/// in which each database is first seen.
#[derive(Debug, Default, Clone)]
pub struct ProteoformCommunity<'a> {
    pub experimental: Vec<&'a Proteoform>,
    pub theoretical: Vec<&'a Proteoform>,
    pub decoy_databases: Vec<(usize, Vec<&'a Proteoform>)>,
    pub top_down: Vec<&'a Proteoform>,
}

impl<'a> ProteoformCommunity<'a> {
    pub fn new(proteoforms: &'a [Proteoform]) -> Self {
        let mut community = Self::default();
        for pf in proteoforms {
            match &pf.kind {
                ProteoformKind::Experimental { .. } => community.experimental.push(pf),
                ProteoformKind::Theoretical { .. } => community.theoretical.push(pf),
                ProteoformKind::TopDown { .. } => community.top_down.push(pf),
                ProteoformKind::Decoy { database, .. } => {
                    match community
                        .decoy_databases
                        .iter_mut()
                        .find(|(db, _)| db == database)
                    {
                        Some((_, members)) => members.push(pf),
                        None => community.decoy_databases.push((*database, vec![pf])),
                    }
                }
            }
        }
        community
    }

    pub fn len(&self) -> usize {
        self.experimental.len()
            + self.theoretical.len()
            + self.top_down.len()
            + self
                .decoy_databases
                .iter()
                .map(|(_, members)| members.len())
                .sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn targeted_top_down(&self) -> impl Iterator<Item = &'a Proteoform> + '_ {
        self.top_down.iter().copied().filter(|pf| pf.is_targeted())
    }
}

impl<'a> From<&'a [Proteoform]> for ProteoformCommunity<'a> {
    fn from(value: &'a [Proteoform]) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_variant_access() {
        let e = Proteoform::experimental("E1", 10_000.5, 4, 1e6, 32.5);
        assert_eq!(e.class(), ProteoformClass::Experimental);
        assert_eq!(e.agg_intensity(), Some(1e6));
        assert_eq!(e.retention_time(), Some(32.5));
        assert_eq!(e.observation_count(), Some(1));
        assert_eq!(e.name(), None);
        assert!(!e.is_theoretical());

        let t = Proteoform::theoretical("P01", 9_999.0, 4, "ALBU", "phospho");
        assert_eq!(t.agg_intensity(), None);
        assert_eq!(t.name(), Some("ALBU"));
        assert_eq!(t.ptm_descriptions(), Some("phospho"));
        assert_eq!(t.fragment(), Some("full"));
        assert!(t.is_theoretical());

        let d = Proteoform::decoy("DECOY_1_P01", 9_998.0, 4, 1);
        assert!(d.is_theoretical());
        assert_eq!(d.decoy_database(), Some(1));
        assert_eq!(d.fragment(), None);

        let td = Proteoform::top_down("TD1", 9_999.1, 4, 30.0, true);
        assert!(!td.is_theoretical());
        assert!(td.is_targeted());
        assert_eq!(td.retention_time(), Some(30.0));
    }

    #[test]
    fn test_exact_mass() {
        let e = Proteoform::experimental("E1", 79.02, 0, 1.0, 1.0);
        assert_eq!(e.exact_mass().unwrap(), ExactRational::new(7902, 100).unwrap());
        let bad = Proteoform::experimental("E2", f64::NAN, 0, 1.0, 1.0);
        assert!(bad.exact_mass().is_err());
    }

    #[test]
    fn test_community_partition() {
        let pfs = vec![
            Proteoform::experimental("E1", 100.0, 0, 1.0, 1.0),
            Proteoform::decoy("D2", 100.0, 0, 2),
            Proteoform::theoretical("T1", 100.0, 0, "T1", ""),
            Proteoform::decoy("D1", 100.0, 0, 1),
            Proteoform::decoy("D2b", 101.0, 0, 2),
            Proteoform::top_down("TD1", 100.0, 0, 1.0, false),
        ];
        let community = ProteoformCommunity::new(&pfs);
        assert_eq!(community.len(), pfs.len());
        assert_eq!(community.experimental.len(), 1);
        assert_eq!(community.theoretical.len(), 1);
        assert_eq!(community.decoy_databases.len(), 2);
        assert_eq!(community.decoy_databases[0].0, 2);
        assert_eq!(community.decoy_databases[0].1.len(), 2);
        assert_eq!(community.targeted_top_down().count(), 0);

        let empty = ProteoformCommunity::new(&[]);
        assert!(empty.is_empty());
    }
}
