//! The relation pipeline, run one phase at a time or all at once.
//!
//! The phases are relation construction, the no-man's-land filter, neighborhood
//! grouping, peak aggregation and FDR estimation. Each phase completes before the next
//! begins, so a caller driving [`RelationEngine`] by hand may stop between any two of them.
use tracing::{info, warn};

use crate::comparison::RelationBuilder;
use crate::fdr::{FdrEstimator, FdrSummary};
use crate::interval::intervals_containing_point;
use crate::neighborhood::{NeighborhoodGrouper, SortedRelations};
use crate::params::{ConfigurationError, RelationConfig, RelationParams};
use crate::peak::{DeltaMassPeak, PeakAggregator};
use crate::proteoform::{Proteoform, ProteoformCommunity};
use crate::rational::ExactRational;
use crate::relation::{ProteoformComparison, ProteoformRelation, RelationError};

/// The relations and peaks of one comparison type
#[derive(Debug, Clone)]
pub struct RelationAnalysis<'a> {
    pub relation_type: ProteoformComparison,
    /// The relations outside no-man's-land, in delta mass order
    pub admissible: SortedRelations<'a>,
    /// The relations inside no-man's-land, in construction order
    pub rejected: Vec<ProteoformRelation<'a>>,
    pub peaks: Vec<DeltaMassPeak>,
    pub fdr_summary: FdrSummary,
}

impl<'a> RelationAnalysis<'a> {
    pub fn empty(relation_type: ProteoformComparison) -> Self {
        Self {
            relation_type,
            admissible: SortedRelations::default(),
            rejected: Vec::new(),
            peaks: Vec::new(),
            fdr_summary: FdrSummary::empty(relation_type),
        }
    }

    pub fn len(&self) -> usize {
        self.admissible.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn peak_of(&self, relation: &ProteoformRelation<'_>) -> Option<&DeltaMassPeak> {
        relation.peak().and_then(|key| self.peaks.get(key.0))
    }

    pub fn members(&self, peak: &DeltaMassPeak) -> &[ProteoformRelation<'a>] {
        &self.admissible.as_slice()[peak.members()]
    }

    pub fn accepted_peaks(&self) -> impl Iterator<Item = &DeltaMassPeak> + '_ {
        self.peaks.iter().filter(|p| p.peak_accepted())
    }

    /// The peaks whose member delta mass range covers `delta_mass`
    pub fn peaks_containing(&self, delta_mass: &ExactRational) -> Vec<&DeltaMassPeak> {
        intervals_containing_point(&self.peaks, delta_mass)
    }

    /// The member count of the peak `relation` belongs to
    pub fn peak_center_count(&self, relation: &ProteoformRelation<'_>) -> Option<usize> {
        self.peak_of(relation).map(|p| p.peak_relation_group_count())
    }

    /// The mean delta mass of the peak `relation` belongs to
    pub fn peak_center_delta_mass(&self, relation: &ProteoformRelation<'_>) -> Option<&ExactRational> {
        self.peak_of(relation).map(|p| p.peak_delta_mass_average())
    }
}

/// Runs the relation pipeline with one validated configuration
#[derive(Debug, Clone)]
pub struct RelationEngine {
    params: RelationParams,
}

impl RelationEngine {
    pub fn new(params: RelationParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &RelationConfig) -> Result<Self, ConfigurationError> {
        Ok(Self::new(config.validate()?))
    }

    pub fn params(&self) -> &RelationParams {
        &self.params
    }

    pub fn build_relations<'a>(
        &self,
        community: &ProteoformCommunity<'a>,
        comparison: ProteoformComparison,
    ) -> Result<Vec<ProteoformRelation<'a>>, RelationError> {
        RelationBuilder::new(&self.params).relate(community, comparison)
    }

    /// Split relations into the admissible set, sorted by delta mass, and the rejected
    /// relations that fall in no-man's-land
    pub fn partition_admissible<'a>(
        &self,
        relations: Vec<ProteoformRelation<'a>>,
    ) -> (SortedRelations<'a>, Vec<ProteoformRelation<'a>>) {
        let (admissible, rejected): (Vec<_>, Vec<_>) = relations
            .into_iter()
            .partition(|r| r.outside_no_mans_land(&self.params));
        (SortedRelations::new(admissible), rejected)
    }

    pub fn group_neighborhoods(&self, relations: &mut SortedRelations<'_>) {
        NeighborhoodGrouper::new(&self.params).assign(relations)
    }

    pub fn aggregate_peaks(&self, relations: &mut SortedRelations<'_>) -> Vec<DeltaMassPeak> {
        PeakAggregator::new(&self.params).aggregate(relations)
    }

    pub fn estimate_fdr(
        &self,
        relation_type: ProteoformComparison,
        targets: &SortedRelations<'_>,
        peaks: &mut [DeltaMassPeak],
        decoys: &[SortedRelations<'_>],
    ) -> FdrSummary {
        FdrEstimator::new().estimate(relation_type, targets, peaks, decoys)
    }

    /// Build the admissible null model relation sets for `comparison`: one per decoy
    /// database for experiment-theoretical, the unequal lysine relations for
    /// experiment-experiment, and none otherwise
    pub fn null_model<'a>(
        &self,
        community: &ProteoformCommunity<'a>,
        comparison: ProteoformComparison,
    ) -> Result<Vec<SortedRelations<'a>>, RelationError> {
        let sets = match comparison.null_model() {
            Some(ProteoformComparison::Ed) => RelationBuilder::new(&self.params)
                .relate_decoy_databases(community)?
                .into_iter()
                .map(|(_, relations)| self.partition_admissible(relations).0)
                .collect(),
            Some(null) => {
                vec![self.partition_admissible(self.build_relations(community, null)?).0]
            }
            None => Vec::new(),
        };
        Ok(sets)
    }

    /// Run every phase for `comparison`.
    ///
    /// An empty community or one without admissible relations is not an error: the
    /// analysis is returned empty and a warning is logged.
    #[tracing::instrument(level = "debug", skip(self, community))]
    pub fn analyze<'a>(
        &self,
        community: &ProteoformCommunity<'a>,
        comparison: ProteoformComparison,
    ) -> Result<RelationAnalysis<'a>, RelationError> {
        if community.is_empty() {
            warn!("No proteoforms were provided, there is nothing to relate");
            return Ok(RelationAnalysis::empty(comparison));
        }
        let relations = self.build_relations(community, comparison)?;
        let total = relations.len();
        let (mut admissible, rejected) = self.partition_admissible(relations);
        info!(
            "{total} {comparison} relations, {} admissible and {} in no-man's-land",
            admissible.len(),
            rejected.len()
        );
        if admissible.is_empty() {
            warn!("No admissible {comparison} relations were found");
        }

        self.group_neighborhoods(&mut admissible);
        let mut peaks = self.aggregate_peaks(&mut admissible);
        info!(
            "{} {comparison} peaks, {} accepted",
            peaks.len(),
            peaks.iter().filter(|p| p.peak_accepted()).count()
        );

        let fdr_summary = if comparison.null_model().is_some() {
            let decoys = self.null_model(community, comparison)?;
            let summary = self.estimate_fdr(comparison, &admissible, &mut peaks, &decoys);
            info!("{comparison} FDR: {:.4}", summary.fdr);
            summary
        } else {
            FdrSummary::empty(comparison)
        };

        Ok(RelationAnalysis {
            relation_type: comparison,
            admissible,
            rejected,
            peaks,
            fdr_summary,
        })
    }
}

/// Validate `config` and analyze `proteoforms` for one comparison type
pub fn analyze_relations<'a>(
    proteoforms: &'a [Proteoform],
    comparison: ProteoformComparison,
    config: &RelationConfig,
) -> Result<RelationAnalysis<'a>, RelationError> {
    let engine = RelationEngine::from_config(config)?;
    let community = ProteoformCommunity::new(proteoforms);
    engine.analyze(&community, comparison)
}
