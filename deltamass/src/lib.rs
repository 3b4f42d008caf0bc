//! Mass difference relations between proteoforms, grouped into delta mass peaks with
//! decoy-based false discovery rates.
//!
//! Relation delta masses are exact rationals, so grouping at sub-integer resolution never
//! accumulates floating point error. See [`api::RelationEngine`] for the pipeline.
pub mod rational;
pub mod proteoform;
pub mod relation;
pub mod comparison;
pub mod interval;
pub mod neighborhood;
pub mod peak;
pub mod fdr;
pub mod params;
pub mod api;

pub use api::{analyze_relations, RelationAnalysis, RelationEngine};
pub use fdr::{FdrEstimator, FdrSummary};
pub use neighborhood::{Neighborhood, NeighborhoodGrouper, SortedRelations};
pub use params::{ConfigurationError, RelationConfig, RelationParams};
pub use peak::{DeltaMassPeak, PeakAggregator, PeakKey};
pub use proteoform::{Proteoform, ProteoformClass, ProteoformCommunity, ProteoformKind};
pub use rational::{ExactRational, RationalError};
pub use relation::{NoMansLand, ProteoformComparison, ProteoformRelation, RelationError};
