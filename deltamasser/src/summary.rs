use std::collections::BTreeMap;
use std::io;

use serde::Serialize;

use deltamass::interval::Span1D;
use deltamass::{DeltaMassPeak, ExactRational, ProteoformComparison, RelationAnalysis};

fn defined(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

#[derive(Debug, Clone, Serialize)]
pub struct PeakSummary {
    pub key: usize,
    pub relation_type: ProteoformComparison,
    pub peak_delta_mass_average: f64,
    /// The mean delta mass as an exact fraction
    pub exact_delta_mass_average: ExactRational,
    pub start: f64,
    pub end: f64,
    pub peak_relation_group_count: usize,
    pub counts_by_type: BTreeMap<ProteoformComparison, usize>,
    pub peak_accepted: bool,
    pub decoy_relation_count: Option<f64>,
    pub fdr: Option<f64>,
}

impl From<&DeltaMassPeak> for PeakSummary {
    fn from(peak: &DeltaMassPeak) -> Self {
        Self {
            key: peak.key().0,
            relation_type: peak.relation_type(),
            peak_delta_mass_average: peak.peak_delta_mass_average_f64(),
            exact_delta_mass_average: peak.peak_delta_mass_average().clone(),
            start: peak.start().to_f64(),
            end: peak.end().to_f64(),
            peak_relation_group_count: peak.peak_relation_group_count(),
            counts_by_type: peak.counts_by_type().clone(),
            peak_accepted: peak.peak_accepted(),
            decoy_relation_count: defined(peak.decoy_relation_count()),
            fdr: defined(peak.fdr()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonSummary {
    pub relation_type: ProteoformComparison,
    pub description: &'static str,
    pub relation_count: usize,
    pub admissible_count: usize,
    pub rejected_count: usize,
    pub peak_count: usize,
    pub accepted_peak_count: usize,
    pub expected_false: Option<f64>,
    pub fdr: Option<f64>,
    pub peaks: Vec<PeakSummary>,
}

impl ComparisonSummary {
    /// Summarize `analysis`, listing every peak if `all_peaks` or only the accepted ones otherwise
    pub fn new(analysis: &RelationAnalysis<'_>, all_peaks: bool) -> Self {
        let peaks = analysis
            .peaks
            .iter()
            .filter(|p| all_peaks || p.peak_accepted())
            .map(PeakSummary::from)
            .collect();
        Self {
            relation_type: analysis.relation_type,
            description: analysis.relation_type.as_str(),
            relation_count: analysis.len(),
            admissible_count: analysis.admissible.len(),
            rejected_count: analysis.rejected.len(),
            peak_count: analysis.peaks.len(),
            accepted_peak_count: analysis.accepted_peaks().count(),
            expected_false: defined(analysis.fdr_summary.expected_false),
            fdr: defined(analysis.fdr_summary.fdr),
            peaks,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub version: &'static str,
    pub proteoform_count: usize,
    pub comparisons: Vec<ComparisonSummary>,
}

impl RunSummary {
    pub fn new(proteoform_count: usize) -> Self {
        Self {
            version: option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
            proteoform_count,
            comparisons: Vec::new(),
        }
    }

    pub fn get(&self, relation_type: ProteoformComparison) -> Option<&ComparisonSummary> {
        self.comparisons
            .iter()
            .find(|c| c.relation_type == relation_type)
    }

    pub fn write<W: io::Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, self)
    }
}
