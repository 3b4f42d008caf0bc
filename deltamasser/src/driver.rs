use std::fs;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::thread;

use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use deltamass::{
    ConfigurationError, Proteoform, ProteoformCommunity, RelationConfig, RelationEngine,
    RelationError,
};

use crate::args::{non_negative_float_f64, ArgComparison};
use crate::mass_range::DeltaMassRange;
use crate::summary::{ComparisonSummary, RunSummary};

#[derive(Debug, Error)]
pub enum DeltaMasserError {
    #[error("An IO error occurred: {0}")]
    IOError(
        #[source]
        #[from]
        io::Error,
    ),
    #[error("Failed to read proteoforms from {path}: {source}")]
    InputError {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse proteoforms from {path}: {source}")]
    MalformedInputError {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to write the summary: {0}")]
    OutputError(#[from] serde_json::Error),
    #[error("Failed to load the configuration: {0}")]
    ConfigurationLoadError(#[from] Box<figment::Error>),
    #[error("Invalid configuration: {0}")]
    ConfigurationError(#[from] ConfigurationError),
    #[error(transparent)]
    RelationError(#[from] RelationError),
    #[error("Failed to build the thread pool: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),
}

const fn default_threads() -> i32 {
    -1
}

fn default_comparisons() -> Vec<ArgComparison> {
    vec![ArgComparison::Et]
}

const fn default_no_mans_land_lower_bound() -> f64 {
    0.22
}

const fn default_no_mans_land_upper_bound() -> f64 {
    0.88
}

const fn default_peak_width() -> f64 {
    0.015
}

/// Relate proteoforms by their mass differences.
///
/// Read resolved proteoforms from a JSON file or stream, build the relations of each requested
/// comparison type, group them into delta mass peaks, estimate their FDR against decoy
/// relations, and write a JSON summary to STDOUT.
#[derive(Parser, Debug, Clone, Deserialize, Serialize)]
#[command(author, version)]
pub struct DeltaMasser {
    /// The path to read the input proteoforms from, or if '-' is passed, read from STDIN
    #[arg()]
    pub input_file: String,

    /// The path to write a log file to, in addition to STDERR
    #[arg(short = 'l', long = "log-file")]
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// A TOML configuration file to read additional parameters from.
    ///
    /// Configurations are also read from `deltamasser.toml` in the working directory.
    /// Environment variables prefixed with `DELTAMASSER_` will be read too.
    #[arg(long = "config-file")]
    #[serde(default)]
    pub config_file: Option<PathBuf>,

    /// The number of threads to use, passing a value < 1 to use all available threads
    #[arg(short = 't', long = "threads", default_value_t = default_threads())]
    #[serde(default = "default_threads")]
    pub threads: i32,

    /// The comparison types to relate proteoforms by
    #[arg(
        short = 'c',
        long = "comparison",
        value_enum,
        value_delimiter = ',',
        default_values_t = default_comparisons()
    )]
    #[serde(default = "default_comparisons")]
    pub comparisons: Vec<ArgComparison>,

    /// Relations whose absolute fractional delta mass is at most this are kept
    #[arg(long = "no-mans-land-lower", default_value_t = default_no_mans_land_lower_bound())]
    #[serde(default = "default_no_mans_land_lower_bound")]
    pub no_mans_land_lower_bound: f64,

    /// Relations whose absolute fractional delta mass is at least this are kept
    #[arg(long = "no-mans-land-upper", default_value_t = default_no_mans_land_upper_bound())]
    #[serde(default = "default_no_mans_land_upper_bound")]
    pub no_mans_land_upper_bound: f64,

    /// The delta mass peak width for relations to theoretical or decoy proteoforms
    #[arg(short = 'w', long = "peak-width-et", default_value_t = default_peak_width())]
    #[serde(default = "default_peak_width")]
    pub peak_width_base_et: f64,

    /// The delta mass peak width for all other relations
    #[arg(short = 'W', long = "peak-width-ee", default_value_t = default_peak_width())]
    #[serde(default = "default_peak_width")]
    pub peak_width_base_ee: f64,

    /// Whether the proteoforms carry lysine counts from NeuCode labeling
    #[arg(short = 'k', long = "lysine-labeled")]
    #[serde(default)]
    pub lysine_labeled: bool,

    /// The lysine count mismatch tolerated against theoretical and decoy proteoforms
    /// when lysine labeled
    #[arg(long = "missed-lysines", default_value_t = 0)]
    #[serde(default)]
    pub missed_lysines: u32,

    /// The minimum member count of an accepted peak of relations to theoretical proteoforms
    #[arg(long = "min-peak-count-et")]
    #[serde(default)]
    pub min_peak_count_et: Option<usize>,

    /// The minimum member count of an accepted peak of all other relations
    #[arg(long = "min-peak-count-ee")]
    #[serde(default)]
    pub min_peak_count_ee: Option<usize>,

    /// The delta mass range of relations to theoretical, decoy or top-down proteoforms,
    /// denoted (low):(high)
    #[arg(
        short = 'r',
        long = "et-mass-range",
        value_name = "LOW:HIGH",
        value_parser = DeltaMassRange::from_str,
        allow_hyphen_values = true
    )]
    #[serde(default)]
    pub et_mass_range: Option<DeltaMassRange>,

    /// The largest delta mass between two experimental proteoforms
    #[arg(long = "ee-max-mass-difference", value_parser = non_negative_float_f64)]
    #[serde(default)]
    pub ee_max_mass_difference: Option<f64>,

    /// The largest retention time difference between two experimental proteoforms
    #[arg(long = "ee-max-rt-difference", value_parser = non_negative_float_f64)]
    #[serde(default)]
    pub ee_max_retention_time_difference: Option<f64>,

    /// List every peak in the summary, not only the accepted ones
    #[arg(short = 'a', long = "all-peaks")]
    #[serde(default)]
    pub all_peaks: bool,
}

impl DeltaMasser {
    /// Layer `deltamasser.toml`, the `--config-file` and `DELTAMASSER_` environment variables
    /// over these arguments
    pub fn configure(self) -> Result<Self, DeltaMasserError> {
        let config_file = self.config_file.clone();
        let mut config =
            Figment::from(Serialized::defaults(self)).merge(Toml::file("deltamasser.toml"));
        if let Some(path) = config_file {
            config = config.merge(Toml::file_exact(path));
        }
        config = config.merge(Env::prefixed("DELTAMASSER_"));
        let driver = config.extract().map_err(Box::new)?;
        Ok(driver)
    }

    pub fn relation_config(&self) -> RelationConfig {
        let mut config = RelationConfig::new(
            self.no_mans_land_lower_bound,
            self.no_mans_land_upper_bound,
            self.peak_width_base_et,
            self.peak_width_base_ee,
        );
        config.lysine_labeled = self.lysine_labeled;
        config.missed_lysines = self.missed_lysines;
        config.min_peak_count_et = self.min_peak_count_et;
        config.min_peak_count_ee = self.min_peak_count_ee;
        config.et_mass_difference_range = self.et_mass_range.map(|r| (r.low, r.high));
        config.ee_max_mass_difference = self.ee_max_mass_difference;
        config.ee_max_retention_time_difference = self.ee_max_retention_time_difference;
        config
    }

    fn create_threadpool(&self) -> Result<rayon::ThreadPool, DeltaMasserError> {
        let num_threads = if self.threads > 0 {
            self.threads as usize
        } else {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        };
        debug!("Using {} cores", num_threads);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;
        Ok(pool)
    }

    pub fn read_proteoforms(&self) -> Result<Vec<Proteoform>, DeltaMasserError> {
        let path = self.input_file.clone();
        let parsed = if self.input_file == "-" {
            serde_json::from_reader(io::BufReader::new(io::stdin().lock()))
        } else {
            let fh = fs::File::open(&self.input_file)
                .map_err(|source| DeltaMasserError::InputError {
                    path: path.clone(),
                    source,
                })?;
            serde_json::from_reader(io::BufReader::new(fh))
        };
        parsed.map_err(|source| DeltaMasserError::MalformedInputError { path, source })
    }

    /// Run every requested comparison over `proteoforms`
    pub fn summarize(&self, proteoforms: &[Proteoform]) -> Result<RunSummary, DeltaMasserError> {
        let engine = RelationEngine::from_config(&self.relation_config())?;
        let community = ProteoformCommunity::new(proteoforms);
        info!(
            "{} experimental, {} theoretical, {} decoy ({} databases) and {} top-down proteoforms",
            community.experimental.len(),
            community.theoretical.len(),
            community
                .decoy_databases
                .iter()
                .map(|(_, d)| d.len())
                .sum::<usize>(),
            community.decoy_databases.len(),
            community.top_down.len()
        );
        let mut summary = RunSummary::new(proteoforms.len());
        for comparison in self.comparisons.iter().copied().unique() {
            let analysis = engine.analyze(&community, comparison.into())?;
            summary
                .comparisons
                .push(ComparisonSummary::new(&analysis, self.all_peaks));
        }
        Ok(summary)
    }

    pub fn main(&self) -> Result<(), DeltaMasserError> {
        info!(
            "deltamasser v{}",
            option_env!("CARGO_PKG_VERSION").unwrap_or("unknown")
        );
        info!("Input: {}", self.input_file);
        info!("Comparisons: {}", self.comparisons.iter().join(", "));
        let proteoforms = self.read_proteoforms()?;
        let summary = self
            .create_threadpool()?
            .install(|| self.summarize(&proteoforms))?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        summary.write(&mut handle)?;
        io::Write::write_all(&mut handle, b"\n")?;
        Ok(())
    }
}
