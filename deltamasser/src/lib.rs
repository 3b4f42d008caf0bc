mod args;
mod driver;
mod mass_range;
mod summary;

pub use args::*;
pub use driver::{DeltaMasser, DeltaMasserError};
pub use mass_range::{DeltaMassRange, DeltaMassRangeParseError};
pub use summary::{ComparisonSummary, PeakSummary, RunSummary};
