//! Heat-exchanger-network synthesis via pinch analysis
//!
//! Given hot and cold process streams, this library computes minimum hot
//! and cold utility targets from the heat cascade, builds the
//! transshipment superstructure over temperature intervals, and solves
//! the minimum-number-of-matches MILP.

pub mod cascade;
pub mod error;
pub mod milp;
pub mod network;
pub mod problem;
mod solver;
pub mod synthesis;
pub mod transshipment;
pub mod types;
pub mod utils;

// Re-export main types and functions
pub use cascade::{CascadeSolution, solve_min_utility, solve_min_utility_with_tolerance};
pub use error::{HenError, Result};
pub use milp::MilpOptions;
pub use network::{COLD_UTILITY, HOT_UTILITY, Network};
pub use problem::{MinUtilityProblem, TemperatureInterval};
pub use synthesis::{HenSynthesis, HenSynthesisBuilder, SynthesisReport};
pub use transshipment::{HeatFlow, MatchModel, MatchPlan, solve_min_matches};
pub use types::{InMemorySource, ProblemData, ProblemSource, Stream, Utility};
pub use utils::{decimal_to_f64, f64_to_decimal, round_decimal};

#[cfg(feature = "csv")]
pub use types::CsvProblemSource;
