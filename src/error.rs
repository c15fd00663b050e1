use rust_decimal::Decimal;
use thiserror::Error;

/// Error types for the HEN synthesis pipeline
#[derive(Debug, Error)]
pub enum HenError {
    /// Malformed stream definition
    #[error("Invalid stream ({tin} -> {tout}, FCp {fcp}): {reason}")]
    InvalidStream {
        tin: Decimal,
        tout: Decimal,
        fcp: Decimal,
        reason: String,
    },

    /// Malformed problem definition (bad ΔTmin, empty stream set)
    #[error("Invalid problem definition: {0}")]
    InvalidProblem(String),

    /// Requested problem identifier not found in the data source
    #[error("Unknown problem identifier: {id}")]
    UnknownProblem { id: String },

    /// The heat cascade admits no non-negative residual profile
    #[error("Infeasible heat cascade: {reason}")]
    InfeasibleCascade { reason: String },

    /// The LP/MILP engine reported infeasible, unbounded, or an internal error
    #[error("Solver failure during {stage}: {status}")]
    SolverFailure { stage: String, status: String },

    /// Constraint matrix assembly failed
    #[error("Model construction error: {0}")]
    ModelConstruction(String),

    /// Synthesis pipeline configuration error
    #[error("Synthesis configuration build error: {0}")]
    SynthesisBuild(#[from] crate::synthesis::HenSynthesisBuilderError),

    /// Problem data loading error (CSV source)
    #[cfg(feature = "csv")]
    #[error("Problem data error: {0}")]
    DataSource(String),
}

/// Result type alias for HEN synthesis operations
pub type Result<T> = std::result::Result<T, HenError>;
