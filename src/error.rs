use thiserror::Error;

/// Error types for the sqw-fit library.
#[derive(Error, Debug)]
pub enum SqwFitError {
    /// Error indicating too few usable data points for a single-spectrum fit.
    #[error("Not enough valid data points for fitting: {found} usable, {required} required")]
    InsufficientData { found: usize, required: usize },

    /// Error indicating the solver failed to converge.
    #[error("Fit failed to converge: {0}")]
    ConvergenceFailure(String),

    /// Error indicating the intensity grid dimensions disagree with the axes.
    #[error("Dataset shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Error raised when an export is requested on a collection with no present entries.
    #[error("No valid fit results to export")]
    NoResultsToExport,

    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error for invalid bound specifications.
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    /// Error during computational operations.
    #[error("Computation error: {0}")]
    ComputationError(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SqwFitError {
    /// Whether a single-spectrum fit failure is recoverable at the batch level.
    ///
    /// Recoverable failures are recorded as absent slots by the batch
    /// orchestrator; everything else propagates to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SqwFitError::InsufficientData { .. } | SqwFitError::ConvergenceFailure(_)
        )
    }
}

/// Result type alias for sqw-fit operations.
pub type Result<T> = std::result::Result<T, SqwFitError>;
