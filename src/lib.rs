//! # sqw-fit
//!
//! `sqw-fit` analyzes inelastic-scattering spectra S(Q,ω): each
//! momentum-transfer value Q holds one energy-transfer spectrum, which is
//! fitted to a closed-form lineshape (Lorentzian, double Lorentzian, or
//! Gaussian plus constant background) by weighted nonlinear least squares
//! with box constraints. Per-Q results carry 1-sigma parameter errors
//! propagated from the covariance matrix and assemble into a dispersion
//! relation and parameter trends across Q.
//!
//! The library provides:
//! - A Levenberg-Marquardt solver with Minuit-style bounds handling
//! - A masking, uncertainty-propagating single-spectrum fitter
//! - A failure-tolerant batch orchestrator with initial-guess heuristics
//! - Aggregation of per-Q results into derived series, and CSV export
//!
//! File loading, plotting and the user interface are collaborators
//! implemented elsewhere; the core consumes a validated [`Dataset`] and
//! returns structured results.
//!
//! ## Basic Usage
//!
//! ```
//! use rand::SeedableRng;
//! use sqw_fit::{AnalysisSession, Dataset};
//!
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
//! let dataset = Dataset::synthetic(20, 100, &mut rng);
//!
//! let mut session = AnalysisSession::new(dataset);
//! let fitted = session.fit_all();
//! assert!(fitted > 0);
//!
//! let series = session.aggregate();
//! assert_eq!(series.centers.len(), fitted);
//! ```

pub mod aggregate;
pub mod batch;
pub mod bounds;
pub mod dataset;
pub mod error;
pub mod export;
pub mod fit;
pub mod lineshape;
pub mod lm;
pub mod problem;
pub mod session;

mod utils;

// Re-exports for convenience
pub use aggregate::{aggregate, DerivedSeries};
pub use batch::{fit_all, fit_all_with_progress, BatchFitConfig, FitResult, FitResultCollection};
pub use bounds::{Bounds, BoundsTransform};
pub use dataset::Dataset;
pub use error::{Result, SqwFitError};
pub use export::export_results;
pub use fit::fit_spectrum;
pub use lineshape::Lineshape;
pub use lm::{LevenbergMarquardt, LmConfig};
pub use session::{AnalysisSession, InitialGuess};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
