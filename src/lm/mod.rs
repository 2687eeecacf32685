//! Levenberg-Marquardt algorithm implementation.
//!
//! A lambda-damped least-squares minimizer with an evaluation budget,
//! used by the spectrum fitter through the Minuit bounds transform.

pub mod algorithm;
pub mod config;

pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::LmConfig;
