//! Closed-form lineshape models for spectral peaks.
//!
//! Each variant defines a fixed parameter arity and ordering:
//! amplitude, center, width (gamma or sigma), [second peak], background.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SqwFitError};

/// Human-readable name for a parameter index, shared by all lineshapes.
///
/// Indices beyond the named table fall back to `Param_i`.
pub fn param_name(index: usize) -> String {
    match index {
        0 => "Amplitude".to_string(),
        1 => "Center".to_string(),
        2 => "Width".to_string(),
        3 => "Background".to_string(),
        i => format!("Param_{}", i),
    }
}

/// A closed set of peak models for fitting S(Q,ω) spectra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lineshape {
    /// A * (γ/2)² / ((x - x0)² + (γ/2)²) + C, parameters [A, x0, γ, C]
    Lorentzian,

    /// Sum of two Lorentzian terms with a shared background,
    /// parameters [A1, x01, γ1, A2, x02, γ2, C]
    DoubleLorentzian,

    /// A * exp(-(x - x0)² / (2σ²)) + C, parameters [A, x0, σ, C]
    Gaussian,
}

impl Lineshape {
    /// Number of parameters the model takes.
    pub fn param_count(&self) -> usize {
        match self {
            Lineshape::Lorentzian => 4,
            Lineshape::DoubleLorentzian => 7,
            Lineshape::Gaussian => 4,
        }
    }

    /// Evaluate the model at the given x values.
    ///
    /// Pure and vectorized over x. Fails with `DimensionMismatch` if the
    /// parameter vector does not match the model arity.
    pub fn evaluate(&self, x: &Array1<f64>, params: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != self.param_count() {
            return Err(SqwFitError::DimensionMismatch(format!(
                "{:?} expects {} parameters, got {}",
                self,
                self.param_count(),
                params.len()
            )));
        }

        let y = match self {
            Lineshape::Lorentzian => {
                let (a, x0, gamma, c) = (params[0], params[1], params[2], params[3]);
                x.mapv(|x| lorentzian_term(x, a, x0, gamma) + c)
            }
            Lineshape::DoubleLorentzian => {
                let (a1, x01, gamma1) = (params[0], params[1], params[2]);
                let (a2, x02, gamma2) = (params[3], params[4], params[5]);
                let c = params[6];
                x.mapv(|x| {
                    lorentzian_term(x, a1, x01, gamma1) + lorentzian_term(x, a2, x02, gamma2) + c
                })
            }
            Lineshape::Gaussian => {
                let (a, x0, sigma, c) = (params[0], params[1], params[2], params[3]);
                x.mapv(|x| {
                    let arg = x - x0;
                    a * (-arg * arg / (2.0 * sigma * sigma)).exp() + c
                })
            }
        };

        Ok(y)
    }
}

/// Single Lorentzian peak term (no background).
fn lorentzian_term(x: f64, a: f64, x0: f64, gamma: f64) -> f64 {
    let half_gamma_sq = (gamma / 2.0) * (gamma / 2.0);
    let dx = x - x0;
    a * half_gamma_sq / (dx * dx + half_gamma_sq)
}
