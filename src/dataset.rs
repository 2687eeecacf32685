//! The S(Q,ω) dataset consumed by the fitting engine.
//!
//! Construction validates the grid shape invariants; loaders (NeXus/HDF5
//! readers and their field-name heuristics) live outside this crate and
//! must hand over already-reconciled arrays.

use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{Result, SqwFitError};

/// Default per-point weight used when a dataset carries no error grid.
pub const DEFAULT_ERROR: f64 = 0.1;

/// An inelastic-scattering dataset: one energy-transfer spectrum per
/// momentum-transfer value.
#[derive(Debug, Clone)]
pub struct Dataset {
    q: Array1<f64>,
    omega: Array1<f64>,
    intensity: Array2<f64>,
    intensity_error: Option<Array2<f64>>,
}

impl Dataset {
    /// Create a dataset, validating the shape invariants.
    ///
    /// The intensity grid must be `len(q) x len(omega)`; the error grid,
    /// when present, must match the intensity grid. Fails with
    /// `ShapeMismatch` otherwise, and no partial dataset is produced.
    pub fn new(
        q: Array1<f64>,
        omega: Array1<f64>,
        intensity: Array2<f64>,
        intensity_error: Option<Array2<f64>>,
    ) -> Result<Self> {
        let expected = (q.len(), omega.len());
        if intensity.dim() != expected {
            return Err(SqwFitError::ShapeMismatch(format!(
                "intensity grid is {:?}, expected {:?} from q/omega lengths",
                intensity.dim(),
                expected
            )));
        }

        if let Some(errors) = &intensity_error {
            if errors.dim() != expected {
                return Err(SqwFitError::ShapeMismatch(format!(
                    "error grid is {:?}, expected {:?}",
                    errors.dim(),
                    expected
                )));
            }
        }

        Ok(Self {
            q,
            omega,
            intensity,
            intensity_error,
        })
    }

    /// Momentum-transfer axis.
    pub fn q(&self) -> &Array1<f64> {
        &self.q
    }

    /// Energy-transfer axis.
    pub fn omega(&self) -> &Array1<f64> {
        &self.omega
    }

    /// The full intensity grid.
    pub fn intensity(&self) -> &Array2<f64> {
        &self.intensity
    }

    /// The stored error grid, if any.
    pub fn intensity_error(&self) -> Option<&Array2<f64>> {
        self.intensity_error.as_ref()
    }

    /// Number of Q points.
    pub fn n_q(&self) -> usize {
        self.q.len()
    }

    /// Number of energy-transfer points per spectrum.
    pub fn n_omega(&self) -> usize {
        self.omega.len()
    }

    /// Intensity spectrum at the given Q index.
    pub fn spectrum(&self, q_index: usize) -> ArrayView1<'_, f64> {
        self.intensity.row(q_index)
    }

    /// Error bars for the spectrum at the given Q index.
    ///
    /// Falls back to the constant default weight when the dataset carries
    /// no error grid.
    pub fn errors_for(&self, q_index: usize) -> Array1<f64> {
        match &self.intensity_error {
            Some(errors) => errors.row(q_index).to_owned(),
            None => Array1::from_elem(self.n_omega(), DEFAULT_ERROR),
        }
    }

    /// Heuristic error grid `sqrt(|intensity| + 0.01)` for callers whose
    /// files carry no uncertainty information.
    pub fn heuristic_errors(intensity: &Array2<f64>) -> Array2<f64> {
        intensity.mapv(|v| (v.abs() + 0.01).sqrt())
    }

    /// Generate a synthetic dataset for testing and demonstration.
    ///
    /// A Lorentzian peak dispersing as ω0 = 2Q with width γ = 0.5 + 0.1Q,
    /// a weak mirror peak at -ω0, a Gaussian-bump background and additive
    /// noise, sampled on q in [0.1, 3.0] and omega in [-5, 5].
    pub fn synthetic<R: Rng>(n_q: usize, n_omega: usize, rng: &mut R) -> Self {
        let q = Array1::linspace(0.1, 3.0, n_q);
        let omega = Array1::<f64>::linspace(-5.0, 5.0, n_omega);
        let noise: Normal<f64> = Normal::new(0.0, 1.0).expect("valid normal distribution");

        let mut intensity = Array2::zeros((n_q, n_omega));
        for (i, &q_val) in q.iter().enumerate() {
            let omega0 = 2.0 * q_val;
            let gamma = 0.5 + 0.1 * q_val;
            let half_sq = (gamma / 2.0) * (gamma / 2.0);
            let mirror_half_sq = (0.6 / 2.0) * (0.6 / 2.0);

            for (j, &w) in omega.iter().enumerate() {
                let peak = 5.0 * half_sq / ((w - omega0).powi(2) + half_sq);
                let mirror = 0.5 * mirror_half_sq / ((w + omega0).powi(2) + mirror_half_sq);
                let background = 0.1 * (-w * w / 10.0).exp();
                let value = peak + mirror + background + 0.05 * noise.sample(rng);
                intensity[[i, j]] = value.abs();
            }
        }

        let errors = intensity.mapv(|v| 0.1 * (v + 0.01).sqrt());

        Self {
            q,
            omega,
            intensity,
            intensity_error: Some(errors),
        }
    }
}
