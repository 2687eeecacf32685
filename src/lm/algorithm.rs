//! Core implementation of the Levenberg-Marquardt algorithm.

use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{Result, SqwFitError};
use crate::problem::Problem;
use crate::utils::matrix_convert::{
    nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};

use super::config::LmConfig;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals at the solution
    pub cost: f64,

    /// Number of accepted iterations
    pub iterations: usize,

    /// Number of residual evaluations (counting Jacobian columns)
    pub func_evals: usize,

    /// Whether the optimization succeeded
    pub success: bool,

    /// A message describing the result
    pub message: String,

    /// The Jacobian at the solution, available on success
    pub jacobian: Option<Array2<f64>>,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new optimizer with default configuration.
    pub fn new() -> Self {
        Self {
            config: LmConfig::default(),
        }
    }

    /// Create a new optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// Non-convergence (exhausted evaluation budget, stalled damping,
    /// maximum iterations) is reported through `LmResult::success` and
    /// `LmResult::message`; hard errors (dimension mismatch, failed
    /// evaluation) are returned as `Err`.
    pub fn minimize<P: Problem>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
    ) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(SqwFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut lambda = self.config.initial_lambda;

        let mut residuals = problem.eval(&params)?;
        let mut func_evals = 1usize;
        let mut cost: f64 = residuals.iter().map(|r| r.powi(2)).sum();
        let mut iterations = 0usize;

        loop {
            if func_evals + n_params > self.config.max_evaluations {
                return Ok(self.failed(
                    params,
                    residuals,
                    cost,
                    iterations,
                    func_evals,
                    format!(
                        "Evaluation budget ({}) exhausted",
                        self.config.max_evaluations
                    ),
                ));
            }

            let jac = problem.jacobian(&params)?;
            func_evals += n_params;

            // Gradient g = J^T * r
            let gradient = jac.t().dot(&residuals);
            let gradient_norm = gradient.dot(&gradient).sqrt();
            if gradient_norm < self.config.gtol {
                return Ok(LmResult {
                    params,
                    residuals,
                    cost,
                    iterations,
                    func_evals,
                    success: true,
                    message: format!(
                        "Gradient convergence: ||g|| = {:.2e} < {:.2e}",
                        gradient_norm, self.config.gtol
                    ),
                    jacobian: Some(jac),
                });
            }

            let jtj = jac.t().dot(&jac);

            // Inner damping loop: retry the step with increasing lambda
            // until the cost decreases or the damping stalls.
            loop {
                let step = match self.solve_step(&jtj, &gradient, lambda) {
                    Some(step) => step,
                    None => {
                        lambda = (lambda * self.config.lambda_up_factor)
                            .min(self.config.max_lambda);
                        if lambda >= self.config.max_lambda {
                            return Ok(self.failed(
                                params,
                                residuals,
                                cost,
                                iterations,
                                func_evals,
                                "Singular normal equations, and lambda reached maximum"
                                    .to_string(),
                            ));
                        }
                        continue;
                    }
                };

                if func_evals + 1 > self.config.max_evaluations {
                    return Ok(self.failed(
                        params,
                        residuals,
                        cost,
                        iterations,
                        func_evals,
                        format!(
                            "Evaluation budget ({}) exhausted",
                            self.config.max_evaluations
                        ),
                    ));
                }

                let new_params = &params + &step;
                let new_residuals = problem.eval(&new_params)?;
                func_evals += 1;
                let new_cost: f64 = new_residuals.iter().map(|r| r.powi(2)).sum();

                if new_cost.is_finite() && new_cost < cost {
                    // Step accepted
                    let param_change =
                        step.iter().fold(0.0_f64, |max, s| max.max(s.abs()));
                    let cost_change = (cost - new_cost) / cost.max(1e-300);

                    params = new_params;
                    residuals = new_residuals;
                    cost = new_cost;
                    lambda = (lambda * self.config.lambda_down_factor)
                        .max(self.config.min_lambda);
                    iterations += 1;

                    if param_change < self.config.xtol {
                        let jac = problem.jacobian(&params)?;
                        func_evals += n_params;
                        return Ok(LmResult {
                            params,
                            residuals,
                            cost,
                            iterations,
                            func_evals,
                            success: true,
                            message: format!(
                                "Parameter convergence: max|dx| = {:.2e} < {:.2e}",
                                param_change, self.config.xtol
                            ),
                            jacobian: Some(jac),
                        });
                    }
                    if cost_change < self.config.ftol {
                        let jac = problem.jacobian(&params)?;
                        func_evals += n_params;
                        return Ok(LmResult {
                            params,
                            residuals,
                            cost,
                            iterations,
                            func_evals,
                            success: true,
                            message: format!(
                                "Cost convergence: |df|/|f| = {:.2e} < {:.2e}",
                                cost_change, self.config.ftol
                            ),
                            jacobian: Some(jac),
                        });
                    }
                    if iterations >= self.config.max_iterations {
                        return Ok(self.failed(
                            params,
                            residuals,
                            cost,
                            iterations,
                            func_evals,
                            format!(
                                "Maximum iterations ({}) reached",
                                self.config.max_iterations
                            ),
                        ));
                    }

                    break;
                }

                // Step rejected - increase lambda and try again
                lambda = (lambda * self.config.lambda_up_factor).min(self.config.max_lambda);
                if lambda >= self.config.max_lambda {
                    return Ok(self.failed(
                        params,
                        residuals,
                        cost,
                        iterations,
                        func_evals,
                        "Failed to decrease cost, and lambda reached maximum".to_string(),
                    ));
                }
            }
        }
    }

    /// Solve the damped normal equations (J^T J + lambda * D) step = -g,
    /// where D is the diagonal of J^T J (Marquardt scaling).
    ///
    /// Returns `None` when the system is singular at this lambda.
    fn solve_step(
        &self,
        jtj: &Array2<f64>,
        gradient: &Array1<f64>,
        lambda: f64,
    ) -> Option<Array1<f64>> {
        let n = jtj.nrows();
        let mut a = ndarray_to_nalgebra(jtj);
        for i in 0..n {
            let d = a[(i, i)];
            // Fall back to unit scaling on a zero diagonal entry
            a[(i, i)] = d + lambda * if d > 0.0 { d } else { 1.0 };
        }

        let b = -ndarray_vec_to_nalgebra(gradient);

        let solution = match a.clone().cholesky() {
            Some(chol) => Some(chol.solve(&b)),
            None => a.lu().solve(&b),
        }?;

        let step = nalgebra_vec_to_ndarray(&solution);
        if step.iter().all(|s| s.is_finite()) {
            Some(step)
        } else {
            None
        }
    }

    fn failed(
        &self,
        params: Array1<f64>,
        residuals: Array1<f64>,
        cost: f64,
        iterations: usize,
        func_evals: usize,
        message: String,
    ) -> LmResult {
        LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success: false,
            message,
            jacobian: None,
        }
    }
}
