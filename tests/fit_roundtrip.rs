//! Statistical round-trip tests for the single-spectrum fitter: synthetic
//! data from a known model plus Gaussian noise at known sigma must be
//! recovered within a few injected standard errors.

use approx::assert_relative_eq;
use ndarray::{array, Array1};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use sqw_fit::fit::DEFAULT_MAX_EVALUATIONS;
use sqw_fit::{fit_spectrum, Lineshape, SqwFitError};

const NOISE_SIGMA: f64 = 0.05;

fn noisy_samples(model: Lineshape, truth: &Array1<f64>, n: usize, seed: u64) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let noise = Normal::new(0.0, NOISE_SIGMA).unwrap();

    let x = Array1::linspace(-5.0, 5.0, n);
    let clean = model.evaluate(&x, truth).unwrap();
    let y = clean.mapv(|v| v + noise.sample(&mut rng));
    let err = Array1::from_elem(n, NOISE_SIGMA);
    (x, y, err)
}

#[test]
fn lorentzian_parameters_recovered_from_noisy_data() {
    let truth = array![5.0, 0.5, 1.2, 0.1];
    let (x, y, err) = noisy_samples(Lineshape::Lorentzian, &truth, 400, 11);

    let (popt, perr) = fit_spectrum(
        x.view(),
        y.view(),
        err.view(),
        Lineshape::Lorentzian,
        &[3.0, 0.0, 1.0, 0.0],
        &[0.0, -10.0, 0.1, 0.0],
        &[f64::INFINITY, 10.0, 5.0, f64::INFINITY],
        DEFAULT_MAX_EVALUATIONS,
    )
    .unwrap();

    // Each parameter within 4 of its own reported standard error
    for i in 0..4 {
        assert!(perr[i] > 0.0, "parameter {} has zero error", i);
        assert!(
            (popt[i] - truth[i]).abs() < 4.0 * perr[i],
            "parameter {}: fitted {} vs true {} (err {})",
            i,
            popt[i],
            truth[i],
            perr[i]
        );
    }

    // At this sample count the recovery is also tight in absolute terms
    assert_relative_eq!(popt[0], truth[0], max_relative = 0.05);
    assert!((popt[1] - truth[1]).abs() < 0.05);
    assert_relative_eq!(popt[2], truth[2], max_relative = 0.05);
}

#[test]
fn gaussian_parameters_recovered_from_noisy_data() {
    let truth = array![4.0, -0.5, 0.8, 0.2];
    let (x, y, err) = noisy_samples(Lineshape::Gaussian, &truth, 400, 12);

    let (popt, perr) = fit_spectrum(
        x.view(),
        y.view(),
        err.view(),
        Lineshape::Gaussian,
        &[2.0, 0.0, 1.0, 0.0],
        &[0.0, -10.0, 0.1, 0.0],
        &[f64::INFINITY, 10.0, 5.0, f64::INFINITY],
        DEFAULT_MAX_EVALUATIONS,
    )
    .unwrap();

    for i in 0..4 {
        assert!(
            (popt[i] - truth[i]).abs() < 4.0 * perr[i].max(1e-6),
            "parameter {}: fitted {} vs true {} (err {})",
            i,
            popt[i],
            truth[i],
            perr[i]
        );
    }
}

#[test]
fn reported_errors_match_injected_noise_scale() {
    // With correctly weighted residuals, the reported standard error of
    // the amplitude should be on the order of the noise, far below the
    // amplitude itself and nonvanishing.
    let truth = array![5.0, 0.0, 1.0, 0.1];
    let (x, y, err) = noisy_samples(Lineshape::Lorentzian, &truth, 1000, 13);

    let (_, perr) = fit_spectrum(
        x.view(),
        y.view(),
        err.view(),
        Lineshape::Lorentzian,
        &[3.0, 0.0, 1.0, 0.0],
        &[0.0, -10.0, 0.1, 0.0],
        &[f64::INFINITY, 10.0, 5.0, f64::INFINITY],
        DEFAULT_MAX_EVALUATIONS,
    )
    .unwrap();

    assert!(perr[0] > 1e-4 && perr[0] < 0.1, "amplitude error {}", perr[0]);
    assert!(perr[1] > 1e-5 && perr[1] < 0.1, "center error {}", perr[1]);
}

#[test]
fn fewer_than_four_valid_points_is_insufficient_data() {
    let x = array![0.0, 1.0, 2.0];
    let y = array![1.0, 2.0, 1.0];
    let err = array![0.1, 0.1, 0.1];

    let result = fit_spectrum(
        x.view(),
        y.view(),
        err.view(),
        Lineshape::Lorentzian,
        &[2.0, 1.0, 1.0, 0.0],
        &[0.0, -10.0, 0.1, 0.0],
        &[f64::INFINITY, 10.0, 5.0, f64::INFINITY],
        DEFAULT_MAX_EVALUATIONS,
    );

    assert!(matches!(
        result,
        Err(SqwFitError::InsufficientData {
            found: 3,
            required: 4
        })
    ));
}

#[test]
fn masked_invalid_points_do_not_poison_the_fit() {
    let truth = array![5.0, 0.5, 1.2, 0.1];
    let (x, mut y, mut err) = noisy_samples(Lineshape::Lorentzian, &truth, 400, 14);

    // Corrupt a handful of samples; the mask must exclude them
    y[10] = f64::NAN;
    y[20] = f64::INFINITY;
    err[30] = 0.0;
    err[40] = -1.0;

    let (popt, _) = fit_spectrum(
        x.view(),
        y.view(),
        err.view(),
        Lineshape::Lorentzian,
        &[3.0, 0.0, 1.0, 0.0],
        &[0.0, -10.0, 0.1, 0.0],
        &[f64::INFINITY, 10.0, 5.0, f64::INFINITY],
        DEFAULT_MAX_EVALUATIONS,
    )
    .unwrap();

    assert_relative_eq!(popt[0], truth[0], max_relative = 0.05);
    assert!((popt[1] - truth[1]).abs() < 0.05);
}
