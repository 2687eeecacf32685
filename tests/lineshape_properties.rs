//! Property tests: the model evaluators reproduce their closed forms
//! exactly for randomly drawn parameters.

use approx::assert_relative_eq;
use ndarray::{array, Array1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sqw_fit::Lineshape;

fn lorentzian(x: f64, a: f64, x0: f64, gamma: f64, c: f64) -> f64 {
    a * (gamma / 2.0).powi(2) / ((x - x0).powi(2) + (gamma / 2.0).powi(2)) + c
}

fn gaussian(x: f64, a: f64, x0: f64, sigma: f64, c: f64) -> f64 {
    a * (-(x - x0).powi(2) / (2.0 * sigma * sigma)).exp() + c
}

#[test]
fn lorentzian_matches_closed_form_for_random_parameters() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let x = Array1::linspace(-8.0, 8.0, 64);

    for _ in 0..200 {
        let a = rng.gen_range(0.01..20.0);
        let x0 = rng.gen_range(-5.0..5.0);
        let gamma = rng.gen_range(0.01..4.0);
        let c = rng.gen_range(0.0..2.0);

        let y = Lineshape::Lorentzian
            .evaluate(&x, &array![a, x0, gamma, c])
            .unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert_relative_eq!(*yi, lorentzian(*xi, a, x0, gamma, c), max_relative = 1e-12);
        }
    }
}

#[test]
fn gaussian_matches_closed_form_for_random_parameters() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let x = Array1::linspace(-8.0, 8.0, 64);

    for _ in 0..200 {
        let a = rng.gen_range(0.01..20.0);
        let x0 = rng.gen_range(-5.0..5.0);
        let sigma = rng.gen_range(0.01..4.0);
        let c = rng.gen_range(0.0..2.0);

        let y = Lineshape::Gaussian
            .evaluate(&x, &array![a, x0, sigma, c])
            .unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert_relative_eq!(*yi, gaussian(*xi, a, x0, sigma, c), max_relative = 1e-12);
        }
    }
}

#[test]
fn double_lorentzian_matches_sum_of_terms_for_random_parameters() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let x = Array1::linspace(-8.0, 8.0, 64);

    for _ in 0..200 {
        let params: Vec<f64> = vec![
            rng.gen_range(0.01..20.0),
            rng.gen_range(-5.0..5.0),
            rng.gen_range(0.01..4.0),
            rng.gen_range(0.01..20.0),
            rng.gen_range(-5.0..5.0),
            rng.gen_range(0.01..4.0),
            rng.gen_range(0.0..2.0),
        ];

        let y = Lineshape::DoubleLorentzian
            .evaluate(&x, &Array1::from_vec(params.clone()))
            .unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            let expected = lorentzian(*xi, params[0], params[1], params[2], 0.0)
                + lorentzian(*xi, params[3], params[4], params[5], 0.0)
                + params[6];
            assert_relative_eq!(*yi, expected, max_relative = 1e-12);
        }
    }
}

#[test]
fn evaluation_is_deterministic() {
    let x = Array1::linspace(-5.0, 5.0, 32);
    let params = array![4.2, -0.7, 0.9, 0.3];

    let first = Lineshape::Lorentzian.evaluate(&x, &params).unwrap();
    let second = Lineshape::Lorentzian.evaluate(&x, &params).unwrap();
    assert_eq!(first, second);
}
