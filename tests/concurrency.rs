//! Every public routine is stateless: calling it from many threads at once
//! must give bit-identical results to calling it sequentially.

use std::thread;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use u_calculus::differintegrate::{differintegrate, differintegrate_batch};
use u_calculus::integrate::{on_closed_interval, KronrodPoints, Quadrature};
use u_calculus::roots::{self, RootOptions};
use u_calculus::special::{digamma, digamma_inv, gamma};

const THREADS: usize = 8;

fn sample_points(seed: u64, n: usize, lo: f64, hi: f64) -> Vec<f64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(lo..hi)).collect()
}

fn run_on_threads<T, F>(work: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn() -> T + Send + Sync + Clone + 'static,
{
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let work = work.clone();
            thread::spawn(move || work())
        })
        .collect();
    handles
        .into_iter()
        .map(|h| h.join().expect("worker panicked"))
        .collect()
}

#[test]
fn special_functions_are_thread_safe() {
    let xs = sample_points(7, 200, 0.05, 40.0);
    let eval = |xs: &[f64]| -> Vec<(f64, f64, f64)> {
        xs.iter()
            .map(|&x| (gamma(x), digamma(x), digamma_inv(digamma(x))))
            .collect()
    };
    let expected = eval(&xs);
    let shared = xs.clone();
    for got in run_on_threads(move || eval(&shared)) {
        assert_eq!(got, expected);
    }
}

#[test]
fn root_facades_are_thread_safe() {
    let targets = sample_points(11, 100, 0.5, 20.0);
    let solve = |targets: &[f64]| -> Vec<f64> {
        targets
            .iter()
            .map(|&c| {
                roots::of_function(|x| x * x - c, 0.0, 10.0, RootOptions::default())
                    .expect("bracketed square root")
            })
            .collect()
    };
    let expected = solve(&targets);
    for (&c, r) in targets.iter().zip(&expected) {
        assert!((r - c.sqrt()).abs() < 1e-7);
    }
    let shared = targets.clone();
    for got in run_on_threads(move || solve(&shared)) {
        assert_eq!(got, expected);
    }
}

#[test]
fn quadrature_backends_are_thread_safe() {
    let uppers = sample_points(23, 20, 0.5, 3.0);
    let backends = [
        Quadrature::double_exponential(),
        Quadrature::gauss_legendre(),
        Quadrature::GaussKronrod {
            target_relative_error: 1e-10,
            points: KronrodPoints::P31,
        },
    ];
    let eval = move |uppers: &[f64]| -> Vec<f64> {
        backends
            .iter()
            .flat_map(move |q| {
                uppers.iter().map(move |&b| {
                    on_closed_interval(|x: f64| x.sqrt() * x.cos(), 0.0, b, q)
                        .expect("smooth integrand converges")
                })
            })
            .collect()
    };
    let expected = eval(&uppers);
    let shared = uppers.clone();
    for got in run_on_threads(move || eval(&shared)) {
        assert_eq!(got, expected);
    }
}

#[test]
fn differintegrate_is_thread_safe() {
    let xs = sample_points(42, 12, 0.5, 2.5);
    let q = Quadrature::gauss_kronrod();
    let eval = move |xs: &[f64]| -> Vec<f64> {
        xs.iter()
            .map(|&x| differintegrate(|t: f64| t.exp(), x, 0.5, 0.0, &q).expect("converges"))
            .collect()
    };
    let expected = eval(&xs);
    let shared = xs.clone();
    for got in run_on_threads(move || eval(&shared)) {
        assert_eq!(got, expected);
    }
}

#[test]
fn batch_preserves_input_order() {
    let xs = sample_points(99, 32, 0.25, 4.0);
    let q = Quadrature::double_exponential();
    let batch = differintegrate_batch(|t: f64| t * t, &xs, -0.5, 0.0, &q).expect("converges");
    let sequential: Vec<f64> = xs
        .iter()
        .map(|&x| differintegrate(|t: f64| t * t, x, -0.5, 0.0, &q).expect("converges"))
        .collect();
    assert_eq!(batch, sequential);
}
