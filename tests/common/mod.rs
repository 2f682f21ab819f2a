#![allow(dead_code)]

use chrono::{Datelike, Days, NaiveDate, Weekday};
use event_study::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `n` consecutive weekdays starting at 2020-01-02.
pub fn business_days(n: usize) -> Vec<NaiveDate> {
    let mut day = NaiveDate::from_ymd_opt(2020, 1, 2).expect("valid date");
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(day);
        }
        day = day + Days::new(1);
    }
    out
}

/// `n` i.i.d. `N(mean, sd)` draws from a seeded generator.
pub fn normal_draws(n: usize, mean: f64, sd: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(mean, sd).expect("valid normal parameters");
    (0..n).map(|_| normal.sample(&mut rng)).collect()
}

pub fn series(values: Vec<f64>) -> ReturnSeries {
    ReturnSeries::new(business_days(values.len()), values).expect("valid series")
}

/// Benchmark and asset series following `asset = alpha + beta * benchmark + noise`.
pub fn market(n: usize, alpha: f64, beta: f64, noise_sd: f64, seed: u64) -> (ReturnSeries, ReturnSeries) {
    let bench = normal_draws(n, 0.0003, 0.01, seed);
    let noise = normal_draws(n, 0.0, noise_sd, seed.wrapping_add(1));
    let asset = bench
        .iter()
        .zip(&noise)
        .map(|(b, e)| alpha + beta * b + e)
        .collect();
    (series(asset), series(bench))
}

/// A study fitted on a synthetic market with the default regression config.
pub fn fitted_study(n: usize, windows: &[u32], seed: u64) -> EventStudy {
    let (asset, bench) = market(n, 0.0002, 1.1, 0.01, seed);
    let mut study = EventStudy::new("SYN", bench).with_windows(windows.to_vec());
    study
        .fit(&asset, FitConfig::default())
        .expect("synthetic market fits");
    study
}
