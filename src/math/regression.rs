//! Rolling market-model regression: `asset_t = alpha_t + beta_t * benchmark_t + e_t`.
//!
//! Coefficients at position `t` are estimated by OLS on the trailing `window`
//! observations ending at `t` (or on every observation since the start while fewer
//! than `window` exist, when `expanding` is enabled).
//!
//! # Warm-up back-fill
//!
//! Positions before the first estimate reuse the coefficients of that first
//! estimate. This introduces a lookahead bias in the warm-up region: the residuals
//! there are computed with coefficients fitted on later data. Callers who need a
//! clean sample should skip the first [`MarketModel::warm_up`] positions.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{EventStudyResult, PreconditionError},
    series::ReturnSeries,
};

/// Number of regressors (constant + benchmark); the smallest sample that identifies a fit.
pub const MIN_OBSERVATIONS: usize = 2;

/// Output of [`rolling_residuals`]: per-position coefficients and the abnormal return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketModel {
    /// Fitted intercept (`alpha_t`) per position, back-filled in the warm-up region.
    pub intercept: Vec<f64>,
    /// Fitted slope (`beta_t`) per position, back-filled in the warm-up region.
    pub slope: Vec<f64>,
    /// `asset_t - (beta_t * benchmark_t + alpha_t)` on the asset's date axis.
    pub residuals: ReturnSeries,
    /// Number of leading positions whose coefficients were back-filled.
    pub warm_up: usize,
}

/// Estimates abnormal returns of `asset` against `benchmark` with a rolling OLS fit.
///
/// # Errors
/// - [`PreconditionError::AxisMismatch`] if the two series differ in their date axis.
/// - [`PreconditionError::WindowTooSmall`] if `window < MIN_OBSERVATIONS`.
/// - [`PreconditionError::WindowTooLarge`] if `window` exceeds the series length.
pub fn rolling_residuals(
    asset: &ReturnSeries,
    benchmark: &ReturnSeries,
    window: usize,
    expanding: bool,
) -> EventStudyResult<MarketModel> {
    asset.ensure_same_axis(benchmark)?;

    if window < MIN_OBSERVATIONS {
        return Err(PreconditionError::WindowTooSmall {
            window,
            min: MIN_OBSERVATIONS,
        }
        .into());
    }

    let n = asset.len();
    if window > n {
        return Err(PreconditionError::WindowTooLarge { window, len: n }.into());
    }

    let y = asset.values();
    let x = benchmark.values();

    let first = if expanding {
        MIN_OBSERVATIONS - 1
    } else {
        window - 1
    };

    let mut intercept = vec![0.0; n];
    let mut slope = vec![0.0; n];

    for t in first..n {
        let start = (t + 1).saturating_sub(window);
        let (alpha, beta) = ols(&x[start..=t], &y[start..=t]);
        intercept[t] = alpha;
        slope[t] = beta;
    }

    // Back-fill the warm-up region from the first estimate.
    let (alpha0, beta0) = (intercept[first], slope[first]);
    intercept[..first].fill(alpha0);
    slope[..first].fill(beta0);

    debug!(window, expanding, warm_up = first, "Rolling market model fitted");

    let residuals = y
        .iter()
        .zip(x)
        .zip(intercept.iter().zip(&slope))
        .map(|((yt, xt), (a, b))| yt - (b * xt + a))
        .collect::<Vec<_>>();

    Ok(MarketModel {
        intercept,
        slope,
        residuals: asset.with_values(residuals),
        warm_up: first,
    })
}

/// OLS of `y` on `[1, x]`, returning `(intercept, slope)`.
///
/// A constant `x` makes the design rank-deficient; the minimum-norm solution
/// (pseudo-inverse) is returned in that case.
fn ols(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len() as f64;
    let x_bar = x.iter().sum::<f64>() / n;
    let y_bar = y.iter().sum::<f64>() / n;

    let (sxx, sxy, sum_sq) = x.iter().zip(y).fold((0.0, 0.0, 0.0), |(sxx, sxy, ss), (xi, yi)| {
        let dx = xi - x_bar;
        (sxx + dx * dx, sxy + dx * (yi - y_bar), ss + xi * xi)
    });

    if sxx <= f64::EPSILON * sum_sq {
        let scale = y_bar / (1.0 + x_bar * x_bar);
        return (scale, scale * x_bar);
    }

    let beta = sxy / sxx;
    (y_bar - beta * x_bar, beta)
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};

    use super::*;
    use crate::error::EventStudyError;

    fn series(values: &[f64]) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).expect("valid date");
        ReturnSeries::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Days::new(i as u64), *v)),
        )
        .expect("valid series")
    }

    fn wave(n: usize, phase: f64) -> Vec<f64> {
        (0..n)
            .map(|i| 0.01 * ((i as f64) * 0.7 + phase).sin())
            .collect()
    }

    #[test]
    fn ols_recovers_exact_line() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = x.map(|v| 0.5 + 2.0 * v);
        let (a, b) = ols(&x, &y);
        assert!((a - 0.5).abs() < 1e-12);
        assert!((b - 2.0).abs() < 1e-12);
    }

    #[test]
    fn ols_constant_regressor_uses_min_norm_solution() {
        let (a, b) = ols(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);
        // Fitted value a + 2b must equal mean(y) = 2, with minimal |(a, b)|.
        assert!((a + 2.0 * b - 2.0).abs() < 1e-12);
        assert!((a - 0.4).abs() < 1e-12);
        assert!((b - 0.8).abs() < 1e-12);
    }

    #[test]
    fn identical_series_yield_zero_residuals() {
        let r = series(&wave(80, 0.3));
        let model = rolling_residuals(&r, &r, 35, false).unwrap();

        for (t, e) in model.residuals.values().iter().enumerate() {
            assert!(e.abs() < 1e-12, "residual at {t} = {e}");
        }
        for (a, b) in model.intercept.iter().zip(&model.slope).skip(model.warm_up) {
            assert!(a.abs() < 1e-12);
            assert!((b - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn identical_series_yield_zero_residuals_with_default_expanding_fit() {
        let r = series(&wave(80, 0.3));
        let model = rolling_residuals(&r, &r, 35, true).unwrap();

        assert_eq!(model.warm_up, 1);
        for (t, e) in model.residuals.values().iter().enumerate() {
            assert!(e.abs() < 1e-12, "residual at {t} = {e}");
        }
        for (a, b) in model.intercept.iter().zip(&model.slope) {
            assert!(a.abs() < 1e-12);
            assert!((b - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn warm_up_uses_first_full_window_coefficients() {
        let window = 10;
        let bench = series(&wave(40, 0.0));
        let noise = wave(40, 2.1);
        let asset = series(
            &bench
                .values()
                .iter()
                .zip(&noise)
                .map(|(m, e)| 0.001 + 1.3 * m + 0.5 * e)
                .collect::<Vec<_>>(),
        );

        let model = rolling_residuals(&asset, &bench, window, false).unwrap();
        assert_eq!(model.warm_up, window - 1);

        let (a0, b0) = ols(&bench.values()[..window], &asset.values()[..window]);
        for t in 0..window {
            assert_eq!(model.intercept[t], a0);
            assert_eq!(model.slope[t], b0);
            let expected = asset.values()[t] - (b0 * bench.values()[t] + a0);
            assert!((model.residuals.values()[t] - expected).abs() < 1e-15);
            assert!(model.residuals.values()[t].is_finite());
        }
    }

    #[test]
    fn expanding_estimates_start_after_two_observations() {
        let bench = series(&wave(30, 0.0));
        let asset = series(&wave(30, 1.0));
        let model = rolling_residuals(&asset, &bench, 20, true).unwrap();

        assert_eq!(model.warm_up, 1);
        assert_eq!(model.intercept[0], model.intercept[1]);

        // Position 9 uses the ten observations seen so far.
        let (a, b) = ols(&bench.values()[..10], &asset.values()[..10]);
        assert!((model.intercept[9] - a).abs() < 1e-15);
        assert!((model.slope[9] - b).abs() < 1e-15);

        // From the full window on, the fit rolls.
        let (a, b) = ols(&bench.values()[5..25], &asset.values()[5..25]);
        assert!((model.intercept[24] - a).abs() < 1e-15);
        assert!((model.slope[24] - b).abs() < 1e-15);
    }

    #[test]
    fn rejects_bad_windows_and_axes() {
        let r = series(&wave(10, 0.0));
        assert!(matches!(
            rolling_residuals(&r, &r, 11, true),
            Err(EventStudyError::Precondition(PreconditionError::WindowTooLarge { window: 11, len: 10 }))
        ));
        assert!(matches!(
            rolling_residuals(&r, &r, 1, true),
            Err(EventStudyError::Precondition(PreconditionError::WindowTooSmall { .. }))
        ));
        assert!(rolling_residuals(&r, &r, 10, false).is_ok());

        let shorter = series(&wave(9, 0.0));
        assert!(matches!(
            rolling_residuals(&r, &shorter, 5, true),
            Err(EventStudyError::Precondition(PreconditionError::AxisMismatch(_)))
        ));
    }
}
