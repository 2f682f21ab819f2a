//! Per-window CAR significance tests on an abnormal-return series.
//!
//! Date-set policies:
//! - **Event dates** absent from the residual axis are dropped silently (they may
//!   fall on non-trading days).
//! - **Comparison dates** must lie on the axis; an absent one is an
//!   [`InputError::DateNotOnAxis`].
//!
//! In both roles, a date whose window runs past the end of the series yields no
//! CAR sample for that window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{EventStudyResult, InputError},
    math::{car::car, moments::Moments, ttest},
    series::ReturnSeries,
};

/// Summary statistics of the CAR sample at one window.
///
/// `None` marks a missing value: a window with no surviving samples has every
/// field `None`, and `t_stat`/`p_value` are `None` whenever the test is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub window: u32,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub n: Option<u32>,
    pub t_stat: Option<f64>,
    pub p_value: Option<f64>,
}

impl WindowStats {
    pub fn missing(window: u32) -> Self {
        Self {
            window,
            mean: None,
            std: None,
            n: None,
            t_stat: None,
            p_value: None,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.mean.is_none()
            && self.std.is_none()
            && self.n.is_none()
            && self.t_stat.is_none()
            && self.p_value.is_none()
    }

    fn from_sample(window: u32, sample: &Moments, test: Option<ttest::TTest>) -> Self {
        Self {
            window,
            mean: sample.mean(),
            std: sample.std(),
            n: u32::try_from(sample.count()).ok(),
            t_stat: test.map(|t| t.t_stat),
            p_value: test.map(|t| t.p_value),
        }
    }
}

/// One-sample t-test of event CARs against `hypothesized_mean`, for every window.
///
/// Rows follow the order of `windows`. A window without any CAR sample produces a
/// [`WindowStats::missing`] row and the remaining windows are still computed.
pub fn single_sample_test(
    residuals: &ReturnSeries,
    event_dates: &[NaiveDate],
    windows: &[u32],
    hypothesized_mean: f64,
) -> EventStudyResult<Vec<WindowStats>> {
    if !hypothesized_mean.is_finite() {
        return Err(InputError::NonFiniteHypothesis(hypothesized_mean).into());
    }

    let anchors = event_positions(residuals, event_dates);

    windows
        .iter()
        .map(|&window| {
            let sample = car_sample(residuals.values(), &anchors, window);
            if sample.count() == 0 {
                debug!(window, "No CAR samples for window; emitting missing row");
                return Ok(WindowStats::missing(window));
            }

            let test = ttest::one_sample(&sample, hypothesized_mean)?;
            Ok(WindowStats::from_sample(window, &sample, test))
        })
        .collect()
}

/// Pooled two-sample t-test of event CARs versus comparison CARs, for every window.
///
/// The `mean`, `std` and `n` columns describe the comparison sample; `t_stat` is
/// positive when event CARs exceed comparison CARs on average. A window without any
/// comparison CAR produces a [`WindowStats::missing`] row.
///
/// # Errors
/// [`InputError::DateNotOnAxis`] for the first comparison date absent from `residuals`.
pub fn two_sample_test(
    residuals: &ReturnSeries,
    event_dates: &[NaiveDate],
    comparison_dates: &[NaiveDate],
    windows: &[u32],
) -> EventStudyResult<Vec<WindowStats>> {
    let event_anchors = event_positions(residuals, event_dates);
    let comparison_anchors = comparison_dates
        .iter()
        .map(|d| residuals.position(d).ok_or(InputError::DateNotOnAxis(*d)))
        .collect::<Result<Vec<_>, _>>()?;

    windows
        .iter()
        .map(|&window| {
            let comparison = car_sample(residuals.values(), &comparison_anchors, window);
            if comparison.count() == 0 {
                debug!(window, "No comparison CAR samples for window; emitting missing row");
                return Ok(WindowStats::missing(window));
            }

            let events = car_sample(residuals.values(), &event_anchors, window);
            let test = ttest::pooled_two_sample(&events, &comparison)?;
            Ok(WindowStats::from_sample(window, &comparison, test))
        })
        .collect()
}

/// Resolves event dates to axis positions, dropping dates that are not on the axis.
fn event_positions(residuals: &ReturnSeries, event_dates: &[NaiveDate]) -> Vec<usize> {
    let anchors = event_dates
        .iter()
        .filter_map(|d| residuals.position(d))
        .collect::<Vec<_>>();

    let dropped = event_dates.len() - anchors.len();
    if dropped > 0 {
        debug!(dropped, total = event_dates.len(), "Event dates not on residual axis");
    }
    anchors
}

fn car_sample(values: &[f64], anchors: &[usize], window: u32) -> Moments {
    anchors
        .iter()
        .filter_map(|&anchor| car(values, anchor, window as usize))
        .collect()
}
