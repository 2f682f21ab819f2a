use std::sync::Arc;

use polars::{
    frame::DataFrame,
    prelude::{Column, DataType, Field, PlSmallStr, Schema, SchemaRef},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{
    error::{EventStudyError, EventStudyResult},
    math::moments::Moments,
    report::{
        io::{Report, ToSchema},
        polars_ext::polars_to_event_study_error,
    },
};

/// Per-window distribution of the t-statistic across Monte Carlo trials.
#[derive(Debug, Clone)]
pub struct MonteCarloSummary {
    df: DataFrame,
    rows: Vec<TStatDistribution>,
}

/// Mean and sample standard deviation of one window's t-statistic across trials.
///
/// Trials in which the statistic was undefined for this window are not counted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TStatDistribution {
    pub window: u32,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub valid_trials: u32,
}

/// `mean ± k·std` band of the null t-statistic for one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NullBand {
    pub window: u32,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Default for MonteCarloSummary {
    fn default() -> Self {
        let df = DataFrame::empty_with_schema(&Self::to_schema());
        Self {
            df,
            rows: Vec::new(),
        }
    }
}

impl Report for MonteCarloSummary {
    fn as_df(&self) -> &DataFrame {
        &self.df
    }
}

impl ToSchema for MonteCarloSummary {
    fn to_schema() -> SchemaRef {
        let fields: Vec<Field> = MonteCarloCol::iter()
            .map(|col| {
                let dtype = match col {
                    MonteCarloCol::Window | MonteCarloCol::ValidTrials => DataType::UInt32,
                    MonteCarloCol::TStatMean | MonteCarloCol::TStatStd => DataType::Float64,
                };
                Field::new(col.into(), dtype)
            })
            .collect();

        Arc::new(Schema::from_iter(fields))
    }
}

impl MonteCarloSummary {
    /// Builds the summary from per-window t-statistic accumulators, in window order.
    pub fn from_moments(windows: &[u32], moments: &[Moments]) -> EventStudyResult<Self> {
        let rows = windows
            .iter()
            .zip(moments)
            .map(|(&window, m)| TStatDistribution {
                window,
                mean: m.mean(),
                std: m.std(),
                valid_trials: u32::try_from(m.count()).unwrap_or(u32::MAX),
            })
            .collect::<Vec<_>>();

        Self::try_from(rows)
    }

    pub fn rows(&self) -> &[TStatDistribution] {
        &self.rows
    }

    /// First row for `window`, if the window is part of the summary.
    pub fn row(&self, window: u32) -> Option<&TStatDistribution> {
        self.rows.iter().find(|r| r.window == window)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `mean ± k·std` per window; bounds are missing where mean or std is.
    pub fn band(&self, k: f64) -> Vec<NullBand> {
        self.rows
            .iter()
            .map(|r| {
                let bounds = r.mean.zip(r.std);
                NullBand {
                    window: r.window,
                    lower: bounds.map(|(m, s)| m - k * s),
                    upper: bounds.map(|(m, s)| m + k * s),
                }
            })
            .collect()
    }
}

impl TryFrom<Vec<TStatDistribution>> for MonteCarloSummary {
    type Error = EventStudyError;

    fn try_from(rows: Vec<TStatDistribution>) -> EventStudyResult<Self> {
        let columns = MonteCarloCol::iter()
            .map(|col| {
                let name = col.name();
                match col {
                    MonteCarloCol::Window => {
                        Column::new(name, rows.iter().map(|r| r.window).collect::<Vec<u32>>())
                    }
                    MonteCarloCol::TStatMean => Column::new(
                        name,
                        rows.iter().map(|r| r.mean).collect::<Vec<Option<f64>>>(),
                    ),
                    MonteCarloCol::TStatStd => Column::new(
                        name,
                        rows.iter().map(|r| r.std).collect::<Vec<Option<f64>>>(),
                    ),
                    MonteCarloCol::ValidTrials => Column::new(
                        name,
                        rows.iter().map(|r| r.valid_trials).collect::<Vec<u32>>(),
                    ),
                }
            })
            .collect::<Vec<_>>();

        let df = DataFrame::new(columns).map_err(convert_err)?;
        Ok(Self { df, rows })
    }
}

fn convert_err(e: polars::error::PolarsError) -> EventStudyError {
    polars_to_event_study_error("monte carlo summary", e)
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    PartialOrd,
    Ord,
    EnumIter,
    IntoStaticStr,
    EnumCount,
)]
#[strum(serialize_all = "snake_case")]
pub enum MonteCarloCol {
    /// CAR window length (row key).
    Window,
    /// Mean t-statistic across trials.
    TStatMean,
    /// Sample standard deviation of the t-statistic across trials.
    TStatStd,
    /// Number of trials with a defined t-statistic.
    ValidTrials,
}

impl From<MonteCarloCol> for PlSmallStr {
    fn from(value: MonteCarloCol) -> Self {
        value.as_str().into()
    }
}

impl MonteCarloCol {
    pub fn name(&self) -> PlSmallStr {
        (*self).into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_rows_and_frame_in_window_order() {
        let a: Moments = [1.0, 2.0, 3.0].into_iter().collect();
        let b: Moments = [0.5].into_iter().collect();
        let summary = MonteCarloSummary::from_moments(&[20, 1, 5], &[a, b, Moments::new()]).unwrap();

        assert_eq!(summary.len(), 3);
        assert_eq!(summary.as_df().height(), 3);
        assert_eq!(
            summary.as_df().get_column_names_str(),
            vec!["window", "t_stat_mean", "t_stat_std", "valid_trials"]
        );

        let first = summary.row(20).unwrap();
        assert_eq!(first.mean, Some(2.0));
        assert_eq!(first.std, Some(1.0));
        assert_eq!(first.valid_trials, 3);

        let single = summary.row(1).unwrap();
        assert_eq!(single.mean, Some(0.5));
        assert_eq!(single.std, None);

        let empty = summary.row(5).unwrap();
        assert_eq!(empty.valid_trials, 0);
        assert_eq!(empty.mean, None);
    }

    #[test]
    fn band_spans_k_standard_deviations() {
        let m: Moments = [-1.0, 1.0].into_iter().collect();
        let summary = MonteCarloSummary::from_moments(&[10, 30], &[m, Moments::new()]).unwrap();
        let band = summary.band(2.0);

        let sd = 2.0_f64.sqrt();
        assert_eq!(band[0].window, 10);
        assert!((band[0].lower.unwrap() + 2.0 * sd).abs() < 1e-12);
        assert!((band[0].upper.unwrap() - 2.0 * sd).abs() < 1e-12);
        assert_eq!(band[1].lower, None);
    }
}
