pub mod config;
pub mod monte_carlo;

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::{
    error::{EventStudyResult, InputError, PreconditionError},
    hypothesis::{WindowStats, single_sample_test, two_sample_test},
    math::regression::{MarketModel, rolling_residuals},
    report::{monte_carlo::MonteCarloSummary, test_table::TestTable},
    sampling::Resampler,
    series::ReturnSeries,
    study::{
        config::{DEFAULT_CAR_WINDOWS, FitConfig, MonteCarloConfig},
        monte_carlo::run_trials,
    },
};

/// Fit state of an [`EventStudy`].
#[derive(Debug, Clone, Default)]
pub enum StudyState {
    /// No residuals yet; every test fails with [`PreconditionError::NotFitted`].
    #[default]
    Unfitted,
    /// Residuals of the last successful `fit`.
    Fitted(Box<FittedModel>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub model: MarketModel,
    pub config: FitConfig,
}

/// Fit-once, test-many event study of one asset against a benchmark.
///
/// `fit` computes the abnormal-return series; the test operations then read it
/// without mutating the study, so a fitted study can be shared across threads.
#[derive(Debug, Clone)]
pub struct EventStudy {
    ticker: String,
    benchmark: ReturnSeries,
    windows: Vec<u32>,
    state: StudyState,
}

impl EventStudy {
    /// Unfitted study using [`DEFAULT_CAR_WINDOWS`]. `ticker` is an opaque label.
    pub fn new(ticker: impl Into<String>, benchmark: ReturnSeries) -> Self {
        Self {
            ticker: ticker.into(),
            benchmark,
            windows: DEFAULT_CAR_WINDOWS.to_vec(),
            state: StudyState::Unfitted,
        }
    }

    /// Replaces the CAR windows. Result rows follow this order.
    pub fn with_windows(self, windows: impl Into<Vec<u32>>) -> Self {
        Self {
            windows: windows.into(),
            ..self
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn benchmark(&self) -> &ReturnSeries {
        &self.benchmark
    }

    pub fn windows(&self) -> &[u32] {
        &self.windows
    }

    pub fn state(&self) -> &StudyState {
        &self.state
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self.state, StudyState::Fitted(_))
    }

    /// Regresses `asset` on the benchmark and stores the residuals.
    ///
    /// Re-fitting replaces the previous residuals. On error the previous state is kept.
    #[tracing::instrument(skip(self, asset), fields(ticker = %self.ticker))]
    pub fn fit(&mut self, asset: &ReturnSeries, config: FitConfig) -> EventStudyResult<&mut Self> {
        let model = rolling_residuals(asset, &self.benchmark, config.window, config.expanding)?;

        info!(
            observations = model.residuals.len(),
            window = config.window,
            expanding = config.expanding,
            warm_up = model.warm_up,
            refit = self.is_fitted(),
            "Market model fitted"
        );

        self.state = StudyState::Fitted(Box::new(FittedModel { model, config }));
        Ok(self)
    }

    pub fn market_model(&self) -> EventStudyResult<&MarketModel> {
        match &self.state {
            StudyState::Fitted(fitted) => Ok(&fitted.model),
            StudyState::Unfitted => Err(PreconditionError::NotFitted.into()),
        }
    }

    /// Abnormal returns on the asset's date axis.
    pub fn residuals(&self) -> EventStudyResult<&ReturnSeries> {
        Ok(&self.market_model()?.residuals)
    }

    /// One-sample t-test of event CARs against `hypothesized_mean` for every window.
    ///
    /// Event dates absent from the residual axis are dropped.
    pub fn single_test(
        &self,
        event_dates: &[NaiveDate],
        hypothesized_mean: f64,
    ) -> EventStudyResult<TestTable> {
        let residuals = self.residuals()?;
        let rows = single_sample_test(residuals, event_dates, &self.windows, hypothesized_mean)?;
        warn_missing_rows(&rows);
        TestTable::try_from(rows.as_slice())
    }

    /// Pooled two-sample t-test of event CARs against the CARs of `comparison_dates`.
    ///
    /// Every comparison date must lie on the residual axis.
    pub fn two_sample_test_with(
        &self,
        event_dates: &[NaiveDate],
        comparison_dates: &[NaiveDate],
    ) -> EventStudyResult<TestTable> {
        let residuals = self.residuals()?;
        let rows = two_sample_test(residuals, event_dates, comparison_dates, &self.windows)?;
        warn_missing_rows(&rows);
        TestTable::try_from(rows.as_slice())
    }

    /// Null distribution of the single-sample t-statistic under random date selection.
    ///
    /// Each trial draws `cfg.sample_size` dates from `candidate_pool` (the whole
    /// residual axis when empty) and tests them as if they were events.
    pub fn random_single_test(
        &self,
        candidate_pool: &[NaiveDate],
        cfg: &MonteCarloConfig,
        hypothesized_mean: f64,
    ) -> EventStudyResult<MonteCarloSummary> {
        let residuals = self.residuals()?;
        if !hypothesized_mean.is_finite() {
            return Err(InputError::NonFiniteHypothesis(hypothesized_mean).into());
        }

        let sampler = resampler(residuals, candidate_pool, &cfg.exclude)?;
        run_trials(&self.windows, &sampler, cfg, |dates| {
            single_sample_test(residuals, dates, &self.windows, hypothesized_mean)
        })
    }

    /// Distribution of the two-sample t-statistic of `event_dates` against random
    /// comparison sets drawn from `candidate_pool` (the whole residual axis when empty).
    pub fn two_sample_test(
        &self,
        event_dates: &[NaiveDate],
        candidate_pool: &[NaiveDate],
        cfg: &MonteCarloConfig,
    ) -> EventStudyResult<MonteCarloSummary> {
        let residuals = self.residuals()?;
        let sampler = resampler(residuals, candidate_pool, &cfg.exclude)?;
        run_trials(&self.windows, &sampler, cfg, |comparison| {
            two_sample_test(residuals, event_dates, comparison, &self.windows)
        })
    }
}

// ================================================================================================
// Helper Functions
// ================================================================================================

fn warn_missing_rows(rows: &[WindowStats]) {
    for row in rows.iter().filter(|r| r.is_missing()) {
        warn!(window = row.window, "No CAR samples for window; row is missing");
    }
}

/// Builds the sampling pool, rejecting candidates that are not on the residual axis.
fn resampler(
    residuals: &ReturnSeries,
    candidate_pool: &[NaiveDate],
    exclude: &BTreeSet<NaiveDate>,
) -> EventStudyResult<Resampler> {
    if candidate_pool.is_empty() {
        return Ok(Resampler::from_series(residuals, exclude));
    }

    if let Some(absent) = candidate_pool.iter().find(|d| !residuals.contains(d)) {
        return Err(InputError::DateNotOnAxis(*absent).into());
    }
    Ok(Resampler::from_dates(candidate_pool.iter().copied(), exclude))
}
