//! Parallel Monte Carlo runner shared by the resampling tests of [`super::EventStudy`].
//!
//! Trial `i` of a batch seeded with `s` always draws from `trial_rng(s, i)`. Trials are
//! grouped into fixed chunks of [`TRIALS_PER_CHUNK`]; each chunk folds its trials in order
//! and chunk accumulators are merged in chunk order, so a seeded batch yields the same
//! summary regardless of how rayon schedules the chunks.

use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{info, warn};

use crate::{
    error::{EventStudyResult, InputError, SystemError},
    hypothesis::WindowStats,
    math::moments::Moments,
    report::monte_carlo::MonteCarloSummary,
    sampling::{Resampler, trial_rng},
    study::config::MonteCarloConfig,
};

/// Trials folded sequentially into one accumulator before chunks are merged.
pub(crate) const TRIALS_PER_CHUNK: usize = 256;

/// Runs `cfg.trials` trials. Each trial draws `cfg.sample_size` dates from `sampler`
/// and hands them to `test`, whose per-window t-statistics are aggregated.
///
/// The first failing trial aborts the batch with its error.
#[tracing::instrument(
    skip_all,
    fields(trials = cfg.trials, sample_size = cfg.sample_size, pool = sampler.pool_size(), seed)
)]
pub(crate) fn run_trials<F>(
    windows: &[u32],
    sampler: &Resampler,
    cfg: &MonteCarloConfig,
    test: F,
) -> EventStudyResult<MonteCarloSummary>
where
    F: Fn(&[NaiveDate]) -> EventStudyResult<Vec<WindowStats>> + Sync,
{
    if cfg.trials == 0 {
        return Err(InputError::InvalidTrials(cfg.trials).into());
    }

    let seed = cfg.seed.unwrap_or_else(|| rand::rng().random());
    tracing::Span::current().record("seed", seed);

    let progress = if cfg.show_progress {
        Some(progress_bar(cfg.trials as u64)?)
    } else {
        None
    };

    let chunks = cfg.trials.div_ceil(TRIALS_PER_CHUNK);
    let partials = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * TRIALS_PER_CHUNK;
            let end = (start + TRIALS_PER_CHUNK).min(cfg.trials);

            let mut acc = vec![Moments::new(); windows.len()];
            for trial in start..end {
                let mut rng = trial_rng(seed, trial);
                let dates = sampler.draw(cfg.sample_size, cfg.replacement, &mut rng)?;
                accumulate(&mut acc, &test(&dates)?)?;
                if let Some(bar) = &progress {
                    bar.inc(1);
                }
            }
            Ok(acc)
        })
        .collect::<EventStudyResult<Vec<_>>>()?;

    let moments = partials
        .into_iter()
        .fold(vec![Moments::new(); windows.len()], merge_windows);

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    let summary = MonteCarloSummary::from_moments(windows, &moments)?;
    for row in summary.rows() {
        let undefined = cfg.trials.saturating_sub(row.valid_trials as usize);
        if undefined > 0 {
            warn!(window = row.window, undefined, "t-statistic undefined in some trials");
        }
    }
    info!(
        windows = summary.len(),
        min_valid = summary.rows().iter().map(|r| r.valid_trials).min().unwrap_or(0),
        "Monte Carlo batch complete"
    );
    Ok(summary)
}

// ================================================================================================
// Helper Functions
// ================================================================================================

/// Pushes every defined t-statistic of one trial into its window's accumulator.
fn accumulate(acc: &mut [Moments], rows: &[WindowStats]) -> EventStudyResult<()> {
    if acc.len() != rows.len() {
        return Err(SystemError::InvariantViolation(format!(
            "trial produced {} rows for {} windows",
            rows.len(),
            acc.len()
        ))
        .into());
    }

    for (m, row) in acc.iter_mut().zip(rows) {
        if let Some(t) = row.t_stat {
            m.push(t);
        }
    }
    Ok(())
}

fn merge_windows(acc: Vec<Moments>, chunk: Vec<Moments>) -> Vec<Moments> {
    acc.into_iter().zip(chunk).map(|(a, c)| a.merge(c)).collect()
}

fn progress_bar(capacity: u64) -> EventStudyResult<ProgressBar> {
    let bar = ProgressBar::new(capacity);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta_precise}) {msg}")
            .map_err(SystemError::ProgressBar)?
            .progress_chars("#>-"));
    Ok(bar)
}
