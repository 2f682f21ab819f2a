use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// CAR windows used when none are supplied: 1, 5, 10, 20 and 30 periods after the event.
pub const DEFAULT_CAR_WINDOWS: [u32; 5] = [1, 5, 10, 20, 30];

// ================================================================================================
// Fit
// ================================================================================================

/// Parameters of the rolling market-model regression run by `EventStudy::fit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Trailing observations per regression.
    pub window: usize,

    /// Estimate from all available observations until a full window exists,
    /// instead of back-filling the whole first window.
    pub expanding: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            window: 35,
            expanding: true,
        }
    }
}

impl FitConfig {
    pub fn with_window(self, window: usize) -> Self {
        Self { window, ..self }
    }

    pub fn with_expanding(self, expanding: bool) -> Self {
        Self { expanding, ..self }
    }
}

// ================================================================================================
// Monte Carlo
// ================================================================================================

/// Parameters of a Monte Carlo batch (`random_single_test`, `two_sample_test`).
///
/// `trials` and `sample_size` are the cost knobs: every trial draws `sample_size`
/// dates and runs one multi-window test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Dates drawn per trial (`n`).
    pub sample_size: usize,

    /// Independent trials (`M`).
    pub trials: usize,

    /// Draw with replacement.
    pub replacement: bool,

    /// Batch seed. `None` draws a fresh seed from the thread RNG.
    pub seed: Option<u64>,

    /// Dates removed from the sampling pool before any draw.
    pub exclude: BTreeSet<NaiveDate>,

    /// Render an `indicatif` progress bar on stderr while trials run.
    pub show_progress: bool,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            sample_size: 50,
            trials: 1000,
            replacement: false,
            seed: None,
            exclude: BTreeSet::new(),
            show_progress: false,
        }
    }
}

impl MonteCarloConfig {
    pub fn with_sample_size(self, sample_size: usize) -> Self {
        Self {
            sample_size,
            ..self
        }
    }

    pub fn with_trials(self, trials: usize) -> Self {
        Self { trials, ..self }
    }

    pub fn with_replacement(self, replacement: bool) -> Self {
        Self {
            replacement,
            ..self
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self
        }
    }

    pub fn with_exclude(self, exclude: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            exclude: exclude.into_iter().collect(),
            ..self
        }
    }

    pub fn with_progress(self, show_progress: bool) -> Self {
        Self {
            show_progress,
            ..self
        }
    }
}
