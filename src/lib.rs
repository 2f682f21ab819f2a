//! Event-study engine: market-model abnormal returns, cumulative abnormal returns (CAR)
//! and their significance tests, including Monte Carlo null distributions.
//!
//! ```no_run
//! use event_study::prelude::*;
//!
//! # fn run(asset: ReturnSeries, benchmark: ReturnSeries, events: Vec<chrono::NaiveDate>) -> EventStudyResult<()> {
//! let mut study = EventStudy::new("ACME", benchmark);
//! study.fit(&asset, FitConfig::default())?;
//!
//! let table = study.single_test(&events, 0.0)?;
//! let null = study.random_single_test(&[], &MonteCarloConfig::default().with_seed(7), 0.0)?;
//! println!("{}\n{}", table.as_df(), null.as_df());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod hypothesis;
pub mod math;
pub mod prelude;
pub mod report;
pub mod sampling;
pub mod series;
pub mod study;
