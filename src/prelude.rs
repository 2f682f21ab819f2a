// 1. Traits
pub use crate::report::io::{Report, ToJson, ToSchema};

// 2. The Core Types
pub use crate::series::ReturnSeries;
pub use crate::study::{
    EventStudy, FittedModel, StudyState,
    config::{DEFAULT_CAR_WINDOWS, FitConfig, MonteCarloConfig},
};

// 3. Results
pub use crate::hypothesis::WindowStats;
pub use crate::math::regression::MarketModel;
pub use crate::report::{
    monte_carlo::{MonteCarloCol, MonteCarloSummary, NullBand, TStatDistribution},
    test_table::{TestTable, TestTableCol},
};

// 4. Building Blocks
pub use crate::hypothesis::{single_sample_test, two_sample_test};
pub use crate::math::{car::car, moments::Moments, regression::rolling_residuals, ttest::TTest};
pub use crate::sampling::{Resampler, trial_rng};

// 5. Errors
pub use crate::error::{
    DataError, EventStudyError, EventStudyResult, InputError, PreconditionError, SystemError,
};
